//! Platform order layer port.
//!
//! The core only states the allocation it wants per instrument; turning that
//! into concrete orders, handling fills and reporting realised portfolio value
//! belong to the implementor.

use crate::domain::error::OrderError;
use chrono::NaiveDateTime;

pub trait OrderPort {
    /// Move `instrument` to `fraction` of portfolio value (0 liquidates).
    fn order_target_percent(
        &mut self,
        timestamp: NaiveDateTime,
        instrument: &str,
        fraction: f64,
    ) -> Result<(), OrderError>;
}
