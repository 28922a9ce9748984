//! Order port that records target-percent intents instead of trading.

use crate::domain::error::OrderError;
use crate::ports::order_port::OrderPort;
use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct OrderIntent {
    pub timestamp: NaiveDateTime,
    pub instrument: String,
    pub fraction: f64,
}

#[derive(Debug, Default)]
pub struct RecordingOrderAdapter {
    intents: Vec<OrderIntent>,
}

impl RecordingOrderAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_intents(self) -> Vec<OrderIntent> {
        self.intents
    }
}

impl OrderPort for RecordingOrderAdapter {
    fn order_target_percent(
        &mut self,
        timestamp: NaiveDateTime,
        instrument: &str,
        fraction: f64,
    ) -> Result<(), OrderError> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(OrderError {
                instrument: instrument.to_string(),
                reason: format!("target fraction {} outside [0, 1]", fraction),
            });
        }
        tracing::debug!(%timestamp, instrument, fraction, "order target percent");
        self.intents.push(OrderIntent {
            timestamp,
            instrument: instrument.to_string(),
            fraction,
        });
        Ok(())
    }
}
