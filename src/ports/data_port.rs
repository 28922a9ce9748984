//! Data access port trait.

use crate::domain::error::{BacktestError, MalformedRecord};
use crate::domain::ohlcv::InstrumentSeries;

/// Raw observations for one instrument plus what ingestion had to discard.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub series: InstrumentSeries,
    pub source: String,
    pub rejected: Vec<MalformedRecord>,
    pub duplicates: usize,
}

pub trait DataPort {
    /// Load every usable raw observation for `code`, sorted ascending with
    /// duplicate timestamps removed.
    fn load_observations(&self, code: &str) -> Result<LoadedSeries, BacktestError>;
}
