//! Aligned multi-instrument frame (inner join on timestamp).

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::{Bar, InstrumentSeries};
use chrono::NaiveDateTime;
use std::collections::{BTreeSet, HashMap};

/// Column of bars for one instrument, row-aligned with the frame timestamps.
#[derive(Debug, Clone)]
pub struct InstrumentColumn {
    pub code: String,
    pub bars: Vec<Bar>,
}

#[derive(Debug, Clone)]
pub struct AlignedFrame {
    pub timestamps: Vec<NaiveDateTime>,
    pub columns: Vec<InstrumentColumn>,
}

impl AlignedFrame {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Timestamps present in every series, ascending.
pub fn common_timestamps(series: &[InstrumentSeries]) -> Vec<NaiveDateTime> {
    let mut iter = series.iter();
    let Some(first) = iter.next() else {
        return Vec::new();
    };
    let mut common: BTreeSet<NaiveDateTime> = first.bars.iter().map(|b| b.timestamp).collect();
    for s in iter {
        let stamps: BTreeSet<NaiveDateTime> = s.bars.iter().map(|b| b.timestamp).collect();
        common.retain(|t| stamps.contains(t));
    }
    common.into_iter().collect()
}

/// Inner-join the series on timestamp. Rows missing from any one series are
/// dropped for all of them; nothing is forward-filled.
pub fn align(series: &[InstrumentSeries]) -> Result<AlignedFrame, BacktestError> {
    let timestamps = common_timestamps(series);
    if timestamps.is_empty() {
        return Err(BacktestError::EmptyAlignedFrame {
            instruments: series.iter().map(|s| s.code.clone()).collect(),
        });
    }

    let columns = series
        .iter()
        .map(|s| {
            let index: HashMap<NaiveDateTime, &Bar> =
                s.bars.iter().map(|b| (b.timestamp, b)).collect();
            let bars = timestamps
                .iter()
                .filter_map(|t| index.get(t).map(|&b| b.clone()))
                .collect();
            InstrumentColumn {
                code: s.code.clone(),
                bars,
            }
        })
        .collect();

    Ok(AlignedFrame {
        timestamps,
        columns,
    })
}
