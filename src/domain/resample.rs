//! Aggregation of raw observations into fixed-interval bars.
//!
//! Open = first observation in the bucket, High = max, Low = min,
//! Close = last, Volume = sum. Buckets without observations are dropped.

use crate::domain::ohlcv::{Bar, InstrumentSeries};
use crate::domain::timeframe::Timeframe;

/// Accumulates observations that fall into one bucket.
struct BarBuilder {
    start: chrono::NaiveDateTime,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl BarBuilder {
    fn new(start: chrono::NaiveDateTime, bar: &Bar) -> Self {
        Self {
            start,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }

    fn update(&mut self, bar: &Bar) {
        self.high = self.high.max(bar.high);
        self.low = self.low.min(bar.low);
        self.close = bar.close;
        self.volume += bar.volume;
    }

    fn build(self) -> Bar {
        Bar {
            timestamp: self.start,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }
}

/// Resample an ascending series to `timeframe`, labelling each bar with the
/// start of its bucket.
pub fn resample(series: &InstrumentSeries, timeframe: Timeframe) -> InstrumentSeries {
    let mut bars = Vec::new();
    let mut current: Option<BarBuilder> = None;

    for bar in &series.bars {
        let start = timeframe.bucket_start(bar.timestamp);
        match current.as_mut() {
            Some(builder) if builder.start == start => builder.update(bar),
            _ => {
                if let Some(done) = current.take() {
                    bars.push(done.build());
                }
                current = Some(BarBuilder::new(start, bar));
            }
        }
    }

    if let Some(done) = current {
        bars.push(done.build());
    }

    InstrumentSeries {
        code: series.code.clone(),
        bars,
    }
}
