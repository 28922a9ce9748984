//! OHLCV bar and per-instrument series.

use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Reason the bar is unusable, if any: every field finite and close > 0.
    pub fn defect(&self) -> Option<&'static str> {
        let fields = [self.open, self.high, self.low, self.close, self.volume];
        if fields.iter().any(|v| !v.is_finite()) {
            Some("non-finite price or volume")
        } else if self.close <= 0.0 {
            Some("close must be positive")
        } else {
            None
        }
    }
}

/// Bars for one instrument with strictly increasing timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentSeries {
    pub code: String,
    pub bars: Vec<Bar>,
}

impl InstrumentSeries {
    /// Sort observations by timestamp and drop duplicate timestamps.
    ///
    /// The sort is stable, so among bars sharing a timestamp the one that
    /// appeared first in the input is kept. Returns the series and the number
    /// of duplicates dropped.
    pub fn from_observations(code: impl Into<String>, mut bars: Vec<Bar>) -> (Self, usize) {
        bars.sort_by_key(|b| b.timestamp);
        let before = bars.len();
        bars.dedup_by_key(|b| b.timestamp);
        let dropped = before - bars.len();
        (
            Self {
                code: code.into(),
                bars,
            },
            dropped,
        )
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.bars.first().map(|b| b.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.bars.last().map(|b| b.timestamp)
    }

    /// Keep only bars inside the inclusive `[start, end]` window.
    pub fn within(self, start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        let bars = self
            .bars
            .into_iter()
            .filter(|b| start.is_none_or(|s| b.timestamp >= s))
            .filter(|b| end.is_none_or(|e| b.timestamp <= e))
            .collect();
        Self {
            code: self.code,
            bars,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn bar(timestamp: NaiveDateTime, close: f64) -> Bar {
        Bar {
            timestamp,
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 10.0,
        }
    }

    #[test]
    fn defect_free_bar() {
        assert_eq!(bar(ts(2, 0), 2050.0).defect(), None);
    }

    #[test]
    fn defect_non_positive_close() {
        assert_eq!(bar(ts(2, 0), 0.0).defect(), Some("close must be positive"));
        assert_eq!(bar(ts(2, 0), -1.0).defect(), Some("close must be positive"));
    }

    #[test]
    fn defect_non_finite() {
        let mut b = bar(ts(2, 0), 10.0);
        b.volume = f64::NAN;
        assert_eq!(b.defect(), Some("non-finite price or volume"));
    }

    #[test]
    fn from_observations_sorts() {
        let bars = vec![bar(ts(3, 0), 3.0), bar(ts(1, 0), 1.0), bar(ts(2, 0), 2.0)];
        let (series, dropped) = InstrumentSeries::from_observations("XAU", bars);
        assert_eq!(dropped, 0);
        let closes: Vec<f64> = series.bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn from_observations_keeps_first_duplicate() {
        let bars = vec![
            bar(ts(2, 0), 20.0),
            bar(ts(1, 0), 10.0),
            bar(ts(2, 0), 21.0),
            bar(ts(2, 0), 22.0),
        ];
        let (series, dropped) = InstrumentSeries::from_observations("XAG", bars);
        assert_eq!(dropped, 2);
        assert_eq!(series.len(), 2);
        assert_eq!(series.bars[1].close, 20.0);
    }

    #[test]
    fn within_is_inclusive() {
        let bars = (1..=5).map(|d| bar(ts(d, 0), d as f64)).collect();
        let (series, _) = InstrumentSeries::from_observations("XAU", bars);
        let window = series.within(Some(ts(2, 0)), Some(ts(4, 0)));
        assert_eq!(window.len(), 3);
        assert_eq!(window.first_timestamp(), Some(ts(2, 0)));
        assert_eq!(window.last_timestamp(), Some(ts(4, 0)));
    }

    #[test]
    fn within_open_ended() {
        let bars = (1..=5).map(|d| bar(ts(d, 0), d as f64)).collect();
        let (series, _) = InstrumentSeries::from_observations("XAU", bars);
        assert_eq!(series.clone().within(None, None).len(), 5);
        assert_eq!(series.within(Some(ts(4, 0)), None).len(), 2);
    }
}
