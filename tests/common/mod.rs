#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use metaltrend::domain::backtest::BacktestConfig;
use metaltrend::domain::error::BacktestError;
pub use metaltrend::domain::ohlcv::{Bar, InstrumentSeries};
use metaltrend::domain::strategy::Strategy;
use metaltrend::domain::timeframe::Timeframe;
use metaltrend::ports::data_port::{DataPort, LoadedSeries};
use std::collections::HashMap;
use std::path::Path;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn load_observations(&self, code: &str) -> Result<LoadedSeries, BacktestError> {
        let source = format!("mock://{code}");
        if let Some(reason) = self.errors.get(code) {
            return Err(BacktestError::DataRead {
                path: source,
                reason: reason.clone(),
            });
        }
        let bars = self.data.get(code).cloned().unwrap_or_default();
        let (series, duplicates) = InstrumentSeries::from_observations(code, bars);
        Ok(LoadedSeries {
            series,
            source,
            rejected: Vec::new(),
            duplicates,
        })
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn make_bar(timestamp: NaiveDateTime, close: f64) -> Bar {
    Bar {
        timestamp,
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 100.0,
    }
}

/// `count` bars starting at `start`, `step` apart, with closes from `close`.
pub fn generate_bars(
    start: NaiveDateTime,
    step: Duration,
    count: usize,
    close: impl Fn(usize) -> f64,
) -> Vec<Bar> {
    (0..count)
        .map(|i| make_bar(start + step * i as i32, close(i)))
        .collect()
}

pub fn daily_series(code: &str, closes: &[f64]) -> InstrumentSeries {
    InstrumentSeries {
        code: code.to_string(),
        bars: generate_bars(date(2024, 1, 1), Duration::days(1), closes.len(), |i| {
            closes[i]
        }),
    }
}

pub fn short_strategy(sma_period: usize, momentum_period: usize) -> Strategy {
    Strategy {
        name: "Test".into(),
        sma_period,
        momentum_period,
        ..Strategy::default()
    }
}

pub fn daily_config() -> BacktestConfig {
    BacktestConfig {
        timeframe: Timeframe::DAILY,
        ..BacktestConfig::default()
    }
}

/// Write bars as `date,time,open,high,low,close,volume` rows.
pub fn write_minute_csv(path: &Path, bars: &[Bar]) {
    let mut content = String::new();
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            b.timestamp.format("%Y.%m.%d"),
            b.timestamp.format("%H:%M"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    std::fs::write(path, content).unwrap();
}
