//! SMA (Simple Moving Average).
//!
//! SMA(n)[i] = mean(C[i-n+1..=i])
//! Warmup: first (n-1) bars invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::Bar;
use std::collections::VecDeque;

/// Trailing mean maintained with a running sum over a bounded queue.
#[derive(Debug, Clone)]
pub struct RollingSma {
    period: usize,
    window: VecDeque<f64>,
    sum: f64,
}

impl RollingSma {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            window: VecDeque::with_capacity(period + 1),
            sum: 0.0,
        }
    }

    /// Push the next close; returns the mean once `period` values are held.
    pub fn update(&mut self, close: f64) -> Option<f64> {
        if self.period == 0 {
            return None;
        }
        self.window.push_back(close);
        self.sum += close;
        if self.window.len() > self.period {
            if let Some(evicted) = self.window.pop_front() {
                self.sum -= evicted;
            }
        }
        (self.window.len() == self.period).then(|| self.sum / self.period as f64)
    }
}

pub fn calculate_sma(bars: &[Bar], period: usize) -> IndicatorSeries {
    let mut rolling = RollingSma::new(period);
    let values = bars
        .iter()
        .map(|bar| {
            let mean = rolling.update(bar.close);
            IndicatorPoint {
                timestamp: bar.timestamp,
                valid: mean.is_some(),
                value: mean.unwrap_or(0.0),
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}
