//! Momentum over a trailing window.
//!
//! Percent:    MOMP(n)[i] = C[i] / C[i-n] - 1   (0 if C[i-n] == 0)
//! Difference: MOM(n)[i]  = C[i] - C[i-n]
//! Warmup: first n bars invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, MomentumKind};
use crate::domain::ohlcv::Bar;
use std::collections::VecDeque;

/// Holds the last `period + 1` closes.
#[derive(Debug, Clone)]
pub struct RollingMomentum {
    period: usize,
    kind: MomentumKind,
    window: VecDeque<f64>,
}

impl RollingMomentum {
    pub fn new(period: usize, kind: MomentumKind) -> Self {
        Self {
            period,
            kind,
            window: VecDeque::with_capacity(period + 2),
        }
    }

    pub fn update(&mut self, close: f64) -> Option<f64> {
        self.window.push_back(close);
        if self.window.len() > self.period + 1 {
            self.window.pop_front();
        }
        if self.window.len() <= self.period {
            return None;
        }
        let base = *self.window.front()?;
        Some(match self.kind {
            MomentumKind::Percent if base == 0.0 => 0.0,
            MomentumKind::Percent => close / base - 1.0,
            MomentumKind::Difference => close - base,
        })
    }
}

pub fn calculate_momentum(bars: &[Bar], period: usize, kind: MomentumKind) -> IndicatorSeries {
    let mut rolling = RollingMomentum::new(period, kind);
    let values = bars
        .iter()
        .map(|bar| {
            let value = rolling.update(bar.close);
            IndicatorPoint {
                timestamp: bar.timestamp,
                valid: value.is_some(),
                value: value.unwrap_or(0.0),
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Momentum { period, kind },
        values,
    }
}
