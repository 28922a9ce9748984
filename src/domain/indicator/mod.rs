//! Trailing indicators over closing prices.
//!
//! - `IndicatorPoint`: one point of an indicator time series
//! - `IndicatorType`: indicator identity + parameters
//! - `IndicatorSeries`: a time series of indicator values, row-aligned with its input
//! - `IndicatorSet`: the SMA and momentum series for one instrument

pub mod momentum;
pub mod sma;

use crate::domain::ohlcv::Bar;
use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;

pub use momentum::{calculate_momentum, RollingMomentum};
pub use sma::{calculate_sma, RollingSma};

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub timestamp: NaiveDateTime,
    pub valid: bool,
    pub value: f64,
}

impl IndicatorPoint {
    pub fn get(&self) -> Option<f64> {
        self.valid.then_some(self.value)
    }
}

/// How momentum over the trailing window is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MomentumKind {
    /// `close[i] / close[i-n] - 1`
    #[default]
    Percent,
    /// `close[i] - close[i-n]`
    Difference,
}

impl FromStr for MomentumKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "percent" | "pct" | "momp" => Ok(MomentumKind::Percent),
            "difference" | "diff" | "mom" => Ok(MomentumKind::Difference),
            other => Err(format!(
                "unknown momentum kind '{}' (expected percent or difference)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Momentum { period: usize, kind: MomentumKind },
}

impl IndicatorType {
    /// Leading rows for which the indicator is undefined.
    pub fn warmup(&self) -> usize {
        match self {
            IndicatorType::Sma(period) => period.saturating_sub(1),
            IndicatorType::Momentum { period, .. } => *period,
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Momentum {
                period,
                kind: MomentumKind::Percent,
            } => write!(f, "MOMP({})", period),
            IndicatorType::Momentum {
                period,
                kind: MomentumKind::Difference,
            } => write!(f, "MOM({})", period),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

/// Indicators for a single instrument, row-aligned with its bars.
#[derive(Debug, Clone)]
pub struct IndicatorSet {
    pub code: String,
    pub sma: IndicatorSeries,
    pub momentum: IndicatorSeries,
}

impl IndicatorSet {
    pub fn compute(
        code: &str,
        bars: &[Bar],
        sma_period: usize,
        momentum_period: usize,
        kind: MomentumKind,
    ) -> Self {
        Self {
            code: code.to_string(),
            sma: calculate_sma(bars, sma_period),
            momentum: calculate_momentum(bars, momentum_period, kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_type_display() {
        assert_eq!(IndicatorType::Sma(20).to_string(), "SMA(20)");
        let momp = IndicatorType::Momentum {
            period: 10,
            kind: MomentumKind::Percent,
        };
        assert_eq!(momp.to_string(), "MOMP(10)");
        let mom = IndicatorType::Momentum {
            period: 3,
            kind: MomentumKind::Difference,
        };
        assert_eq!(mom.to_string(), "MOM(3)");
    }

    #[test]
    fn warmup_rows() {
        assert_eq!(IndicatorType::Sma(20).warmup(), 19);
        assert_eq!(IndicatorType::Sma(1).warmup(), 0);
        let mom = IndicatorType::Momentum {
            period: 10,
            kind: MomentumKind::Percent,
        };
        assert_eq!(mom.warmup(), 10);
    }

    #[test]
    fn momentum_kind_parse() {
        assert_eq!("percent".parse::<MomentumKind>(), Ok(MomentumKind::Percent));
        assert_eq!("MOM".parse::<MomentumKind>(), Ok(MomentumKind::Difference));
        assert_eq!(" diff ".parse::<MomentumKind>(), Ok(MomentumKind::Difference));
        assert!("log".parse::<MomentumKind>().is_err());
        assert_eq!(MomentumKind::default(), MomentumKind::Percent);
    }

    #[test]
    fn point_get_respects_validity() {
        let ts = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let invalid = IndicatorPoint {
            timestamp: ts,
            valid: false,
            value: 0.0,
        };
        assert_eq!(invalid.get(), None);
        let valid = IndicatorPoint {
            timestamp: ts,
            valid: true,
            value: 1.5,
        };
        assert_eq!(valid.get(), Some(1.5));
    }
}
