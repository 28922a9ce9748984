//! Strategy parameters.

use crate::domain::indicator::{IndicatorType, MomentumKind};

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub name: String,
    pub sma_period: usize,
    pub momentum_period: usize,
    pub momentum_kind: MomentumKind,
    /// Fraction of capital applied per instrument while its signal is on.
    /// Applied independently per instrument, so total notional can exceed 1.
    pub allocation: f64,
}

impl Strategy {
    pub fn indicators(&self) -> [IndicatorType; 2] {
        [
            IndicatorType::Sma(self.sma_period),
            IndicatorType::Momentum {
                period: self.momentum_period,
                kind: self.momentum_kind,
            },
        ]
    }

    /// Number of leading rows dropped before the first tradable bar.
    pub fn warmup(&self) -> usize {
        self.indicators()
            .iter()
            .map(IndicatorType::warmup)
            .max()
            .unwrap_or(0)
    }
}

impl Default for Strategy {
    /// Intraday parameters: 4h bars, SMA(20), 10-bar percent momentum, 60%.
    fn default() -> Self {
        Strategy {
            name: "Metal Momentum".into(),
            sma_period: 20,
            momentum_period: 10,
            momentum_kind: MomentumKind::Percent,
            allocation: 0.60,
        }
    }
}
