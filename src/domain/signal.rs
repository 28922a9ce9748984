//! Signal generation over the aligned frame.
//!
//! A signal is `close > SMA && momentum > 0`, strict on both sides, computed
//! from the indicators of the same bar only. Warm-up rows, where either
//! indicator is undefined, are dropped.

use crate::domain::error::BacktestError;
use crate::domain::frame::AlignedFrame;
use crate::domain::indicator::IndicatorSet;
use crate::domain::strategy::Strategy;
use chrono::NaiveDateTime;

pub fn evaluate(close: f64, sma: f64, momentum: f64) -> bool {
    close > sma && momentum > 0.0
}

/// Tradable closes and signals for one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalColumn {
    pub code: String,
    pub closes: Vec<f64>,
    pub signals: Vec<bool>,
}

/// Rows of the aligned frame from the first bar on which every indicator
/// is defined.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalFrame {
    pub timestamps: Vec<NaiveDateTime>,
    pub columns: Vec<SignalColumn>,
    /// Aligned-frame rows dropped ahead of `timestamps[0]`.
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalSummary {
    pub code: String,
    pub active_bars: usize,
    pub total_bars: usize,
}

impl SignalSummary {
    pub fn active_share(&self) -> f64 {
        if self.total_bars > 0 {
            self.active_bars as f64 / self.total_bars as f64
        } else {
            0.0
        }
    }
}

impl SignalFrame {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Keep the trailing `fraction` of rows, starting at
    /// `floor(len * (1 - fraction))`.
    pub fn tail(&self, fraction: f64) -> SignalFrame {
        let fraction = fraction.clamp(0.0, 1.0);
        let start = ((self.len() as f64) * (1.0 - fraction)) as usize;
        let start = start.min(self.len());
        SignalFrame {
            timestamps: self.timestamps[start..].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|c| SignalColumn {
                    code: c.code.clone(),
                    closes: c.closes[start..].to_vec(),
                    signals: c.signals[start..].to_vec(),
                })
                .collect(),
            offset: self.offset + start,
        }
    }

    pub fn summaries(&self) -> Vec<SignalSummary> {
        self.columns
            .iter()
            .map(|c| SignalSummary {
                code: c.code.clone(),
                active_bars: c.signals.iter().filter(|&&s| s).count(),
                total_bars: c.signals.len(),
            })
            .collect()
    }
}

pub fn build_signal_frame(
    frame: &AlignedFrame,
    strategy: &Strategy,
) -> Result<SignalFrame, BacktestError> {
    let warmup = strategy.warmup();
    if frame.len() <= warmup {
        return Err(BacktestError::InsufficientWindow {
            bars: frame.len(),
            required: warmup,
        });
    }

    let columns = frame
        .columns
        .iter()
        .map(|column| {
            let set = IndicatorSet::compute(
                &column.code,
                &column.bars,
                strategy.sma_period,
                strategy.momentum_period,
                strategy.momentum_kind,
            );
            let signals = (warmup..frame.len())
                .map(|i| {
                    match (set.sma.values[i].get(), set.momentum.values[i].get()) {
                        (Some(sma), Some(momentum)) => {
                            evaluate(column.bars[i].close, sma, momentum)
                        }
                        _ => false,
                    }
                })
                .collect();
            SignalColumn {
                code: column.code.clone(),
                closes: column.bars[warmup..].iter().map(|b| b.close).collect(),
                signals,
            }
        })
        .collect();

    Ok(SignalFrame {
        timestamps: frame.timestamps[warmup..].to_vec(),
        columns,
        offset: warmup,
    })
}
