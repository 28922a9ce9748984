//! Backtest pipeline: resample, align, signal, simulate, evaluate.
//!
//! [`BacktestConfig`] holds the run parameters that are not part of the
//! strategy itself.

use crate::domain::error::BacktestError;
use crate::domain::frame::align;
use crate::domain::metrics::{Metrics, DEFAULT_PERIODS_PER_YEAR};
use crate::domain::ohlcv::InstrumentSeries;
use crate::domain::resample::resample;
use crate::domain::signal::{build_signal_frame, SignalFrame, SignalSummary};
use crate::domain::simulation::{CapitalSimulator, EquityPath, InstrumentFault};
use crate::domain::strategy::Strategy;
use crate::domain::timeframe::Timeframe;
use chrono::NaiveDateTime;

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub timeframe: Timeframe,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub initial_capital: f64,
    pub periods_per_year: f64,
    /// Trailing share of tradable rows that is simulated.
    pub evaluation_fraction: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            timeframe: Timeframe::FOUR_HOURS,
            start: None,
            end: None,
            initial_capital: 100_000.0,
            periods_per_year: DEFAULT_PERIODS_PER_YEAR,
            evaluation_fraction: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    /// Rows in the aligned frame, warm-up included.
    pub aligned_bars: usize,
    /// Tradable rows inside the evaluation window.
    pub signals: SignalFrame,
    pub equity: EquityPath,
    pub faults: Vec<InstrumentFault>,
    pub metrics: Metrics,
    pub summaries: Vec<SignalSummary>,
}

pub fn run_backtest(
    series: &[InstrumentSeries],
    strategy: &Strategy,
    config: &BacktestConfig,
) -> Result<BacktestResult, BacktestError> {
    let resampled: Vec<InstrumentSeries> = series
        .iter()
        .map(|s| resample(s, config.timeframe))
        .collect();
    for s in &resampled {
        tracing::info!(
            instrument = %s.code,
            timeframe = %config.timeframe,
            bars = s.len(),
            "resampled"
        );
    }

    let frame = align(&resampled)?;
    tracing::info!(bars = frame.len(), instruments = frame.columns.len(), "aligned");

    let tradable = build_signal_frame(&frame, strategy)?;
    let signals = tradable.tail(config.evaluation_fraction);
    tracing::info!(
        warmup = tradable.offset,
        tradable = tradable.len(),
        evaluated = signals.len(),
        "signals generated"
    );

    let simulator = CapitalSimulator::new(config.initial_capital, strategy.allocation);
    let outcome = simulator.run(&signals);
    let metrics = Metrics::compute(&outcome.equity, config.periods_per_year);
    tracing::info!(
        points = outcome.equity.len(),
        faults = outcome.faults.len(),
        total_return = metrics.total_return,
        "simulation complete"
    );

    let summaries = signals.summaries();
    Ok(BacktestResult {
        aligned_bars: frame.len(),
        signals,
        equity: outcome.equity,
        faults: outcome.faults,
        metrics,
        summaries,
    })
}
