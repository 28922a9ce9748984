//! Bar-by-bar capital simulation under fractional allocation.
//!
//! Going into bar `i`, every instrument whose signal was on at bar `i-1`
//! contributes `capital * allocation * (close[i] / close[i-1] - 1)`. The
//! allocation is applied per instrument with no cap on total exposure.

use crate::domain::signal::SignalFrame;
use chrono::NaiveDateTime;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub capital: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EquityPath {
    pub points: Vec<EquityPoint>,
}

impl EquityPath {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn initial(&self) -> Option<f64> {
        self.points.first().map(|p| p.capital)
    }

    pub fn final_capital(&self) -> Option<f64> {
        self.points.last().map(|p| p.capital)
    }

    fn push(&mut self, timestamp: NaiveDateTime, capital: f64) {
        self.points.push(EquityPoint { timestamp, capital });
    }

    /// Per-bar simple returns; a non-positive previous capital yields 0.
    pub fn returns(&self) -> Vec<f64> {
        self.points
            .windows(2)
            .map(|w| {
                let prev = w[0].capital;
                if prev > 0.0 {
                    w[1].capital / prev - 1.0
                } else {
                    0.0
                }
            })
            .collect()
    }
}

/// An instrument that could not be priced at one bar; it was treated as flat.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentFault {
    pub timestamp: NaiveDateTime,
    pub instrument: String,
    pub reason: String,
}

/// Running state carried from one bar to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    pub capital: f64,
    pub previous_closes: Vec<f64>,
    pub previous_signals: Vec<bool>,
}

impl SimulationState {
    pub fn new(initial_capital: f64, closes: Vec<f64>, signals: Vec<bool>) -> Self {
        Self {
            capital: initial_capital,
            previous_closes: closes,
            previous_signals: signals,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    pub equity: EquityPath,
    pub faults: Vec<InstrumentFault>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapitalSimulator {
    pub initial_capital: f64,
    pub allocation: f64,
}

impl CapitalSimulator {
    pub fn new(initial_capital: f64, allocation: f64) -> Self {
        Self {
            initial_capital,
            allocation,
        }
    }

    /// Advance `state` by one bar and return the P&L accrued on it.
    ///
    /// Only the previous bar's signals are consulted, so nothing observed at
    /// this bar can influence the position held over it. `codes`, `closes`,
    /// `signals` and `state` must all describe the same instruments in the
    /// same order.
    pub fn step(
        &self,
        state: &mut SimulationState,
        timestamp: NaiveDateTime,
        codes: &[&str],
        closes: &[f64],
        signals: &[bool],
        faults: &mut Vec<InstrumentFault>,
    ) -> f64 {
        debug_assert!(
            closes.len() == codes.len()
                && signals.len() == codes.len()
                && state.previous_closes.len() == codes.len()
                && state.previous_signals.len() == codes.len(),
            "step called with {} codes, {} closes, {} signals and a state for {} instruments",
            codes.len(),
            closes.len(),
            signals.len(),
            state.previous_closes.len(),
        );

        let mut pnl = 0.0;
        let previous = state.previous_closes.iter().zip(&state.previous_signals);
        for ((code, &close), (&prev_close, &was_on)) in codes.iter().zip(closes).zip(previous) {
            if !was_on {
                continue;
            }
            let ret = close / prev_close - 1.0;
            if !ret.is_finite() {
                tracing::warn!(
                    %timestamp,
                    instrument = *code,
                    "non-finite return, treating as flat"
                );
                faults.push(InstrumentFault {
                    timestamp,
                    instrument: code.to_string(),
                    reason: format!("non-finite return from close {close} after {prev_close}"),
                });
                continue;
            }
            pnl += state.capital * self.allocation * ret;
        }

        state.capital += pnl;
        state.previous_closes.clear();
        state.previous_closes.extend_from_slice(closes);
        state.previous_signals.clear();
        state.previous_signals.extend_from_slice(signals);
        pnl
    }

    pub fn run(&self, frame: &SignalFrame) -> SimulationOutcome {
        let mut equity = EquityPath::default();
        let mut faults = Vec::new();
        if frame.is_empty() {
            return SimulationOutcome { equity, faults };
        }

        let codes: Vec<&str> = frame.columns.iter().map(|c| c.code.as_str()).collect();
        let row = |i: usize| -> (Vec<f64>, Vec<bool>) {
            (
                frame.columns.iter().map(|c| c.closes[i]).collect(),
                frame.columns.iter().map(|c| c.signals[i]).collect(),
            )
        };

        let (closes, signals) = row(0);
        let mut state = SimulationState::new(self.initial_capital, closes, signals);
        equity.push(frame.timestamps[0], state.capital);

        for i in 1..frame.len() {
            let (closes, signals) = row(i);
            self.step(
                &mut state,
                frame.timestamps[i],
                &codes,
                &closes,
                &signals,
                &mut faults,
            );
            equity.push(frame.timestamps[i], state.capital);
        }

        SimulationOutcome { equity, faults }
    }
}
