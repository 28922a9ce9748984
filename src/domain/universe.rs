//! Instrument universe: parses the configured instrument list and loads
//! each instrument through a [`DataPort`].
//!
//! Every instrument must load; an unreadable or empty input aborts the run
//! before any simulation, since the aligned frame needs all of them.

use crate::domain::error::BacktestError;
use crate::ports::data_port::{DataPort, LoadedSeries};
use chrono::NaiveDateTime;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct Universe {
    pub codes: Vec<String>,
}

impl Universe {
    pub fn count(&self) -> usize {
        self.codes.len()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in instrument list")]
    EmptyToken,

    #[error("duplicate instrument: {0}")]
    DuplicateCode(String),
}

pub fn parse_instruments(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(UniverseError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}

/// Load every instrument, restricted to the inclusive `[start, end]` window.
pub fn load_universe(
    data_port: &dyn DataPort,
    universe: &Universe,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
) -> Result<Vec<LoadedSeries>, BacktestError> {
    let mut loaded = Vec::with_capacity(universe.count());

    for code in &universe.codes {
        let mut data = data_port.load_observations(code)?;
        data.series = data.series.within(start, end);

        if data.series.is_empty() {
            return Err(BacktestError::EmptyInput {
                code: code.clone(),
                path: data.source,
            });
        }

        if !data.rejected.is_empty() || data.duplicates > 0 {
            tracing::warn!(
                instrument = %code,
                rejected = data.rejected.len(),
                duplicates = data.duplicates,
                "dropped raw observations"
            );
        }
        tracing::info!(
            instrument = %code,
            observations = data.series.len(),
            source = %data.source,
            "loaded"
        );
        loaded.push(data);
    }

    Ok(loaded)
}
