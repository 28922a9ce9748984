//! Configuration validation.
//!
//! Validates all config fields before a run starts, so a bad value fails
//! fast with the section and key that caused it.

use crate::domain::error::BacktestError;
use crate::domain::indicator::MomentumKind;
use crate::domain::timeframe::{parse_timestamp, Timeframe};
use crate::domain::universe::parse_instruments;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDateTime;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    validate_instruments(config)?;
    validate_initial_capital(config)?;
    validate_allocation(config)?;
    validate_periods_per_year(config)?;
    validate_evaluation_fraction(config)?;
    validate_timeframe(config)?;
    validate_window(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    validate_period(config, "sma_period")?;
    validate_period(config, "momentum_period")?;
    validate_momentum_kind(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> BacktestError {
    BacktestError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_instruments(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    match config.get_nonempty("backtest", "instruments") {
        None => Err(BacktestError::ConfigMissing {
            section: "backtest".to_string(),
            key: "instruments".to_string(),
        }),
        Some(s) => parse_instruments(&s)
            .map(|_| ())
            .map_err(|e| invalid("backtest", "instruments", e.to_string())),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let value = config.get_f64("backtest", "initial_capital", 100_000.0)?;
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_allocation(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let value = config.get_f64("backtest", "allocation", 0.6)?;
    if !(value > 0.0 && value <= 1.0) {
        return Err(invalid(
            "backtest",
            "allocation",
            "allocation must be in (0, 1]",
        ));
    }
    Ok(())
}

fn validate_periods_per_year(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let value = config.get_f64("backtest", "periods_per_year", 252.0)?;
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(
            "backtest",
            "periods_per_year",
            "periods_per_year must be positive",
        ));
    }
    Ok(())
}

fn validate_evaluation_fraction(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let value = config.get_f64("backtest", "evaluation_fraction", 1.0)?;
    if !(value > 0.0 && value <= 1.0) {
        return Err(invalid(
            "backtest",
            "evaluation_fraction",
            "evaluation_fraction must be in (0, 1]",
        ));
    }
    Ok(())
}

fn validate_timeframe(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    if let Some(s) = config.get_nonempty("data", "timeframe") {
        s.parse::<Timeframe>()
            .map_err(|e| invalid("data", "timeframe", e.to_string()))?;
    }
    Ok(())
}

fn validate_window(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let start = parse_bound(config, "start")?;
    let end = parse_bound(config, "end")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(invalid("data", "start", "start must be before end"));
        }
    }
    Ok(())
}

/// Optional `[data] start` / `end` timestamp.
pub fn parse_bound(
    config: &dyn ConfigPort,
    key: &str,
) -> Result<Option<NaiveDateTime>, BacktestError> {
    match config.get_nonempty("data", key) {
        None => Ok(None),
        Some(s) => parse_timestamp(&s).map(Some).ok_or_else(|| {
            invalid(
                "data",
                key,
                format!("invalid {key} '{s}', expected YYYY-MM-DD or YYYY-MM-DD HH:MM"),
            )
        }),
    }
}

fn validate_period(config: &dyn ConfigPort, key: &str) -> Result<(), BacktestError> {
    if config.get_nonempty("strategy", key).is_none() {
        return Ok(());
    }
    let value = config.get_i64("strategy", key, 0)?;
    if value < 1 {
        return Err(invalid(
            "strategy",
            key,
            format!("{key} must be a positive integer"),
        ));
    }
    Ok(())
}

fn validate_momentum_kind(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    if let Some(s) = config.get_nonempty("strategy", "momentum") {
        s.parse::<MomentumKind>()
            .map_err(|e| invalid("strategy", "momentum", e.to_string()))?;
    }
    Ok(())
}
