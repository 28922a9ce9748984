//! Core domain types and logic.

pub mod ohlcv;
pub mod timeframe;
pub mod resample;
pub mod frame;
pub mod indicator;
pub mod strategy;
pub mod signal;
pub mod simulation;
pub mod allocation;
pub mod metrics;
pub mod backtest;
pub mod universe;
pub mod config_validation;
pub mod error;
