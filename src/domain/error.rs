//! Domain error types.

use crate::domain::universe::UniverseError;

/// A raw observation that could not be turned into a bar.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("malformed record at line {line}: {reason}")]
pub struct MalformedRecord {
    pub line: u64,
    pub reason: String,
}

impl MalformedRecord {
    pub fn new(line: u64, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

/// Rejection reported by the platform order layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("order for {instrument} rejected: {reason}")]
pub struct OrderError {
    pub instrument: String,
    pub reason: String,
}

/// Top-level error type for metaltrend.
#[derive(Debug, thiserror::Error)]
pub enum BacktestError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Universe(#[from] UniverseError),

    #[error("failed to read {path}: {reason}")]
    DataRead { path: String, reason: String },

    #[error("no usable observations for {code} in {path}")]
    EmptyInput { code: String, path: String },

    #[error(transparent)]
    MalformedRecord(#[from] MalformedRecord),

    #[error("no overlapping timestamps across {}", instruments.join(", "))]
    EmptyAlignedFrame { instruments: Vec<String> },

    #[error("insufficient data: have {bars} aligned bars, warm-up needs more than {required}")]
    InsufficientWindow { bars: usize, required: usize },

    #[error("failed to write report {path}: {reason}")]
    Report { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&BacktestError> for std::process::ExitCode {
    fn from(err: &BacktestError) -> Self {
        let code: u8 = match err {
            BacktestError::Io(_) | BacktestError::Report { .. } => 1,
            BacktestError::ConfigParse { .. }
            | BacktestError::ConfigMissing { .. }
            | BacktestError::ConfigInvalid { .. }
            | BacktestError::Universe(_) => 2,
            BacktestError::DataRead { .. }
            | BacktestError::EmptyInput { .. }
            | BacktestError::MalformedRecord(_) => 3,
            BacktestError::EmptyAlignedFrame { .. } | BacktestError::InsufficientWindow { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
