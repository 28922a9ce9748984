//! Equity path CSV writer implementing ReportPort.

use std::fs;
use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::BacktestError;
use crate::ports::report_port::ReportPort;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Writes `timestamp,capital`, one row per equity point.
#[derive(Debug, Clone, Copy)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), BacktestError> {
        let report_err = |reason: String| BacktestError::Report {
            path: output_path.display().to_string(),
            reason,
        };

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(BacktestError::Io)?;
            }
        }

        let mut wtr = csv::Writer::from_path(output_path).map_err(|e| report_err(e.to_string()))?;
        wtr.write_record(["timestamp", "capital"])
            .map_err(|e| report_err(e.to_string()))?;
        for point in &result.equity.points {
            wtr.write_record([
                point.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                format!("{:.2}", point.capital),
            ])
            .map_err(|e| report_err(e.to_string()))?;
        }
        wtr.flush().map_err(BacktestError::Io)?;

        tracing::info!(
            path = %output_path.display(),
            rows = result.equity.len(),
            "equity path written"
        );
        Ok(())
    }
}
