//! CSV file data adapter.
//!
//! One file per instrument, `<base>/<CODE>.csv` unless overridden. Rows are
//! either `date,time,open,high,low,close,volume` (MetaTrader/HistData
//! export) or `datetime,open,high,low,close,volume`.

use crate::domain::error::{BacktestError, MalformedRecord};
use crate::domain::ohlcv::{Bar, InstrumentSeries};
use crate::domain::timeframe::parse_timestamp;
use crate::ports::data_port::{DataPort, LoadedSeries};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct CsvAdapter {
    base_path: PathBuf,
    files: HashMap<String, PathBuf>,
    has_headers: bool,
    strict: bool,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            files: HashMap::new(),
            has_headers: false,
            strict: false,
        }
    }

    /// Read `code` from `path` instead of the default location.
    pub fn with_file(mut self, code: &str, path: impl Into<PathBuf>) -> Self {
        self.files.insert(code.to_uppercase(), path.into());
        self
    }

    pub fn has_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    /// Fail on the first malformed row instead of skipping it.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn csv_path(&self, code: &str) -> PathBuf {
        match self.files.get(&code.to_uppercase()) {
            Some(path) => path.clone(),
            None => self.base_path.join(format!("{}.csv", code)),
        }
    }

    fn read_bars(
        &self,
        code: &str,
        path: &Path,
    ) -> Result<(Vec<Bar>, Vec<MalformedRecord>), BacktestError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(self.has_headers)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| BacktestError::DataRead {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let mut bars = Vec::new();
        let mut rejected = Vec::new();

        for (index, result) in rdr.records().enumerate() {
            let parsed = match result {
                Ok(record) => {
                    let line = record
                        .position()
                        .map(|p| p.line())
                        .unwrap_or(index as u64 + 1);
                    parse_record(&record).map_err(|reason| MalformedRecord::new(line, reason))
                }
                Err(e) => {
                    if let csv::ErrorKind::Io(_) = e.kind() {
                        return Err(BacktestError::DataRead {
                            path: path.display().to_string(),
                            reason: e.to_string(),
                        });
                    }
                    let line = e
                        .position()
                        .map(|p| p.line())
                        .unwrap_or(index as u64 + 1);
                    Err(MalformedRecord::new(line, e.to_string()))
                }
            };

            match parsed {
                Ok(bar) => bars.push(bar),
                Err(rec) => {
                    if self.strict {
                        return Err(rec.into());
                    }
                    tracing::warn!(
                        instrument = code,
                        path = %path.display(),
                        line = rec.line,
                        reason = %rec.reason,
                        "skipping malformed record"
                    );
                    rejected.push(rec);
                }
            }
        }

        Ok((bars, rejected))
    }
}

fn parse_record(record: &csv::StringRecord) -> Result<Bar, String> {
    let (timestamp, prices) = match record.len() {
        7 => (format!("{} {}", &record[0], &record[1]), 2),
        6 => (record[0].to_string(), 1),
        n => return Err(format!("expected 6 or 7 fields, found {}", n)),
    };

    let timestamp =
        parse_timestamp(&timestamp).ok_or_else(|| format!("invalid timestamp '{}'", timestamp))?;

    let field = |offset: usize, name: &str| -> Result<f64, String> {
        let raw = &record[prices + offset];
        raw.parse::<f64>()
            .map_err(|_| format!("invalid {} value '{}'", name, raw))
    };

    let bar = Bar {
        timestamp,
        open: field(0, "open")?,
        high: field(1, "high")?,
        low: field(2, "low")?,
        close: field(3, "close")?,
        volume: field(4, "volume")?,
    };

    match bar.defect() {
        Some(reason) => Err(reason.to_string()),
        None => Ok(bar),
    }
}

impl DataPort for CsvAdapter {
    fn load_observations(&self, code: &str) -> Result<LoadedSeries, BacktestError> {
        let path = self.csv_path(code);
        let source = path.display().to_string();
        let (bars, rejected) = self.read_bars(code, &path)?;

        if bars.is_empty() {
            return Err(BacktestError::EmptyInput {
                code: code.to_string(),
                path: source,
            });
        }

        let (series, duplicates) = InstrumentSeries::from_observations(code, bars);
        Ok(LoadedSeries {
            series,
            source,
            rejected,
            duplicates,
        })
    }
}
