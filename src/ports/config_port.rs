//! Configuration access port trait.
//!
//! Implementors only supply raw lookups; typed getters parse on top of them
//! and report an unparsable value as `ConfigInvalid` rather than falling back
//! to the default.

use crate::domain::error::BacktestError;
use std::str::FromStr;

pub trait ConfigPort {
    /// Raw value, `None` when the section or key is absent.
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// Trimmed, non-empty value, or `None`.
    fn get_nonempty(&self, section: &str, key: &str) -> Option<String> {
        self.get_string(section, key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn get_f64(&self, section: &str, key: &str, default: f64) -> Result<f64, BacktestError> {
        parse_or(self.get_nonempty(section, key), section, key, default)
    }

    fn get_i64(&self, section: &str, key: &str, default: i64) -> Result<i64, BacktestError> {
        parse_or(self.get_nonempty(section, key), section, key, default)
    }

    /// `true`/`yes`/`on`/`1` or `false`/`no`/`off`/`0`, case-insensitive.
    fn get_flag(&self, section: &str, key: &str, default: bool) -> Result<bool, BacktestError> {
        let Some(raw) = self.get_nonempty(section, key) else {
            return Ok(default);
        };
        match raw.to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(BacktestError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("expected a boolean, got '{raw}'"),
            }),
        }
    }
}

fn parse_or<T: FromStr>(
    raw: Option<String>,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, BacktestError> {
    match raw {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| BacktestError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("'{raw}' is not a number"),
        }),
    }
}
