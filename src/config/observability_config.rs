//! Observability configuration parsing from environment variables.
//!
//! Only the log output format is configurable; verbosity follows `RUST_LOG`.

use super::{Lookup, parse_var};
use anyhow::{Result, bail};
use std::str::FromStr;

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => bail!("Unknown log format '{}'. Use pretty or json", other),
        }
    }
}

/// Observability environment configuration
#[derive(Debug, Clone, Default)]
pub struct ObservabilityEnvConfig {
    pub log_format: LogFormat,
}

impl ObservabilityEnvConfig {
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self> {
        Ok(Self {
            log_format: parse_var(lookup, "LOG_FORMAT", LogFormat::Pretty)?,
        })
    }
}
