//! Configuration module for the screener.
//!
//! Loads structured configuration from environment variables, organized by
//! concern: Screener run, Indicators, Models, Signal policy and Observability.
//! Every sub-config reads through a lookup function so tests can feed a map
//! instead of mutating the process environment.

mod indicator_config;
mod model_config;
mod observability_config;
mod screener_config;
mod signal_config;

pub use indicator_config::IndicatorEnvConfig;
pub use model_config::ModelEnvConfig;
pub use observability_config::{LogFormat, ObservabilityEnvConfig};
pub use screener_config::{DataSourceKind, FundamentalsSourceKind, ScreenerEnvConfig};
pub use signal_config::SignalEnvConfig;

use crate::application::screener::orchestrator::ScreenerSettings;
use anyhow::{Context, Result};
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

/// Variable lookup; `std::env::var` in production, a map in tests
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Parse `key` when set and non-blank, otherwise return `default`
pub(crate) fn parse_var<T>(lookup: Lookup<'_>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    Ok(parse_opt(lookup, key)?.unwrap_or(default))
}

pub(crate) fn parse_opt<T>(lookup: Lookup<'_>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Failed to parse {}={:?}", key, raw)),
        _ => Ok(None),
    }
}

/// Main application configuration, aggregated from the sub-configs
#[derive(Debug, Clone)]
pub struct Config {
    pub screener: ScreenerEnvConfig,
    pub indicators: IndicatorEnvConfig,
    pub model: ModelEnvConfig,
    pub signals: SignalEnvConfig,
    pub observability: ObservabilityEnvConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self> {
        Ok(Self {
            screener: ScreenerEnvConfig::from_lookup(lookup)
                .context("Failed to load screener config")?,
            indicators: IndicatorEnvConfig::from_lookup(lookup)
                .context("Failed to load indicator config")?,
            model: ModelEnvConfig::from_lookup(lookup).context("Failed to load model config")?,
            signals: SignalEnvConfig::from_lookup(lookup)
                .context("Failed to load signal config")?,
            observability: ObservabilityEnvConfig::from_lookup(lookup)
                .context("Failed to load observability config")?,
        })
    }

    /// Orchestrator settings derived from the screener section
    pub fn screener_settings(&self) -> ScreenerSettings {
        let defaults = ScreenerSettings::default();
        ScreenerSettings {
            universe: self.screener.tickers.clone().unwrap_or(defaults.universe),
            batch_size: self.screener.batch_size,
            period: self.screener.history_period,
            interval: self.screener.interval,
            fetch_timeout: Duration::from_secs(self.screener.fetch_timeout_secs),
        }
    }
}
