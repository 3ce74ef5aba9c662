//! Screener run configuration: universe, batching, history and data source.

use super::{Lookup, parse_opt, parse_var};
use crate::domain::market::timeframe::{BarInterval, HistoryPeriod};
use crate::domain::ml::feature_registry::{DEFAULT_FEATURES, FeatureKind, parse_feature_list};
use crate::domain::screening::batch::DEFAULT_BATCH_SIZE;
use crate::infrastructure::yahoo::DEFAULT_YAHOO_BASE_URL;
use anyhow::{Context, Result, bail};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Where price history comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSourceKind {
    Yahoo,
    /// One `<TICKER>.csv` per ticker in the directory
    Csv(PathBuf),
    /// Deterministic synthetic series, no network
    Mock,
}

impl FromStr for DataSourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if let Some(dir) = trimmed.strip_prefix("csv:") {
            if dir.trim().is_empty() {
                bail!("CSV data source needs a directory: csv:<dir>");
            }
            return Ok(DataSourceKind::Csv(PathBuf::from(dir.trim())));
        }
        match trimmed.to_lowercase().as_str() {
            "yahoo" => Ok(DataSourceKind::Yahoo),
            "mock" => Ok(DataSourceKind::Mock),
            other => bail!(
                "Unknown data source '{}'. Use yahoo, csv:<dir> or mock",
                other
            ),
        }
    }
}

impl fmt::Display for DataSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceKind::Yahoo => write!(f, "yahoo"),
            DataSourceKind::Csv(dir) => write!(f, "csv:{}", dir.display()),
            DataSourceKind::Mock => write!(f, "mock"),
        }
    }
}

/// Where valuation and growth figures come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundamentalsSourceKind {
    Yahoo,
    /// Every ticker has absent fundamentals
    None,
}

impl FromStr for FundamentalsSourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "yahoo" => Ok(FundamentalsSourceKind::Yahoo),
            "none" => Ok(FundamentalsSourceKind::None),
            other => bail!("Unknown fundamentals source '{}'. Use yahoo or none", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScreenerEnvConfig {
    /// `None` keeps the built-in universe
    pub tickers: Option<Vec<String>>,
    pub batch_size: usize,
    pub history_period: HistoryPeriod,
    pub interval: BarInterval,
    pub fetch_timeout_secs: u64,
    pub data_source: DataSourceKind,
    pub fundamentals_source: FundamentalsSourceKind,
    pub features: Vec<FeatureKind>,
    pub yahoo_base_url: String,
}

impl Default for ScreenerEnvConfig {
    fn default() -> Self {
        Self {
            tickers: None,
            batch_size: DEFAULT_BATCH_SIZE,
            history_period: HistoryPeriod::default(),
            interval: BarInterval::OneDay,
            fetch_timeout_secs: 20,
            data_source: DataSourceKind::Yahoo,
            fundamentals_source: FundamentalsSourceKind::Yahoo,
            features: DEFAULT_FEATURES.to_vec(),
            yahoo_base_url: DEFAULT_YAHOO_BASE_URL.to_string(),
        }
    }
}

impl ScreenerEnvConfig {
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self> {
        let defaults = Self::default();

        let tickers = lookup("SCREENER_TICKERS")
            .map(|raw| {
                raw.split(',')
                    .map(|t| t.trim().to_uppercase())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|list| !list.is_empty());

        let batch_size: usize = parse_var(lookup, "SCREENER_BATCH_SIZE", defaults.batch_size)?;
        if batch_size == 0 {
            bail!("SCREENER_BATCH_SIZE must be positive");
        }

        let features = match lookup("SCREENER_FEATURES").filter(|raw| !raw.trim().is_empty()) {
            Some(raw) => parse_feature_list(&raw).context("Failed to parse SCREENER_FEATURES")?,
            None => defaults.features,
        };

        let data_source: DataSourceKind =
            parse_opt(lookup, "SCREENER_DATA_SOURCE")?.unwrap_or(defaults.data_source);
        // Offline sources default to no fundamentals so runs stay off the network
        let fundamentals_source = match parse_opt(lookup, "SCREENER_FUNDAMENTALS_SOURCE")? {
            Some(kind) => kind,
            None if data_source == DataSourceKind::Yahoo => FundamentalsSourceKind::Yahoo,
            None => FundamentalsSourceKind::None,
        };

        Ok(Self {
            tickers,
            batch_size,
            history_period: parse_var(lookup, "SCREENER_HISTORY_PERIOD", defaults.history_period)?,
            interval: parse_var(lookup, "SCREENER_INTERVAL", defaults.interval)?,
            fetch_timeout_secs: parse_var(
                lookup,
                "SCREENER_FETCH_TIMEOUT_SECS",
                defaults.fetch_timeout_secs,
            )?,
            data_source,
            fundamentals_source,
            features,
            yahoo_base_url: lookup("YAHOO_BASE_URL")
                .filter(|url| !url.trim().is_empty())
                .unwrap_or(defaults.yahoo_base_url),
        })
    }
}
