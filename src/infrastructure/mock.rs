use crate::domain::market::fundamentals::Fundamentals;
use crate::domain::market::price_series::{Bar, PriceSeries};
use crate::domain::market::timeframe::{BarInterval, HistoryPeriod};
use crate::domain::ports::{FundamentalsSource, MarketDataSource};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug, Clone)]
enum MockEntry {
    Series(PriceSeries),
    Fail(String),
    /// Never answers; exercises the fetch timeout
    Hang,
}

/// Market data held in memory, for tests and offline runs
#[derive(Debug, Default)]
pub struct InMemoryMarketData {
    entries: RwLock<HashMap<String, MockEntry>>,
    /// Generate a synthetic series for tickers without an entry
    synthesize_missing: bool,
}

impl InMemoryMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source that invents a deterministic series for any ticker
    pub fn synthetic() -> Self {
        info!("InMemoryMarketData: serving synthetic series");
        Self {
            entries: RwLock::new(HashMap::new()),
            synthesize_missing: true,
        }
    }

    pub async fn insert(&self, series: PriceSeries) {
        self.entries
            .write()
            .await
            .insert(series.ticker.clone(), MockEntry::Series(series));
    }

    pub async fn fail(&self, ticker: &str, reason: &str) {
        self.entries
            .write()
            .await
            .insert(ticker.to_string(), MockEntry::Fail(reason.to_string()));
    }

    pub async fn hang(&self, ticker: &str) {
        self.entries
            .write()
            .await
            .insert(ticker.to_string(), MockEntry::Hang);
    }
}

#[async_trait]
impl MarketDataSource for InMemoryMarketData {
    async fn fetch(
        &self,
        ticker: &str,
        period: HistoryPeriod,
        _interval: BarInterval,
    ) -> Result<PriceSeries> {
        let entry = self.entries.read().await.get(ticker).cloned();
        match entry {
            Some(MockEntry::Series(series)) => Ok(series),
            Some(MockEntry::Fail(reason)) => Err(anyhow!(reason)),
            Some(MockEntry::Hang) => {
                std::future::pending::<()>().await;
                Err(anyhow!("unreachable"))
            }
            None if self.synthesize_missing => Ok(synthetic_series(
                ticker,
                period.trading_days(),
                ticker_seed(ticker),
            )),
            None => Ok(PriceSeries::empty(ticker)),
        }
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

fn ticker_seed(ticker: &str) -> u64 {
    ticker
        .bytes()
        .fold(1469598103934665603u64, |h, b| (h ^ b as u64).wrapping_mul(1099511628211))
}

/// Deterministic daily series on weekdays ending 2024-12-31.
///
/// Price follows a slow drift, a 20-bar cycle and seeded noise; volume
/// swells on up-moves so relative volume varies.
pub fn synthetic_series(ticker: &str, bars: usize, seed: u64) -> PriceSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default();

    let mut dates = Vec::with_capacity(bars);
    let mut day = end;
    while dates.len() < bars {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(day);
        }
        day -= Duration::days(1);
    }
    dates.reverse();

    let base = 50.0 + (seed % 200) as f64;
    let mut prev_close = base;
    let series = dates
        .into_iter()
        .enumerate()
        .map(|(i, date)| {
            let t = i as f64;
            let noise: f64 = rng.random_range(-0.01..0.01);
            let close = base
                * (1.0 + 0.0008 * t)
                * (1.0 + 0.06 * (2.0 * std::f64::consts::PI * t / 20.0).sin())
                * (1.0 + noise);
            let open = prev_close;
            let spread = close * rng.random_range(0.002..0.015);
            let up = close > open;
            let volume = 1_000_000.0 * if up { 1.6 } else { 0.8 } * rng.random_range(0.7..1.3);
            prev_close = close;
            Bar {
                date,
                open,
                high: open.max(close) + spread,
                low: (open.min(close) - spread).max(0.01),
                close,
                volume,
            }
        })
        .collect();

    PriceSeries::new(ticker, series)
}

/// Fundamentals held in memory
#[derive(Debug, Default)]
pub struct InMemoryFundamentals {
    entries: RwLock<HashMap<String, Fundamentals>>,
    failing: RwLock<HashMap<String, String>>,
}

impl InMemoryFundamentals {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, ticker: &str, fundamentals: Fundamentals) {
        self.entries
            .write()
            .await
            .insert(ticker.to_string(), fundamentals);
    }

    pub async fn fail(&self, ticker: &str, reason: &str) {
        self.failing
            .write()
            .await
            .insert(ticker.to_string(), reason.to_string());
    }
}

#[async_trait]
impl FundamentalsSource for InMemoryFundamentals {
    async fn fundamentals(&self, ticker: &str) -> Result<Option<Fundamentals>> {
        if let Some(reason) = self.failing.read().await.get(ticker) {
            return Err(anyhow!(reason.clone()));
        }
        Ok(self.entries.read().await.get(ticker).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::validation::data_quality::SeriesValidator;

    #[test]
    fn test_synthetic_series_is_valid_and_deterministic() {
        let a = synthetic_series("ACME", 300, 7);
        let b = synthetic_series("ACME", 300, 7);

        assert_eq!(a, b);
        assert_eq!(a.len(), 300);
        assert!(SeriesValidator::validate_series(&a).is_ok());
        assert_eq!(a.last().unwrap().date, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[tokio::test]
    async fn test_unknown_ticker_is_empty() {
        let source = InMemoryMarketData::new();
        let series = source
            .fetch("ZZZZ", HistoryPeriod::default(), BarInterval::OneDay)
            .await
            .unwrap();
        assert!(series.is_empty());
    }

    #[tokio::test]
    async fn test_synthetic_source_covers_any_ticker() {
        let source = InMemoryMarketData::synthetic();
        let series = source
            .fetch("ANY", HistoryPeriod::Years(2), BarInterval::OneDay)
            .await
            .unwrap();
        assert_eq!(series.len(), HistoryPeriod::Years(2).trading_days());
    }

    #[tokio::test]
    async fn test_failures_surface() {
        let source = InMemoryMarketData::new();
        source.fail("BAD", "connection reset").await;
        let err = source
            .fetch("BAD", HistoryPeriod::default(), BarInterval::OneDay)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection reset"));

        let fundamentals = InMemoryFundamentals::new();
        fundamentals.fail("BAD", "quota").await;
        assert!(fundamentals.fundamentals("BAD").await.is_err());
        assert_eq!(fundamentals.fundamentals("OK").await.unwrap(), None);
    }
}
