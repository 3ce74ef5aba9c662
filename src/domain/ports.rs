use crate::domain::market::fundamentals::Fundamentals;
use crate::domain::market::price_series::PriceSeries;
use crate::domain::market::timeframe::{BarInterval, HistoryPeriod};
use crate::domain::screening::alerts::AlertDigest;
use anyhow::Result;
use async_trait::async_trait;

/// Source of historical OHLCV bars.
///
/// May be slow and may fail. An empty series is a valid answer and is
/// reported by the screener as "insufficient data".
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch(
        &self,
        ticker: &str,
        period: HistoryPeriod,
        interval: BarInterval,
    ) -> Result<PriceSeries>;

    /// Source name for logs
    fn name(&self) -> &str;
}

/// Optional source of valuation and growth figures
#[async_trait]
pub trait FundamentalsSource: Send + Sync {
    /// `Ok(None)` when the source has nothing for this ticker
    async fn fundamentals(&self, ticker: &str) -> Result<Option<Fundamentals>>;
}

/// Outbound alert channel for Strong Buy digests
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, digest: &AlertDigest) -> Result<()>;
}
