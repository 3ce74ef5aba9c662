use super::common::ChartResponse;
use crate::domain::market::price_series::PriceSeries;
use crate::domain::market::timeframe::{BarInterval, HistoryPeriod};
use crate::domain::ports::MarketDataSource;
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, build_url_with_query};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query2.finance.yahoo.com";

/// Daily bars from Yahoo's public v8 chart endpoint
pub struct YahooChartSource {
    client: ClientWithMiddleware,
    base_url: String,
}

impl YahooChartSource {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            client: HttpClientFactory::create_client(request_timeout),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn chart_url(&self, ticker: &str, period: HistoryPeriod, interval: BarInterval) -> String {
        build_url_with_query(
            &format!("{}/v8/finance/chart/{}", self.base_url, ticker),
            &[
                ("range", period.to_yahoo_string().as_str()),
                ("interval", interval.to_yahoo_string()),
                ("includePrePost", "false"),
            ],
        )
    }
}

#[async_trait]
impl MarketDataSource for YahooChartSource {
    async fn fetch(
        &self,
        ticker: &str,
        period: HistoryPeriod,
        interval: BarInterval,
    ) -> Result<PriceSeries> {
        let url = self.chart_url(ticker, period, interval);
        debug!("YahooChartSource: GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Chart request failed for {}", ticker))?;

        let status = response.status();
        // 404 carries a JSON body with a "Not Found" chart error
        if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Yahoo returned {} for {}: {}", status, ticker, body);
        }

        let chart: ChartResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to decode chart response for {}", ticker))?;
        let series = chart.into_series(ticker)?;

        if series.is_empty() {
            warn!("YahooChartSource: no bars returned for {}", ticker);
        } else {
            debug!("YahooChartSource: {} bars for {}", series.len(), ticker);
        }
        Ok(series)
    }

    fn name(&self) -> &str {
        "yahoo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_url() {
        let source = YahooChartSource::new("https://example.com/", Duration::from_secs(5));
        let url = source.chart_url("MSFT", HistoryPeriod::Years(2), BarInterval::OneDay);
        assert_eq!(
            url,
            "https://example.com/v8/finance/chart/MSFT?range=2y&interval=1d&includePrePost=false"
        );
    }
}
