use crate::domain::market::fundamentals::Fundamentals;
use crate::domain::ports::FundamentalsSource;
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, build_url_with_query};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const QUOTE_SUMMARY_MODULES: &str = "summaryDetail,defaultKeyStatistics,incomeStatementHistory";

/// Yahoo v10 quoteSummary response, restricted to the modules the gate reads
#[derive(Debug, Deserialize)]
pub struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    pub quote_summary: QuoteSummaryResult,
}

#[derive(Debug, Deserialize)]
pub struct QuoteSummaryResult {
    pub result: Option<Vec<QuoteSummaryData>>,
    pub error: Option<QuoteSummaryError>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteSummaryError {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummaryData {
    #[serde(default)]
    pub summary_detail: SummaryDetail,
    #[serde(default)]
    pub default_key_statistics: KeyStatistics,
    #[serde(default)]
    pub income_statement_history: IncomeStatementHistory,
}

/// Yahoo wraps numbers as `{"raw": 1.0, "fmt": "1.00"}`; missing values are `{}`
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct RawValue {
    pub raw: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDetail {
    #[serde(default)]
    pub trailing_pe: RawValue,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyStatistics {
    #[serde(default)]
    pub trailing_eps: RawValue,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeStatementHistory {
    #[serde(default)]
    pub income_statement_history: Vec<IncomeStatement>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeStatement {
    #[serde(default)]
    pub end_date: RawValue,
    #[serde(default)]
    pub total_revenue: RawValue,
    #[serde(default)]
    pub net_income: RawValue,
}

impl QuoteSummaryResponse {
    /// Quote P/E and EPS plus growth between the two latest annual statements.
    ///
    /// "Not Found", an empty result and a payload with no usable field are
    /// all absent fundamentals.
    pub fn into_fundamentals(self) -> Result<Option<Fundamentals>> {
        let Some(results) = self.quote_summary.result else {
            return match self.quote_summary.error {
                Some(err) if err.code == "Not Found" => Ok(None),
                Some(err) => bail!("Yahoo quoteSummary error {}: {}", err.code, err.description),
                None => bail!("Yahoo quoteSummary response carries neither result nor error"),
            };
        };
        let Some(data) = results.into_iter().next() else {
            return Ok(None);
        };

        let mut statements = data.income_statement_history.income_statement_history;
        statements.sort_by(|a, b| {
            let (a, b) = (a.end_date.raw.unwrap_or(0.0), b.end_date.raw.unwrap_or(0.0));
            b.total_cmp(&a)
        });
        let pair = |field: fn(&IncomeStatement) -> Option<f64>| match statements.as_slice() {
            [latest, previous, ..] => field(previous).zip(field(latest)),
            _ => None,
        };

        let fundamentals = Fundamentals::from_statements(
            data.summary_detail.trailing_pe.raw,
            data.default_key_statistics.trailing_eps.raw,
            pair(|s| s.total_revenue.raw),
            pair(|s| s.net_income.raw),
        );
        Ok((!fundamentals.is_empty()).then_some(fundamentals))
    }
}

/// Valuation and growth figures from Yahoo's public quoteSummary endpoint
pub struct YahooFundamentalsSource {
    client: ClientWithMiddleware,
    base_url: String,
}

impl YahooFundamentalsSource {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            client: HttpClientFactory::create_client(request_timeout),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn summary_url(&self, ticker: &str) -> String {
        build_url_with_query(
            &format!("{}/v10/finance/quoteSummary/{}", self.base_url, ticker),
            &[("modules", QUOTE_SUMMARY_MODULES)],
        )
    }
}

#[async_trait]
impl FundamentalsSource for YahooFundamentalsSource {
    async fn fundamentals(&self, ticker: &str) -> Result<Option<Fundamentals>> {
        let url = self.summary_url(ticker);
        debug!("YahooFundamentalsSource: GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("quoteSummary request failed for {}", ticker))?;

        let status = response.status();
        if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
            let body = response.text().await.unwrap_or_default();
            bail!("Yahoo returned {} for {} fundamentals: {}", status, ticker, body);
        }

        let summary: QuoteSummaryResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to decode quoteSummary response for {}", ticker))?;
        summary.into_fundamentals()
    }
}
