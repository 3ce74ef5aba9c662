use crate::domain::market::price_series::{Bar, PriceSeries};
use crate::domain::market::timeframe::{BarInterval, HistoryPeriod};
use crate::domain::ports::MarketDataSource;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CsvBar {
    date: NaiveDate,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: Option<f64>,
}

/// Reads daily bars from `<dir>/<TICKER>.csv` with a
/// `date,open,high,low,close,volume` header.
pub struct CsvDirectorySource {
    dir: PathBuf,
}

impl CsvDirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", ticker))
    }

    /// Parse CSV content; blank cells become NaN so validation can reject them
    pub fn parse(ticker: &str, content: &str) -> Result<PriceSeries> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut bars = Vec::new();
        for (line, record) in rdr.deserialize::<CsvBar>().enumerate() {
            let record = record.with_context(|| format!("Bad CSV row {} for {}", line + 2, ticker))?;
            bars.push(Bar {
                date: record.date,
                open: record.open.unwrap_or(f64::NAN),
                high: record.high.unwrap_or(f64::NAN),
                low: record.low.unwrap_or(f64::NAN),
                close: record.close.unwrap_or(f64::NAN),
                volume: record.volume.unwrap_or(f64::NAN),
            });
        }
        Ok(PriceSeries::from_unordered(ticker, bars))
    }

    fn trim_to_period(series: PriceSeries, period: HistoryPeriod) -> PriceSeries {
        match series.last().map(|b| b.date) {
            Some(last) => {
                let start = last - Duration::days(period.calendar_days());
                series.since(start)
            }
            None => series,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl MarketDataSource for CsvDirectorySource {
    async fn fetch(
        &self,
        ticker: &str,
        period: HistoryPeriod,
        interval: BarInterval,
    ) -> Result<PriceSeries> {
        if interval != BarInterval::OneDay {
            bail!("CSV source serves daily bars only, got {}", interval);
        }

        let path = self.path_for(ticker);
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {:?}", path))?;

        let series = Self::trim_to_period(Self::parse(ticker, &content)?, period);
        debug!("CsvDirectorySource: {} bars for {} from {:?}", series.len(), ticker, path);
        Ok(series)
    }

    fn name(&self) -> &str {
        "csv"
    }
}
