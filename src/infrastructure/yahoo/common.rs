use crate::domain::market::price_series::{Bar, PriceSeries};
use anyhow::{Result, anyhow, bail};
use chrono::DateTime;
use serde::Deserialize;

/// Yahoo v8 chart API response
#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: ChartResult,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    pub result: Option<Vec<ChartData>>,
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartError {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ChartData {
    pub timestamp: Option<Vec<i64>>,
    pub indicators: Indicators,
}

#[derive(Debug, Deserialize)]
pub struct Indicators {
    pub quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteData {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

impl ChartResponse {
    /// Convert to a series.
    ///
    /// "Not Found" and a result without timestamps are empty series, which
    /// the screener reports as insufficient data. Rows where every field is
    /// null (holidays) are dropped; partially null rows keep NaN so
    /// validation rejects the ticker instead of silently filling gaps.
    pub fn into_series(self, ticker: &str) -> Result<PriceSeries> {
        let Some(results) = self.chart.result else {
            return match self.chart.error {
                Some(err) if err.code == "Not Found" => Ok(PriceSeries::empty(ticker)),
                Some(err) => bail!("Yahoo chart error {}: {}", err.code, err.description),
                None => bail!("Yahoo chart response carries neither result nor error"),
            };
        };

        let Some(data) = results.into_iter().next() else {
            return Ok(PriceSeries::empty(ticker));
        };
        let Some(timestamps) = data.timestamp else {
            return Ok(PriceSeries::empty(ticker));
        };
        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Yahoo chart response has no quote block"))?;

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| anyhow!("Invalid timestamp in chart response: {}", ts))?;

            let field = |v: &Vec<Option<f64>>| v.get(i).copied().flatten();
            let (open, high, low, close, volume) = (
                field(&quote.open),
                field(&quote.high),
                field(&quote.low),
                field(&quote.close),
                field(&quote.volume),
            );

            if open.is_none() && high.is_none() && low.is_none() && close.is_none() {
                continue;
            }

            bars.push(Bar {
                date,
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close: close.unwrap_or(f64::NAN),
                volume: volume.unwrap_or(f64::NAN),
            });
        }

        Ok(PriceSeries::from_unordered(ticker, bars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::validation::data_quality::SeriesValidator;

    fn parse(json: &str) -> Result<PriceSeries> {
        let resp: ChartResponse = serde_json::from_str(json)?;
        resp.into_series("AAPL")
    }

    #[test]
    fn test_parses_bars_and_skips_holidays() {
        let series = parse(
            r#"{"chart":{"result":[{"timestamp":[1704205800,1704292200,1704378600],
            "indicators":{"quote":[{
              "open":[187.15,null,182.15],
              "high":[188.44,null,183.09],
              "low":[183.89,null,180.88],
              "close":[185.64,null,181.91],
              "volume":[82488700,null,71983600]}]}}],"error":null}}"#,
        )
        .unwrap();

        assert_eq!(series.ticker, "AAPL");
        assert_eq!(series.len(), 2);
        assert_eq!(series.bars[0].close, 185.64);
        assert_eq!(series.bars[1].volume, 71_983_600.0);
        assert!(series.bars[0].date < series.bars[1].date);
    }

    #[test]
    fn test_partial_row_keeps_nan() {
        let series = parse(
            r#"{"chart":{"result":[{"timestamp":[1704205800],
            "indicators":{"quote":[{"open":[1.0],"high":[2.0],"low":[0.5],"close":[null],"volume":[10]}]}}],"error":null}}"#,
        )
        .unwrap();
        assert!(series.bars[0].close.is_nan());
    }

    #[test]
    fn test_missing_volume_keeps_nan() {
        let series = parse(
            r#"{"chart":{"result":[{"timestamp":[1704205800],
            "indicators":{"quote":[{"open":[1.0],"high":[2.0],"low":[0.5],"close":[1.5],"volume":[null]}]}}],"error":null}}"#,
        )
        .unwrap();
        assert!(series.bars[0].volume.is_nan());
        assert!(SeriesValidator::validate_series(&series).is_err());
    }

    #[test]
    fn test_not_found_is_empty_series() {
        let series = parse(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#,
        )
        .unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_other_error_is_failure() {
        let err = parse(
            r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid range"}}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Invalid range"));
    }
}
