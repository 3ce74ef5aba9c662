use crate::domain::errors::DataError;
use crate::domain::market::price_series::{Bar, PriceSeries};
use tracing::warn;

/// Centralized validator for price history integrity.
///
/// Rejects series carrying missing values or bars that are physically
/// impossible. A rejected series is a skip-this-ticker condition.
pub struct SeriesValidator;

impl SeriesValidator {
    /// Validates every bar and the date ordering of a series.
    pub fn validate_series(series: &PriceSeries) -> Result<(), DataError> {
        let mut previous: Option<&Bar> = None;
        for bar in &series.bars {
            Self::validate_bar(&series.ticker, bar)?;
            if let Some(prev) = previous {
                if bar.date <= prev.date {
                    warn!(
                        "Validation FAILED: {} has non-increasing dates {} -> {}",
                        series.ticker, prev.date, bar.date
                    );
                    return Err(DataError::InvalidBar {
                        date: bar.date,
                        reason: format!("date not after previous bar {}", prev.date),
                    });
                }
            }
            previous = Some(bar);
        }
        Ok(())
    }

    /// Validates a single bar.
    pub fn validate_bar(ticker: &str, bar: &Bar) -> Result<(), DataError> {
        for (field, value) in [
            ("open", bar.open),
            ("high", bar.high),
            ("low", bar.low),
            ("close", bar.close),
            ("volume", bar.volume),
        ] {
            if !value.is_finite() {
                warn!(
                    "Validation FAILED: {} has missing {} on {}",
                    ticker, field, bar.date
                );
                return Err(DataError::MissingValues {
                    field,
                    date: bar.date,
                });
            }
        }

        if bar.open <= 0.0 || bar.high <= 0.0 || bar.low <= 0.0 || bar.close <= 0.0 {
            return Err(Self::invalid(ticker, bar, "non-positive price component"));
        }

        if bar.low > bar.high {
            return Err(Self::invalid(
                ticker,
                bar,
                &format!("low {} > high {}", bar.low, bar.high),
            ));
        }

        if bar.open < bar.low || bar.open > bar.high || bar.close < bar.low || bar.close > bar.high
        {
            return Err(Self::invalid(ticker, bar, "open/close outside high-low range"));
        }

        if bar.volume < 0.0 {
            return Err(Self::invalid(
                ticker,
                bar,
                &format!("negative volume {}", bar.volume),
            ));
        }

        Ok(())
    }

    fn invalid(ticker: &str, bar: &Bar, reason: &str) -> DataError {
        warn!("Validation FAILED: {} bar on {}: {}", ticker, bar.date, reason);
        DataError::InvalidBar {
            date: bar.date,
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: 100.0,
            high: 102.0,
            low: 99.0,
            close: 101.0,
            volume: 5_000.0,
        }
    }

    #[test]
    fn test_valid_series_passes() {
        let series = PriceSeries::new("MSFT", vec![bar(1), bar(4), bar(5)]);
        assert!(SeriesValidator::validate_series(&series).is_ok());
    }

    #[test]
    fn test_nan_close_is_missing_value() {
        let mut b = bar(1);
        b.close = f64::NAN;
        let series = PriceSeries::new("MSFT", vec![b]);

        assert_eq!(
            SeriesValidator::validate_series(&series),
            Err(DataError::MissingValues {
                field: "close",
                date: b.date
            })
        );
    }

    #[test]
    fn test_low_above_high_rejected() {
        let mut b = bar(1);
        b.low = 103.0;
        assert!(matches!(
            SeriesValidator::validate_bar("MSFT", &b),
            Err(DataError::InvalidBar { .. })
        ));
    }

    #[test]
    fn test_duplicate_dates_rejected() {
        let series = PriceSeries::new("MSFT", vec![bar(2), bar(2)]);
        assert!(SeriesValidator::validate_series(&series).is_err());
    }
}
