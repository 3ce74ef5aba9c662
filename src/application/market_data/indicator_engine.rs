use crate::domain::errors::{DataError, ScreenerError};
use crate::domain::market::price_series::PriceSeries;
use crate::domain::screening::types::FeatureRow;
use crate::domain::validation::data_quality::SeriesValidator;
use serde::{Deserialize, Serialize};
use ta::indicators::{
    AverageTrueRange, BollingerBands, MovingAverageConvergenceDivergence, RelativeStrengthIndex,
    SimpleMovingAverage,
};
use ta::{DataItem, Next};
use tracing::debug;

/// Look-back periods of every indicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorConfig {
    pub rsi_period: usize,
    pub macd_fast_period: usize,
    pub macd_slow_period: usize,
    pub macd_signal_period: usize,
    pub fast_sma_period: usize,
    pub slow_sma_period: usize,
    pub trend_sma_period: usize,
    pub bb_period: usize,
    pub bb_std_dev: f64,
    pub atr_period: usize,
    pub volume_ma_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            macd_fast_period: 12,
            macd_slow_period: 26,
            macd_signal_period: 9,
            fast_sma_period: 20,
            slow_sma_period: 50,
            trend_sma_period: 200,
            bb_period: 20,
            bb_std_dev: 2.0,
            atr_period: 14,
            volume_ma_period: 20,
        }
    }
}

impl IndicatorConfig {
    /// Number of leading bars dropped before every indicator is defined.
    ///
    /// A simple average over `n` bars is defined from bar `n - 1`; RSI and ATR
    /// need one extra bar for their first change; the MACD signal line needs
    /// the slow EMA plus its own smoothing window.
    pub fn warmup_bars(&self) -> usize {
        [
            self.trend_sma_period.saturating_sub(1),
            self.slow_sma_period.saturating_sub(1),
            self.fast_sma_period.saturating_sub(1),
            (self.macd_slow_period + self.macd_signal_period).saturating_sub(2),
            self.bb_period.saturating_sub(1),
            self.rsi_period,
            self.atr_period,
            self.volume_ma_period.saturating_sub(1),
            1,
        ]
        .into_iter()
        .max()
        .unwrap_or(1)
    }

    /// Shortest series that yields at least one feature row
    pub fn min_bars(&self) -> usize {
        self.warmup_bars() + 1
    }
}

/// Streaming indicator state for one pass over one series
struct IndicatorState {
    rsi: RelativeStrengthIndex,
    macd: MovingAverageConvergenceDivergence,
    sma_fast: SimpleMovingAverage,
    sma_slow: SimpleMovingAverage,
    sma_trend: SimpleMovingAverage,
    bb: BollingerBands,
    atr: AverageTrueRange,
    volume_ma: SimpleMovingAverage,
}

impl IndicatorState {
    fn new(config: &IndicatorConfig) -> ta::errors::Result<Self> {
        Ok(Self {
            rsi: RelativeStrengthIndex::new(config.rsi_period)?,
            macd: MovingAverageConvergenceDivergence::new(
                config.macd_fast_period,
                config.macd_slow_period,
                config.macd_signal_period,
            )?,
            sma_fast: SimpleMovingAverage::new(config.fast_sma_period)?,
            sma_slow: SimpleMovingAverage::new(config.slow_sma_period)?,
            sma_trend: SimpleMovingAverage::new(config.trend_sma_period)?,
            bb: BollingerBands::new(config.bb_period, config.bb_std_dev)?,
            atr: AverageTrueRange::new(config.atr_period)?,
            volume_ma: SimpleMovingAverage::new(config.volume_ma_period)?,
        })
    }
}

/// Derives technical features from a per-ticker OHLCV series.
///
/// Stateless between calls: every `compute` starts from fresh indicator
/// state, so the output depends only on the series passed in. Indicators are
/// causal, so row `i` only sees bars `0..=i`.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    config: IndicatorConfig,
}

impl IndicatorEngine {
    pub fn new(config: IndicatorConfig) -> Result<Self, ScreenerError> {
        IndicatorState::new(&config).map_err(|e| ScreenerError::InvalidConfig {
            reason: e.to_string(),
        })?;
        if !(config.bb_std_dev.is_finite() && config.bb_std_dev > 0.0) {
            return Err(ScreenerError::InvalidConfig {
                reason: format!("bb_std_dev must be positive, got {}", config.bb_std_dev),
            });
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    /// Compute one feature row per bar after the warm-up period.
    pub fn compute(&self, series: &PriceSeries) -> Result<Vec<FeatureRow>, ScreenerError> {
        let required = self.config.min_bars();
        if series.len() < required {
            return Err(DataError::InsufficientData {
                bars: series.len(),
                required,
            }
            .into());
        }
        SeriesValidator::validate_series(series)?;

        let mut state =
            IndicatorState::new(&self.config).map_err(|e| ScreenerError::InvalidConfig {
                reason: e.to_string(),
            })?;
        let warmup = self.config.warmup_bars();
        let mut rows = Vec::with_capacity(series.len() - warmup);
        let mut prev_close: Option<f64> = None;

        for (i, bar) in series.bars.iter().enumerate() {
            let item = DataItem::builder()
                .open(bar.open)
                .high(bar.high)
                .low(bar.low)
                .close(bar.close)
                .volume(bar.volume)
                .build()
                .map_err(|e| DataError::InvalidBar {
                    date: bar.date,
                    reason: format!("{:?}", e),
                })?;

            let rsi = state.rsi.next(bar.close).clamp(0.0, 100.0);
            let macd = state.macd.next(bar.close);
            let bb = state.bb.next(bar.close);
            let atr = state.atr.next(&item);
            let sma_20 = state.sma_fast.next(bar.close);
            let sma_50 = state.sma_slow.next(bar.close);
            let sma_200 = state.sma_trend.next(bar.close);
            let volume_ma = state.volume_ma.next(bar.volume);

            let rel_volume = if volume_ma > 0.0 {
                bar.volume / volume_ma
            } else {
                0.0
            };
            let return_1d = match prev_close {
                Some(prev) if prev > 0.0 => (bar.close - prev) / prev,
                _ => 0.0,
            };
            prev_close = Some(bar.close);

            if i < warmup {
                continue;
            }

            let row = FeatureRow {
                date: bar.date,
                close: bar.close,
                volume: bar.volume,
                rsi,
                macd: macd.macd,
                macd_signal: macd.signal,
                bb_high: bb.upper,
                bb_low: bb.lower,
                atr,
                sma_20,
                sma_50,
                sma_200,
                volume_ma,
                rel_volume,
                return_1d,
                target: None,
            };

            if !row.is_finite() {
                return Err(DataError::InvalidBar {
                    date: bar.date,
                    reason: "non-finite indicator value".to_string(),
                }
                .into());
            }
            rows.push(row);
        }

        debug!(
            "IndicatorEngine: {} -> {} feature rows ({} warm-up bars dropped)",
            series.ticker,
            rows.len(),
            warmup
        );
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::price_series::Bar;
    use chrono::{Duration, NaiveDate};

    fn wave_series(n: usize) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        let bars = (0..n)
            .map(|i| {
                let t = i as f64;
                let close = 100.0 * (1.0 + 0.05 * (t / 4.0).sin()) * (1.0 + 0.001 * t);
                let open = close * (1.0 - 0.004 * (t / 3.0).cos());
                Bar {
                    date: start + Duration::days(i as i64),
                    open,
                    high: open.max(close) * 1.01,
                    low: open.min(close) * 0.99,
                    close,
                    volume: 1_000_000.0 * (1.0 + 0.5 * (t / 7.0).sin().abs()),
                }
            })
            .collect();
        PriceSeries::new("TEST", bars)
    }

    #[test]
    fn test_warmup_is_longest_window() {
        let config = IndicatorConfig::default();
        assert_eq!(config.warmup_bars(), 199);
        assert_eq!(config.min_bars(), 200);

        let short = IndicatorConfig {
            trend_sma_period: 30,
            ..IndicatorConfig::default()
        };
        // MACD 26 + 9 dominates once the trend average is short
        assert_eq!(short.warmup_bars(), 49);
    }

    #[test]
    fn test_one_row_per_bar_after_warmup() {
        let engine = IndicatorEngine::new(IndicatorConfig::default()).unwrap();
        let series = wave_series(320);

        let rows = engine.compute(&series).unwrap();

        assert_eq!(rows.len(), 320 - 199);
        assert_eq!(rows[0].date, series.bars[199].date);
        assert_eq!(rows.last().unwrap().date, series.last().unwrap().date);
        assert!(rows.iter().all(FeatureRow::is_finite));
    }

    #[test]
    fn test_bounded_indicators() {
        let engine = IndicatorEngine::new(IndicatorConfig::default()).unwrap();
        let rows = engine.compute(&wave_series(400)).unwrap();

        for row in &rows {
            assert!((0.0..=100.0).contains(&row.rsi));
            assert!(row.rel_volume >= 0.0);
            assert!(row.bb_high >= row.bb_low);
            assert!(row.atr >= 0.0);
        }
    }

    #[test]
    fn test_empty_series_is_insufficient_data() {
        let engine = IndicatorEngine::new(IndicatorConfig::default()).unwrap();
        let err = engine.compute(&PriceSeries::empty("ZZZZ")).unwrap_err();

        assert!(matches!(
            err,
            ScreenerError::DataUnavailable(DataError::InsufficientData { bars: 0, .. })
        ));
        assert!(err.to_string().contains("insufficient data"));
    }

    #[test]
    fn test_short_series_rejected() {
        let engine = IndicatorEngine::new(IndicatorConfig::default()).unwrap();
        assert!(engine.compute(&wave_series(199)).is_err());
        assert_eq!(engine.compute(&wave_series(200)).unwrap().len(), 1);
    }

    #[test]
    fn test_nan_close_rejected() {
        let engine = IndicatorEngine::new(IndicatorConfig::default()).unwrap();
        let mut series = wave_series(250);
        series.bars[120].close = f64::NAN;

        let err = engine.compute(&series).unwrap_err();
        assert!(matches!(
            err,
            ScreenerError::DataUnavailable(DataError::MissingValues { field: "close", .. })
        ));
    }

    #[test]
    fn test_deterministic() {
        let engine = IndicatorEngine::new(IndicatorConfig::default()).unwrap();
        let series = wave_series(260);
        assert_eq!(engine.compute(&series).unwrap(), engine.compute(&series).unwrap());
    }

    #[test]
    fn test_no_lookahead_in_features() {
        // Rows computed on a truncated series must match the same rows on the full series
        let engine = IndicatorEngine::new(IndicatorConfig::default()).unwrap();
        let full = wave_series(300);
        let mut truncated = full.clone();
        truncated.bars.truncate(260);

        let full_rows = engine.compute(&full).unwrap();
        let truncated_rows = engine.compute(&truncated).unwrap();

        assert_eq!(&full_rows[..truncated_rows.len()], &truncated_rows[..]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = IndicatorConfig {
            rsi_period: 0,
            ..IndicatorConfig::default()
        };
        assert!(matches!(
            IndicatorEngine::new(config),
            Err(ScreenerError::InvalidConfig { .. })
        ));
    }
}
