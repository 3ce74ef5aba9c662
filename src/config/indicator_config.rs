//! Indicator look-back periods from environment variables.

use super::{Lookup, parse_var};
use crate::application::market_data::indicator_engine::IndicatorConfig;
use anyhow::Result;

#[derive(Debug, Clone, Default)]
pub struct IndicatorEnvConfig {
    pub indicators: IndicatorConfig,
}

impl IndicatorEnvConfig {
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self> {
        let d = IndicatorConfig::default();
        Ok(Self {
            indicators: IndicatorConfig {
                rsi_period: parse_var(lookup, "RSI_PERIOD", d.rsi_period)?,
                macd_fast_period: parse_var(lookup, "MACD_FAST_PERIOD", d.macd_fast_period)?,
                macd_slow_period: parse_var(lookup, "MACD_SLOW_PERIOD", d.macd_slow_period)?,
                macd_signal_period: parse_var(lookup, "MACD_SIGNAL_PERIOD", d.macd_signal_period)?,
                fast_sma_period: parse_var(lookup, "FAST_SMA_PERIOD", d.fast_sma_period)?,
                slow_sma_period: parse_var(lookup, "SLOW_SMA_PERIOD", d.slow_sma_period)?,
                trend_sma_period: parse_var(lookup, "TREND_SMA_PERIOD", d.trend_sma_period)?,
                bb_period: parse_var(lookup, "BB_PERIOD", d.bb_period)?,
                bb_std_dev: parse_var(lookup, "BB_STD_DEV", d.bb_std_dev)?,
                atr_period: parse_var(lookup, "ATR_PERIOD", d.atr_period)?,
                volume_ma_period: parse_var(lookup, "VOLUME_MA_PERIOD", d.volume_ma_period)?,
            },
        })
    }
}
