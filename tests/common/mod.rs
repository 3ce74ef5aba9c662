#![allow(dead_code)]

use chrono::{Datelike, Duration as Days, NaiveDate, Weekday};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use swing_screener::application::screener::orchestrator::{Screener, ScreenerSettings};
use swing_screener::config::Config;
use swing_screener::domain::market::fundamentals::Fundamentals;
use swing_screener::domain::market::price_series::{Bar, PriceSeries};
use swing_screener::domain::ports::FundamentalsSource;
use swing_screener::domain::screening::types::FeatureRow;
use swing_screener::infrastructure::fundamentals::NoFundamentals;
use swing_screener::infrastructure::mock::{InMemoryMarketData, synthetic_series};
use swing_screener::infrastructure::ServiceFactory;

/// Small models so integration tests stay fast
pub const FAST_MODELS: &[(&str, &str)] = &[
    ("RF_TREES", "10"),
    ("RF_MAX_DEPTH", "4"),
    ("GBM_ESTIMATORS", "15"),
    ("LOGIT_ITERATIONS", "150"),
    ("BACKTEST_START_OFFSET", "200"),
];

pub fn config(extra: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = FAST_MODELS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    Config::from_lookup(&|key| vars.get(key).cloned()).expect("test config should load")
}

/// Technical rules a rallying series always meets: above SMA50 with MACD over its signal
pub const LOOSE_RULES: &[(&str, &str)] = &[
    ("MIN_REL_VOLUME", "0"),
    ("RSI_MIN", "0"),
    ("RSI_MAX", "100"),
    ("UPPER_BAND_PROXIMITY", "1"),
    ("MIN_BUY_PROBABILITY", "0"),
];

pub fn screener(config: &Config, source: InMemoryMarketData, fetch_timeout: Duration) -> Screener {
    screener_with_fundamentals(config, source, Arc::new(NoFundamentals), fetch_timeout)
}

pub fn screener_with_fundamentals(
    config: &Config,
    source: InMemoryMarketData,
    fundamentals: Arc<dyn FundamentalsSource>,
    fetch_timeout: Duration,
) -> Screener {
    let pipeline = ServiceFactory::create_pipeline(config).expect("pipeline should build");
    let settings = ScreenerSettings {
        fetch_timeout,
        ..config.screener_settings()
    };
    Screener::new(Arc::new(source), fundamentals, pipeline, settings)
}

/// Append `bars` weekday sessions each closing `daily_gain` above the last
pub fn with_rally(series: PriceSeries, bars: usize, daily_gain: f64) -> PriceSeries {
    let ticker = series.ticker.clone();
    let mut all = series.bars;
    let Some(last) = all.last().copied() else {
        return PriceSeries::new(ticker, all);
    };

    let (mut date, mut close) = (last.date, last.close);
    for _ in 0..bars {
        date += Days::days(1);
        while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            date += Days::days(1);
        }
        let open = close;
        close *= 1.0 + daily_gain;
        all.push(Bar {
            date,
            open,
            high: close * 1.004,
            low: open * 0.996,
            close,
            volume: 2_500_000.0,
        });
    }
    PriceSeries::new(ticker, all)
}

/// Two years of synthetic history ending in a three-week breakout
pub fn rallying_series(ticker: &str, seed: u64) -> PriceSeries {
    with_rally(synthetic_series(ticker, 504, seed), 15, 0.02)
}

/// Valuation and growth that clear every fundamentals check
pub fn healthy_fundamentals() -> Fundamentals {
    Fundamentals {
        pe_ratio: Some(20.0),
        eps: Some(3.2),
        revenue_growth: Some(0.08),
        earnings_growth: Some(0.12),
    }
}

pub fn tickers(names: &[&str]) -> Vec<String> {
    names.iter().map(|t| t.to_string()).collect()
}

/// A feature row meeting every Balanced rule
pub fn bullish_row() -> FeatureRow {
    FeatureRow {
        date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
        close: 99.5,
        volume: 2_000_000.0,
        rsi: 50.0,
        macd: 0.8,
        macd_signal: 0.5,
        bb_high: 100.0,
        bb_low: 90.0,
        atr: 1.5,
        sma_20: 97.0,
        sma_50: 95.0,
        sma_200: 90.0,
        volume_ma: 1_000_000.0,
        rel_volume: 2.0,
        return_1d: 0.01,
        target: None,
    }
}
