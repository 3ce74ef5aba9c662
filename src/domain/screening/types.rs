use crate::domain::market::fundamentals::Fundamentals;
use crate::domain::screening::batch::BatchWindow;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One bar annotated with every derived indicator.
///
/// Only produced once all indicator look-back windows are satisfied, so every
/// value is defined. `target` is filled by the dataset builder and stays
/// `None` for the last `horizon` bars of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub close: f64,
    pub volume: f64,
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub bb_high: f64,
    pub bb_low: f64,
    pub atr: f64,
    pub sma_20: f64,
    pub sma_50: f64,
    pub sma_200: f64,
    pub volume_ma: f64,
    pub rel_volume: f64,
    pub return_1d: f64,
    pub target: Option<bool>,
}

impl FeatureRow {
    pub fn above_sma_20(&self) -> bool {
        self.close > self.sma_20
    }

    pub fn above_sma_50(&self) -> bool {
        self.close > self.sma_50
    }

    pub fn above_sma_200(&self) -> bool {
        self.close > self.sma_200
    }

    pub fn macd_above_signal(&self) -> bool {
        self.macd > self.macd_signal
    }

    /// Fractional distance of the close below the upper Bollinger band (negative above it)
    pub fn upper_band_gap(&self) -> f64 {
        if self.bb_high > 0.0 {
            (self.bb_high - self.close) / self.bb_high
        } else {
            f64::INFINITY
        }
    }

    pub fn is_finite(&self) -> bool {
        [
            self.close,
            self.volume,
            self.rsi,
            self.macd,
            self.macd_signal,
            self.bb_high,
            self.bb_low,
            self.atr,
            self.sma_20,
            self.sma_50,
            self.sma_200,
            self.volume_ma,
            self.rel_volume,
            self.return_1d,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Indicator values reported alongside a signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub close: f64,
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub bb_high: f64,
    pub bb_low: f64,
    pub atr: f64,
    pub sma_50: f64,
    pub sma_200: f64,
    pub rel_volume: f64,
    pub return_1d: f64,
}

impl From<&FeatureRow> for IndicatorSnapshot {
    fn from(row: &FeatureRow) -> Self {
        Self {
            close: row.close,
            rsi: row.rsi,
            macd: row.macd,
            macd_signal: row.macd_signal,
            bb_high: row.bb_high,
            bb_low: row.bb_low,
            atr: row.atr,
            sma_50: row.sma_50,
            sma_200: row.sma_200,
            rel_volume: row.rel_volume,
            return_1d: row.return_1d,
        }
    }
}

/// Averaged bullish probability and the three constituent estimates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnsembleScore {
    pub probability: f64,
    pub random_forest: f64,
    pub gradient_boosting: f64,
    pub logistic: f64,
}

impl EnsembleScore {
    /// Arithmetic mean of the three model probabilities, each clamped to [0, 1]
    pub fn from_parts(random_forest: f64, gradient_boosting: f64, logistic: f64) -> Self {
        let random_forest = random_forest.clamp(0.0, 1.0);
        let gradient_boosting = gradient_boosting.clamp(0.0, 1.0);
        let logistic = logistic.clamp(0.0, 1.0);
        Self {
            probability: (random_forest + gradient_boosting + logistic) / 3.0,
            random_forest,
            gradient_boosting,
            logistic,
        }
    }
}

/// Track record of past high-confidence calls for one ticker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    /// Percentage of positive calls that were right, rounded to one decimal
    pub win_rate: f64,
    /// Number of positive calls made during the walk
    pub signal_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SignalLabel {
    Buy,
    StrongBuy,
}

impl SignalLabel {
    /// Higher is stronger
    pub fn rank(&self) -> u8 {
        match self {
            SignalLabel::Buy => 1,
            SignalLabel::StrongBuy => 2,
        }
    }
}

impl fmt::Display for SignalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalLabel::Buy => write!(f, "Buy"),
            SignalLabel::StrongBuy => write!(f, "Strong Buy"),
        }
    }
}

/// A ticker that qualified for a signal in one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredTicker {
    pub ticker: String,
    pub as_of_date: NaiveDate,
    pub score: EnsembleScore,
    pub indicators: IndicatorSnapshot,
    pub backtest: Option<BacktestSummary>,
    pub fundamentals: Option<Fundamentals>,
    pub label: SignalLabel,
    pub explanation: String,
}

impl ScoredTicker {
    pub fn probability(&self) -> f64 {
        self.score.probability
    }
}

/// A ticker left out of the table because its data or model could not be used
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedTicker {
    pub ticker: String,
    pub reason: String,
}

/// Result of screening a single ticker
#[derive(Debug, Clone, PartialEq)]
pub enum TickerOutcome {
    Signal(ScoredTicker),
    /// Processed successfully but did not qualify
    NoSignal { ticker: String, reason: String },
    Skipped(SkippedTicker),
}

impl TickerOutcome {
    pub fn ticker(&self) -> &str {
        match self {
            TickerOutcome::Signal(s) => &s.ticker,
            TickerOutcome::NoSignal { ticker, .. } => ticker,
            TickerOutcome::Skipped(s) => &s.ticker,
        }
    }
}

pub const NO_MATCHES: &str = "No matches";

/// One renderable row of the result table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScreenerRow {
    Signal(ScoredTicker),
    /// Placed alone in the table when no ticker qualified
    NoMatches,
}

impl ScreenerRow {
    pub fn ticker(&self) -> &str {
        match self {
            ScreenerRow::Signal(s) => &s.ticker,
            ScreenerRow::NoMatches => NO_MATCHES,
        }
    }

    pub fn as_signal(&self) -> Option<&ScoredTicker> {
        match self {
            ScreenerRow::Signal(s) => Some(s),
            ScreenerRow::NoMatches => None,
        }
    }
}

/// Ranked output of one screening run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<ScreenerRow>,
    /// Tickers skipped for data or model reasons, in encounter order
    pub errors: Vec<SkippedTicker>,
    pub batch: Option<BatchWindow>,
    pub next_batch: Option<usize>,
}

impl ResultTable {
    pub fn signals(&self) -> impl Iterator<Item = &ScoredTicker> {
        self.rows.iter().filter_map(ScreenerRow::as_signal)
    }

    pub fn has_matches(&self) -> bool {
        self.signals().next().is_some()
    }

    /// Tickers carrying the strongest label, in table order
    pub fn strong_buys(&self) -> Vec<&ScoredTicker> {
        self.signals()
            .filter(|s| s.label == SignalLabel::StrongBuy)
            .collect()
    }
}
