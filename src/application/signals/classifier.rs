use crate::domain::market::fundamentals::Fundamentals;
use crate::domain::screening::types::{
    BacktestSummary, EnsembleScore, FeatureRow, SignalLabel,
};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Named threshold sets for the decision policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyPreset {
    /// Wider RSI band and lower volume bar; more, weaker signals
    Relaxed,
    Balanced,
    /// Higher confidence, higher win rate, fundamentals required
    Strict,
}

impl FromStr for PolicyPreset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "relaxed" => Ok(PolicyPreset::Relaxed),
            "balanced" => Ok(PolicyPreset::Balanced),
            "strict" => Ok(PolicyPreset::Strict),
            other => bail!(
                "Unknown signal preset '{}'. Use relaxed, balanced or strict",
                other
            ),
        }
    }
}

impl fmt::Display for PolicyPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyPreset::Relaxed => write!(f, "relaxed"),
            PolicyPreset::Balanced => write!(f, "balanced"),
            PolicyPreset::Strict => write!(f, "strict"),
        }
    }
}

/// Thresholds of the signal decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalPolicy {
    pub min_rel_volume: f64,
    /// Inclusive RSI band
    pub rsi_band: (f64, f64),
    /// Close must sit within this fraction below the upper Bollinger band
    pub upper_band_proximity: f64,
    pub probability_threshold: f64,
    pub min_buy_probability: f64,
    /// Backtest win rate (percent) required for Strong Buy
    pub win_rate_threshold: f64,
    pub min_backtest_signals: usize,
    pub require_fundamentals: bool,
    /// Inclusive P/E range
    pub pe_range: (f64, f64),
}

impl Default for SignalPolicy {
    fn default() -> Self {
        Self::preset(PolicyPreset::Balanced)
    }
}

impl SignalPolicy {
    pub fn preset(preset: PolicyPreset) -> Self {
        let balanced = Self {
            min_rel_volume: 1.5,
            rsi_band: (30.0, 70.0),
            upper_band_proximity: 0.05,
            probability_threshold: 0.6,
            min_buy_probability: 0.5,
            win_rate_threshold: 65.0,
            min_backtest_signals: 1,
            require_fundamentals: false,
            pe_range: (5.0, 50.0),
        };
        match preset {
            PolicyPreset::Balanced => balanced,
            PolicyPreset::Relaxed => Self {
                min_rel_volume: 1.2,
                rsi_band: (20.0, 80.0),
                win_rate_threshold: 60.0,
                ..balanced
            },
            PolicyPreset::Strict => Self {
                probability_threshold: 0.7,
                win_rate_threshold: 70.0,
                require_fundamentals: true,
                ..balanced
            },
        }
    }

    /// Parse a full policy from TOML; missing keys take the Balanced values
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let policy: Self =
            toml::from_str(content).context("Failed to parse signal policy TOML")?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<()> {
        let (lo, hi) = self.rsi_band;
        if !(0.0..=100.0).contains(&lo) || !(0.0..=100.0).contains(&hi) || lo > hi {
            bail!("RSI band must lie within [0, 100] with min <= max, got {:?}", self.rsi_band);
        }
        if !(0.0..=1.0).contains(&self.probability_threshold)
            || !(0.0..=1.0).contains(&self.min_buy_probability)
        {
            bail!("Probability thresholds must lie within [0, 1]");
        }
        if !(0.0..=100.0).contains(&self.win_rate_threshold) {
            bail!(
                "Win rate threshold must lie within [0, 100], got {}",
                self.win_rate_threshold
            );
        }
        if self.min_rel_volume < 0.0 || self.upper_band_proximity < 0.0 {
            bail!("Volume and band thresholds must be non-negative");
        }
        if self.pe_range.0 > self.pe_range.1 {
            bail!("P/E range min exceeds max: {:?}", self.pe_range);
        }
        Ok(())
    }
}

/// Everything the classifier looks at for one ticker
#[derive(Debug, Clone, Copy)]
pub struct SignalInputs<'a> {
    pub row: &'a FeatureRow,
    pub score: &'a EnsembleScore,
    pub backtest: Option<&'a BacktestSummary>,
    pub fundamentals: Option<&'a Fundamentals>,
}

/// A failed technical rule
#[derive(Debug, Clone, PartialEq)]
pub enum RuleFailure {
    LowRelativeVolume { rel_volume: f64, min: f64 },
    RsiOutOfBand { rsi: f64, band: (f64, f64) },
    BelowSma50 { close: f64, sma_50: f64 },
    FarFromUpperBand { gap: f64, max: f64 },
    MacdBelowSignal { macd: f64, signal: f64 },
}

impl fmt::Display for RuleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleFailure::LowRelativeVolume { rel_volume, min } => {
                write!(f, "relative volume {:.2}x below {:.2}x", rel_volume, min)
            }
            RuleFailure::RsiOutOfBand { rsi, band } => {
                write!(f, "RSI {:.1} outside {:.0}-{:.0}", rsi, band.0, band.1)
            }
            RuleFailure::BelowSma50 { close, sma_50 } => {
                write!(f, "close {:.2} not above SMA50 {:.2}", close, sma_50)
            }
            RuleFailure::FarFromUpperBand { gap, max } => write!(
                f,
                "close {:.1}% below upper band (max {:.1}%)",
                gap * 100.0,
                max * 100.0
            ),
            RuleFailure::MacdBelowSignal { macd, signal } => {
                write!(f, "MACD {:.3} not above signal {:.3}", macd, signal)
            }
        }
    }
}

/// Result of classifying one ticker
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Signal {
        label: SignalLabel,
        explanation: String,
    },
    /// Did not qualify; the reason is kept for logs
    NoSignal { reason: String },
}

/// Applies the decision policy: technical rules, fundamentals gate, label.
#[derive(Debug, Clone, Default)]
pub struct SignalClassifier {
    policy: SignalPolicy,
}

impl SignalClassifier {
    pub fn new(policy: SignalPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SignalPolicy {
        &self.policy
    }

    /// Every technical rule the row fails, empty when all pass
    pub fn rule_failures(&self, row: &FeatureRow) -> Vec<RuleFailure> {
        let p = &self.policy;
        let mut failures = Vec::new();

        if row.rel_volume < p.min_rel_volume {
            failures.push(RuleFailure::LowRelativeVolume {
                rel_volume: row.rel_volume,
                min: p.min_rel_volume,
            });
        }
        if row.rsi < p.rsi_band.0 || row.rsi > p.rsi_band.1 {
            failures.push(RuleFailure::RsiOutOfBand {
                rsi: row.rsi,
                band: p.rsi_band,
            });
        }
        if !row.above_sma_50() {
            failures.push(RuleFailure::BelowSma50 {
                close: row.close,
                sma_50: row.sma_50,
            });
        }
        // A close above the band (negative gap) counts as near it
        let gap = row.upper_band_gap();
        if gap > p.upper_band_proximity {
            failures.push(RuleFailure::FarFromUpperBand {
                gap,
                max: p.upper_band_proximity,
            });
        }
        if !row.macd_above_signal() {
            failures.push(RuleFailure::MacdBelowSignal {
                macd: row.macd,
                signal: row.macd_signal,
            });
        }
        failures
    }

    pub fn passes_rules(&self, row: &FeatureRow) -> bool {
        self.rule_failures(row).is_empty()
    }

    /// `Err(reason)` when fundamentals disqualify the ticker
    pub fn fundamentals_gate(&self, fundamentals: Option<&Fundamentals>) -> Result<(), String> {
        let Some(f) = fundamentals.filter(|f| !f.is_empty()) else {
            return if self.policy.require_fundamentals {
                Err("fundamentals required but unavailable".to_string())
            } else {
                Ok(())
            };
        };

        let (pe_min, pe_max) = self.policy.pe_range;
        if let Some(pe) = f.pe_ratio {
            if !(pe_min..=pe_max).contains(&pe) {
                return Err(format!("P/E {:.1} outside {:.0}-{:.0}", pe, pe_min, pe_max));
            }
        }
        if let Some(eps) = f.eps {
            if eps <= 0.0 {
                return Err(format!("EPS {:.2} not positive", eps));
            }
        }
        if let Some(g) = f.revenue_growth {
            if g <= 0.0 {
                return Err(format!("revenue growth {:.1}% not positive", g * 100.0));
            }
        }
        if let Some(g) = f.earnings_growth {
            if g <= 0.0 {
                return Err(format!("earnings growth {:.1}% not positive", g * 100.0));
            }
        }
        Ok(())
    }

    /// Strong Buy needs confidence and a corroborating track record
    pub fn is_strong(&self, score: &EnsembleScore, backtest: Option<&BacktestSummary>) -> bool {
        score.probability > self.policy.probability_threshold
            && backtest.is_some_and(|b| {
                b.win_rate > self.policy.win_rate_threshold
                    && b.signal_count >= self.policy.min_backtest_signals
            })
    }

    pub fn classify(&self, inputs: SignalInputs<'_>) -> Decision {
        let failures = self.rule_failures(inputs.row);
        if !failures.is_empty() {
            let reason = failures
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            return Decision::NoSignal { reason };
        }

        if let Err(reason) = self.fundamentals_gate(inputs.fundamentals) {
            return Decision::NoSignal { reason };
        }

        let label = if self.is_strong(inputs.score, inputs.backtest) {
            SignalLabel::StrongBuy
        } else if inputs.score.probability >= self.policy.min_buy_probability {
            SignalLabel::Buy
        } else {
            return Decision::NoSignal {
                reason: format!(
                    "probability {:.2} below {:.2}",
                    inputs.score.probability, self.policy.min_buy_probability
                ),
            };
        };

        debug!(
            "SignalClassifier: {} on {} (p={:.3})",
            label, inputs.row.date, inputs.score.probability
        );
        Decision::Signal {
            label,
            explanation: explain(&inputs),
        }
    }
}

/// Human-readable summary of the values behind a signal
pub fn explain(inputs: &SignalInputs<'_>) -> String {
    let row = inputs.row;
    let score = inputs.score;
    let mut parts = vec![
        format!("RSI {:.1}", row.rsi),
        format!(
            "MACD {:.3} {} signal {:.3}",
            row.macd,
            if row.macd_above_signal() { ">" } else { "<=" },
            row.macd_signal
        ),
        format!("rel volume {:.2}x", row.rel_volume),
        format!("{:.1}% below upper band", row.upper_band_gap() * 100.0),
        format!(
            "close {:.2} {} SMA50 {:.2}",
            row.close,
            if row.above_sma_50() { ">" } else { "<=" },
            row.sma_50
        ),
        format!(
            "probability {:.2} (RF {:.2}, GB {:.2}, LR {:.2})",
            score.probability, score.random_forest, score.gradient_boosting, score.logistic
        ),
    ];

    if let Some(b) = inputs.backtest {
        parts.push(format!(
            "backtest win rate {:.1}% over {} signals",
            b.win_rate, b.signal_count
        ));
    }

    if let Some(f) = inputs.fundamentals.filter(|f| !f.is_empty()) {
        let mut fund = Vec::new();
        if let Some(pe) = f.pe_ratio {
            fund.push(format!("P/E {:.1}", pe));
        }
        if let Some(eps) = f.eps {
            fund.push(format!("EPS {:.2}", eps));
        }
        if let Some(g) = f.revenue_growth {
            fund.push(format!("revenue growth {:.1}%", g * 100.0));
        }
        if let Some(g) = f.earnings_growth {
            fund.push(format!("earnings growth {:.1}%", g * 100.0));
        }
        parts.push(fund.join(", "));
    }

    parts.join("; ")
}
