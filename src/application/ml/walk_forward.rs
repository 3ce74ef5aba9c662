use crate::application::ml::dataset::Dataset;
use crate::application::ml::ensemble::EnsembleScorer;
use crate::domain::screening::types::BacktestSummary;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkForwardConfig {
    /// First feature row scored
    pub start_offset: usize,
    /// A step predicts "positive" strictly above this probability
    pub confidence_threshold: f64,
    /// Drop training rows whose label matures after the scored bar.
    /// Off by default: each step trains on every labeled row before it.
    pub embargo: bool,
    /// Evaluate steps on the rayon pool
    pub parallel: bool,
}

impl Default for WalkForwardConfig {
    fn default() -> Self {
        Self {
            start_offset: 200,
            confidence_threshold: 0.6,
            embargo: false,
            parallel: true,
        }
    }
}

/// Outcome of one walk over a ticker's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkForwardReport {
    pub summary: BacktestSummary,
    /// Steps that produced a prediction
    pub steps_evaluated: usize,
    /// Steps whose training prefix could not be fitted
    pub skipped_steps: usize,
    /// Positive predictions that came true
    pub correct: usize,
    /// Whether training windows stopped `horizon` bars before each step
    pub embargo: bool,
}

enum StepOutcome {
    Predicted { positive: bool, correct: bool },
    Skipped,
}

/// Replays the ensemble over the history to measure how often its
/// confident calls were right.
#[derive(Debug, Clone)]
pub struct WalkForwardBacktester {
    scorer: EnsembleScorer,
    config: WalkForwardConfig,
}

impl WalkForwardBacktester {
    pub fn new(scorer: EnsembleScorer, config: WalkForwardConfig) -> Self {
        Self { scorer, config }
    }

    pub fn config(&self) -> &WalkForwardConfig {
        &self.config
    }

    /// Exclusive end of the training window for step `i`
    fn training_end(&self, i: usize, horizon: usize) -> usize {
        if self.config.embargo {
            (i + 1).saturating_sub(horizon).min(i)
        } else {
            i
        }
    }

    fn step(&self, dataset: &Dataset, i: usize) -> StepOutcome {
        let (Some(row), Some(actual)) = (dataset.row(i), dataset.target(i)) else {
            return StepOutcome::Skipped;
        };
        let training = dataset.labeled_prefix(self.training_end(i, dataset.horizon));

        match self.scorer.score(&training, row) {
            Ok(score) => {
                let positive = score.probability > self.config.confidence_threshold;
                StepOutcome::Predicted {
                    positive,
                    correct: positive && actual,
                }
            }
            Err(e) => {
                debug!("WalkForward: step {} skipped: {}", i, e);
                StepOutcome::Skipped
            }
        }
    }

    /// Walk rows `[start_offset, len - horizon)`, training each step on its past only.
    pub fn run(&self, dataset: &Dataset) -> WalkForwardReport {
        let end = dataset.len().saturating_sub(dataset.horizon);
        let start = self.config.start_offset.min(end);

        let outcomes: Vec<StepOutcome> = if self.config.parallel {
            (start..end)
                .into_par_iter()
                .map(|i| self.step(dataset, i))
                .collect()
        } else {
            (start..end).map(|i| self.step(dataset, i)).collect()
        };

        let mut report = WalkForwardReport {
            summary: BacktestSummary {
                win_rate: 0.0,
                signal_count: 0,
            },
            steps_evaluated: 0,
            skipped_steps: 0,
            correct: 0,
            embargo: self.config.embargo,
        };
        for outcome in outcomes {
            match outcome {
                StepOutcome::Predicted { positive, correct } => {
                    report.steps_evaluated += 1;
                    if positive {
                        report.summary.signal_count += 1;
                    }
                    if correct {
                        report.correct += 1;
                    }
                }
                StepOutcome::Skipped => report.skipped_steps += 1,
            }
        }
        report.summary.win_rate = win_rate(report.correct, report.summary.signal_count);

        info!(
            "WalkForward: {} steps ({} training window), {} skipped, {} signals, win rate {:.1}%",
            report.steps_evaluated,
            if report.embargo { "embargoed" } else { "full" },
            report.skipped_steps,
            report.summary.signal_count,
            report.summary.win_rate
        );
        report
    }
}

/// Percentage of positive calls that were right, one decimal, 0 without calls
pub fn win_rate(correct: usize, positives: usize) -> f64 {
    if positives == 0 {
        return 0.0;
    }
    (correct as f64 / positives as f64 * 1000.0).round() / 10.0
}
