use crate::application::market_data::indicator_engine::IndicatorEngine;
use crate::application::ml::dataset::DatasetBuilder;
use crate::application::ml::ensemble::EnsembleScorer;
use crate::application::ml::walk_forward::{WalkForwardBacktester, WalkForwardReport};
use crate::application::signals::classifier::{Decision, SignalClassifier, SignalInputs};
use crate::domain::errors::{DataError, ScreenerError};
use crate::domain::market::fundamentals::Fundamentals;
use crate::domain::market::price_series::PriceSeries;
use crate::domain::screening::types::{
    EnsembleScore, IndicatorSnapshot, ScoredTicker, TickerOutcome,
};
use chrono::NaiveDate;
use tracing::debug;

/// CPU-bound part of screening one ticker: indicators, dataset, live
/// score, optional backtest, classification.
///
/// Holds only immutable configuration, so it is shared across blocking
/// workers behind an `Arc`.
#[derive(Debug, Clone)]
pub struct SignalPipeline {
    engine: IndicatorEngine,
    builder: DatasetBuilder,
    scorer: EnsembleScorer,
    backtester: WalkForwardBacktester,
    classifier: SignalClassifier,
}

impl SignalPipeline {
    pub fn new(
        engine: IndicatorEngine,
        builder: DatasetBuilder,
        scorer: EnsembleScorer,
        backtester: WalkForwardBacktester,
        classifier: SignalClassifier,
    ) -> Self {
        Self {
            engine,
            builder,
            scorer,
            backtester,
            classifier,
        }
    }

    pub fn classifier(&self) -> &SignalClassifier {
        &self.classifier
    }

    /// Bars of history a ticker needs before it can be scored at all
    pub fn min_bars(&self) -> usize {
        self.engine.config().min_bars()
    }

    /// Live probability above which the walk-forward runs.
    ///
    /// The lower of the backtest confidence and the Strong Buy threshold, so
    /// every Strong Buy candidate has a track record to be judged on.
    pub fn backtest_threshold(&self) -> f64 {
        self.backtester
            .config()
            .confidence_threshold
            .min(self.classifier.policy().probability_threshold)
    }

    /// Screen one series. Errors mean "skip this ticker".
    pub fn evaluate(
        &self,
        series: &PriceSeries,
        fundamentals: Option<&Fundamentals>,
    ) -> Result<TickerOutcome, ScreenerError> {
        let ticker = series.ticker.clone();
        let mut rows = self.engine.compute(series)?;
        let dataset = self.builder.build(&mut rows);

        let (Some(live_row), Some(live)) = (rows.last(), dataset.latest()) else {
            return Err(DataError::InsufficientData {
                bars: series.len(),
                required: self.min_bars(),
            }
            .into());
        };

        let score = self.scorer.score(&dataset.full_training(), live)?;
        debug!(
            "Pipeline: {} p={:.3} (RF {:.3}, GB {:.3}, LR {:.3})",
            ticker, score.probability, score.random_forest, score.gradient_boosting, score.logistic
        );

        // The walk refits the ensemble per step; only pay for it on confident, rule-passing rows
        let backtest = if score.probability > self.backtest_threshold()
            && self.classifier.passes_rules(live_row)
        {
            Some(self.backtester.run(&dataset).summary)
        } else {
            None
        };

        let decision = self.classifier.classify(SignalInputs {
            row: live_row,
            score: &score,
            backtest: backtest.as_ref(),
            fundamentals,
        });

        Ok(match decision {
            Decision::Signal { label, explanation } => TickerOutcome::Signal(ScoredTicker {
                ticker,
                as_of_date: live_row.date,
                score,
                indicators: IndicatorSnapshot::from(live_row),
                backtest,
                fundamentals: fundamentals.cloned(),
                label,
                explanation,
            }),
            Decision::NoSignal { reason } => TickerOutcome::NoSignal { ticker, reason },
        })
    }
}

/// Unconditional scoring and walk-forward for one series, for offline inspection
#[derive(Debug, Clone)]
pub struct TickerDiagnostics {
    pub ticker: String,
    pub as_of_date: NaiveDate,
    pub score: EnsembleScore,
    pub walk_forward: WalkForwardReport,
    pub feature_rows: usize,
}

impl SignalPipeline {
    /// Score the latest bar and walk the whole history, skipping the
    /// confidence and rule gates `evaluate` applies before backtesting.
    pub fn diagnose(&self, series: &PriceSeries) -> Result<TickerDiagnostics, ScreenerError> {
        let mut rows = self.engine.compute(series)?;
        let dataset = self.builder.build(&mut rows);
        let (Some(live_row), Some(live)) = (rows.last(), dataset.latest()) else {
            return Err(DataError::InsufficientData {
                bars: series.len(),
                required: self.min_bars(),
            }
            .into());
        };

        let score = self.scorer.score(&dataset.full_training(), live)?;
        let walk_forward = self.backtester.run(&dataset);

        Ok(TickerDiagnostics {
            ticker: series.ticker.clone(),
            as_of_date: live_row.date,
            score,
            walk_forward,
            feature_rows: rows.len(),
        })
    }
}
