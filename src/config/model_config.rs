//! Target, ensemble and walk-forward settings from environment variables.

use super::{Lookup, parse_opt, parse_var};
use crate::application::ml::dataset::TargetConfig;
use crate::application::ml::ensemble::EnsembleConfig;
use crate::application::ml::walk_forward::WalkForwardConfig;
use anyhow::{Result, bail};

#[derive(Debug, Clone, Default)]
pub struct ModelEnvConfig {
    pub target: TargetConfig,
    pub ensemble: EnsembleConfig,
    pub walk_forward: WalkForwardConfig,
}

impl ModelEnvConfig {
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self> {
        let defaults = Self::default();

        let horizon: usize = parse_var(lookup, "TARGET_HORIZON", defaults.target.horizon)?;
        if horizon == 0 {
            bail!("TARGET_HORIZON must be at least 1");
        }
        let rise_pct: f64 = parse_var(
            lookup,
            "TARGET_RISE_PCT",
            defaults.target.rise_threshold * 100.0,
        )?;
        let target = TargetConfig {
            horizon,
            rise_threshold: rise_pct / 100.0,
        };

        let mut ensemble = defaults.ensemble;
        if let Some(seed) = parse_opt::<u64>(lookup, "MODEL_SEED")? {
            ensemble = ensemble.with_seed(seed);
        }
        let rf = &mut ensemble.random_forest;
        rf.n_trees = parse_var(lookup, "RF_TREES", rf.n_trees)?;
        rf.max_depth = parse_var(lookup, "RF_MAX_DEPTH", rf.max_depth)?;
        let gbm = &mut ensemble.gradient_boosting;
        gbm.n_estimators = parse_var(lookup, "GBM_ESTIMATORS", gbm.n_estimators)?;
        gbm.learning_rate = parse_var(lookup, "GBM_LEARNING_RATE", gbm.learning_rate)?;
        gbm.max_depth = parse_var(lookup, "GBM_MAX_DEPTH", gbm.max_depth)?;
        let logit = &mut ensemble.logistic;
        logit.iterations = parse_var(lookup, "LOGIT_ITERATIONS", logit.iterations)?;
        logit.learning_rate = parse_var(lookup, "LOGIT_LEARNING_RATE", logit.learning_rate)?;
        logit.l2 = parse_var(lookup, "LOGIT_L2", logit.l2)?;
        ensemble.min_training_rows =
            parse_var(lookup, "MIN_TRAINING_ROWS", ensemble.min_training_rows)?;
        if ensemble.random_forest.n_trees == 0 {
            bail!("RF_TREES must be at least 1");
        }

        let wf = defaults.walk_forward;
        let confidence_threshold: f64 =
            parse_var(lookup, "CONFIDENCE_THRESHOLD", wf.confidence_threshold)?;
        if !(0.0..=1.0).contains(&confidence_threshold) {
            bail!(
                "CONFIDENCE_THRESHOLD must lie within [0, 1], got {}",
                confidence_threshold
            );
        }
        let walk_forward = WalkForwardConfig {
            start_offset: parse_var(lookup, "BACKTEST_START_OFFSET", wf.start_offset)?,
            confidence_threshold,
            embargo: parse_var(lookup, "BACKTEST_EMBARGO", wf.embargo)?,
            parallel: parse_var(lookup, "BACKTEST_PARALLEL", wf.parallel)?,
        };

        Ok(Self {
            target,
            ensemble,
            walk_forward,
        })
    }
}
