use crate::application::ml::dataset::TrainingSet;
use crate::application::ml::models::{
    GradientBoostingClassifier, GradientBoostingParams, LogisticParams,
    LogisticRegressionClassifier, ProbabilisticClassifier, RandomForestClassifier,
    RandomForestParams,
};
use crate::domain::errors::ModelError;
use crate::domain::screening::types::EnsembleScore;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Immutable recipe for the three-model ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleConfig {
    pub random_forest: RandomForestParams,
    pub gradient_boosting: GradientBoostingParams,
    pub logistic: LogisticParams,
    /// Smallest labeled training set a fit is attempted on
    pub min_training_rows: usize,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            random_forest: RandomForestParams::default(),
            gradient_boosting: GradientBoostingParams::default(),
            logistic: LogisticParams::default(),
            min_training_rows: 30,
        }
    }
}

impl EnsembleConfig {
    /// Re-seed every stochastic model from one seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_forest.seed = seed;
        self.gradient_boosting.seed = seed;
        self
    }
}

/// Averages the positive-class probability of three structurally different
/// classifiers.
///
/// Holds no model state: every `score` call builds, fits and drops its own
/// instances, so one scorer can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct EnsembleScorer {
    config: EnsembleConfig,
}

impl EnsembleScorer {
    pub fn new(config: EnsembleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    fn build_models(&self) -> [Box<dyn ProbabilisticClassifier>; 3] {
        [
            Box::new(RandomForestClassifier::new(self.config.random_forest.clone())),
            Box::new(GradientBoostingClassifier::new(
                self.config.gradient_boosting.clone(),
            )),
            Box::new(LogisticRegressionClassifier::new(self.config.logistic.clone())),
        ]
    }

    /// Degenerate training sets are rejected before any model is fitted
    pub fn check(&self, training: &TrainingSet) -> Result<(), ModelError> {
        if training.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if training.len() < self.config.min_training_rows {
            return Err(ModelError::TooFewRows {
                rows: training.len(),
                required: self.config.min_training_rows,
            });
        }
        if let Some(positive) = training.single_class() {
            return Err(ModelError::SingleClass { positive });
        }
        Ok(())
    }

    /// Fit fresh models on `training` and score `row`.
    pub fn score(&self, training: &TrainingSet, row: &[f64]) -> Result<EnsembleScore, ModelError> {
        self.check(training)?;

        let mut probabilities = [0.0; 3];
        for (slot, mut model) in probabilities.iter_mut().zip(self.build_models()) {
            model.fit(training)?;
            *slot = model.predict_proba(row)?;
            trace!("Ensemble: {} -> {:.4}", model.name(), *slot);
        }

        let [rf, gb, lr] = probabilities;
        Ok(EnsembleScore::from_parts(rf, gb, lr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ml::models::test_support::separable;

    fn fast_config() -> EnsembleConfig {
        EnsembleConfig {
            random_forest: RandomForestParams {
                n_trees: 15,
                ..RandomForestParams::default()
            },
            gradient_boosting: GradientBoostingParams {
                n_estimators: 20,
                ..GradientBoostingParams::default()
            },
            logistic: LogisticParams::default(),
            min_training_rows: 10,
        }
    }

    #[test]
    fn test_probability_is_mean_of_parts() {
        let scorer = EnsembleScorer::new(fast_config());
        let score = scorer.score(&separable(60), &[4.0, 0.5, 2.0]).unwrap();

        let mean = (score.random_forest + score.gradient_boosting + score.logistic) / 3.0;
        assert!((score.probability - mean).abs() < 1e-12);
        assert!((0.0..=1.0).contains(&score.probability));
        assert!(score.probability > 0.6);
    }

    #[test]
    fn test_repeat_calls_agree() {
        let scorer = EnsembleScorer::new(fast_config());
        let data = separable(40);
        let row = [0.3, -0.2, 1.0];

        assert_eq!(
            scorer.score(&data, &row).unwrap(),
            scorer.score(&data, &row).unwrap()
        );
    }

    #[test]
    fn test_single_class_rejected() {
        let scorer = EnsembleScorer::new(fast_config());
        let mut data = separable(40);
        data.y.iter_mut().for_each(|t| *t = false);

        let err = scorer.score(&data, &[0.0, 0.0, 0.0]).unwrap_err();
        assert_eq!(err, ModelError::SingleClass { positive: false });
        assert!(err.to_string().contains("single-class"));
    }

    #[test]
    fn test_too_few_rows_rejected() {
        let scorer = EnsembleScorer::new(fast_config());
        assert_eq!(
            scorer.score(&separable(6), &[0.0, 0.0, 0.0]),
            Err(ModelError::TooFewRows {
                rows: 6,
                required: 10
            })
        );
        assert_eq!(
            scorer.score(&TrainingSet::default(), &[0.0]),
            Err(ModelError::EmptyTrainingSet)
        );
    }
}
