use super::{ProbabilisticClassifier, check_row, check_training_set};
use crate::application::ml::dataset::TrainingSet;
use crate::domain::errors::ModelError;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;

const NAME: &str = "RandomForest";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestParams {
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 8,
            min_samples_split: 4,
            seed: 42,
        }
    }
}

/// Random forest fitted on 0/1 targets.
///
/// Each leaf holds the mean target of its samples, so the averaged tree
/// output is the fraction of positive neighbours: a probability.
pub struct RandomForestClassifier {
    params: RandomForestParams,
    model: Option<RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>>,
    n_features: usize,
}

impl RandomForestClassifier {
    pub fn new(params: RandomForestParams) -> Self {
        Self {
            params,
            model: None,
            n_features: 0,
        }
    }
}

impl ProbabilisticClassifier for RandomForestClassifier {
    fn name(&self) -> &'static str {
        NAME
    }

    fn fit(&mut self, data: &TrainingSet) -> Result<(), ModelError> {
        self.n_features = check_training_set(data)?;

        let x = DenseMatrix::from_2d_vec(&data.x).map_err(|e| ModelError::Backend {
            model: NAME,
            reason: format!("Matrix error: {}", e),
        })?;
        let y = data.y_as_f64();

        let params = RandomForestRegressorParameters::default()
            .with_n_trees(self.params.n_trees)
            .with_max_depth(self.params.max_depth)
            .with_min_samples_split(self.params.min_samples_split)
            .with_seed(self.params.seed);

        let model = RandomForestRegressor::fit(&x, &y, params).map_err(|e| ModelError::Backend {
            model: NAME,
            reason: format!("Training error: {}", e),
        })?;
        self.model = Some(model);
        Ok(())
    }

    fn predict_proba(&self, row: &[f64]) -> Result<f64, ModelError> {
        let model = self
            .model
            .as_ref()
            .ok_or(ModelError::NotFitted { model: NAME })?;
        check_row(row, self.n_features)?;

        let input = DenseMatrix::from_2d_vec(&vec![row.to_vec()]).map_err(|e| {
            ModelError::Backend {
                model: NAME,
                reason: format!("Matrix error: {}", e),
            }
        })?;
        let predictions = model.predict(&input).map_err(|e| ModelError::Backend {
            model: NAME,
            reason: format!("Predict error: {}", e),
        })?;

        predictions
            .first()
            .map(|p| p.clamp(0.0, 1.0))
            .ok_or_else(|| ModelError::Backend {
                model: NAME,
                reason: "No prediction returned".to_string(),
            })
    }
}
