use super::{ProbabilisticClassifier, check_row, check_training_set, sigmoid};
use crate::application::ml::dataset::TrainingSet;
use crate::domain::errors::ModelError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_regressor::{
    DecisionTreeRegressor, DecisionTreeRegressorParameters,
};

const NAME: &str = "GradientBoosting";

type Tree = DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Boosting hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingParams {
    /// Number of boosting rounds (trees)
    pub n_estimators: usize,
    /// Shrinkage applied to every tree
    pub learning_rate: f64,
    pub max_depth: u16,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Fraction of rows drawn (without replacement) per round
    pub subsample: f64,
    pub seed: u64,
}

impl Default for GradientBoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 1,
            subsample: 0.8,
            seed: 42,
        }
    }
}

/// Binomial-deviance gradient boosting over regression trees.
///
/// Starts from the training log-odds; every round fits a tree to the
/// residuals `y - p` and adds it, shrunk by the learning rate, to the raw
/// score. The probability is the sigmoid of that score.
pub struct GradientBoostingClassifier {
    params: GradientBoostingParams,
    init_score: f64,
    trees: Vec<Tree>,
    n_features: usize,
}

impl GradientBoostingClassifier {
    pub fn new(params: GradientBoostingParams) -> Self {
        Self {
            params,
            init_score: 0.0,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    fn tree_params(&self) -> DecisionTreeRegressorParameters {
        DecisionTreeRegressorParameters::default()
            .with_max_depth(self.params.max_depth)
            .with_min_samples_split(self.params.min_samples_split)
            .with_min_samples_leaf(self.params.min_samples_leaf)
    }

    fn backend(reason: String) -> ModelError {
        ModelError::Backend {
            model: NAME,
            reason,
        }
    }
}

impl ProbabilisticClassifier for GradientBoostingClassifier {
    fn name(&self) -> &'static str {
        NAME
    }

    fn fit(&mut self, data: &TrainingSet) -> Result<(), ModelError> {
        self.n_features = check_training_set(data)?;
        let n = data.len();
        let y = data.y_as_f64();

        let p0 = data.positives() as f64 / n as f64;
        self.init_score = (p0 / (1.0 - p0)).ln();
        self.trees.clear();

        let x_all = DenseMatrix::from_2d_vec(&data.x)
            .map_err(|e| Self::backend(format!("Matrix error: {}", e)))?;
        let mut scores = vec![self.init_score; n];

        let sample_size = ((n as f64 * self.params.subsample.clamp(0.0, 1.0)).round() as usize)
            .clamp(2.min(n), n);
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let mut indices: Vec<usize> = (0..n).collect();

        for _ in 0..self.params.n_estimators {
            let residuals: Vec<f64> = y
                .iter()
                .zip(&scores)
                .map(|(t, s)| t - sigmoid(*s))
                .collect();

            let fitted = if sample_size < n {
                indices.shuffle(&mut rng);
                let picked = &indices[..sample_size];
                let x_sub: Vec<Vec<f64>> = picked.iter().map(|&i| data.x[i].clone()).collect();
                let r_sub: Vec<f64> = picked.iter().map(|&i| residuals[i]).collect();
                let x_sub = DenseMatrix::from_2d_vec(&x_sub)
                    .map_err(|e| Self::backend(format!("Matrix error: {}", e)))?;
                Tree::fit(&x_sub, &r_sub, self.tree_params())
            } else {
                Tree::fit(&x_all, &residuals, self.tree_params())
            };
            let tree = fitted.map_err(|e| Self::backend(format!("Training error: {}", e)))?;

            let update = tree
                .predict(&x_all)
                .map_err(|e| Self::backend(format!("Predict error: {}", e)))?;
            for (s, u) in scores.iter_mut().zip(update) {
                *s += self.params.learning_rate * u;
            }
            self.trees.push(tree);
        }
        Ok(())
    }

    fn predict_proba(&self, row: &[f64]) -> Result<f64, ModelError> {
        if self.n_features == 0 {
            return Err(ModelError::NotFitted { model: NAME });
        }
        check_row(row, self.n_features)?;

        let input = DenseMatrix::from_2d_vec(&vec![row.to_vec()])
            .map_err(|e| Self::backend(format!("Matrix error: {}", e)))?;
        let mut score = self.init_score;
        for tree in &self.trees {
            let out = tree
                .predict(&input)
                .map_err(|e| Self::backend(format!("Predict error: {}", e)))?;
            score += self.params.learning_rate * out.first().copied().unwrap_or(0.0);
        }
        Ok(sigmoid(score).clamp(0.0, 1.0))
    }
}
