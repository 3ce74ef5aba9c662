use super::{ProbabilisticClassifier, check_row, check_training_set, sigmoid};
use crate::application::ml::dataset::TrainingSet;
use crate::domain::errors::ModelError;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

const NAME: &str = "LogisticRegression";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    pub learning_rate: f64,
    pub iterations: usize,
    /// L2 penalty on the weights (not the intercept)
    pub l2: f64,
    /// Stop once the largest gradient component falls below this
    pub tolerance: f64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            iterations: 500,
            l2: 0.01,
            tolerance: 1e-6,
        }
    }
}

/// Batch gradient-descent logistic regression on z-scored features.
///
/// Scaling statistics come from the training rows only and are reapplied
/// to the scored row.
pub struct LogisticRegressionClassifier {
    params: LogisticParams,
    means: Array1<f64>,
    stds: Array1<f64>,
    weights: Option<Array1<f64>>,
    bias: f64,
}

impl LogisticRegressionClassifier {
    pub fn new(params: LogisticParams) -> Self {
        Self {
            params,
            means: Array1::zeros(0),
            stds: Array1::zeros(0),
            weights: None,
            bias: 0.0,
        }
    }

    fn standardize(&self, row: ArrayView1<f64>) -> Array1<f64> {
        (&row - &self.means) / &self.stds
    }
}

impl ProbabilisticClassifier for LogisticRegressionClassifier {
    fn name(&self) -> &'static str {
        NAME
    }

    fn fit(&mut self, data: &TrainingSet) -> Result<(), ModelError> {
        let n_features = check_training_set(data)?;
        let n_samples = data.len();

        let flat: Vec<f64> = data.x.iter().flatten().copied().collect();
        let x = Array2::from_shape_vec((n_samples, n_features), flat).map_err(|e| {
            ModelError::Backend {
                model: NAME,
                reason: e.to_string(),
            }
        })?;
        let y = Array1::from(data.y_as_f64());

        self.means = x
            .mean_axis(Axis(0))
            .ok_or(ModelError::EmptyTrainingSet)?;
        // Constant columns keep unit scale
        self.stds = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 1e-12 { s } else { 1.0 });
        let x = (&x - &self.means) / &self.stds;

        let mut weights = Array1::<f64>::zeros(n_features);
        let mut bias = 0.0;
        let n = n_samples as f64;

        for _ in 0..self.params.iterations {
            let z = x.dot(&weights) + bias;
            let errors = z.mapv(sigmoid) - &y;

            let grad_w = x.t().dot(&errors) / n + &weights * self.params.l2;
            let grad_b = errors.sum() / n;

            weights = weights - &grad_w * self.params.learning_rate;
            bias -= self.params.learning_rate * grad_b;

            let max_grad = grad_w
                .iter()
                .fold(grad_b.abs(), |acc, g| acc.max(g.abs()));
            if max_grad < self.params.tolerance {
                break;
            }
        }

        self.weights = Some(weights);
        self.bias = bias;
        Ok(())
    }

    fn predict_proba(&self, row: &[f64]) -> Result<f64, ModelError> {
        let weights = self
            .weights
            .as_ref()
            .ok_or(ModelError::NotFitted { model: NAME })?;
        check_row(row, weights.len())?;

        let scaled = self.standardize(ArrayView1::from(row));
        Ok(sigmoid(scaled.dot(weights) + self.bias).clamp(0.0, 1.0))
    }
}
