pub mod gradient_boosting;
pub mod logistic;
pub mod random_forest;

use crate::application::ml::dataset::TrainingSet;
use crate::domain::errors::ModelError;

pub use gradient_boosting::{GradientBoostingClassifier, GradientBoostingParams};
pub use logistic::{LogisticParams, LogisticRegressionClassifier};
pub use random_forest::{RandomForestClassifier, RandomForestParams};

/// Binary classifier producing a positive-class probability.
///
/// Instances are single-use: built from parameters, fitted once on one
/// point-in-time training set, queried, dropped.
pub trait ProbabilisticClassifier: Send {
    fn name(&self) -> &'static str;

    fn fit(&mut self, data: &TrainingSet) -> Result<(), ModelError>;

    /// Probability in [0, 1] that `row` belongs to the positive class
    fn predict_proba(&self, row: &[f64]) -> Result<f64, ModelError>;
}

/// Numerically stable logistic function
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Shared guard for every fit: non-empty, rectangular, two classes.
pub(crate) fn check_training_set(data: &TrainingSet) -> Result<usize, ModelError> {
    if data.is_empty() {
        return Err(ModelError::EmptyTrainingSet);
    }
    let n_features = data.n_features();
    if n_features == 0 {
        return Err(ModelError::EmptyTrainingSet);
    }
    if let Some(bad) = data.x.iter().find(|r| r.len() != n_features) {
        return Err(ModelError::DimensionMismatch {
            expected: n_features,
            got: bad.len(),
        });
    }
    if data.x.len() != data.y.len() {
        return Err(ModelError::DimensionMismatch {
            expected: data.y.len(),
            got: data.x.len(),
        });
    }
    if let Some(positive) = data.single_class() {
        return Err(ModelError::SingleClass { positive });
    }
    Ok(n_features)
}

pub(crate) fn check_row(row: &[f64], expected: usize) -> Result<(), ModelError> {
    if row.len() != expected {
        return Err(ModelError::DimensionMismatch {
            expected,
            got: row.len(),
        });
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid_bounds() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(sigmoid(-800.0).is_finite());
    }

    #[test]
    fn test_guard_rejects_single_class() {
        let set = TrainingSet {
            x: vec![vec![1.0], vec![2.0]],
            y: vec![true, true],
        };
        assert_eq!(
            check_training_set(&set),
            Err(ModelError::SingleClass { positive: true })
        );
        assert_eq!(
            check_training_set(&TrainingSet::default()),
            Err(ModelError::EmptyTrainingSet)
        );
    }

    #[test]
    fn test_guard_rejects_ragged_rows() {
        let set = TrainingSet {
            x: vec![vec![1.0, 2.0], vec![2.0]],
            y: vec![true, false],
        };
        assert!(matches!(
            check_training_set(&set),
            Err(ModelError::DimensionMismatch { .. })
        ));
    }
}
