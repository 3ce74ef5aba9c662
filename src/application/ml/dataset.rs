use crate::domain::ml::feature_registry::{
    DEFAULT_FEATURES, FeatureKind, feature_names, features_to_vector,
};
use crate::domain::screening::types::FeatureRow;
use serde::{Deserialize, Serialize};

/// Forward-looking label definition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Bars ahead the outcome is measured at
    pub horizon: usize,
    /// Fractional rise that counts as a positive outcome
    pub rise_threshold: f64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            horizon: 5,
            rise_threshold: 0.02,
        }
    }
}

/// Feature matrix plus binary targets for classifier fitting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSet {
    pub x: Vec<Vec<f64>>,
    pub y: Vec<bool>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn positives(&self) -> usize {
        self.y.iter().filter(|&&t| t).count()
    }

    /// `Some(class)` when every target carries the same class
    pub fn single_class(&self) -> Option<bool> {
        let positives = self.positives();
        if self.y.is_empty() {
            None
        } else if positives == self.y.len() {
            Some(true)
        } else if positives == 0 {
            Some(false)
        } else {
            None
        }
    }

    pub fn n_features(&self) -> usize {
        self.x.first().map_or(0, Vec::len)
    }

    /// Targets as 0/1 regression values
    pub fn y_as_f64(&self) -> Vec<f64> {
        self.y.iter().map(|&t| if t { 1.0 } else { 0.0 }).collect()
    }
}

/// Aligned feature vectors and targets for one ticker
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub feature_names: Vec<&'static str>,
    pub dates: Vec<chrono::NaiveDate>,
    pub features: Vec<Vec<f64>>,
    pub targets: Vec<Option<bool>>,
    pub horizon: usize,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn row(&self, i: usize) -> Option<&[f64]> {
        self.features.get(i).map(Vec::as_slice)
    }

    /// The live prediction row (most recent bar, never labeled)
    pub fn latest(&self) -> Option<&[f64]> {
        self.features.last().map(Vec::as_slice)
    }

    pub fn target(&self, i: usize) -> Option<bool> {
        self.targets.get(i).copied().flatten()
    }

    /// Rows `[0, end)` that carry a target
    pub fn labeled_prefix(&self, end: usize) -> TrainingSet {
        let end = end.min(self.len());
        let mut set = TrainingSet::default();
        for (x, y) in self.features[..end].iter().zip(&self.targets[..end]) {
            if let Some(label) = y {
                set.x.push(x.clone());
                set.y.push(*label);
            }
        }
        set
    }

    /// Every labeled row, used for the live score
    pub fn full_training(&self) -> TrainingSet {
        self.labeled_prefix(self.len())
    }
}

/// Turns feature rows into a `Dataset` with forward-looking targets.
#[derive(Debug, Clone)]
pub struct DatasetBuilder {
    features: Vec<FeatureKind>,
    target: TargetConfig,
}

impl Default for DatasetBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_FEATURES.to_vec(), TargetConfig::default())
    }
}

impl DatasetBuilder {
    pub fn new(features: Vec<FeatureKind>, target: TargetConfig) -> Self {
        Self { features, target }
    }

    pub fn target_config(&self) -> TargetConfig {
        self.target
    }

    pub fn features(&self) -> &[FeatureKind] {
        &self.features
    }

    /// Target per row: `close[i + h] >= close[i] * (1 + rise)`, `None` for the last `h` rows
    pub fn label(&self, rows: &[FeatureRow]) -> Vec<Option<bool>> {
        let h = self.target.horizon;
        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                rows.get(i + h)
                    .filter(|_| h > 0)
                    .map(|ahead| ahead.close >= row.close * (1.0 + self.target.rise_threshold))
            })
            .collect()
    }

    /// Label rows in place and project them onto the configured feature layout
    pub fn build(&self, rows: &mut [FeatureRow]) -> Dataset {
        let targets = self.label(rows);
        for (row, target) in rows.iter_mut().zip(&targets) {
            row.target = *target;
        }

        Dataset {
            feature_names: feature_names(&self.features),
            dates: rows.iter().map(|r| r.date).collect(),
            features: rows
                .iter()
                .map(|r| features_to_vector(r, &self.features))
                .collect(),
            targets,
            horizon: self.target.horizon,
        }
    }
}
