//! Pretrained model artifacts
//!
//! The classifier and scaler are black boxes to the dashboard: it only needs
//! `transform(vector) -> vector` and `predict(vector) -> class code`.

pub mod classifier;
pub mod scaler;

pub use classifier::{
    ClassifierArtifact, DecisionTree, DecisionTreeClassifier, LogisticRegression,
    RandomForestClassifier,
};
pub use scaler::{MinMaxScaler, ScalerArtifact, StandardScaler};

use anyhow::Result;

/// Deterministic normalization applied before classification
pub trait FeatureScaler: Send + Sync {
    fn n_features(&self) -> usize;
    fn transform(&self, input: &[f64]) -> Result<Vec<f64>>;
}

/// Single-sample classifier returning the raw class code
pub trait StressClassifier: Send + Sync {
    fn n_features(&self) -> usize;
    fn predict(&self, input: &[f64]) -> Result<i64>;
}
