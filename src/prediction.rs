//! Classification step
//!
//! Encodes the wizard inputs, scales them, runs the classifier and maps the
//! returned code through the fixed status table.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::features::{EnvironmentCategory, FeatureVector, MODEL_INPUT_WIDTH};
use crate::model::{FeatureScaler, StressClassifier};

/// Predicted plant health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    ModerateStress,
    HighStress,
}

impl HealthStatus {
    /// Display order used by results and charts
    pub const ALL: [HealthStatus; 3] = [
        HealthStatus::Healthy,
        HealthStatus::ModerateStress,
        HealthStatus::HighStress,
    ];

    /// Fixed lookup from model output; anything else is a contract violation
    pub fn from_code(code: i64) -> Result<Self, ContractError> {
        match code {
            0 => Ok(HealthStatus::Healthy),
            1 => Ok(HealthStatus::ModerateStress),
            2 => Ok(HealthStatus::HighStress),
            other => Err(ContractError::UnknownStatusCode(other)),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            HealthStatus::Healthy => 0,
            HealthStatus::ModerateStress => 1,
            HealthStatus::HighStress => 2,
        }
    }

    /// Result banner text
    pub fn label(self) -> &'static str {
        match self {
            HealthStatus::Healthy => "Healthy Plant",
            HealthStatus::ModerateStress => "Moderate Stress",
            HealthStatus::HighStress => "High Stress",
        }
    }

    /// Chart tick text
    pub fn short_label(self) -> &'static str {
        match self {
            HealthStatus::Healthy => "Healthy",
            HealthStatus::ModerateStress => "Moderate",
            HealthStatus::HighStress => "High Stress",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            HealthStatus::Healthy => "✅",
            HealthStatus::ModerateStress => "⚠",
            HealthStatus::HighStress => "🚨",
        }
    }

    pub fn is_stressed(self) -> bool {
        self != HealthStatus::Healthy
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Programming or data errors that must never be defaulted away
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractError {
    #[error("model returned class code {0}, expected 0 (Healthy), 1 (Moderate Stress) or 2 (High Stress)")]
    UnknownStatusCode(i64),

    #[error("feature '{0}' is not available for visualization")]
    UnsupportedFeature(String),
}

/// Scaler + classifier pair, shared read-only across sessions
#[derive(Clone)]
pub struct Predictor {
    scaler: Arc<dyn FeatureScaler>,
    classifier: Arc<dyn StressClassifier>,
}

impl Predictor {
    /// Pair a scaler with a classifier; both must accept the 12-wide input
    pub fn new(scaler: Arc<dyn FeatureScaler>, classifier: Arc<dyn StressClassifier>) -> Result<Self> {
        if scaler.n_features() != MODEL_INPUT_WIDTH {
            bail!(
                "scaler was fitted on {} features, dashboard supplies {}",
                scaler.n_features(),
                MODEL_INPUT_WIDTH
            );
        }
        if classifier.n_features() != MODEL_INPUT_WIDTH {
            bail!(
                "classifier was trained on {} features, dashboard supplies {}",
                classifier.n_features(),
                MODEL_INPUT_WIDTH
            );
        }
        Ok(Self { scaler, classifier })
    }

    /// Classify one sample
    ///
    /// # Errors
    /// Returns `ContractError::UnknownStatusCode` (inside the `anyhow` chain)
    /// when the model answers with a code outside the status table.
    pub fn classify(&self, category: EnvironmentCategory, features: &FeatureVector) -> Result<HealthStatus> {
        let input = features.to_model_input(category);
        let scaled = self.scaler.transform(&input)?;
        let code = self.classifier.predict(&scaled)?;

        let status = HealthStatus::from_code(code).map_err(|e| {
            tracing::error!("{}", e);
            e
        })?;

        tracing::debug!(category = %category, code, "classified sample as {}", status);
        Ok(status)
    }
}
