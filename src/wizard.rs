//! Prediction Wizard
//!
//! Two-step flow: choose an environment category, then enter measurements and
//! classify. State is an explicit value; every transition consumes the old
//! state and returns the new one, so a rejected action leaves the caller's
//! copy untouched.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::advisory::{advise, AdvisoryMessage};
use crate::features::{EnvironmentCategory, FeatureVector};
use crate::prediction::{HealthStatus, Predictor};

/// Classification shown at the bottom of step 2
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionOutcome {
    pub category: EnvironmentCategory,
    pub features: FeatureVector,
    pub status: HealthStatus,
    pub advisories: Vec<AdvisoryMessage>,
}

/// Wizard position for one session
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WizardState {
    /// Step 1
    #[default]
    CategorySelect,
    /// Step 2, form not yet submitted
    FeatureEntry { category: EnvironmentCategory },
    /// Step 2 with a result displayed
    ResultShown { outcome: PredictionOutcome },
}

/// Explicit user confirmations
#[derive(Debug, Clone, PartialEq)]
pub enum WizardAction {
    Next(EnvironmentCategory),
    Back,
    Predict(FeatureVector),
    StartOver,
}

impl WizardAction {
    fn name(&self) -> &'static str {
        match self {
            WizardAction::Next(_) => "next",
            WizardAction::Back => "back",
            WizardAction::Predict(_) => "predict",
            WizardAction::StartOver => "start over",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WizardError {
    #[error("cannot {action} from step {step}")]
    InvalidTransition { action: &'static str, step: u8 },
}

impl WizardState {
    /// 1 for category selection, 2 for feature entry (with or without result)
    pub fn step(&self) -> u8 {
        match self {
            WizardState::CategorySelect => 1,
            WizardState::FeatureEntry { .. } | WizardState::ResultShown { .. } => 2,
        }
    }

    pub fn category(&self) -> Option<EnvironmentCategory> {
        match self {
            WizardState::CategorySelect => None,
            WizardState::FeatureEntry { category } => Some(*category),
            WizardState::ResultShown { outcome } => Some(outcome.category),
        }
    }

    pub fn outcome(&self) -> Option<&PredictionOutcome> {
        match self {
            WizardState::ResultShown { outcome } => Some(outcome),
            _ => None,
        }
    }

    /// Confirm the category and move to step 2
    pub fn next(self, category: EnvironmentCategory) -> Result<Self, WizardError> {
        match self {
            WizardState::CategorySelect => {
                tracing::debug!(category = %category, "wizard: step 1 -> step 2");
                Ok(WizardState::FeatureEntry { category })
            }
            other => Err(other.reject(&WizardAction::Next(category))),
        }
    }

    /// Leave step 2, discarding the category
    pub fn back(self) -> Result<Self, WizardError> {
        match self {
            WizardState::FeatureEntry { .. } | WizardState::ResultShown { .. } => {
                tracing::debug!("wizard: back to step 1");
                Ok(WizardState::CategorySelect)
            }
            other => Err(other.reject(&WizardAction::Back)),
        }
    }

    /// Full reset from the result view
    pub fn start_over(self) -> Result<Self, WizardError> {
        match self {
            WizardState::ResultShown { .. } => {
                tracing::debug!("wizard: start over");
                Ok(WizardState::CategorySelect)
            }
            other => Err(other.reject(&WizardAction::StartOver)),
        }
    }

    /// Classify the submitted measurements and show the result
    ///
    /// The returned state keeps the category; resubmitting from the result
    /// view replaces the previous outcome.
    pub fn predict(self, features: FeatureVector, predictor: &Predictor) -> Result<Self> {
        let category = match &self {
            WizardState::FeatureEntry { category } => *category,
            WizardState::ResultShown { outcome } => outcome.category,
            WizardState::CategorySelect => {
                return Err(self.reject(&WizardAction::Predict(features)).into())
            }
        };

        let status = predictor.classify(category, &features)?;
        let advisories = advise(&features, status).into_vec();

        tracing::info!(
            category = %category,
            advisories = advisories.len(),
            "prediction: {}",
            status
        );

        Ok(WizardState::ResultShown {
            outcome: PredictionOutcome {
                category,
                features,
                status,
                advisories,
            },
        })
    }

    /// Dispatch an action
    pub fn apply(self, action: WizardAction, predictor: &Predictor) -> Result<Self> {
        match action {
            WizardAction::Next(category) => Ok(self.next(category)?),
            WizardAction::Back => Ok(self.back()?),
            WizardAction::Predict(features) => self.predict(features, predictor),
            WizardAction::StartOver => Ok(self.start_over()?),
        }
    }

    fn reject(&self, action: &WizardAction) -> WizardError {
        tracing::warn!("wizard: rejected '{}' at step {}", action.name(), self.step());
        WizardError::InvalidTransition {
            action: action.name(),
            step: self.step(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FeatureScaler, StressClassifier};
    use crate::advisory::AdvisoryRule;
    use std::sync::Arc;

    struct Identity;

    impl FeatureScaler for Identity {
        fn n_features(&self) -> usize {
            12
        }
        fn transform(&self, input: &[f64]) -> Result<Vec<f64>> {
            Ok(input.to_vec())
        }
    }

    /// Dry soil means high stress, everything else healthy
    struct MoistureRule;

    impl StressClassifier for MoistureRule {
        fn n_features(&self) -> usize {
            12
        }
        fn predict(&self, input: &[f64]) -> Result<i64> {
            Ok(if input[0] < 30.0 { 2 } else { 0 })
        }
    }

    fn predictor() -> Predictor {
        Predictor::new(Arc::new(Identity), Arc::new(MoistureRule)).unwrap()
    }

    fn healthy_sample() -> FeatureVector {
        FeatureVector {
            soil_moisture: 80.0,
            nitrogen: 20.0,
            soil_ph: 6.5,
            light_intensity: 500.0,
            ambient_temperature: 25.0,
            ..FeatureVector::default()
        }
    }

    fn stressed_sample() -> FeatureVector {
        FeatureVector {
            soil_moisture: 10.0,
            nitrogen: 5.0,
            soil_ph: 8.0,
            light_intensity: 200.0,
            ambient_temperature: 40.0,
            ..FeatureVector::default()
        }
    }

    #[test]
    fn test_initial_state() {
        let state = WizardState::default();
        assert_eq!(state.step(), 1);
        assert_eq!(state.category(), None);
    }

    #[test]
    fn test_next_stores_category() {
        let state = WizardState::default()
            .next(EnvironmentCategory::Shade)
            .unwrap();
        assert_eq!(state.step(), 2);
        assert_eq!(state.category(), Some(EnvironmentCategory::Shade));
    }

    #[test]
    fn test_back_clears_category() {
        let state = WizardState::default()
            .next(EnvironmentCategory::Desert)
            .unwrap()
            .back()
            .unwrap();
        assert_eq!(state, WizardState::CategorySelect);
        assert_eq!(state.category(), None);
    }

    #[test]
    fn test_healthy_scenario() {
        let state = WizardState::default()
            .next(EnvironmentCategory::Agricultural)
            .unwrap()
            .predict(healthy_sample(), &predictor())
            .unwrap();

        assert_eq!(state.step(), 2);
        let outcome = state.outcome().unwrap();
        assert_eq!(outcome.status, HealthStatus::Healthy);
        assert_eq!(outcome.category, EnvironmentCategory::Agricultural);
        assert!(outcome.advisories.is_empty());
    }

    #[test]
    fn test_stressed_scenario() {
        let state = WizardState::default()
            .next(EnvironmentCategory::Desert)
            .unwrap()
            .predict(stressed_sample(), &predictor())
            .unwrap();

        let outcome = state.outcome().unwrap();
        assert!(outcome.status.is_stressed());
        let rules: Vec<AdvisoryRule> = outcome.advisories.iter().map(|a| a.rule).collect();
        assert_eq!(rules.len(), 5);
    }

    #[test]
    fn test_reset_after_result() {
        for reset in [WizardAction::Back, WizardAction::StartOver] {
            let state = WizardState::default()
                .apply(WizardAction::Next(EnvironmentCategory::Shade), &predictor())
                .unwrap()
                .apply(WizardAction::Predict(stressed_sample()), &predictor())
                .unwrap()
                .apply(reset, &predictor())
                .unwrap();

            assert_eq!(state, WizardState::CategorySelect);
            assert_eq!(state.category(), None);
        }
    }

    #[test]
    fn test_resubmit_replaces_result() {
        let state = WizardState::default()
            .next(EnvironmentCategory::Agricultural)
            .unwrap()
            .predict(stressed_sample(), &predictor())
            .unwrap()
            .predict(healthy_sample(), &predictor())
            .unwrap();

        assert_eq!(state.outcome().unwrap().status, HealthStatus::Healthy);
        assert_eq!(state.category(), Some(EnvironmentCategory::Agricultural));
    }

    #[test]
    fn test_invalid_transitions() {
        assert_eq!(
            WizardState::default().back(),
            Err(WizardError::InvalidTransition { action: "back", step: 1 })
        );
        assert!(WizardState::default().start_over().is_err());
        assert!(WizardState::default()
            .predict(healthy_sample(), &predictor())
            .is_err());

        let entry = WizardState::default()
            .next(EnvironmentCategory::Desert)
            .unwrap();
        assert!(entry.clone().next(EnvironmentCategory::Shade).is_err());
        assert!(entry.start_over().is_err());
    }

    #[test]
    fn test_rejected_action_keeps_state() {
        let state = WizardState::default()
            .next(EnvironmentCategory::Desert)
            .unwrap();
        let err = state
            .clone()
            .apply(WizardAction::Next(EnvironmentCategory::Shade), &predictor())
            .unwrap_err();

        assert!(err.downcast_ref::<WizardError>().is_some());
        assert_eq!(state.category(), Some(EnvironmentCategory::Desert));
    }
}
