//! Plant Stress Dashboard
//!
//! Predicts a plant's stress status from soil and climate measurements using a
//! pretrained classifier, and charts recorded health outcomes.
//!
//! - `features`: environment categories, measured features, model input encoding
//! - `model`: scaler/classifier artifacts behind the `FeatureScaler` and
//!   `StressClassifier` traits
//! - `prediction`: status lookup and the `Predictor` pipeline
//! - `advisory`: threshold rules for stressed plants
//! - `wizard`: the two-step prediction state machine
//! - `data` / `visualization`: health dataset loading and per-status aggregates
//! - `resources`: memoized loading of the static inputs
//!
//! With the `api` feature: `api_server` and `web` serve the dashboard over HTTP.

pub mod advisory;
pub mod config;
pub mod data;
pub mod features;
pub mod model;
pub mod prediction;
pub mod resources;
pub mod visualization;
pub mod wizard;

#[cfg(feature = "api")]
pub mod api_server;
#[cfg(feature = "api")]
pub mod web;

// Re-export commonly used types
pub use advisory::{advise, AdvisoryMessage, AdvisoryRule};
pub use config::DashboardConfig;
pub use data::HealthDataset;
pub use features::{EnvironmentCategory, FeatureVector};
pub use prediction::{ContractError, HealthStatus, Predictor};
pub use resources::{ResourceLoader, ResourcePaths};
pub use visualization::{aggregate, ChartFeature, StatusMean};
pub use wizard::{WizardAction, WizardError, WizardState};

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
