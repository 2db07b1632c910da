// Axum Dashboard Server Module
//
// Purpose: Serve the Predict / Visualizations views plus a JSON API over the
// same wizard, advisory and aggregation logic.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Redirect},
    routing::{get, post},
    Router,
};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::config::DashboardConfig;
use crate::data::HealthDataset;
use crate::features::{EnvironmentCategory, FeatureVector};
use crate::prediction::{ContractError, HealthStatus, Predictor};
use crate::resources::ResourceLoader;
use crate::visualization::{aggregate, BarChart, ChartFeature, StatusMean};
use crate::web::handlers::pages;
use crate::web::session::SessionStore;
use crate::wizard::{WizardAction, WizardError, WizardState};

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub predictor: Predictor,
    pub dataset: Arc<HealthDataset>,
    pub sessions: SessionStore,
    /// Aggregates per chart feature (dataset is static)
    pub chart_cache: Cache<ChartFeature, Arc<Vec<StatusMean>>>,
}

impl AppState {
    /// Load every resource up front; any failure aborts startup
    pub fn new(config: &DashboardConfig) -> anyhow::Result<Self> {
        let resources = ResourceLoader::new(config.paths.clone());

        tracing::info!("Loading model artifacts...");
        let predictor = resources.predictor()?;

        tracing::info!("Loading health dataset...");
        let dataset = resources.load_dataset()?;

        tracing::info!(
            "Initializing session cache (idle TTL {}s)...",
            config.session_ttl.as_secs()
        );
        let sessions = SessionStore::new(config.session_ttl);

        let chart_cache = Cache::builder()
            .max_capacity(ChartFeature::ALL.len() as u64)
            .time_to_live(Duration::from_secs(24 * 3600))
            .build();

        Ok(Self {
            predictor,
            dataset,
            sessions,
            chart_cache,
        })
    }

    /// Per-status means for a chart feature, computed once per feature
    pub async fn chart_means(&self, feature: ChartFeature) -> Result<Arc<Vec<StatusMean>>, AppError> {
        if let Some(cached) = self.chart_cache.get(&feature).await {
            tracing::debug!("Cache hit for chart {}", feature);
            return Ok(cached);
        }

        let means = Arc::new(aggregate(&self.dataset, feature)?);
        self.chart_cache.insert(feature, Arc::clone(&means)).await;
        Ok(means)
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Dashboard pages (HTML)
        .route("/", get(|| async { Redirect::to("/predict") }))
        .route("/predict", get(pages::predict_page))
        .route("/predict/category", post(pages::choose_category))
        .route("/predict/back", post(pages::go_back))
        .route("/predict/submit", post(pages::submit_features))
        .route("/predict/reset", post(pages::start_over))
        .route("/visualizations", get(pages::visualizations_page))

        // JSON API
        .route("/api/predict", post(predict_json))
        .route("/api/visualizations/:feature", get(visualization_json))

        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "dataset_rows": state.dataset.height(),
    }))
}

#[derive(Debug, Deserialize)]
struct PredictRequest {
    category: String,
    features: FeatureVector,
}

#[derive(Debug, Serialize)]
struct PredictResponse {
    category: EnvironmentCategory,
    status: HealthStatus,
    code: i64,
    label: &'static str,
    advisories: Vec<crate::advisory::AdvisoryMessage>,
}

/// One-shot prediction: runs the full wizard flow for a single request
async fn predict_json(
    State(state): State<AppState>,
    Json(payload): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, AppError> {
    let category: EnvironmentCategory = payload
        .category
        .parse()
        .map_err(|e: crate::features::UnknownCategory| AppError::BadRequest(e.to_string()))?;

    let wizard = WizardState::default()
        .apply(WizardAction::Next(category), &state.predictor)?
        .apply(WizardAction::Predict(payload.features.clamped()), &state.predictor)?;

    let outcome = wizard
        .outcome()
        .ok_or_else(|| AppError::Internal("prediction produced no result".to_string()))?;

    Ok(Json(PredictResponse {
        category,
        status: outcome.status,
        code: outcome.status.code(),
        label: outcome.status.label(),
        advisories: outcome.advisories.clone(),
    }))
}

async fn visualization_json(
    State(state): State<AppState>,
    Path(feature): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let feature: ChartFeature = feature.parse()?;
    let means = state.chart_means(feature).await?;
    let chart = BarChart::for_feature(feature, means.as_ref().clone());

    Ok(Json(serde_json::json!({
        "feature": feature.column(),
        "title": chart.title,
        "note": feature.note(),
        "data": chart.bars,
    })))
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Contract(String),
    Template(String),
    Internal(String),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(wizard) = err.downcast_ref::<WizardError>() {
            return AppError::Conflict(wizard.to_string());
        }
        if let Some(contract) = err.downcast_ref::<ContractError>() {
            return contract.clone().into();
        }
        AppError::Internal(format!("{:#}", err))
    }
}

impl From<ContractError> for AppError {
    fn from(err: ContractError) -> Self {
        tracing::error!("Contract violation: {}", err);
        match err {
            ContractError::UnsupportedFeature(_) => AppError::NotFound(err.to_string()),
            ContractError::UnknownStatusCode(_) => AppError::Contract(err.to_string()),
        }
    }
}

impl From<WizardError> for AppError {
    fn from(err: WizardError) -> Self {
        AppError::Conflict(err.to_string())
    }
}

impl From<askama::Error> for AppError {
    fn from(err: askama::Error) -> Self {
        AppError::Template(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Contract(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Template(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
