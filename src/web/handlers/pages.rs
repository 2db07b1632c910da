// Page handlers for HTML rendering with Askama

use askama::Template;
use axum::{
    extract::{Form, Query, State},
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_htmx::HxRequest;
use serde::Deserialize;

use crate::api_server::{AppError, AppState};
use crate::features::{EnvironmentCategory, FeatureVector, FEATURE_SPECS};
use crate::visualization::{BarChart, ChartFeature};
use crate::web::session::Session;
use crate::wizard::{PredictionOutcome, WizardAction, WizardError, WizardState};

const PREDICT_PATH: &str = "/predict";

// ============================================================================
// View models
// ============================================================================

pub struct SliderView {
    pub key: &'static str,
    pub label: &'static str,
    pub min: String,
    pub max: String,
    pub step: String,
    pub value: String,
}

pub struct AdvisoryView {
    pub icon: String,
    pub message: String,
}

pub struct ResultView {
    pub icon: &'static str,
    pub label: &'static str,
    pub category: String,
    pub stressed: bool,
    pub advisories: Vec<AdvisoryView>,
}

impl ResultView {
    fn from_outcome(outcome: &PredictionOutcome) -> Self {
        Self {
            icon: outcome.status.icon(),
            label: outcome.status.label(),
            category: outcome.category.to_string(),
            stressed: outcome.status.is_stressed(),
            advisories: outcome
                .advisories
                .iter()
                .map(|a| AdvisoryView {
                    icon: a.icon.clone(),
                    message: a.message.clone(),
                })
                .collect(),
        }
    }
}

pub struct FeatureOption {
    pub column: &'static str,
    pub selected: bool,
}

pub struct ChartView {
    pub svg: String,
    pub note_icon: &'static str,
    pub note: &'static str,
}

impl ChartView {
    fn new(chart: &BarChart, feature: ChartFeature) -> anyhow::Result<Self> {
        Ok(Self {
            svg: chart.to_svg()?,
            note_icon: feature.note_icon(),
            note: feature.note(),
        })
    }
}

// ============================================================================
// Predict Page
// ============================================================================

#[derive(Template)]
#[template(path = "pages/predict.html")]
pub struct PredictTemplate {
    pub title: String,
    pub active: &'static str,
    pub step: u8,
    pub categories: Vec<&'static str>,
    pub category: String,
    pub sliders: Vec<SliderView>,
    pub result: Option<ResultView>,
}

impl PredictTemplate {
    pub fn from_state(state: &WizardState) -> Self {
        // Sliders show the last submitted values, else defaults
        let values = state
            .outcome()
            .map(|o| o.features)
            .unwrap_or_default()
            .to_array();

        let sliders = FEATURE_SPECS
            .iter()
            .zip(values)
            .map(|(spec, value)| SliderView {
                key: spec.key,
                label: spec.label,
                min: spec.min.to_string(),
                max: spec.max.to_string(),
                step: spec.step.to_string(),
                value: value.to_string(),
            })
            .collect();

        Self {
            title: "Plant Stress Detection Dashboard".to_string(),
            active: "predict",
            step: state.step(),
            categories: EnvironmentCategory::ALL.iter().map(|c| c.as_str()).collect(),
            category: state.category().map(|c| c.to_string()).unwrap_or_default(),
            sliders,
            result: state.outcome().map(ResultView::from_outcome),
        }
    }
}

pub async fn predict_page(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let session = Session::from_headers(&headers);
    let wizard = state.sessions.load(&session).await;

    let html = PredictTemplate::from_state(&wizard).render()?;
    Ok(session.attach(Html(html).into_response()))
}

#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    pub category: String,
}

/// Step 1 "Next"
pub async fn choose_category(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<CategoryForm>,
) -> Result<Response, AppError> {
    let category: EnvironmentCategory = form
        .category
        .parse()
        .map_err(|e: crate::features::UnknownCategory| AppError::BadRequest(e.to_string()))?;

    transition(&state, &headers, WizardAction::Next(category)).await
}

/// Step 2 "Back"
pub async fn go_back(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    transition(&state, &headers, WizardAction::Back).await
}

/// Step 2 "Predict"
pub async fn submit_features(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(features): Form<FeatureVector>,
) -> Result<Response, AppError> {
    transition(&state, &headers, WizardAction::Predict(features.clamped())).await
}

/// Result view "Start Over"
pub async fn start_over(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    transition(&state, &headers, WizardAction::StartOver).await
}

/// Apply a form action to the session, then redirect back to the wizard
///
/// Stale forms (double submit, expired session) just re-render the current
/// step; model and template failures still surface as errors.
async fn transition(
    state: &AppState,
    headers: &HeaderMap,
    action: WizardAction,
) -> Result<Response, AppError> {
    let session = Session::from_headers(headers);

    let result = state
        .sessions
        .update(&session, |wizard| wizard.apply(action, &state.predictor))
        .await;

    if let Err(err) = result {
        match err.downcast_ref::<WizardError>() {
            Some(rejected) => tracing::debug!("ignoring stale form: {}", rejected),
            None => return Err(err.into()),
        }
    }

    Ok(session.attach(Redirect::to(PREDICT_PATH).into_response()))
}

// ============================================================================
// Visualizations Page
// ============================================================================

#[derive(Template)]
#[template(path = "pages/visualizations.html")]
pub struct VisualizationsTemplate {
    pub title: String,
    pub active: &'static str,
    pub features: Vec<FeatureOption>,
    pub chart: ChartView,
}

#[derive(Template)]
#[template(path = "partials/chart.html")]
pub struct ChartTemplate {
    pub chart: ChartView,
}

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    pub feature: Option<String>,
}

pub async fn visualizations_page(
    State(state): State<AppState>,
    HxRequest(is_htmx): HxRequest,
    Query(query): Query<ChartQuery>,
) -> Result<Html<String>, AppError> {
    let feature = match query.feature.as_deref() {
        Some(name) => name.parse::<ChartFeature>()?,
        None => ChartFeature::ALL[0],
    };

    let means = state.chart_means(feature).await?;
    let chart = ChartView::new(&BarChart::for_feature(feature, means.as_ref().clone()), feature)?;

    // Selector changes only swap the chart
    if is_htmx {
        return Ok(Html(ChartTemplate { chart }.render()?));
    }

    let template = VisualizationsTemplate {
        title: "Explore Key Feature Impact on Plant Health".to_string(),
        active: "visualizations",
        features: ChartFeature::ALL
            .iter()
            .map(|f| FeatureOption {
                column: f.column(),
                selected: *f == feature,
            })
            .collect(),
        chart,
    };
    Ok(Html(template.render()?))
}
