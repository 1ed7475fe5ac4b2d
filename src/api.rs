// src/api.rs
//! Thin HTTP surface over the engine's public operations. Handlers only
//! validate transport-level input and forward; all semantics live in the
//! orchestrator, the generative client, and the insight services.

use std::sync::Arc;

use shuttle_axum::axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::error::EngineError;
use crate::genai::GenAiClient;
use crate::insights::{career, roadmap, synthesis, trend_cards};
use crate::overview;
use crate::prefs::{Preferences, PreferencesInput};
use crate::warehouse::DynWarehouse;

#[derive(Clone)]
pub struct AppState {
    pub warehouse: DynWarehouse,
    pub genai: Arc<GenAiClient>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/overview", post(get_overview))
        .route("/insights/career", post(career_insights))
        .route("/insights/synthesize", post(synthesize))
        .route("/insights/roadmap", post(generate_roadmap))
        .route("/insights/trend-cards", post(generate_trend_cards))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Uniform failure envelope: `{success:false, error, code}` with a
/// human-readable message, never a stack trace. Parse failures additionally
/// carry the raw model text for diagnosis.
pub struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            EngineError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            // Upstream collaborator failures, including our own credentials.
            _ => StatusCode::BAD_GATEWAY,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "internal error");
        }

        let mut body = json!({
            "success": false,
            "code": self.0.code(),
            "error": self.0.to_string(),
        });
        if let EngineError::Parse { raw, .. } = &self.0 {
            body["raw"] = json!(raw);
        }
        (status, Json(body)).into_response()
    }
}

async fn get_overview(
    State(state): State<AppState>,
    Json(input): Json<PreferencesInput>,
) -> Json<serde_json::Value> {
    let prefs = Preferences::from(input);
    let doc = overview::build_overview(state.warehouse.as_ref(), &prefs).await;
    Json(json!({ "success": true, "overview": doc }))
}

async fn career_insights(
    State(state): State<AppState>,
    Json(profile): Json<career::CareerProfile>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result =
        career::generate_career_insights(state.warehouse.as_ref(), &state.genai, &profile).await?;
    Ok(Json(json!({ "success": true, "result": result })))
}

async fn synthesize(
    State(state): State<AppState>,
    Json(req): Json<synthesis::SynthesisRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = synthesis::synthesize(&state.genai, &req).await?;
    Ok(Json(json!({ "success": true, "result": result })))
}

async fn generate_roadmap(
    State(state): State<AppState>,
    Json(req): Json<roadmap::RoadmapRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = roadmap::generate_roadmap(&state.genai, &req).await?;
    Ok(Json(json!({ "success": true, "result": result })))
}

async fn generate_trend_cards(
    State(state): State<AppState>,
    Json(req): Json<trend_cards::TrendCardsRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result =
        trend_cards::generate_trend_cards(state.warehouse.as_ref(), &state.genai, &req).await?;
    Ok(Json(json!({ "success": true, "result": result })))
}
