//! API routes and handlers.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::Method,
    routing::{delete, get, post},
};
use scoreboard::{Scoreboard, service::count_from_json};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::{error::ApiError, state::AppState};

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/scores", get(list_scores).fallback(method_not_allowed))
        .route("/scores/add", post(add_score).fallback(method_not_allowed))
        .route(
            "/scores/clear",
            delete(clear_scores).fallback(method_not_allowed),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Known path, wrong method.
async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::method_not_allowed(method.as_str())
}

/// Body of `POST /scores/add`.
///
/// Both fields are loosely typed so that missing or mistyped values come
/// back as validation errors rather than extractor rejections.
#[derive(Debug, Deserialize)]
pub struct AddScoreRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub count: Option<serde_json::Value>,
}

/// Response to a mutating request.
#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(flatten)]
    pub board: Scoreboard,
}

/// List the leaderboard.
#[instrument(skip(state))]
pub async fn list_scores(State(state): State<AppState>) -> Result<Json<Scoreboard>, ApiError> {
    let board = state.service().list_scores().await?;
    Ok(Json(board))
}

/// Add a score.
#[instrument(skip(state, payload))]
pub async fn add_score(
    State(state): State<AppState>,
    payload: Result<Json<AddScoreRequest>, JsonRejection>,
) -> Result<Json<MutationResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::invalid_body(rejection.body_text()))?;

    let name = request.name.unwrap_or_default();
    let count = count_from_json(request.count.as_ref())?;

    let board = state.service().add_score(&name, count).await?;
    info!(name = %name.trim(), count, "score added");

    Ok(Json(MutationResponse {
        success: true,
        message: None,
        board,
    }))
}

/// Clear every score.
#[instrument(skip(state))]
pub async fn clear_scores(
    State(state): State<AppState>,
) -> Result<Json<MutationResponse>, ApiError> {
    let board = state.service().clear_scores().await?;
    info!("scores cleared");

    Ok(Json(MutationResponse {
        success: true,
        message: Some("All scores cleared successfully"),
        board,
    }))
}
