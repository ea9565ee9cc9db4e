//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers. Reads take the
//! engine's read lock, saves and resets the write lock.

use super::{
    AppState,
    types::{
        AllLevelsRequest, AnalysisRequest, ErrorResponse, HealthResponse, RequestError,
        ResetResponse, SaveRequest, StatusResponse, WeeklyRequest,
    },
};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use minuta_core::{LevelAnalysis, MinutaError, SaveOutcome, WeeklyCompliance};

// =============================================================================
// ERROR MAPPING
// =============================================================================

/// Handler failure, rendered as an `ErrorResponse`.
#[derive(Debug)]
pub enum ApiError {
    Core(MinutaError),
    Request(RequestError),
}

impl From<MinutaError> for ApiError {
    fn from(err: MinutaError) -> Self {
        Self::Core(err)
    }
}

impl From<RequestError> for ApiError {
    fn from(err: RequestError) -> Self {
        Self::Request(err)
    }
}

/// HTTP status of a core error.
#[must_use]
pub fn status_for(err: &MinutaError) -> StatusCode {
    match err {
        MinutaError::NotFound { .. } => StatusCode::NOT_FOUND,
        MinutaError::InvalidWeight(_)
        | MinutaError::InvalidCatalog(_)
        | MinutaError::ConfigError(_)
        | MinutaError::BatchTooLarge { .. }
        | MinutaError::InvalidWeekPlan(_) => StatusCode::BAD_REQUEST,
        MinutaError::SerializationError(_) | MinutaError::IoError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Core(err) => {
                let status = status_for(&err);
                if status.is_server_error() {
                    tracing::error!(error = %err, "request failed");
                } else {
                    tracing::debug!(error = %err, "request rejected");
                }
                (status, Json(ErrorResponse::from_core(&err))).into_response()
            }
            Self::Request(RequestError(reason)) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("invalid_request", reason)),
            )
                .into_response(),
        }
    }
}

// =============================================================================
// HEALTH / STATUS
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Catalog and override counters.
pub async fn status_handler(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, ApiError> {
    let engine = state.engine.read().await;
    Ok(Json(engine.status()?.into()))
}

// =============================================================================
// ANALYSIS HANDLERS
// =============================================================================

/// Analyze one (menu, level).
pub async fn analysis_handler(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<LevelAnalysis>, ApiError> {
    let engine = state.engine.read().await;
    Ok(Json(engine.analyze(request.menu, request.level)?))
}

/// Analyze a menu for every school level.
pub async fn all_levels_handler(
    State(state): State<AppState>,
    Json(request): Json<AllLevelsRequest>,
) -> Result<Json<Vec<LevelAnalysis>>, ApiError> {
    let engine = state.engine.read().await;
    Ok(Json(engine.analyze_all_levels(request.menu)?))
}

/// Save a batch of edited weights.
///
/// Per-row failures come back in the outcome with status 200; only hard
/// failures (unknown menu, level, preparation, ingredient) are errors.
pub async fn save_handler(
    State(state): State<AppState>,
    Json(request): Json<SaveRequest>,
) -> Result<Json<SaveOutcome>, ApiError> {
    request.validate()?;
    let mut engine = state.engine.write().await;
    let outcome = engine.save_override(
        request.menu,
        request.level,
        &request.rows,
        request.user.trim(),
    )?;
    Ok(Json(outcome))
}

/// Discard saved weights.
pub async fn reset_handler(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<ResetResponse>, ApiError> {
    let mut engine = state.engine.write().await;
    let removed = engine.reset_overrides(request.menu, request.level)?;
    Ok(Json(ResetResponse {
        menu: request.menu,
        level: request.level,
        removed,
    }))
}

// =============================================================================
// WEEKLY HANDLER
// =============================================================================

/// Validate a week of menus.
pub async fn weekly_handler(
    State(state): State<AppState>,
    Json(request): Json<WeeklyRequest>,
) -> Result<Json<WeeklyCompliance>, ApiError> {
    let plan = request.to_plan()?;
    let engine = state.engine.read().await;
    Ok(Json(engine.validate_week(request.modality, &plan)?))
}
