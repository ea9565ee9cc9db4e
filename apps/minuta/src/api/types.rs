//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API. Successful
//! analysis and weekly responses are the serde forms of the core results.

use minuta_core::{
    EngineStatus, LevelId, MenuId, MinutaError, ModalityId, SaveRow, WeekPlan,
    primitives::MAX_SAVE_BATCH_ROWS,
};
use serde::{Deserialize, Serialize};

/// Maximum length of the editor name recorded on a summary.
pub const MAX_USER_LENGTH: usize = 128;

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Catalog and override counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub menus: usize,
    pub compositions: usize,
    pub levels: usize,
    pub saved_analyses: usize,
    pub persistent: bool,
}

impl From<EngineStatus> for StatusResponse {
    fn from(status: EngineStatus) -> Self {
        Self {
            menus: status.menus,
            compositions: status.compositions,
            levels: status.levels,
            saved_analyses: status.saved_analyses,
            persistent: status.persistent,
        }
    }
}

// =============================================================================
// ANALYSIS REQUESTS
// =============================================================================

/// One (menu, level) pair; used by `/analysis` and `/analysis/reset`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub menu: MenuId,
    pub level: LevelId,
}

/// `/analysis/all` request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AllLevelsRequest {
    pub menu: MenuId,
}

/// `/analysis/overrides` request: a batch of edited weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveRequest {
    pub menu: MenuId,
    pub level: LevelId,
    pub user: String,
    pub rows: Vec<SaveRow>,
}

impl SaveRequest {
    /// Check the request shape before it reaches the engine.
    ///
    /// Rejects an empty or oversized editor name and oversized batches.
    pub fn validate(&self) -> Result<(), RequestError> {
        let user = self.user.trim();
        if user.is_empty() {
            return Err(RequestError("user must not be empty".to_string()));
        }
        if user.len() > MAX_USER_LENGTH {
            return Err(RequestError(format!(
                "user length {} exceeds maximum {} bytes",
                user.len(),
                MAX_USER_LENGTH
            )));
        }
        if self.rows.len() > MAX_SAVE_BATCH_ROWS {
            return Err(RequestError(format!(
                "{} rows exceeds maximum {}",
                self.rows.len(),
                MAX_SAVE_BATCH_ROWS
            )));
        }
        Ok(())
    }
}

/// `/analysis/reset` response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResetResponse {
    pub menu: MenuId,
    pub level: LevelId,
    /// False when nothing was saved.
    pub removed: bool,
}

// =============================================================================
// WEEKLY REQUEST
// =============================================================================

/// `/weekly` request: a modality and its day menus, Monday first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyRequest {
    pub modality: ModalityId,
    pub menus: Vec<MenuId>,
}

impl WeeklyRequest {
    pub fn to_plan(&self) -> Result<WeekPlan, MinutaError> {
        WeekPlan::new(self.menus.clone())
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// A request rejected before reaching the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestError(pub String);

/// Error body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable machine-readable kind (`not_found`, `invalid_weight`, ...).
    pub kind: String,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(kind: &str, error: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            error: error.into(),
        }
    }

    /// Body for a core error.
    pub fn from_core(err: &MinutaError) -> Self {
        let kind = match err {
            MinutaError::NotFound { .. } => "not_found",
            MinutaError::InvalidCatalog(_) => "invalid_catalog",
            MinutaError::InvalidWeight(_) => "invalid_weight",
            MinutaError::BatchTooLarge { .. } => "batch_too_large",
            MinutaError::InvalidWeekPlan(_) => "invalid_week_plan",
            MinutaError::ConfigError(_) => "config_error",
            MinutaError::SerializationError(_) => "serialization_error",
            MinutaError::IoError(_) => "io_error",
        };
        Self::new(kind, err.to_string())
    }
}
