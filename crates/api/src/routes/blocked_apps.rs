//! Blocked app route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use domain::models::ToggleOutcome;
use serde::Serialize;
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct BlockedAppsResponse {
    pub blocked: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub package_id: String,
    pub outcome: ToggleOutcome,
    pub blocked: bool,
}

/// GET /api/v1/blocked-apps
pub async fn list_blocked_apps(State(state): State<AppState>) -> Json<BlockedAppsResponse> {
    let blocked = state.blocked.read().await;
    Json(BlockedAppsResponse {
        blocked: blocked.list(),
        count: blocked.len(),
    })
}

/// Flip the blocked state of a package.
///
/// POST /api/v1/blocked-apps/:package_id/toggle
pub async fn toggle_blocked_app(
    State(state): State<AppState>,
    Path(package_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.blocked.write().await.toggle(&package_id)?;

    info!(package_id = %package_id, outcome = ?outcome, "Toggled blocked app");

    Ok((
        StatusCode::OK,
        Json(ToggleResponse {
            blocked: outcome == ToggleOutcome::Blocked,
            package_id,
            outcome,
        }),
    ))
}

/// DELETE /api/v1/blocked-apps/:package_id
pub async fn unblock_app(
    State(state): State<AppState>,
    Path(package_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !state.blocked.write().await.unblock(&package_id) {
        return Err(ApiError::NotFound(format!(
            "Package {} is not blocked",
            package_id
        )));
    }

    info!(package_id = %package_id, "Unblocked app");
    Ok(StatusCode::NO_CONTENT)
}
