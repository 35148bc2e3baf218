//! Health check endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use domain::services::NetworkAttribution;
use serde::Serialize;

use crate::app::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub snapshot: SnapshotHealth,
    pub refresh: RefreshHealth,
}

/// Usage snapshot source status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SnapshotHealth {
    pub source: String,
    pub readable: bool,
    pub latency_ms: Option<u64>,
}

/// Most recently published aggregation pass and the settings passes run with.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RefreshHealth {
    pub published_generation: Option<u64>,
    pub data_available: Option<bool>,
    pub source_timeout_ms: u64,
    pub network_attribution: NetworkAttribution,
}

/// Simple status response for liveness and readiness checks.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Full health check endpoint.
///
/// Reports whether the snapshot can be read and which pass is published.
/// Responds 503 when the snapshot is unreadable.
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let start = std::time::Instant::now();
    let readable = state.snapshots.load().await.is_ok();
    let latency_ms = start.elapsed().as_millis() as u64;

    let latest = state.refresher.latest().await;
    let aggregation = state.refresher.aggregator().config();
    let response = HealthResponse {
        status: if readable { "healthy" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        snapshot: SnapshotHealth {
            source: state.snapshots.describe(),
            readable,
            latency_ms: readable.then_some(latency_ms),
        },
        refresh: RefreshHealth {
            published_generation: state.refresher.published_generation().await,
            data_available: latest.map(|report| report.is_available()),
            source_timeout_ms: aggregation.source_timeout.as_millis() as u64,
            network_attribution: aggregation.network_attribution,
        },
    };

    if readable {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

/// Liveness endpoint.
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
    })
}

/// Readiness endpoint.
///
/// Returns 200 OK once the usage snapshot can be read.
pub async fn ready(State(state): State<AppState>) -> Result<Json<StatusResponse>, StatusCode> {
    if state.snapshots.load().await.is_ok() {
        Ok(Json(StatusResponse {
            status: "ready".to_string(),
        }))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}
