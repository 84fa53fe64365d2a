//! Health, liveness, and readiness endpoints for orchestrators and monitoring.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

use super::AppState;
use crate::network::Phase;

/// Returns lifecycle and store occupancy as JSON.
///
/// Always 200; the `state` field carries the lifecycle phase so monitoring can
/// tell a draining server from a dead one.
pub async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let stats = state.store.stats();
    let messages: usize = stats.values().sum();

    Json(json!({
        "state": state.lifecycle.phase().as_str(),
        "topics": stats.len(),
        "messages": messages,
        "capacity_per_topic": state.store.capacity(),
        "in_flight": state.lifecycle.in_flight(),
        "uptime_secs": state.started_at.elapsed().as_secs(),
    }))
}

/// Liveness probe: the process answers, nothing more.
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe: 200 only while serving.
pub async fn readiness_handler(State(state): State<AppState>) -> StatusCode {
    if state.lifecycle.phase() == Phase::Serving {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
