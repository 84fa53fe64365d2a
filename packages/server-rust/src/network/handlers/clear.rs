//! `DELETE /clear`: drop every message of a topic.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ApiError, AppState, StrictQuery};

/// Query string of a clear request.
#[derive(Debug, Default, Deserialize)]
pub struct ClearParams {
    /// Topic to remove.
    pub topic: Option<String>,
}

/// Successful clear acknowledgement.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClearResponse {
    /// Always `true`.
    pub success: bool,
    /// Topic that was removed.
    pub topic: String,
    /// Number of messages discarded.
    pub cleared: usize,
}

/// Handles `DELETE /clear?topic=..`.
///
/// # Errors
///
/// Returns [`ApiError::MissingParam`] when `topic` is absent or empty, and
/// the store's not-found error (404) when the topic holds no messages.
pub async fn clear_handler(
    State(state): State<AppState>,
    StrictQuery(params): StrictQuery<ClearParams>,
) -> Result<Json<ClearResponse>, ApiError> {
    let topic = params
        .topic
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::MissingParam("topic"))?;

    let cleared = state.store.clear(&topic)?;
    metrics::counter!("tidings_topics_cleared_total").increment(1);
    info!(topic = %topic, cleared, "cleared topic");

    Ok(Json(ClearResponse {
        success: true,
        topic,
        cleared,
    }))
}
