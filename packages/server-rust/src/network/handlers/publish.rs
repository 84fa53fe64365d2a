//! `POST /publish`: append a message to a topic.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{ApiError, AppState};

/// Body of a publish request.
///
/// Every field is optional at the serde level so that missing fields produce
/// the broker's own 400 response instead of a generic rejection.
#[derive(Debug, Default, Deserialize)]
pub struct PublishRequest {
    /// Destination topic.
    pub topic: Option<String>,
    /// Message content. Non-string JSON values are stored as their JSON text.
    pub payload: Option<Value>,
    /// Producer identity; `anonymous` when absent or empty.
    pub publisher: Option<String>,
}

/// Successful publish acknowledgement.
#[derive(Debug, Serialize, Deserialize)]
pub struct PublishResponse {
    /// Always `true`.
    pub success: bool,
    /// Topic the message was appended to.
    pub topic: String,
    /// Timestamp the store assigned to the message.
    pub timestamp: String,
}

/// Turns the JSON payload into the opaque string the store keeps.
fn payload_text(payload: Value) -> Option<String> {
    match payload {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Handles `POST /publish` with a JSON [`PublishRequest`] body.
///
/// # Errors
///
/// Returns [`ApiError::InvalidBody`] for a malformed body and
/// [`ApiError::MissingFields`] when topic or payload is absent or empty.
pub async fn publish_handler(
    State(state): State<AppState>,
    body: Result<Json<PublishRequest>, JsonRejection>,
) -> Result<Json<PublishResponse>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::InvalidBody(e.body_text()))?;

    let topic = request.topic.filter(|t| !t.is_empty());
    let payload = request
        .payload
        .and_then(payload_text)
        .filter(|p| !p.is_empty());
    let (Some(topic), Some(payload)) = (topic, payload) else {
        return Err(ApiError::MissingFields);
    };
    let publisher = request.publisher.filter(|p| !p.is_empty());

    let payload_len = payload.len();
    let timestamp = state.store.publish(&topic, payload, publisher.as_deref())?;
    metrics::counter!("tidings_messages_published_total").increment(1);

    info!(
        publisher = publisher.as_deref().unwrap_or(tidings_core::DEFAULT_PUBLISHER),
        topic = %topic,
        payload_len,
        "published"
    );

    Ok(Json(PublishResponse {
        success: true,
        topic,
        timestamp,
    }))
}
