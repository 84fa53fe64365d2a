//! `GET /subscribe`: poll a topic, optionally from a timestamp cursor.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tidings_core::Message;

use super::{ApiError, AppState, StrictQuery};

/// Query string of a subscribe request.
#[derive(Debug, Default, Deserialize)]
pub struct SubscribeParams {
    /// Topic to read.
    pub topic: Option<String>,
    /// Only return messages strictly newer than this timestamp.
    pub since: Option<String>,
}

/// Messages returned by a poll.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubscribeResponse {
    /// Topic that was read.
    pub topic: String,
    /// Number of entries in `messages`.
    pub count: usize,
    /// Matching messages, oldest first.
    pub messages: Vec<Message>,
}

/// Handles `GET /subscribe?topic=..&since=..`.
///
/// An unknown topic yields an empty list. An empty `since` is ignored.
///
/// # Errors
///
/// Returns [`ApiError::MissingParam`] when `topic` is absent or empty.
pub async fn subscribe_handler(
    State(state): State<AppState>,
    StrictQuery(params): StrictQuery<SubscribeParams>,
) -> Result<Json<SubscribeResponse>, ApiError> {

    let topic = params
        .topic
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::MissingParam("topic"))?;
    let since = params.since.filter(|s| !s.is_empty());

    let messages = state.store.retrieve(&topic, since.as_deref())?;
    metrics::counter!("tidings_messages_delivered_total").increment(messages.len() as u64);

    Ok(Json(SubscribeResponse {
        topic,
        count: messages.len(),
        messages,
    }))
}
