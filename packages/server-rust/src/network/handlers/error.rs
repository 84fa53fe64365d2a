//! Error responses returned by the broker's HTTP handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tidings_core::StoreError;
use tracing::warn;

/// Failure outcome of a broker request.
///
/// Validation problems map to 400, an unknown topic on clear maps to 404.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required query parameter was absent or empty.
    #[error("Missing '{0}' parameter")]
    MissingParam(&'static str),

    /// The publish body lacked a topic or payload.
    #[error("Missing 'topic' or 'payload'")]
    MissingFields,

    /// The publish body was not a JSON object of the expected shape.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// The query string could not be decoded.
    #[error("Invalid query string: {0}")]
    InvalidQuery(String),

    /// The store refused the operation.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    /// HTTP status the error is reported with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Store(err) if !err.is_validation() => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        metrics::counter!("tidings_requests_rejected_total").increment(1);

        let body = match &self {
            Self::Store(StoreError::TopicNotFound(topic)) => {
                warn!(topic = %topic, "clear requested for unknown topic");
                json!({ "success": false, "error": "Topic not found" })
            }
            other => {
                warn!(error = %other, "rejected request");
                json!({ "error": other.to_string() })
            }
        };

        (status, Json(body)).into_response()
    }
}
