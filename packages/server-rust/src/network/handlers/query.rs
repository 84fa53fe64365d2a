//! Query-string extraction that refuses lossy percent-decoding.

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use super::ApiError;

/// Like axum's `Query`, but rejects escapes that do not decode to UTF-8.
///
/// `Query` substitutes U+FFFD for such bytes, so `topic=%FF` and `topic=%FE`
/// would name the same topic.
#[derive(Debug)]
pub struct StrictQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for StrictQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(raw) = parts.uri.query() {
            ensure_utf8(raw)?;
        }
        let Query(value) =
            Query::try_from_uri(&parts.uri).map_err(|e| ApiError::InvalidQuery(e.body_text()))?;
        Ok(Self(value))
    }
}

/// Checks that every key and value of `raw` percent-decodes to UTF-8.
fn ensure_utf8(raw: &str) -> Result<(), ApiError> {
    for field in raw.split('&').flat_map(|pair| pair.splitn(2, '=')) {
        if urlencoding::decode(field).is_err() {
            return Err(ApiError::InvalidQuery(
                "parameters must be valid UTF-8".to_string(),
            ));
        }
    }
    Ok(())
}
