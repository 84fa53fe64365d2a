//! HTTP client for talking to a running broker.
//!
//! [`BrokerClient`] wraps the three broker endpoints. [`Subscription`] adds
//! the polling discipline: it remembers the newest timestamp seen per topic
//! and asks only for messages after it on the next poll.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::json;
use tidings_core::Message;

use crate::network::handlers::{ClearResponse, PublishResponse, SubscribeResponse};

/// Failure talking to the broker.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never produced an HTTP response, or the body was unreadable.
    #[error("broker request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The broker answered with a client or server error.
    #[error("broker rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status returned by the broker.
        status: StatusCode,
        /// The broker's `error` field, or the raw body.
        message: String,
    },

    /// `clear` named a topic the broker does not hold.
    #[error("topic '{0}' not found")]
    TopicNotFound(String),
}

/// Thin client over the broker's publish, subscribe, and clear endpoints.
#[derive(Debug, Clone)]
pub struct BrokerClient {
    http: reqwest::Client,
    base_url: String,
    publisher_id: String,
}

impl BrokerClient {
    /// Creates a client for the broker at `base_url`, publishing as
    /// `publisher_id`. Every request gives up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        publisher_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            publisher_id: publisher_id.into(),
        })
    }

    /// Identity attached to published messages.
    #[must_use]
    pub fn publisher_id(&self) -> &str {
        &self.publisher_id
    }

    /// Publishes `payload` to `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Rejected`] if the broker refuses the message.
    pub async fn publish(&self, topic: &str, payload: &str) -> Result<PublishResponse, ClientError> {
        let response = self
            .http
            .post(format!("{}/publish", self.base_url))
            .json(&json!({
                "topic": topic,
                "payload": payload,
                "publisher": self.publisher_id,
            }))
            .send()
            .await?;
        decode(response).await
    }

    /// Fetches the messages of `topic` newer than `since` (all when `None`).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Rejected`] if the broker refuses the request.
    pub async fn subscribe(
        &self,
        topic: &str,
        since: Option<&str>,
    ) -> Result<SubscribeResponse, ClientError> {
        let mut query = vec![("topic", topic)];
        if let Some(since) = since {
            query.push(("since", since));
        }

        let response = self
            .http
            .get(format!("{}/subscribe", self.base_url))
            .query(&query)
            .send()
            .await?;
        decode(response).await
    }

    /// Removes `topic` from the broker.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::TopicNotFound`] if the broker holds no such
    /// topic, [`ClientError::Rejected`] for other refusals.
    pub async fn clear(&self, topic: &str) -> Result<ClearResponse, ClientError> {
        let response = self
            .http
            .delete(format!("{}/clear", self.base_url))
            .query(&[("topic", topic)])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::TopicNotFound(topic.to_string()));
        }
        decode(response).await
    }
}

/// Decodes a success body, or turns an error status into [`ClientError::Rejected`].
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.text().await?;
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or(body);
    Err(ClientError::Rejected { status, message })
}

/// Polls topics incrementally, tracking the last timestamp seen per topic.
#[derive(Debug)]
pub struct Subscription {
    client: BrokerClient,
    cursors: HashMap<String, String>,
}

impl Subscription {
    /// Starts with no cursors: the first poll of a topic returns everything
    /// the broker still retains.
    #[must_use]
    pub fn new(client: BrokerClient) -> Self {
        Self {
            client,
            cursors: HashMap::new(),
        }
    }

    /// Returns messages published to `topic` since the previous poll.
    ///
    /// The cursor advances to the newest returned timestamp. Messages sharing
    /// that exact timestamp but arriving later are not returned by the next
    /// poll.
    ///
    /// # Errors
    ///
    /// Propagates any [`ClientError`]; the cursor is left unchanged.
    pub async fn poll(&mut self, topic: &str) -> Result<Vec<Message>, ClientError> {
        let since = self.cursors.get(topic).map(String::as_str);
        let response = self.client.subscribe(topic, since).await?;

        if let Some(last) = response.messages.last() {
            self.cursors
                .insert(topic.to_string(), last.timestamp.clone());
        }
        Ok(response.messages)
    }

    /// Last timestamp seen on `topic`, if any.
    #[must_use]
    pub fn cursor(&self, topic: &str) -> Option<&str> {
        self.cursors.get(topic).map(String::as_str)
    }
}
