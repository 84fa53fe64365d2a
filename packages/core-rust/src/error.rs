//! Error types for the topic store and its configuration.

/// Outcomes of a store operation other than success.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The caller passed an empty topic name.
    #[error("topic name must not be empty")]
    EmptyTopic,

    /// `clear` was called on a topic that holds no queue.
    #[error("topic '{0}' not found")]
    TopicNotFound(String),
}

impl StoreError {
    /// Whether the error stems from a malformed request rather than store state.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::EmptyTopic)
    }
}

/// Rejected store configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A topic must be able to hold at least one message.
    #[error("max_messages_per_topic must be at least 1")]
    ZeroCapacity,
}
