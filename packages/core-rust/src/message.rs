//! The message envelope stored per topic.

use serde::{Deserialize, Serialize};

/// Publisher identity recorded when a producer does not name itself.
pub const DEFAULT_PUBLISHER: &str = "anonymous";

/// One published envelope.
///
/// Immutable once created: the store hands out clones, never references into
/// its queues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Producer-defined content, never interpreted by the store.
    pub payload: String,
    /// Time assigned by the store at publish, in the fixed-width format
    /// produced by [`format_timestamp`](crate::clock::format_timestamp).
    pub timestamp: String,
    /// Producer identity, [`DEFAULT_PUBLISHER`] when none was supplied.
    pub publisher: String,
}

impl Message {
    /// Builds a message, falling back to [`DEFAULT_PUBLISHER`] when `publisher`
    /// is `None`.
    #[must_use]
    pub fn new(payload: impl Into<String>, timestamp: String, publisher: Option<&str>) -> Self {
        Self {
            payload: payload.into(),
            timestamp,
            publisher: publisher.unwrap_or(DEFAULT_PUBLISHER).to_string(),
        }
    }

    /// Whether this message is strictly newer than the cursor `since`.
    #[must_use]
    pub fn is_after(&self, since: &str) -> bool {
        self.timestamp.as_str() > since
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_publisher_defaults_to_anonymous() {
        let msg = Message::new("25.5", "2024-05-01T00:00:00.000000Z".to_string(), None);
        assert_eq!(msg.publisher, "anonymous");
    }

    #[test]
    fn is_after_is_strict() {
        let msg = Message::new("x", "2024-05-01T00:00:00.000002Z".to_string(), Some("p"));
        assert!(msg.is_after("2024-05-01T00:00:00.000001Z"));
        assert!(!msg.is_after("2024-05-01T00:00:00.000002Z"));
        assert!(!msg.is_after("2024-05-01T00:00:00.000003Z"));
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let msg = Message::new("a", "2024-05-01T00:00:00.000000Z".to_string(), Some("p1"));
        let json = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(json["payload"], "a");
        assert_eq!(json["timestamp"], "2024-05-01T00:00:00.000000Z");
        assert_eq!(json["publisher"], "p1");
    }
}
