//! Bounded, insertion-ordered message queue for a single topic.

use std::collections::VecDeque;

use crate::message::Message;

/// Ordered messages for one topic with a hard length bound.
///
/// Appending to a full queue evicts the oldest message; it never rejects the
/// new one. Backed by a [`VecDeque`] so eviction is O(1).
#[derive(Debug, Clone)]
pub struct TopicQueue {
    messages: VecDeque<Message>,
    capacity: usize,
}

impl TopicQueue {
    /// Creates an empty queue holding at most `capacity` messages.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Appends to the tail. Returns the evicted head if the bound was exceeded.
    pub fn append(&mut self, message: Message) -> Option<Message> {
        self.messages.push_back(message);
        if self.messages.len() > self.capacity {
            self.messages.pop_front()
        } else {
            None
        }
    }

    /// Owned copy of the current contents, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    /// Owned copy of the messages strictly newer than `since`, oldest first.
    #[must_use]
    pub fn since(&self, since: &str) -> Vec<Message> {
        self.messages
            .iter()
            .filter(|m| m.is_after(since))
            .cloned()
            .collect()
    }

    /// Empties the queue and returns how many messages were dropped.
    pub fn clear(&mut self) -> usize {
        let removed = self.messages.len();
        self.messages.clear();
        removed
    }

    /// Number of messages currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the queue holds no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Maximum number of messages retained.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(payload: &str, micros: u32) -> Message {
        Message::new(
            payload,
            format!("2024-05-01T00:00:00.{micros:06}Z"),
            Some("test"),
        )
    }

    fn payloads(messages: &[Message]) -> Vec<&str> {
        messages.iter().map(|m| m.payload.as_str()).collect()
    }

    #[test]
    fn append_keeps_insertion_order() {
        let mut queue = TopicQueue::new(10);
        assert!(queue.append(msg("a", 1)).is_none());
        assert!(queue.append(msg("b", 2)).is_none());
        assert_eq!(payloads(&queue.snapshot()), vec!["a", "b"]);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn append_past_capacity_evicts_oldest() {
        let mut queue = TopicQueue::new(2);
        queue.append(msg("a", 1));
        queue.append(msg("b", 2));
        let evicted = queue.append(msg("c", 3)).expect("head evicted");
        assert_eq!(evicted.payload, "a");
        assert_eq!(payloads(&queue.snapshot()), vec!["b", "c"]);
        assert_eq!(queue.len(), queue.capacity());
    }

    #[test]
    fn since_filters_strictly() {
        let mut queue = TopicQueue::new(10);
        queue.append(msg("a", 1));
        queue.append(msg("b", 2));
        queue.append(msg("c", 3));

        assert_eq!(
            payloads(&queue.since("2024-05-01T00:00:00.000002Z")),
            vec!["c"]
        );
        assert!(queue.since("2024-05-01T00:00:00.000003Z").is_empty());
        assert_eq!(queue.since("").len(), 3);
    }

    #[test]
    fn since_cannot_separate_equal_timestamps() {
        let mut queue = TopicQueue::new(10);
        queue.append(msg("first", 5));
        queue.append(msg("second", 5));

        // A cursor at the shared timestamp hides both messages.
        assert!(queue.since("2024-05-01T00:00:00.000005Z").is_empty());
    }

    #[test]
    fn snapshot_is_detached_from_queue() {
        let mut queue = TopicQueue::new(10);
        queue.append(msg("a", 1));
        let snapshot = queue.snapshot();
        queue.append(msg("b", 2));
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn clear_reports_removed_count() {
        let mut queue = TopicQueue::new(10);
        queue.append(msg("a", 1));
        queue.append(msg("b", 2));
        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
        assert_eq!(queue.clear(), 0);
    }
}
