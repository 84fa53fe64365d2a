//! The topic store: every topic's queue behind one exclusive section.
//!
//! All operations take the same [`parking_lot::Mutex`], which also guards the
//! [`MessageClock`]. Stamping and appending therefore happen as one step, so
//! within a topic publish order and timestamp order always agree. Reads copy
//! what they need before the lock is released; no caller ever holds a
//! reference into a queue.

use std::collections::{BTreeMap, HashMap};

use parking_lot::Mutex;
use tracing::debug;

use crate::clock::{format_timestamp, ClockSource, MessageClock, SystemClock};
use crate::config::StoreConfig;
use crate::error::{ConfigError, StoreError};
use crate::message::Message;
use crate::queue::TopicQueue;

struct StoreState {
    topics: HashMap<String, TopicQueue>,
    clock: MessageClock,
}

/// In-memory, bounded-retention multi-queue keyed by topic name.
///
/// Shared between request handlers behind an `Arc`. Operations are short and
/// synchronous; none of them awaits or spawns work.
pub struct TopicStore {
    state: Mutex<StoreState>,
    capacity: usize,
}

impl TopicStore {
    /// Creates a store stamping messages with the system clock.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `config` fails validation.
    pub fn new(config: &StoreConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, Box::new(SystemClock))
    }

    /// Creates a store stamping messages with the given clock source.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `config` fails validation.
    pub fn with_clock(
        config: &StoreConfig,
        clock: Box<dyn ClockSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            state: Mutex::new(StoreState {
                topics: HashMap::new(),
                clock: MessageClock::new(clock),
            }),
            capacity: config.max_messages_per_topic,
        })
    }

    /// Appends a message to `topic`, creating the topic on first use.
    ///
    /// Returns the timestamp assigned to the message. A full topic drops its
    /// oldest message to make room.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptyTopic`] if `topic` is empty.
    pub fn publish(
        &self,
        topic: &str,
        payload: impl Into<String>,
        publisher: Option<&str>,
    ) -> Result<String, StoreError> {
        if topic.is_empty() {
            return Err(StoreError::EmptyTopic);
        }

        let mut state = self.state.lock();
        let timestamp = format_timestamp(state.clock.tick());
        let message = Message::new(payload, timestamp.clone(), publisher);

        let capacity = self.capacity;
        let queue = state
            .topics
            .entry(topic.to_string())
            .or_insert_with(|| TopicQueue::new(capacity));

        if let Some(evicted) = queue.append(message) {
            debug!(topic, evicted = %evicted.timestamp, "topic full, evicted oldest message");
        }

        Ok(timestamp)
    }

    /// Returns the messages of `topic`, oldest first.
    ///
    /// With `since`, only messages whose timestamp is strictly greater than it
    /// are returned. A topic that was never published to yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptyTopic`] if `topic` is empty.
    pub fn retrieve(&self, topic: &str, since: Option<&str>) -> Result<Vec<Message>, StoreError> {
        if topic.is_empty() {
            return Err(StoreError::EmptyTopic);
        }

        let state = self.state.lock();
        let messages = match (state.topics.get(topic), since) {
            (None, _) => Vec::new(),
            (Some(queue), None) => queue.snapshot(),
            (Some(queue), Some(since)) => queue.since(since),
        };
        drop(state);

        debug!(topic, since, count = messages.len(), "retrieved messages");
        Ok(messages)
    }

    /// Removes `topic` and returns how many messages it held.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptyTopic`] if `topic` is empty, or
    /// [`StoreError::TopicNotFound`] if the topic holds no queue.
    pub fn clear(&self, topic: &str) -> Result<usize, StoreError> {
        if topic.is_empty() {
            return Err(StoreError::EmptyTopic);
        }

        let removed = self.state.lock().topics.remove(topic);
        match removed {
            Some(mut queue) => Ok(queue.clear()),
            None => Err(StoreError::TopicNotFound(topic.to_string())),
        }
    }

    /// Message count per topic, ordered by topic name.
    #[must_use]
    pub fn stats(&self) -> BTreeMap<String, usize> {
        self.state
            .lock()
            .topics
            .iter()
            .map(|(name, queue)| (name.clone(), queue.len()))
            .collect()
    }

    /// Per-topic retention bound this store enforces.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl std::fmt::Debug for TopicStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicStore")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;

    use super::*;
    use crate::clock::ManualClock;

    fn manual_store(capacity: usize) -> (TopicStore, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
        let config = StoreConfig {
            max_messages_per_topic: capacity,
        };
        let store = TopicStore::with_clock(&config, Box::new(clock.clone())).unwrap();
        (store, clock)
    }

    /// Publishes `payload` and advances the clock one microsecond.
    fn publish_tick(store: &TopicStore, clock: &ManualClock, topic: &str, payload: &str) -> String {
        let ts = store.publish(topic, payload, Some("tester")).unwrap();
        clock.advance(Duration::microseconds(1));
        ts
    }

    fn payloads(messages: &[Message]) -> Vec<String> {
        messages.iter().map(|m| m.payload.clone()).collect()
    }

    #[test]
    fn publish_then_retrieve_in_order() {
        let (store, clock) = manual_store(100);
        publish_tick(&store, &clock, "t1", "a");
        publish_tick(&store, &clock, "t1", "b");

        let messages = store.retrieve("t1", None).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(payloads(&messages), vec!["a", "b"]);
        assert!(messages.iter().all(|m| m.publisher == "tester"));
    }

    #[test]
    fn publish_without_publisher_records_anonymous() {
        let store = TopicStore::new(&StoreConfig::default()).unwrap();
        store.publish("t", "x", None).unwrap();
        let messages = store.retrieve("t", None).unwrap();
        assert_eq!(messages[0].publisher, "anonymous");
    }

    #[test]
    fn publish_returns_stored_timestamp() {
        let store = TopicStore::new(&StoreConfig::default()).unwrap();
        let ts = store.publish("t", "x", None).unwrap();
        let messages = store.retrieve("t", None).unwrap();
        assert_eq!(messages.last().unwrap().timestamp, ts);
    }

    #[test]
    fn overflow_evicts_oldest_five() {
        let (store, clock) = manual_store(100);
        for i in 0..105 {
            publish_tick(&store, &clock, "sensors", &i.to_string());
        }

        let messages = store.retrieve("sensors", None).unwrap();
        assert_eq!(messages.len(), 100);
        assert_eq!(messages.first().unwrap().payload, "5");
        assert_eq!(messages.last().unwrap().payload, "104");
    }

    #[test]
    fn cursor_returns_only_newer_messages() {
        let (store, clock) = manual_store(100);
        let t = publish_tick(&store, &clock, "t2", "x");

        assert!(store.retrieve("t2", Some(&t)).unwrap().is_empty());

        let t2 = publish_tick(&store, &clock, "t2", "y");
        assert!(t2 > t);

        let messages = store.retrieve("t2", Some(&t)).unwrap();
        assert_eq!(payloads(&messages), vec!["y"]);
    }

    #[test]
    fn cursor_misses_messages_sharing_a_timestamp() {
        let (store, _clock) = manual_store(100);
        let first = store.publish("t", "first", None).unwrap();
        let second = store.publish("t", "second", None).unwrap();
        assert_eq!(first, second);

        // A consumer that advanced its cursor after seeing "first" never
        // receives "second".
        assert!(store.retrieve("t", Some(&first)).unwrap().is_empty());
    }

    #[test]
    fn timestamps_do_not_regress_when_clock_steps_back() {
        let (store, clock) = manual_store(100);
        let t1 = store.publish("t", "a", None).unwrap();
        clock.advance(Duration::seconds(-30));
        let t2 = store.publish("t", "b", None).unwrap();
        assert!(t2 >= t1);
    }

    #[test]
    fn retrieve_unknown_topic_is_empty() {
        let store = TopicStore::new(&StoreConfig::default()).unwrap();
        assert!(store.retrieve("nobody-home", None).unwrap().is_empty());
        assert!(store
            .retrieve("nobody-home", Some("2024-01-01T00:00:00.000000Z"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn topics_are_case_sensitive() {
        let (store, clock) = manual_store(100);
        publish_tick(&store, &clock, "Sensors", "a");
        assert!(store.retrieve("sensors", None).unwrap().is_empty());
        assert_eq!(store.retrieve("Sensors", None).unwrap().len(), 1);
    }

    #[test]
    fn clear_reports_count_and_removes_topic() {
        let (store, clock) = manual_store(100);
        for i in 0..3 {
            publish_tick(&store, &clock, "t", &i.to_string());
        }

        assert_eq!(store.clear("t"), Ok(3));
        assert!(store.retrieve("t", None).unwrap().is_empty());
        assert!(!store.stats().contains_key("t"));
        assert_eq!(
            store.clear("t"),
            Err(StoreError::TopicNotFound("t".to_string()))
        );
    }

    #[test]
    fn clear_never_used_topic_is_not_found() {
        let store = TopicStore::new(&StoreConfig::default()).unwrap();
        let err = store.clear("never-used").unwrap_err();
        assert_eq!(err, StoreError::TopicNotFound("never-used".to_string()));
        assert!(!err.is_validation());
    }

    #[test]
    fn empty_topic_is_rejected_everywhere() {
        let store = TopicStore::new(&StoreConfig::default()).unwrap();
        assert_eq!(store.publish("", "x", None), Err(StoreError::EmptyTopic));
        assert_eq!(store.retrieve("", None), Err(StoreError::EmptyTopic));
        assert_eq!(store.clear(""), Err(StoreError::EmptyTopic));
        assert!(store.stats().is_empty());
    }

    #[test]
    fn stats_counts_each_topic() {
        let (store, clock) = manual_store(2);
        publish_tick(&store, &clock, "b", "1");
        publish_tick(&store, &clock, "a", "1");
        publish_tick(&store, &clock, "a", "2");
        publish_tick(&store, &clock, "a", "3");

        let stats = store.stats();
        let entries: Vec<(&str, usize)> = stats.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        assert_eq!(entries, vec![("a", 2), ("b", 1)]);
    }

    #[test]
    fn zero_capacity_config_is_rejected() {
        let config = StoreConfig {
            max_messages_per_topic: 0,
        };
        assert_eq!(
            TopicStore::new(&config).unwrap_err(),
            ConfigError::ZeroCapacity
        );
    }

    #[test]
    fn concurrent_publishers_respect_capacity() {
        let store = Arc::new(
            TopicStore::new(&StoreConfig {
                max_messages_per_topic: 50,
            })
            .unwrap(),
        );

        thread::scope(|scope| {
            for writer in 0..4 {
                let store = Arc::clone(&store);
                scope.spawn(move || {
                    for i in 0..500 {
                        store
                            .publish("shared", format!("{writer}-{i}"), Some("w"))
                            .unwrap();
                    }
                });
            }

            let reader = Arc::clone(&store);
            scope.spawn(move || {
                for _ in 0..500 {
                    let messages = reader.retrieve("shared", None).unwrap();
                    assert!(messages.len() <= 50);
                    assert!(messages
                        .windows(2)
                        .all(|w| w[0].timestamp <= w[1].timestamp));
                    for count in reader.stats().values() {
                        assert!(*count <= 50);
                    }
                }
            });
        });

        assert_eq!(store.retrieve("shared", None).unwrap().len(), 50);
    }

    #[test]
    fn publish_is_visible_once_returned() {
        let store = Arc::new(TopicStore::new(&StoreConfig::default()).unwrap());
        let writer = Arc::clone(&store);
        let ts = thread::spawn(move || writer.publish("t", "hello", None).unwrap())
            .join()
            .unwrap();

        let messages = store.retrieve("t", None).unwrap();
        assert!(messages.iter().any(|m| m.timestamp == ts));
    }

    proptest! {
        #[test]
        fn queue_length_is_min_of_publishes_and_capacity(
            capacity in 1usize..20,
            publishes in 0usize..60,
        ) {
            let (store, clock) = manual_store(capacity);
            for i in 0..publishes {
                publish_tick(&store, &clock, "p", &i.to_string());
            }

            let messages = store.retrieve("p", None).unwrap();
            prop_assert_eq!(messages.len(), publishes.min(capacity));

            let expected: Vec<String> = (publishes.saturating_sub(capacity)..publishes)
                .map(|i| i.to_string())
                .collect();
            prop_assert_eq!(payloads(&messages), expected);
        }

        #[test]
        fn cursor_selects_exactly_newer_messages(
            publishes in 1usize..40,
            cursor_index in 0usize..40,
        ) {
            let (store, clock) = manual_store(100);
            let stamps: Vec<String> = (0..publishes)
                .map(|i| publish_tick(&store, &clock, "c", &i.to_string()))
                .collect();
            let cursor = &stamps[cursor_index % publishes];

            let all = store.retrieve("c", None).unwrap();
            let newer = store.retrieve("c", Some(cursor)).unwrap();
            let expected: Vec<Message> = all
                .into_iter()
                .filter(|m| m.timestamp.as_str() > cursor.as_str())
                .collect();
            prop_assert_eq!(&newer, &expected);

            // Re-polling from the newest timestamp seen yields nothing.
            let last_seen = stamps.last().unwrap();
            prop_assert!(store.retrieve("c", Some(last_seen)).unwrap().is_empty());
        }
    }
}
