//! Tidings core: the in-memory topic store behind the broker.
//!
//! Producers append [`Message`]s to named topics; consumers read a topic back,
//! optionally only the messages newer than a timestamp cursor. Each topic is a
//! bounded [`TopicQueue`] and all topics live in one [`TopicStore`].

pub mod clock;
pub mod config;
pub mod error;
pub mod message;
pub mod queue;
pub mod store;

pub use clock::{format_timestamp, ClockSource, ManualClock, MessageClock, SystemClock};
pub use config::{StoreConfig, MAX_MESSAGES_PER_TOPIC};
pub use error::{ConfigError, StoreError};
pub use message::{Message, DEFAULT_PUBLISHER};
pub use queue::TopicQueue;
pub use store::TopicStore;
