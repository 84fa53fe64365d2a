//! Message clock used by the topic store to stamp published messages.
//!
//! Wall-clock time is read through a [`ClockSource`] so tests can substitute
//! a deterministic clock. [`MessageClock`] never issues a time earlier than
//! one it has already issued, which keeps queue order and timestamp order in
//! agreement even if the system clock steps backwards.
//!
//! # Wire format
//!
//! Timestamps render as fixed-width ISO-8601 UTC strings with microsecond
//! precision (`2024-05-01T12:30:45.123456Z`). Because every field is
//! zero-padded, lexical comparison of two rendered timestamps matches their
//! chronological order.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

/// `strftime` pattern for rendered message timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Abstraction over the system clock for dependency injection.
pub trait ClockSource: Send + Sync {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

/// Default clock source that reads the real system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
///
/// Clones share the same underlying time, so a test can keep one handle and
/// give the other to a store.
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    /// Moves the clock forward (or backward, for a negative duration).
    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock();
        *current += by;
    }

    /// Jumps the clock to an absolute time.
    pub fn set(&self, to: DateTime<Utc>) {
        *self.current.lock() = to;
    }
}

impl ClockSource for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock()
    }
}

/// Issues message timestamps that never go backwards.
///
/// Two calls within the same clock tick return the same time; the clock does
/// not invent distinct values for them.
pub struct MessageClock {
    source: Box<dyn ClockSource>,
    last: Option<DateTime<Utc>>,
}

impl MessageClock {
    /// Wraps a clock source.
    #[must_use]
    pub fn new(source: Box<dyn ClockSource>) -> Self {
        Self { source, last: None }
    }

    /// Returns the next timestamp, clamped to the last one issued.
    pub fn tick(&mut self) -> DateTime<Utc> {
        let now = self.source.now();
        let issued = match self.last {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last = Some(issued);
        issued
    }
}

impl std::fmt::Debug for MessageClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageClock")
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}

/// Renders a time in the lexically sortable message timestamp format.
#[must_use]
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}
