//! HTTP handler definitions for the broker.
//!
//! Defines `AppState` (the shared state carried through axum extractors) and
//! re-exports every handler for the router. Handlers only translate between
//! HTTP and [`TopicStore`] calls; all state lives in the store.

pub mod clear;
pub mod error;
pub mod health;
pub mod publish;
pub mod query;
pub mod status;
pub mod subscribe;

pub use clear::{clear_handler, ClearParams, ClearResponse};
pub use error::ApiError;
pub use health::{health_handler, liveness_handler, readiness_handler};
pub use publish::{publish_handler, PublishRequest, PublishResponse};
pub use query::StrictQuery;
pub use status::{render_status_page, status_handler};
pub use subscribe::{subscribe_handler, SubscribeParams, SubscribeResponse};

use std::sync::Arc;
use std::time::Instant;

use tidings_core::TopicStore;

use super::Lifecycle;

/// Shared application state passed to all axum handlers via `State` extraction.
#[derive(Clone)]
pub struct AppState {
    /// The topic store every handler reads from or writes to.
    pub store: Arc<TopicStore>,
    /// Serving phase and in-flight accounting.
    pub lifecycle: Arc<Lifecycle>,
    /// Server process start time, used for uptime calculation.
    pub started_at: Instant,
}

#[cfg(test)]
impl AppState {
    /// Fresh state over an empty store with default capacity.
    pub(crate) fn for_tests() -> Self {
        Self {
            store: Arc::new(TopicStore::new(&tidings_core::StoreConfig::default()).unwrap()),
            lifecycle: Arc::new(Lifecycle::new()),
            started_at: Instant::now(),
        }
    }
}
