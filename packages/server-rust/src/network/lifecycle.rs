//! Broker lifecycle: which phase the server is in and how many broker
//! requests it is handling.
//!
//! The phase lives in a `watch` channel. The channel always holds the current
//! value, so a task that starts waiting for shutdown after it was requested
//! still sees it. Transitions only move forward:
//!
//! Starting -> Serving -> Draining -> Stopped
//!
//! A drain may also be requested straight from `Starting`.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tokio::sync::watch;

/// Where the server is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Listener not yet accepting requests.
    Starting,
    /// Accepting and handling requests.
    Serving,
    /// Shutdown requested; open connections are finishing, new broker
    /// requests are refused.
    Draining,
    /// The listener is closed.
    Stopped,
}

impl Phase {
    /// Lowercase name used in health responses.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Serving => "serving",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        }
    }

    /// True once shutdown has been requested.
    #[must_use]
    pub fn is_shutting_down(self) -> bool {
        matches!(self, Self::Draining | Self::Stopped)
    }
}

/// Shared lifecycle state for one broker instance.
#[derive(Debug)]
pub struct Lifecycle {
    phase: watch::Sender<Phase>,
    in_flight: Arc<AtomicU64>,
}

impl Lifecycle {
    /// Creates a lifecycle in [`Phase::Starting`].
    #[must_use]
    pub fn new() -> Self {
        let (phase, _) = watch::channel(Phase::Starting);
        Self {
            phase,
            in_flight: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Moves `Starting` to `Serving`.
    ///
    /// Returns `false` and leaves the phase alone if shutdown was already
    /// requested.
    pub fn mark_serving(&self) -> bool {
        self.phase.send_if_modified(|phase| {
            if *phase == Phase::Starting {
                *phase = Phase::Serving;
                true
            } else {
                false
            }
        })
    }

    /// Asks the server to stop accepting work.
    ///
    /// Returns `true` if this call started the drain, `false` if one was
    /// already under way.
    pub fn request_drain(&self) -> bool {
        self.phase.send_if_modified(|phase| {
            if phase.is_shutting_down() {
                false
            } else {
                *phase = Phase::Draining;
                true
            }
        })
    }

    /// Records that the listener has closed.
    pub fn mark_stopped(&self) {
        self.phase.send_replace(Phase::Stopped);
    }

    /// Future that resolves once shutdown has been requested, immediately if
    /// it already was.
    ///
    /// Owns its receiver, so it can be moved into a spawned task.
    pub fn drain_requested(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut phase = self.phase.subscribe();
        async move {
            // An error means the lifecycle itself is gone, which also ends serving.
            let _ = phase.wait_for(|p| p.is_shutting_down()).await;
        }
    }

    /// Admits a broker request, or refuses it once shutdown was requested.
    ///
    /// The request counts as in flight until the returned guard is dropped.
    #[must_use]
    pub fn try_admit(&self) -> Option<RequestGuard> {
        // Counted before the phase check so a concurrent drain cannot miss it.
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        let guard = RequestGuard {
            in_flight: Arc::clone(&self.in_flight),
        };
        if self.phase().is_shutting_down() {
            return None;
        }
        Some(guard)
    }

    /// Broker requests currently being handled.
    #[must_use]
    pub fn in_flight(&self) -> u64 {
        self.in_flight.load(Ordering::Acquire)
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds one admitted request; releases it on drop, including during unwinding.
#[derive(Debug)]
pub struct RequestGuard {
    in_flight: Arc<AtomicU64>,
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Axum middleware: admits broker requests while serving, 503 once draining.
pub async fn track_in_flight(
    State(lifecycle): State<Arc<Lifecycle>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(_guard) = lifecycle.try_admit() else {
        return (StatusCode::SERVICE_UNAVAILABLE, "server is shutting down").into_response();
    };
    next.run(request).await
}
