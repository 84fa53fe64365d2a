//! One runner per `tidings` subcommand.

pub mod clear;
pub mod publish;
pub mod serve;
pub mod subscribe;

use std::time::Duration;

/// Per-request timeout used by the client subcommands.
pub(crate) const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolves on Ctrl-C. If the handler cannot be installed, never resolves.
pub(crate) async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
