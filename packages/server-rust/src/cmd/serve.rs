//! `tidings serve`: run the broker until Ctrl-C.

use std::sync::Arc;

use anyhow::Context;
use tidings_core::TopicStore;
use tracing::info;

use crate::cli::ServeArgs;
use crate::network::BrokerServer;
use crate::telemetry;

/// Builds the store, binds the listener, and serves until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the port cannot be
/// bound, or the metrics exporter cannot start.
pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    let store_config = args.store_config();
    let network_config = args.network_config()?;

    let store = TopicStore::new(&store_config).context("invalid store configuration")?;
    info!(
        max_messages_per_topic = store.capacity(),
        "topic store ready"
    );

    if let Some(port) = args.metrics_port {
        telemetry::install_metrics_exporter(port)?;
    }

    let scheme = if network_config.tls.is_some() { "https" } else { "http" };
    let host = network_config.host.clone();

    let mut server = BrokerServer::new(network_config, Arc::new(store));
    let port = server.start().await?;
    info!("tidings broker listening on {scheme}://{host}:{port}");

    server.serve(super::ctrl_c()).await?;
    info!("tidings broker stopped");
    Ok(())
}
