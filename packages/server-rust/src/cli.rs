//! Command-line interface of the `tidings` binary.
//!
//! Every flag can also be supplied through a `TIDINGS_*` environment variable.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::bail;
use clap::{Args, Parser, Subcommand};
use tidings_core::{StoreConfig, MAX_MESSAGES_PER_TOPIC};

use crate::network::{NetworkConfig, TlsConfig, DEFAULT_PORT};

/// Broker URL the client subcommands talk to by default.
pub const DEFAULT_BROKER_URL: &str = "http://localhost:5000";

#[derive(Debug, Parser)]
#[command(name = "tidings", version, about = "HTTP publish/subscribe message broker")]
pub struct Cli {
    /// Emit logs as JSON lines instead of text.
    #[arg(long, global = true, env = "TIDINGS_LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the broker
    Serve(ServeArgs),
    /// Publish one message, or simulate a sensor publishing periodically
    Publish(PublishArgs),
    /// Poll a topic and print new messages until Ctrl-C
    Subscribe(SubscribeArgs),
    /// Drop every message held for a topic
    Clear(ClearArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0", env = "TIDINGS_HOST")]
    pub host: String,

    /// Port to listen on; 0 lets the OS choose.
    #[arg(long, default_value_t = DEFAULT_PORT, env = "TIDINGS_PORT")]
    pub port: u16,

    /// Messages retained per topic before the oldest is evicted.
    #[arg(long, default_value_t = MAX_MESSAGES_PER_TOPIC, env = "TIDINGS_MAX_MESSAGES_PER_TOPIC")]
    pub max_messages_per_topic: usize,

    /// PEM certificate chain; enables HTTPS together with `--tls-key`.
    #[arg(long, env = "TIDINGS_TLS_CERT", requires = "tls_key")]
    pub tls_cert: Option<PathBuf>,

    /// PEM private key.
    #[arg(long, env = "TIDINGS_TLS_KEY", requires = "tls_cert")]
    pub tls_key: Option<PathBuf>,

    /// Allowed CORS origin; repeat for several. Defaults to any origin.
    #[arg(long = "cors-origin", env = "TIDINGS_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    /// Seconds before an unfinished request is answered with 408.
    #[arg(long, default_value_t = 30, env = "TIDINGS_REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: u64,

    /// Seconds shutdown waits for in-flight requests.
    #[arg(long, default_value_t = 30, env = "TIDINGS_DRAIN_TIMEOUT_SECS")]
    pub drain_timeout_secs: u64,

    /// Serve Prometheus metrics on this port.
    #[arg(long, env = "TIDINGS_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

impl ServeArgs {
    /// Store settings derived from the flags; validated when the store is built.
    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            max_messages_per_topic: self.max_messages_per_topic,
        }
    }

    /// Listener settings derived from the flags.
    ///
    /// # Errors
    ///
    /// Returns an error if only one of the two TLS paths is given.
    pub fn network_config(&self) -> anyhow::Result<NetworkConfig> {
        let tls = match (&self.tls_cert, &self.tls_key) {
            (Some(cert_path), Some(key_path)) => Some(TlsConfig {
                cert_path: cert_path.clone(),
                key_path: key_path.clone(),
            }),
            (None, None) => None,
            _ => bail!("--tls-cert and --tls-key must be given together"),
        };

        let defaults = NetworkConfig::default();
        Ok(NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            tls,
            cors_origins: if self.cors_origins.is_empty() {
                defaults.cors_origins
            } else {
                self.cors_origins.clone()
            },
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            drain_timeout: Duration::from_secs(self.drain_timeout_secs),
        })
    }
}

#[derive(Args, Clone, Debug)]
pub struct PublishArgs {
    /// Broker base URL.
    #[arg(long, default_value = DEFAULT_BROKER_URL, env = "TIDINGS_BROKER")]
    pub broker: String,

    /// Topic to publish to.
    #[arg(long, default_value = "sensors/temperature")]
    pub topic: String,

    /// Publisher identity attached to each message.
    #[arg(long, default_value = "publisher-01")]
    pub id: String,

    /// Publish this single message and exit.
    #[arg(long)]
    pub message: Option<String>,

    /// Seconds between simulated sensor readings.
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,
}

#[derive(Args, Clone, Debug)]
pub struct SubscribeArgs {
    /// Broker base URL.
    #[arg(long, default_value = DEFAULT_BROKER_URL, env = "TIDINGS_BROKER")]
    pub broker: String,

    /// Topic to poll.
    #[arg(long, default_value = "sensors/temperature")]
    pub topic: String,

    /// Seconds between polls.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,
}

#[derive(Args, Clone, Debug)]
pub struct ClearArgs {
    /// Broker base URL.
    #[arg(long, default_value = DEFAULT_BROKER_URL, env = "TIDINGS_BROKER")]
    pub broker: String,

    /// Topic to clear.
    #[arg(long)]
    pub topic: String,
}
