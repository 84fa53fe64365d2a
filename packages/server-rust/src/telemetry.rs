//! Process-wide logging and metrics setup for the `tidings` binary.
//!
//! Library code only emits `tracing` events and `metrics` counters; the
//! binary decides where they go by calling [`init_logging`] and, optionally,
//! [`install_metrics_exporter`] once at startup.

use std::net::{Ipv4Addr, SocketAddr};

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Level used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single-line text.
    Text,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    #[must_use]
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Filter from `RUST_LOG`, falling back to [`DEFAULT_LOG_LEVEL`] with the
/// HTTP plumbing crates quietened.
fn build_env_filter() -> anyhow::Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let directives = [DEFAULT_LOG_LEVEL, "hyper=warn", "hyper_util=warn", "reqwest=warn"].join(",");
    EnvFilter::try_new(&directives)
        .with_context(|| format!("invalid tracing filter '{directives}'"))
}

/// Installs the global `tracing` subscriber, writing to stderr.
///
/// # Errors
///
/// Returns an error if the filter cannot be built or a global subscriber
/// is already installed.
pub fn init_logging(format: LogFormat) -> anyhow::Result<()> {
    let layer = match format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(build_env_filter()?))
        .try_init()
        .context("tracing subscriber already installed")?;

    Ok(())
}

/// Serves Prometheus metrics on `0.0.0.0:<port>/metrics`.
///
/// Must be called from inside a Tokio runtime.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or a global recorder is
/// already installed.
pub fn install_metrics_exporter(port: u16) -> anyhow::Result<SocketAddr> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .with_context(|| format!("failed to install Prometheus exporter on {addr}"))?;

    tracing::info!(%addr, "prometheus exporter listening");
    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_selects_format() {
        assert_eq!(LogFormat::from_json_flag(true), LogFormat::Json);
        assert_eq!(LogFormat::from_json_flag(false), LogFormat::Text);
    }

    #[test]
    fn default_filter_parses() {
        // RUST_LOG may be set in the test environment; either branch must
        // yield a usable filter.
        assert!(build_env_filter().is_ok());
    }
}
