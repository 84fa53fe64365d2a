//! Tidings server: an HTTP publish/subscribe broker over [`tidings_core`].
//!
//! - [`network`] serves the store over HTTP (`axum`) with graceful drain.
//! - [`client`] is the matching `reqwest` client and polling subscription.
//! - [`cli`] and [`cmd`] make up the `tidings` binary; [`telemetry`] wires its logs.

pub mod cli;
pub mod client;
pub mod cmd;
pub mod network;
pub mod telemetry;

pub use client::{BrokerClient, ClientError, Subscription};
pub use network::{build_router, AppState, BrokerServer, Lifecycle, NetworkConfig, Phase};
