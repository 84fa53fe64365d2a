//! HTTP surface of the broker: configuration, handlers, middleware, lifecycle.

pub mod config;
pub mod handlers;
pub mod lifecycle;
pub mod middleware;
pub mod server;

pub use config::*;
pub use handlers::AppState;
pub use lifecycle::{Lifecycle, Phase, RequestGuard};
pub use server::{build_router, BrokerServer};
