//! Broker HTTP server with deferred startup.
//!
//! `new()` allocates shared state, `start()` binds the TCP listener, and
//! `serve()` accepts connections until shutdown. Binding separately lets
//! callers learn the OS-assigned port before traffic starts.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post};
use axum::Router;
use tidings_core::TopicStore;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::{NetworkConfig, TlsConfig};
use super::handlers::{
    clear_handler, health_handler, liveness_handler, publish_handler, readiness_handler,
    status_handler, subscribe_handler, AppState,
};
use super::lifecycle::{track_in_flight, Lifecycle};
use super::middleware::with_http_layers;

/// Assembles the broker routes around `state`.
///
/// Routes:
/// - `GET /` -- HTML status page
/// - `POST /publish` -- append a message
/// - `GET /subscribe` -- poll a topic
/// - `DELETE /clear` -- drop a topic
/// - `GET /health`, `/health/live`, `/health/ready` -- probes
///
/// Only the broker routes count as in-flight work; probes keep answering
/// while the server drains.
#[must_use]
pub fn build_router(state: AppState, config: &NetworkConfig) -> Router {
    let broker_routes = Router::new()
        .route("/", get(status_handler))
        .route("/publish", post(publish_handler))
        .route("/subscribe", get(subscribe_handler))
        .route("/clear", delete(clear_handler))
        .route_layer(from_fn_with_state(
            Arc::clone(&state.lifecycle),
            track_in_flight,
        ));

    let probe_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler));

    with_http_layers(broker_routes.merge(probe_routes), config).with_state(state)
}

/// Owns the listener, the store handle, and the lifecycle of one broker.
pub struct BrokerServer {
    config: NetworkConfig,
    store: Arc<TopicStore>,
    listener: Option<TcpListener>,
    lifecycle: Arc<Lifecycle>,
}

impl BrokerServer {
    /// Creates a server around `store` without binding any port.
    #[must_use]
    pub fn new(config: NetworkConfig, store: Arc<TopicStore>) -> Self {
        Self {
            config,
            store,
            listener: None,
            lifecycle: Arc::new(Lifecycle::new()),
        }
    }

    /// Shared handle to the store served by this broker.
    #[must_use]
    pub fn store(&self) -> Arc<TopicStore> {
        Arc::clone(&self.store)
    }

    /// Shared handle to the lifecycle; `request_drain()` on it stops `serve()`.
    #[must_use]
    pub fn lifecycle(&self) -> Arc<Lifecycle> {
        Arc::clone(&self.lifecycle)
    }

    /// Router over this server's store and lifecycle.
    #[must_use]
    pub fn build_router(&self) -> Router {
        build_router(self.app_state(), &self.config)
    }

    fn app_state(&self) -> AppState {
        AppState {
            store: Arc::clone(&self.store),
            lifecycle: Arc::clone(&self.lifecycle),
            started_at: Instant::now(),
        }
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the bound port, which differs from the configured one when
    /// port 0 asks the OS to pick.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        let port = listener.local_addr()?.port();

        info!(host = %self.config.host, port, "broker listener bound");

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves requests until `shutdown` resolves or a drain is requested
    /// through [`lifecycle()`](Self::lifecycle).
    ///
    /// Once shutdown starts, open connections get at most `drain_timeout` to
    /// finish; whatever is left after that is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called first, if TLS material
    /// cannot be loaded, or if the server hits a fatal I/O error.
    pub async fn serve(
        mut self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = self
            .listener
            .take()
            .context("start() must be called before serve()")?;
        let router = self.build_router();
        let lifecycle = self.lifecycle;
        let config = self.config;

        let stop = {
            let lifecycle = Arc::clone(&lifecycle);
            let drain_requested = lifecycle.drain_requested();
            async move {
                tokio::select! {
                    () = shutdown => {}
                    () = drain_requested => {}
                }
                lifecycle.request_drain();
                info!("shutdown requested, no longer accepting connections");
            }
        };

        if !lifecycle.mark_serving() {
            info!("drain requested before serving started");
        }

        let outcome = match &config.tls {
            Some(tls) => {
                let serving = serve_tls(listener, router, tls, stop);
                drain_within(&lifecycle, config.drain_timeout, serving).await
            }
            None => {
                info!("serving plain HTTP");
                let serving = async move {
                    axum::serve(listener, router)
                        .with_graceful_shutdown(stop)
                        .await
                        .map_err(anyhow::Error::from)
                };
                drain_within(&lifecycle, config.drain_timeout, serving).await
            }
        };

        lifecycle.mark_stopped();
        outcome
    }
}

/// Drives `serving` to completion, cutting it off `grace` after a drain is
/// requested.
async fn drain_within(
    lifecycle: &Lifecycle,
    grace: Duration,
    serving: impl Future<Output = anyhow::Result<()>>,
) -> anyhow::Result<()> {
    let deadline = {
        let drain_requested = lifecycle.drain_requested();
        async move {
            drain_requested.await;
            tokio::time::sleep(grace).await;
        }
    };

    tokio::select! {
        result = serving => {
            result?;
            info!("all connections closed");
        }
        () = deadline => {
            warn!(
                in_flight = lifecycle.in_flight(),
                "drain timeout expired, dropping open connections"
            );
        }
    }
    Ok(())
}

/// Serves HTTPS with `axum-server` and rustls on the pre-bound listener.
///
/// Waits for connections without a limit once `stop` resolves; the caller
/// bounds the wait.
async fn serve_tls(
    listener: TcpListener,
    router: Router,
    tls: &TlsConfig,
    stop: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    use axum_server::tls_rustls::RustlsConfig;

    let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
        .await
        .context("failed to load TLS certificate or key")?;

    let addr = listener.local_addr()?;
    let std_listener = listener.into_std()?;
    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();

    tokio::spawn(async move {
        stop.await;
        shutdown_handle.graceful_shutdown(None);
    });

    info!(%addr, "serving HTTPS");

    axum_server::from_tcp_rustls(std_listener, rustls_config)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;
    Ok(())
}
