//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap the application's business router with the gateway middleware
//! - Wire up cross-cutting layers (tracing, timeout)
//! - Bind the server and serve with graceful shutdown
//!
//! # Design Decisions
//! - The gateway is an admission layer, not a proxy: it either rejects a
//!   request itself or lets it continue into the inner router
//! - The embedding application supplies the inner router; the binary
//!   supplies a trivial one

use std::net::SocketAddr;
use std::time::Duration;

use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::pipeline::{gateway_middleware, GatewayState};

/// HTTP server running the policy gateway in front of business handlers.
pub struct GatewayServer {
    router: Router,
    state: GatewayState,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Create a new server wrapping `inner` with the gateway pipeline.
    pub fn new(config: GatewayConfig, state: GatewayState, inner: Router) -> Self {
        let router = build_router(&config, state.clone(), inner);
        Self {
            router,
            state,
            config,
        }
    }

    /// Shared gateway state, for wiring reloads and background tasks.
    pub fn state(&self) -> GatewayState {
        self.state.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The assembled router, for driving the gateway without a socket.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            rules = self.state.registry.len(),
            "Gateway starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Gateway stopped");
        Ok(())
    }
}

/// Build the axum router with all middleware layers.
fn build_router(config: &GatewayConfig, state: GatewayState, inner: Router) -> Router {
    inner
        .layer(middleware::from_fn_with_state(state, gateway_middleware))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.timeouts.request_secs,
        )))
        .layer(TraceLayer::new_for_http())
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
