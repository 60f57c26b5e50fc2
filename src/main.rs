//! Policy gateway binary.
//!
//! Loads configuration, starts the metrics exporter, the rate-limit
//! sweeper, and the config reload loop, then serves the gateway in front
//! of a placeholder upstream router.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::any, Json, Router};
use clap::Parser;
use tokio::net::TcpListener;

use policy_gateway::config::loader::load_config;
use policy_gateway::config::watcher::ConfigWatcher;
use policy_gateway::config::GatewayConfig;
use policy_gateway::lifecycle::Shutdown;
use policy_gateway::observability::{logging, metrics};
use policy_gateway::ratelimit::spawn_sweeper;
use policy_gateway::{GatewayServer, GatewayState};

#[derive(Parser)]
#[command(name = "policy-gateway")]
#[command(about = "Request-admission and policy-enforcement gateway", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init_logging(&config.observability);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        watched_prefix = %config.watched_prefix,
        rules = config.routes.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let state = GatewayState::from_config(&config);

    spawn_sweeper(
        Arc::clone(&state.limiter),
        Duration::from_secs(config.rate_limit.sweep_interval_secs),
        &shutdown,
    );

    // Hot reload: swap route/policy snapshots when the config file changes.
    let _watcher = if let Some(path) = &cli.config {
        let (watcher, mut updates) = ConfigWatcher::new(path);
        let handle = watcher.run()?;
        let reload_state = state.clone();
        let mut shutdown_rx = shutdown.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(new_config) = updates.recv() => {
                        reload_state.reload(&new_config);
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }
        });
        Some(handle)
    } else {
        None
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    // Placeholder upstream: a real deployment mounts its business
    // handlers here.
    let upstream = Router::new().route(
        "/{*path}",
        any(|| async { Json(serde_json::json!({ "status": "ok" })) }),
    );

    let server = GatewayServer::new(config, state, upstream);
    server.run(listener).await?;

    shutdown.trigger();
    tracing::info!("Shutdown complete");
    Ok(())
}
