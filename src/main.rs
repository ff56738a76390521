//! sitewatch server binary.

use sitewatch::config::ServerConfig;
use sitewatch::metrics::PrometheusMetrics;
use sitewatch::service::Monitor;
use sitewatch::web::Server;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("sitewatch=info".parse()?))
        .init();

    // Load configuration
    let cfg = ServerConfig::load();
    tracing::info!("Starting sitewatch on port {}...", cfg.http_port);
    tracing::info!(
        "Default interval {}s, minimum {}s, probe timeout {:?}, history {} entries",
        cfg.monitor.default_interval_secs,
        cfg.monitor.min_interval_secs,
        cfg.monitor.probe_timeout,
        cfg.monitor.history_capacity
    );

    let metrics = Arc::new(PrometheusMetrics::new()?);
    let monitor = Arc::new(Monitor::new(&cfg.monitor, metrics.clone()));

    // Start web server
    let server = Server::new(cfg, monitor.clone(), metrics);
    server.start(shutdown_signal()).await?;

    tracing::info!("Shutting down monitors");
    monitor.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
