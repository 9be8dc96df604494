use axum::{Router, routing::get};
use pkg_constants::network::{HEALTH_PATH, METRICS_PATH};
use pkg_metrics::MetricsRegistry;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::AppState;
use crate::handlers::metrics;

/// Server configuration passed from the binary's CLI.
pub struct ServerConfig {
    pub addr: SocketAddr,
}

/// Routes served by the exporter.
pub fn router(registry: Arc<MetricsRegistry>) -> Router {
    let state = AppState { registry };
    Router::new()
        .route(METRICS_PATH, get(metrics::metrics))
        .route(HEALTH_PATH, get(metrics::healthz))
        .with_state(state)
}

/// Bind the metrics endpoint. Binding errors surface before serving starts.
pub async fn bind(config: &ServerConfig) -> anyhow::Result<TcpListener> {
    let listener = TcpListener::bind(config.addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind metrics endpoint on {}: {}", config.addr, e))?;
    info!("Starting metrics server on {}", config.addr);
    Ok(listener)
}

/// Serve scrapes until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    registry: Arc<MetricsRegistry>,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(registry))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("Metrics server stopped");
    Ok(())
}
