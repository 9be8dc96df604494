pub mod handlers;
pub mod server;

use std::sync::Arc;

use pkg_metrics::MetricsRegistry;

/// Shared application state injected into all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<MetricsRegistry>,
}
