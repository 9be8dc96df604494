use axum::{
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use tracing::debug;

use crate::AppState;

/// Content type of the Prometheus text exposition format.
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// GET /metrics — render the current gauge and counter values.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    debug!("Serving metrics scrape");
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
        state.registry.render(),
    )
}

/// GET /healthz — liveness probe.
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
