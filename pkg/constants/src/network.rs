//! Network-related constants.

/// Default port for the metrics HTTP endpoint.
pub const DEFAULT_EXPORTER_PORT: u16 = 9153;

/// Path that serves the Prometheus exposition.
pub const METRICS_PATH: &str = "/metrics";

/// Path that serves the liveness probe.
pub const HEALTH_PATH: &str = "/healthz";

/// Default base URL of the event sink API.
pub const DEFAULT_EVENT_SINK_HOST: &str = "https://api.honeycomb.io";

/// Request timeout for a single event delivery, in seconds.
pub const EVENT_SINK_TIMEOUT_SECS: u64 = 5;
