//! Environment variable names read at startup.

pub const EXPORTER_PORT: &str = "EXPORTER_PORT";
pub const KUBE_AUTH_INSIDE_CLUSTER: &str = "KUBE_AUTH_INSIDE_CLUSTER";
pub const LOG_LEVEL: &str = "LOG_LEVEL";
pub const LOG_FORMAT: &str = "LOG_FORMAT";
pub const OTEL_API_KEY: &str = "OTEL_API_KEY";
pub const OTEL_DATASET: &str = "OTEL_DATASET";
pub const OTEL_API_HOST: &str = "OTEL_API_HOST";

/// Log level used when `LOG_LEVEL` is unset.
pub const DEFAULT_LOG_LEVEL: &str = "info";
