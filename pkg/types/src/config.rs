use anyhow::{Context, Result, bail};
use pkg_constants::{collector, env, network};
use std::fmt;
use std::time::Duration;

use crate::validate::{validate_namespace_name, validate_service_name};

/// Identity and credential forwarded to the event sink.
#[derive(Clone, PartialEq, Eq)]
pub struct EventSinkSettings {
    pub api_key: String,
    pub dataset: String,
    pub api_host: String,
}

impl fmt::Debug for EventSinkSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSinkSettings")
            .field("api_key", &mask(&self.api_key))
            .field("dataset", &self.dataset)
            .field("api_host", &self.api_host)
            .finish()
    }
}

/// Show at most the first four characters of a secret.
pub fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    format!("{}***", visible)
}

/// What the reconciliation loop monitors and how often.
///
/// Built once at startup and never changed afterwards.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    service_name: String,
    namespace_name: String,
    poll_interval: Duration,
    event_sink_enabled: bool,
    event_sink: Option<EventSinkSettings>,
}

impl CollectorConfig {
    pub fn new(
        service_name: impl Into<String>,
        namespace_name: impl Into<String>,
        poll_interval: Duration,
        event_sink_enabled: bool,
        event_sink: Option<EventSinkSettings>,
    ) -> Result<Self> {
        let service_name = service_name.into();
        let namespace_name = namespace_name.into();
        validate_service_name(&service_name)?;
        validate_namespace_name(&namespace_name)?;
        if poll_interval.is_zero() {
            bail!("polling interval must be positive");
        }
        if event_sink_enabled && event_sink.is_none() {
            bail!(
                "event sink is enabled but {} is not set",
                env::OTEL_API_KEY
            );
        }
        Ok(Self {
            service_name,
            namespace_name,
            poll_interval,
            event_sink_enabled,
            event_sink,
        })
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn namespace_name(&self) -> &str {
        &self.namespace_name
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn event_sink_enabled(&self) -> bool {
        self.event_sink_enabled
    }

    pub fn event_sink(&self) -> Option<&EventSinkSettings> {
        self.event_sink.as_ref()
    }
}

/// Log line encoding selected by `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Settings resolved from the process environment.
#[derive(Debug, Clone)]
pub struct ExporterEnv {
    pub exporter_port: u16,
    pub inside_cluster: bool,
    pub log_level: String,
    pub log_format: LogFormat,
    pub otel_api_key: Option<String>,
    pub otel_dataset: String,
    pub otel_api_host: String,
}

impl ExporterEnv {
    /// Read settings from the real process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, treating empty values as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let exporter_port = match get(env::EXPORTER_PORT) {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("invalid {} '{}'", env::EXPORTER_PORT, raw))?,
            None => network::DEFAULT_EXPORTER_PORT,
        };

        let inside_cluster = get(env::KUBE_AUTH_INSIDE_CLUSTER)
            .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "false" | "0" | "no"))
            .unwrap_or(false);

        let log_format = match get(env::LOG_FORMAT).as_deref() {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            exporter_port,
            inside_cluster,
            log_level: get(env::LOG_LEVEL)
                .map(|l| normalize_log_level(&l))
                .unwrap_or_else(|| env::DEFAULT_LOG_LEVEL.to_string()),
            log_format,
            otel_api_key: get(env::OTEL_API_KEY),
            otel_dataset: get(env::OTEL_DATASET)
                .unwrap_or_else(|| collector::DEFAULT_EVENT_DATASET.to_string()),
            otel_api_host: get(env::OTEL_API_HOST)
                .unwrap_or_else(|| network::DEFAULT_EVENT_SINK_HOST.to_string()),
        })
    }

    /// Event sink identity, present only when an API key is configured.
    pub fn event_sink_settings(&self) -> Option<EventSinkSettings> {
        self.otel_api_key.as_ref().map(|key| EventSinkSettings {
            api_key: key.clone(),
            dataset: self.otel_dataset.clone(),
            api_host: self.otel_api_host.trim_end_matches('/').to_string(),
        })
    }
}

/// Map the level names operators commonly use onto `tracing` filter names.
fn normalize_log_level(level: &str) -> String {
    let lower = level.to_ascii_lowercase();
    match lower.as_str() {
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        _ => lower,
    }
}
