use async_trait::async_trait;
use pkg_constants::network::EVENT_SINK_TIMEOUT_SECS;
use pkg_types::config::EventSinkSettings;
use pkg_types::event::EndpointEvent;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::{ClientTarget, CollectorError, CollectorResult};

/// Best-effort destination for per-cycle events.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn send(&self, event: &EndpointEvent) -> CollectorResult<()>;
}

/// Produces an event sink client. Called only while the handle is uninitialized.
#[async_trait]
pub trait EventSinkFactory: Send + Sync {
    async fn connect(&self) -> CollectorResult<Arc<dyn EventSink>>;
}

/// Builds clients for the Honeycomb events API.
pub struct HoneycombSinkFactory {
    settings: EventSinkSettings,
}

impl HoneycombSinkFactory {
    pub fn new(settings: EventSinkSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl EventSinkFactory for HoneycombSinkFactory {
    async fn connect(&self) -> CollectorResult<Arc<dyn EventSink>> {
        if self.settings.api_key.is_empty() {
            return Err(CollectorError::connection(
                ClientTarget::EventSink,
                "API key is empty",
            ));
        }
        if self.settings.dataset.is_empty() {
            return Err(CollectorError::connection(
                ClientTarget::EventSink,
                "dataset is empty",
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(EVENT_SINK_TIMEOUT_SECS))
            .build()
            .map_err(|e| CollectorError::connection(ClientTarget::EventSink, e))?;

        debug!(dataset = %self.settings.dataset, "Event sink client created");
        Ok(Arc::new(HoneycombSink {
            client,
            url: events_url(&self.settings),
            api_key: self.settings.api_key.clone(),
            dataset: self.settings.dataset.clone(),
        }))
    }
}

fn events_url(settings: &EventSinkSettings) -> String {
    format!(
        "{}/1/events/{}",
        settings.api_host.trim_end_matches('/'),
        settings.dataset
    )
}

/// Posts one JSON event per request.
pub struct HoneycombSink {
    client: reqwest::Client,
    url: String,
    api_key: String,
    dataset: String,
}

#[async_trait]
impl EventSink for HoneycombSink {
    async fn send(&self, event: &EndpointEvent) -> CollectorResult<()> {
        let publish_err = |reason: String| CollectorError::Publish {
            dataset: self.dataset.clone(),
            reason,
        };

        let resp = self
            .client
            .post(&self.url)
            .header("X-Honeycomb-Team", &self.api_key)
            .header("X-Honeycomb-Event-Time", &event.timestamp)
            .json(event)
            .send()
            .await
            .map_err(|e| publish_err(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(publish_err(format!("{} - {}", status, body)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(api_key: &str, dataset: &str) -> EventSinkSettings {
        EventSinkSettings {
            api_key: api_key.into(),
            dataset: dataset.into(),
            api_host: "https://api.honeycomb.io/".into(),
        }
    }

    #[test]
    fn url_joins_host_and_dataset() {
        assert_eq!(
            events_url(&settings("k", "endpoints")),
            "https://api.honeycomb.io/1/events/endpoints"
        );
    }

    #[tokio::test]
    async fn empty_credentials_fail_to_connect() {
        for s in [settings("", "ds"), settings("key", "")] {
            let err = HoneycombSinkFactory::new(s).connect().await.err().unwrap();
            assert!(matches!(
                err,
                CollectorError::Connection {
                    target: ClientTarget::EventSink,
                    ..
                }
            ));
            assert!(!err.is_fatal());
        }
    }

    #[tokio::test]
    async fn unreachable_host_is_a_publish_error() {
        let factory = HoneycombSinkFactory::new(EventSinkSettings {
            api_key: "key".into(),
            dataset: "ds".into(),
            api_host: "http://127.0.0.1:9".into(),
        });
        let sink = factory.connect().await.unwrap();
        let event = EndpointEvent {
            timestamp: "2024-05-01T12:00:00+00:00".into(),
            namespace: "default".into(),
            service: "web".into(),
            ready_count: 0,
            ready_ips: vec![],
            not_ready_count: 0,
            not_ready_ips: vec![],
        };
        let err = sink.send(&event).await.unwrap_err();
        assert!(matches!(err, CollectorError::Publish { .. }));
    }
}
