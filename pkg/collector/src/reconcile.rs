use pkg_constants::metrics as names;
use pkg_metrics::MetricsRegistry;
use pkg_types::config::CollectorConfig;
use pkg_types::endpoint::EndpointSnapshot;
use pkg_types::event::EndpointEvent;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::{CollectorError, CollectorResult};
use crate::fetcher::{EndpointFetcher, PlatformClientFactory};
use crate::handle::ConnectionHandle;
use crate::sink::{EventSink, EventSinkFactory};

/// Where the loop currently is within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Fetching,
    Publishing,
    /// Terminal: the platform client could not be established.
    ConnectionFailed,
}

/// Result of one non-fatal cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Published {
        ready_count: usize,
        not_ready_count: usize,
        event_forwarded: bool,
    },
    /// The query failed; gauges keep their previous values.
    Skipped,
}

/// Drives the fetch-publish cycle for one service/namespace pair.
pub struct ReconciliationLoop {
    config: CollectorConfig,
    fetcher: EndpointFetcher,
    sink_factory: Option<Arc<dyn EventSinkFactory>>,
    sink: ConnectionHandle<Arc<dyn EventSink>>,
    registry: Arc<MetricsRegistry>,
    state: LoopState,
}

impl ReconciliationLoop {
    /// Register the exporter metrics and seed the service's series at zero.
    pub fn new(
        config: CollectorConfig,
        platform: Arc<dyn PlatformClientFactory>,
        sink_factory: Option<Arc<dyn EventSinkFactory>>,
        registry: Arc<MetricsRegistry>,
    ) -> Self {
        registry.register_gauge(names::READY_PODS, names::READY_PODS_HELP);
        registry.register_gauge(names::NOT_READY_PODS, names::NOT_READY_PODS_HELP);
        registry.register_counter(names::CYCLES_TOTAL, names::CYCLES_TOTAL_HELP);
        registry.register_counter(names::QUERY_ERRORS_TOTAL, names::QUERY_ERRORS_TOTAL_HELP);
        registry.register_counter(names::EVENT_ERRORS_TOTAL, names::EVENT_ERRORS_TOTAL_HELP);

        registry.gauge_set_many(
            &service_labels(&config),
            &[(names::READY_PODS, 0), (names::NOT_READY_PODS, 0)],
        );
        registry.counter_add(names::CYCLES_TOTAL, &[], 0);
        registry.counter_add(names::QUERY_ERRORS_TOTAL, &[], 0);
        registry.counter_add(names::EVENT_ERRORS_TOTAL, &[], 0);

        if config.event_sink_enabled() && sink_factory.is_none() {
            warn!(
                service = config.service_name(),
                namespace = config.namespace_name(),
                "Event sink is enabled but no sink client is configured, events will not be forwarded"
            );
        }

        Self {
            config,
            fetcher: EndpointFetcher::new(platform),
            sink_factory,
            sink: ConnectionHandle::default(),
            registry,
            state: LoopState::Idle,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Run cycles until `shutdown` resolves or the platform connection fails.
    ///
    /// Cancellation interrupts both an in-flight cycle and the sleep between
    /// cycles.
    pub async fn run<F>(mut self, shutdown: F) -> CollectorResult<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(
            service = self.config.service_name(),
            namespace = self.config.namespace_name(),
            interval_secs = self.config.poll_interval().as_secs_f64(),
            event_sink = self.config.event_sink_enabled(),
            "Reconciliation loop started"
        );

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                result = self.run_cycle() => {
                    result?;
                }
            }
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.config.poll_interval()) => {}
            }
        }

        info!("Reconciliation loop stopped");
        Ok(())
    }

    /// One fetch-reconcile-publish iteration.
    ///
    /// Returns `Err` only for a platform connection failure.
    pub async fn run_cycle(&mut self) -> CollectorResult<CycleOutcome> {
        let started = Instant::now();
        self.state = LoopState::Fetching;

        if let Err(e) = self.fetcher.ensure_connected().await {
            self.state = LoopState::ConnectionFailed;
            error!(
                error = %e,
                service = self.config.service_name(),
                namespace = self.config.namespace_name(),
                "Connection to platform client failed"
            );
            return Err(e);
        }

        let snapshot = match self
            .fetcher
            .fetch_snapshot(self.config.service_name(), self.config.namespace_name())
            .await
        {
            Ok(snapshot) => snapshot,
            Err(e @ CollectorError::Query { .. }) => {
                warn!(
                    error = %e,
                    service = self.config.service_name(),
                    namespace = self.config.namespace_name(),
                    "Endpoints query failed, skipping cycle"
                );
                self.registry.counter_inc(names::QUERY_ERRORS_TOTAL, &[]);
                self.registry.counter_inc(names::CYCLES_TOTAL, &[]);
                self.state = LoopState::Idle;
                return Ok(CycleOutcome::Skipped);
            }
            Err(e @ (CollectorError::Connection { .. } | CollectorError::Publish { .. })) => {
                self.state = LoopState::ConnectionFailed;
                error!(
                    error = %e,
                    service = self.config.service_name(),
                    namespace = self.config.namespace_name(),
                    "Platform client connection lost"
                );
                return Err(e);
            }
        };

        self.state = LoopState::Publishing;
        self.publish_gauges(&snapshot);
        let event_forwarded = self.forward_event(&snapshot).await;
        self.registry.counter_inc(names::CYCLES_TOTAL, &[]);
        self.state = LoopState::Idle;

        info!(
            service = self.config.service_name(),
            namespace = self.config.namespace_name(),
            captured_at = %snapshot.captured_at().to_rfc3339(),
            ready_count = snapshot.ready_count(),
            ready_ips = ?snapshot.ready_addresses(),
            not_ready_count = snapshot.not_ready_count(),
            not_ready_ips = ?snapshot.not_ready_addresses(),
            event_forwarded,
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Collected endpoint metrics"
        );

        Ok(CycleOutcome::Published {
            ready_count: snapshot.ready_count(),
            not_ready_count: snapshot.not_ready_count(),
            event_forwarded,
        })
    }

    fn publish_gauges(&self, snapshot: &EndpointSnapshot) {
        self.registry.gauge_set_many(
            &service_labels(&self.config),
            &[
                (names::READY_PODS, gauge_value(snapshot.ready_count())),
                (names::NOT_READY_PODS, gauge_value(snapshot.not_ready_count())),
            ],
        );
    }

    /// Send the cycle's event. Failures are logged and never retried.
    async fn forward_event(&mut self, snapshot: &EndpointSnapshot) -> bool {
        if !self.config.event_sink_enabled() {
            return false;
        }
        let Some(factory) = self.sink_factory.clone() else {
            return false;
        };

        let sink = match self
            .sink
            .get_or_try_init(|| async move { factory.connect().await })
            .await
        {
            Ok(sink) => sink,
            Err(e) => {
                warn!(error = %e, "Event sink unavailable, event dropped for this cycle");
                self.registry.counter_inc(names::EVENT_ERRORS_TOTAL, &[]);
                return false;
            }
        };

        let event = EndpointEvent::from_snapshot(
            snapshot,
            self.config.namespace_name(),
            self.config.service_name(),
        );
        match sink.send(&event).await {
            Ok(()) => {
                debug!("Event forwarded");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to forward event");
                self.registry.counter_inc(names::EVENT_ERRORS_TOTAL, &[]);
                false
            }
        }
    }
}

fn service_labels(config: &CollectorConfig) -> [(&'static str, &str); 2] {
    [
        (names::LABEL_NAMESPACE, config.namespace_name()),
        (names::LABEL_SERVICE, config.service_name()),
    ]
}

fn gauge_value(count: usize) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}
