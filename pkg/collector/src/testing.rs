//! Scripted fakes for the platform and event sink seams.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{EndpointAddress, EndpointSubset, Endpoints};
use pkg_types::event::EndpointEvent;
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{ClientTarget, CollectorError, CollectorResult};
use crate::fetcher::{EndpointsReader, PlatformClientFactory};
use crate::sink::{EventSink, EventSinkFactory};

pub fn subset(ready: &[&str], not_ready: &[&str]) -> EndpointSubset {
    let addrs = |ips: &[&str]| {
        ips.iter()
            .map(|ip| EndpointAddress {
                ip: ip.to_string(),
                ..Default::default()
            })
            .collect::<Vec<_>>()
    };
    EndpointSubset {
        addresses: Some(addrs(ready)),
        not_ready_addresses: Some(addrs(not_ready)),
        ..Default::default()
    }
}

pub fn endpoints(subsets: Vec<EndpointSubset>) -> Endpoints {
    Endpoints {
        subsets: Some(subsets),
        ..Default::default()
    }
}

#[derive(Default)]
struct PlatformState {
    responses: Mutex<VecDeque<Result<Endpoints, String>>>,
    reads: Mutex<Vec<(String, String)>>,
    connects: AtomicUsize,
    failing_connects: AtomicUsize,
    dropped: AtomicBool,
}

/// Platform factory whose reader replays scripted responses.
///
/// Once the script is exhausted every read returns an empty `Endpoints`.
pub struct FakeFactory {
    state: Arc<PlatformState>,
}

impl FakeFactory {
    pub fn new(responses: Vec<Result<Endpoints, String>>) -> Arc<Self> {
        let state = PlatformState::default();
        *state.responses.lock().unwrap() = responses.into();
        Arc::new(Self {
            state: Arc::new(state),
        })
    }

    /// Make the next `n` connection attempts fail.
    pub fn failing_connects(self: Arc<Self>, n: usize) -> Arc<Self> {
        self.state.failing_connects.store(n, Ordering::SeqCst);
        self
    }

    /// Make every read fail as if the established client lost its connection.
    pub fn dropping_connection(self: Arc<Self>) -> Arc<Self> {
        self.state.dropped.store(true, Ordering::SeqCst);
        self
    }

    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> Vec<(String, String)> {
        self.state.reads.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlatformClientFactory for FakeFactory {
    async fn connect(&self) -> CollectorResult<Arc<dyn EndpointsReader>> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        let failing = self.state.failing_connects.load(Ordering::SeqCst);
        if failing > 0 {
            self.state.failing_connects.store(failing - 1, Ordering::SeqCst);
            return Err(CollectorError::connection(
                ClientTarget::Platform,
                "kubeconfig not found",
            ));
        }
        Ok(Arc::new(FakeReader {
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeReader {
    state: Arc<PlatformState>,
}

#[async_trait]
impl EndpointsReader for FakeReader {
    async fn read_endpoints(&self, service: &str, namespace: &str) -> CollectorResult<Endpoints> {
        self.state
            .reads
            .lock()
            .unwrap()
            .push((service.to_string(), namespace.to_string()));
        if self.state.dropped.load(Ordering::SeqCst) {
            return Err(CollectorError::connection(
                ClientTarget::Platform,
                "connection reset by peer",
            ));
        }
        match self.state.responses.lock().unwrap().pop_front() {
            Some(Ok(eps)) => Ok(eps),
            Some(Err(cause)) => Err(CollectorError::query(service, namespace, cause)),
            None => Ok(Endpoints::default()),
        }
    }
}

#[derive(Default)]
struct SinkState {
    events: Mutex<Vec<EndpointEvent>>,
    connects: AtomicUsize,
    sends: AtomicUsize,
    failing_connects: AtomicUsize,
    failing_sends: AtomicBool,
}

/// Event sink factory recording every delivered event.
pub struct FakeSinkFactory {
    state: Arc<SinkState>,
}

impl FakeSinkFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Arc::new(SinkState::default()),
        })
    }

    pub fn failing_connects(self: Arc<Self>, n: usize) -> Arc<Self> {
        self.state.failing_connects.store(n, Ordering::SeqCst);
        self
    }

    pub fn failing_sends(self: Arc<Self>) -> Arc<Self> {
        self.state.failing_sends.store(true, Ordering::SeqCst);
        self
    }

    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn sends(&self) -> usize {
        self.state.sends.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<EndpointEvent> {
        self.state.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventSinkFactory for FakeSinkFactory {
    async fn connect(&self) -> CollectorResult<Arc<dyn EventSink>> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        let failing = self.state.failing_connects.load(Ordering::SeqCst);
        if failing > 0 {
            self.state.failing_connects.store(failing - 1, Ordering::SeqCst);
            return Err(CollectorError::connection(
                ClientTarget::EventSink,
                "sink unreachable",
            ));
        }
        Ok(Arc::new(FakeSink {
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeSink {
    state: Arc<SinkState>,
}

#[async_trait]
impl EventSink for FakeSink {
    async fn send(&self, event: &EndpointEvent) -> CollectorResult<()> {
        self.state.sends.fetch_add(1, Ordering::SeqCst);
        if self.state.failing_sends.load(Ordering::SeqCst) {
            return Err(CollectorError::Publish {
                dataset: "test".into(),
                reason: "HTTP 503".into(),
            });
        }
        self.state.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// In-memory log sink for asserting on emitted `tracing` events.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Route this thread's events into the capture until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn lines_containing(&self, needle: &str) -> Vec<String> {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf)
            .lines()
            .filter(|line| line.contains(needle))
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// True when a formatted log line carries `key` with `value`, quoted or not.
pub fn has_field(line: &str, key: &str, value: &str) -> bool {
    line.contains(&format!("{}=\"{}\"", key, value)) || line.contains(&format!("{}={}", key, value))
}
