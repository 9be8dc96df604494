use async_trait::async_trait;
use k8s_openapi::api::core::v1::{EndpointAddress, Endpoints};
use pkg_types::endpoint::EndpointSnapshot;
use std::sync::Arc;
use tracing::debug;

use crate::error::{ClientTarget, CollectorError, CollectorResult};
use crate::handle::ConnectionHandle;

/// Issues endpoints reads against the orchestration platform.
#[async_trait]
pub trait EndpointsReader: Send + Sync {
    async fn read_endpoints(&self, service: &str, namespace: &str) -> CollectorResult<Endpoints>;
}

/// Produces a platform client. Called only while the handle is uninitialized.
#[async_trait]
pub trait PlatformClientFactory: Send + Sync {
    async fn connect(&self) -> CollectorResult<Arc<dyn EndpointsReader>>;
}

/// Fetches one [`EndpointSnapshot`] per call, connecting lazily.
pub struct EndpointFetcher {
    factory: Arc<dyn PlatformClientFactory>,
    client: ConnectionHandle<Arc<dyn EndpointsReader>>,
}

impl EndpointFetcher {
    pub fn new(factory: Arc<dyn PlatformClientFactory>) -> Self {
        Self {
            factory,
            client: ConnectionHandle::default(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_ready()
    }

    /// Acquire the platform client if not yet connected. No-op once ready.
    pub async fn ensure_connected(&mut self) -> CollectorResult<()> {
        if self.client.is_ready() {
            return Ok(());
        }
        let factory = Arc::clone(&self.factory);
        self.client
            .get_or_try_init(|| async move { factory.connect().await })
            .await?;
        debug!("Connection to platform client was established");
        Ok(())
    }

    /// Read the Service's endpoints once and flatten them into a snapshot.
    ///
    /// A failed read leaves the connection untouched.
    pub async fn fetch_snapshot(
        &self,
        service: &str,
        namespace: &str,
    ) -> CollectorResult<EndpointSnapshot> {
        let client = self.client.get().ok_or_else(|| {
            CollectorError::connection(ClientTarget::Platform, "platform client is not connected")
        })?;
        let endpoints = client.read_endpoints(service, namespace).await?;
        Ok(normalize(&endpoints))
    }
}

/// Flatten every subset into one ready list and one not-ready list.
///
/// Missing lists count as empty. Upstream order and duplicates are kept.
pub fn normalize(endpoints: &Endpoints) -> EndpointSnapshot {
    let mut ready = Vec::new();
    let mut not_ready = Vec::new();

    for subset in endpoints.subsets.iter().flatten() {
        ready.extend(ips(subset.addresses.as_deref()));
        not_ready.extend(ips(subset.not_ready_addresses.as_deref()));
    }

    EndpointSnapshot::captured_now(ready, not_ready)
}

fn ips(addresses: Option<&[EndpointAddress]>) -> impl Iterator<Item = String> + '_ {
    addresses.unwrap_or_default().iter().map(|a| a.ip.clone())
}
