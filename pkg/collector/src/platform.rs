//! Kubernetes-backed platform client.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Endpoints;
use kube::{Api, Client, Config};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{ClientTarget, CollectorError, CollectorResult};
use crate::fetcher::{EndpointsReader, PlatformClientFactory};

/// Builds a [`kube::Client`] from in-cluster or kubeconfig credentials.
pub struct KubeClientFactory {
    inside_cluster: bool,
}

impl KubeClientFactory {
    pub fn new(inside_cluster: bool) -> Self {
        Self { inside_cluster }
    }

    async fn load_config(&self) -> CollectorResult<Config> {
        if self.inside_cluster {
            Config::incluster().map_err(|e| CollectorError::connection(ClientTarget::Platform, e))
        } else {
            Config::infer()
                .await
                .map_err(|e| CollectorError::connection(ClientTarget::Platform, e))
        }
    }
}

#[async_trait]
impl PlatformClientFactory for KubeClientFactory {
    async fn connect(&self) -> CollectorResult<Arc<dyn EndpointsReader>> {
        let config = self.load_config().await?;
        info!(
            cluster_url = %config.cluster_url,
            inside_cluster = self.inside_cluster,
            "Loaded Kubernetes client config"
        );
        let client = Client::try_from(config)
            .map_err(|e| CollectorError::connection(ClientTarget::Platform, e))?;
        debug!("Kubernetes client created");
        Ok(Arc::new(KubeEndpointsReader { client }))
    }
}

/// Reads `Endpoints` objects through the core/v1 API.
pub struct KubeEndpointsReader {
    client: Client,
}

#[async_trait]
impl EndpointsReader for KubeEndpointsReader {
    async fn read_endpoints(&self, service: &str, namespace: &str) -> CollectorResult<Endpoints> {
        let api: Api<Endpoints> = Api::namespaced(self.client.clone(), namespace);
        api.get(service)
            .await
            .map_err(|e| CollectorError::query(service, namespace, e))
    }
}
