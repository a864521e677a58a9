//! Placeholder for declared backend kinds without an integration

use super::{ContainersManager, QueryContext};
use crate::backend::{BackendClientHandle, BackendKind};
use crate::model::{ContainerService, DegradedReason, DockerContainer, Listing};
use async_trait::async_trait;
use tracing::debug;

/// Always-degraded manager. Keeps the cluster visible in fleet results as
/// "unknown" instead of silently missing.
#[derive(Debug)]
pub struct UnsupportedManager {
    kind: BackendKind,
    handle: BackendClientHandle,
}

impl UnsupportedManager {
    pub fn new(kind: BackendKind, handle: BackendClientHandle) -> Self {
        Self { kind, handle }
    }

    fn degraded<T>(&self) -> Listing<T> {
        debug!(cluster = %self.handle.cluster_id(), kind = %self.kind, "no integration for backend kind");
        Listing::degraded(DegradedReason::Unsupported(self.kind))
    }
}

#[async_trait]
impl ContainersManager for UnsupportedManager {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn cluster_id(&self) -> &str {
        self.handle.cluster_id()
    }

    async fn get_services(&self, _ctx: &QueryContext) -> Listing<ContainerService> {
        self.degraded()
    }

    async fn get_containers(&self, _ctx: &QueryContext) -> Listing<DockerContainer> {
        self.degraded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_always_degraded() {
        let manager =
            UnsupportedManager::new(BackendKind::Kubernetes, BackendClientHandle::unavailable("k"));
        let ctx = QueryContext::default();

        let services = manager.get_services(&ctx).await;
        let containers = manager.get_containers(&ctx).await;

        assert!(services.items.is_empty());
        assert_eq!(
            services.degraded_reason(),
            Some(&DegradedReason::Unsupported(BackendKind::Kubernetes))
        );
        assert!(containers.is_degraded());
    }
}
