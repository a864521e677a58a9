//! Classic engine manager

use super::{query, ContainersManager, QueryContext};
use crate::backend::{BackendClientHandle, BackendKind};
use crate::mapper::{map_container, map_service};
use crate::model::{ContainerService, DockerContainer, Listing};
use async_trait::async_trait;

/// Manager for classic engine clusters.
///
/// The engine has no replication: services it reports carry no replica
/// counts and containers are addressed by container id, without tasks.
#[derive(Debug)]
pub struct ClassicEngineManager {
    handle: BackendClientHandle,
}

impl ClassicEngineManager {
    pub fn new(handle: BackendClientHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl ContainersManager for ClassicEngineManager {
    fn kind(&self) -> BackendKind {
        BackendKind::ClassicEngine
    }

    fn cluster_id(&self) -> &str {
        self.handle.cluster_id()
    }

    async fn get_services(&self, ctx: &QueryContext) -> Listing<ContainerService> {
        query(
            &self.handle,
            ctx,
            "list_services",
            |client| async move { client.list_services().await },
            |record| map_service(record, BackendKind::ClassicEngine),
        )
        .await
    }

    async fn get_containers(&self, ctx: &QueryContext) -> Listing<DockerContainer> {
        query(
            &self.handle,
            ctx,
            "list_containers",
            |client| async move { client.list_tasks().await },
            |record| map_container(record, BackendKind::ClassicEngine),
        )
        .await
    }
}
