//! Swarm-mode engine manager

use super::{query, ContainersManager, QueryContext};
use crate::backend::{BackendClientHandle, BackendKind};
use crate::mapper::{map_container, map_service};
use crate::model::{ContainerService, DockerContainer, Listing};
use async_trait::async_trait;

/// Manager for swarm-mode clusters: services with replica counts, tasks
/// as containers
#[derive(Debug)]
pub struct SwarmModeManager {
    handle: BackendClientHandle,
}

impl SwarmModeManager {
    pub fn new(handle: BackendClientHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl ContainersManager for SwarmModeManager {
    fn kind(&self) -> BackendKind {
        BackendKind::SwarmMode
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
            |record| map_service(record, BackendKind::SwarmMode),
        )
        .await
    }

    async fn get_containers(&self, ctx: &QueryContext) -> Listing<DockerContainer> {
        query(
            &self.handle,
            ctx,
            "list_tasks",
            |client| async move { client.list_tasks().await },
            |record| map_container(record, BackendKind::SwarmMode),
        )
        .await
    }
}
