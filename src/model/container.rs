//! Canonical container model

use crate::backend::BackendKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Container status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    /// Container is created but not running
    Created,
    /// Container is running
    Running,
    /// Container is paused
    Paused,
    /// Container has exited
    Exited,
    /// Backend reported a state we do not recognize
    Unknown,
}

impl std::fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerStatus::Created => write!(f, "created"),
            ContainerStatus::Running => write!(f, "running"),
            ContainerStatus::Paused => write!(f, "paused"),
            ContainerStatus::Exited => write!(f, "exited"),
            ContainerStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// One container instance; a task on replicated backends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerContainer {
    /// Container ID
    pub id: String,
    /// Container name, where the backend has one
    pub name: Option<String>,
    /// Task ID, on backends with tasks
    pub task_id: Option<String>,
    /// Owning service, `None` for standalone containers
    pub service_id: Option<String>,
    /// Node the container runs on
    pub node_id: Option<String>,
    /// Current status
    pub status: ContainerStatus,
    /// Image reference
    pub image: String,
    /// Labels
    pub labels: HashMap<String, String>,
    /// Backend that reported it
    pub backend: BackendKind,
}

impl DockerContainer {
    pub fn is_running(&self) -> bool {
        self.status == ContainerStatus::Running
    }

    /// Whether the container is part of a managed service
    pub fn is_managed(&self) -> bool {
        self.service_id.is_some()
    }
}
