//! Backend-native service and task records
//!
//! These mirror the shape engines report over their list APIs. Every
//! field a backend may omit is optional or defaulted, so a record decoded
//! from any supported engine is always representable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Service record as listed by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendServiceRecord {
    /// Service ID
    pub id: String,
    /// Service specification
    pub spec: ServiceSpec,
    /// Task counters, when the engine reports them
    pub service_status: Option<ServiceStatus>,
    /// Updated timestamp
    pub updated_at: Option<DateTime<Utc>>,
}

impl BackendServiceRecord {
    /// Create a replicated service record
    pub fn replicated(id: &str, name: &str, image: &str, replicas: u64) -> Self {
        Self {
            id: id.to_string(),
            spec: ServiceSpec {
                name: name.to_string(),
                mode: Some(ServiceMode::Replicated { replicas }),
                task_template: TaskSpec {
                    container_spec: Some(ContainerSpec {
                        image: image.to_string(),
                        ..Default::default()
                    }),
                },
                ..Default::default()
            },
            service_status: None,
            updated_at: None,
        }
    }

    /// Create a global service record
    pub fn global(id: &str, name: &str, image: &str) -> Self {
        let mut record = Self::replicated(id, name, image, 0);
        record.spec.mode = Some(ServiceMode::Global);
        record
    }

    /// Add a service-level label
    pub fn label(mut self, key: &str, value: &str) -> Self {
        self.spec.labels.insert(key.to_string(), value.to_string());
        self
    }

    /// Set reported task counters
    pub fn status(mut self, running_tasks: u64, desired_tasks: u64) -> Self {
        self.service_status = Some(ServiceStatus {
            running_tasks,
            desired_tasks,
            completed_tasks: None,
        });
        self
    }

    /// Image of the task template, if any
    pub fn image(&self) -> Option<&str> {
        self.spec
            .task_template
            .container_spec
            .as_ref()
            .map(|c| c.image.as_str())
            .filter(|i| !i.is_empty())
    }
}

/// Service specification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSpec {
    /// Service name
    pub name: String,
    /// Labels
    pub labels: HashMap<String, String>,
    /// Task template
    pub task_template: TaskSpec,
    /// Service mode
    pub mode: Option<ServiceMode>,
}

/// Task specification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskSpec {
    /// Container spec
    pub container_spec: Option<ContainerSpec>,
}

/// Container specification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerSpec {
    /// Image
    pub image: String,
    /// Labels
    pub labels: HashMap<String, String>,
    /// Hostname
    pub hostname: Option<String>,
}

/// Service mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ServiceMode {
    /// Replicated service
    Replicated { replicas: u64 },
    /// Global service (one per node)
    Global,
    /// Replicated job
    ReplicatedJob {
        max_concurrent: u64,
        total_completions: u64,
    },
    /// Global job
    GlobalJob,
}

impl ServiceMode {
    /// Replica count the mode itself pins down. Global modes depend on
    /// the node count and have none.
    pub fn desired_replicas(&self) -> Option<u64> {
        match self {
            ServiceMode::Replicated { replicas } => Some(*replicas),
            ServiceMode::ReplicatedJob {
                total_completions, ..
            } => Some(*total_completions),
            ServiceMode::Global | ServiceMode::GlobalJob => None,
        }
    }
}

/// Service task counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceStatus {
    pub running_tasks: u64,
    pub desired_tasks: u64,
    pub completed_tasks: Option<u64>,
}

/// Task (or standalone container) record as listed by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendTaskRecord {
    /// Task ID
    pub id: String,
    /// Container name, reported by engines without tasks
    pub name: Option<String>,
    /// Service ID
    pub service_id: Option<String>,
    /// Slot (for replicated services)
    pub slot: Option<u64>,
    /// Node ID
    pub node_id: Option<String>,
    /// Task spec
    pub spec: TaskSpec,
    /// Task status
    pub status: TaskStatus,
    /// Desired state, raw
    pub desired_state: Option<String>,
    /// Labels attached to the task itself
    pub labels: HashMap<String, String>,
}

impl BackendTaskRecord {
    /// Create a task record in the given raw state
    pub fn new(id: &str, state: &str) -> Self {
        Self {
            id: id.to_string(),
            status: TaskStatus {
                state: state.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Attach the task to a service
    pub fn for_service(mut self, service_id: &str) -> Self {
        self.service_id = Some(service_id.to_string());
        self
    }

    /// Place the task on a node
    pub fn on_node(mut self, node_id: &str) -> Self {
        self.node_id = Some(node_id.to_string());
        self
    }

    /// Set the image of the task's container spec
    pub fn image(mut self, image: &str) -> Self {
        self.spec
            .container_spec
            .get_or_insert_with(ContainerSpec::default)
            .image = image.to_string();
        self
    }

    /// Add a task label
    pub fn label(mut self, key: &str, value: &str) -> Self {
        self.labels.insert(key.to_string(), value.to_string());
        self
    }

    /// Set the backing container id
    pub fn container(mut self, container_id: &str) -> Self {
        self.status.container_status = Some(ContainerStatus {
            container_id: container_id.to_string(),
            pid: None,
            exit_code: None,
        });
        self
    }
}

/// Task status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskStatus {
    /// Timestamp
    pub timestamp: Option<DateTime<Utc>>,
    /// State, raw engine vocabulary
    pub state: String,
    /// Message
    pub message: String,
    /// Error
    pub err: Option<String>,
    /// Container status
    pub container_status: Option<ContainerStatus>,
}

/// Container status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerStatus {
    /// Container ID
    pub container_id: String,
    /// PID
    pub pid: Option<i64>,
    /// Exit code
    pub exit_code: Option<i64>,
}
