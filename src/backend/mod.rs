//! Backend (orchestration engine) boundary
//!
//! Everything the aggregation layer needs from an engine goes through
//! [`BackendClient`]. Clients are never stored by managers; they are
//! reached through a [`BackendClientHandle`] produced by a
//! [`BackendConnector`], so reconnects and leader changes are picked up
//! on the next call.

pub mod fixture;
pub mod handle;
pub mod pool;
pub mod records;

pub use fixture::{BackendSnapshot, Operation, StaticBackend};
pub use handle::{BackendClientHandle, Resolution};
pub use pool::ClientPool;
pub use records::{BackendServiceRecord, BackendTaskRecord, ServiceMode, ServiceStatus};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Orchestration engine kind a cluster is managed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Swarm-mode engine (services and tasks)
    SwarmMode,
    /// Classic standalone engine clustering (containers only)
    ClassicEngine,
    /// Declared, no integration yet
    Kubernetes,
}

impl BackendKind {
    /// All kinds the registry knows about
    pub const ALL: [BackendKind; 3] = [
        BackendKind::SwarmMode,
        BackendKind::ClassicEngine,
        BackendKind::Kubernetes,
    ];

    /// Parse a configured kind name. Accepts the canonical names plus the
    /// short aliases operators tend to write.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "swarm-mode" | "swarmmode" | "swarm" => Some(BackendKind::SwarmMode),
            "classic-engine" | "classic" | "docker" => Some(BackendKind::ClassicEngine),
            "kubernetes" | "k8s" => Some(BackendKind::Kubernetes),
            _ => None,
        }
    }

    /// Canonical name
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::SwarmMode => "swarm-mode",
            BackendKind::ClassicEngine => "classic-engine",
            BackendKind::Kubernetes => "kubernetes",
        }
    }

    /// Whether the engine has a notion of replicated services
    pub fn supports_replication(&self) -> bool {
        matches!(self, BackendKind::SwarmMode | BackendKind::Kubernetes)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A live connection to one cluster's engine
#[async_trait]
pub trait BackendClient: Send + Sync + fmt::Debug {
    /// Address or name of the endpoint, for diagnostics
    fn endpoint(&self) -> &str;

    /// List services known to the engine
    async fn list_services(&self) -> Result<Vec<BackendServiceRecord>>;

    /// List tasks, or standalone containers on engines without tasks
    async fn list_tasks(&self) -> Result<Vec<BackendTaskRecord>>;
}

/// Produces client handles for clusters
pub trait BackendConnector: Send + Sync {
    /// Handle for the given cluster. Must not perform I/O.
    fn handle_for(&self, cluster_id: &str) -> BackendClientHandle;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kinds() {
        assert_eq!(BackendKind::parse("swarm-mode"), Some(BackendKind::SwarmMode));
        assert_eq!(BackendKind::parse(" Swarm "), Some(BackendKind::SwarmMode));
        assert_eq!(
            BackendKind::parse("classic-engine"),
            Some(BackendKind::ClassicEngine)
        );
        assert_eq!(BackendKind::parse("k8s"), Some(BackendKind::Kubernetes));
        assert_eq!(BackendKind::parse("nonexistent"), None);
        assert_eq!(BackendKind::parse(""), None);
    }

    #[test]
    fn test_canonical_names_round_trip() {
        for kind in BackendKind::ALL {
            assert_eq!(BackendKind::parse(kind.as_str()), Some(kind));
            assert_eq!(kind.to_string(), kind.as_str());
        }
    }

    #[test]
    fn test_serde_uses_canonical_name() {
        let json = serde_json::to_string(&BackendKind::ClassicEngine).unwrap();
        assert_eq!(json, "\"classic-engine\"");
    }
}
