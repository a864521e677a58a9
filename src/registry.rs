//! Cluster → manager registry
//!
//! The registry owns one manager per cluster. Entries are created on first
//! request and replaced when the cluster's declared backend kind changes.
//! Bookkeeping is sharded per cluster id, so resolving one cluster never
//! waits on an unrelated one, and no lock is held while a manager talks to
//! its backend.

use crate::backend::{BackendConnector, BackendKind};
use crate::error::{ClumanError, Result};
use crate::manager::{self, ContainersManager};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// Source of truth for which clusters exist and what they run
pub trait ClusterDirectory: Send + Sync {
    /// Declared backend kind, as configured; `None` if the cluster is unknown
    fn backend_kind(&self, cluster_id: &str) -> Option<String>;

    /// All known cluster ids
    fn cluster_ids(&self) -> Vec<String>;
}

/// In-memory directory
#[derive(Debug, Default)]
pub struct StaticDirectory {
    clusters: RwLock<BTreeMap<String, String>>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare or redeclare a cluster's backend kind
    pub fn set_kind(&self, cluster_id: &str, kind: &str) -> Result<()> {
        let mut clusters = self
            .clusters
            .write()
            .map_err(|_| ClumanError::Lock("Failed to acquire write lock".to_string()))?;
        clusters.insert(cluster_id.to_string(), kind.to_string());
        Ok(())
    }

    /// Forget a cluster
    pub fn remove(&self, cluster_id: &str) -> Result<bool> {
        let mut clusters = self
            .clusters
            .write()
            .map_err(|_| ClumanError::Lock("Failed to acquire write lock".to_string()))?;
        Ok(clusters.remove(cluster_id).is_some())
    }
}

impl<K, V> FromIterator<(K, V)> for StaticDirectory
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(entries: I) -> Self {
        Self {
            clusters: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl ClusterDirectory for StaticDirectory {
    fn backend_kind(&self, cluster_id: &str) -> Option<String> {
        self.clusters.read().ok()?.get(cluster_id).cloned()
    }

    fn cluster_ids(&self) -> Vec<String> {
        self.clusters
            .read()
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default()
    }
}

struct Binding {
    kind: BackendKind,
    manager: Arc<dyn ContainersManager>,
}

/// Live managers, one per cluster
pub struct ManagerRegistry {
    directory: Arc<dyn ClusterDirectory>,
    connector: Arc<dyn BackendConnector>,
    managers: DashMap<String, Binding>,
}

impl ManagerRegistry {
    /// Create an empty registry
    pub fn new(directory: Arc<dyn ClusterDirectory>, connector: Arc<dyn BackendConnector>) -> Self {
        Self {
            directory,
            connector,
            managers: DashMap::new(),
        }
    }

    /// Manager for `cluster_id`, created on first use.
    ///
    /// Concurrent first requests for the same cluster observe a single
    /// instance. A changed backend kind replaces the existing entry.
    pub fn get_manager(&self, cluster_id: &str) -> Result<Arc<dyn ContainersManager>> {
        let Some(declared) = self.directory.backend_kind(cluster_id) else {
            if self.managers.remove(cluster_id).is_some() {
                info!(cluster = %cluster_id, "dropped manager, cluster left the directory");
            }
            return Err(ClumanError::ClusterNotFound(cluster_id.to_string()));
        };

        let Some(kind) = BackendKind::parse(&declared) else {
            if self.managers.remove(cluster_id).is_some() {
                warn!(cluster = %cluster_id, kind = %declared, "dropped manager, cluster now declares an unknown kind");
            }
            return Err(ClumanError::UnknownBackendKind {
                cluster: cluster_id.to_string(),
                kind: declared,
            });
        };

        if let Some(manager) = self.bound(cluster_id, kind) {
            return Ok(manager);
        }

        match self.managers.entry(cluster_id.to_string()) {
            Entry::Occupied(mut entry) => {
                if entry.get().kind == kind {
                    return Ok(entry.get().manager.clone());
                }
                info!(
                    cluster = %cluster_id,
                    from = %entry.get().kind,
                    to = %kind,
                    "backend kind changed, replacing manager"
                );
                let manager = self.build(cluster_id, kind);
                entry.insert(Binding {
                    kind,
                    manager: manager.clone(),
                });
                Ok(manager)
            }
            Entry::Vacant(entry) => {
                info!(cluster = %cluster_id, kind = %kind, "creating manager");
                let manager = self.build(cluster_id, kind);
                entry.insert(Binding {
                    kind,
                    manager: manager.clone(),
                });
                Ok(manager)
            }
        }
    }

    fn bound(&self, cluster_id: &str, kind: BackendKind) -> Option<Arc<dyn ContainersManager>> {
        let binding = self.managers.get(cluster_id)?;
        (binding.kind == kind).then(|| binding.manager.clone())
    }

    fn build(&self, cluster_id: &str, kind: BackendKind) -> Arc<dyn ContainersManager> {
        manager::for_kind(kind, self.connector.handle_for(cluster_id))
    }

    /// Drop the manager for a cluster; the next request creates a new one
    pub fn evict(&self, cluster_id: &str) -> bool {
        let removed = self.managers.remove(cluster_id).is_some();
        if removed {
            debug!(cluster = %cluster_id, "evicted manager");
        }
        removed
    }

    /// Clusters known to the directory
    pub fn cluster_ids(&self) -> Vec<String> {
        self.directory.cluster_ids()
    }

    /// Number of live managers
    pub fn len(&self) -> usize {
        self.managers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }

    /// Drop every manager
    pub fn shutdown(&self) {
        let count = self.managers.len();
        self.managers.clear();
        info!(managers = count, "registry shut down");
    }
}

impl std::fmt::Debug for ManagerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagerRegistry")
            .field("managers", &self.managers.len())
            .finish_non_exhaustive()
    }
}
