//! Live client pool
//!
//! Holds the client currently serving each cluster. Whoever owns the
//! connections (reconnect loops, leader tracking) swaps entries here;
//! handles produced by the pool read the entry at resolution time.

use super::{BackendClient, BackendClientHandle, BackendConnector};
use crate::error::{ClumanError, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// Cluster id → live client
#[derive(Debug, Default, Clone)]
pub struct ClientPool {
    clients: Arc<RwLock<HashMap<String, Arc<dyn BackendClient>>>>,
}

impl ClientPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace the client for a cluster, returning the previous one
    pub fn connect(
        &self,
        cluster_id: &str,
        client: Arc<dyn BackendClient>,
    ) -> Result<Option<Arc<dyn BackendClient>>> {
        let mut clients = self
            .clients
            .write()
            .map_err(|_| ClumanError::Lock("Failed to acquire write lock".to_string()))?;

        info!(cluster = %cluster_id, endpoint = %client.endpoint(), "backend client connected");
        Ok(clients.insert(cluster_id.to_string(), client))
    }

    /// Drop the client for a cluster
    pub fn disconnect(&self, cluster_id: &str) -> Result<bool> {
        let mut clients = self
            .clients
            .write()
            .map_err(|_| ClumanError::Lock("Failed to acquire write lock".to_string()))?;

        let removed = clients.remove(cluster_id).is_some();
        if removed {
            info!(cluster = %cluster_id, "backend client disconnected");
        }
        Ok(removed)
    }

    /// Whether a client is currently installed
    pub fn is_connected(&self, cluster_id: &str) -> bool {
        self.current(cluster_id).is_some()
    }

    fn current(&self, cluster_id: &str) -> Option<Arc<dyn BackendClient>> {
        match self.clients.read() {
            Ok(clients) => clients.get(cluster_id).cloned(),
            Err(_) => {
                warn!(cluster = %cluster_id, "client pool lock poisoned");
                None
            }
        }
    }
}

impl BackendConnector for ClientPool {
    fn handle_for(&self, cluster_id: &str) -> BackendClientHandle {
        let pool = self.clone();
        let id = cluster_id.to_string();
        BackendClientHandle::new(cluster_id, move || pool.current(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Resolution, StaticBackend};

    fn endpoint_of(resolution: Resolution) -> Option<String> {
        match resolution {
            Resolution::Ready(client) => Some(client.endpoint().to_string()),
            Resolution::Unavailable => None,
        }
    }

    #[test]
    fn test_handle_sees_reconnect() {
        let pool = ClientPool::new();
        let handle = pool.handle_for("east");
        assert_eq!(endpoint_of(handle.resolve()), None);

        pool.connect("east", Arc::new(StaticBackend::new("leader-a")))
            .unwrap();
        assert_eq!(endpoint_of(handle.resolve()), Some("leader-a".to_string()));

        let previous = pool
            .connect("east", Arc::new(StaticBackend::new("leader-b")))
            .unwrap();
        assert_eq!(previous.map(|c| c.endpoint().to_string()), Some("leader-a".to_string()));
        assert_eq!(endpoint_of(handle.resolve()), Some("leader-b".to_string()));

        assert!(pool.disconnect("east").unwrap());
        assert_eq!(endpoint_of(handle.resolve()), None);
        assert!(!pool.disconnect("east").unwrap());
    }

    #[test]
    fn test_clusters_are_independent() {
        let pool = ClientPool::new();
        pool.connect("east", Arc::new(StaticBackend::new("east")))
            .unwrap();

        assert!(pool.is_connected("east"));
        assert!(!pool.is_connected("west"));
        assert!(!pool.handle_for("west").resolve().is_ready());
    }
}
