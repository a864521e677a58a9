//! Static in-memory backend
//!
//! Serves a fixed snapshot of service and task records. Snapshots can be
//! loaded from JSON files for offline inspection, and failures or latency
//! can be injected to exercise degraded paths.

use super::records::{BackendServiceRecord, BackendTaskRecord};
use super::BackendClient;
use crate::error::{ClumanError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

/// Records served by a [`StaticBackend`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSnapshot {
    pub services: Vec<BackendServiceRecord>,
    pub tasks: Vec<BackendTaskRecord>,
}

/// List operations failures can be injected into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListServices,
    ListTasks,
    Any,
}

impl Operation {
    fn covers(&self, other: Operation) -> bool {
        *self == Operation::Any || *self == other
    }
}

/// Backend client answering from memory
#[derive(Debug)]
pub struct StaticBackend {
    endpoint: String,
    snapshot: RwLock<BackendSnapshot>,
    fail_on: RwLock<Option<Operation>>,
    latency: RwLock<Option<Duration>>,
    calls: AtomicUsize,
}

impl StaticBackend {
    /// Create an empty backend
    pub fn new(endpoint: &str) -> Self {
        Self::with_snapshot(endpoint, BackendSnapshot::default())
    }

    /// Create a backend serving `snapshot`
    pub fn with_snapshot(endpoint: &str, snapshot: BackendSnapshot) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            snapshot: RwLock::new(snapshot),
            fail_on: RwLock::new(None),
            latency: RwLock::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Load a snapshot from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let snapshot: BackendSnapshot = serde_json::from_str(&content)?;
        Ok(Self::with_snapshot(
            &format!("file://{}", path.display()),
            snapshot,
        ))
    }

    /// Replace the served snapshot
    pub fn set_snapshot(&self, snapshot: BackendSnapshot) -> Result<()> {
        *self
            .snapshot
            .write()
            .map_err(|_| ClumanError::Lock("Failed to acquire write lock".to_string()))? = snapshot;
        Ok(())
    }

    /// Make `operation` fail with a transport error until cleared
    pub fn set_fail_on(&self, operation: Operation) {
        if let Ok(mut fail_on) = self.fail_on.write() {
            *fail_on = Some(operation);
        }
    }

    /// Stop injecting failures
    pub fn clear_failure(&self) {
        if let Ok(mut fail_on) = self.fail_on.write() {
            *fail_on = None;
        }
    }

    /// Delay every answer by `latency`
    pub fn set_latency(&self, latency: Duration) {
        if let Ok(mut l) = self.latency.write() {
            *l = Some(latency);
        }
    }

    /// Number of list calls served or failed so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self, operation: Operation) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let latency = self.latency.read().ok().and_then(|l| *l);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let failing = self
            .fail_on
            .read()
            .ok()
            .and_then(|f| *f)
            .is_some_and(|f| f.covers(operation));
        if failing {
            return Err(ClumanError::Transport(format!(
                "{}: injected failure on {:?}",
                self.endpoint, operation
            )));
        }
        Ok(())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, BackendSnapshot>> {
        self.snapshot
            .read()
            .map_err(|_| ClumanError::Lock("Failed to acquire read lock".to_string()))
    }
}

#[async_trait]
impl BackendClient for StaticBackend {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn list_services(&self) -> Result<Vec<BackendServiceRecord>> {
        self.enter(Operation::ListServices).await?;
        Ok(self.read()?.services.clone())
    }

    async fn list_tasks(&self) -> Result<Vec<BackendTaskRecord>> {
        self.enter(Operation::ListTasks).await?;
        Ok(self.read()?.tasks.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_serves_snapshot() {
        let backend = StaticBackend::with_snapshot(
            "mem",
            BackendSnapshot {
                services: vec![BackendServiceRecord::replicated("s1", "web", "nginx", 2)],
                tasks: vec![BackendTaskRecord::new("t1", "running").for_service("s1")],
            },
        );

        assert_eq!(backend.list_services().await.unwrap().len(), 1);
        assert_eq!(backend.list_tasks().await.unwrap().len(), 1);
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let backend = StaticBackend::new("mem");
        backend.set_fail_on(Operation::ListTasks);

        assert!(backend.list_services().await.is_ok());
        let err = backend.list_tasks().await.unwrap_err();
        assert!(err.is_transient());

        backend.clear_failure();
        assert!(backend.list_tasks().await.is_ok());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"services":[{{"id":"s1","spec":{{"name":"web"}}}}],"tasks":[]}}"#
        )
        .unwrap();

        let backend = StaticBackend::from_file(file.path()).unwrap();
        assert!(backend.endpoint().starts_with("file://"));
        let services = backend.list_services().await.unwrap();
        assert_eq!(services[0].spec.name, "web");
    }
}
