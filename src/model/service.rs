//! Canonical service model

use crate::backend::BackendKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A logical, possibly replicated service on one cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerService {
    /// Service ID, unique within a cluster snapshot
    pub id: String,
    /// Display name
    pub name: String,
    /// Desired replicas; `None` where the backend has no such notion
    pub desired_replicas: Option<u64>,
    /// Running replicas; `None` when not reported
    pub current_replicas: Option<u64>,
    /// Image reference
    pub image: String,
    /// Labels
    pub labels: HashMap<String, String>,
    /// Backend that reported it
    pub backend: BackendKind,
}

impl ContainerService {
    /// True when both counts are known and differ
    pub fn is_converging(&self) -> bool {
        matches!(
            (self.desired_replicas, self.current_replicas),
            (Some(desired), Some(current)) if desired != current
        )
    }
}
