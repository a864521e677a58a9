//! Query results and their status

use crate::backend::BackendKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a listing could not be produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum DegradedReason {
    /// No backend client could be resolved
    ClientUnavailable,
    /// The backend call exceeded the caller's deadline
    Timeout { after_ms: u64 },
    /// The backend call failed
    Transport(String),
    /// The cluster's backend kind has no integration
    Unsupported(BackendKind),
}

impl fmt::Display for DegradedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegradedReason::ClientUnavailable => write!(f, "backend client unavailable"),
            DegradedReason::Timeout { after_ms } => write!(f, "timed out after {}ms", after_ms),
            DegradedReason::Transport(msg) => write!(f, "backend call failed: {}", msg),
            DegradedReason::Unsupported(kind) => write!(f, "backend kind {} not supported", kind),
        }
    }
}

/// Whether a listing reflects the backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotStatus {
    /// The backend answered; the items are what it reported
    #[default]
    Complete,
    /// The items are empty because the backend state is unknown
    Degraded(DegradedReason),
}

impl SnapshotStatus {
    pub fn is_degraded(&self) -> bool {
        matches!(self, SnapshotStatus::Degraded(_))
    }
}

/// What was wrong with a backend record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum AnomalyKind {
    /// Status code outside the known vocabulary; mapped to `unknown`
    UnknownStatus(String),
    /// Label key with disallowed characters; label dropped
    UnsafeLabelKey(String),
    /// Container references a service absent from the snapshot
    DanglingServiceRef(String),
    /// Another record in the same listing had this id; later one dropped
    DuplicateId,
}

/// A record that could not be fully normalized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingAnomaly {
    /// ID of the offending record
    pub record_id: String,
    pub kind: AnomalyKind,
}

impl MappingAnomaly {
    pub fn new(record_id: &str, kind: AnomalyKind) -> Self {
        Self {
            record_id: record_id.to_string(),
            kind,
        }
    }
}

impl fmt::Display for MappingAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            AnomalyKind::UnknownStatus(s) => {
                write!(f, "{}: unknown status '{}'", self.record_id, s)
            }
            AnomalyKind::UnsafeLabelKey(k) => {
                write!(f, "{}: dropped unsafe label key '{}'", self.record_id, k)
            }
            AnomalyKind::DanglingServiceRef(s) => {
                write!(f, "{}: references missing service '{}'", self.record_id, s)
            }
            AnomalyKind::DuplicateId => {
                write!(f, "{}: duplicate id, later record dropped", self.record_id)
            }
        }
    }
}

/// One query's result for one cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub status: SnapshotStatus,
    pub anomalies: Vec<MappingAnomaly>,
}

impl<T> Listing<T> {
    /// A listing the backend answered
    pub fn complete(items: Vec<T>, anomalies: Vec<MappingAnomaly>) -> Self {
        Self {
            items,
            status: SnapshotStatus::Complete,
            anomalies,
        }
    }

    /// An empty listing standing for "currently unknown"
    pub fn degraded(reason: DegradedReason) -> Self {
        Self {
            items: Vec::new(),
            status: SnapshotStatus::Degraded(reason),
            anomalies: Vec::new(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.status.is_degraded()
    }

    /// Degradation reason, if any
    pub fn degraded_reason(&self) -> Option<&DegradedReason> {
        match &self.status {
            SnapshotStatus::Degraded(reason) => Some(reason),
            SnapshotStatus::Complete => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degraded_listing_is_empty() {
        let listing: Listing<u32> = Listing::degraded(DegradedReason::ClientUnavailable);
        assert!(listing.items.is_empty());
        assert!(listing.is_degraded());
        assert_eq!(
            listing.degraded_reason(),
            Some(&DegradedReason::ClientUnavailable)
        );
    }

    #[test]
    fn test_complete_listing() {
        let listing = Listing::complete(vec![1, 2], Vec::new());
        assert!(!listing.is_degraded());
        assert_eq!(listing.degraded_reason(), None);
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(
            DegradedReason::Timeout { after_ms: 250 }.to_string(),
            "timed out after 250ms"
        );
        assert_eq!(
            DegradedReason::Unsupported(BackendKind::Kubernetes).to_string(),
            "backend kind kubernetes not supported"
        );
    }

    #[test]
    fn test_anomaly_display() {
        let anomaly = MappingAnomaly::new("t1", AnomalyKind::UnsafeLabelKey("a b".to_string()));
        assert_eq!(anomaly.to_string(), "t1: dropped unsafe label key 'a b'");
    }
}
