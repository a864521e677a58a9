//! Canonical, backend-agnostic model
//!
//! Everything here is a per-query snapshot: built fresh on each call and
//! never mutated afterwards.

pub mod container;
pub mod listing;
pub mod service;

pub use container::{ContainerStatus, DockerContainer};
pub use listing::{AnomalyKind, DegradedReason, Listing, MappingAnomaly, SnapshotStatus};
pub use service::ContainerService;
