//! cluman - container cluster aggregation
//!
//! cluman presents services and containers from a fleet of clusters running
//! different container engines through one normalized model:
//!
//! - Backend-native records mapped to `ContainerService` / `DockerContainer`
//! - One manager per cluster, selected by its declared backend kind
//! - Lazy, swappable backend clients
//! - Fleet-wide queries that isolate failing clusters
//! - Explicit degraded status instead of silently empty results

pub mod access;
pub mod backend;
pub mod config;
pub mod error;
pub mod facade;
pub mod manager;
pub mod mapper;
pub mod model;
pub mod registry;
pub mod util;

pub use error::{ClumanError, Result};
pub use facade::{AggregationFacade, ClusterSnapshot, FleetOptions, FleetReport};
pub use model::{ContainerService, DockerContainer, Listing, SnapshotStatus};
pub use registry::ManagerRegistry;
