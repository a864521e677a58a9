//! Per-backend containers managers
//!
//! One [`ContainersManager`] variant exists per backend kind. Variants
//! differ in which backend operation they call and which fields they can
//! fill; resolution, deadlines and failure handling are shared and live
//! in [`query`].

pub mod classic;
pub mod swarm;
pub mod unsupported;

pub use classic::ClassicEngineManager;
pub use swarm::SwarmModeManager;
pub use unsupported::UnsupportedManager;

use crate::backend::{BackendClient, BackendClientHandle, BackendKind, Resolution};
use crate::error::Result;
use crate::mapper::Mapped;
use crate::model::{
    AnomalyKind, ContainerService, DegradedReason, DockerContainer, Listing, MappingAnomaly,
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default deadline for a single backend call
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Caller-owned bounds for one query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryContext {
    /// Deadline for each backend call
    pub timeout: Duration,
}

impl QueryContext {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for QueryContext {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }
}

/// Read-only view of one cluster's containers and services
#[async_trait]
pub trait ContainersManager: Send + Sync + fmt::Debug {
    /// Backend kind this variant speaks to
    fn kind(&self) -> BackendKind;

    /// Cluster this manager is bound to
    fn cluster_id(&self) -> &str;

    /// Services currently known to the backend.
    ///
    /// Never fails: an unreachable or failing backend yields an empty,
    /// degraded listing.
    async fn get_services(&self, ctx: &QueryContext) -> Listing<ContainerService>;

    /// Containers (tasks) currently known to the backend
    async fn get_containers(&self, ctx: &QueryContext) -> Listing<DockerContainer>;
}

/// Items with a per-cluster unique identifier
pub trait Identified {
    fn id(&self) -> &str;
}

impl Identified for ContainerService {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for DockerContainer {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Resolve the client, run one list call under the caller's deadline and
/// map the records. Any failure produces an empty degraded listing; no
/// retries, nothing is kept between calls.
pub(crate) async fn query<R, T, F, Fut, M>(
    handle: &BackendClientHandle,
    ctx: &QueryContext,
    operation: &'static str,
    call: F,
    map: M,
) -> Listing<T>
where
    F: FnOnce(Arc<dyn BackendClient>) -> Fut + Send,
    Fut: Future<Output = Result<Vec<R>>> + Send,
    M: Fn(&R) -> Mapped<T> + Send,
    R: Send,
    T: Identified + Send,
{
    let cluster = handle.cluster_id();

    let client = match handle.resolve() {
        Resolution::Ready(client) => client,
        Resolution::Unavailable => {
            warn!(cluster = %cluster, operation, "no backend client, returning degraded listing");
            return Listing::degraded(DegradedReason::ClientUnavailable);
        }
    };

    let records = match tokio::time::timeout(ctx.timeout, call(client)).await {
        Ok(Ok(records)) => records,
        Ok(Err(e)) => {
            warn!(cluster = %cluster, operation, error = %e, "backend call failed");
            return Listing::degraded(DegradedReason::Transport(e.to_string()));
        }
        Err(_) => {
            let after_ms = u64::try_from(ctx.timeout.as_millis()).unwrap_or(u64::MAX);
            warn!(cluster = %cluster, operation, after_ms, "backend call timed out");
            return Listing::degraded(DegradedReason::Timeout { after_ms });
        }
    };

    let mut seen = HashSet::with_capacity(records.len());
    let mut items = Vec::with_capacity(records.len());
    let mut anomalies = Vec::new();
    for record in &records {
        let mapped = map(record);
        if !seen.insert(mapped.value.id().to_string()) {
            warn!(cluster = %cluster, operation, id = %mapped.value.id(), "duplicate id in backend listing, keeping first");
            anomalies.push(MappingAnomaly::new(mapped.value.id(), AnomalyKind::DuplicateId));
            continue;
        }
        items.push(mapped.value);
        anomalies.extend(mapped.anomalies);
    }

    debug!(
        cluster = %cluster,
        operation,
        items = items.len(),
        anomalies = anomalies.len(),
        "backend listing mapped"
    );
    Listing::complete(items, anomalies)
}

/// Build the variant for `kind`, bound to `handle`
pub fn for_kind(kind: BackendKind, handle: BackendClientHandle) -> Arc<dyn ContainersManager> {
    match kind {
        BackendKind::SwarmMode => Arc::new(SwarmModeManager::new(handle)),
        BackendKind::ClassicEngine => Arc::new(ClassicEngineManager::new(handle)),
        BackendKind::Kubernetes => Arc::new(UnsupportedManager::new(kind, handle)),
    }
}
