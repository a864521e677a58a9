//! Aggregation entry point
//!
//! Callers query one cluster or the whole fleet through
//! [`AggregationFacade`]. Fleet queries fan out one task per cluster,
//! bounded by the configured concurrency limit, and isolate failures: a
//! cluster that cannot be reached shows up in the report's degraded list
//! and never aborts the others.

use crate::backend::BackendKind;
use crate::error::Result;
use crate::manager::{ContainersManager, QueryContext, DEFAULT_QUERY_TIMEOUT};
use crate::model::{
    AnomalyKind, ContainerService, DegradedReason, DockerContainer, Listing, MappingAnomaly,
};
use crate::registry::ManagerRegistry;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Default number of clusters queried at once
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 8;

/// Fan-out and deadline settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FleetOptions {
    /// Clusters queried concurrently, at least 1
    pub concurrency_limit: usize,
    /// Deadline for each backend call
    pub query_timeout: Duration,
}

impl Default for FleetOptions {
    fn default() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }
}

/// An item annotated with the cluster it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sourced<T> {
    pub cluster_id: String,
    #[serde(flatten)]
    pub item: T,
}

/// A mapping anomaly annotated with its cluster
pub type SourcedAnomaly = Sourced<MappingAnomaly>;

/// A cluster whose data is currently unknown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedCluster {
    pub cluster_id: String,
    pub reason: DegradedReason,
}

/// A cluster that could not be queried at all (configuration problem)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedCluster {
    pub cluster_id: String,
    pub error: String,
}

/// Fleet-wide query result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetReport<T> {
    pub items: Vec<Sourced<T>>,
    pub degraded: Vec<DegradedCluster>,
    pub failed: Vec<FailedCluster>,
    pub anomalies: Vec<SourcedAnomaly>,
}

impl<T> Default for FleetReport<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            degraded: Vec::new(),
            failed: Vec::new(),
            anomalies: Vec::new(),
        }
    }
}

impl<T> FleetReport<T> {
    /// True when every cluster answered
    pub fn is_complete(&self) -> bool {
        self.degraded.is_empty() && self.failed.is_empty()
    }

    /// Items reported by one cluster
    pub fn for_cluster<'a>(&'a self, cluster_id: &'a str) -> impl Iterator<Item = &'a T> + 'a {
        self.items
            .iter()
            .filter(move |s| s.cluster_id == cluster_id)
            .map(|s| &s.item)
    }

    /// Merge one cluster's listing into the report
    pub fn add_listing(&mut self, cluster_id: &str, listing: Listing<T>) {
        if let Some(reason) = listing.degraded_reason() {
            self.degraded.push(DegradedCluster {
                cluster_id: cluster_id.to_string(),
                reason: reason.clone(),
            });
        }
        self.anomalies
            .extend(listing.anomalies.into_iter().map(|anomaly| Sourced {
                cluster_id: cluster_id.to_string(),
                item: anomaly,
            }));
        self.items.extend(listing.items.into_iter().map(|item| Sourced {
            cluster_id: cluster_id.to_string(),
            item,
        }));
    }
}

/// Services and containers of one cluster, taken together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    pub cluster_id: String,
    pub backend: BackendKind,
    pub services: Listing<ContainerService>,
    pub containers: Listing<DockerContainer>,
    pub taken_at: DateTime<Utc>,
}

impl ClusterSnapshot {
    pub fn is_degraded(&self) -> bool {
        self.services.is_degraded() || self.containers.is_degraded()
    }
}

/// Single query surface over every configured cluster
#[derive(Debug, Clone)]
pub struct AggregationFacade {
    registry: Arc<ManagerRegistry>,
    options: FleetOptions,
}

impl AggregationFacade {
    /// Create a facade with default options
    pub fn new(registry: Arc<ManagerRegistry>) -> Self {
        Self::with_options(registry, FleetOptions::default())
    }

    /// Create a facade with explicit options
    pub fn with_options(registry: Arc<ManagerRegistry>, options: FleetOptions) -> Self {
        Self {
            registry,
            options: FleetOptions {
                concurrency_limit: options.concurrency_limit.max(1),
                ..options
            },
        }
    }

    pub fn registry(&self) -> &Arc<ManagerRegistry> {
        &self.registry
    }

    pub fn options(&self) -> FleetOptions {
        self.options
    }

    /// Context built from the configured timeout
    pub fn context(&self) -> QueryContext {
        QueryContext::with_timeout(self.options.query_timeout)
    }

    /// Services of one cluster
    pub async fn list_services(&self, cluster_id: &str) -> Result<Listing<ContainerService>> {
        self.list_services_with(cluster_id, &self.context()).await
    }

    /// Services of one cluster under the caller's context
    pub async fn list_services_with(
        &self,
        cluster_id: &str,
        ctx: &QueryContext,
    ) -> Result<Listing<ContainerService>> {
        let manager = self.registry.get_manager(cluster_id)?;
        Ok(manager.get_services(ctx).await)
    }

    /// Containers of one cluster
    pub async fn list_containers(&self, cluster_id: &str) -> Result<Listing<DockerContainer>> {
        self.list_containers_with(cluster_id, &self.context()).await
    }

    /// Containers of one cluster under the caller's context
    pub async fn list_containers_with(
        &self,
        cluster_id: &str,
        ctx: &QueryContext,
    ) -> Result<Listing<DockerContainer>> {
        let manager = self.registry.get_manager(cluster_id)?;
        Ok(manager.get_containers(ctx).await)
    }

    /// Services and containers of one cluster, queried concurrently.
    ///
    /// Containers pointing at a service missing from the same snapshot are
    /// reported as anomalies; the two listings are not taken atomically so
    /// this is expected occasionally.
    pub async fn cluster_snapshot(&self, cluster_id: &str) -> Result<ClusterSnapshot> {
        self.cluster_snapshot_with(cluster_id, &self.context()).await
    }

    /// [`cluster_snapshot`](Self::cluster_snapshot) under the caller's context
    pub async fn cluster_snapshot_with(
        &self,
        cluster_id: &str,
        ctx: &QueryContext,
    ) -> Result<ClusterSnapshot> {
        let manager = self.registry.get_manager(cluster_id)?;

        let (services, mut containers) =
            tokio::join!(manager.get_services(ctx), manager.get_containers(ctx));

        if !services.is_degraded() && !containers.is_degraded() {
            let known: HashSet<&str> = services.items.iter().map(|s| s.id.as_str()).collect();
            let dangling: Vec<MappingAnomaly> = containers
                .items
                .iter()
                .filter_map(|c| {
                    let service_id = c.service_id.as_deref()?;
                    (!known.contains(service_id)).then(|| {
                        warn!(
                            cluster = %cluster_id,
                            container = %c.id,
                            service = %service_id,
                            "container references a service missing from the snapshot"
                        );
                        MappingAnomaly::new(
                            &c.id,
                            AnomalyKind::DanglingServiceRef(service_id.to_string()),
                        )
                    })
                })
                .collect();
            containers.anomalies.extend(dangling);
        }

        Ok(ClusterSnapshot {
            cluster_id: cluster_id.to_string(),
            backend: manager.kind(),
            services,
            containers,
            taken_at: Utc::now(),
        })
    }

    /// Services across the fleet
    pub async fn fleet_services(&self) -> FleetReport<ContainerService> {
        self.fleet_services_with(&self.context()).await
    }

    /// Services across the fleet under the caller's context
    pub async fn fleet_services_with(&self, ctx: &QueryContext) -> FleetReport<ContainerService> {
        self.fleet("services", *ctx, |manager, ctx| async move {
            manager.get_services(&ctx).await
        })
        .await
    }

    /// Containers across the fleet
    pub async fn fleet_containers(&self) -> FleetReport<DockerContainer> {
        self.fleet_containers_with(&self.context()).await
    }

    /// Containers across the fleet under the caller's context
    pub async fn fleet_containers_with(&self, ctx: &QueryContext) -> FleetReport<DockerContainer> {
        self.fleet("containers", *ctx, |manager, ctx| async move {
            manager.get_containers(&ctx).await
        })
        .await
    }

    async fn fleet<T, F, Fut>(&self, what: &str, ctx: QueryContext, query: F) -> FleetReport<T>
    where
        F: Fn(Arc<dyn ContainersManager>, QueryContext) -> Fut,
        Fut: Future<Output = Listing<T>>,
    {
        let clusters = self.registry.cluster_ids();
        let total = clusters.len();

        let mut outcomes: Vec<(String, Result<Listing<T>>)> = stream::iter(clusters)
            .map(|cluster_id| {
                let pending = self
                    .registry
                    .get_manager(&cluster_id)
                    .map(|manager| query(manager, ctx));
                async move {
                    let outcome = match pending {
                        Ok(listing) => Ok(listing.await),
                        Err(e) => Err(e),
                    };
                    (cluster_id, outcome)
                }
            })
            .buffer_unordered(self.options.concurrency_limit)
            .collect()
            .await;
        outcomes.sort_by(|a, b| a.0.cmp(&b.0));

        let mut report = FleetReport::default();
        for (cluster_id, outcome) in outcomes {
            match outcome {
                Ok(listing) => report.add_listing(&cluster_id, listing),
                Err(e) => {
                    warn!(cluster = %cluster_id, error = %e, "cluster skipped in fleet query");
                    report.failed.push(FailedCluster {
                        cluster_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            query = what,
            clusters = total,
            items = report.items.len(),
            degraded = report.degraded.len(),
            failed = report.failed.len(),
            "fleet query finished"
        );
        report
    }
}
