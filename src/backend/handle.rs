//! Lazily resolved client handle

use super::BackendClient;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

type Resolver = dyn Fn() -> Option<Arc<dyn BackendClient>> + Send + Sync;

/// Outcome of resolving a handle
#[derive(Clone)]
pub enum Resolution {
    /// A usable client
    Ready(Arc<dyn BackendClient>),
    /// No client can be produced right now
    Unavailable,
}

impl Resolution {
    pub fn is_ready(&self) -> bool {
        matches!(self, Resolution::Ready(_))
    }
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Ready(client) => write!(f, "Ready({})", client.endpoint()),
            Resolution::Unavailable => write!(f, "Unavailable"),
        }
    }
}

/// Reference to whatever client currently serves a cluster.
///
/// The handle holds a resolver, never a client: every [`resolve`] call asks
/// again, so a reconnect or leader change is seen on the next query.
///
/// [`resolve`]: BackendClientHandle::resolve
#[derive(Clone)]
pub struct BackendClientHandle {
    cluster_id: String,
    resolver: Arc<Resolver>,
}

impl BackendClientHandle {
    /// Create a handle from a resolver function
    pub fn new<F>(cluster_id: &str, resolver: F) -> Self
    where
        F: Fn() -> Option<Arc<dyn BackendClient>> + Send + Sync + 'static,
    {
        Self {
            cluster_id: cluster_id.to_string(),
            resolver: Arc::new(resolver),
        }
    }

    /// Handle that always resolves to `client`
    pub fn fixed(cluster_id: &str, client: Arc<dyn BackendClient>) -> Self {
        Self::new(cluster_id, move || Some(client.clone()))
    }

    /// Handle that never resolves
    pub fn unavailable(cluster_id: &str) -> Self {
        Self::new(cluster_id, || None)
    }

    /// Cluster this handle belongs to
    pub fn cluster_id(&self) -> &str {
        &self.cluster_id
    }

    /// Resolve the current client
    pub fn resolve(&self) -> Resolution {
        match (self.resolver)() {
            Some(client) => {
                debug!(
                    cluster = %self.cluster_id,
                    endpoint = %client.endpoint(),
                    "resolved backend client"
                );
                Resolution::Ready(client)
            }
            None => {
                debug!(cluster = %self.cluster_id, "backend client unavailable");
                Resolution::Unavailable
            }
        }
    }
}

impl fmt::Debug for BackendClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendClientHandle")
            .field("cluster_id", &self.cluster_id)
            .finish_non_exhaustive()
    }
}
