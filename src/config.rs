//! Configuration file loading
//!
//! The config names every cluster, its declared backend kind and,
//! optionally, a JSON snapshot served as that cluster's backend.

use crate::backend::{ClientPool, StaticBackend};
use crate::error::{ClumanError, Result};
use crate::facade::FleetOptions;
use crate::registry::StaticDirectory;
use crate::util::ident::match_az09_hyp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Environment variable overriding the config location
pub const CONFIG_ENV: &str = "CLUMAN_CONFIG";

/// Config file name inside the user config directory
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Fleet query settings
    pub aggregation: AggregationSettings,

    /// Cluster id → cluster entry
    pub clusters: BTreeMap<String, ClusterEntry>,
}

/// Fleet query settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationSettings {
    /// Clusters queried concurrently
    pub concurrency_limit: usize,

    /// Deadline for each backend call, in milliseconds
    pub query_timeout_ms: u64,
}

impl Default for AggregationSettings {
    fn default() -> Self {
        Self {
            concurrency_limit: 8,
            query_timeout_ms: 5000,
        }
    }
}

impl AggregationSettings {
    pub fn fleet_options(&self) -> FleetOptions {
        FleetOptions {
            concurrency_limit: self.concurrency_limit,
            query_timeout: Duration::from_millis(self.query_timeout_ms),
        }
    }
}

/// One configured cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterEntry {
    /// Declared backend kind, interpreted by the registry
    pub kind: String,

    /// Snapshot file served as this cluster's backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<PathBuf>,
}

impl AppConfig {
    /// Default config location: `$CLUMAN_CONFIG`, else the user config dir
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("cluman").join(DEFAULT_CONFIG_FILE))
    }

    /// Parse and validate a config file
    pub fn parse_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClumanError::ConfigParse(format!("Failed to read file: {}", e)))?;

        let mut config = Self::parse_str(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_snapshots(base);
        }
        debug!(path = %path.display(), clusters = config.clusters.len(), "loaded config");
        Ok(config)
    }

    /// Parse and validate config text
    pub fn parse_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| ClumanError::ConfigParse(format!("Failed to parse YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check limits and cluster ids
    pub fn validate(&self) -> Result<()> {
        if self.aggregation.concurrency_limit == 0 {
            return Err(ClumanError::InvalidConfig(
                "aggregation.concurrency_limit must be at least 1".to_string(),
            ));
        }
        if self.aggregation.query_timeout_ms == 0 {
            return Err(ClumanError::InvalidConfig(
                "aggregation.query_timeout_ms must be positive".to_string(),
            ));
        }
        for (id, entry) in &self.clusters {
            if id.is_empty() || !match_az09_hyp(id) {
                return Err(ClumanError::InvalidConfig(format!(
                    "cluster id '{}' may only contain letters, digits and '-'",
                    id
                )));
            }
            if entry.kind.trim().is_empty() {
                return Err(ClumanError::InvalidConfig(format!(
                    "cluster '{}' has no kind",
                    id
                )));
            }
        }
        Ok(())
    }

    fn resolve_snapshots(&mut self, base: &Path) {
        for entry in self.clusters.values_mut() {
            if let Some(snapshot) = entry.snapshot.as_mut() {
                if snapshot.is_relative() {
                    *snapshot = base.join(&*snapshot);
                }
            }
        }
    }

    /// Directory of the configured clusters
    pub fn directory(&self) -> StaticDirectory {
        self.clusters
            .iter()
            .map(|(id, entry)| (id.as_str(), entry.kind.as_str()))
            .collect()
    }

    /// Pool with a static backend for every cluster that names a snapshot.
    ///
    /// A snapshot that cannot be loaded leaves its cluster disconnected so it
    /// reports as unavailable instead of failing the whole load.
    pub fn client_pool(&self) -> Result<ClientPool> {
        let pool = ClientPool::new();
        for (id, entry) in &self.clusters {
            let Some(path) = &entry.snapshot else {
                continue;
            };
            match StaticBackend::from_file(path) {
                Ok(backend) => {
                    pool.connect(id, Arc::new(backend))?;
                }
                Err(e) => {
                    warn!(cluster = %id, path = %path.display(), error = %e, "failed to load snapshot");
                }
            }
        }
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ClusterDirectory;
    use std::io::Write;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
aggregation:
  concurrency_limit: 4
  query_timeout_ms: 1500
clusters:
  prod-east:
    kind: swarm-mode
    snapshot: east.json
  legacy:
    kind: classic-engine
"#;

    #[test]
    fn test_parse_sample() {
        let config = AppConfig::parse_str(SAMPLE).unwrap();

        assert_eq!(config.aggregation.concurrency_limit, 4);
        assert_eq!(
            config.aggregation.fleet_options().query_timeout,
            Duration::from_millis(1500)
        );
        assert_eq!(config.clusters.len(), 2);
        assert_eq!(config.clusters["legacy"].kind, "classic-engine");
        assert_eq!(config.clusters["legacy"].snapshot, None);
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::parse_str("clusters: {}").unwrap();
        assert_eq!(config.aggregation, AggregationSettings::default());
        assert!(config.clusters.is_empty());
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let err = AppConfig::parse_str("aggregation:\n  concurrency_limit: 0\n").unwrap_err();
        assert!(matches!(err, ClumanError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = AppConfig::parse_str("aggregation:\n  query_timeout_ms: 0\n").unwrap_err();
        assert!(matches!(err, ClumanError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_unsafe_cluster_id() {
        let err = AppConfig::parse_str("clusters:\n  \"east/1\":\n    kind: swarm-mode\n").unwrap_err();
        assert!(matches!(err, ClumanError::InvalidConfig(msg) if msg.contains("east/1")));
    }

    #[test]
    fn test_unknown_kind_is_accepted_at_load() {
        let config = AppConfig::parse_str("clusters:\n  c1:\n    kind: nonexistent\n").unwrap();
        assert_eq!(
            config.directory().backend_kind("c1").as_deref(),
            Some("nonexistent")
        );
    }

    #[test]
    fn test_malformed_yaml() {
        let err = AppConfig::parse_str("clusters: [").unwrap_err();
        assert!(matches!(err, ClumanError::ConfigParse(_)));
    }

    #[test]
    fn test_parse_file_resolves_snapshots() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.yaml");
        std::fs::write(&config_path, SAMPLE).unwrap();

        let mut snapshot = std::fs::File::create(dir.path().join("east.json")).unwrap();
        writeln!(
            snapshot,
            r#"{{"services": [{{"id": "s1", "spec": {{"name": "web"}}}}], "tasks": []}}"#
        )
        .unwrap();

        let config = AppConfig::parse_file(&config_path).unwrap();
        assert_eq!(
            config.clusters["prod-east"].snapshot.as_deref(),
            Some(dir.path().join("east.json").as_path())
        );

        let pool = config.client_pool().unwrap();
        assert!(pool.is_connected("prod-east"));
        assert!(!pool.is_connected("legacy"));
    }

    #[test]
    fn test_missing_snapshot_leaves_cluster_disconnected() {
        let config = AppConfig::parse_str(
            "clusters:\n  east:\n    kind: swarm-mode\n    snapshot: /nonexistent/east.json\n",
        )
        .unwrap();

        let pool = config.client_pool().unwrap();
        assert!(!pool.is_connected("east"));
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::parse_file(Path::new("/nonexistent/cluman.yaml")).unwrap_err();
        assert!(matches!(err, ClumanError::ConfigParse(_)));
    }
}
