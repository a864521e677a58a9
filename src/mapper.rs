//! Backend record → canonical model translation
//!
//! Pure functions: no I/O, no shared state, and total over every record
//! a backend can produce. Anything that cannot be carried over as-is is
//! replaced by a safe default and reported as a [`MappingAnomaly`].

use crate::backend::{BackendKind, BackendServiceRecord, BackendTaskRecord};
use crate::model::{AnomalyKind, ContainerService, ContainerStatus, DockerContainer, MappingAnomaly};
use crate::util::ident::{after_last, is_safe_identifier};
use std::collections::HashMap;
use tracing::warn;

/// A mapped value and what had to be patched to produce it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapped<T> {
    pub value: T,
    pub anomalies: Vec<MappingAnomaly>,
}

/// Map a raw engine state to the canonical status set.
///
/// Covers the task vocabulary of swarm-mode engines and the container
/// vocabulary of classic engines. Returns `None` for anything else.
pub fn map_status(raw: &str) -> Option<ContainerStatus> {
    let status = match raw.trim().to_ascii_lowercase().as_str() {
        "new" | "pending" | "assigned" | "accepted" | "preparing" | "ready" | "starting"
        | "created" => ContainerStatus::Created,
        "running" | "restarting" => ContainerStatus::Running,
        "paused" => ContainerStatus::Paused,
        "complete" | "shutdown" | "failed" | "rejected" | "remove" | "orphaned" | "exited"
        | "dead" | "removing" => ContainerStatus::Exited,
        _ => return None,
    };
    Some(status)
}

/// Translate a backend service record
pub fn map_service(record: &BackendServiceRecord, backend: BackendKind) -> Mapped<ContainerService> {
    let mut anomalies = Vec::new();

    let spec_labels = record
        .spec
        .task_template
        .container_spec
        .as_ref()
        .map(|c| &c.labels);
    let labels = sanitize_labels(
        &record.id,
        spec_labels.into_iter().flatten().chain(&record.spec.labels),
        &mut anomalies,
    );

    let (desired_replicas, current_replicas) = if backend.supports_replication() {
        let desired = record
            .spec
            .mode
            .as_ref()
            .and_then(|m| m.desired_replicas())
            .or_else(|| record.service_status.as_ref().map(|s| s.desired_tasks));
        let current = record.service_status.as_ref().map(|s| s.running_tasks);
        (desired, current)
    } else {
        (None, None)
    };

    let name = if record.spec.name.is_empty() {
        record.id.clone()
    } else {
        record.spec.name.clone()
    };

    Mapped {
        value: ContainerService {
            id: record.id.clone(),
            name,
            desired_replicas,
            current_replicas,
            image: record.image().unwrap_or_default().to_string(),
            labels,
            backend,
        },
        anomalies,
    }
}

/// Translate a backend task (or standalone container) record
pub fn map_container(record: &BackendTaskRecord, backend: BackendKind) -> Mapped<DockerContainer> {
    let mut anomalies = Vec::new();

    let status = match map_status(&record.status.state) {
        Some(status) => status,
        None => {
            warn!(
                record = %record.id,
                state = %record.status.state,
                "unrecognized container state, reporting unknown"
            );
            anomalies.push(MappingAnomaly::new(
                &record.id,
                AnomalyKind::UnknownStatus(record.status.state.clone()),
            ));
            ContainerStatus::Unknown
        }
    };

    let spec_labels = record.spec.container_spec.as_ref().map(|c| &c.labels);
    let labels = sanitize_labels(
        &record.id,
        spec_labels.into_iter().flatten().chain(&record.labels),
        &mut anomalies,
    );

    let container_id = record
        .status
        .container_status
        .as_ref()
        .map(|c| c.container_id.as_str())
        .filter(|id| !id.is_empty());
    let (id, task_id) = match backend {
        BackendKind::ClassicEngine => (record.id.clone(), None),
        _ => (
            container_id.unwrap_or(&record.id).to_string(),
            Some(record.id.clone()),
        ),
    };

    let image = record
        .spec
        .container_spec
        .as_ref()
        .map(|c| c.image.clone())
        .unwrap_or_default();

    Mapped {
        value: DockerContainer {
            id,
            name: container_name(record, backend),
            task_id,
            service_id: non_empty(&record.service_id),
            node_id: non_empty(&record.node_id),
            status,
            image,
            labels,
            backend,
        },
        anomalies,
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

/// Classic engines report names as `/node/name` (or `/name`); keep the last
/// segment
fn container_name(record: &BackendTaskRecord, backend: BackendKind) -> Option<String> {
    let name = record.name.as_deref()?;
    let name = match backend {
        BackendKind::ClassicEngine => after_last(name, '/').unwrap_or(name),
        _ => name,
    };
    (!name.is_empty()).then(|| name.to_string())
}

/// Copy labels, later sources overriding earlier ones, dropping unsafe keys
fn sanitize_labels<'a>(
    record_id: &str,
    labels: impl Iterator<Item = (&'a String, &'a String)>,
    anomalies: &mut Vec<MappingAnomaly>,
) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for (key, value) in labels {
        if is_safe_identifier(key) {
            out.insert(key.clone(), value.clone());
            continue;
        }
        let already_reported = anomalies
            .iter()
            .any(|a| a.kind == AnomalyKind::UnsafeLabelKey(key.clone()));
        if !already_reported {
            warn!(record = %record_id, key = %key, "dropping label with unsafe key");
            anomalies.push(MappingAnomaly::new(
                record_id,
                AnomalyKind::UnsafeLabelKey(key.clone()),
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::records::{ContainerSpec, ServiceMode};

    #[test]
    fn test_status_vocabulary() {
        assert_eq!(map_status("pending"), Some(ContainerStatus::Created));
        assert_eq!(map_status("created"), Some(ContainerStatus::Created));
        assert_eq!(map_status("RUNNING"), Some(ContainerStatus::Running));
        assert_eq!(map_status("restarting"), Some(ContainerStatus::Running));
        assert_eq!(map_status("paused"), Some(ContainerStatus::Paused));
        assert_eq!(map_status("complete"), Some(ContainerStatus::Exited));
        assert_eq!(map_status("dead"), Some(ContainerStatus::Exited));
        assert_eq!(map_status("hibernating"), None);
        assert_eq!(map_status(""), None);
    }

    #[test]
    fn test_map_replicated_service() {
        let record = BackendServiceRecord::replicated("s1", "web", "nginx:1.25", 3)
            .label("com.docker.stack.namespace", "shop")
            .status(2, 3);

        let mapped = map_service(&record, BackendKind::SwarmMode);
        let service = mapped.value;

        assert!(mapped.anomalies.is_empty());
        assert_eq!(service.id, "s1");
        assert_eq!(service.name, "web");
        assert_eq!(service.image, "nginx:1.25");
        assert_eq!(service.desired_replicas, Some(3));
        assert_eq!(service.current_replicas, Some(2));
        assert!(service.is_converging());
        assert_eq!(service.labels["com.docker.stack.namespace"], "shop");
        assert_eq!(service.backend, BackendKind::SwarmMode);
    }

    #[test]
    fn test_global_service_uses_reported_counts() {
        let record = BackendServiceRecord::global("s2", "agent", "agent:1").status(4, 5);
        let service = map_service(&record, BackendKind::SwarmMode).value;
        assert_eq!(service.desired_replicas, Some(5));
        assert_eq!(service.current_replicas, Some(4));

        let bare = BackendServiceRecord::global("s3", "agent", "agent:1");
        let service = map_service(&bare, BackendKind::SwarmMode).value;
        assert_eq!(service.desired_replicas, None);
        assert_eq!(service.current_replicas, None);
    }

    #[test]
    fn test_classic_engine_has_no_replicas() {
        let record = BackendServiceRecord::replicated("s1", "web", "nginx", 3).status(3, 3);
        let service = map_service(&record, BackendKind::ClassicEngine).value;
        assert_eq!(service.desired_replicas, None);
        assert_eq!(service.current_replicas, None);
    }

    #[test]
    fn test_service_label_precedence() {
        let mut record = BackendServiceRecord::replicated("s1", "web", "nginx", 1).label("tier", "front");
        record.spec.task_template.container_spec = Some(ContainerSpec {
            image: "nginx".to_string(),
            labels: HashMap::from([
                ("tier".to_string(), "spec".to_string()),
                ("team".to_string(), "ops".to_string()),
            ]),
            hostname: None,
        });

        let service = map_service(&record, BackendKind::SwarmMode).value;
        assert_eq!(service.labels["tier"], "front");
        assert_eq!(service.labels["team"], "ops");
    }

    #[test]
    fn test_unsafe_label_dropped() {
        let record = BackendServiceRecord::replicated("s1", "web", "nginx", 1)
            .label("good.key", "1")
            .label("bad key", "2")
            .label("other", "3");

        let mapped = map_service(&record, BackendKind::SwarmMode);

        assert_eq!(mapped.value.labels.len(), 2);
        assert!(!mapped.value.labels.contains_key("bad key"));
        assert_eq!(
            mapped.anomalies,
            vec![MappingAnomaly::new(
                "s1",
                AnomalyKind::UnsafeLabelKey("bad key".to_string())
            )]
        );
    }

    #[test]
    fn test_map_task() {
        let record = BackendTaskRecord::new("t1", "running")
            .for_service("s1")
            .on_node("n1")
            .image("nginx:1.25")
            .container("c1")
            .label("slot", "1");

        let mapped = map_container(&record, BackendKind::SwarmMode);
        let container = mapped.value;

        assert!(mapped.anomalies.is_empty());
        assert_eq!(container.id, "c1");
        assert_eq!(container.task_id.as_deref(), Some("t1"));
        assert_eq!(container.service_id.as_deref(), Some("s1"));
        assert_eq!(container.node_id.as_deref(), Some("n1"));
        assert_eq!(container.status, ContainerStatus::Running);
        assert_eq!(container.image, "nginx:1.25");
        assert_eq!(container.labels["slot"], "1");
    }

    #[test]
    fn test_task_without_container_uses_task_id() {
        let record = BackendTaskRecord::new("t9", "pending").for_service("s1");
        let container = map_container(&record, BackendKind::SwarmMode).value;
        assert_eq!(container.id, "t9");
        assert_eq!(container.status, ContainerStatus::Created);
        assert_eq!(container.image, "");
    }

    #[test]
    fn test_classic_container_is_standalone() {
        let mut record = BackendTaskRecord::new("abc123", "exited").on_node("host-1");
        record.name = Some("db".to_string());
        record.service_id = Some(String::new());

        let container = map_container(&record, BackendKind::ClassicEngine).value;
        assert_eq!(container.id, "abc123");
        assert_eq!(container.task_id, None);
        assert_eq!(container.name.as_deref(), Some("db"));
        assert_eq!(container.service_id, None);
        assert!(!container.is_managed());
        assert_eq!(container.status, ContainerStatus::Exited);
    }

    #[test]
    fn test_unknown_status_is_anomaly() {
        let record = BackendTaskRecord::new("t1", "hibernating").label("ok", "1");
        let mapped = map_container(&record, BackendKind::SwarmMode);

        assert_eq!(mapped.value.status, ContainerStatus::Unknown);
        assert_eq!(mapped.value.labels.len(), 1);
        assert_eq!(
            mapped.anomalies,
            vec![MappingAnomaly::new(
                "t1",
                AnomalyKind::UnknownStatus("hibernating".to_string())
            )]
        );
    }

    #[test]
    fn test_empty_records_map() {
        let service = map_service(&BackendServiceRecord::default(), BackendKind::SwarmMode);
        assert_eq!(service.value.name, "");
        assert_eq!(service.value.desired_replicas, None);

        let container = map_container(&BackendTaskRecord::default(), BackendKind::SwarmMode);
        assert_eq!(container.value.status, ContainerStatus::Unknown);
        assert_eq!(container.anomalies.len(), 1);
    }

    #[test]
    fn test_replicated_job_desired() {
        let mut record = BackendServiceRecord::replicated("s1", "batch", "job:1", 0);
        record.spec.mode = Some(ServiceMode::ReplicatedJob {
            max_concurrent: 2,
            total_completions: 6,
        });
        let service = map_service(&record, BackendKind::SwarmMode).value;
        assert_eq!(service.desired_replicas, Some(6));
    }

    #[test]
    fn test_classic_name_drops_node_prefix() {
        let mut record = BackendTaskRecord::new("abc123", "running");
        record.name = Some("/host-1/web".to_string());
        let container = map_container(&record, BackendKind::ClassicEngine).value;
        assert_eq!(container.name.as_deref(), Some("web"));

        record.name = Some("/db".to_string());
        let container = map_container(&record, BackendKind::ClassicEngine).value;
        assert_eq!(container.name.as_deref(), Some("db"));

        record.name = Some("host-1/".to_string());
        let container = map_container(&record, BackendKind::ClassicEngine).value;
        assert_eq!(container.name, None);
    }

    #[test]
    fn test_swarm_task_name_kept_verbatim() {
        let mut record = BackendTaskRecord::new("t1", "running");
        record.name = Some("shop/web.1".to_string());
        let container = map_container(&record, BackendKind::SwarmMode).value;
        assert_eq!(container.name.as_deref(), Some("shop/web.1"));
    }

    #[test]
    fn test_container_unsafe_label_dropped() {
        let record = BackendTaskRecord::new("t1", "running")
            .label("ok", "1")
            .label("bad key", "2");

        let mapped = map_container(&record, BackendKind::SwarmMode);

        assert_eq!(
            mapped.value.labels,
            HashMap::from([("ok".to_string(), "1".to_string())])
        );
        assert_eq!(
            mapped.anomalies,
            vec![MappingAnomaly::new(
                "t1",
                AnomalyKind::UnsafeLabelKey("bad key".to_string())
            )]
        );
    }
}
