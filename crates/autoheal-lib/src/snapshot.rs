//! Read-only pod snapshots
//!
//! A [`PodSnapshot`] is the subset of a Kubernetes `Pod` that the health
//! pipeline looks at. Conversion from the API object is total: any field the
//! API server left out becomes an empty/`None` value instead of an error, so a
//! malformed object can only ever classify as healthy.

use chrono::{DateTime, Duration, Utc};
use k8s_openapi::api::core::v1::Pod;
use serde::{Deserialize, Serialize};

/// An owner reference as seen on the pod's metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRef {
    pub kind: String,
    pub name: String,
    /// `ownerReferences[].controller`; absent is treated as false
    pub controller: Option<bool>,
}

/// Per-container status relevant to crash-loop detection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSnapshot {
    pub name: String,
    /// Reason of the current `waiting` state, if the container is waiting
    pub waiting_reason: Option<String>,
    pub restart_count: i32,
}

/// View of one pod at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodSnapshot {
    pub namespace: String,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub owners: Vec<OwnerRef>,
    pub containers: Vec<ContainerSnapshot>,
    /// Top-level `status.reason` (e.g. "Evicted")
    pub status_reason: Option<String>,
}

impl PodSnapshot {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn created_at(mut self, ts: DateTime<Utc>) -> Self {
        self.created_at = Some(ts);
        self
    }

    pub fn with_owner(mut self, kind: &str, name: &str, controller: bool) -> Self {
        self.owners.push(OwnerRef {
            kind: kind.to_string(),
            name: name.to_string(),
            controller: Some(controller),
        });
        self
    }

    pub fn with_container(
        mut self,
        name: &str,
        waiting_reason: Option<&str>,
        restart_count: i32,
    ) -> Self {
        self.containers.push(ContainerSnapshot {
            name: name.to_string(),
            waiting_reason: waiting_reason.map(str::to_string),
            restart_count,
        });
        self
    }

    pub fn with_status_reason(mut self, reason: &str) -> Self {
        self.status_reason = Some(reason.to_string());
        self
    }

    /// `namespace/name`
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    /// Time elapsed since the pod object was created, or `None` when the
    /// creation timestamp is missing
    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.created_at.map(|created| now.signed_duration_since(created))
    }
}

impl From<&Pod> for PodSnapshot {
    fn from(pod: &Pod) -> Self {
        let meta = &pod.metadata;

        let owners = meta
            .owner_references
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|o| OwnerRef {
                kind: o.kind.clone(),
                name: o.name.clone(),
                controller: o.controller,
            })
            .collect();

        let status = pod.status.as_ref();

        let containers = status
            .and_then(|s| s.container_statuses.as_deref())
            .unwrap_or_default()
            .iter()
            .map(|cs| ContainerSnapshot {
                name: cs.name.clone(),
                waiting_reason: cs
                    .state
                    .as_ref()
                    .and_then(|state| state.waiting.as_ref())
                    .and_then(|waiting| waiting.reason.clone()),
                restart_count: cs.restart_count,
            })
            .collect();

        Self {
            namespace: meta.namespace.clone().unwrap_or_default(),
            name: meta.name.clone().unwrap_or_default(),
            created_at: meta.creation_timestamp.as_ref().map(|t| t.0),
            owners,
            containers,
            status_reason: status.and_then(|s| s.reason.clone()),
        }
    }
}

impl From<Pod> for PodSnapshot {
    fn from(pod: Pod) -> Self {
        PodSnapshot::from(&pod)
    }
}
