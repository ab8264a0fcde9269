//! Audit trail of corrective actions
//!
//! Every attempted action produces exactly one [`ActionRecord`], whether the
//! cluster accepted it or not. Records are write-once and go to the process
//! log stream as structured JSON lines.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::pipeline::Diagnosis;

/// Value of the `event` field on every audit line
pub const ACTION_EVENT: &str = "action";

/// Tracing target of audit lines; log filters keep it at `info`
pub const AUDIT_TARGET: &str = "autoheal::audit";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Delete,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionKind::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionOutcome {
    Success,
    Failure,
}

impl std::fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionOutcome::Success => write!(f, "success"),
            ActionOutcome::Failure => write!(f, "failure"),
        }
    }
}

/// One attempted action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub ts: DateTime<Utc>,
    pub namespace: String,
    pub pod: String,
    pub action: ActionKind,
    pub reason: Diagnosis,
    pub outcome: ActionOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionRecord {
    pub fn success(namespace: &str, pod: &str, reason: Diagnosis) -> Self {
        Self {
            ts: Utc::now(),
            namespace: namespace.to_string(),
            pod: pod.to_string(),
            action: ActionKind::Delete,
            reason,
            outcome: ActionOutcome::Success,
            error: None,
        }
    }

    pub fn failure(namespace: &str, pod: &str, reason: Diagnosis, error: impl Into<String>) -> Self {
        Self {
            outcome: ActionOutcome::Failure,
            error: Some(error.into()),
            ..Self::success(namespace, pod, reason)
        }
    }

    /// RFC3339 UTC timestamp with second precision
    pub fn timestamp(&self) -> String {
        self.ts.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn is_success(&self) -> bool {
        self.outcome == ActionOutcome::Success
    }
}

/// Destination for action records. Implementations must not fail or panic:
/// by the time a record is written the action has already happened.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: &ActionRecord);
}

/// Writes action records through `tracing`, one event per record
#[derive(Debug, Clone, Default)]
pub struct TracingAuditLogger;

impl AuditSink for TracingAuditLogger {
    fn record(&self, record: &ActionRecord) {
        match record.outcome {
            ActionOutcome::Success => {
                info!(
                    target: AUDIT_TARGET,
                    event = ACTION_EVENT,
                    ts = %record.timestamp(),
                    namespace = %record.namespace,
                    pod = %record.pod,
                    action = %record.action,
                    reason = %record.reason,
                    outcome = %record.outcome,
                    "Pod action succeeded"
                );
            }
            ActionOutcome::Failure => {
                warn!(
                    target: AUDIT_TARGET,
                    event = ACTION_EVENT,
                    ts = %record.timestamp(),
                    namespace = %record.namespace,
                    pod = %record.pod,
                    action = %record.action,
                    reason = %record.reason,
                    outcome = %record.outcome,
                    error = %record.error.as_deref().unwrap_or_default(),
                    "Pod action failed"
                );
            }
        }
    }
}
