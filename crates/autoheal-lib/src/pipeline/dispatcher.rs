//! Reconcile dispatcher
//!
//! Runs one pod snapshot through guard, classifier and policy, and when the
//! policy says so, through the actuator and the audit sink. Holds no per-pod
//! state: every call starts from scratch, so calls for different pods can run
//! concurrently.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::debug;

use super::classifier::{classify, Diagnosis};
use super::guard::has_controller_owner;
use super::policy::{evaluate, Decision, PolicyConfig};
use crate::actuator::PodActuator;
use crate::audit::{ActionRecord, AuditSink};
use crate::snapshot::PodSnapshot;

/// Why a dispatch ended without an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No owner reference with `controller: true`
    Unmanaged,
    Healthy,
    /// Diagnosed, but the policy declined to act yet
    Deferred(Diagnosis),
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Unmanaged => "unmanaged",
            SkipReason::Healthy => "healthy",
            SkipReason::Deferred(_) => "deferred",
        }
    }
}

/// Terminal state of one dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// No action taken and no audit record written
    Skipped(SkipReason),
    /// An action was attempted
    Acted {
        /// The record that was written
        record: ActionRecord,
        /// Time spent in the actuator call alone
        delete_latency: Duration,
    },
}

pub struct Dispatcher {
    actuator: Arc<dyn PodActuator>,
    audit: Arc<dyn AuditSink>,
    policy: PolicyConfig,
}

impl Dispatcher {
    pub fn new(
        actuator: Arc<dyn PodActuator>,
        audit: Arc<dyn AuditSink>,
        policy: PolicyConfig,
    ) -> Self {
        Self {
            actuator,
            audit,
            policy,
        }
    }

    /// Dispatch a pod snapshot observed now
    pub async fn dispatch(&self, pod: &PodSnapshot) -> DispatchOutcome {
        self.dispatch_at(pod, Utc::now()).await
    }

    /// Dispatch a pod snapshot, computing its age relative to `now`
    pub async fn dispatch_at(&self, pod: &PodSnapshot, now: DateTime<Utc>) -> DispatchOutcome {
        if !has_controller_owner(pod) {
            return DispatchOutcome::Skipped(SkipReason::Unmanaged);
        }

        let diagnosis = classify(pod, self.policy.restart_threshold);

        match evaluate(diagnosis, pod.age(now), &self.policy) {
            Decision::Skip if diagnosis == Diagnosis::Healthy => {
                DispatchOutcome::Skipped(SkipReason::Healthy)
            }
            Decision::Skip => {
                debug!(
                    namespace = %pod.namespace,
                    pod = %pod.name,
                    reason = %diagnosis,
                    "Within grace window, deferring action"
                );
                DispatchOutcome::Skipped(SkipReason::Deferred(diagnosis))
            }
            Decision::ActNow => self.act(pod, diagnosis).await,
        }
    }

    async fn act(&self, pod: &PodSnapshot, diagnosis: Diagnosis) -> DispatchOutcome {
        let start = Instant::now();
        let result = self
            .actuator
            .delete_pod(
                &pod.namespace,
                &pod.name,
                diagnosis.as_str(),
                self.policy.force_delete,
            )
            .await;
        let delete_latency = start.elapsed();

        let record = match result {
            Ok(()) => ActionRecord::success(&pod.namespace, &pod.name, diagnosis),
            Err(e) => {
                ActionRecord::failure(&pod.namespace, &pod.name, diagnosis, e.audit_message())
            }
        };

        self.audit.record(&record);
        DispatchOutcome::Acted {
            record,
            delete_latency,
        }
    }
}
