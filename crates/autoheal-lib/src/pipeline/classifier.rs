//! Health classification of a single pod snapshot

use serde::{Deserialize, Serialize};

use crate::snapshot::PodSnapshot;

/// Waiting reason reported by the kubelet for a container in restart backoff
pub const CRASH_LOOP_REASON: &str = "CrashLoopBackOff";

/// Pod-level status reason set when the kubelet evicts a pod
pub const EVICTED_REASON: &str = "Evicted";

/// Outcome of classifying one pod
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Diagnosis {
    Healthy,
    #[serde(rename = "CrashLoopBackOff")]
    CrashLooping,
    Evicted,
}

impl Diagnosis {
    /// Name used as the `reason` of audit records
    pub fn as_str(&self) -> &'static str {
        match self {
            Diagnosis::Healthy => "Healthy",
            Diagnosis::CrashLooping => CRASH_LOOP_REASON,
            Diagnosis::Evicted => EVICTED_REASON,
        }
    }
}

impl std::fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any container waiting in `CrashLoopBackOff` with at least `restart_threshold` restarts
pub fn is_crash_looping(pod: &PodSnapshot, restart_threshold: i32) -> bool {
    pod.containers.iter().any(|cs| {
        cs.waiting_reason.as_deref() == Some(CRASH_LOOP_REASON)
            && cs.restart_count >= restart_threshold
    })
}

pub fn is_evicted(pod: &PodSnapshot) -> bool {
    pod.status_reason.as_deref() == Some(EVICTED_REASON)
}

/// Classify a pod. Crash looping is checked before eviction.
pub fn classify(pod: &PodSnapshot, restart_threshold: i32) -> Diagnosis {
    if is_crash_looping(pod, restart_threshold) {
        Diagnosis::CrashLooping
    } else if is_evicted(pod) {
        Diagnosis::Evicted
    } else {
        Diagnosis::Healthy
    }
}
