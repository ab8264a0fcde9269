//! Action policy: whether a diagnosis warrants deleting the pod now

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::classifier::Diagnosis;
use crate::error::{Error, Result};

/// Minimum restarts before a `CrashLoopBackOff` container counts as crash looping
const DEFAULT_RESTART_THRESHOLD: i32 = 3;

/// Minimum pod age before an evicted pod is cleaned up
const DEFAULT_EVICTION_GRACE_SECS: i64 = 60;

/// Policy constants handed to the dispatcher at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub restart_threshold: i32,
    pub eviction_grace_secs: i64,
    /// Delete with a zero grace period. Never set by the controller today.
    pub force_delete: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            restart_threshold: DEFAULT_RESTART_THRESHOLD,
            eviction_grace_secs: DEFAULT_EVICTION_GRACE_SECS,
            force_delete: false,
        }
    }
}

impl PolicyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.restart_threshold < 1 {
            return Err(Error::Config(format!(
                "restart threshold must be at least 1, got {}",
                self.restart_threshold
            )));
        }
        if self.eviction_grace_secs < 0 {
            return Err(Error::Config(format!(
                "eviction grace must not be negative, got {}s",
                self.eviction_grace_secs
            )));
        }
        Ok(())
    }

    pub fn eviction_grace(&self) -> Duration {
        Duration::seconds(self.eviction_grace_secs)
    }
}

/// What the dispatcher should do with a classified pod
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    ActNow,
    Skip,
}

/// Decide on a diagnosis given the pod's age.
///
/// An evicted pod with no known age is never acted on.
pub fn evaluate(diagnosis: Diagnosis, age: Option<Duration>, config: &PolicyConfig) -> Decision {
    match diagnosis {
        Diagnosis::Healthy => Decision::Skip,
        Diagnosis::CrashLooping => Decision::ActNow,
        Diagnosis::Evicted => match age {
            Some(age) if age >= config.eviction_grace() => Decision::ActNow,
            _ => Decision::Skip,
        },
    }
}
