//! Ownership guard
//!
//! Bare pods have nothing to recreate them, so deleting one is permanent.
//! Only pods with a controller owner are ever eligible for action.

use crate::snapshot::PodSnapshot;

/// True iff at least one owner reference is flagged `controller: true`
pub fn has_controller_owner(pod: &PodSnapshot) -> bool {
    pod.owners.iter().any(|o| o.controller == Some(true))
}
