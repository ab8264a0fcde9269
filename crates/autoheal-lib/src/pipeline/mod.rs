//! The reconcile pipeline
//!
//! Each observed pod runs through:
//! - Ownership guard (is the pod controller-managed?)
//! - Health classification (healthy / crash-looping / evicted)
//! - Action policy (act now or skip)
//! - Corrective actuator and audit record, via the [`Dispatcher`]

mod classifier;
mod dispatcher;
mod guard;
mod policy;

pub use classifier::{
    classify, is_crash_looping, is_evicted, Diagnosis, CRASH_LOOP_REASON, EVICTED_REASON,
};
pub use dispatcher::{DispatchOutcome, Dispatcher, SkipReason};
pub use guard::has_controller_owner;
pub use policy::{evaluate, Decision, PolicyConfig};
