//! Autoheal library
//!
//! This crate provides the pieces of the pod self-healing controller:
//! - Pod snapshots and the reconcile pipeline (guard, classifier, policy, dispatcher)
//! - The corrective actuator and the audit trail
//! - The cluster-wide pod watch and the loop that drives it
//! - Health checks and observability

pub mod actuator;
pub mod audit;
pub mod error;
pub mod health;
pub mod observability;
pub mod pipeline;
pub mod snapshot;
pub mod watch;

pub use actuator::{DryRunActuator, KubeActuator, PodActuator};
pub use audit::{ActionKind, ActionOutcome, ActionRecord, AuditSink, TracingAuditLogger};
pub use error::{Error, Result};
pub use health::{ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse};
pub use observability::{ControllerMetrics, StructuredLogger};
pub use pipeline::{Decision, Diagnosis, DispatchOutcome, Dispatcher, PolicyConfig, SkipReason};
pub use snapshot::{ContainerSnapshot, OwnerRef, PodSnapshot};
pub use watch::{PodEvent, WatchLoop};
