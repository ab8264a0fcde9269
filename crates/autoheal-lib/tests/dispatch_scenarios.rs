//! End-to-end dispatch scenarios against the public pipeline API

use async_trait::async_trait;
use autoheal_lib::{
    pipeline::{classify, evaluate},
    ActionOutcome, ActionRecord, AuditSink, Decision, Diagnosis, DispatchOutcome, Dispatcher,
    PodActuator, PodSnapshot, PolicyConfig, Result, SkipReason,
};
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};

/// Actuator that records every delete request and always succeeds
#[derive(Default)]
struct RecordingActuator {
    deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl PodActuator for RecordingActuator {
    async fn delete_pod(&self, namespace: &str, name: &str, _reason: &str, _force: bool) -> Result<()> {
        self.deleted
            .lock()
            .unwrap()
            .push(format!("{}/{}", namespace, name));
        Ok(())
    }
}

/// Audit sink that keeps records in memory
#[derive(Default)]
struct MemorySink {
    records: Mutex<Vec<ActionRecord>>,
}

impl AuditSink for MemorySink {
    fn record(&self, record: &ActionRecord) {
        self.records.lock().unwrap().push(record.clone());
    }
}

struct Harness {
    dispatcher: Dispatcher,
    actuator: Arc<RecordingActuator>,
    sink: Arc<MemorySink>,
}

impl Harness {
    fn new() -> Self {
        let actuator = Arc::new(RecordingActuator::default());
        let sink = Arc::new(MemorySink::default());
        let dispatcher = Dispatcher::new(actuator.clone(), sink.clone(), PolicyConfig::default());
        Self {
            dispatcher,
            actuator,
            sink,
        }
    }

    fn records(&self) -> Vec<ActionRecord> {
        self.sink.records.lock().unwrap().clone()
    }
}

fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn evicted_job(age_secs: i64) -> PodSnapshot {
    PodSnapshot::new("ns1", "job-8")
        .with_owner("Job", "job", true)
        .with_status_reason("Evicted")
        .created_at(now() - Duration::seconds(age_secs))
}

#[tokio::test]
async fn crash_looping_replica_is_deleted_once() {
    let harness = Harness::new();
    let pod = PodSnapshot::new("ns1", "worker-1")
        .with_owner("ReplicaSet", "worker-6d4f", true)
        .with_container("app", Some("CrashLoopBackOff"), 5)
        .created_at(now() - Duration::seconds(5));

    let outcome = harness.dispatcher.dispatch_at(&pod, now()).await;

    assert!(matches!(outcome, DispatchOutcome::Acted { .. }));
    let records = harness.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].namespace, "ns1");
    assert_eq!(records[0].pod, "worker-1");
    assert_eq!(records[0].action.to_string(), "delete");
    assert_eq!(records[0].reason.as_str(), "CrashLoopBackOff");
    assert_eq!(records[0].outcome, ActionOutcome::Success);
    assert_eq!(*harness.actuator.deleted.lock().unwrap(), vec!["ns1/worker-1"]);
}

#[tokio::test]
async fn unowned_evicted_pod_is_never_touched() {
    let harness = Harness::new();
    let pod = PodSnapshot::new("ns1", "job-7")
        .with_status_reason("Evicted")
        .created_at(now() - Duration::minutes(10));

    let outcome = harness.dispatcher.dispatch_at(&pod, now()).await;

    assert_eq!(outcome, DispatchOutcome::Skipped(SkipReason::Unmanaged));
    assert!(harness.records().is_empty());
    assert!(harness.actuator.deleted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn evicted_pod_waits_out_grace_window() {
    let harness = Harness::new();

    let outcome = harness.dispatcher.dispatch_at(&evicted_job(30), now()).await;
    assert!(matches!(outcome, DispatchOutcome::Skipped(_)));
    assert!(harness.records().is_empty());

    // Same pod re-observed later
    let outcome = harness.dispatcher.dispatch_at(&evicted_job(90), now()).await;
    assert!(matches!(outcome, DispatchOutcome::Acted { .. }));

    let records = harness.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].reason, Diagnosis::Evicted);
    assert_eq!(records[0].pod, "job-8");
}

#[tokio::test]
async fn evicted_pod_at_exact_grace_boundary_is_deleted() {
    let harness = Harness::new();

    harness.dispatcher.dispatch_at(&evicted_job(59), now()).await;
    assert!(harness.records().is_empty());

    harness.dispatcher.dispatch_at(&evicted_job(60), now()).await;
    assert_eq!(harness.records().len(), 1);
}

#[tokio::test]
async fn unmanaged_pods_never_produce_records() {
    let harness = Harness::new();
    let pods = vec![
        PodSnapshot::new("ns1", "a").with_container("app", Some("CrashLoopBackOff"), 50),
        PodSnapshot::new("ns1", "b")
            .with_owner("ConfigMap", "cfg", false)
            .with_status_reason("Evicted")
            .created_at(now() - Duration::hours(1)),
        PodSnapshot::new("ns1", "c"),
    ];

    for pod in &pods {
        harness.dispatcher.dispatch_at(pod, now()).await;
    }

    assert!(harness.records().is_empty());
}

#[tokio::test]
async fn each_dispatch_writes_at_most_one_record() {
    let harness = Harness::new();
    // Both predicates hold; still a single action
    let pod = PodSnapshot::new("ns1", "worker-2")
        .with_owner("ReplicaSet", "worker-6d4f", true)
        .with_status_reason("Evicted")
        .with_container("app", Some("CrashLoopBackOff"), 3)
        .with_container("sidecar", Some("CrashLoopBackOff"), 8)
        .created_at(now() - Duration::hours(2));

    harness.dispatcher.dispatch_at(&pod, now()).await;

    let records = harness.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].reason, Diagnosis::CrashLooping);
}

#[tokio::test]
async fn concurrent_dispatches_are_independent() {
    let harness = Arc::new(Harness::new());
    let mut handles = Vec::new();

    for i in 0..8 {
        let harness = Arc::clone(&harness);
        handles.push(tokio::spawn(async move {
            let pod = PodSnapshot::new("ns1", format!("worker-{}", i))
                .with_owner("ReplicaSet", "worker-6d4f", true)
                .with_container("app", Some("CrashLoopBackOff"), 3);
            harness.dispatcher.dispatch(&pod).await
        }));
    }

    for handle in handles {
        assert!(matches!(handle.await.unwrap(), DispatchOutcome::Acted { .. }));
    }

    assert_eq!(harness.records().len(), 8);
}

#[test]
fn classification_and_policy_are_idempotent() {
    let policy = PolicyConfig::default();
    let pod = evicted_job(120);

    let first = classify(&pod, policy.restart_threshold);
    let second = classify(&pod, policy.restart_threshold);
    assert_eq!(first, second);

    let age = pod.age(now());
    assert_eq!(evaluate(first, age, &policy), Decision::ActNow);
    assert_eq!(evaluate(second, age, &policy), Decision::ActNow);
}

#[test]
fn two_restarts_is_not_a_crash_loop() {
    let pod = PodSnapshot::new("ns1", "worker-1")
        .with_owner("ReplicaSet", "worker-6d4f", true)
        .with_container("app", Some("CrashLoopBackOff"), 2);

    assert_ne!(classify(&pod, 3), Diagnosis::CrashLooping);
}
