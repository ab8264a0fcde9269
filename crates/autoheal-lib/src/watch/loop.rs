//! Watch loop
//!
//! Feeds pod events into the dispatcher with bounded concurrency and keeps
//! metrics and component health up to date from the dispatch outcomes.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::PodEvent;
use crate::error::Result;
use crate::health::{components, HealthRegistry};
use crate::observability::{ControllerMetrics, StructuredLogger};
use crate::pipeline::{DispatchOutcome, Dispatcher};

/// Default upper bound on dispatches in flight at once
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

pub struct WatchLoop {
    dispatcher: Arc<Dispatcher>,
    metrics: ControllerMetrics,
    health: HealthRegistry,
    logger: StructuredLogger,
    max_concurrency: usize,
}

impl WatchLoop {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        metrics: ControllerMetrics,
        health: HealthRegistry,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            dispatcher,
            metrics,
            health,
            logger,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    pub fn max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit.max(1);
        self
    }

    /// Consume `events` until the stream ends or `shutdown` fires.
    ///
    /// In-flight deletions are dropped on shutdown without rollback.
    pub async fn run<S>(self, events: S, mut shutdown: broadcast::Receiver<()>)
    where
        S: Stream<Item = Result<PodEvent>> + Send,
    {
        info!(
            max_concurrency = self.max_concurrency,
            "Starting pod watch loop"
        );

        let limit = self.max_concurrency;
        let health = self.health.clone();
        let this = Arc::new(self);
        let work = events.for_each_concurrent(limit, move |event| {
            let this = Arc::clone(&this);
            async move { this.handle(event).await }
        });

        tokio::select! {
            _ = work => {
                warn!("Pod event stream ended");
                health
                    .set_unhealthy(components::WATCHER, "Pod event stream ended")
                    .await;
            }
            _ = shutdown.recv() => {
                info!("Shutting down pod watch loop");
            }
        }
    }

    async fn handle(&self, event: Result<PodEvent>) {
        match event {
            Ok(PodEvent::Applied(pod)) => {
                self.metrics.inc_pod_events();
                self.health.set_healthy(components::WATCHER).await;

                match self.dispatcher.dispatch(&pod).await {
                    DispatchOutcome::Skipped(reason) => {
                        self.metrics.inc_skipped(reason.as_str());
                    }
                    DispatchOutcome::Acted {
                        record,
                        delete_latency,
                    } => {
                        self.metrics
                            .observe_delete_latency(delete_latency.as_secs_f64());
                        self.metrics
                            .inc_actions(record.reason.as_str(), &record.outcome.to_string());

                        if record.is_success() {
                            self.health.set_healthy(components::ACTUATOR).await;
                        } else {
                            self.health
                                .set_degraded(
                                    components::ACTUATOR,
                                    format!("Delete of {}/{} failed", record.namespace, record.pod),
                                )
                                .await;
                        }
                    }
                }
            }
            Ok(PodEvent::Deleted { namespace, name }) => {
                debug!(namespace = %namespace, pod = %name, "Pod deleted");
            }
            Err(e) => {
                self.metrics.inc_watch_errors();
                self.logger.log_watch_error(&e.to_string());
                self.health
                    .set_degraded(components::WATCHER, e.to_string())
                    .await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::PodActuator;
    use crate::audit::TracingAuditLogger;
    use crate::error::Error;
    use crate::health::ComponentStatus;
    use crate::pipeline::PolicyConfig;
    use crate::snapshot::PodSnapshot;
    use async_trait::async_trait;
    use futures::stream;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock actuator for testing
    struct MockActuator {
        call_count: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl PodActuator for MockActuator {
        async fn delete_pod(&self, _: &str, _: &str, _: &str, _: bool) -> Result<()> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(Error::Config("api unavailable".to_string()))
            } else {
                Ok(())
            }
        }
    }

    async fn setup(fail: bool) -> (WatchLoop, Arc<MockActuator>, HealthRegistry) {
        let actuator = Arc::new(MockActuator {
            call_count: AtomicUsize::new(0),
            fail,
        });
        let dispatcher = Arc::new(Dispatcher::new(
            actuator.clone(),
            Arc::new(TracingAuditLogger),
            PolicyConfig::default(),
        ));
        let health = HealthRegistry::new();
        health.register(components::WATCHER).await;
        health.register(components::ACTUATOR).await;

        let watch_loop = WatchLoop::new(
            dispatcher,
            ControllerMetrics::new(),
            health.clone(),
            StructuredLogger::new("test-controller"),
        )
        .max_concurrency(4);

        (watch_loop, actuator, health)
    }

    fn crash_looping(name: &str) -> PodEvent {
        PodEvent::Applied(
            PodSnapshot::new("ns1", name)
                .with_owner("ReplicaSet", "worker-6d4f", true)
                .with_container("app", Some("CrashLoopBackOff"), 5),
        )
    }

    #[tokio::test]
    async fn test_loop_dispatches_every_event() {
        let (watch_loop, actuator, _health) = setup(false).await;
        let (_tx, rx) = broadcast::channel(1);

        let events = stream::iter(vec![
            Ok(crash_looping("worker-1")),
            Ok(crash_looping("worker-2")),
            Ok(PodEvent::Applied(PodSnapshot::new("ns1", "bare"))),
            Ok(PodEvent::Deleted {
                namespace: "ns1".to_string(),
                name: "worker-0".to_string(),
            }),
        ]);

        watch_loop.run(events, rx).await;

        assert_eq!(actuator.call_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_delete_degrades_actuator() {
        let (watch_loop, _actuator, health) = setup(true).await;
        let (_tx, rx) = broadcast::channel(1);

        watch_loop
            .run(stream::iter(vec![Ok(crash_looping("worker-1"))]), rx)
            .await;

        let status = health.health().await;
        assert_eq!(
            status.components[components::ACTUATOR].status,
            ComponentStatus::Degraded
        );
    }

    #[tokio::test]
    async fn test_watch_recovers_after_next_event() {
        let (watch_loop, _actuator, health) = setup(false).await;

        watch_loop
            .handle(Err(Error::Config("watch dropped".to_string())))
            .await;
        watch_loop
            .handle(Ok(PodEvent::Applied(PodSnapshot::new("ns1", "bare"))))
            .await;

        let status = health.health().await;
        assert_eq!(
            status.components[components::WATCHER].status,
            ComponentStatus::Healthy
        );
    }

    #[tokio::test]
    async fn test_watch_error_degrades_watcher() {
        let (watch_loop, _actuator, health) = setup(false).await;

        watch_loop
            .handle(Err(Error::Config("watch dropped".to_string())))
            .await;

        let status = health.health().await;
        assert_eq!(
            status.components[components::WATCHER].status,
            ComponentStatus::Degraded
        );
    }

    #[tokio::test]
    async fn test_stream_end_marks_watcher_unhealthy() {
        let (watch_loop, _actuator, health) = setup(false).await;
        let (_tx, rx) = broadcast::channel(1);

        watch_loop
            .run(stream::iter(vec![Ok(crash_looping("worker-1"))]), rx)
            .await;

        let status = health.health().await;
        assert_eq!(
            status.components[components::WATCHER].status,
            ComponentStatus::Unhealthy
        );
        assert!(!status.status.is_operational());
    }

    #[tokio::test]
    async fn test_shutdown_keeps_watcher_status() {
        let (watch_loop, _actuator, health) = setup(false).await;
        let (tx, rx) = broadcast::channel(1);

        let handle = tokio::spawn(watch_loop.run(stream::pending::<Result<PodEvent>>(), rx));
        tx.send(()).unwrap();
        handle.await.unwrap();

        let status = health.health().await;
        assert_eq!(
            status.components[components::WATCHER].status,
            ComponentStatus::Healthy
        );
    }

    #[tokio::test]
    async fn test_shutdown_stops_pending_stream() {
        let (watch_loop, actuator, _health) = setup(false).await;
        let (tx, rx) = broadcast::channel(1);

        let handle = tokio::spawn(watch_loop.run(stream::pending::<Result<PodEvent>>(), rx));
        tx.send(()).unwrap();
        handle.await.unwrap();

        assert_eq!(actuator.call_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_max_concurrency_floor() {
        let (watch_loop, _, _) = setup(false).await;
        assert_eq!(watch_loop.max_concurrency(0).max_concurrency, 1);
    }
}
