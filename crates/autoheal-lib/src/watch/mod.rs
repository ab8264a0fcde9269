//! Pod watch subscription
//!
//! Turns the cluster-wide kube-rs pod watcher into a stream of typed
//! [`PodEvent`]s carrying [`PodSnapshot`]s, and drives them through the
//! dispatcher in [`WatchLoop`].

mod r#loop;

pub use r#loop::{WatchLoop, DEFAULT_MAX_CONCURRENCY};

use futures::{stream, Stream, StreamExt};
use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::{Api, ListParams},
    runtime::{watcher, WatchStreamExt},
    Client, ResourceExt,
};
use tracing::info;

use crate::error::{Error, Result};
use crate::observability::StructuredLogger;
use crate::snapshot::PodSnapshot;

/// A pod lifecycle event as delivered to the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub enum PodEvent {
    /// The pod was created, updated, or seen during a (re)list
    Applied(PodSnapshot),
    /// The pod is gone; nothing to reconcile
    Deleted { namespace: String, name: String },
}

/// Check that the cluster is reachable and pods can be listed cluster-wide.
///
/// Called once at startup; a failure here is fatal for the controller.
pub async fn preflight(client: &Client) -> Result<()> {
    let pods: Api<Pod> = Api::all(client.clone());
    pods.list(&ListParams::default().limit(1))
        .await
        .map_err(Error::Kube)?;
    info!("Pod list permission verified");
    Ok(())
}

/// Map one raw watcher event to zero or more pod events
pub fn translate(event: watcher::Event<Pod>) -> Vec<PodEvent> {
    match event {
        watcher::Event::Applied(pod) => vec![PodEvent::Applied(PodSnapshot::from(&pod))],
        watcher::Event::Deleted(pod) => vec![PodEvent::Deleted {
            namespace: pod.namespace().unwrap_or_default(),
            name: pod.name_any(),
        }],
        watcher::Event::Restarted(pods) => pods
            .iter()
            .map(|pod| PodEvent::Applied(PodSnapshot::from(pod)))
            .collect(),
    }
}

/// Cluster-wide pod event stream.
///
/// Watch errors are yielded as `Err` items and the underlying watcher retries
/// with the runtime's default backoff, so the stream never ends on its own.
pub fn pod_events(
    client: Client,
    logger: StructuredLogger,
) -> impl Stream<Item = Result<PodEvent>> + Send + 'static {
    let pods: Api<Pod> = Api::all(client);

    watcher(pods, watcher::Config::default())
        .default_backoff()
        .map(move |event| match event {
            Ok(event) => {
                if let watcher::Event::Restarted(pods) = &event {
                    logger.log_watch_restarted(pods.len());
                }
                translate(event).into_iter().map(Ok).collect::<Vec<_>>()
            }
            Err(e) => vec![Err(Error::Watch(e))],
        })
        .flat_map(stream::iter)
}
