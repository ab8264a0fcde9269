//! Corrective actuator
//!
//! Issues pod deletions against the cluster API. A failed delete is returned
//! to the caller and never retried here: the next watch delivery for the same
//! pod re-runs the pipeline and may try again.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::{Api, DeleteParams},
    Client,
};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Deletes pods on behalf of the dispatcher
#[async_trait]
pub trait PodActuator: Send + Sync {
    /// Request deletion of `namespace/name`. `force` deletes with a zero grace period.
    async fn delete_pod(&self, namespace: &str, name: &str, reason: &str, force: bool)
        -> Result<()>;
}

/// Actuator backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeActuator {
    client: Client,
}

impl KubeActuator {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Default grace period unless forced
fn delete_params(force: bool) -> DeleteParams {
    if force {
        DeleteParams {
            grace_period_seconds: Some(0),
            ..DeleteParams::default()
        }
    } else {
        DeleteParams::default()
    }
}

#[async_trait]
impl PodActuator for KubeActuator {
    async fn delete_pod(
        &self,
        namespace: &str,
        name: &str,
        reason: &str,
        force: bool,
    ) -> Result<()> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);

        debug!(
            namespace = %namespace,
            pod = %name,
            reason = %reason,
            force = force,
            "Deleting pod"
        );

        pods.delete(name, &delete_params(force))
            .await
            .map_err(Error::Kube)?;

        Ok(())
    }
}

/// Actuator that only logs what it would delete
#[derive(Debug, Clone, Default)]
pub struct DryRunActuator;

#[async_trait]
impl PodActuator for DryRunActuator {
    async fn delete_pod(
        &self,
        namespace: &str,
        name: &str,
        reason: &str,
        force: bool,
    ) -> Result<()> {
        info!(
            namespace = %namespace,
            pod = %name,
            reason = %reason,
            force = force,
            "Dry run: pod would be deleted"
        );
        Ok(())
    }
}
