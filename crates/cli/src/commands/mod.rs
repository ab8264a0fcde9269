//! CLI command implementations

pub mod diagnose;
pub mod pods;

use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::{Api, ListParams},
    Client,
};

/// List pods in one namespace, or cluster-wide when `namespace` is `None`
pub(crate) async fn list_pods(client: Client, namespace: Option<&str>) -> anyhow::Result<Vec<Pod>> {
    let api: Api<Pod> = match namespace {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    };

    let pods = api.list(&ListParams::default()).await?;
    Ok(pods.items)
}
