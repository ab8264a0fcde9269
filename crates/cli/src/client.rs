//! Kubernetes client construction for the CLI

use anyhow::{Context, Result};
use kube::{
    config::{KubeConfigOptions, Kubeconfig},
    Client, Config,
};

/// Connect using an explicit kubeconfig path, or the default resolution
/// (in-cluster, then `KUBECONFIG`, then `~/.kube/config`)
pub async fn connect(kubeconfig: Option<&str>) -> Result<Client> {
    let Some(path) = kubeconfig else {
        return Client::try_default()
            .await
            .context("Failed to resolve cluster credentials");
    };

    let kubeconfig = Kubeconfig::read_from(path)
        .with_context(|| format!("Failed to read kubeconfig {}", path))?;
    let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .context("Invalid kubeconfig")?;

    Client::try_from(config).context("Failed to create Kubernetes client")
}
