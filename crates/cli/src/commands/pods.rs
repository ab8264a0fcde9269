//! One-shot pod listing

use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Pod;
use kube::{Client, ResourceExt};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{print_info, print_table, OutputFormat};

/// Row for the pods table
#[derive(Debug, Tabled, Serialize)]
pub struct PodRow {
    #[tabled(rename = "Namespace")]
    pub namespace: String,
    #[tabled(rename = "Pod")]
    pub name: String,
    #[tabled(rename = "Status")]
    pub phase: String,
}

impl From<&Pod> for PodRow {
    fn from(pod: &Pod) -> Self {
        Self {
            namespace: pod.namespace().unwrap_or_default(),
            name: pod.name_any(),
            phase: pod
                .status
                .as_ref()
                .and_then(|s| s.phase.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

/// List pods with their phase
pub async fn show_pods(client: Client, namespace: Option<&str>, format: OutputFormat) -> Result<()> {
    let pods = super::list_pods(client, namespace)
        .await
        .context("Failed to list pods")?;

    let rows: Vec<PodRow> = pods.iter().map(PodRow::from).collect();

    if matches!(format, OutputFormat::Table) {
        print_info(&format!("Found {} pods", rows.len()));
    }
    print_table(&rows, format);

    Ok(())
}
