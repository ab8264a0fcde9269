//! Read-only preview of what the controller would do with each pod

use anyhow::{Context, Result};
use autoheal_lib::{
    pipeline::{classify, evaluate, has_controller_owner},
    Decision, Diagnosis, PodSnapshot, PolicyConfig,
};
use chrono::{DateTime, Utc};
use colored::Colorize;
use kube::Client;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{format_age, print_info, print_table, print_warning, OutputFormat};

/// Row for the diagnose table
#[derive(Debug, Tabled, Serialize)]
pub struct DiagnosisRow {
    #[tabled(rename = "Namespace")]
    pub namespace: String,
    #[tabled(rename = "Pod")]
    pub name: String,
    #[tabled(rename = "Owner")]
    pub owner: String,
    #[tabled(rename = "Diagnosis")]
    pub diagnosis: Diagnosis,
    #[tabled(rename = "Age")]
    pub age: String,
    #[tabled(rename = "Action")]
    pub action: String,
}

impl DiagnosisRow {
    pub fn is_actionable(&self) -> bool {
        self.action == "delete"
    }
}

/// Run one snapshot through guard, classifier and policy without acting on it
pub fn assess(pod: &PodSnapshot, now: DateTime<Utc>, policy: &PolicyConfig) -> DiagnosisRow {
    let diagnosis = classify(pod, policy.restart_threshold);
    let age = pod.age(now);

    let owner = pod
        .owners
        .iter()
        .find(|o| o.controller == Some(true))
        .map(|o| format!("{}/{}", o.kind, o.name))
        .unwrap_or_else(|| "-".to_string());

    let action = if !has_controller_owner(pod) {
        "skip (unmanaged)".to_string()
    } else {
        match (evaluate(diagnosis, age, policy), diagnosis) {
            (Decision::ActNow, _) => "delete".to_string(),
            (Decision::Skip, Diagnosis::Healthy) => "none".to_string(),
            (Decision::Skip, _) => "wait (grace period)".to_string(),
        }
    };

    DiagnosisRow {
        namespace: pod.namespace.clone(),
        name: pod.name.clone(),
        owner,
        diagnosis,
        age: age.map(format_age).unwrap_or_else(|| "-".to_string()),
        action,
    }
}

/// Show the controller's verdict for every pod; `only_actionable` hides pods it would leave alone
pub async fn show_diagnosis(
    client: Client,
    namespace: Option<&str>,
    only_actionable: bool,
    format: OutputFormat,
) -> Result<()> {
    let pods = super::list_pods(client, namespace)
        .await
        .context("Failed to list pods")?;

    let policy = PolicyConfig::default();
    let now = Utc::now();

    let rows: Vec<DiagnosisRow> = pods
        .iter()
        .map(|pod| assess(&PodSnapshot::from(pod), now, &policy))
        .filter(|row| !only_actionable || row.is_actionable())
        .collect();

    if matches!(format, OutputFormat::Table) {
        let actionable = rows.iter().filter(|r| r.is_actionable()).count();
        print_info(&format!("Assessed {} pods (dry run, nothing is deleted)", pods.len()));
        if actionable > 0 {
            print_warning(&format!(
                "{} pod(s) would be deleted by the controller",
                actionable.to_string().bold()
            ));
        }
    }
    print_table(&rows, format);

    Ok(())
}
