//! Autoheal operator CLI
//!
//! Read-only companion to the autoheal controller: lists pods and previews
//! which of them the controller would delete.

mod client;
mod commands;
mod output;

use clap::{Parser, Subcommand};
use commands::{diagnose, pods};

/// Autoheal operator CLI
#[derive(Parser)]
#[command(name = "autoheal")]
#[command(author, version, about = "CLI for the Autoheal pod self-healing controller", long_about = None)]
pub struct Cli {
    /// Path to kubeconfig file (uses in-cluster config, KUBECONFIG or ~/.kube/config if not specified)
    #[arg(long)]
    pub kubeconfig: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List pods with their status
    Pods {
        /// Namespace to list (all namespaces if not specified)
        #[arg(long, short)]
        namespace: Option<String>,
    },

    /// Show what the controller would do with each pod (never deletes)
    Diagnose {
        /// Namespace to inspect (all namespaces if not specified)
        #[arg(long, short)]
        namespace: Option<String>,

        /// Only show pods the controller would delete
        #[arg(long)]
        actionable: bool,
    },
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let client = client::connect(cli.kubeconfig.as_deref()).await?;

    match cli.command {
        Commands::Pods { namespace } => {
            pods::show_pods(client, namespace.as_deref(), cli.format).await?;
        }
        Commands::Diagnose {
            namespace,
            actionable,
        } => {
            diagnose::show_diagnosis(client, namespace.as_deref(), actionable, cli.format).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
