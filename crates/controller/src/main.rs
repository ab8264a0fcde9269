//! Autoheal controller
//!
//! Watches pods cluster-wide and deletes controller-owned pods that are
//! crash looping or have been evicted, so their owners reschedule them.

use anyhow::{Context, Result};
use autoheal_lib::{
    health::components,
    watch::{self, WatchLoop},
    ControllerMetrics, Dispatcher, DryRunActuator, HealthRegistry, KubeActuator, PodActuator,
    PolicyConfig, StructuredLogger, TracingAuditLogger,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

mod api;
mod config;
mod shutdown;
mod telemetry;

const CONTROLLER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init()?;

    info!("Starting autoheal-controller");

    let config = config::ControllerConfig::load()?;
    info!(instance = %config.instance_name, dry_run = config.dry_run, "Controller configured");

    let health_registry = HealthRegistry::new();
    health_registry.register(components::WATCHER).await;
    health_registry.register(components::ACTUATOR).await;

    let metrics = ControllerMetrics::new();
    let logger = StructuredLogger::new(&config.instance_name);

    // Startup failures below are fatal: no credentials or no pod access
    let client = kube::Client::try_default()
        .await
        .context("Failed to resolve cluster credentials")?;
    watch::preflight(&client)
        .await
        .context("Failed to list pods; cannot start the pod watch")?;

    let policy = PolicyConfig::default();
    policy.validate()?;

    let actuator: Arc<dyn PodActuator> = if config.dry_run {
        Arc::new(DryRunActuator)
    } else {
        Arc::new(KubeActuator::new(client.clone()))
    };
    let dispatcher = Arc::new(Dispatcher::new(
        actuator,
        Arc::new(TracingAuditLogger),
        policy,
    ));

    logger.log_startup(CONTROLLER_VERSION, config.dry_run);

    let listener = api::bind(config.api_port).await?;
    let app_state = Arc::new(api::AppState::new(health_registry.clone()));
    let mut api_handle = tokio::spawn(api::serve(listener, app_state));
    let shutdown_signal = shutdown::signal_received()
        .context("Failed to install shutdown signal handler")?;

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let watch_loop = WatchLoop::new(dispatcher, metrics, health_registry.clone(), logger.clone())
        .max_concurrency(config.max_concurrent_dispatches);
    let mut loop_handle = tokio::spawn(
        watch_loop.run(watch::pod_events(client, logger.clone()), shutdown_rx),
    );

    health_registry.set_ready(true).await;

    tokio::select! {
        reason = shutdown_signal => {
            logger.log_shutdown(reason);
            let _ = shutdown_tx.send(());
            if let Err(e) = loop_handle.await {
                warn!(error = %e, "Watch loop task failed during shutdown");
            }
        }
        res = &mut loop_handle => {
            if let Err(e) = res {
                warn!(error = %e, "Watch loop task failed");
            }
            logger.log_shutdown("pod watch ended");
        }
        res = &mut api_handle => {
            let err = match res {
                Ok(Ok(())) => anyhow::anyhow!("API server exited"),
                Ok(Err(e)) => e,
                Err(e) => anyhow::Error::new(e).context("API server task failed"),
            };
            error!(error = %err, "API server stopped");
            logger.log_shutdown("API server stopped");
            let _ = shutdown_tx.send(());
            let _ = loop_handle.await;
            return Err(err);
        }
    }

    api_handle.abort();
    info!("Shutting down");

    Ok(())
}
