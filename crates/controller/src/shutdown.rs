//! Termination signals

use std::future::Future;
use tokio::signal::unix::{signal, SignalKind};

/// Registers the SIGTERM handler immediately; the returned future resolves
/// with the shutdown reason on SIGINT or SIGTERM.
pub fn signal_received() -> std::io::Result<impl Future<Output = &'static str>> {
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => "SIGINT received",
            _ = terminate.recv() => "SIGTERM received",
        }
    })
}
