//! Error types for the autoheal library

use thiserror::Error;

/// Central error type for the autoheal pipeline and its cluster adapters
#[derive(Error, Debug)]
pub enum Error {
    /// Kubernetes API error from kube-rs
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// The pod watch stream reported a failure
    #[error("Pod watch error: {0}")]
    Watch(#[from] kube::runtime::watcher::Error),

    /// Invalid policy or controller configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for autoheal operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Short, single-line description suitable for the `error` field of an audit record
    pub fn audit_message(&self) -> String {
        match self {
            Error::Kube(kube::Error::Api(resp)) => {
                format!("{} ({}): {}", resp.reason, resp.code, resp.message)
            }
            _ => self.to_string(),
        }
    }
}
