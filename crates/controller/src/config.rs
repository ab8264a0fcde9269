//! Controller configuration

use anyhow::{ensure, Context, Result};
use autoheal_lib::watch::DEFAULT_MAX_CONCURRENCY;
use serde::Deserialize;

/// Controller configuration, read from `AUTOHEAL_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ControllerConfig {
    /// Instance name, from the Kubernetes downward API
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// Port for the health/metrics server
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Upper bound on pod events dispatched concurrently
    #[serde(default = "default_max_concurrent_dispatches")]
    pub max_concurrent_dispatches: usize,

    /// Log deletions instead of performing them
    #[serde(default)]
    pub dry_run: bool,
}

fn default_instance_name() -> String {
    std::env::var("POD_NAME").unwrap_or_else(|_| "autoheal-controller".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_max_concurrent_dispatches() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

impl ControllerConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let source = config::Config::builder()
            .add_source(config::Environment::with_prefix("AUTOHEAL").try_parsing(true))
            .build()
            .context("Failed to read AUTOHEAL_* environment")?;

        Self::from_source(source)
    }

    fn from_source(source: config::Config) -> Result<Self> {
        let config: Self = source
            .try_deserialize()
            .context("Invalid controller configuration")?;

        ensure!(
            config.max_concurrent_dispatches >= 1,
            "max_concurrent_dispatches must be at least 1"
        );

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let source = config::Config::builder().build().unwrap();
        let config = ControllerConfig::from_source(source).unwrap();

        assert_eq!(config.api_port, 8080);
        assert_eq!(config.max_concurrent_dispatches, 16);
        assert!(!config.dry_run);
        assert!(!config.instance_name.is_empty());
    }

    #[test]
    fn test_overrides() {
        let source = config::Config::builder()
            .set_override("api_port", 9100)
            .unwrap()
            .set_override("dry_run", true)
            .unwrap()
            .set_override("instance_name", "autoheal-0")
            .unwrap()
            .build()
            .unwrap();
        let config = ControllerConfig::from_source(source).unwrap();

        assert_eq!(config.api_port, 9100);
        assert!(config.dry_run);
        assert_eq!(config.instance_name, "autoheal-0");
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let source = config::Config::builder()
            .set_override("max_concurrent_dispatches", 0)
            .unwrap()
            .build()
            .unwrap();

        assert!(ControllerConfig::from_source(source).is_err());
    }
}
