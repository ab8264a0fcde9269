//! Process-wide tracing setup

use anyhow::Result;
use autoheal_lib::audit::AUDIT_TARGET;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// `RUST_LOG` directives (default `info`), with audit lines always kept
pub fn log_filter(directives: Option<&str>) -> Result<EnvFilter> {
    let filter = directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    Ok(filter.add_directive(format!("{}=info", AUDIT_TARGET).parse()?))
}

/// One flat JSON object per line
pub fn init() -> Result<()> {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::registry()
        .with(log_filter(directives.as_deref())?)
        .with(fmt::layer().json().flatten_event(true))
        .init();
    Ok(())
}
