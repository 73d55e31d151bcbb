//! netprobed — network diagnostics daemon
//!
//! Exposes the probe tools over HTTP: reachability checks, port scanning,
//! subnet math, DNS queries, TLS certificate inspection, and the
//! provider-backed vendor/geolocation/WHOIS lookups.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use netprobe::config;
use netprobe::server::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .compact()
        .init();

    info!("netprobe v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = config::load_config()?;
    let state = Arc::new(AppState::from_config(&config)?);
    info!(
        "{} tools registered, usage log at {}",
        state.registry.tool_count(),
        config.audit.db_path
    );

    server::serve(state, &config.server.bind).await
}
