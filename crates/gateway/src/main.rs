//! `seal-gateway`: decryption gateway entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise the telemetry pipeline (JSON logs, optional OTLP).
//! 3. Build the artifact store and content-type table.
//! 4. Build the Axum router and serve it over TLS or plain HTTP.

mod config;
mod content_type;
mod server;
mod store;
mod telemetry;

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use config::Config;
use server::state::AppState;
use store::{ArtifactStore, FsArtifactStore};

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otlp_endpoint(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_port = cfg.listen_port,
        route_prefix = %cfg.route_prefix,
        "seal-gateway starting"
    );

    // -----------------------------------------------------------------------
    // 3. Store and content types
    // -----------------------------------------------------------------------
    let store = FsArtifactStore::new(&cfg.base_dir);
    if !store.is_available() {
        warn!(base_dir = %cfg.base_dir, "base directory is not available; requests will fail until it is");
    }
    let content_types = cfg.content_type_table()?;
    info!(mapped_extensions = content_types.len(), "content-type table loaded");

    // -----------------------------------------------------------------------
    // 4. HTTP server
    // -----------------------------------------------------------------------
    let state = AppState::new(Arc::new(store), content_types, cfg.key_header_name.clone())
        .with_unseal_timeout(cfg.unseal_timeout());
    let router = server::router::build(state, &cfg.route_prefix);

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.listen_port).into();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    match cfg.tls_paths()? {
        Some(paths) => {
            let tls = server::tls::load_server_config(&paths)?;
            info!(addr = %addr, "listening (https)");
            server::tls::serve(listener, router, tls).await?;
        }
        None => {
            warn!(addr = %addr, "listening (plain http); terminate TLS in front of the gateway");
            axum::serve(listener, router).await?;
        }
    }

    Ok(())
}
