//! Taskdesk REST API server.
//!
//! # Usage
//!
//! ```bash
//! # In-memory store on 0.0.0.0:5000
//! cargo run --bin taskdesk-server
//!
//! # Persist to a JSON document, custom port
//! cargo run --bin taskdesk-server -- --store file://./tasks.json --port 8080
//!
//! # Or via environment variables
//! PORT=8080 TASKDESK_STORE=./tasks.json cargo run --bin taskdesk-server
//! ```

use std::sync::Arc;

use clap::Parser;
use taskdesk_server::api::{AppState, ApiSettings};
use taskdesk_server::config::{ServerCliArgs, ServerConfig};
use taskdesk_server::server::{self, ServerError};
use taskdesk_server::store::{FileStore, MemoryStore, StoreLocation, TaskStore};

#[tokio::main]
async fn main() {
    let cli = ServerCliArgs::parse();

    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(store = %config.store, "starting taskdesk server");

    let result = match &config.store {
        StoreLocation::Memory => serve(&config, MemoryStore::new()).await,
        StoreLocation::File(path) => match FileStore::open(path, config.open_retry).await {
            Ok(store) => serve(&config, store).await,
            Err(e) => Err(ServerError::from(e)),
        },
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "server failed");
        std::process::exit(1);
    }
}

async fn serve<S: TaskStore>(config: &ServerConfig, store: S) -> Result<(), ServerError> {
    let listener = server::bind_with_fallback(&config.bind_host, config.port).await?;
    let settings: ApiSettings = config.api;
    let state = Arc::new(AppState::new(store, settings));
    let (bound_addr, handle) = server::start_server(listener, state, server::shutdown_signal())?;
    tracing::info!(addr = %bound_addr, dev = settings.expose_internal_errors, "server listening");

    if let Err(e) = handle.await {
        tracing::error!(error = %e, "server task failed");
    }
    tracing::info!("server stopped");
    Ok(())
}
