// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `murmur serve` command implementation.
//!
//! Brings the service up in order: signal handler, storage lifecycle
//! (open plus migrations), then the HTTP gateway. Tear-down runs in
//! reverse: the gateway stops accepting connections first, then storage
//! drains in-flight operations and closes the database file.

use std::sync::Arc;
use std::time::Instant;

use murmur_config::model::MurmurConfig;
use murmur_core::MurmurError;
use murmur_gateway::{GatewayState, ServerConfig, start_server};
use murmur_storage::Lifecycle;
use tracing::info;

use crate::shutdown;

/// Runs the `murmur serve` command.
///
/// Returns only after a full graceful shutdown; any error during startup
/// is fatal and surfaces to the caller before the listener binds.
pub async fn run_serve(config: MurmurConfig) -> Result<(), MurmurError> {
    init_tracing(&config.service.log_level);

    info!("starting murmur serve");

    // Install the signal handler before any slow startup work so a
    // signal received mid-initialization is not lost.
    let cancel = shutdown::install_signal_handler();

    let lifecycle = Lifecycle::new(config.storage.clone());

    // A signal that arrives before the store is ready skips straight to
    // Closed without serving a single request.
    let db = tokio::select! {
        result = lifecycle.initialize() => result?,
        _ = cancel.cancelled() => {
            lifecycle.shutdown().await?;
            info!("shutdown requested before initialization completed");
            return Ok(());
        }
    };

    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    let state = GatewayState {
        db: Arc::clone(&db),
        start_time: Instant::now(),
    };

    start_server(&server_config, state, cancel).await?;

    // The listener is down; drain what is still running and close.
    lifecycle.shutdown().await?;

    info!("murmur serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("murmur={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
