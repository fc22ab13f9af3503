// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `keywarden serve`: the rotation gateway over the local vault database.

use keywarden_config::model::KeywardenConfig;
use keywarden_core::KeywardenError;
use keywarden_gateway::{start_server, GatewayState};
use keywarden_storage::Database;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::rotate::build_manager;

pub async fn run_serve(config: KeywardenConfig) -> Result<(), KeywardenError> {
    info!("starting keywarden serve");

    let db = Database::open_with(&config.storage).await?;
    let manager = build_manager(&db, &config);
    let shutdown = install_signal_handler();

    start_server(&config.server, GatewayState::new(manager.clone()), shutdown).await?;

    if manager.is_busy() {
        warn!("shutting down while a rotation job is running");
    }
    db.close().await?;
    info!("keywarden serve stopped");
    Ok(())
}

/// Cancel the returned token on SIGINT or SIGTERM.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                        _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler; listening for Ctrl+C only");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}
