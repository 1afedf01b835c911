//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for SIGTERM / Ctrl-C and report it once
//! - Turn SIGHUP into a config reload
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGHUP triggers config reload, not shutdown
//! - A signal that cannot be installed is logged and never fires

use std::path::PathBuf;

use tokio::sync::{broadcast, mpsc};

use crate::config::{load_config, RouterConfig};

/// Resolve once Ctrl-C or SIGTERM is received.
pub async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("Shutdown signal received");
}

/// Reload `path` on every SIGHUP and push valid configs to `updates`.
#[cfg(unix)]
pub async fn reload_on_hangup(
    path: PathBuf,
    updates: mpsc::UnboundedSender<RouterConfig>,
    mut shutdown: broadcast::Receiver<()>,
) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!(error = %e, "Failed to install SIGHUP handler");
            return;
        }
    };

    loop {
        tokio::select! {
            received = hangup.recv() => {
                if received.is_none() {
                    break;
                }
                tracing::info!(path = %path.display(), "SIGHUP received, reloading config");
                match load_config(&path) {
                    Ok(config) => {
                        if updates.send(config).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::error!(error = %e, "Reload failed, keeping current configuration"),
                }
            }
            _ = shutdown.recv() => break,
        }
    }
}

#[cfg(not(unix))]
pub async fn reload_on_hangup(
    _path: PathBuf,
    _updates: mpsc::UnboundedSender<RouterConfig>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let _ = shutdown.recv().await;
}
