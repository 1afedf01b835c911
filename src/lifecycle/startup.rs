//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn a validated config into the first published generation
//! - Re-apply configs on reload (file watch, SIGHUP, admin API)
//! - Start background tasks (config updates, metrics, admin API)
//! - Bind listeners and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Reload errors are logged and the current generation keeps serving
//! - Listeners start last (traffic only when the first generation exists)

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::admin::{self, AdminState};
use crate::config::{ConfigWatcher, RouterConfig};
use crate::handler::registry::HandlerRegistry;
use crate::http::server::{self, HttpServer, ServerError};
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;
use crate::routing::{Router, RoutingError};

/// Replace the router's routes and middleware with `config` and publish a
/// new generation. On error nothing changes.
pub fn apply_config(router: &Router, registry: &HandlerRegistry, config: &RouterConfig) -> Result<u64, ServerError> {
    let applied = registry
        .route_set(config)
        .map_err(ServerError::from)
        .and_then(|set| router.replace_all(set.routes, set.middleware).map_err(ServerError::from));

    match applied {
        Ok(()) => publish(router).map_err(ServerError::from),
        Err(e) => {
            tracing::error!(error = %e, generation = router.generation_id(), "Config rejected, keeping current routes");
            metrics::record_rebuild(None);
            Err(e)
        }
    }
}

/// Rebuild from the pending set, logging and recording the outcome.
pub fn publish(router: &Router) -> Result<u64, RoutingError> {
    match router.rebuild() {
        Ok(id) => {
            let generation = router.current();
            tracing::info!(generation = id, routes = generation.route_count(), "Routing table published");
            metrics::record_rebuild(Some(id));
            Ok(id)
        }
        Err(e) => {
            tracing::error!(error = %e, generation = router.generation_id(), "Rebuild failed, keeping current generation");
            metrics::record_rebuild(None);
            Err(e)
        }
    }
}

async fn bind(address: &str) -> Result<TcpListener, ServerError> {
    TcpListener::bind(address).await.map_err(|source| ServerError::Bind {
        address: address.to_string(),
        source,
    })
}

/// Run the router until a shutdown signal arrives.
///
/// `config_path` enables file watching, SIGHUP reloads and the admin
/// reload endpoint; without it the config is fixed for the process.
pub async fn run(
    config: RouterConfig,
    config_path: Option<PathBuf>,
    registry: HandlerRegistry,
) -> Result<(), ServerError> {
    let router = Arc::new(Router::new());
    let registry = Arc::new(registry);

    let id = apply_config(&router, &registry, &config)?;
    tracing::info!(generation = id, "Initial routing table ready");

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|e| ServerError::Metrics(format!("{}: {}", config.observability.metrics_address, e)))?;
        metrics::init_metrics(addr).map_err(|e| ServerError::Metrics(e.to_string()))?;
    }

    let shutdown = Shutdown::new();

    // Keep the notify watcher alive for the life of the server.
    let _watcher = match &config_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            tokio::spawn(signals::reload_on_hangup(
                path.clone(),
                watcher.sender(),
                shutdown.subscribe(),
            ));
            tokio::spawn(server::apply_updates(
                Arc::clone(&router),
                Arc::clone(&registry),
                updates,
                shutdown.subscribe(),
            ));
            match watcher.run() {
                Ok(w) => Some(w),
                Err(e) => {
                    tracing::warn!(error = %e, "Config watcher unavailable, file changes will not reload");
                    None
                }
            }
        }
        None => None,
    };

    let admin_task = if config.admin.enabled {
        let listener = bind(&config.admin.bind_address).await?;
        let state = AdminState {
            router: Arc::clone(&router),
            registry: Arc::clone(&registry),
            config_path: config_path.clone(),
            api_key: Arc::from(config.admin.api_key.as_str()),
        };
        Some(tokio::spawn(admin::serve(listener, state, shutdown.subscribe())))
    } else {
        None
    };

    let listener = bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(Arc::clone(&router), &config.listener);
    let server_shutdown = shutdown.subscribe();

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::wait_for_shutdown().await;
        signal_shutdown.trigger();
    });

    let result = server.run(listener, server_shutdown).await;

    // The listener may have stopped on its own; make sure everything else does too.
    shutdown.trigger();
    if let Some(task) = admin_task {
        match task.await {
            Ok(Err(e)) => tracing::error!(error = %e, "Admin API stopped with error"),
            Err(e) => tracing::error!(error = %e, "Admin API task panicked"),
            Ok(Ok(())) => {}
        }
    }

    tracing::info!(generation = router.generation_id(), "Shutdown complete");
    result
}
