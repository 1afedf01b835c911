//! Admin API: inspect and reconstruct the live routing table.
//!
//! All endpoints require `Authorization: Bearer <api_key>`.
//!
//! ```text
//! GET  /admin/status
//! GET  /admin/routes
//! POST /admin/rebuild
//! POST /admin/reload
//! POST /admin/routes/{name}/{enable|disable}
//! POST /admin/groups/{group}/{enable|disable}
//! POST /admin/middleware/{name}/{enable|disable}
//! ```
//!
//! Every mutating call publishes a new generation before it returns.

pub mod auth;
pub mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::handler::registry::HandlerRegistry;
use crate::routing;

use self::auth::admin_auth_middleware;
use self::handlers::*;

/// State shared by admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub router: Arc<routing::Router>,
    pub registry: Arc<HandlerRegistry>,
    /// File re-read by `/admin/reload`.
    pub config_path: Option<PathBuf>,
    pub api_key: Arc<str>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/routes", get(get_routes))
        .route("/admin/rebuild", post(post_rebuild))
        .route("/admin/reload", post(post_reload))
        .route("/admin/routes/{name}/{action}", post(toggle_route))
        .route("/admin/groups/{group}/{action}", post(toggle_group))
        .route("/admin/middleware/{name}/{action}", post(toggle_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}

/// Serve the admin API until shutdown.
pub async fn serve(
    listener: TcpListener,
    state: AdminState,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(address = %addr, "Admin API listening");
    }
    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
}
