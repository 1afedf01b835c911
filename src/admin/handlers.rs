use std::time::UNIX_EPOCH;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::admin::AdminState;
use crate::config::{load_config, ConfigError};
use crate::http::server::ServerError;
use crate::lifecycle::startup;
use crate::routing::{MiddlewareSummary, RouteSummary, RoutingError};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub generation: u64,
    pub routes: usize,
    /// Seconds since the Unix epoch.
    pub built_at: u64,
}

#[derive(Serialize)]
pub struct RouteListing {
    pub generation: u64,
    pub routes: Vec<RouteSummary>,
    pub middleware: Vec<MiddlewareSummary>,
}

#[derive(Serialize)]
pub struct RebuildResult {
    pub generation: u64,
    pub routes: usize,
}

#[derive(Serialize)]
pub struct ToggleResult {
    pub affected: usize,
    pub enabled: bool,
    pub generation: u64,
}

/// Admin request failures, rendered as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no config file to reload")]
    NoConfigPath,

    #[error("unknown action '{0}', expected 'enable' or 'disable'")]
    UnknownAction(String),
}

impl AdminError {
    fn status(&self) -> StatusCode {
        match self {
            AdminError::Routing(e) | AdminError::Server(ServerError::Routing(e)) => routing_status(e),
            AdminError::Server(ServerError::Config(_) | ServerError::Registry(_)) | AdminError::Config(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AdminError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AdminError::NoConfigPath | AdminError::UnknownAction(_) => StatusCode::BAD_REQUEST,
        }
    }
}

fn routing_status(err: &RoutingError) -> StatusCode {
    match err {
        RoutingError::PatternConflict { .. } => StatusCode::CONFLICT,
        RoutingError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
        RoutingError::NotFound
        | RoutingError::UnknownRoute { .. }
        | RoutingError::UnknownGroup { .. }
        | RoutingError::UnknownMiddleware { .. } => StatusCode::NOT_FOUND,
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

fn parse_action(action: &str) -> Result<bool, AdminError> {
    match action {
        "enable" => Ok(true),
        "disable" => Ok(false),
        other => Err(AdminError::UnknownAction(other.to_string())),
    }
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let generation = state.router.current();
    let built_at = generation
        .built_at()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        generation: generation.id(),
        routes: generation.route_count(),
        built_at,
    })
}

pub async fn get_routes(State(state): State<AdminState>) -> Json<RouteListing> {
    Json(RouteListing {
        generation: state.router.generation_id(),
        routes: state.router.routes(),
        middleware: state.router.middleware(),
    })
}

pub async fn post_rebuild(State(state): State<AdminState>) -> Result<Json<RebuildResult>, AdminError> {
    let generation = startup::publish(&state.router)?;
    Ok(Json(RebuildResult {
        generation,
        routes: state.router.current().route_count(),
    }))
}

pub async fn post_reload(State(state): State<AdminState>) -> Result<Json<RebuildResult>, AdminError> {
    let path = state.config_path.as_deref().ok_or(AdminError::NoConfigPath)?;
    let config = load_config(path)?;
    let generation = startup::apply_config(&state.router, &state.registry, &config)?;
    Ok(Json(RebuildResult {
        generation,
        routes: state.router.current().route_count(),
    }))
}

pub async fn toggle_route(
    State(state): State<AdminState>,
    Path((name, action)): Path<(String, String)>,
) -> Result<Json<ToggleResult>, AdminError> {
    let enabled = parse_action(&action)?;
    let affected = state.router.set_route_enabled(&name, enabled)?;
    tracing::info!(route = %name, enabled, affected, "Route toggled");
    toggled(&state, affected, enabled)
}

pub async fn toggle_group(
    State(state): State<AdminState>,
    Path((group, action)): Path<(String, String)>,
) -> Result<Json<ToggleResult>, AdminError> {
    let enabled = parse_action(&action)?;
    let affected = state.router.set_group_enabled(&group, enabled)?;
    tracing::info!(group = %group, enabled, affected, "Route group toggled");
    toggled(&state, affected, enabled)
}

pub async fn toggle_middleware(
    State(state): State<AdminState>,
    Path((name, action)): Path<(String, String)>,
) -> Result<Json<ToggleResult>, AdminError> {
    let enabled = parse_action(&action)?;
    state.router.set_middleware_enabled(&name, enabled)?;
    tracing::info!(middleware = %name, enabled, "Middleware toggled");
    toggled(&state, 1, enabled)
}

fn toggled(state: &AdminState, affected: usize, enabled: bool) -> Result<Json<ToggleResult>, AdminError> {
    let generation = startup::publish(&state.router)?;
    Ok(Json(ToggleResult {
        affected,
        enabled,
        generation,
    }))
}
