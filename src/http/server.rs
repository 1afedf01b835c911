//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum app whose fallback dispatches through the hot router
//! - Wire up middleware (tracing, timeout, request ID)
//! - Translate NotFound / MethodNotAllowed into 404 / 405 + Allow
//! - Serve until the shutdown broadcast fires
//! - Apply configuration updates pushed by the watcher
//!
//! # Design Decisions
//! - One generation is captured per request and held to completion
//! - Handler chains are synchronous and run inline on the request task
//! - A failed config update keeps the current generation serving

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
};
use percent_encoding::percent_decode_str;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{ConfigError, ListenerConfig, RouterConfig};
use crate::handler::registry::{HandlerRegistry, RegistryError};
use crate::handler::HandlerError;
use crate::http::context::Context;
use crate::http::request::{self, UuidRequestId};
use crate::lifecycle::startup;
use crate::observability::metrics;
use crate::routing::{AllowedMethods, Router, RoutingError};

/// Errors that stop the server or its startup.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("metrics exporter: {0}")]
    Metrics(String),
}

/// Application state injected into the dispatcher.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<Router>,
}

/// Build the Axum app with all middleware layers.
#[allow(deprecated)]
pub fn build_app(router: Arc<Router>, request_timeout: Duration) -> axum::Router {
    axum::Router::new()
        .fallback(dispatch)
        .with_state(AppState { router })
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %req.method(),
                path = %req.uri().path(),
                request_id = %request::request_id(req.headers()),
            )
        }))
        .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
}

/// HTTP server for the router.
pub struct HttpServer {
    router: Arc<Router>,
    request_timeout: Duration,
}

impl HttpServer {
    pub fn new(router: Arc<Router>, config: &ListenerConfig) -> Self {
        Self {
            router,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    pub fn app(&self) -> axum::Router {
        build_app(Arc::clone(&self.router), self.request_timeout)
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            generation = self.router.generation_id(),
            "HTTP server starting"
        );

        axum::serve(listener, self.app())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Apply configs from `updates` until shutdown or the channel closes.
pub async fn apply_updates(
    router: Arc<Router>,
    registry: Arc<HandlerRegistry>,
    mut updates: mpsc::UnboundedReceiver<RouterConfig>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            Some(config) = updates.recv() => {
                // Errors are logged inside; the current generation keeps serving.
                let _ = startup::apply_config(&router, &registry, &config);
            }
            _ = shutdown.recv() => break,
            else => break,
        }
    }
    tracing::debug!("Config update task stopped");
}

/// Fallback handler: every request goes through the hot router.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let (parts, _body) = request.into_parts();
    let method = parts.method.clone();
    let path = decode_path(parts.uri.path());
    let request_id = request::request_id(&parts.headers).to_string();

    let generation = state.router.current();
    let mut ctx = Context::new(parts.method, parts.uri, parts.headers);

    let (response, route) = match generation.find_endpoint(&method, &path, ctx.params_mut()) {
        Ok(endpoint) => {
            ctx.set_route(&endpoint.pattern);
            if let Err(err) = endpoint.chain.run(&mut ctx) {
                match &err {
                    HandlerError::Internal(_) => tracing::error!(
                        request_id = %request_id,
                        route = %endpoint.name,
                        error = %err,
                        "Handler failed"
                    ),
                    HandlerError::Http { .. } => tracing::debug!(
                        request_id = %request_id,
                        route = %endpoint.name,
                        error = %err,
                        "Handler rejected request"
                    ),
                }
                ctx.error(&err);
            }
            (ctx.into_response(), endpoint.pattern.to_string())
        }
        Err(RoutingError::MethodNotAllowed { allowed }) => {
            tracing::debug!(request_id = %request_id, path = %path, allow = %allowed.header_value(), "Method not allowed");
            (method_not_allowed(&allowed), "none".to_string())
        }
        Err(_) => {
            tracing::debug!(request_id = %request_id, path = %path, generation = generation.id(), "No route matched");
            ((StatusCode::NOT_FOUND, "No matching route found").into_response(), "none".to_string())
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), &route, start);
    response
}

/// Percent-decode the request path so literals and captures see the same
/// text a client meant, e.g. `/users/john%20doe` binds `john doe`.
/// Invalid UTF-8 sequences are replaced rather than rejected.
fn decode_path(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

fn method_not_allowed(allowed: &AllowedMethods) -> Response {
    let mut response = (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response();
    if let Ok(value) = HeaderValue::from_str(&allowed.header_value()) {
        response.headers_mut().insert(header::ALLOW, value);
    }
    response
}
