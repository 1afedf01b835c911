//! Built-in handlers and middleware for config-driven routes.

use axum::http::header::{HeaderName, HeaderValue};
use axum::http::StatusCode;
use serde_json::{json, Map, Value};

use crate::handler::{Handler, HandlerError};
use crate::http::Context;

/// Fixed plain-text response.
#[derive(Debug, Clone)]
pub struct Text {
    status: StatusCode,
    body: String,
}

impl Text {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

impl Handler for Text {
    fn handle(&self, ctx: &mut Context) -> Result<(), HandlerError> {
        ctx.string(self.status, self.body.as_str());
        Ok(())
    }
}

/// Fixed JSON response.
#[derive(Debug, Clone)]
pub struct Json {
    status: StatusCode,
    body: Value,
}

impl Json {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }
}

impl Handler for Json {
    fn handle(&self, ctx: &mut Context) -> Result<(), HandlerError> {
        ctx.json(self.status, &self.body)
    }
}

/// Responds with the matched pattern and bound parameters:
///
/// ```json
/// {"route": "/users/:uid/files/:fid", "names": ["uid", "fid"], "params": {"uid": "1", "fid": "7"}}
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ParamsDump;

impl Handler for ParamsDump {
    fn handle(&self, ctx: &mut Context) -> Result<(), HandlerError> {
        let params: Map<String, Value> = ctx
            .params()
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(v)))
            .collect();
        let body = json!({
            "route": ctx.path(),
            "names": ctx.param_names(),
            "params": params,
        });
        ctx.json(StatusCode::OK, &body)
    }
}

/// Responds with the request line as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct Echo;

impl Handler for Echo {
    fn handle(&self, ctx: &mut Context) -> Result<(), HandlerError> {
        let body = json!({
            "method": ctx.method().as_str(),
            "path": ctx.request_path(),
            "query": ctx.query(),
        });
        ctx.json(StatusCode::OK, &body)
    }
}

/// Redirects to a fixed location.
#[derive(Debug, Clone)]
pub struct Redirect {
    status: StatusCode,
    location: String,
}

impl Redirect {
    pub fn new(status: StatusCode, location: impl Into<String>) -> Self {
        Self {
            status,
            location: location.into(),
        }
    }
}

impl Handler for Redirect {
    fn handle(&self, ctx: &mut Context) -> Result<(), HandlerError> {
        ctx.redirect(self.status, &self.location)
    }
}

/// Empty response with a fixed status.
#[derive(Debug, Clone, Copy)]
pub struct Status(pub StatusCode);

impl Handler for Status {
    fn handle(&self, ctx: &mut Context) -> Result<(), HandlerError> {
        ctx.no_content(self.0);
        Ok(())
    }
}

// --- middleware ---

/// Logs each dispatched request at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLog;

impl Handler for RequestLog {
    fn handle(&self, ctx: &mut Context) -> Result<(), HandlerError> {
        tracing::debug!(
            method = %ctx.method(),
            path = %ctx.request_path(),
            route = ctx.path().unwrap_or("-"),
            params = ctx.params().len(),
            "Dispatching request"
        );
        Ok(())
    }
}

/// Adds a header to every response that passes through.
#[derive(Debug, Clone)]
pub struct SetHeader {
    name: HeaderName,
    value: HeaderValue,
}

impl SetHeader {
    pub fn new(name: HeaderName, value: HeaderValue) -> Self {
        Self { name, value }
    }
}

impl Handler for SetHeader {
    fn handle(&self, ctx: &mut Context) -> Result<(), HandlerError> {
        ctx.response_headers_mut()
            .insert(self.name.clone(), self.value.clone());
        Ok(())
    }
}

/// Rejects requests lacking a header (or carrying the wrong value).
#[derive(Debug, Clone)]
pub struct RequireHeader {
    name: HeaderName,
    value: Option<String>,
}

impl RequireHeader {
    pub fn new(name: HeaderName, value: Option<String>) -> Self {
        Self { name, value }
    }
}

impl Handler for RequireHeader {
    fn handle(&self, ctx: &mut Context) -> Result<(), HandlerError> {
        let present = ctx
            .headers()
            .get(&self.name)
            .and_then(|v| v.to_str().ok());
        let ok = match (present, &self.value) {
            (Some(got), Some(want)) => got == want,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if !ok {
            ctx.string(
                StatusCode::UNAUTHORIZED,
                format!("missing or invalid {} header", self.name),
            );
        }
        Ok(())
    }
}
