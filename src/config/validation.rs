//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes reference existing middleware)
//! - Validate value ranges (timeouts > 0, statuses, addresses)
//! - Reject malformed patterns before they reach the router
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Cross-route conflicts are left to the router, which knows precedence

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::header::{HeaderName, HeaderValue};
use axum::http::{Method, StatusCode};
use thiserror::Error;

use crate::config::schema::{HandlerConfig, MiddlewareKind, RouterConfig};
use crate::routing::pattern;

/// One semantic problem in a config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `routes[2].pattern`.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Parse a configured method; `ANY` yields `None`.
pub fn parse_method(method: &str) -> Result<Option<Method>, String> {
    let upper = method.to_ascii_uppercase();
    if upper == "ANY" {
        return Ok(None);
    }
    match upper.as_str() {
        "GET" | "HEAD" | "POST" | "PUT" | "DELETE" | "PATCH" | "OPTIONS" | "TRACE" | "CONNECT" => {
            Method::from_bytes(upper.as_bytes())
                .map(Some)
                .map_err(|e| e.to_string())
        }
        _ => Err(format!("unknown method '{}'", method)),
    }
}

/// Validate a whole config.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::new("listener.request_timeout_secs", "must be greater than 0"));
    }

    if config.admin.enabled {
        check_addr(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.api_key.is_empty() {
            errors.push(ValidationError::new("admin.api_key", "must not be empty when admin is enabled"));
        }
    }

    if config.observability.metrics_enabled {
        check_addr(&mut errors, "observability.metrics_address", &config.observability.metrics_address);
    }
    if let Err(e) = tracing_subscriber::EnvFilter::try_new(&config.observability.log_level) {
        errors.push(ValidationError::new("observability.log_level", e.to_string()));
    }

    let mut middleware_names = HashSet::new();
    for (i, m) in config.middleware.iter().enumerate() {
        let field = format!("middleware[{}]", i);
        if m.name.is_empty() {
            errors.push(ValidationError::new(format!("{}.name", field), "must not be empty"));
        } else if !middleware_names.insert(m.name.as_str()) {
            errors.push(ValidationError::new(
                format!("{}.name", field),
                format!("duplicate middleware name '{}'", m.name),
            ));
        }
        match &m.kind {
            MiddlewareKind::RequestLog => {}
            MiddlewareKind::SetHeader { header, value } => {
                check_header_name(&mut errors, &field, header);
                if HeaderValue::from_str(value).is_err() {
                    errors.push(ValidationError::new(format!("{}.value", field), "invalid header value"));
                }
            }
            MiddlewareKind::RequireHeader { header, .. } => {
                check_header_name(&mut errors, &field, header);
            }
        }
    }

    let mut route_names = HashSet::new();
    for (i, route) in config.routes.iter().enumerate() {
        let field = format!("routes[{}]", i);
        if route.name.is_empty() {
            errors.push(ValidationError::new(format!("{}.name", field), "must not be empty"));
        } else if !route_names.insert(route.name.as_str()) {
            errors.push(ValidationError::new(
                format!("{}.name", field),
                format!("duplicate route name '{}'", route.name),
            ));
        }

        if let Err(e) = parse_method(&route.method) {
            errors.push(ValidationError::new(format!("{}.method", field), e));
        }

        if !route.pattern.starts_with('/') {
            errors.push(ValidationError::new(format!("{}.pattern", field), "must start with '/'"));
        } else if let Err(e) = pattern::parse(&route.pattern) {
            errors.push(ValidationError::new(format!("{}.pattern", field), e.to_string()));
        }

        for name in &route.middleware {
            if !config.middleware.iter().any(|m| &m.name == name) {
                errors.push(ValidationError::new(
                    format!("{}.middleware", field),
                    format!("unknown middleware '{}'", name),
                ));
            }
        }

        check_handler(&mut errors, &format!("{}.handler", field), &route.handler);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_addr(errors: &mut Vec<ValidationError>, field: &str, addr: &str) {
    if addr.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(field, format!("invalid socket address '{}'", addr)));
    }
}

fn check_header_name(errors: &mut Vec<ValidationError>, field: &str, name: &str) {
    if HeaderName::from_bytes(name.as_bytes()).is_err() {
        errors.push(ValidationError::new(
            format!("{}.header", field),
            format!("invalid header name '{}'", name),
        ));
    }
}

fn check_handler(errors: &mut Vec<ValidationError>, field: &str, handler: &HandlerConfig) {
    let status = match handler {
        HandlerConfig::Text { status, .. }
        | HandlerConfig::Json { status, .. }
        | HandlerConfig::Status { status } => Some(*status),
        HandlerConfig::Redirect { status, location } => {
            if !(300..400).contains(status) {
                errors.push(ValidationError::new(
                    format!("{}.status", field),
                    format!("redirect status must be 3xx, got {}", status),
                ));
            }
            if location.is_empty() || HeaderValue::from_str(location).is_err() {
                errors.push(ValidationError::new(format!("{}.location", field), "invalid redirect location"));
            }
            Some(*status)
        }
        HandlerConfig::Named { name } => {
            if name.is_empty() {
                errors.push(ValidationError::new(format!("{}.name", field), "must not be empty"));
            }
            None
        }
        HandlerConfig::Params | HandlerConfig::Echo => None,
    };
    if let Some(status) = status {
        if StatusCode::from_u16(status).is_err() {
            errors.push(ValidationError::new(
                format!("{}.status", field),
                format!("invalid status code {}", status),
            ));
        }
    }
}
