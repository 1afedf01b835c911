//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Listener configuration (bind address, request timeout).
    pub listener: ListenerConfig,

    /// Admin API settings.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Named middleware available to routes.
    pub middleware: Vec<MiddlewareConfig>,

    /// Route definitions.
    pub routes: Vec<RouteConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A named middleware.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MiddlewareConfig {
    /// Name routes refer to.
    pub name: String,

    /// Disabled middleware stays registered but does not run.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Run in front of every route.
    #[serde(default)]
    pub global: bool,

    #[serde(flatten)]
    pub kind: MiddlewareKind,
}

/// What a middleware does.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MiddlewareKind {
    /// Log every request at debug level.
    RequestLog,
    /// Add a response header.
    SetHeader { header: String, value: String },
    /// Reject with 401 unless the request header is present (and equal
    /// to `value`, if given).
    RequireHeader {
        header: String,
        #[serde(default)]
        value: Option<String>,
    },
}

/// Route configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for admin operations and logs.
    pub name: String,

    /// HTTP method, or `ANY` for the standard set.
    #[serde(default = "default_method")]
    pub method: String,

    /// Path pattern, e.g. `/users/:id` or `/static/*rest`.
    pub pattern: String,

    /// Optional group for bulk enable/disable.
    #[serde(default)]
    pub group: Option<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Named middleware to run before the handler, in order.
    #[serde(default)]
    pub middleware: Vec<String>,

    pub handler: HandlerConfig,
}

/// Built-in endpoint handlers.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HandlerConfig {
    /// Fixed plain-text body.
    Text {
        #[serde(default = "default_ok")]
        status: u16,
        body: String,
    },
    /// Fixed JSON body.
    Json {
        #[serde(default = "default_ok")]
        status: u16,
        body: serde_json::Value,
    },
    /// JSON object of the bound path parameters.
    Params,
    /// JSON echo of method, path and query.
    Echo,
    /// Redirect to `location`.
    Redirect {
        #[serde(default = "default_redirect")]
        status: u16,
        location: String,
    },
    /// Empty body with `status`.
    Status { status: u16 },
    /// A handler registered by the embedding application under `name`.
    Named { name: String },
}

fn default_true() -> bool {
    true
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_ok() -> u16 {
    200
}

fn default_redirect() -> u16 {
    302
}
