//! Config → registrations.
//!
//! # Data Flow
//! ```text
//! RouterConfig
//!     → middleware[]  → Middleware { name, global, enabled, chain }
//!     → routes[]      → Registration per method (ANY expands)
//!     → RouteSet      → Router::replace_all
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::header::{HeaderName, HeaderValue};
use axum::http::StatusCode;
use thiserror::Error;

use crate::config::schema::{HandlerConfig, MiddlewareConfig, MiddlewareKind, RouteConfig, RouterConfig};
use crate::config::validation::parse_method;
use crate::handler::builtin::{Echo, Json, ParamsDump, Redirect, RequestLog, RequireHeader, SetHeader, Status, Text};
use crate::handler::{Handler, HandlerChain};
use crate::routing::{Middleware, Registration, ANY_METHODS};

/// A config entry that cannot be turned into a handler.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    #[error("route '{route}': {message}")]
    Route { route: String, message: String },

    #[error("middleware '{name}': {message}")]
    Middleware { name: String, message: String },
}

/// Registrations and middleware ready for `Router::replace_all`.
#[derive(Debug, Default)]
pub struct RouteSet {
    pub routes: Vec<Registration>,
    pub middleware: Vec<Middleware>,
}

/// Builds handler chains from config, resolving `named` handlers
/// registered by the embedding application.
#[derive(Debug, Default, Clone)]
pub struct HandlerRegistry {
    named: HashMap<String, HandlerChain>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `chain` available to config routes as `{ kind = "named", name = ... }`.
    pub fn register(&mut self, name: impl Into<String>, chain: HandlerChain) -> &mut Self {
        self.named.insert(name.into(), chain);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.named.contains_key(name)
    }

    /// Chain for one endpoint handler.
    pub fn handler(&self, route: &str, config: &HandlerConfig) -> Result<HandlerChain, RegistryError> {
        let err = |message: String| RegistryError::Route {
            route: route.to_string(),
            message,
        };
        let status = |code: u16| StatusCode::from_u16(code).map_err(|e| err(e.to_string()));

        let handler: Arc<dyn Handler> = match config {
            HandlerConfig::Text { status: code, body } => Arc::new(Text::new(status(*code)?, body.clone())),
            HandlerConfig::Json { status: code, body } => Arc::new(Json::new(status(*code)?, body.clone())),
            HandlerConfig::Params => Arc::new(ParamsDump),
            HandlerConfig::Echo => Arc::new(Echo),
            HandlerConfig::Redirect { status: code, location } => {
                let code = status(*code)?;
                if !code.is_redirection() {
                    return Err(err(format!("{} is not a redirect status", code)));
                }
                Arc::new(Redirect::new(code, location.clone()))
            }
            HandlerConfig::Status { status: code } => Arc::new(Status(status(*code)?)),
            HandlerConfig::Named { name } => {
                return self
                    .named
                    .get(name)
                    .cloned()
                    .ok_or_else(|| err(format!("no handler registered as '{}'", name)));
            }
        };
        Ok(HandlerChain::new(vec![handler]))
    }

    /// One middleware entry.
    pub fn middleware(&self, config: &MiddlewareConfig) -> Result<Middleware, RegistryError> {
        let err = |message: String| RegistryError::Middleware {
            name: config.name.clone(),
            message,
        };
        let header_name = |name: &str| {
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| err(format!("invalid header name '{}': {}", name, e)))
        };

        let handler: Arc<dyn Handler> = match &config.kind {
            MiddlewareKind::RequestLog => Arc::new(RequestLog),
            MiddlewareKind::SetHeader { header, value } => {
                let value = HeaderValue::from_str(value).map_err(|e| err(format!("invalid header value: {}", e)))?;
                Arc::new(SetHeader::new(header_name(header)?, value))
            }
            MiddlewareKind::RequireHeader { header, value } => {
                Arc::new(RequireHeader::new(header_name(header)?, value.clone()))
            }
        };

        let chain = HandlerChain::new(vec![handler]);
        let middleware = if config.global {
            Middleware::global(&config.name, chain)
        } else {
            Middleware::named(&config.name, chain)
        };
        Ok(middleware.enabled(config.enabled))
    }

    /// Registrations for one route; `ANY` yields one per standard method.
    pub fn routes(&self, config: &RouteConfig) -> Result<Vec<Registration>, RegistryError> {
        let methods = match parse_method(&config.method) {
            Ok(Some(method)) => vec![method],
            Ok(None) => ANY_METHODS.to_vec(),
            Err(message) => {
                return Err(RegistryError::Route {
                    route: config.name.clone(),
                    message,
                })
            }
        };
        let chain = self.handler(&config.name, &config.handler)?;

        Ok(methods
            .into_iter()
            .map(|method| {
                let mut registration = Registration::new(method, config.pattern.as_str(), chain.clone())
                    .named(config.name.as_str())
                    .enabled(config.enabled);
                registration.group = config.group.clone();
                registration.middleware = config.middleware.clone();
                registration
            })
            .collect())
    }

    /// Everything a config describes.
    pub fn route_set(&self, config: &RouterConfig) -> Result<RouteSet, RegistryError> {
        let middleware = config
            .middleware
            .iter()
            .map(|m| self.middleware(m))
            .collect::<Result<Vec<_>, _>>()?;

        let mut routes = Vec::with_capacity(config.routes.len());
        for route in &config.routes {
            routes.extend(self.routes(route)?);
        }
        Ok(RouteSet { routes, middleware })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::http::Context;
    use axum::http::Method;

    const CONFIG: &str = r#"
        [[middleware]]
        name = "powered"
        kind = "set_header"
        header = "x-powered-by"
        value = "hot-router"
        global = true

        [[routes]]
        name = "home"
        method = "ANY"
        pattern = "/"
        group = "site"
        handler = { kind = "text", body = "home" }

        [[routes]]
        name = "user"
        pattern = "/users/:id"
        handler = { kind = "named", name = "users.show" }
    "#;

    #[test]
    fn test_route_set_from_config() {
        let config = parse_config(CONFIG).unwrap();
        let mut registry = HandlerRegistry::new();
        registry.register(
            "users.show",
            HandlerChain::from_handler(|ctx: &mut Context| -> Result<(), crate::handler::HandlerError> {
                let id = ctx.param("id").unwrap_or_default().to_string();
                ctx.string(StatusCode::OK, id);
                Ok(())
            }),
        );

        let set = registry.route_set(&config).unwrap();
        assert_eq!(set.middleware.len(), 1);
        assert!(set.middleware[0].global);
        assert_eq!(set.routes.len(), ANY_METHODS.len() + 1);
        assert!(set
            .routes
            .iter()
            .filter(|r| r.name == "home")
            .all(|r| r.group.as_deref() == Some("site")));
        assert!(set.routes.iter().any(|r| r.name == "user" && r.method == Method::GET));
    }

    #[test]
    fn test_unknown_named_handler() {
        let config = parse_config(CONFIG).unwrap();
        let err = HandlerRegistry::new().route_set(&config).unwrap_err();
        assert!(err.to_string().contains("users.show"));
    }
}
