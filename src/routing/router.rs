//! Router façade: pending registrations, rebuild and lookup.
//!
//! # Responsibilities
//! - Accumulate registrations and middleware into the pending set
//! - Reject conflicting changes at the moment they are made
//! - Rebuild and publish generations, one rebuild at a time
//! - Resolve requests against the published generation
//!
//! # Design Decisions
//! - The pending set sits behind a mutex; lookups never touch it
//! - A staged tree of the enabled routes validates every change, so a
//!   rebuild of an accepted pending set cannot fail on conflicts
//! - Mutations never publish; `rebuild()` does
//! - Route names are labels: one name may cover several methods

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::http::Method;
use serde::Serialize;

use crate::handler::HandlerChain;
use crate::routing::builder::{self, TableBuilder};
use crate::routing::coordinator::GenerationCoordinator;
use crate::routing::error::{Result, RoutingError};
use crate::routing::generation::{Generation, RouteSummary};
use crate::routing::params::Params;
use crate::routing::pattern::{self, normalize_path};
use crate::routing::tree::Endpoint;

/// Methods bound by [`Router::register_any`].
pub const ANY_METHODS: [Method; 7] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::OPTIONS,
];

/// One `(method, pattern) → chain` registration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub method: Method,
    pub pattern: String,
    pub group: Option<String>,
    pub enabled: bool,
    /// Named middleware run before `chain`, after global middleware.
    pub middleware: Vec<String>,
    pub chain: HandlerChain,
}

impl Registration {
    /// An enabled, ungrouped registration named `"METHOD pattern"`.
    pub fn new(method: Method, pattern: impl Into<String>, chain: HandlerChain) -> Self {
        let pattern = pattern.into();
        Self {
            name: format!("{} {}", method, pattern),
            method,
            pattern,
            group: None,
            enabled: true,
            middleware: Vec::new(),
            chain,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_middleware(mut self, name: impl Into<String>) -> Self {
        self.middleware.push(name.into());
        self
    }

    /// True if this registration binds `method` at `pattern`.
    pub fn is(&self, method: &Method, pattern: &str) -> bool {
        self.method == *method && normalize_path(&self.pattern) == normalize_path(pattern)
    }

    pub fn summary(&self) -> RouteSummary {
        RouteSummary {
            name: self.name.clone(),
            method: self.method.to_string(),
            pattern: self.pattern.clone(),
            group: self.group.clone(),
            enabled: self.enabled,
        }
    }
}

/// A named middleware chain.
#[derive(Debug, Clone)]
pub struct Middleware {
    pub name: String,
    /// Global middleware runs in front of every route; the rest only
    /// where a registration names it.
    pub global: bool,
    pub enabled: bool,
    pub chain: HandlerChain,
}

impl Middleware {
    pub fn global(name: impl Into<String>, chain: HandlerChain) -> Self {
        Self {
            name: name.into(),
            global: true,
            enabled: true,
            chain,
        }
    }

    pub fn named(name: impl Into<String>, chain: HandlerChain) -> Self {
        Self {
            global: false,
            ..Self::global(name, chain)
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Listing entry for one middleware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MiddlewareSummary {
    pub name: String,
    pub global: bool,
    pub enabled: bool,
}

#[derive(Debug, Default)]
struct Pending {
    routes: Vec<Registration>,
    middleware: Vec<Middleware>,
    /// Enabled routes only, without middleware; used for validation.
    staged: TableBuilder,
}

impl Pending {
    fn check_middleware_refs<'r>(&self, routes: impl IntoIterator<Item = &'r Registration>) -> Result<()> {
        check_refs(&self.middleware, routes)
    }
}

fn check_refs<'r>(middleware: &[Middleware], routes: impl IntoIterator<Item = &'r Registration>) -> Result<()> {
    for route in routes {
        if let Some(missing) = route
            .middleware
            .iter()
            .find(|name| !middleware.iter().any(|m| &m.name == *name))
        {
            return Err(RoutingError::unknown_middleware(missing.clone()));
        }
    }
    Ok(())
}

/// Parse every pattern, enabled or not, so malformed ones are rejected
/// at registration rather than when first enabled.
fn check_patterns<'r>(routes: impl IntoIterator<Item = &'r Registration>) -> Result<()> {
    for route in routes {
        pattern::parse(&route.pattern)?;
    }
    Ok(())
}

/// Validation tree for a route set.
fn stage(routes: &[Registration]) -> Result<TableBuilder> {
    check_patterns(routes)?;
    let mut staged = TableBuilder::new();
    for route in routes.iter().filter(|r| r.enabled) {
        staged.add(route)?;
    }
    Ok(staged)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A hot-swappable router.
#[derive(Debug, Default)]
pub struct Router {
    pending: Mutex<Pending>,
    coordinator: GenerationCoordinator,
    rebuild_lock: Mutex<()>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    // --- registration ---

    /// Register `chain` for `method` at `pattern`.
    pub fn register(&self, method: Method, pattern: &str, chain: HandlerChain) -> Result<()> {
        self.register_route(Registration::new(method, pattern, chain))
    }

    /// Register a fully described route.
    pub fn register_route(&self, registration: Registration) -> Result<()> {
        self.register_all(vec![registration])
    }

    /// Register `chain` for every method in [`ANY_METHODS`], all or none.
    pub fn register_any(&self, pattern: &str, chain: HandlerChain) -> Result<()> {
        let registrations = ANY_METHODS
            .iter()
            .map(|m| Registration::new(m.clone(), pattern, chain.clone()).named(format!("ANY {}", pattern)))
            .collect();
        self.register_all(registrations)
    }

    /// Register several routes, all or none.
    pub fn register_all(&self, registrations: Vec<Registration>) -> Result<()> {
        check_patterns(&registrations)?;
        let mut pending = lock(&self.pending);
        pending.check_middleware_refs(&registrations)?;

        for (i, registration) in registrations.iter().filter(|r| r.enabled).enumerate() {
            if let Err(err) = pending.staged.add(registration) {
                // A failed add leaves the staged tree intact, but earlier
                // members of this batch were already staged.
                if i > 0 {
                    pending.staged = stage(&pending.routes)?;
                }
                return Err(err);
            }
        }
        pending.routes.extend(registrations);
        Ok(())
    }

    /// Add or replace a middleware by name.
    pub fn register_middleware(&self, middleware: Middleware) {
        let mut pending = lock(&self.pending);
        match pending.middleware.iter_mut().find(|m| m.name == middleware.name) {
            Some(existing) => *existing = middleware,
            None => pending.middleware.push(middleware),
        }
    }

    /// Add or replace a global middleware.
    pub fn use_middleware(&self, name: &str, chain: HandlerChain) {
        self.register_middleware(Middleware::global(name, chain));
    }

    // --- runtime reconstruction ---

    /// Enable or disable every registration named `name`. Returns how many
    /// registrations were affected.
    pub fn set_route_enabled(&self, name: &str, enabled: bool) -> Result<usize> {
        self.toggle(|r| r.name == name, enabled)
            .and_then(|n| if n == 0 { Err(RoutingError::unknown_route(name)) } else { Ok(n) })
    }

    /// Enable or disable every registration in `group`.
    pub fn set_group_enabled(&self, group: &str, enabled: bool) -> Result<usize> {
        self.toggle(|r| r.group.as_deref() == Some(group), enabled)
            .and_then(|n| if n == 0 { Err(RoutingError::unknown_group(group)) } else { Ok(n) })
    }

    fn toggle(&self, select: impl Fn(&Registration) -> bool, enabled: bool) -> Result<usize> {
        let mut pending = lock(&self.pending);
        let mut routes = pending.routes.clone();
        let mut affected = 0;
        for route in routes.iter_mut().filter(|r| select(r)) {
            route.enabled = enabled;
            affected += 1;
        }
        if affected == 0 {
            return Ok(0);
        }
        pending.staged = stage(&routes)?;
        pending.routes = routes;
        Ok(affected)
    }

    /// Swap the chain of an existing registration.
    pub fn replace_handler(&self, method: &Method, pattern: &str, chain: HandlerChain) -> Result<()> {
        let mut pending = lock(&self.pending);
        let route = pending
            .routes
            .iter_mut()
            .find(|r| r.is(method, pattern))
            .ok_or_else(|| RoutingError::unknown_route(format!("{} {}", method, pattern)))?;
        route.chain = chain;
        Ok(())
    }

    /// Remove a registration, returning it.
    pub fn remove(&self, method: &Method, pattern: &str) -> Result<Registration> {
        let mut pending = lock(&self.pending);
        let index = pending
            .routes
            .iter()
            .position(|r| r.is(method, pattern))
            .ok_or_else(|| RoutingError::unknown_route(format!("{} {}", method, pattern)))?;
        let removed = pending.routes.remove(index);
        pending.staged = stage(&pending.routes)?;
        Ok(removed)
    }

    /// Enable or disable a middleware.
    pub fn set_middleware_enabled(&self, name: &str, enabled: bool) -> Result<()> {
        let mut pending = lock(&self.pending);
        let middleware = pending
            .middleware
            .iter_mut()
            .find(|m| m.name == name)
            .ok_or_else(|| RoutingError::unknown_middleware(name))?;
        middleware.enabled = enabled;
        Ok(())
    }

    /// Replace the whole pending set. Nothing changes on error.
    pub fn replace_all(&self, routes: Vec<Registration>, middleware: Vec<Middleware>) -> Result<()> {
        check_refs(&middleware, &routes)?;
        let staged = stage(&routes)?;
        let mut pending = lock(&self.pending);
        *pending = Pending {
            routes,
            middleware,
            staged,
        };
        Ok(())
    }

    // --- rebuild ---

    /// Build a generation from the enabled routes and publish it.
    /// Returns the new generation id.
    pub fn rebuild(&self) -> Result<u64> {
        let _rebuilding = lock(&self.rebuild_lock);
        let (routes, middleware) = {
            let pending = lock(&self.pending);
            (pending.routes.clone(), pending.middleware.clone())
        };

        let global = HandlerChain::concat(
            middleware
                .iter()
                .filter(|m| m.global && m.enabled)
                .map(|m| &m.chain),
        );
        let resolved = routes
            .iter()
            .filter(|r| r.enabled)
            .map(|r| resolve(r, &middleware))
            .collect::<Result<Vec<_>>>()?;

        let id = self.coordinator.current_id() + 1;
        let generation = builder::build(&resolved, global, id)?;
        self.coordinator.publish(generation);
        Ok(id)
    }

    // --- lookup ---

    /// The published generation.
    pub fn current(&self) -> Arc<Generation> {
        self.coordinator.current()
    }

    pub fn generation_id(&self) -> u64 {
        self.coordinator.current_id()
    }

    /// Match against the published generation. The returned endpoint
    /// stays valid across later rebuilds.
    pub fn lookup(&self, method: &Method, path: &str, params: &mut Params) -> Result<Arc<Endpoint>> {
        self.current().find_endpoint(method, path, params)
    }

    // --- listing ---

    /// Every pending registration, in registration order.
    pub fn routes(&self) -> Vec<RouteSummary> {
        lock(&self.pending).routes.iter().map(Registration::summary).collect()
    }

    pub fn middleware(&self) -> Vec<MiddlewareSummary> {
        lock(&self.pending)
            .middleware
            .iter()
            .map(|m| MiddlewareSummary {
                name: m.name.clone(),
                global: m.global,
                enabled: m.enabled,
            })
            .collect()
    }
}

/// A copy of `route` whose chain runs its enabled named middleware first.
fn resolve(route: &Registration, middleware: &[Middleware]) -> Result<Registration> {
    let mut chains = Vec::with_capacity(route.middleware.len());
    for name in &route.middleware {
        let m = middleware
            .iter()
            .find(|m| &m.name == name)
            .ok_or_else(|| RoutingError::unknown_middleware(name.clone()))?;
        if m.enabled {
            chains.push(&m.chain);
        }
    }
    let mut resolved = route.clone();
    resolved.chain = route.chain.prepend(&HandlerChain::concat(chains));
    Ok(resolved)
}
