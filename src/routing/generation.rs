//! Immutable routing table snapshots.
//!
//! # Lifecycle
//! ```text
//! building (TableBuilder) → published (coordinator) → superseded → reclaimed
//! ```
//! A generation is reclaimed when the last `Arc` goes away: the
//! coordinator's slot and every in-flight request that captured it.

use std::sync::Arc;
use std::time::SystemTime;

use axum::http::Method;
use serde::Serialize;

use crate::observability::metrics;
use crate::routing::error::Result;
use crate::routing::matcher::{self, RouteMatch};
use crate::routing::params::Params;
use crate::routing::tree::{Endpoint, Node};

/// Listing entry for one registered `(method, pattern)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSummary {
    pub name: String,
    pub method: String,
    pub pattern: String,
    pub group: Option<String>,
    pub enabled: bool,
}

/// One fully-built, never-mutated version of the routing tree.
#[derive(Debug)]
pub struct Generation {
    id: u64,
    root: Node,
    route_count: usize,
    built_at: SystemTime,
    routes: Vec<RouteSummary>,
}

impl Generation {
    pub(crate) fn new(id: u64, root: Node, route_count: usize, mut routes: Vec<RouteSummary>) -> Self {
        routes.sort_by(|a, b| (&a.pattern, &a.method).cmp(&(&b.pattern, &b.method)));
        metrics::generation_created();
        Self {
            id,
            root,
            route_count,
            built_at: SystemTime::now(),
            routes,
        }
    }

    /// Generation 0: no routes.
    pub fn empty() -> Self {
        Self::new(0, Node::root(), 0, Vec::new())
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Number of `(method, pattern)` endpoints.
    pub fn route_count(&self) -> usize {
        self.route_count
    }

    pub fn built_at(&self) -> SystemTime {
        self.built_at
    }

    /// Routes in this generation, sorted by pattern then method.
    pub fn routes(&self) -> &[RouteSummary] {
        &self.routes
    }

    /// Match against this generation.
    pub fn lookup<'g>(&'g self, method: &Method, path: &str, params: &mut Params) -> Result<RouteMatch<'g>> {
        matcher::find(&self.root, method, path, params)
    }

    /// Match and detach the endpoint from the generation's lifetime.
    pub fn find_endpoint(&self, method: &Method, path: &str, params: &mut Params) -> Result<Arc<Endpoint>> {
        self.lookup(method, path, params)
            .map(|m| Arc::clone(m.endpoint()))
    }
}

impl Drop for Generation {
    fn drop(&mut self) {
        tracing::trace!(generation = self.id, routes = self.route_count, "Generation reclaimed");
        metrics::generation_reclaimed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::error::RoutingError;

    #[test]
    fn test_empty_generation() {
        let g = Generation::empty();
        assert_eq!(g.id(), 0);
        assert_eq!(g.route_count(), 0);
        let mut params = Params::new();
        assert!(matches!(
            g.lookup(&Method::GET, "/", &mut params),
            Err(RoutingError::NotFound)
        ));
    }

    #[test]
    fn test_routes_sorted() {
        let summary = |method: &str, pattern: &str| RouteSummary {
            name: pattern.to_string(),
            method: method.to_string(),
            pattern: pattern.to_string(),
            group: None,
            enabled: true,
        };
        let g = Generation::new(
            3,
            Node::root(),
            0,
            vec![summary("POST", "/b"), summary("GET", "/b"), summary("GET", "/a")],
        );
        let order: Vec<(&str, &str)> = g
            .routes()
            .iter()
            .map(|r| (r.method.as_str(), r.pattern.as_str()))
            .collect();
        assert_eq!(order, vec![("GET", "/a"), ("GET", "/b"), ("POST", "/b")]);
    }
}
