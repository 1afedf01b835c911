//! Compressed prefix tree of route patterns.
//!
//! # Layout
//! ```text
//! ""                      root
//! └── "/"
//!     ├── "users/"
//!     │   ├── "new"       GET
//!     │   └── :id         GET, POST
//!     │       └── "/files/"
//!     │           └── :fid GET
//!     └── "static/"
//!         └── *rest       GET
//! ```
//!
//! # Invariants
//! - Static siblings never share a first character (maximal compression),
//!   so at most one static child can match any remaining path.
//! - At most one param child and at most one catch-all child per node,
//!   and never both.
//! - Catch-all nodes are leaves.

use std::sync::Arc;

use axum::http::Method;

use crate::handler::HandlerChain;
use crate::routing::error::{ConflictReason, Result, RoutingError};
use crate::routing::pattern::Token;

/// Kind of edge leading into a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Static,
    Param,
    CatchAll,
}

/// A routable endpoint bound to one method on one node.
#[derive(Debug)]
pub struct Endpoint {
    /// Route name (for logs and the admin listing).
    pub name: Arc<str>,
    /// Pattern as registered.
    pub pattern: Arc<str>,
    /// Parameter names of this endpoint's own pattern, in order.
    pub param_names: Arc<[String]>,
    /// Effective handler chain (global middleware included).
    pub chain: HandlerChain,
}

/// One edge-compressed segment of the tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) segment: String,
    pub(crate) kind: NodeKind,
    pub(crate) param_name: Option<String>,
    pub(crate) static_children: Vec<Node>,
    pub(crate) param_child: Option<Box<Node>>,
    pub(crate) catch_all_child: Option<Box<Node>>,
    pub(crate) endpoints: Vec<(Method, Arc<Endpoint>)>,
    /// `(method, name)` claims made by patterns passing through a
    /// param or catch-all node.
    claims: Vec<(Method, String)>,
}

impl Node {
    fn new(kind: NodeKind, segment: String, param_name: Option<String>) -> Self {
        Self {
            segment,
            kind,
            param_name,
            static_children: Vec::new(),
            param_child: None,
            catch_all_child: None,
            endpoints: Vec::new(),
            claims: Vec::new(),
        }
    }

    pub(crate) fn root() -> Self {
        Self::new(NodeKind::Static, String::new(), None)
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn param_name(&self) -> Option<&str> {
        self.param_name.as_deref()
    }

    /// True if this node terminates at least one route.
    pub fn is_endpoint(&self) -> bool {
        !self.endpoints.is_empty()
    }

    /// Children in match precedence order: static, param, catch-all.
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.static_children
            .iter()
            .chain(self.param_child.as_deref())
            .chain(self.catch_all_child.as_deref())
    }

    pub(crate) fn endpoint(&self, method: &Method) -> Option<&Arc<Endpoint>> {
        self.endpoints
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, e)| e)
    }

    pub(crate) fn methods(&self) -> impl Iterator<Item = &Method> {
        self.endpoints.iter().map(|(m, _)| m)
    }

    /// The static child whose literal could start `rest`.
    pub(crate) fn static_child_for(&self, rest: &str) -> Option<&Node> {
        let first = rest.chars().next()?;
        self.static_children
            .iter()
            .find(|c| c.segment.starts_with(first))
    }

    fn insert_static(&mut self, literal: &str) -> &mut Node {
        if literal.is_empty() {
            return self;
        }
        let first = literal.chars().next();
        let pos = self
            .static_children
            .iter()
            .position(|c| c.segment.chars().next() == first);

        let idx = match pos {
            Some(idx) => idx,
            None => {
                self.static_children
                    .push(Node::new(NodeKind::Static, literal.to_string(), None));
                let last = self.static_children.len() - 1;
                return &mut self.static_children[last];
            }
        };

        let common = common_prefix_len(&self.static_children[idx].segment, literal);
        if common < self.static_children[idx].segment.len() {
            split(&mut self.static_children[idx], common);
        }
        self.static_children[idx].insert_static(&literal[common..])
    }

    /// The existing node `literal` leads to, or `None` if inserting it
    /// would create (or split off) a fresh node.
    fn descend_static(&self, literal: &str) -> Option<&Node> {
        if literal.is_empty() {
            return Some(self);
        }
        let first = literal.chars().next();
        let child = self
            .static_children
            .iter()
            .find(|c| c.segment.chars().next() == first)?;
        child.descend_static(literal.strip_prefix(child.segment.as_str())?)
    }

    /// Conflict checks for a wildcard edge, without touching the tree.
    /// Returns the existing child the edge would reuse.
    fn check_wildcard(&self, kind: NodeKind, name: &str, method: &Method, pattern: &str) -> Result<Option<&Node>> {
        let (same, other) = match kind {
            NodeKind::Param => (&self.param_child, &self.catch_all_child),
            _ => (&self.catch_all_child, &self.param_child),
        };
        if other.is_some() {
            return Err(RoutingError::conflict(pattern, ConflictReason::WildcardSibling));
        }
        if let Some(existing) = same {
            if let Some((_, taken)) = existing
                .claims
                .iter()
                .find(|(m, n)| m == method && n != name)
            {
                return Err(RoutingError::conflict(
                    pattern,
                    ConflictReason::ParamName {
                        existing: taken.clone(),
                        incoming: name.to_string(),
                    },
                ));
            }
        }
        Ok(same.as_deref())
    }

    fn insert_wildcard(&mut self, kind: NodeKind, name: &str, method: &Method) -> &mut Node {
        let slot = match kind {
            NodeKind::Param => &mut self.param_child,
            _ => &mut self.catch_all_child,
        };
        let child = slot.get_or_insert_with(|| {
            let marker = if kind == NodeKind::Param { ':' } else { '*' };
            Box::new(Node::new(kind, format!("{}{}", marker, name), Some(name.to_string())))
        });
        if !child.claims.iter().any(|(m, n)| m == method && n == name) {
            child.claims.push((method.clone(), name.to_string()));
        }
        child
    }
}

/// Split `node` so that its segment ends after `at` bytes; the remainder
/// keeps the original children and endpoints.
fn split(node: &mut Node, at: usize) {
    let suffix = node.segment.split_off(at);
    let mut tail = Node::new(NodeKind::Static, suffix, None);
    tail.static_children = std::mem::take(&mut node.static_children);
    tail.param_child = node.param_child.take();
    tail.catch_all_child = node.catch_all_child.take();
    tail.endpoints = std::mem::take(&mut node.endpoints);
    node.static_children.push(tail);
}

/// Length in bytes of the longest common prefix, on char boundaries.
fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .map(|(c, _)| c.len_utf8())
        .sum()
}

/// A mutable working tree. Only the table builder touches one; once
/// wrapped in a generation it is never mutated again.
#[derive(Debug, Clone)]
pub struct RouteTree {
    root: Node,
    routes: usize,
}

impl Default for RouteTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTree {
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            routes: 0,
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Number of `(method, pattern)` endpoints in the tree.
    pub fn len(&self) -> usize {
        self.routes
    }

    pub fn is_empty(&self) -> bool {
        self.routes == 0
    }

    /// Insert an endpoint for `method` along the parsed `tokens`.
    ///
    /// All-or-nothing: every conflict is found before the tree is
    /// changed, so a rejected insert leaves no splits or claims behind.
    pub fn insert(&mut self, method: &Method, tokens: &[Token], endpoint: Endpoint) -> Result<()> {
        let pattern = Arc::clone(&endpoint.pattern);
        self.check(method, tokens, &pattern)?;

        let mut node = &mut self.root;
        for token in tokens {
            node = match token {
                Token::Static(literal) => node.insert_static(literal),
                Token::Param(name) => node.insert_wildcard(NodeKind::Param, name, method),
                Token::CatchAll(name) => node.insert_wildcard(NodeKind::CatchAll, name, method),
            };
        }
        node.endpoints.push((method.clone(), Arc::new(endpoint)));
        self.routes += 1;
        Ok(())
    }

    /// Would inserting `tokens` for `method` conflict with the tree?
    fn check(&self, method: &Method, tokens: &[Token], pattern: &str) -> Result<()> {
        let mut node = Some(&self.root);
        for (i, token) in tokens.iter().enumerate() {
            if matches!(token, Token::CatchAll(_)) && i + 1 != tokens.len() {
                return Err(RoutingError::conflict(pattern, ConflictReason::WildcardNotFinal));
            }
            // Past this point the path runs through fresh nodes only.
            let Some(current) = node else { continue };
            node = match token {
                Token::Static(literal) => current.descend_static(literal),
                Token::Param(name) => current.check_wildcard(NodeKind::Param, name, method, pattern)?,
                Token::CatchAll(name) => current.check_wildcard(NodeKind::CatchAll, name, method, pattern)?,
            };
        }

        match node {
            Some(terminal) if terminal.endpoint(method).is_some() => Err(RoutingError::conflict(
                pattern,
                ConflictReason::DuplicateRoute(method.clone()),
            )),
            _ => Ok(()),
        }
    }

    pub(crate) fn into_root(self) -> Node {
        self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::pattern::parse;

    fn endpoint(pattern: &str) -> Endpoint {
        let tokens = parse(pattern).unwrap();
        Endpoint {
            name: Arc::from(pattern),
            pattern: Arc::from(pattern),
            param_names: Arc::from(crate::routing::pattern::param_names(&tokens)),
            chain: HandlerChain::empty(),
        }
    }

    fn insert(tree: &mut RouteTree, method: Method, pattern: &str) -> Result<()> {
        let tokens = parse(pattern)?;
        tree.insert(&method, &tokens, endpoint(pattern))
    }

    fn assert_compressed(node: &Node) {
        let mut firsts: Vec<char> = node
            .static_children
            .iter()
            .filter_map(|c| c.segment.chars().next())
            .collect();
        let before = firsts.len();
        firsts.sort_unstable();
        firsts.dedup();
        assert_eq!(before, firsts.len(), "siblings under '{}' share a prefix", node.segment);
        if let Some(c) = &node.catch_all_child {
            assert!(c.children().next().is_none(), "catch-all must be a leaf");
        }
        node.children().for_each(assert_compressed);
    }

    #[test]
    fn test_split_on_common_prefix() {
        let mut tree = RouteTree::new();
        insert(&mut tree, Method::GET, "/users").unwrap();
        insert(&mut tree, Method::GET, "/uploads").unwrap();

        let slash = &tree.root().static_children[0];
        assert_eq!(slash.segment(), "/u");
        let segs: Vec<&str> = slash.children().map(Node::segment).collect();
        assert_eq!(segs, vec!["sers", "ploads"]);
        assert!(slash.children().all(Node::is_endpoint));
        assert_compressed(tree.root());
    }

    #[test]
    fn test_split_preserves_endpoints() {
        let mut tree = RouteTree::new();
        insert(&mut tree, Method::GET, "/users/new").unwrap();
        insert(&mut tree, Method::GET, "/users").unwrap();

        let users = &tree.root().static_children[0];
        assert_eq!(users.segment(), "/users");
        assert!(users.is_endpoint());
        assert_eq!(users.static_children[0].segment(), "/new");
        assert!(users.static_children[0].is_endpoint());
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_param_reuse_and_conflict() {
        let mut tree = RouteTree::new();
        insert(&mut tree, Method::GET, "/users/:id").unwrap();
        insert(&mut tree, Method::POST, "/users/:id").unwrap();
        insert(&mut tree, Method::GET, "/users/:id/files").unwrap();

        let err = insert(&mut tree, Method::GET, "/users/:uid").unwrap_err();
        assert!(matches!(
            err,
            RoutingError::PatternConflict { reason: ConflictReason::ParamName { .. }, .. }
        ));

        // Disjoint methods may name the position differently.
        insert(&mut tree, Method::DELETE, "/users/:uid").unwrap();
        assert_compressed(tree.root());
    }

    #[test]
    fn test_wildcard_siblings_conflict() {
        let mut tree = RouteTree::new();
        insert(&mut tree, Method::GET, "/files/:name").unwrap();
        let err = insert(&mut tree, Method::GET, "/files/*rest").unwrap_err();
        assert!(matches!(
            err,
            RoutingError::PatternConflict { reason: ConflictReason::WildcardSibling, .. }
        ));

        let mut tree = RouteTree::new();
        insert(&mut tree, Method::GET, "/files/*rest").unwrap();
        let err = insert(&mut tree, Method::GET, "/files/:name").unwrap_err();
        assert!(matches!(
            err,
            RoutingError::PatternConflict { reason: ConflictReason::WildcardSibling, .. }
        ));
    }

    #[test]
    fn test_duplicate_route() {
        let mut tree = RouteTree::new();
        insert(&mut tree, Method::GET, "/a").unwrap();
        let err = insert(&mut tree, Method::GET, "/a/").unwrap_err();
        assert!(matches!(
            err,
            RoutingError::PatternConflict { reason: ConflictReason::DuplicateRoute(_), .. }
        ));
        insert(&mut tree, Method::PUT, "/a").unwrap();
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_rejected_insert_leaves_tree_untouched() {
        let mut tree = RouteTree::new();
        insert(&mut tree, Method::GET, "/a/:x/:z").unwrap();
        let before = format!("{:?}", tree.root());

        let err = insert(&mut tree, Method::POST, "/a/:y/*r").unwrap_err();
        assert!(matches!(
            err,
            RoutingError::PatternConflict { reason: ConflictReason::WildcardSibling, .. }
        ));
        assert_eq!(format!("{:?}", tree.root()), before);

        // `:y` was never accepted, so it claims nothing.
        insert(&mut tree, Method::POST, "/a/:w").unwrap();
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_rejected_duplicate_does_not_split() {
        let mut tree = RouteTree::new();
        insert(&mut tree, Method::GET, "/users").unwrap();
        insert(&mut tree, Method::GET, "/users/:id").unwrap();
        let before = format!("{:?}", tree.root());

        assert!(insert(&mut tree, Method::GET, "/users/:id").is_err());
        assert_eq!(format!("{:?}", tree.root()), before);
        insert(&mut tree, Method::GET, "/use").unwrap();
        assert_compressed(tree.root());
    }

    #[test]
    fn test_unicode_literals_split_on_char_boundary() {
        let mut tree = RouteTree::new();
        insert(&mut tree, Method::GET, "/caf\u{e9}").unwrap();
        insert(&mut tree, Method::GET, "/caf\u{e7}").unwrap();
        assert_compressed(tree.root());
        assert_eq!(tree.len(), 2);
    }
}
