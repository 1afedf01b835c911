//! Route matching.
//!
//! # Algorithm
//! A single pass over the normalized path with an explicit frame stack.
//! Each frame remembers which alternative it tries next:
//!
//! ```text
//! Enter → Static → Param → CatchAll → Done
//! ```
//!
//! A static child must be a prefix of the remaining path, a param child
//! takes one non-empty segment, a catch-all takes the non-empty rest.
//! When a frame is exhausted it is popped and its parent resumes with its
//! next alternative, truncating any values captured below it.
//!
//! # Design Decisions
//! - Reads only; never allocates in the tree, never logs
//! - Captures are byte ranges into the path until the match succeeds
//! - A fully consumed path whose node lacks the method keeps searching,
//!   so `/users/new` (POST only) does not hide `/users/:id` (GET)

use std::sync::Arc;

use axum::http::Method;

use crate::routing::error::{Result, RoutingError};
use crate::routing::params::Params;
use crate::routing::pattern::normalize_path;
use crate::routing::tree::{Endpoint, Node};

/// A successful match against one generation.
#[derive(Debug, Clone)]
pub struct RouteMatch<'g> {
    endpoint: &'g Arc<Endpoint>,
}

impl<'g> RouteMatch<'g> {
    /// The matched endpoint.
    pub fn endpoint(&self) -> &'g Arc<Endpoint> {
        self.endpoint
    }

    /// Pattern of the matched route, e.g. `/users/:id`.
    pub fn pattern(&self) -> &'g str {
        &self.endpoint.pattern
    }

    /// Route name.
    pub fn name(&self) -> &'g str {
        &self.endpoint.name
    }

    /// Handler chain bound to the route and method.
    pub fn chain(&self) -> &'g crate::handler::HandlerChain {
        &self.endpoint.chain
    }
}

/// Allowed methods for a matched path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedMethods {
    methods: Vec<Method>,
}

impl AllowedMethods {
    /// Create a normalized allow list, sorted and de-duplicated.
    pub fn new(mut methods: Vec<Method>) -> Self {
        methods.sort_by_key(method_order);
        methods.dedup();
        Self { methods }
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn contains(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Format as an HTTP Allow header value.
    pub fn header_value(&self) -> String {
        self.methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn method_order(method: &Method) -> (u8, String) {
    let rank = match *method {
        Method::GET => 0,
        Method::HEAD => 1,
        Method::POST => 2,
        Method::PUT => 3,
        Method::DELETE => 4,
        Method::PATCH => 5,
        Method::OPTIONS => 6,
        Method::TRACE => 7,
        Method::CONNECT => 8,
        _ => 9,
    };
    (rank, method.as_str().to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Enter,
    Static,
    Param,
    CatchAll,
    Done,
}

struct Frame<'t> {
    node: &'t Node,
    /// Byte offset into the path where this node's children start matching.
    pos: usize,
    /// Number of captures belonging to the ancestors of this frame.
    captured: usize,
    stage: Stage,
}

impl<'t> Frame<'t> {
    fn new(node: &'t Node, pos: usize, captured: usize) -> Self {
        Self {
            node,
            pos,
            captured,
            stage: Stage::Enter,
        }
    }
}

/// Resolve `method` and `path` against the tree rooted at `root`.
///
/// `params` is reset first and filled only on success.
pub fn find<'t>(root: &'t Node, method: &Method, path: &str, params: &mut Params) -> Result<RouteMatch<'t>> {
    params.reset();
    let path = normalize_path(path);
    let path: &str = &path;

    let mut captures: Vec<(usize, usize)> = Vec::new();
    let mut allowed: Vec<Method> = Vec::new();
    let mut stack = vec![Frame::new(root, 0, 0)];

    while let Some(top) = stack.last_mut() {
        let (node, pos, captured, stage) = (top.node, top.pos, top.captured, top.stage);
        let rest = &path[pos..];

        match stage {
            Stage::Enter => {
                if rest.is_empty() {
                    if let Some(endpoint) = node.endpoint(method) {
                        params.bind(
                            &endpoint.param_names,
                            captures.iter().map(|&(start, end)| &path[start..end]),
                        );
                        return Ok(RouteMatch { endpoint });
                    }
                    allowed.extend(node.methods().cloned());
                    top.stage = Stage::Done;
                } else {
                    top.stage = Stage::Static;
                }
            }
            Stage::Static => {
                top.stage = Stage::Param;
                if let Some(child) = node.static_child_for(rest) {
                    if rest.starts_with(child.segment.as_str()) {
                        captures.truncate(captured);
                        stack.push(Frame::new(child, pos + child.segment.len(), captures.len()));
                    }
                }
            }
            Stage::Param => {
                top.stage = Stage::CatchAll;
                if let Some(child) = node.param_child.as_deref() {
                    let end = rest.find('/').unwrap_or(rest.len());
                    if end > 0 {
                        captures.truncate(captured);
                        captures.push((pos, pos + end));
                        stack.push(Frame::new(child, pos + end, captures.len()));
                    }
                }
            }
            Stage::CatchAll => {
                top.stage = Stage::Done;
                if let Some(child) = node.catch_all_child.as_deref() {
                    captures.truncate(captured);
                    captures.push((pos, path.len()));
                    stack.push(Frame::new(child, path.len(), captures.len()));
                }
            }
            Stage::Done => {
                stack.pop();
            }
        }
    }

    if allowed.is_empty() {
        Err(RoutingError::NotFound)
    } else {
        Err(RoutingError::MethodNotAllowed {
            allowed: AllowedMethods::new(allowed),
        })
    }
}
