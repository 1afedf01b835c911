//! Table builder: registrations in, generation out.
//!
//! # Data Flow
//! ```text
//! Registration (method, pattern, chain)
//!     → pattern::parse       (syntax, wildcard position)
//!     → RouteTree::insert    (split / reuse nodes, conflict checks)
//!     → build(id)            (freeze into a Generation)
//! ```
//!
//! The builder owns its working tree outright; nothing else can observe
//! it until `build` hands the finished tree to a `Generation`.

use std::sync::Arc;

use crate::handler::HandlerChain;
use crate::routing::error::Result;
use crate::routing::generation::{Generation, RouteSummary};
use crate::routing::pattern::{param_names, parse};
use crate::routing::router::Registration;
use crate::routing::tree::{Endpoint, RouteTree};

/// Builds one generation from a sequence of registrations.
#[derive(Debug, Default)]
pub struct TableBuilder {
    tree: RouteTree,
    global: HandlerChain,
    summaries: Vec<RouteSummary>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder that prepends `global` to every endpoint chain.
    pub fn with_middleware(global: HandlerChain) -> Self {
        Self {
            global,
            ..Self::default()
        }
    }

    /// Add one registration. On error the builder is exactly as it was
    /// before the call and may still be used for others.
    pub fn add(&mut self, registration: &Registration) -> Result<()> {
        let tokens = parse(&registration.pattern)?;
        let endpoint = Endpoint {
            name: Arc::from(registration.name.as_str()),
            pattern: Arc::from(registration.pattern.as_str()),
            param_names: Arc::from(param_names(&tokens)),
            chain: registration.chain.prepend(&self.global),
        };
        self.tree.insert(&registration.method, &tokens, endpoint)?;
        self.summaries.push(registration.summary());
        Ok(())
    }

    /// Number of endpoints added so far.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Freeze the tree into generation `id`.
    pub fn build(self, id: u64) -> Generation {
        let count = self.tree.len();
        Generation::new(id, self.tree.into_root(), count, self.summaries)
    }
}

/// Build a generation from `registrations` in order.
pub fn build<'r>(
    registrations: impl IntoIterator<Item = &'r Registration>,
    global: HandlerChain,
    id: u64,
) -> Result<Generation> {
    let mut builder = TableBuilder::with_middleware(global);
    for registration in registrations {
        builder.add(registration)?;
    }
    Ok(builder.build(id))
}
