//! Atomic publication of generations.
//!
//! # Data Flow
//! ```text
//! request task:  current() ──▶ ArcSwap::load_full() ──▶ Arc<Generation> (held to completion)
//! rebuild task:  publish(g) ──▶ ArcSwap::swap()       ──▶ previous Arc<Generation> (superseded)
//! ```
//!
//! # Design Decisions
//! - Readers never lock; the swap is the only synchronization point
//! - A superseded generation stays alive until its last reader finishes
//! - Exactly one generation is published at any time

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::routing::generation::Generation;

/// Holds the currently published generation.
#[derive(Debug)]
pub struct GenerationCoordinator {
    current: ArcSwap<Generation>,
}

impl GenerationCoordinator {
    /// Start with the empty generation 0.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Generation::empty()),
        }
    }

    /// The published generation. The caller's `Arc` keeps it alive even
    /// after a newer one is published.
    pub fn current(&self) -> Arc<Generation> {
        self.current.load_full()
    }

    /// Id of the published generation.
    pub fn current_id(&self) -> u64 {
        self.current.load().id()
    }

    /// Publish `generation`, returning the one it supersedes.
    pub fn publish(&self, generation: Generation) -> Arc<Generation> {
        self.current.swap(Arc::new(generation))
    }
}

impl Default for GenerationCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::tree::Node;

    #[test]
    fn test_publish_supersedes() {
        let coordinator = GenerationCoordinator::new();
        assert_eq!(coordinator.current_id(), 0);

        let held = coordinator.current();
        let old = coordinator.publish(Generation::new(1, Node::root(), 0, Vec::new()));
        assert_eq!(old.id(), 0);
        assert_eq!(coordinator.current_id(), 1);

        // A reader that captured generation 0 still holds it.
        assert_eq!(held.id(), 0);
        assert!(Arc::ptr_eq(&held, &old));
    }
}
