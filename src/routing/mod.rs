//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (method, pattern, chain)
//!     → router.rs   (pending set, validated against a staged tree)
//!     → builder.rs  (pattern.rs + tree.rs build a private tree)
//!     → generation.rs (frozen snapshot with id)
//!     → coordinator.rs (atomic publish)
//!
//! Request (method, path)
//!     → coordinator.rs (capture current generation)
//!     → matcher.rs (walk tree, bind params.rs slot)
//!     → Endpoint (handler chain) | NotFound | MethodNotAllowed(allow)
//! ```
//!
//! # Design Decisions
//! - Generations are immutable; rebuilding never touches a published tree
//! - Lookups are lock-free and never wait on a rebuild
//! - Static beats param beats catch-all at every node
//! - Building and matching never log; callers decide what an error means

pub mod builder;
pub mod coordinator;
pub mod error;
pub mod generation;
pub mod matcher;
pub mod params;
pub mod pattern;
pub mod router;
pub mod tree;

pub use builder::TableBuilder;
pub use coordinator::GenerationCoordinator;
pub use error::{ConflictReason, Result, RoutingError};
pub use generation::{Generation, RouteSummary};
pub use matcher::{AllowedMethods, RouteMatch};
pub use params::Params;
pub use router::{Middleware, MiddlewareSummary, Registration, Router, ANY_METHODS};
pub use tree::{Endpoint, Node, NodeKind};
