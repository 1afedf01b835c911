//! Hot-swappable HTTP router.
//!
//! Routes live in a radix tree that is rebuilt off to the side and
//! published atomically as a new generation; in-flight requests finish on
//! the generation they started with.

pub mod admin;
pub mod config;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::RouterConfig;
pub use handler::{Handler, HandlerChain, HandlerError};
pub use http::{Context, HttpServer};
pub use lifecycle::Shutdown;
pub use routing::{Router, RoutingError};
