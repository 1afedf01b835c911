//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!     → handler::registry (registrations + middleware)
//!     → Router::replace_all + rebuild
//!
//! On reload (file change, SIGHUP, POST /admin/reload):
//!     watcher.rs / signal / admin loads new config
//!     → validation.rs validates
//!     → mpsc channel to the server's reload task
//!     → new generation published; old one drains
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - A rejected reload keeps the current generation serving

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AdminConfig, HandlerConfig, ListenerConfig, LogFormat, MiddlewareConfig, MiddlewareKind,
    ObservabilityConfig, RouteConfig, RouterConfig,
};
pub use validation::ValidationError;
pub use watcher::ConfigWatcher;
