//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → HandlerRegistry → Router::replace_all → rebuild → listeners
//!
//! Reload (startup.rs, signals.rs, config::watcher):
//!     file change / SIGHUP / admin → load + validate → apply_config
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → broadcast → stop accepting → drain in-flight → exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then the first generation, then listeners
//! - A rejected reload never touches the published generation

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
