//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! dispatch, rebuilds, generation drops, admin, lifecycle
//!     → logging.rs (tracing events, pretty or JSON lines on stdout)
//!     → metrics.rs (metrics facade → Prometheus scrape endpoint)
//! ```
//!
//! # Design Decisions
//! - The matcher and tree builder emit nothing; callers log outcomes
//! - Request ID is a field on every request span
//! - Without an installed recorder, metric calls cost nothing

pub mod logging;
pub mod metrics;
