//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, tower-http layers)
//!     → request.rs (request ID)
//!     → dispatch: capture generation → match → context.rs
//!     → handler chain writes the response into the Context
//!     → Context::into_response → client
//! ```

pub mod context;
pub mod request;
pub mod server;

pub use context::Context;
pub use request::{request_id, UuidRequestId, X_REQUEST_ID};
pub use server::{build_app, HttpServer, ServerError};
