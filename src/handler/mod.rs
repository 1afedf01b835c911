//! Handler chains.
//!
//! # Data Flow
//! ```text
//! RouteMatch
//!     → HandlerChain (global middleware ++ route middleware ++ endpoint)
//!     → each Handler::handle(&mut Context) in order
//!     → stop on first error or once the response is committed
//! ```
//!
//! # Design Decisions
//! - One capability: process a request context, return success or an error
//! - Chains are immutable `Arc` slices, shared by every generation that
//!   binds them; rebuilding never copies handlers
//! - The router stores chains by reference and never inspects them

pub mod builtin;
pub mod registry;

use std::fmt;
use std::sync::Arc;

use axum::http::StatusCode;
use thiserror::Error;

use crate::http::Context;

/// Error returned by a handler.
#[derive(Debug, Clone, Error)]
pub enum HandlerError {
    /// An error with an HTTP status meant for the client.
    #[error("{status}: {message}")]
    Http {
        status: StatusCode,
        message: String,
    },

    /// Anything else; surfaces as 500.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Status the error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::Http { status, .. } => *status,
            HandlerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(e: serde_json::Error) -> Self {
        HandlerError::Internal(e.to_string())
    }
}

/// A unit of request processing.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, ctx: &mut Context) -> Result<(), HandlerError>;
}

impl<F> Handler for F
where
    F: Fn(&mut Context) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    fn handle(&self, ctx: &mut Context) -> Result<(), HandlerError> {
        self(ctx)
    }
}

/// An ordered, shareable sequence of handlers.
#[derive(Clone)]
pub struct HandlerChain {
    units: Arc<[Arc<dyn Handler>]>,
}

impl HandlerChain {
    pub fn new(units: Vec<Arc<dyn Handler>>) -> Self {
        Self {
            units: Arc::from(units),
        }
    }

    /// A chain with a single handler.
    pub fn from_handler(handler: impl Handler) -> Self {
        Self::new(vec![Arc::new(handler)])
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// A new chain running `front` before this one.
    pub fn prepend(&self, front: &HandlerChain) -> Self {
        if front.is_empty() {
            return self.clone();
        }
        let units = front
            .units
            .iter()
            .chain(self.units.iter())
            .cloned()
            .collect::<Vec<_>>();
        Self::new(units)
    }

    /// Join chains end to end.
    pub fn concat<'a>(chains: impl IntoIterator<Item = &'a HandlerChain>) -> Self {
        let units = chains
            .into_iter()
            .flat_map(|c| c.units.iter().cloned())
            .collect::<Vec<_>>();
        Self::new(units)
    }

    /// Run every unit in order.
    pub fn run(&self, ctx: &mut Context) -> Result<(), HandlerError> {
        for unit in self.units.iter() {
            unit.handle(ctx)?;
            if ctx.is_committed() {
                break;
            }
        }
        Ok(())
    }

    /// True if both chains share the same handler storage.
    pub fn ptr_eq(&self, other: &HandlerChain) -> bool {
        Arc::ptr_eq(&self.units, &other.units)
    }
}

impl Default for HandlerChain {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerChain")
            .field("len", &self.units.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    fn tag(label: &'static str) -> Arc<dyn Handler> {
        Arc::new(move |ctx: &mut Context| -> Result<(), HandlerError> {
            let seen = ctx
                .get("trail")
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            ctx.set("trail", format!("{}{}", seen, label).into());
            Ok(())
        })
    }

    #[test]
    fn test_chain_runs_in_order() {
        let chain = HandlerChain::new(vec![tag("a"), tag("b")]).prepend(&HandlerChain::new(vec![tag("m")]));
        let mut ctx = Context::new(Method::GET, "/".parse().unwrap(), Default::default());
        chain.run(&mut ctx).unwrap();
        assert_eq!(ctx.get("trail").and_then(|v| v.as_str()), Some("mab"));
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn test_chain_stops_when_committed() {
        let reject: Arc<dyn Handler> = Arc::new(|ctx: &mut Context| -> Result<(), HandlerError> {
            ctx.string(StatusCode::UNAUTHORIZED, "denied");
            Ok(())
        });
        let chain = HandlerChain::new(vec![reject, tag("x")]);
        let mut ctx = Context::new(Method::GET, "/".parse().unwrap(), Default::default());
        chain.run(&mut ctx).unwrap();
        assert_eq!(ctx.status(), StatusCode::UNAUTHORIZED);
        assert!(ctx.get("trail").is_none());
    }

    #[test]
    fn test_chain_stops_on_error() {
        let fail: Arc<dyn Handler> = Arc::new(|_: &mut Context| -> Result<(), HandlerError> {
            Err(HandlerError::http(StatusCode::BAD_REQUEST, "bad"))
        });
        let chain = HandlerChain::new(vec![fail, tag("x")]);
        let mut ctx = Context::new(Method::GET, "/".parse().unwrap(), Default::default());
        let err = chain.run(&mut ctx).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(ctx.get("trail").is_none());
    }

    #[test]
    fn test_prepend_empty_shares_storage() {
        let chain = HandlerChain::new(vec![tag("a")]);
        assert!(chain.prepend(&HandlerChain::empty()).ptr_eq(&chain));
    }
}
