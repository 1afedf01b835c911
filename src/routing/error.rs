//! Routing error types.

use std::fmt;

use axum::http::Method;
use thiserror::Error;

use crate::routing::matcher::AllowedMethods;

/// Result type for routing operations.
pub type Result<T> = std::result::Result<T, RoutingError>;

/// Errors raised while registering, rebuilding or matching routes.
#[derive(Debug, Clone, Error)]
pub enum RoutingError {
    /// Two patterns cannot coexist, or a pattern is malformed.
    #[error("pattern conflict for '{pattern}': {reason}")]
    PatternConflict {
        /// Pattern being registered when the conflict was found.
        pattern: String,
        /// Why the pattern was rejected.
        reason: ConflictReason,
    },

    /// No route structurally matches the path.
    #[error("no route matches the request path")]
    NotFound,

    /// The path matches, but not for the requested method.
    #[error("method not allowed (allowed: {})", allowed.header_value())]
    MethodNotAllowed {
        /// Methods that would have matched the path.
        allowed: AllowedMethods,
    },

    /// A reconstruction operation named a route that is not registered.
    #[error("unknown route '{name}'")]
    UnknownRoute {
        /// Route name or `METHOD pattern` key.
        name: String,
    },

    /// A reconstruction operation named a group with no routes.
    #[error("unknown route group '{group}'")]
    UnknownGroup {
        /// Group name.
        group: String,
    },

    /// A reconstruction operation named a middleware that is not registered.
    #[error("unknown middleware '{name}'")]
    UnknownMiddleware {
        /// Middleware name.
        name: String,
    },
}

impl RoutingError {
    /// Create a PatternConflict error
    #[inline]
    pub fn conflict(pattern: impl Into<String>, reason: ConflictReason) -> Self {
        Self::PatternConflict {
            pattern: pattern.into(),
            reason,
        }
    }

    /// Create an UnknownRoute error
    #[inline]
    pub fn unknown_route(name: impl Into<String>) -> Self {
        Self::UnknownRoute { name: name.into() }
    }

    /// Create an UnknownGroup error
    #[inline]
    pub fn unknown_group(group: impl Into<String>) -> Self {
        Self::UnknownGroup {
            group: group.into(),
        }
    }

    /// Create an UnknownMiddleware error
    #[inline]
    pub fn unknown_middleware(name: impl Into<String>) -> Self {
        Self::UnknownMiddleware { name: name.into() }
    }

    /// True for errors raised by registration or rebuild.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::PatternConflict { .. })
    }
}

/// Reason attached to a [`RoutingError::PatternConflict`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictReason {
    /// The pattern itself is malformed.
    InvalidSyntax(String),
    /// A different parameter name is already bound at this position
    /// for an overlapping method.
    ParamName {
        /// Name already registered at the position.
        existing: String,
        /// Name the new pattern uses.
        incoming: String,
    },
    /// A catch-all segment is followed by more segments.
    WildcardNotFinal,
    /// A param and a catch-all would share one position.
    WildcardSibling,
    /// The method is already bound at the exact same pattern.
    DuplicateRoute(Method),
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictReason::InvalidSyntax(msg) => write!(f, "invalid pattern: {}", msg),
            ConflictReason::ParamName { existing, incoming } => write!(
                f,
                "parameter ':{}' conflicts with existing ':{}' at the same position",
                incoming, existing
            ),
            ConflictReason::WildcardNotFinal => write!(f, "catch-all must be the final segment"),
            ConflictReason::WildcardSibling => {
                write!(f, "catch-all and parameter cannot share a position")
            }
            ConflictReason::DuplicateRoute(method) => {
                write!(f, "{} is already registered for this pattern", method)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_message() {
        let err = RoutingError::conflict(
            "/users/:uid",
            ConflictReason::ParamName {
                existing: "id".into(),
                incoming: "uid".into(),
            },
        );
        let msg = err.to_string();
        assert!(msg.contains("/users/:uid"));
        assert!(msg.contains(":id"));
        assert!(err.is_conflict());
    }

    #[test]
    fn test_duplicate_message() {
        let err = RoutingError::conflict("/a", ConflictReason::DuplicateRoute(Method::GET));
        assert!(err.to_string().contains("GET is already registered"));
    }

    #[test]
    fn test_method_not_allowed_message() {
        let err = RoutingError::MethodNotAllowed {
            allowed: AllowedMethods::new(vec![Method::POST, Method::GET]),
        };
        assert!(err.to_string().contains("GET, POST"));
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_unknown_errors() {
        assert!(RoutingError::unknown_route("users").to_string().contains("users"));
        assert!(RoutingError::unknown_group("admin").to_string().contains("admin"));
        assert!(RoutingError::unknown_middleware("cors").to_string().contains("cors"));
    }
}
