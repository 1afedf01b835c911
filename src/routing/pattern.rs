//! Route pattern parsing.
//!
//! A pattern is a slash-delimited template. A segment starting with `:`
//! binds one path segment to a name, a segment starting with `*` binds the
//! whole remainder and must come last. Everything else is literal, and
//! literal runs keep their slashes so the tree can compress them:
//!
//! ```text
//! /users/:uid/files/:fid  →  Static("/users/") Param("uid") Static("/files/") Param("fid")
//! /static/*rest           →  Static("/static/") CatchAll("rest")
//! ```

use std::borrow::Cow;

use crate::routing::error::{ConflictReason, Result, RoutingError};

/// One parsed piece of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Literal text, slashes included.
    Static(String),
    /// Named single-segment parameter.
    Param(String),
    /// Named catch-all; always the last token.
    CatchAll(String),
}

/// Parse a pattern into tokens.
pub fn parse(pattern: &str) -> Result<Vec<Token>> {
    let invalid = |msg: &str| RoutingError::conflict(pattern, ConflictReason::InvalidSyntax(msg.to_string()));

    if !pattern.starts_with('/') {
        return Err(invalid("pattern must start with '/'"));
    }
    let normalized = normalize_path(pattern);

    let mut tokens = Vec::new();
    let mut names: Vec<&str> = Vec::new();
    let mut literal = String::from("/");
    let segments: Vec<&str> = normalized[1..].split('/').collect();
    let last = segments.len().saturating_sub(1);

    for (i, segment) in segments.iter().enumerate() {
        if let Some(name) = segment.strip_prefix(':') {
            check_name(pattern, name, &names)?;
            names.push(name);
            tokens.push(Token::Static(std::mem::take(&mut literal)));
            tokens.push(Token::Param(name.to_string()));
        } else if let Some(name) = segment.strip_prefix('*') {
            if i != last {
                return Err(RoutingError::conflict(pattern, ConflictReason::WildcardNotFinal));
            }
            check_name(pattern, name, &names)?;
            names.push(name);
            tokens.push(Token::Static(std::mem::take(&mut literal)));
            tokens.push(Token::CatchAll(name.to_string()));
        } else {
            if segment.is_empty() && i != last {
                return Err(invalid("empty segment"));
            }
            literal.push_str(segment);
        }
        if i != last {
            literal.push('/');
        }
    }
    if !literal.is_empty() {
        tokens.push(Token::Static(literal));
    }
    Ok(tokens)
}

fn check_name(pattern: &str, name: &str, seen: &[&str]) -> Result<()> {
    if name.is_empty() {
        return Err(RoutingError::conflict(
            pattern,
            ConflictReason::InvalidSyntax("parameter name must not be empty".to_string()),
        ));
    }
    if name.contains([':', '*']) {
        return Err(RoutingError::conflict(
            pattern,
            ConflictReason::InvalidSyntax(format!("invalid parameter name '{}'", name)),
        ));
    }
    if seen.contains(&name) {
        return Err(RoutingError::conflict(
            pattern,
            ConflictReason::InvalidSyntax(format!("parameter '{}' appears twice", name)),
        ));
    }
    Ok(())
}

/// Ordered parameter names of a token list.
pub fn param_names(tokens: &[Token]) -> Vec<String> {
    tokens
        .iter()
        .filter_map(|t| match t {
            Token::Param(name) | Token::CatchAll(name) => Some(name.clone()),
            Token::Static(_) => None,
        })
        .collect()
}

/// Normalize a request path or pattern: ensure a leading slash and drop a
/// single trailing slash (the root path stays `/`).
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    let trimmed = match path.strip_suffix('/') {
        Some(rest) if !rest.is_empty() => rest,
        _ => path,
    };
    if trimmed.starts_with('/') {
        Cow::Borrowed(trimmed)
    } else {
        Cow::Owned(format!("/{}", trimmed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Token {
        Token::Static(v.to_string())
    }

    #[test]
    fn test_static_pattern() {
        assert_eq!(parse("/").unwrap(), vec![s("/")]);
        assert_eq!(parse("/users/new").unwrap(), vec![s("/users/new")]);
        assert_eq!(parse("/users/new/").unwrap(), vec![s("/users/new")]);
    }

    #[test]
    fn test_param_pattern() {
        let tokens = parse("/users/:uid/files/:fid").unwrap();
        assert_eq!(
            tokens,
            vec![
                s("/users/"),
                Token::Param("uid".into()),
                s("/files/"),
                Token::Param("fid".into()),
            ]
        );
        assert_eq!(param_names(&tokens), vec!["uid", "fid"]);
    }

    #[test]
    fn test_catch_all_pattern() {
        let tokens = parse("/static/*rest").unwrap();
        assert_eq!(tokens, vec![s("/static/"), Token::CatchAll("rest".into())]);

        let root = parse("/*path").unwrap();
        assert_eq!(root, vec![s("/"), Token::CatchAll("path".into())]);
    }

    #[test]
    fn test_colon_inside_segment_is_literal() {
        assert_eq!(parse("/v1:beta/x").unwrap(), vec![s("/v1:beta/x")]);
    }

    #[test]
    fn test_wildcard_not_final() {
        let err = parse("/files/*rest/more").unwrap_err();
        assert!(matches!(
            err,
            RoutingError::PatternConflict { reason: ConflictReason::WildcardNotFinal, .. }
        ));
    }

    #[test]
    fn test_invalid_patterns() {
        for bad in ["users", "/users/:", "/a/*", "/a//b", "/:id/:id", "/a/:b:c"] {
            let err = parse(bad).unwrap_err();
            assert!(err.is_conflict(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/users/"), "/users");
        assert_eq!(normalize_path("users/1"), "/users/1");
        assert!(matches!(normalize_path("/users/1"), Cow::Borrowed(_)));
    }
}
