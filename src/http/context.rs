//! Per-request context handed to handler chains.
//!
//! # Responsibilities
//! - Carry the request line and headers the router and handlers need
//! - Own the Parameter Binding Slot filled by the matcher
//! - Hold a small key/value store shared between chain units
//! - Buffer the response until the chain returns
//!
//! # Design Decisions
//! - Handlers are synchronous; the body is not read, only request metadata
//! - The first writer commits the response; a committed chain stops running
//! - `reset` reuses the params buffer and the store's allocation

use std::collections::HashMap;

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::{Method, StatusCode, Uri};
use axum::response::Response;
use serde::Serialize;
use serde_json::Value;

use crate::handler::HandlerError;
use crate::routing::Params;

/// Request context for one in-flight request.
#[derive(Debug)]
pub struct Context {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    params: Params,
    route: Option<String>,
    store: HashMap<String, Value>,
    status: StatusCode,
    response_headers: HeaderMap,
    body: Vec<u8>,
    committed: bool,
}

impl Context {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self {
            method,
            uri,
            headers,
            params: Params::new(),
            route: None,
            store: HashMap::new(),
            status: StatusCode::OK,
            response_headers: HeaderMap::new(),
            body: Vec::new(),
            committed: false,
        }
    }

    /// Re-arm the context for another request.
    pub fn reset(&mut self, method: Method, uri: Uri, headers: HeaderMap) {
        self.method = method;
        self.uri = uri;
        self.headers = headers;
        self.params.reset();
        self.route = None;
        self.store.clear();
        self.status = StatusCode::OK;
        self.response_headers.clear();
        self.body.clear();
        self.committed = false;
    }

    // --- request ---

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Raw request path, without the query string.
    pub fn request_path(&self) -> &str {
        self.uri.path()
    }

    /// Raw query string, if any.
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A request header as text; non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// First value of a decoded query parameter.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.uri.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    // --- parameters ---

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    /// Ordered names bound by the last match.
    pub fn param_names(&self) -> &[String] {
        self.params.names()
    }

    /// Value bound to a named parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Value bound at a position.
    pub fn p(&self, index: usize) -> Option<&str> {
        self.params.at(index)
    }

    /// Pattern of the matched route, e.g. `/users/:id`.
    pub fn path(&self) -> Option<&str> {
        self.route.as_deref()
    }

    pub(crate) fn set_route(&mut self, pattern: &str) {
        self.route = Some(pattern.to_string());
    }

    // --- store ---

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.store.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.store.get(key)
    }

    // --- response ---

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    pub fn response_headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.response_headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Add a response header without committing.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<(), HandlerError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| HandlerError::internal(format!("invalid header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| HandlerError::internal(format!("invalid header value: {}", e)))?;
        self.response_headers.insert(name, value);
        Ok(())
    }

    /// Write a plain-text response.
    pub fn string(&mut self, status: StatusCode, body: impl Into<String>) {
        self.commit(status, "text/plain; charset=utf-8", body.into().into_bytes());
    }

    /// Serialize `value` as the JSON response.
    pub fn json<T: Serialize + ?Sized>(&mut self, status: StatusCode, value: &T) -> Result<(), HandlerError> {
        let body = serde_json::to_vec(value)?;
        self.commit(status, "application/json", body);
        Ok(())
    }

    /// Commit an empty response.
    pub fn no_content(&mut self, status: StatusCode) {
        self.status = status;
        self.body.clear();
        self.committed = true;
    }

    /// Commit a redirect to `location`.
    pub fn redirect(&mut self, status: StatusCode, location: &str) -> Result<(), HandlerError> {
        if !status.is_redirection() {
            return Err(HandlerError::internal(format!("{} is not a redirect status", status)));
        }
        let value = HeaderValue::from_str(location)
            .map_err(|e| HandlerError::internal(format!("invalid redirect location: {}", e)))?;
        self.response_headers.insert(header::LOCATION, value);
        self.no_content(status);
        Ok(())
    }

    /// Replace whatever was written with the error's response.
    pub fn error(&mut self, err: &HandlerError) {
        let message = match err {
            HandlerError::Http { message, .. } => message.clone(),
            HandlerError::Internal(_) => "internal server error".to_string(),
        };
        self.string(err.status(), message);
    }

    fn commit(&mut self, status: StatusCode, content_type: &'static str, body: Vec<u8>) {
        self.status = status;
        self.response_headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        self.body = body;
        self.committed = true;
    }

    /// Convert the buffered response into an axum response.
    pub fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.response_headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(uri: &str) -> Context {
        Context::new(Method::GET, uri.parse().unwrap(), HeaderMap::new())
    }

    #[test]
    fn test_query_param_decoding() {
        let c = ctx("/search?q=hot+swap&lang=rust%20lang&q=second");
        assert_eq!(c.query_param("q").as_deref(), Some("hot swap"));
        assert_eq!(c.query_param("lang").as_deref(), Some("rust lang"));
        assert_eq!(c.query_param("missing"), None);
        assert_eq!(c.request_path(), "/search");
    }

    #[test]
    fn test_param_accessors() {
        let mut c = ctx("/users/1/files/7");
        c.params_mut()
            .set(vec!["uid".into(), "fid".into()], vec!["1".into(), "7".into()]);
        c.set_route("/users/:uid/files/:fid");

        assert_eq!(c.param_names(), ["uid", "fid"]);
        assert_eq!(c.param("fid"), Some("7"));
        assert_eq!(c.p(0), Some("1"));
        assert_eq!(c.p(5), None);
        assert_eq!(c.path(), Some("/users/:uid/files/:fid"));
    }

    #[test]
    fn test_json_commits() {
        let mut c = ctx("/");
        c.json(StatusCode::CREATED, &serde_json::json!({"ok": true})).unwrap();
        assert!(c.is_committed());
        assert_eq!(c.status(), StatusCode::CREATED);
        assert_eq!(c.response_headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(c.body(), br#"{"ok":true}"#);
    }

    #[test]
    fn test_redirect_requires_3xx() {
        let mut c = ctx("/");
        assert!(c.redirect(StatusCode::OK, "/elsewhere").is_err());
        assert!(!c.is_committed());

        c.redirect(StatusCode::FOUND, "/elsewhere").unwrap();
        assert_eq!(c.response_headers()[header::LOCATION], "/elsewhere");
        assert_eq!(c.status(), StatusCode::FOUND);
    }

    #[test]
    fn test_error_hides_internal_detail() {
        let mut c = ctx("/");
        c.error(&HandlerError::internal("db password wrong"));
        assert_eq!(c.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(c.body(), b"internal server error");
    }

    #[test]
    fn test_reset_clears_request_state() {
        let mut c = ctx("/a?x=1");
        c.set("k", Value::Bool(true));
        c.set_route("/a");
        c.params_mut().set(vec!["id".into()], vec!["1".into()]);
        c.string(StatusCode::ACCEPTED, "done");

        c.reset(Method::POST, "/b".parse().unwrap(), HeaderMap::new());
        assert_eq!(c.method(), Method::POST);
        assert!(c.get("k").is_none());
        assert!(c.path().is_none());
        assert!(c.params().is_empty());
        assert!(!c.is_committed());
        assert_eq!(c.status(), StatusCode::OK);
        assert!(c.body().is_empty());
    }
}
