//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, StatusCode};
use axum::response::Response;
use hot_router::handler::HandlerChain;
use hot_router::routing::{Params, Router};
use hot_router::{Context, HandlerError};

/// A chain that answers 200 with `body`.
pub fn text(body: &'static str) -> HandlerChain {
    HandlerChain::from_handler(move |ctx: &mut Context| -> Result<(), HandlerError> {
        ctx.string(StatusCode::OK, body);
        Ok(())
    })
}

/// A router with `routes` registered and published as generation 1.
pub fn router_with(routes: &[(Method, &str, &'static str)]) -> Arc<Router> {
    let router = Router::new();
    for (method, pattern, body) in routes {
        router.register(method.clone(), pattern, text(*body)).unwrap();
    }
    router.rebuild().unwrap();
    Arc::new(router)
}

/// Run the chain matched for `method path` and return the body it wrote.
pub fn dispatch(router: &Router, method: Method, path: &str) -> Option<String> {
    let mut ctx = Context::new(method.clone(), path.parse().unwrap(), Default::default());
    let endpoint = router.lookup(&method, path, ctx.params_mut()).ok()?;
    endpoint.chain.run(&mut ctx).unwrap();
    Some(String::from_utf8(ctx.body().to_vec()).unwrap())
}

/// Match and return the bound parameters as `(name, value)` pairs.
pub fn params_of(router: &Router, method: &Method, path: &str) -> Vec<(String, String)> {
    let mut params = Params::new();
    router.lookup(method, path, &mut params).unwrap();
    params.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

/// Read a whole response body as text.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
