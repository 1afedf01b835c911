//! End-to-end tests through the axum apps.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use hot_router::admin::{setup_admin_router, AdminState};
use hot_router::config::parse_config;
use hot_router::handler::registry::HandlerRegistry;
use hot_router::http::build_app;
use hot_router::lifecycle::startup;
use hot_router::Router;
use serde_json::Value;
use tower::ServiceExt;

mod common;
use common::body_text;

const CONFIG: &str = r#"
[[middleware]]
name = "powered-by"
kind = "set_header"
header = "x-powered-by"
value = "hot-router"
global = true

[[middleware]]
name = "api-key"
kind = "require_header"
header = "x-api-key"
value = "secret"

[[routes]]
name = "user"
pattern = "/users/:id"
group = "users"
handler = { kind = "params" }

[[routes]]
name = "user-create"
method = "POST"
pattern = "/users"
group = "users"
middleware = ["api-key"]
handler = { kind = "json", status = 201, body = { created = true } }

[[routes]]
name = "home"
pattern = "/"
handler = { kind = "text", body = "home" }
"#;

const API_KEY: &str = "test-key";

fn setup(config: &str) -> (Arc<Router>, axum::Router) {
    let router = Arc::new(Router::new());
    let config = parse_config(config).unwrap();
    startup::apply_config(&router, &HandlerRegistry::new(), &config).unwrap();
    let app = build_app(Arc::clone(&router), Duration::from_secs(5));
    (router, app)
}

fn admin(router: &Arc<Router>, config_path: Option<std::path::PathBuf>) -> axum::Router {
    setup_admin_router(AdminState {
        router: Arc::clone(router),
        registry: Arc::new(HandlerRegistry::new()),
        config_path,
        api_key: Arc::from(API_KEY),
    })
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn admin_post(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", API_KEY))
        .body(Body::empty())
        .unwrap()
}

async fn json(response: axum::response::Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

#[tokio::test]
async fn test_matched_route_runs_chain() {
    let (_router, app) = setup(CONFIG);

    let response = app.oneshot(get("/users/42")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-powered-by"], "hot-router");
    assert!(response.headers().contains_key("x-request-id"));

    let body = json(response).await;
    assert_eq!(body["route"], "/users/:id");
    assert_eq!(body["params"]["id"], "42");
}

#[tokio::test]
async fn test_not_found_and_method_not_allowed() {
    let (_router, app) = setup(CONFIG);

    let response = app.clone().oneshot(get("/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/users/1")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[header::ALLOW], "GET");
}

#[tokio::test]
async fn test_route_middleware_guards_endpoint() {
    let (_router, app) = setup(CONFIG);

    let request = Request::builder().method(Method::POST).uri("/users").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/users")
        .header("x-api-key", "secret")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(json(response).await["created"], true);
}

#[tokio::test]
async fn test_client_request_id_is_propagated() {
    let (_router, app) = setup(CONFIG);

    let request = Request::builder()
        .uri("/")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");
    assert_eq!(body_text(response).await, "home");
}

#[tokio::test]
async fn test_admin_requires_bearer_token() {
    let (router, _app) = setup(CONFIG);
    let admin = admin(&router, None);

    let response = admin.clone().oneshot(get("/admin/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/admin/status")
        .header(header::AUTHORIZATION, format!("Bearer {}", API_KEY))
        .body(Body::empty())
        .unwrap();
    let response = admin.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["generation"], 1);
    assert_eq!(body["routes"], 3);
}

#[tokio::test]
async fn test_admin_toggle_route_is_live_on_return() {
    let (router, app) = setup(CONFIG);
    let admin = admin(&router, None);

    let response = admin.clone().oneshot(admin_post("/admin/routes/user/disable")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["affected"], 1);
    assert_eq!(body["generation"], 2);

    let response = app.clone().oneshot(get("/users/1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = admin.clone().oneshot(admin_post("/admin/groups/users/enable")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let response = app.oneshot(get("/users/1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = admin.clone().oneshot(admin_post("/admin/routes/ghost/disable")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(json(response).await["error"].as_str().unwrap().contains("ghost"));

    let response = admin.oneshot(admin_post("/admin/routes/user/toggle")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_middleware_toggle() {
    let (router, app) = setup(CONFIG);
    let admin = admin(&router, None);

    let response = admin.oneshot(admin_post("/admin/middleware/powered-by/disable")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/")).await.unwrap();
    assert!(!response.headers().contains_key("x-powered-by"));
}

#[tokio::test]
async fn test_admin_reload_applies_file() {
    let (router, app) = setup(CONFIG);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
        [[routes]]
        name = "fresh"
        pattern = "/fresh"
        handler = {{ kind = "text", body = "fresh" }}
        "#
    )
    .unwrap();
    let admin = admin(&router, Some(file.path().to_path_buf()));

    let response = admin.clone().oneshot(admin_post("/admin/reload")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["routes"], 1);

    let response = app.clone().oneshot(get("/fresh")).await.unwrap();
    assert_eq!(body_text(response).await, "fresh");
    let response = app.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // A broken file leaves the published generation alone.
    std::fs::write(file.path(), "[[routes]]\nname = \"bad\"\npattern = \"nope\"\nhandler = { kind = \"echo\" }\n").unwrap();
    let response = admin.oneshot(admin_post("/admin/reload")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let response = app.oneshot(get("/fresh")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_reload_without_config_path() {
    let (router, _app) = setup(CONFIG);
    let response = admin(&router, None).oneshot(admin_post("/admin/reload")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_percent_encoded_path_is_decoded() {
    let (_router, app) = setup(
        r#"
        [[routes]]
        name = "user"
        pattern = "/users/:name"
        handler = { kind = "params" }

        [[routes]]
        name = "cafe"
        pattern = "/café"
        handler = { kind = "text", body = "coffee" }
        "#,
    );

    let response = app.clone().oneshot(get("/users/john%20doe")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["params"]["name"], "john doe");

    let response = app.oneshot(get("/caf%C3%A9")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "coffee");
}
