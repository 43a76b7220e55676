//! Shared fixtures for the end-to-end tests: the full axum router wired
//! to in-memory storage, the real Argon2 hasher, and the real JWT issuer.

#![cfg(feature = "web-axum")]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use api_adapters::{metrics::ApiMetrics, router, AppState};
use auth_adapters::{Argon2PasswordHasher, JwtTokenIssuer};
use services::{AuthService, MediaService, PostService, UserService};
use storage_adapters::media_local::LocalMediaStore;
use storage_adapters::memory::{InMemoryPostRepo, InMemoryUserRepo};

/// Keep uploads small in tests; the cap itself is under test in
/// `media_upload`.
pub const UPLOAD_LIMIT: usize = 64 * 1024;

pub struct TestApp {
    pub router: Router,
    pub posts: Arc<InMemoryPostRepo>,
    pub users: Arc<InMemoryUserRepo>,
    pub media_root: PathBuf,
}

pub fn test_app() -> TestApp {
    let posts = Arc::new(InMemoryPostRepo::new());
    let users = Arc::new(InMemoryUserRepo::new());
    let hasher = Arc::new(Argon2PasswordHasher);
    let tokens = Arc::new(JwtTokenIssuer::new(b"integration-test-secret", 24));
    let media_root = std::env::temp_dir().join(format!("huntly-it-{}", Uuid::new_v4()));

    let state = AppState {
        auth: Arc::new(AuthService::new(
            users.clone(),
            hasher.clone(),
            tokens.clone(),
        )),
        users: Arc::new(UserService::new(users.clone(), hasher)),
        posts: Arc::new(PostService::new(posts.clone())),
        media: Arc::new(MediaService::new(
            Arc::new(LocalMediaStore::new(media_root.clone(), "/media")),
            UPLOAD_LIMIT,
        )),
        tokens,
        metrics: Arc::new(ApiMetrics::new()),
        upload_limit: UPLOAD_LIMIT,
    };

    TestApp {
        router: router(state),
        posts,
        users,
        media_root,
    }
}

/// Builds a JSON request, optionally authenticated.
pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// Sends a request through the router and decodes the JSON response.
pub async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 4 * 1024 * 1024)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Registers an account through the API and returns its token and id.
pub async fn register(app: &TestApp, first_name: &str) -> (String, Uuid) {
    let email = format!(
        "{}-{}@example.com",
        first_name.to_lowercase(),
        Uuid::new_v4()
    );
    let (status, json) = send(
        app,
        json_request(
            Method::POST,
            "/api/auth/register",
            None,
            &serde_json::json!({
                "firstName": first_name,
                "lastName": "Tester",
                "email": email,
                "location": "Testville",
                "password": "hunter2hunter2",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {json}");
    let token = json["token"].as_str().unwrap().to_string();
    let id = json["user"]["id"].as_str().unwrap().parse().unwrap();
    (token, id)
}

/// Creates a post through the API and returns its id.
pub async fn create_post(app: &TestApp, token: &str, title: &str) -> Uuid {
    let (status, json) = send(
        app,
        json_request(
            Method::POST,
            "/api/posts",
            Some(token),
            &serde_json::json!({
                "title": title,
                "caption": "a caption",
                "imageUrl": "https://img.example/x.png",
                "post": "the body text",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create post failed: {json}");
    json["data"]["id"].as_str().unwrap().parse().unwrap()
}
