//! Route table and shared state.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::{header, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use domains::TokenIssuer;
use services::{AuthService, MediaService, PostService, UserService};

use crate::error::ApiError;
use crate::handlers;
use crate::metrics::{ApiMetrics, RequestLabels};

/// State shared across all workers. Everything is behind an `Arc`; a
/// clone per request is pointer-sized.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub posts: Arc<PostService>,
    pub media: Arc<MediaService>,
    pub tokens: Arc<dyn TokenIssuer>,
    pub metrics: Arc<ApiMetrics>,
    /// Raw multipart cap; the media service enforces its own image limit
    /// underneath this.
    pub upload_limit: usize,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(render_metrics))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route(
            "/api/posts",
            get(handlers::posts::list).post(handlers::posts::create),
        )
        .route(
            "/api/posts/{id}",
            get(handlers::posts::get_one)
                .put(handlers::posts::update)
                .delete(handlers::posts::remove),
        )
        .route("/api/posts/{id}/comment", post(handlers::posts::comment))
        .route("/api/posts/{id}/vote", post(handlers::posts::vote))
        .route("/api/posts/user/{user_id}", get(handlers::posts::by_author))
        .route(
            "/api/users/me",
            get(handlers::users::me).put(handlers::users::update_me),
        )
        .route("/api/users/{id}", get(handlers::users::profile))
        .route("/api/users/{id}/posts", get(handlers::users::posts_of))
        .route("/api/media", post(handlers::media::upload))
        .layer(DefaultBodyLimit::max(state.upload_limit + 64 * 1024))
        .layer(middleware::from_fn_with_state(state.clone(), count_requests))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn render_metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let body = state
        .metrics
        .encode()
        .map_err(|err| domains::DomainError::Internal(format!("metrics encoding: {err}")))?;
    Ok((
        [(
            header::CONTENT_TYPE,
            "application/openmetrics-text; version=1.0.0; charset=utf-8",
        )],
        body,
    )
        .into_response())
}

async fn count_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let response = next.run(req).await;
    state
        .metrics
        .http_requests
        .get_or_create(&RequestLabels {
            method,
            status: response.status().as_u16() as u32,
        })
        .inc();
    response
}
