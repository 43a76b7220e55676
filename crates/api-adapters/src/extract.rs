//! Bearer-token extraction. Runs before any handler body, so an
//! unauthenticated request is rejected without touching storage.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header, request::Parts};

use domains::{DomainError, Identity};

use crate::error::ApiError;
use crate::router::AppState;

/// The verified caller. Handlers take this as an argument; there is no
/// process-wide "current user" anywhere.
pub struct AuthUser(pub Identity);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        let Some(token) = token else {
            return Err(DomainError::Unauthenticated("missing bearer token".into()).into());
        };

        let identity = state.tokens.verify(token)?;
        Ok(AuthUser(identity))
    }
}
