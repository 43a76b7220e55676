//! Image upload endpoint. The client sends one multipart field named
//! `image`; the response carries the public URL to reference from a post.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;

use domains::{DomainError, StoredMedia};

use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::handlers::DataResponse;
use crate::router::AppState;

pub async fn upload(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DataResponse<StoredMedia>>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| DomainError::Validation(format!("malformed multipart body: {err}")))?
    {
        if field.name() == Some("image") {
            let data = field
                .bytes()
                .await
                .map_err(|err| DomainError::Validation(format!("unreadable upload: {err}")))?;
            let stored = state.media.store_image(data).await?;
            tracing::info!(user_id = %identity.id, url = %stored.url, "image uploaded");
            return Ok((StatusCode::CREATED, Json(DataResponse::new(stored))));
        }
    }
    Err(DomainError::Validation("missing multipart field `image`".into()).into())
}
