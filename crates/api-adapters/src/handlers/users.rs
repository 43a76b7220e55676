//! Profile endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use domains::{Post, User};
use services::ProfileUpdate;

use crate::error::{body, ApiError};
use crate::extract::AuthUser;
use crate::handlers::DataResponse;
use crate::router::AppState;

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub location: Option<String>,
    pub profile_picture: Option<String>,
    pub password: Option<String>,
}

pub async fn me(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<DataResponse<User>>, ApiError> {
    Ok(Json(DataResponse::new(
        state.users.profile(identity.id).await?,
    )))
}

pub async fn profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DataResponse<User>>, ApiError> {
    Ok(Json(DataResponse::new(state.users.profile(id).await?)))
}

pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<DataResponse<User>>, ApiError> {
    let req = body(payload)?;
    let user = state
        .users
        .update_profile(
            identity.id,
            ProfileUpdate {
                first_name: req.first_name,
                last_name: req.last_name,
                location: req.location,
                profile_picture: req.profile_picture,
                password: req.password,
            },
        )
        .await?;
    Ok(Json(DataResponse::new(user)))
}

pub async fn posts_of(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DataResponse<Vec<Post>>>, ApiError> {
    Ok(Json(DataResponse::new(state.posts.by_author(id).await?)))
}
