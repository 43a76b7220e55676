//! Post endpoints: CRUD, comments, and the vote endpoint.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use domains::{Comment, Post, VoteKind};
use services::{NewPost, PostPatch};

use crate::error::{body, ApiError};
use crate::extract::AuthUser;
use crate::handlers::{DataResponse, MessageResponse};
use crate::metrics::VoteLabels;
use crate::router::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub caption: String,
    pub image_url: String,
    /// The body text rides in a field called `post` on the wire.
    pub post: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub caption: Option<String>,
    pub image_url: Option<String>,
    pub post: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    #[serde(rename = "type")]
    pub kind: VoteKind,
}

pub async fn list(State(state): State<AppState>) -> Result<Json<DataResponse<Vec<Post>>>, ApiError> {
    Ok(Json(DataResponse::new(state.posts.list().await?)))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DataResponse<Post>>, ApiError> {
    Ok(Json(DataResponse::new(state.posts.get(id).await?)))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DataResponse<Post>>), ApiError> {
    let req = body(payload)?;
    let post = state
        .posts
        .create(
            &identity,
            NewPost {
                title: req.title,
                caption: req.caption,
                image_url: req.image_url,
                body: req.post,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(post))))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdatePostRequest>, JsonRejection>,
) -> Result<Json<DataResponse<Post>>, ApiError> {
    let req = body(payload)?;
    let post = state
        .posts
        .update(
            &identity,
            id,
            PostPatch {
                title: req.title,
                caption: req.caption,
                image_url: req.image_url,
                body: req.post,
            },
        )
        .await?;
    Ok(Json(DataResponse::new(post)))
}

pub async fn remove(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.posts.delete(&identity, id).await?;
    Ok(Json(MessageResponse::new("post deleted")))
}

pub async fn comment(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DataResponse<Vec<Comment>>>), ApiError> {
    let req = body(payload)?;
    let comments = state.posts.add_comment(&identity, id, &req.comment).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(comments))))
}

pub async fn vote(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<DataResponse<Post>>, ApiError> {
    let req = body(payload)?;
    let (post, outcome) = state.posts.cast_vote(&identity, id, req.kind).await?;
    state
        .metrics
        .votes_cast
        .get_or_create(&VoteLabels {
            outcome: outcome.as_str().into(),
        })
        .inc();
    Ok(Json(DataResponse::new(post)))
}

pub async fn by_author(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<DataResponse<Vec<Post>>>, ApiError> {
    Ok(Json(DataResponse::new(state.posts.by_author(user_id).await?)))
}
