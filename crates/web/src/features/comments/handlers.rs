use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    dto::comment::CommentRequest,
    models::{Comment, Commentable},
    services::comments,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::extractors::identity::CurrentUser;
use crate::state::AppState;

async fn list(state: &AppState, target: Commentable) -> Result<Json<Vec<Comment>>, WebError> {
    Ok(Json(comments::list_comments(&*state.repo, target).await?))
}

async fn add(
    state: &AppState,
    user: &CurrentUser,
    target: Commentable,
    req: CommentRequest,
) -> Result<Response, WebError> {
    req.validate()?;

    let comment =
        comments::add_comment(&*state.repo, &*state.clock, &user.0, target, &req.body).await?;

    Ok((StatusCode::CREATED, Json(comment)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/photos/{id}/comments",
    params(
        ("id" = Uuid, Path, description = "Photo ID")
    ),
    responses(
        (status = 200, description = "Comments on the photo, oldest first", body = Vec<Comment>),
        (status = 404, description = "Photo not found")
    ),
    tag = "comments"
)]
pub async fn list_photo_comments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, WebError> {
    list(&state, Commentable::Photo(id)).await
}

#[utoipa::path(
    post,
    path = "/api/photos/{id}/comments",
    params(
        ("id" = Uuid, Path, description = "Photo ID")
    ),
    request_body = CommentRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Comment added", body = Comment),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Photo not found")
    ),
    tag = "comments"
)]
pub async fn add_photo_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CommentRequest>,
) -> Result<Response, WebError> {
    add(&state, &user, Commentable::Photo(id), req).await
}

#[utoipa::path(
    get,
    path = "/api/contests/{id}/comments",
    params(
        ("id" = Uuid, Path, description = "Contest ID")
    ),
    responses(
        (status = 200, description = "Comments on the contest, oldest first", body = Vec<Comment>),
        (status = 404, description = "Contest not found")
    ),
    tag = "comments"
)]
pub async fn list_contest_comments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, WebError> {
    list(&state, Commentable::Contest(id)).await
}

#[utoipa::path(
    post,
    path = "/api/contests/{id}/comments",
    params(
        ("id" = Uuid, Path, description = "Contest ID")
    ),
    request_body = CommentRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Comment added", body = Comment),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Contest not found")
    ),
    tag = "comments"
)]
pub async fn add_contest_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CommentRequest>,
) -> Result<Response, WebError> {
    add(&state, &user, Commentable::Contest(id), req).await
}
