use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    dto::{
        photo::{DeletePhotoResponse, PhotoRequest, ReportResponse},
        ranking::{FilterParams, PhotoVotesResponse},
        vote::{CastVoteRequest, VoteResponse},
    },
    models::{Photo, ReportKind},
    services::{photos, ranking, voting},
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::extractors::identity::CurrentUser;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/photos",
    request_body = PhotoRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Photo created", body = Photo),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "photos"
)]
pub async fn create_photo(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<PhotoRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let photo = photos::create_photo(&*state.repo, &*state.clock, user.id(), &req).await?;

    Ok((StatusCode::CREATED, Json(photo)).into_response())
}

#[utoipa::path(
    put,
    path = "/api/photos/{id}",
    params(
        ("id" = Uuid, Path, description = "Photo ID")
    ),
    request_body = PhotoRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Photo updated, vote snapshots refreshed", body = Photo),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the photo owner"),
        (status = 404, description = "Photo not found")
    ),
    tag = "photos"
)]
pub async fn update_photo(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<PhotoRequest>,
) -> Result<Json<Photo>, WebError> {
    req.validate()?;

    let photo = photos::update_photo(&*state.repo, &*state.clock, user.id(), id, &req).await?;

    Ok(Json(photo))
}

#[utoipa::path(
    delete,
    path = "/api/photos/{id}",
    params(
        ("id" = Uuid, Path, description = "Photo ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Photo removed, or hidden when entered in a contest", body = DeletePhotoResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the photo owner"),
        (status = 404, description = "Photo not found")
    ),
    tag = "photos"
)]
pub async fn delete_photo(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletePhotoResponse>, WebError> {
    let response = photos::delete_photo(&*state.repo, user.id(), id).await?;

    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/photos/{id}/reports/{kind}",
    params(
        ("id" = Uuid, Path, description = "Photo ID"),
        ("kind" = String, Path, description = "`fake` or `abuse`")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Report filed or already on record", body = ReportResponse),
        (status = 400, description = "Unknown report kind"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Photo not found")
    ),
    tag = "photos"
)]
pub async fn report_photo(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((id, kind)): Path<(Uuid, String)>,
) -> Result<Json<ReportResponse>, WebError> {
    let kind: ReportKind = kind.parse().map_err(WebError::BadRequest)?;

    let recorded = photos::report_photo(&*state.repo, user.id(), id, kind).await?;

    Ok(Json(ReportResponse { recorded }))
}

#[utoipa::path(
    get,
    path = "/api/photos/{id}/votes",
    params(
        ("id" = Uuid, Path, description = "Photo ID"),
        FilterParams
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Average and count of the photo's votes", body = PhotoVotesResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the photo owner"),
        (status = 404, description = "Photo not found")
    ),
    tag = "photos"
)]
pub async fn get_photo_votes(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Query(params): Query<FilterParams>,
) -> Result<Json<PhotoVotesResponse>, WebError> {
    let filter = params.to_filter()?;

    let summary = ranking::photo_votes(&*state.repo, user.id(), id, filter).await?;

    Ok(Json(summary))
}

#[utoipa::path(
    get,
    path = "/api/photos/{id}/vote",
    params(
        ("id" = Uuid, Path, description = "Photo ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "The caller's open vote, score 0 when absent", body = VoteResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "votes"
)]
pub async fn get_vote(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<VoteResponse>, WebError> {
    let vote = voting::get_vote(&*state.repo, user.id(), id, None).await?;

    Ok(Json(VoteResponse::from_lookup(id, None, vote)))
}

#[utoipa::path(
    put,
    path = "/api/photos/{id}/vote",
    params(
        ("id" = Uuid, Path, description = "Photo ID")
    ),
    request_body = CastVoteRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Vote recorded", body = VoteResponse),
        (status = 400, description = "Score outside 1..5"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Own photo"),
        (status = 404, description = "Photo not found")
    ),
    tag = "votes"
)]
pub async fn cast_vote(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CastVoteRequest>,
) -> Result<Json<VoteResponse>, WebError> {
    req.validate()?;

    let vote =
        voting::cast_vote(&*state.repo, &*state.clock, user.id(), id, None, req.score).await?;

    Ok(Json(VoteResponse::from(vote)))
}
