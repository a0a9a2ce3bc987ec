use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    dto::{
        contest::{
            ApprovalRequest, ContestListQuery, ContestRequest, ContestResponse,
            ContestStatusResponse, RegisterRequest,
        },
        ranking::RankingEntry,
        vote::{CastVoteRequest, VoteResponse},
    },
    models::{Contest, RegItem},
    repository::RegistrationOutcome,
    services::{contests, ranking, registration, voting},
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::extractors::identity::CurrentUser;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/contests",
    params(ContestListQuery),
    responses(
        (status = 200, description = "Public contests in the requested phases, newest first", body = Vec<ContestResponse>),
        (status = 400, description = "Invalid phase or filter")
    ),
    tag = "contests"
)]
pub async fn list_contests(
    State(state): State<AppState>,
    Query(query): Query<ContestListQuery>,
) -> Result<Json<Vec<ContestResponse>>, WebError> {
    let phases = query.phases()?;
    let filter = query.filter_params().to_filter()?;

    let now = state.clock.now();
    let found = contests::list_contests(&*state.repo, &*state.clock, &phases, filter).await?;

    Ok(Json(
        found
            .into_iter()
            .map(|c| ContestResponse::new(c, now))
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/api/contests",
    request_body = ContestRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Contest created unpublished", body = Contest),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "contests"
)]
pub async fn create_contest(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<ContestRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let contest = contests::create_contest(&*state.repo, &*state.clock, user.id(), &req).await?;

    Ok((StatusCode::CREATED, Json(contest)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/contests/mine",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Contests owned by the caller, drafts included", body = Vec<Contest>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "contests"
)]
pub async fn owned_contests(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Contest>>, WebError> {
    Ok(Json(contests::owned_contests(&*state.repo, user.id()).await?))
}

#[utoipa::path(
    get,
    path = "/api/contests/{id}",
    params(
        ("id" = Uuid, Path, description = "Contest ID")
    ),
    responses(
        (status = 200, description = "Contest found", body = ContestResponse),
        (status = 404, description = "Contest not found")
    ),
    tag = "contests"
)]
pub async fn get_contest(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ContestResponse>, WebError> {
    let viewer = user.as_ref().map(CurrentUser::id);
    let contest = contests::get_contest(&*state.repo, viewer, id).await?;

    Ok(Json(ContestResponse::new(contest, state.clock.now())))
}

#[utoipa::path(
    put,
    path = "/api/contests/{id}",
    params(
        ("id" = Uuid, Path, description = "Contest ID")
    ),
    request_body = ContestRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Contest updated", body = Contest),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No unpublished contest of the caller with this id")
    ),
    tag = "contests"
)]
pub async fn update_contest(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ContestRequest>,
) -> Result<Json<Contest>, WebError> {
    req.validate()?;

    let contest =
        contests::update_contest(&*state.repo, &*state.clock, user.id(), id, &req).await?;

    Ok(Json(contest))
}

#[utoipa::path(
    delete,
    path = "/api/contests/{id}",
    params(
        ("id" = Uuid, Path, description = "Contest ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Contest deleted, its votes kept as open votes"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the contest owner"),
        (status = 404, description = "Contest not found")
    ),
    tag = "contests"
)]
pub async fn delete_contest(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, WebError> {
    contests::delete_contest(&*state.repo, user.id(), id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/contests/{id}/publish",
    params(
        ("id" = Uuid, Path, description = "Contest ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Contest is public"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the contest owner"),
        (status = 404, description = "Contest not found")
    ),
    tag = "contests"
)]
pub async fn publish_contest(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, WebError> {
    contests::publish_contest(&*state.repo, user.id(), id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/contests/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Contest ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Owner view with every entry and pending approvals", body = ContestStatusResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the contest owner"),
        (status = 404, description = "Contest not found")
    ),
    tag = "contests"
)]
pub async fn contest_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ContestStatusResponse>, WebError> {
    let status = contests::contest_status(&*state.repo, &*state.clock, user.id(), id).await?;

    Ok(Json(status))
}

#[utoipa::path(
    post,
    path = "/api/contests/{id}/registrations",
    params(
        ("id" = Uuid, Path, description = "Contest ID")
    ),
    request_body = RegisterRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Entry created", body = RegItem),
        (status = 200, description = "Existing entry replaced", body = RegItem),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admission closed or photo not eligible"),
        (status = 404, description = "Contest or photo not found")
    ),
    tag = "registrations"
)]
pub async fn register(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response, WebError> {
    let (item, outcome) =
        registration::register(&*state.repo, &*state.clock, &user.0, id, req.photo_id).await?;

    let status = match outcome {
        RegistrationOutcome::Inserted => StatusCode::CREATED,
        RegistrationOutcome::Updated => StatusCode::OK,
    };

    Ok((status, Json(item)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/contests/{id}/registrations/pending",
    params(
        ("id" = Uuid, Path, description = "Contest ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Entries awaiting approval", body = Vec<RegItem>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the contest owner"),
        (status = 404, description = "Contest not found")
    ),
    tag = "registrations"
)]
pub async fn pending_registrations(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<RegItem>>, WebError> {
    Ok(Json(
        registration::to_be_approved(&*state.repo, user.id(), id).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/contests/{id}/registrations/{user_id}",
    params(
        ("id" = Uuid, Path, description = "Contest ID"),
        ("user_id" = Uuid, Path, description = "Registrant ID")
    ),
    request_body = ApprovalRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Entry approved or removed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the contest owner"),
        (status = 404, description = "Contest or registration not found")
    ),
    tag = "registrations"
)]
pub async fn decide_registration(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<ApprovalRequest>,
) -> Result<StatusCode, WebError> {
    registration::approve(&*state.repo, user.id(), id, user_id, req.decision).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/contests/{id}/photos/{photo_id}/vote",
    params(
        ("id" = Uuid, Path, description = "Contest ID"),
        ("photo_id" = Uuid, Path, description = "Photo ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "The caller's vote in this contest, score 0 when absent", body = VoteResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "votes"
)]
pub async fn get_contest_vote(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((id, photo_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<VoteResponse>, WebError> {
    let vote = voting::get_vote(&*state.repo, user.id(), photo_id, Some(id)).await?;

    Ok(Json(VoteResponse::from_lookup(photo_id, Some(id), vote)))
}

#[utoipa::path(
    put,
    path = "/api/contests/{id}/photos/{photo_id}/vote",
    params(
        ("id" = Uuid, Path, description = "Contest ID"),
        ("photo_id" = Uuid, Path, description = "Photo ID")
    ),
    request_body = CastVoteRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Vote recorded", body = VoteResponse),
        (status = 400, description = "Score outside 1..5"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Own photo, voting closed or photo not an approved entry"),
        (status = 404, description = "Contest or photo not found")
    ),
    tag = "votes"
)]
pub async fn cast_contest_vote(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((id, photo_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<CastVoteRequest>,
) -> Result<Json<VoteResponse>, WebError> {
    req.validate()?;

    let vote = voting::cast_vote(
        &*state.repo,
        &*state.clock,
        user.id(),
        photo_id,
        Some(id),
        req.score,
    )
    .await?;

    Ok(Json(VoteResponse::from(vote)))
}

#[utoipa::path(
    get,
    path = "/api/contests/{id}/rankings",
    params(
        ("id" = Uuid, Path, description = "Contest ID")
    ),
    responses(
        (status = 200, description = "Photos ranked by votes cast in this contest", body = Vec<RankingEntry>),
        (status = 404, description = "Contest not found")
    ),
    tag = "rankings"
)]
pub async fn contest_rankings(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<RankingEntry>>, WebError> {
    Ok(Json(ranking::contest_rankings(&*state.repo, id).await?))
}
