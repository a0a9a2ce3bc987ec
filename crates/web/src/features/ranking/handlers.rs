use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use storage::{
    dto::{
        common::PaginatedResponse,
        ranking::{RankingEntry, RankingQuery},
    },
    services::ranking,
};

use crate::error::WebError;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/rankings",
    params(RankingQuery),
    responses(
        (status = 200, description = "Active photos ranked by their open votes", body = PaginatedResponse<RankingEntry>),
        (status = 400, description = "Invalid query parameters")
    ),
    tag = "rankings"
)]
pub async fn get_rankings(
    State(state): State<AppState>,
    Query(query): Query<RankingQuery>,
) -> Result<Response, WebError> {
    let pagination = query.pagination();
    pagination.validate().map_err(WebError::BadRequest)?;
    let filter = query.filter_params().to_filter()?;

    let entries = ranking::rankings(&*state.repo, filter).await?;
    let total_items = entries.len() as i64;

    let response = PaginatedResponse::new(
        pagination.page_of(entries),
        pagination.page,
        pagination.page_size,
        total_items,
    );

    Ok(Json(response).into_response())
}
