use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use super::handlers::{
    cast_vote, create_photo, delete_photo, get_photo_votes, get_vote, report_photo, update_photo,
};
use crate::features::comments::handlers::{add_photo_comment, list_photo_comments};
use crate::middleware::auth::{ApiKeys, require_auth};
use crate::state::AppState;

pub fn routes(api_keys: ApiKeys) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_photo))
        .route("/:id", put(update_photo).delete(delete_photo))
        .route("/:id/reports/:kind", post(report_photo))
        .route("/:id/votes", get(get_photo_votes))
        .route("/:id/vote", get(get_vote).put(cast_vote))
        .route("/:id/comments", post(add_photo_comment))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route("/:id/comments", get(list_photo_comments))
        .merge(protected)
}
