use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use super::handlers::{
    cast_contest_vote, contest_rankings, contest_status, create_contest, decide_registration,
    delete_contest, get_contest, get_contest_vote, list_contests, owned_contests,
    pending_registrations, publish_contest, register, update_contest,
};
use crate::features::comments::handlers::{add_contest_comment, list_contest_comments};
use crate::middleware::auth::{ApiKeys, require_auth};
use crate::state::AppState;

pub fn routes(api_keys: ApiKeys) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_contest))
        .route("/mine", get(owned_contests))
        .route("/:id", put(update_contest).delete(delete_contest))
        .route("/:id/publish", post(publish_contest))
        .route("/:id/status", get(contest_status))
        .route("/:id/registrations", post(register))
        .route("/:id/registrations/pending", get(pending_registrations))
        .route("/:id/registrations/:user_id", put(decide_registration))
        .route(
            "/:id/photos/:photo_id/vote",
            get(get_contest_vote).put(cast_contest_vote),
        )
        .route("/:id/comments", post(add_contest_comment))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route("/", get(list_contests))
        .route("/:id", get(get_contest))
        .route("/:id/rankings", get(contest_rankings))
        .route("/:id/comments", get(list_contest_comments))
        .merge(protected)
}
