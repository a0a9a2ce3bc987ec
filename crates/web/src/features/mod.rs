pub mod comments;
pub mod contests;
pub mod photos;
pub mod ranking;

use axum::Router;
use tower_http::cors::CorsLayer;

use crate::middleware::auth::ApiKeys;
use crate::state::AppState;

pub fn router(state: AppState, api_keys: ApiKeys) -> Router {
    let api = Router::new()
        .nest("/photos", photos::routes::routes(api_keys.clone()))
        .nest("/contests", contests::routes::routes(api_keys))
        .nest("/rankings", ranking::routes::routes());

    Router::new()
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use chrono::{DateTime, Duration, Utc};
    use serde_json::{Value, json};
    use storage::clock::{Clock, FixedClock};
    use storage::repository::MemoryRepo;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::extractors::identity::{USER_ID_HEADER, USER_NAME_HEADER};

    const KEY: &str = "test-key";

    struct TestApp {
        router: Router,
        clock: Arc<FixedClock>,
    }

    impl TestApp {
        fn new() -> Self {
            let clock = Arc::new(FixedClock::new(Utc::now()));
            let state = AppState::new(Arc::new(MemoryRepo::new()), clock.clone());
            let router = router(state, ApiKeys::from_comma_separated(KEY));
            Self { router, clock }
        }

        fn clock_now(&self) -> DateTime<Utc> {
            self.clock.now()
        }

        async fn call(
            &self,
            method: &str,
            uri: &str,
            user: Option<Uuid>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder()
                .method(method)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {KEY}"));
            if let Some(user) = user {
                builder = builder
                    .header(USER_ID_HEADER, user.to_string())
                    .header(USER_NAME_HEADER, "Tester");
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        async fn create_photo(&self, owner: Uuid) -> String {
            let (status, body) = self
                .call(
                    "POST",
                    "/api/photos",
                    Some(owner),
                    Some(json!({ "title": "Dunes", "gender": "f", "age": 22 })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
            body["photo_id"].as_str().unwrap().to_string()
        }
    }

    #[tokio::test]
    async fn test_mutation_requires_api_key() {
        let app = TestApp::new();
        let request = Request::builder()
            .method("POST")
            .uri("/api/photos")
            .header(USER_ID_HEADER, Uuid::new_v4().to_string())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "title": "x" }).to_string()))
            .unwrap();

        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_mutation_requires_user() {
        let app = TestApp::new();

        let (status, _) = app
            .call("POST", "/api/photos", None, Some(json!({ "title": "x" })))
            .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_vote_and_read_back() {
        let app = TestApp::new();
        let owner = Uuid::new_v4();
        let voter = Uuid::new_v4();
        let photo_id = app.create_photo(owner).await;
        let uri = format!("/api/photos/{photo_id}/vote");

        let (status, body) = app.call("GET", &uri, Some(voter), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], 0.0);

        let (status, _) = app
            .call("PUT", &uri, Some(voter), Some(json!({ "score": 4 })))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = app.call("GET", &uri, Some(voter), None).await;
        assert_eq!(body["score"], 4.0);

        let (status, _) = app
            .call("PUT", &uri, Some(owner), Some(json!({ "score": 5 })))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .call("PUT", &uri, Some(voter), Some(json!({ "score": 7 })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rankings_are_paginated() {
        let app = TestApp::new();
        let owner = Uuid::new_v4();
        for _ in 0..3 {
            let photo_id = app.create_photo(owner).await;
            app.call(
                "PUT",
                &format!("/api/photos/{photo_id}/vote"),
                Some(Uuid::new_v4()),
                Some(json!({ "score": 3 })),
            )
            .await;
        }

        let (status, body) = app
            .call("GET", "/api/rankings?page=2&page_size=2", None, None)
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["pagination"]["total_items"], 3);
        assert_eq!(body["data"][0]["rank"], 3);
    }

    #[tokio::test]
    async fn test_photo_votes_owner_only() {
        let app = TestApp::new();
        let owner = Uuid::new_v4();
        let photo_id = app.create_photo(owner).await;
        let uri = format!("/api/photos/{photo_id}/votes");

        let (status, body) = app.call("GET", &uri, Some(owner), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 0);

        let (status, _) = app.call("GET", &uri, Some(Uuid::new_v4()), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_contest_flow_over_http() {
        let app = TestApp::new();
        let owner = Uuid::new_v4();
        let author = Uuid::new_v4();
        let voter = Uuid::new_v4();
        let now = app.clock_now();

        let (status, body) = app
            .call(
                "POST",
                "/api/contests",
                Some(owner),
                Some(json!({
                    "name": "Deserts",
                    "admission_deadline": now + Duration::days(5),
                    "voting_deadline": now + Duration::days(10),
                    "require_approval": true,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let contest_id = body["contest_id"].as_str().unwrap().to_string();

        let (status, _) = app
            .call("POST", &format!("/api/contests/{contest_id}/publish"), Some(owner), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let photo_id = app.create_photo(author).await;
        let (status, body) = app
            .call(
                "POST",
                &format!("/api/contests/{contest_id}/registrations"),
                Some(author),
                Some(json!({ "photo_id": photo_id })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["approved"], false);

        let (_, pending) = app
            .call(
                "GET",
                &format!("/api/contests/{contest_id}/registrations/pending"),
                Some(owner),
                None,
            )
            .await;
        assert_eq!(pending.as_array().unwrap().len(), 1);

        let (status, _) = app
            .call(
                "PUT",
                &format!("/api/contests/{contest_id}/registrations/{author}"),
                Some(owner),
                Some(json!({ "decision": "approve" })),
            )
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let vote_uri = format!("/api/contests/{contest_id}/photos/{photo_id}/vote");
        let (status, _) = app
            .call("PUT", &vote_uri, Some(voter), Some(json!({ "score": 4 })))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        app.clock.set(now + Duration::days(7));
        let (status, body) = app
            .call("PUT", &vote_uri, Some(voter), Some(json!({ "score": 4 })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], 4.0);

        let (_, ranked) = app
            .call("GET", &format!("/api/contests/{contest_id}/rankings"), None, None)
            .await;
        assert_eq!(ranked[0]["photo_id"], photo_id.as_str());

        app.clock.set(now + Duration::days(11));
        let (status, _) = app
            .call("PUT", &vote_uri, Some(voter), Some(json!({ "score": 4 })))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_comments_on_contest() {
        let app = TestApp::new();
        let owner = Uuid::new_v4();
        let now = app.clock_now();
        let (_, body) = app
            .call(
                "POST",
                "/api/contests",
                Some(owner),
                Some(json!({
                    "name": "Rivers",
                    "admission_deadline": now + Duration::days(3),
                    "voting_deadline": now + Duration::days(6),
                })),
            )
            .await;
        let contest_id = body["contest_id"].as_str().unwrap().to_string();
        let uri = format!("/api/contests/{contest_id}/comments");

        let (status, _) = app
            .call("POST", &uri, Some(Uuid::new_v4()), Some(json!({ "body": "Nice theme" })))
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = app
            .call("POST", &uri, Some(Uuid::new_v4()), Some(json!({ "body": "" })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, comments) = app.call("GET", &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(comments[0]["body"], "Nice theme");
        assert_eq!(comments[0]["target"]["kind"], "contest");
    }
}
