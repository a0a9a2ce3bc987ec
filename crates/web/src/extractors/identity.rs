use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use storage::models::Identity;
use uuid::Uuid;

use crate::error::WebError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_INFO_HEADER: &str = "x-user-info";

/// End user on whose behalf the session layer is calling.
///
/// Resolved from `X-User-Id` (required), `X-User-Name` and `X-User-Info`.
/// Wrap in `Option` where anonymous access is allowed.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

impl CurrentUser {
    pub fn id(&self) -> Uuid {
        self.0.user_id
    }
}

fn header_text(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .ok_or(WebError::Unauthorized)?;

        Ok(CurrentUser(Identity::new(
            user_id,
            header_text(&parts.headers, USER_NAME_HEADER),
            header_text(&parts.headers, USER_INFO_HEADER),
        )))
    }
}
