use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::Vote;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CastVoteRequest {
    #[validate(range(min = 1.0, max = 5.0, message = "Score must be between 1 and 5"))]
    pub score: f64,
}

/// The caller's vote on a photo. `score` is `0` until they vote.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct VoteResponse {
    pub photo_id: Uuid,
    pub contest_id: Option<Uuid>,
    pub score: f64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl VoteResponse {
    pub fn from_lookup(photo_id: Uuid, contest_id: Option<Uuid>, vote: Option<Vote>) -> Self {
        match vote {
            Some(vote) => Self::from(vote),
            None => Self {
                photo_id,
                contest_id,
                score: 0.0,
                updated_at: None,
            },
        }
    }
}

impl From<Vote> for VoteResponse {
    fn from(vote: Vote) -> Self {
        Self {
            photo_id: vote.photo_id,
            contest_id: vote.contest_id,
            score: vote.score,
            updated_at: Some(vote.updated_at),
        }
    }
}
