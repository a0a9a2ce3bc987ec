use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::PhotoSnapshot;
use crate::error::EngineError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Vote {
    pub vote_id: Uuid,
    pub photo_id: Uuid,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub snapshot: PhotoSnapshot,
    pub contest_id: Option<Uuid>,
    pub score: f64,
    pub user_id: Uuid,
    pub updated_at: DateTime<Utc>,
}

impl Vote {
    pub fn key(&self) -> VoteKey {
        VoteKey {
            photo_id: self.photo_id,
            user_id: self.user_id,
            contest_id: self.contest_id,
        }
    }
}

/// Uniqueness key of a vote. `contest_id == None` is the open vote, which is
/// distinct from every contest vote on the same photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoteKey {
    pub photo_id: Uuid,
    pub user_id: Uuid,
    pub contest_id: Option<Uuid>,
}

/// A heart rating, always within `1.0..=5.0`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Score(f64);

impl Score {
    pub const MIN: f64 = 1.0;
    pub const MAX: f64 = 5.0;

    pub fn new(value: f64) -> Result<Self, EngineError> {
        if value.is_finite() && (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(EngineError::validation(format!(
                "score must be between {} and {}",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Histogram bucket (0 for one heart .. 4 for five hearts); fractional
    /// scores truncate down.
    pub fn bucket(&self) -> usize {
        bucket_of(self.0)
    }
}

pub fn bucket_of(score: f64) -> usize {
    (score.trunc() as usize).clamp(1, 5) - 1
}
