use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::ranking::FilterParams;
use crate::error::{EngineError, EngineResult};
use crate::models::{Contest, Phase, RegItem};

/// Request payload for creating a contest or editing an unpublished one
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ContestRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1 and 255 characters"
    ))]
    pub name: String,

    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,

    #[validate(length(max = 255))]
    #[serde(default)]
    pub country: String,

    #[validate(length(max = 255))]
    #[serde(default)]
    pub location: String,

    #[validate(custom(function = "validate_gender"))]
    #[serde(default)]
    pub gender: String,

    #[validate(range(min = 0, max = 130))]
    #[serde(default)]
    pub min_age: i32,

    #[validate(range(min = 0, max = 130))]
    #[serde(default)]
    pub max_age: i32,

    pub admission_deadline: DateTime<Utc>,

    pub voting_deadline: DateTime<Utc>,

    #[serde(default)]
    pub require_approval: bool,
}

pub(crate) fn validate_gender(gender: &str) -> Result<(), validator::ValidationError> {
    if matches!(gender, "" | "m" | "f") {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_gender"))
    }
}

impl ContestRequest {
    pub fn validate_ages(&self) -> EngineResult<()> {
        if self.min_age > 0 && self.max_age > 0 && self.min_age > self.max_age {
            return Err(EngineError::validation(
                "Minimum age must not exceed maximum age",
            ));
        }
        Ok(())
    }
}

/// Query string of the public contest listing.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ContestListQuery {
    /// Comma separated phases, e.g. `admission,voting`. Empty means all.
    pub phase: Option<String>,
    pub country: Option<String>,
    pub location: Option<String>,
    pub age: Option<String>,
    pub gender: Option<String>,
}

impl ContestListQuery {
    pub fn phases(&self) -> EngineResult<Vec<Phase>> {
        let phases: Vec<Phase> = self
            .phase
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| match s {
                "admission" => Ok(Phase::Admission),
                "voting" => Ok(Phase::Voting),
                "finished" => Ok(Phase::Finished),
                other => Err(EngineError::validation(format!("Unknown phase: {other}"))),
            })
            .collect::<EngineResult<_>>()?;

        if phases.is_empty() {
            return Ok(vec![Phase::Admission, Phase::Voting, Phase::Finished]);
        }

        Ok(phases)
    }

    pub fn filter_params(&self) -> FilterParams {
        FilterParams {
            country: self.country.clone(),
            location: self.location.clone(),
            age: self.age.clone(),
            gender: self.gender.clone(),
        }
    }
}

/// Public view of a contest
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ContestResponse {
    pub contest_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: String,
    pub country: String,
    pub location: String,
    pub gender: String,
    pub min_age: i32,
    pub max_age: i32,
    pub admission_deadline: DateTime<Utc>,
    pub voting_deadline: DateTime<Utc>,
    pub public: bool,
    pub require_approval: bool,
    pub phase: Phase,
    /// Approved entries only.
    pub entries: Vec<RegItem>,
}

impl ContestResponse {
    pub fn new(contest: Contest, now: DateTime<Utc>) -> Self {
        let phase = contest.phase(now);
        let entries = contest
            .registered
            .into_iter()
            .filter(|ri| ri.approved)
            .collect();

        Self {
            contest_id: contest.contest_id,
            user_id: contest.user_id,
            name: contest.name,
            description: contest.description,
            country: contest.country,
            location: contest.location,
            gender: contest.gender,
            min_age: contest.min_age,
            max_age: contest.max_age,
            admission_deadline: contest.admission_deadline,
            voting_deadline: contest.voting_deadline,
            public: contest.public,
            require_approval: contest.require_approval,
            phase,
            entries,
        }
    }
}

/// Owner view: every entry plus the ones waiting for a decision
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ContestStatusResponse {
    pub contest: Contest,
    pub phase: Phase,
    pub pending: Vec<RegItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub photo_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalDecision {
    Approve,
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApprovalRequest {
    pub decision: ApprovalDecision,
}
