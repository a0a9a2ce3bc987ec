use chrono::{DateTime, Duration, Months, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::clock::Clock;
use crate::dto::contest::{ContestRequest, ContestStatusResponse};
use crate::error::{EngineError, EngineResult, StorageError};
use crate::models::{Contest, Filter, Phase};
use crate::repository::{ContestQuery, Repo};

/// Furthest an admission deadline may be set, counted from now.
const ADMISSION_WINDOW_MONTHS: u32 = 1;
/// Furthest a voting deadline may be set, counted from now.
const VOTING_WINDOW_MONTHS: u32 = 2;

fn limit_from(now: DateTime<Utc>, months: u32) -> EngineResult<DateTime<Utc>> {
    now.checked_add_months(Months::new(months))
        .map(|limit| limit + Duration::days(1))
        .ok_or_else(|| EngineError::validation("Deadline out of range"))
}

/// Both deadlines must lie in the future, in order, and inside their windows.
pub fn validate_deadlines(
    now: DateTime<Utc>,
    admission_deadline: DateTime<Utc>,
    voting_deadline: DateTime<Utc>,
) -> EngineResult<()> {
    if admission_deadline <= now {
        return Err(EngineError::validation(
            "Admission deadline must be in the future",
        ));
    }
    if admission_deadline > limit_from(now, ADMISSION_WINDOW_MONTHS)? {
        return Err(EngineError::validation(
            "Admission deadline must be within one month",
        ));
    }
    if voting_deadline <= admission_deadline {
        return Err(EngineError::validation(
            "Voting deadline must be after the admission deadline",
        ));
    }
    if voting_deadline > limit_from(now, VOTING_WINDOW_MONTHS)? {
        return Err(EngineError::validation(
            "Voting deadline must be within two months",
        ));
    }
    Ok(())
}

fn check_request(now: DateTime<Utc>, req: &ContestRequest) -> EngineResult<()> {
    req.validate()?;
    req.validate_ages()?;
    validate_deadlines(now, req.admission_deadline, req.voting_deadline)
}

fn contest_from_request(
    contest_id: Uuid,
    owner: Uuid,
    req: &ContestRequest,
    created_at: DateTime<Utc>,
) -> Contest {
    Contest {
        contest_id,
        user_id: owner,
        name: req.name.trim().to_string(),
        description: req.description.clone(),
        country: req.country.trim().to_string(),
        location: req.location.trim().to_string(),
        gender: req.gender.clone(),
        min_age: req.min_age,
        max_age: req.max_age,
        admission_deadline: req.admission_deadline,
        voting_deadline: req.voting_deadline,
        public: false,
        require_approval: req.require_approval,
        created_at,
        registered: Vec::new(),
    }
}

pub(crate) async fn load_owned(
    repo: &dyn Repo,
    owner: Uuid,
    contest_id: Uuid,
) -> EngineResult<Contest> {
    let contest = repo
        .contest_try_load(contest_id)
        .await?
        .ok_or(EngineError::NotFound("Contest"))?;

    if !contest.is_owned_by(owner) {
        tracing::warn!(%contest_id, %owner, "Owner-only contest action by non-owner");
        return Err(EngineError::forbidden("only the contest owner can do this"));
    }

    Ok(contest)
}

fn contest_not_found(error: StorageError) -> EngineError {
    match error {
        StorageError::NotFound => EngineError::NotFound("Contest"),
        other => other.into(),
    }
}

/// Creates an unpublished contest owned by `owner`.
pub async fn create_contest(
    repo: &dyn Repo,
    clock: &dyn Clock,
    owner: Uuid,
    req: &ContestRequest,
) -> EngineResult<Contest> {
    let now = clock.now();
    check_request(now, req)?;

    let contest = contest_from_request(Uuid::new_v4(), owner, req, now);
    repo.contest_insert(&contest).await?;

    tracing::info!(contest_id = %contest.contest_id, %owner, "Contest created");

    Ok(contest)
}

/// Rewrites an unpublished contest. Published contests and contests of other
/// users are `NotFound`, as the keyed update matches nothing.
pub async fn update_contest(
    repo: &dyn Repo,
    clock: &dyn Clock,
    owner: Uuid,
    contest_id: Uuid,
    req: &ContestRequest,
) -> EngineResult<Contest> {
    let now = clock.now();
    check_request(now, req)?;

    let contest = contest_from_request(contest_id, owner, req, now);
    repo.contest_update_draft(&contest)
        .await
        .map_err(contest_not_found)?;

    tracing::info!(%contest_id, %owner, "Contest updated");

    repo.contest_load(contest_id).await.map_err(contest_not_found)
}

/// Makes a contest publicly listed. There is no way back.
pub async fn publish_contest(repo: &dyn Repo, owner: Uuid, contest_id: Uuid) -> EngineResult<()> {
    let contest = load_owned(repo, owner, contest_id).await?;
    if contest.public {
        return Ok(());
    }

    repo.contest_publish(contest_id, owner)
        .await
        .map_err(contest_not_found)?;

    tracing::info!(%contest_id, %owner, "Contest published");

    Ok(())
}

/// Removes a contest and its entries. Votes cast inside it become open votes.
pub async fn delete_contest(repo: &dyn Repo, owner: Uuid, contest_id: Uuid) -> EngineResult<()> {
    load_owned(repo, owner, contest_id).await?;

    let detached = repo
        .contest_remove(contest_id, owner)
        .await
        .map_err(contest_not_found)?;

    tracing::info!(%contest_id, %owner, detached, "Contest deleted");

    Ok(())
}

/// Public contests currently in one of `phases`, newest first.
pub async fn list_contests(
    repo: &dyn Repo,
    clock: &dyn Clock,
    phases: &[Phase],
    filter: Option<Filter>,
) -> EngineResult<Vec<Contest>> {
    let now = clock.now();
    let mut contests = Vec::new();

    for &phase in phases {
        let query = ContestQuery {
            phase: Some((phase, now)),
            public_only: true,
            owner: None,
            filter: filter.clone(),
        };
        contests.extend(repo.contest_list(&query).await?);
    }

    contests.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.contest_id.cmp(&b.contest_id))
    });
    contests.dedup_by_key(|c| c.contest_id);

    Ok(contests)
}

pub async fn owned_contests(repo: &dyn Repo, owner: Uuid) -> EngineResult<Vec<Contest>> {
    let query = ContestQuery {
        owner: Some(owner),
        ..Default::default()
    };

    Ok(repo.contest_list(&query).await?)
}

/// A contest as seen by `viewer`. Unpublished contests exist only for their
/// owner.
pub async fn get_contest(
    repo: &dyn Repo,
    viewer: Option<Uuid>,
    contest_id: Uuid,
) -> EngineResult<Contest> {
    let contest = repo
        .contest_try_load(contest_id)
        .await?
        .ok_or(EngineError::NotFound("Contest"))?;

    if !contest.public && viewer.is_none_or(|v| !contest.is_owned_by(v)) {
        return Err(EngineError::NotFound("Contest"));
    }

    Ok(contest)
}

pub async fn contest_status(
    repo: &dyn Repo,
    clock: &dyn Clock,
    owner: Uuid,
    contest_id: Uuid,
) -> EngineResult<ContestStatusResponse> {
    let contest = load_owned(repo, owner, contest_id).await?;
    let phase = contest.phase(clock.now());
    let pending = contest.to_be_approved().into_iter().cloned().collect();

    Ok(ContestStatusResponse {
        contest,
        phase,
        pending,
    })
}
