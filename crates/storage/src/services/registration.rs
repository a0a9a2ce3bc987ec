use uuid::Uuid;

use crate::clock::Clock;
use crate::dto::contest::ApprovalDecision;
use crate::error::{EngineError, EngineResult};
use crate::models::{Identity, RegItem};
use crate::repository::{RegistrationOutcome, Repo};
use crate::services::contests::load_owned;

/// Enters `photo_id` into a contest on behalf of `registrant`, or replaces
/// the registrant's existing entry.
///
/// Approval is recomputed on every call, so resubmitting to a contest that
/// requires approval puts the entry back into the pending list.
pub async fn register(
    repo: &dyn Repo,
    clock: &dyn Clock,
    registrant: &Identity,
    contest_id: Uuid,
    photo_id: Uuid,
) -> EngineResult<(RegItem, RegistrationOutcome)> {
    let contest = repo
        .contest_try_load(contest_id)
        .await?
        .ok_or(EngineError::NotFound("Contest"))?;

    if !contest.can_register(clock.now()) {
        return Err(EngineError::forbidden("contest admission is closed"));
    }

    let photo = repo
        .photo_try_load(photo_id)
        .await?
        .ok_or(EngineError::NotFound("Photo"))?;

    if !photo.is_owned_by(registrant.user_id) {
        return Err(EngineError::forbidden("only your own photos can be entered"));
    }
    if photo.deleted || !photo.active {
        return Err(EngineError::forbidden("photo is not active"));
    }
    if !contest.admits(&photo) {
        return Err(EngineError::forbidden(
            "photo does not meet the contest's eligibility rules",
        ));
    }

    let item = RegItem {
        user_id: registrant.user_id,
        user_name: registrant.name.clone(),
        user_info: registrant.info.clone(),
        photo_id: photo.photo_id,
        title: photo.title.clone(),
        description: photo.description.clone(),
        approved: contest.initial_approval(registrant.user_id),
    };

    let outcome = repo.registration_upsert(contest_id, &item).await?;

    tracing::info!(
        %contest_id,
        %photo_id,
        user_id = %registrant.user_id,
        approved = item.approved,
        ?outcome,
        "Contest registration stored"
    );

    Ok((item, outcome))
}

/// Owner decision on one entry: approving flips its flag, rejecting removes
/// it from the contest.
pub async fn approve(
    repo: &dyn Repo,
    owner: Uuid,
    contest_id: Uuid,
    user_id: Uuid,
    decision: ApprovalDecision,
) -> EngineResult<()> {
    let contest = load_owned(repo, owner, contest_id).await?;

    if contest.registration_of(user_id).is_none() {
        return Err(EngineError::NotFound("Registration"));
    }

    match decision {
        ApprovalDecision::Approve => repo.registration_approve(contest_id, user_id).await?,
        ApprovalDecision::Reject => repo.registration_remove(contest_id, user_id).await?,
    }

    tracing::info!(%contest_id, %user_id, ?decision, "Registration decided");

    Ok(())
}

/// Entries still waiting for the owner's decision, in registration order.
pub async fn to_be_approved(
    repo: &dyn Repo,
    owner: Uuid,
    contest_id: Uuid,
) -> EngineResult<Vec<RegItem>> {
    let contest = load_owned(repo, owner, contest_id).await?;

    Ok(contest.to_be_approved().into_iter().cloned().collect())
}
