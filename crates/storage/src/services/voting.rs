use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{EngineError, EngineResult, StorageError};
use crate::models::{Score, Vote, VoteKey};
use crate::repository::Repo;

/// Records `voter`'s rating of a photo, replacing any earlier vote with the
/// same `(photo, voter, contest)` key.
///
/// Open votes have no phase restriction. A contest vote requires the contest
/// to be in its voting phase and the photo to hold an approved entry in it.
pub async fn cast_vote(
    repo: &dyn Repo,
    clock: &dyn Clock,
    voter: Uuid,
    photo_id: Uuid,
    contest_id: Option<Uuid>,
    score: f64,
) -> EngineResult<Vote> {
    let score = Score::new(score)?;

    let photo = repo
        .photo_try_load(photo_id)
        .await?
        .filter(|p| !p.deleted)
        .ok_or(EngineError::NotFound("Photo"))?;

    if photo.is_owned_by(voter) {
        return Err(EngineError::forbidden("cannot vote on your own photo"));
    }

    let now = clock.now();

    if let Some(contest_id) = contest_id {
        let contest = repo
            .contest_try_load(contest_id)
            .await?
            .ok_or(EngineError::NotFound("Contest"))?;

        if !contest.can_vote(now) {
            return Err(EngineError::forbidden(format!(
                "contest is in {} phase, voting is closed",
                contest.phase(now).as_str()
            )));
        }

        let entered = contest
            .registration_for_photo(photo_id)
            .is_some_and(|ri| ri.approved);
        if !entered {
            return Err(EngineError::forbidden(
                "photo is not an approved entry of this contest",
            ));
        }
    }

    let vote = Vote {
        vote_id: Uuid::new_v4(),
        photo_id,
        snapshot: photo.snapshot(),
        contest_id,
        score: score.value(),
        user_id: voter,
        updated_at: now,
    };

    let stored = repo.vote_upsert(&vote).await.map_err(|e| match e {
        StorageError::NotFound => EngineError::NotFound("Contest"),
        other => other.into(),
    })?;

    tracing::info!(
        vote_id = %stored.vote_id,
        %photo_id,
        contest_id = ?contest_id,
        %voter,
        score = stored.score,
        "Vote recorded"
    );

    Ok(stored)
}

/// The voter's current vote, `None` when they have not voted yet.
pub async fn get_vote(
    repo: &dyn Repo,
    voter: Uuid,
    photo_id: Uuid,
    contest_id: Option<Uuid>,
) -> EngineResult<Option<Vote>> {
    let key = VoteKey {
        photo_id,
        user_id: voter,
        contest_id,
    };

    Ok(repo.vote_try_load(&key).await?)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::clock::FixedClock;
    use crate::repository::{ContestRepo, MemoryRepo, VoteRepo};
    use crate::services::test_support::{contest_for, photo_for, registration};

    #[tokio::test]
    async fn test_revote_overwrites_open_vote() {
        let repo = MemoryRepo::new();
        let clock = FixedClock::new(Utc::now());
        let photo = photo_for(&repo, Uuid::new_v4()).await;
        let voter = Uuid::new_v4();

        let first = cast_vote(&repo, &clock, voter, photo.photo_id, None, 2.0)
            .await
            .unwrap();
        let second = cast_vote(&repo, &clock, voter, photo.photo_id, None, 5.0)
            .await
            .unwrap();

        assert_eq!(first.vote_id, second.vote_id);
        let votes = repo.vote_list_for_photo(photo.photo_id).await.unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].score, 5.0);
    }

    #[tokio::test]
    async fn test_self_vote_rejected() {
        let repo = MemoryRepo::new();
        let clock = FixedClock::new(Utc::now());
        let owner = Uuid::new_v4();
        let photo = photo_for(&repo, owner).await;

        let result = cast_vote(&repo, &clock, owner, photo.photo_id, None, 5.0).await;

        assert!(matches!(result, Err(EngineError::Forbidden(_))));
        assert!(repo.vote_list_for_photo(photo.photo_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_score_out_of_range_rejected() {
        let repo = MemoryRepo::new();
        let clock = FixedClock::new(Utc::now());
        let photo = photo_for(&repo, Uuid::new_v4()).await;

        for score in [0.0, 5.5, -1.0] {
            let result =
                cast_vote(&repo, &clock, Uuid::new_v4(), photo.photo_id, None, score).await;
            assert!(matches!(result, Err(EngineError::Validation(_))));
        }
    }

    #[tokio::test]
    async fn test_missing_photo_is_not_found() {
        let repo = MemoryRepo::new();
        let clock = FixedClock::new(Utc::now());

        let result = cast_vote(&repo, &clock, Uuid::new_v4(), Uuid::new_v4(), None, 3.0).await;

        assert!(matches!(result, Err(EngineError::NotFound("Photo"))));
    }

    #[tokio::test]
    async fn test_contest_vote_only_during_voting_phase() {
        let repo = MemoryRepo::new();
        let now = Utc::now();
        let clock = FixedClock::new(now);
        let contest = contest_for(&repo, Uuid::new_v4(), now, false).await;
        let author = Uuid::new_v4();
        let photo = photo_for(&repo, author).await;
        repo.registration_upsert(contest.contest_id, &registration(author, &photo, true))
            .await
            .unwrap();
        let voter = Uuid::new_v4();

        let early = cast_vote(&repo, &clock, voter, photo.photo_id, Some(contest.contest_id), 4.0)
            .await;
        assert!(matches!(early, Err(EngineError::Forbidden(_))));

        clock.set(now + Duration::days(7));
        let vote = cast_vote(&repo, &clock, voter, photo.photo_id, Some(contest.contest_id), 4.0)
            .await
            .unwrap();
        assert_eq!(vote.contest_id, Some(contest.contest_id));

        clock.set(now + Duration::days(11));
        let late = cast_vote(&repo, &clock, voter, photo.photo_id, Some(contest.contest_id), 4.0)
            .await;
        assert!(matches!(late, Err(EngineError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_contest_and_open_votes_are_independent() {
        let repo = MemoryRepo::new();
        let now = Utc::now();
        let clock = FixedClock::new(now + Duration::days(6));
        let contest = contest_for(&repo, Uuid::new_v4(), now, false).await;
        let author = Uuid::new_v4();
        let photo = photo_for(&repo, author).await;
        repo.registration_upsert(contest.contest_id, &registration(author, &photo, true))
            .await
            .unwrap();
        let voter = Uuid::new_v4();

        cast_vote(&repo, &clock, voter, photo.photo_id, None, 2.0)
            .await
            .unwrap();
        cast_vote(&repo, &clock, voter, photo.photo_id, Some(contest.contest_id), 5.0)
            .await
            .unwrap();

        let open = get_vote(&repo, voter, photo.photo_id, None).await.unwrap().unwrap();
        let in_contest = get_vote(&repo, voter, photo.photo_id, Some(contest.contest_id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(open.score, 2.0);
        assert_eq!(in_contest.score, 5.0);
        assert_eq!(repo.vote_list_for_photo(photo.photo_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_contest_vote_requires_approved_entry() {
        let repo = MemoryRepo::new();
        let now = Utc::now();
        let clock = FixedClock::new(now + Duration::days(6));
        let contest = contest_for(&repo, Uuid::new_v4(), now, true).await;
        let author = Uuid::new_v4();
        let photo = photo_for(&repo, author).await;

        let unregistered = cast_vote(
            &repo,
            &clock,
            Uuid::new_v4(),
            photo.photo_id,
            Some(contest.contest_id),
            3.0,
        )
        .await;
        assert!(matches!(unregistered, Err(EngineError::Forbidden(_))));

        repo.registration_upsert(contest.contest_id, &registration(author, &photo, false))
            .await
            .unwrap();
        let pending = cast_vote(
            &repo,
            &clock,
            Uuid::new_v4(),
            photo.photo_id,
            Some(contest.contest_id),
            3.0,
        )
        .await;
        assert!(matches!(pending, Err(EngineError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_get_vote_absent_is_none() {
        let repo = MemoryRepo::new();

        let vote = get_vote(&repo, Uuid::new_v4(), Uuid::new_v4(), None)
            .await
            .unwrap();

        assert!(vote.is_none());
    }

    #[tokio::test]
    async fn test_revote_refreshes_snapshot() {
        let repo = MemoryRepo::new();
        let clock = FixedClock::new(Utc::now());
        let mut photo = photo_for(&repo, Uuid::new_v4()).await;
        let voter = Uuid::new_v4();

        cast_vote(&repo, &clock, voter, photo.photo_id, None, 3.0)
            .await
            .unwrap();

        photo.title = "Renamed".to_string();
        crate::repository::PhotoRepo::photo_update(&repo, &photo)
            .await
            .unwrap();
        let vote = cast_vote(&repo, &clock, voter, photo.photo_id, None, 4.0)
            .await
            .unwrap();

        assert_eq!(vote.snapshot.title, "Renamed");
    }
}
