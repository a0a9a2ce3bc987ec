use uuid::Uuid;
use validator::Validate;

use crate::clock::Clock;
use crate::dto::photo::{DeleteOutcome, DeletePhotoResponse, PhotoRequest};
use crate::error::{EngineError, EngineResult};
use crate::models::{Photo, ReportKind};
use crate::repository::Repo;

async fn load_live(repo: &dyn Repo, photo_id: Uuid) -> EngineResult<Photo> {
    repo.photo_try_load(photo_id)
        .await?
        .filter(|p| !p.deleted)
        .ok_or(EngineError::NotFound("Photo"))
}

async fn load_own(repo: &dyn Repo, owner: Uuid, photo_id: Uuid) -> EngineResult<Photo> {
    let photo = load_live(repo, photo_id).await?;
    if !photo.is_owned_by(owner) {
        tracing::warn!(%photo_id, %owner, "Photo change attempted by non-owner");
        return Err(EngineError::forbidden("only the photo owner can do this"));
    }
    Ok(photo)
}

pub async fn create_photo(
    repo: &dyn Repo,
    clock: &dyn Clock,
    owner: Uuid,
    req: &PhotoRequest,
) -> EngineResult<Photo> {
    req.validate()?;

    let now = clock.now();
    let photo = Photo {
        photo_id: Uuid::new_v4(),
        user_id: owner,
        title: req.title.trim().to_string(),
        description: req.description.clone(),
        country: req.country.trim().to_string(),
        location: req.location.trim().to_string(),
        gender: req.gender.clone(),
        age: req.age,
        active: req.active,
        deleted: false,
        fake_count: 0,
        abuse_count: 0,
        created_at: now,
        updated_at: now,
    };

    repo.photo_insert(&photo).await?;

    tracing::info!(photo_id = %photo.photo_id, %owner, "Photo created");

    Ok(photo)
}

/// Edits a photo and rewrites the snapshot held by every vote on it.
pub async fn update_photo(
    repo: &dyn Repo,
    clock: &dyn Clock,
    owner: Uuid,
    photo_id: Uuid,
    req: &PhotoRequest,
) -> EngineResult<Photo> {
    req.validate()?;

    let current = load_own(repo, owner, photo_id).await?;
    let photo = Photo {
        title: req.title.trim().to_string(),
        description: req.description.clone(),
        country: req.country.trim().to_string(),
        location: req.location.trim().to_string(),
        gender: req.gender.clone(),
        age: req.age,
        active: req.active,
        updated_at: clock.now(),
        ..current
    };

    repo.photo_update(&photo).await?;
    let refreshed = repo
        .vote_refresh_snapshots(photo_id, &photo.snapshot())
        .await?;

    tracing::info!(%photo_id, %owner, refreshed, "Photo updated");

    Ok(photo)
}

/// Photos entered in a contest are only hidden so contest history stays
/// intact; their open votes go away. Anything else is removed with all its
/// votes.
pub async fn delete_photo(
    repo: &dyn Repo,
    owner: Uuid,
    photo_id: Uuid,
) -> EngineResult<DeletePhotoResponse> {
    load_own(repo, owner, photo_id).await?;

    let response = if repo.photo_is_registered(photo_id).await? {
        repo.photo_mark_deleted(photo_id).await?;
        DeletePhotoResponse {
            outcome: DeleteOutcome::Soft,
            votes_removed: repo.vote_remove_for_photo(photo_id, true).await?,
        }
    } else {
        repo.photo_remove(photo_id).await?;
        DeletePhotoResponse {
            outcome: DeleteOutcome::Hard,
            votes_removed: repo.vote_remove_for_photo(photo_id, false).await?,
        }
    };

    tracing::info!(
        %photo_id,
        %owner,
        outcome = ?response.outcome,
        votes_removed = response.votes_removed,
        "Photo deleted"
    );

    Ok(response)
}

/// Files a report. Returns `false` when this reporter already filed one of
/// the same kind, leaving the counter alone.
pub async fn report_photo(
    repo: &dyn Repo,
    reporter: Uuid,
    photo_id: Uuid,
    kind: ReportKind,
) -> EngineResult<bool> {
    load_live(repo, photo_id).await?;

    let recorded = repo.photo_add_report(photo_id, reporter, kind).await?;
    if recorded {
        tracing::info!(%photo_id, %reporter, %kind, "Photo reported");
    }

    Ok(recorded)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::clock::FixedClock;
    use crate::repository::{ContestRepo, MemoryRepo, PhotoRepo, VoteRepo};
    use crate::services::test_support::{contest_for, registration};
    use crate::services::voting::cast_vote;

    fn request() -> PhotoRequest {
        PhotoRequest {
            title: "Harbour".to_string(),
            description: "Blue hour".to_string(),
            country: "RO".to_string(),
            location: "Constanta".to_string(),
            gender: "m".to_string(),
            age: 40,
            active: true,
        }
    }

    #[tokio::test]
    async fn test_update_refreshes_vote_snapshots() {
        let repo = MemoryRepo::new();
        let clock = FixedClock::new(Utc::now());
        let owner = Uuid::new_v4();
        let photo = create_photo(&repo, &clock, owner, &request()).await.unwrap();
        cast_vote(&repo, &clock, Uuid::new_v4(), photo.photo_id, None, 4.0)
            .await
            .unwrap();

        let edited = PhotoRequest {
            title: "Harbour at night".to_string(),
            ..request()
        };
        update_photo(&repo, &clock, owner, photo.photo_id, &edited)
            .await
            .unwrap();

        let votes = repo.vote_list_for_photo(photo.photo_id).await.unwrap();
        assert_eq!(votes[0].snapshot.title, "Harbour at night");
    }

    #[tokio::test]
    async fn test_update_by_stranger_forbidden() {
        let repo = MemoryRepo::new();
        let clock = FixedClock::new(Utc::now());
        let photo = create_photo(&repo, &clock, Uuid::new_v4(), &request()).await.unwrap();

        let result = update_photo(&repo, &clock, Uuid::new_v4(), photo.photo_id, &request()).await;

        assert!(matches!(result, Err(EngineError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_unregistered_photo_is_removed_with_votes() {
        let repo = MemoryRepo::new();
        let clock = FixedClock::new(Utc::now());
        let owner = Uuid::new_v4();
        let photo = create_photo(&repo, &clock, owner, &request()).await.unwrap();
        cast_vote(&repo, &clock, Uuid::new_v4(), photo.photo_id, None, 4.0)
            .await
            .unwrap();

        let response = delete_photo(&repo, owner, photo.photo_id).await.unwrap();

        assert_eq!(response.outcome, DeleteOutcome::Hard);
        assert_eq!(response.votes_removed, 1);
        assert!(repo.photo_try_load(photo.photo_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_registered_photo_is_soft_deleted() {
        let repo = MemoryRepo::new();
        let now = Utc::now();
        let clock = FixedClock::new(now);
        let owner = Uuid::new_v4();
        let photo = create_photo(&repo, &clock, owner, &request()).await.unwrap();
        let contest = contest_for(&repo, Uuid::new_v4(), now, false).await;
        repo.registration_upsert(contest.contest_id, &registration(owner, &photo, true))
            .await
            .unwrap();
        let voter = Uuid::new_v4();
        cast_vote(&repo, &clock, voter, photo.photo_id, None, 2.0)
            .await
            .unwrap();
        clock.set(now + Duration::days(6));
        cast_vote(&repo, &clock, voter, photo.photo_id, Some(contest.contest_id), 5.0)
            .await
            .unwrap();

        let response = delete_photo(&repo, owner, photo.photo_id).await.unwrap();

        assert_eq!(response.outcome, DeleteOutcome::Soft);
        assert_eq!(response.votes_removed, 1);
        let stored = repo.photo_load(photo.photo_id).await.unwrap();
        assert!(stored.deleted);
        assert!(!stored.active);
        let votes = repo.vote_list_for_photo(photo.photo_id).await.unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].contest_id, Some(contest.contest_id));
    }

    #[tokio::test]
    async fn test_report_counts_once_per_reporter() {
        let repo = MemoryRepo::new();
        let clock = FixedClock::new(Utc::now());
        let photo = create_photo(&repo, &clock, Uuid::new_v4(), &request()).await.unwrap();
        let reporter = Uuid::new_v4();

        assert!(report_photo(&repo, reporter, photo.photo_id, ReportKind::Fake).await.unwrap());
        assert!(!report_photo(&repo, reporter, photo.photo_id, ReportKind::Fake).await.unwrap());
        assert!(report_photo(&repo, reporter, photo.photo_id, ReportKind::Abuse).await.unwrap());

        let stored = repo.photo_load(photo.photo_id).await.unwrap();
        assert_eq!(stored.fake_count, 1);
        assert_eq!(stored.abuse_count, 1);
    }
}
