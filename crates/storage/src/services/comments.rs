use uuid::Uuid;

use crate::clock::Clock;
use crate::dto::comment::MAX_COMMENT_LEN;
use crate::error::{EngineError, EngineResult};
use crate::models::{Comment, Commentable, HasComments, Identity};
use crate::repository::Repo;

/// Resolves the target to a live entity and returns its canonical handle.
async fn resolve(repo: &dyn Repo, target: Commentable) -> EngineResult<Commentable> {
    match target {
        Commentable::Photo(photo_id) => repo
            .photo_try_load(photo_id)
            .await?
            .filter(|p| !p.deleted)
            .map(|p| p.comment_target())
            .ok_or(EngineError::NotFound("Photo")),
        Commentable::Contest(contest_id) => repo
            .contest_try_load(contest_id)
            .await?
            .map(|c| c.comment_target())
            .ok_or(EngineError::NotFound("Contest")),
    }
}

pub async fn add_comment(
    repo: &dyn Repo,
    clock: &dyn Clock,
    author: &Identity,
    target: Commentable,
    body: &str,
) -> EngineResult<Comment> {
    let body = body.trim();
    let length = body.chars().count();
    if length == 0 || length > MAX_COMMENT_LEN {
        return Err(EngineError::validation(format!(
            "Comment must be between 1 and {MAX_COMMENT_LEN} characters"
        )));
    }

    let target = resolve(repo, target).await?;
    let comment = Comment {
        comment_id: Uuid::new_v4(),
        target,
        user_id: author.user_id,
        user_name: author.name.clone(),
        body: body.to_string(),
        created_at: clock.now(),
    };

    repo.comment_insert(&comment).await?;

    tracing::info!(comment_id = %comment.comment_id, %target, "Comment added");

    Ok(comment)
}

pub async fn list_comments(repo: &dyn Repo, target: Commentable) -> EngineResult<Vec<Comment>> {
    let target = resolve(repo, target).await?;
    Ok(repo.comment_list(target).await?)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::clock::FixedClock;
    use crate::repository::MemoryRepo;
    use crate::services::test_support::{contest_for, photo_for};

    #[tokio::test]
    async fn test_comments_listed_oldest_first_per_target() {
        let repo = MemoryRepo::new();
        let now = Utc::now();
        let clock = FixedClock::new(now);
        let author = Identity::new(Uuid::new_v4(), "Dan", "");
        let photo = photo_for(&repo, Uuid::new_v4()).await;
        let contest = contest_for(&repo, Uuid::new_v4(), now, false).await;

        add_comment(&repo, &clock, &author, photo.comment_target(), "first")
            .await
            .unwrap();
        clock.advance(Duration::minutes(1));
        add_comment(&repo, &clock, &author, photo.comment_target(), "second")
            .await
            .unwrap();
        add_comment(&repo, &clock, &author, contest.comment_target(), "on contest")
            .await
            .unwrap();

        let on_photo = list_comments(&repo, photo.comment_target()).await.unwrap();
        let bodies: Vec<&str> = on_photo.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(bodies, vec!["first", "second"]);

        let on_contest = list_comments(&repo, contest.comment_target()).await.unwrap();
        assert_eq!(on_contest.len(), 1);
    }

    #[tokio::test]
    async fn test_comment_body_bounds() {
        let repo = MemoryRepo::new();
        let clock = FixedClock::new(Utc::now());
        let author = Identity::new(Uuid::new_v4(), "Dan", "");
        let photo = photo_for(&repo, Uuid::new_v4()).await;

        let empty = add_comment(&repo, &clock, &author, photo.comment_target(), "   ").await;
        assert!(matches!(empty, Err(EngineError::Validation(_))));

        let long = "x".repeat(MAX_COMMENT_LEN + 1);
        let too_long = add_comment(&repo, &clock, &author, photo.comment_target(), &long).await;
        assert!(matches!(too_long, Err(EngineError::Validation(_))));
    }

    #[tokio::test]
    async fn test_comment_on_missing_target() {
        let repo = MemoryRepo::new();
        let clock = FixedClock::new(Utc::now());
        let author = Identity::new(Uuid::new_v4(), "Dan", "");

        let missing = Commentable::Contest(Uuid::new_v4());
        let result = add_comment(&repo, &clock, &author, missing, "hi").await;

        assert!(matches!(result, Err(EngineError::NotFound("Contest"))));
    }
}
