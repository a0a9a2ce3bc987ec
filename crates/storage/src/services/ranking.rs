//! Confidence-adjusted photo ranking.
//!
//! Votes are grouped per photo into a five-bucket histogram, the buckets are
//! weighted `0, 1/4, 2/4, 3/4, 1` into a positive fraction, and photos are
//! ordered by the lower bound of the Wilson score interval of that fraction
//! at 95% confidence, mapped back onto the 1..5 heart scale. A photo with a
//! handful of perfect votes therefore ranks below one with many good votes.

use std::cmp::Ordering;

use uuid::Uuid;

use crate::dto::ranking::{PhotoVotesResponse, RankingEntry};
use crate::error::{EngineError, EngineResult};
use crate::models::Filter;
use crate::repository::{Repo, VoteHistogram, VoteScope, VoteSelection};

/// Normal quantile for a two-sided 95% interval.
const Z: f64 = 1.96;

/// Weighted positive fraction of a histogram: bucket `i` counts `i / 4`.
pub fn weighted_sum(buckets: &[i64; 5]) -> f64 {
    buckets
        .iter()
        .enumerate()
        .map(|(i, &count)| count as f64 * i as f64 / 4.0)
        .sum()
}

/// Wilson lower bound of `weighted_sum / count` on the 1..5 scale.
///
/// Returns exactly `0.0` when there are no votes.
pub fn wilson(count: i64, weighted_sum: f64) -> f64 {
    if count <= 0 {
        return 0.0;
    }

    let n = count as f64;
    let avg = (weighted_sum / n).clamp(0.0, 1.0);
    let z2 = Z * Z;

    let lower = (avg + z2 / (2.0 * n) - Z * ((avg * (1.0 - avg) + z2 / (4.0 * n)) / n).sqrt())
        / (1.0 + z2 / n);

    1.0 + 4.0 * lower
}

/// Orders histograms by Wilson score, best first. Equal scores fall back to
/// ascending photo id so the order never depends on input order.
pub fn rank(histograms: Vec<VoteHistogram>) -> Vec<RankingEntry> {
    let mut scored: Vec<(f64, VoteHistogram)> = histograms
        .into_iter()
        .map(|h| (wilson(h.count, weighted_sum(&h.buckets)), h))
        .collect();

    scored.sort_by(|(wa, a), (wb, b)| {
        wb.partial_cmp(wa)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.photo_id.cmp(&b.photo_id))
    });

    scored
        .into_iter()
        .zip(1..)
        .map(|((score, h), rank)| RankingEntry {
            rank,
            photo_id: h.photo_id,
            photo_user_id: h.photo_user_id,
            title: h.title,
            description: h.description,
            count: h.count,
            average: average(h.count, h.score_sum),
            wilson: score,
        })
        .collect()
}

fn average(count: i64, score_sum: f64) -> f64 {
    if count > 0 {
        score_sum / count as f64
    } else {
        0.0
    }
}

/// Ranking of every active photo by its open votes.
pub async fn rankings(repo: &dyn Repo, filter: Option<Filter>) -> EngineResult<Vec<RankingEntry>> {
    let selection = VoteSelection {
        scope: VoteScope::Open,
        active_only: true,
        filter,
    };

    let histograms = repo.vote_histograms(&selection).await?;

    Ok(rank(histograms))
}

/// Ranking of the photos voted on inside one contest.
pub async fn contest_rankings(
    repo: &dyn Repo,
    contest_id: Uuid,
) -> EngineResult<Vec<RankingEntry>> {
    repo.contest_try_load(contest_id)
        .await?
        .ok_or(EngineError::NotFound("Contest"))?;

    let selection = VoteSelection {
        scope: VoteScope::Contest(contest_id),
        active_only: false,
        filter: None,
    };

    let histograms = repo.vote_histograms(&selection).await?;

    Ok(rank(histograms))
}

/// Plain average and vote count of one photo, visible to its owner only.
pub async fn photo_votes(
    repo: &dyn Repo,
    viewer: Uuid,
    photo_id: Uuid,
    filter: Option<Filter>,
) -> EngineResult<PhotoVotesResponse> {
    let photo = repo
        .photo_try_load(photo_id)
        .await?
        .ok_or(EngineError::NotFound("Photo"))?;

    if !photo.is_owned_by(viewer) {
        tracing::warn!(%photo_id, %viewer, "Vote summary requested by non-owner");
        return Err(EngineError::forbidden("only the photo owner can see its votes"));
    }

    let selection = VoteSelection {
        scope: VoteScope::Photo(photo_id),
        active_only: false,
        filter,
    };

    let summary = repo
        .vote_histograms(&selection)
        .await?
        .into_iter()
        .next()
        .map(|h| PhotoVotesResponse {
            average: average(h.count, h.score_sum),
            count: h.count,
        })
        .unwrap_or(PhotoVotesResponse {
            average: 0.0,
            count: 0,
        });

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::clock::FixedClock;
    use crate::dto::photo::PhotoRequest;
    use crate::models::{Photo, Vote};
    use crate::repository::{ContestRepo, MemoryRepo, VoteRepo};
    use crate::services::photos::update_photo;
    use crate::services::test_support::{contest_for, photo_for, registration};
    use crate::services::voting::cast_vote;

    fn histogram(photo_id: Uuid, scores: &[usize]) -> VoteHistogram {
        let mut buckets = [0; 5];
        for &score in scores {
            buckets[score - 1] += 1;
        }
        VoteHistogram {
            photo_id,
            photo_user_id: Uuid::new_v4(),
            title: String::new(),
            description: String::new(),
            count: scores.len() as i64,
            buckets,
            score_sum: scores.iter().sum::<usize>() as f64,
        }
    }

    #[test]
    fn test_wilson_is_zero_without_votes() {
        assert_eq!(wilson(0, 0.0), 0.0);
    }

    #[test]
    fn test_weighted_sum_uses_quarter_steps() {
        assert_eq!(weighted_sum(&[1, 1, 1, 1, 1]), 2.5);
        assert_eq!(weighted_sum(&[2, 0, 0, 0, 3]), 3.0);
    }

    #[test]
    fn test_wilson_monotonic_in_average() {
        for count in [1_i64, 2, 5, 10, 50] {
            let mut previous = f64::MIN;
            for step in 0..=20 {
                let sum = count as f64 * step as f64 / 20.0;
                let score = wilson(count, sum);
                assert!(
                    score >= previous,
                    "wilson decreased at count={count}, step={step}"
                );
                previous = score;
            }
        }
    }

    #[test]
    fn test_wilson_approaches_raw_average_with_more_votes() {
        for avg in [0.25, 0.5, 0.6, 0.9, 1.0] {
            let target = 1.0 + 4.0 * avg;
            let mut previous_gap = f64::MAX;
            for count in [1_i64, 2, 5, 10, 100, 1000] {
                let gap = (target - wilson(count, avg * count as f64)).abs();
                assert!(gap < previous_gap, "no progress at avg={avg}, count={count}");
                previous_gap = gap;
            }
        }
    }

    #[test]
    fn test_many_mixed_votes_beat_single_perfect_vote() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let ranked = rank(vec![
            histogram(b, &[5]),
            histogram(a, &[5, 5, 5, 1, 1]),
        ]);

        assert_eq!(ranked[0].photo_id, a);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].photo_id, b);
        assert_eq!(ranked[1].rank, 2);
        assert!((ranked[0].average - 3.4).abs() < 1e-9);
    }

    fn edit(photo: &Photo, country: &str, active: bool) -> PhotoRequest {
        PhotoRequest {
            title: photo.title.clone(),
            description: photo.description.clone(),
            country: country.to_string(),
            location: photo.location.clone(),
            gender: photo.gender.clone(),
            age: photo.age,
            active,
        }
    }

    fn ids(entries: &[RankingEntry]) -> Vec<Uuid> {
        entries.iter().map(|e| e.photo_id).collect()
    }

    #[test]
    fn test_wilson_values_for_mixed_and_single_votes() {
        let a = wilson(5, weighted_sum(&[2, 0, 0, 0, 3]));
        let b = wilson(1, weighted_sum(&[0, 0, 0, 0, 1]));

        assert!((a - 1.9229).abs() < 1e-3, "a = {a}");
        assert!((b - 1.8262).abs() < 1e-3, "b = {b}");
    }

    #[test]
    fn test_ties_break_by_photo_id() {
        let low = Uuid::from_u128(1);
        let high = Uuid::from_u128(2);

        let ranked = rank(vec![histogram(high, &[4, 4]), histogram(low, &[4, 4])]);

        assert_eq!(ranked[0].photo_id, low);
        assert_eq!(ranked[1].photo_id, high);
    }

    #[tokio::test]
    async fn test_rankings_narrow_by_filter() {
        let repo = MemoryRepo::new();
        let clock = FixedClock::new(Utc::now());
        let owner = Uuid::new_v4();
        let local = photo_for(&repo, owner).await;
        let abroad = photo_for(&repo, owner).await;
        update_photo(&repo, &clock, owner, abroad.photo_id, &edit(&abroad, "FR", true))
            .await
            .unwrap();

        let voter = Uuid::new_v4();
        for photo in [&local, &abroad] {
            cast_vote(&repo, &clock, voter, photo.photo_id, None, 4.0)
                .await
                .unwrap();
        }

        let filter = Filter::new(Some("FR"), None, None, None).unwrap();
        let narrowed = rankings(&repo, Some(filter)).await.unwrap();
        assert_eq!(ids(&narrowed), vec![abroad.photo_id]);

        let filter = Filter::new(None, None, Some("30-40"), None).unwrap();
        assert!(rankings(&repo, Some(filter)).await.unwrap().is_empty());

        assert_eq!(rankings(&repo, None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_inactive_photo_leaves_rankings() {
        let repo = MemoryRepo::new();
        let clock = FixedClock::new(Utc::now());
        let owner = Uuid::new_v4();
        let photo = photo_for(&repo, owner).await;
        cast_vote(&repo, &clock, Uuid::new_v4(), photo.photo_id, None, 5.0)
            .await
            .unwrap();
        assert_eq!(rankings(&repo, None).await.unwrap().len(), 1);

        update_photo(&repo, &clock, owner, photo.photo_id, &edit(&photo, "RO", false))
            .await
            .unwrap();

        assert!(rankings(&repo, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_and_contest_votes_rank_separately() {
        let repo = MemoryRepo::new();
        let now = Utc::now();
        let clock = FixedClock::new(now);
        let author = Uuid::new_v4();
        let entered = photo_for(&repo, author).await;
        let outside = photo_for(&repo, Uuid::new_v4()).await;
        let contest = contest_for(&repo, Uuid::new_v4(), now, false).await;
        repo.registration_upsert(contest.contest_id, &registration(author, &entered, true))
            .await
            .unwrap();

        let voter = Uuid::new_v4();
        cast_vote(&repo, &clock, voter, entered.photo_id, None, 1.0)
            .await
            .unwrap();
        cast_vote(&repo, &clock, voter, outside.photo_id, None, 3.0)
            .await
            .unwrap();

        clock.advance(Duration::days(7));
        cast_vote(&repo, &clock, voter, entered.photo_id, Some(contest.contest_id), 5.0)
            .await
            .unwrap();

        let in_contest = contest_rankings(&repo, contest.contest_id).await.unwrap();
        assert_eq!(ids(&in_contest), vec![entered.photo_id]);
        assert_eq!(in_contest[0].count, 1);
        assert_eq!(in_contest[0].average, 5.0);

        let open = rankings(&repo, None).await.unwrap();
        assert_eq!(open.len(), 2);
        let entered_open = open
            .iter()
            .find(|e| e.photo_id == entered.photo_id)
            .unwrap();
        assert_eq!(entered_open.count, 1);
        assert_eq!(entered_open.average, 1.0);

        let stored: Vec<Vote> = repo.vote_list_for_photo(entered.photo_id).await.unwrap();
        assert_eq!(stored.len(), 2);
    }
}
