use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use uuid::Uuid;

use super::{
    CommentRepo, ContestQuery, ContestRepo, PhotoRepo, RegistrationOutcome, VoteHistogram,
    VoteRepo, VoteSelection,
};
use crate::error::{Result, StorageError};
use crate::models::{
    Comment, Commentable, Contest, Photo, PhotoSnapshot, RegItem, ReportKind, Vote, VoteKey,
};

#[derive(Debug, Default)]
struct Data {
    photos: HashMap<Uuid, Photo>,
    reports: HashSet<(Uuid, Uuid, ReportKind)>,
    contests: HashMap<Uuid, Contest>,
    votes: HashMap<VoteKey, Vote>,
    comments: Vec<Comment>,
}

/// In-process backend. Each operation holds the lock for its whole duration,
/// which makes every per-key upsert atomic.
#[derive(Clone, Debug, Default)]
pub struct MemoryRepo {
    conn: Arc<Mutex<Data>>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    fn data(&self) -> MutexGuard<'_, Data> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PhotoRepo for MemoryRepo {
    async fn photo_insert(&self, photo: &Photo) -> Result<()> {
        let mut data = self.data();
        if data.photos.contains_key(&photo.photo_id) {
            return Err(StorageError::ConstraintViolation(
                "Photo already exists".to_string(),
            ));
        }
        data.photos.insert(photo.photo_id, photo.clone());
        Ok(())
    }

    async fn photo_try_load(&self, photo_id: Uuid) -> Result<Option<Photo>> {
        Ok(self.data().photos.get(&photo_id).cloned())
    }

    async fn photo_update(&self, photo: &Photo) -> Result<()> {
        let mut data = self.data();
        let current = data
            .photos
            .get_mut(&photo.photo_id)
            .ok_or(StorageError::NotFound)?;
        current.title = photo.title.clone();
        current.description = photo.description.clone();
        current.country = photo.country.clone();
        current.location = photo.location.clone();
        current.gender = photo.gender.clone();
        current.age = photo.age;
        current.active = photo.active;
        current.updated_at = photo.updated_at;
        Ok(())
    }

    async fn photo_mark_deleted(&self, photo_id: Uuid) -> Result<()> {
        let mut data = self.data();
        let photo = data.photos.get_mut(&photo_id).ok_or(StorageError::NotFound)?;
        photo.deleted = true;
        photo.active = false;
        Ok(())
    }

    async fn photo_remove(&self, photo_id: Uuid) -> Result<()> {
        let mut data = self.data();
        data.photos.remove(&photo_id).ok_or(StorageError::NotFound)?;
        data.reports.retain(|(reported, _, _)| *reported != photo_id);
        Ok(())
    }

    async fn photo_add_report(
        &self,
        photo_id: Uuid,
        reporter: Uuid,
        kind: ReportKind,
    ) -> Result<bool> {
        let mut data = self.data();
        if !data.photos.contains_key(&photo_id) {
            return Err(StorageError::NotFound);
        }
        if !data.reports.insert((photo_id, reporter, kind)) {
            return Ok(false);
        }
        if let Some(photo) = data.photos.get_mut(&photo_id) {
            match kind {
                ReportKind::Fake => photo.fake_count += 1,
                ReportKind::Abuse => photo.abuse_count += 1,
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl ContestRepo for MemoryRepo {
    async fn contest_insert(&self, contest: &Contest) -> Result<()> {
        let mut data = self.data();
        if data.contests.contains_key(&contest.contest_id) {
            return Err(StorageError::ConstraintViolation(
                "Contest already exists".to_string(),
            ));
        }
        data.contests.insert(contest.contest_id, contest.clone());
        Ok(())
    }

    async fn contest_try_load(&self, contest_id: Uuid) -> Result<Option<Contest>> {
        Ok(self.data().contests.get(&contest_id).cloned())
    }

    async fn contest_update_draft(&self, contest: &Contest) -> Result<()> {
        let mut data = self.data();
        let current = data
            .contests
            .get_mut(&contest.contest_id)
            .filter(|c| c.user_id == contest.user_id && !c.public)
            .ok_or(StorageError::NotFound)?;

        let registered = std::mem::take(&mut current.registered);
        *current = Contest {
            registered,
            public: false,
            created_at: current.created_at,
            ..contest.clone()
        };
        Ok(())
    }

    async fn contest_publish(&self, contest_id: Uuid, owner: Uuid) -> Result<()> {
        let mut data = self.data();
        let contest = data
            .contests
            .get_mut(&contest_id)
            .filter(|c| c.user_id == owner)
            .ok_or(StorageError::NotFound)?;
        contest.public = true;
        Ok(())
    }

    async fn contest_remove(&self, contest_id: Uuid, owner: Uuid) -> Result<u64> {
        let mut data = self.data();
        let owned = data
            .contests
            .get(&contest_id)
            .is_some_and(|c| c.user_id == owner);
        if !owned {
            return Err(StorageError::NotFound);
        }
        data.contests.remove(&contest_id);

        let keys: Vec<VoteKey> = data
            .votes
            .keys()
            .filter(|key| key.contest_id == Some(contest_id))
            .copied()
            .collect();

        let mut detached = 0;
        for key in keys {
            let Some(mut vote) = data.votes.remove(&key) else {
                continue;
            };
            vote.contest_id = None;
            let open_key = vote.key();
            if !data.votes.contains_key(&open_key) {
                data.votes.insert(open_key, vote);
                detached += 1;
            }
        }
        Ok(detached)
    }

    async fn contest_list(&self, query: &ContestQuery) -> Result<Vec<Contest>> {
        let data = self.data();
        let mut contests: Vec<Contest> = data
            .contests
            .values()
            .filter(|c| query.matches(c))
            .cloned()
            .collect();
        contests.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.contest_id.cmp(&b.contest_id))
        });
        Ok(contests)
    }

    async fn registration_upsert(
        &self,
        contest_id: Uuid,
        item: &RegItem,
    ) -> Result<RegistrationOutcome> {
        let mut data = self.data();
        let contest = data
            .contests
            .get_mut(&contest_id)
            .ok_or(StorageError::NotFound)?;

        match contest
            .registered
            .iter_mut()
            .find(|ri| ri.user_id == item.user_id)
        {
            Some(existing) => {
                existing.photo_id = item.photo_id;
                existing.title = item.title.clone();
                existing.description = item.description.clone();
                existing.approved = item.approved;
                Ok(RegistrationOutcome::Updated)
            }
            None => {
                contest.registered.push(item.clone());
                Ok(RegistrationOutcome::Inserted)
            }
        }
    }

    async fn registration_approve(&self, contest_id: Uuid, user_id: Uuid) -> Result<()> {
        let mut data = self.data();
        let item = data
            .contests
            .get_mut(&contest_id)
            .and_then(|c| c.registered.iter_mut().find(|ri| ri.user_id == user_id))
            .ok_or(StorageError::NotFound)?;
        item.approved = true;
        Ok(())
    }

    async fn registration_remove(&self, contest_id: Uuid, user_id: Uuid) -> Result<()> {
        let mut data = self.data();
        let contest = data
            .contests
            .get_mut(&contest_id)
            .ok_or(StorageError::NotFound)?;
        let before = contest.registered.len();
        contest.registered.retain(|ri| ri.user_id != user_id);
        if contest.registered.len() == before {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn photo_is_registered(&self, photo_id: Uuid) -> Result<bool> {
        Ok(self
            .data()
            .contests
            .values()
            .any(|c| c.registration_for_photo(photo_id).is_some()))
    }
}

#[async_trait]
impl VoteRepo for MemoryRepo {
    async fn vote_upsert(&self, vote: &Vote) -> Result<Vote> {
        let mut data = self.data();
        if let Some(contest_id) = vote.contest_id {
            if !data.contests.contains_key(&contest_id) {
                return Err(StorageError::NotFound);
            }
        }
        let key = vote.key();
        let stored = match data.votes.get(&key) {
            Some(existing) => Vote {
                vote_id: existing.vote_id,
                ..vote.clone()
            },
            None => vote.clone(),
        };
        data.votes.insert(key, stored.clone());
        Ok(stored)
    }

    async fn vote_try_load(&self, key: &VoteKey) -> Result<Option<Vote>> {
        Ok(self.data().votes.get(key).cloned())
    }

    async fn vote_list_for_photo(&self, photo_id: Uuid) -> Result<Vec<Vote>> {
        let mut votes: Vec<Vote> = self
            .data()
            .votes
            .values()
            .filter(|v| v.photo_id == photo_id)
            .cloned()
            .collect();
        votes.sort_by_key(|v| v.updated_at);
        Ok(votes)
    }

    async fn vote_refresh_snapshots(
        &self,
        photo_id: Uuid,
        snapshot: &PhotoSnapshot,
    ) -> Result<u64> {
        let mut data = self.data();
        let mut updated = 0;
        for vote in data.votes.values_mut().filter(|v| v.photo_id == photo_id) {
            vote.snapshot = snapshot.clone();
            updated += 1;
        }
        Ok(updated)
    }

    async fn vote_remove_for_photo(&self, photo_id: Uuid, open_only: bool) -> Result<u64> {
        let mut data = self.data();
        let before = data.votes.len();
        data.votes
            .retain(|key, _| key.photo_id != photo_id || (open_only && key.contest_id.is_some()));
        Ok((before - data.votes.len()) as u64)
    }

    async fn vote_histograms(&self, selection: &VoteSelection) -> Result<Vec<VoteHistogram>> {
        let data = self.data();
        let mut grouped: BTreeMap<Uuid, (VoteHistogram, chrono::DateTime<chrono::Utc>)> =
            BTreeMap::new();

        for vote in data.votes.values().filter(|v| selection.matches(v)) {
            let (histogram, latest) = grouped.entry(vote.photo_id).or_insert_with(|| {
                (
                    VoteHistogram {
                        photo_id: vote.photo_id,
                        photo_user_id: vote.snapshot.photo_user_id,
                        title: vote.snapshot.title.clone(),
                        description: vote.snapshot.description.clone(),
                        count: 0,
                        buckets: [0; 5],
                        score_sum: 0.0,
                    },
                    vote.updated_at,
                )
            });

            if vote.updated_at > *latest {
                *latest = vote.updated_at;
                histogram.photo_user_id = vote.snapshot.photo_user_id;
                histogram.title = vote.snapshot.title.clone();
                histogram.description = vote.snapshot.description.clone();
            }
            histogram.count += 1;
            histogram.buckets[crate::models::vote_bucket(vote.score)] += 1;
            histogram.score_sum += vote.score;
        }

        Ok(grouped.into_values().map(|(histogram, _)| histogram).collect())
    }
}

#[async_trait]
impl CommentRepo for MemoryRepo {
    async fn comment_insert(&self, comment: &Comment) -> Result<()> {
        self.data().comments.push(comment.clone());
        Ok(())
    }

    async fn comment_list(&self, target: Commentable) -> Result<Vec<Comment>> {
        Ok(self
            .data()
            .comments
            .iter()
            .filter(|c| c.target == target)
            .cloned()
            .collect())
    }
}
