mod memory;
mod postgres;

pub use memory::MemoryRepo;
pub use postgres::PgRepo;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{
    Comment, Commentable, Contest, Filter, Phase, Photo, PhotoSnapshot, RegItem, ReportKind,
    Vote, VoteKey,
};

#[async_trait]
pub trait PhotoRepo: Send + Sync {
    async fn photo_insert(&self, photo: &Photo) -> Result<()>;

    async fn photo_try_load(&self, photo_id: Uuid) -> Result<Option<Photo>>;

    async fn photo_load(&self, photo_id: Uuid) -> Result<Photo> {
        self.photo_try_load(photo_id)
            .await?
            .ok_or(StorageError::NotFound)
    }

    /// Overwrites the editable fields of an existing photo.
    async fn photo_update(&self, photo: &Photo) -> Result<()>;

    async fn photo_mark_deleted(&self, photo_id: Uuid) -> Result<()>;

    async fn photo_remove(&self, photo_id: Uuid) -> Result<()>;

    /// Records a report and bumps the matching counter. Returns `false` when
    /// the reporter had already filed this kind of report.
    async fn photo_add_report(
        &self,
        photo_id: Uuid,
        reporter: Uuid,
        kind: ReportKind,
    ) -> Result<bool>;
}

/// Whether a registration upsert created a new entry or replaced one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Inserted,
    Updated,
}

#[derive(Debug, Clone, Default)]
pub struct ContestQuery {
    /// Restrict to contests in this phase at `now`.
    pub phase: Option<(Phase, DateTime<Utc>)>,
    pub public_only: bool,
    pub owner: Option<Uuid>,
    pub filter: Option<Filter>,
}

impl ContestQuery {
    pub fn matches(&self, contest: &Contest) -> bool {
        self.phase
            .is_none_or(|(phase, now)| contest.phase(now) == phase)
            && (!self.public_only || contest.public)
            && self.owner.is_none_or(|owner| contest.user_id == owner)
            && self
                .filter
                .as_ref()
                .is_none_or(|filter| filter.matches_contest(contest))
    }
}

#[async_trait]
pub trait ContestRepo: Send + Sync {
    async fn contest_insert(&self, contest: &Contest) -> Result<()>;

    /// Loads the contest together with its registrations, in entry order.
    async fn contest_try_load(&self, contest_id: Uuid) -> Result<Option<Contest>>;

    async fn contest_load(&self, contest_id: Uuid) -> Result<Contest> {
        self.contest_try_load(contest_id)
            .await?
            .ok_or(StorageError::NotFound)
    }

    /// Updates a contest keyed by id, owner and `public = false`.
    /// `NotFound` when no such draft exists.
    async fn contest_update_draft(&self, contest: &Contest) -> Result<()>;

    async fn contest_publish(&self, contest_id: Uuid, owner: Uuid) -> Result<()>;

    /// Removes the owner's contest with its entries and turns every vote cast
    /// in it into an open vote, all in one atomic step. A vote whose voter
    /// already holds an open vote on the same photo is dropped instead.
    /// Returns the number of votes kept as open votes.
    async fn contest_remove(&self, contest_id: Uuid, owner: Uuid) -> Result<u64>;

    async fn contest_list(&self, query: &ContestQuery) -> Result<Vec<Contest>>;

    /// Inserts the entry for `(contest_id, item.user_id)` or replaces its
    /// photo, title, description and approval in one atomic step.
    async fn registration_upsert(
        &self,
        contest_id: Uuid,
        item: &RegItem,
    ) -> Result<RegistrationOutcome>;

    async fn registration_approve(&self, contest_id: Uuid, user_id: Uuid) -> Result<()>;

    async fn registration_remove(&self, contest_id: Uuid, user_id: Uuid) -> Result<()>;

    async fn photo_is_registered(&self, photo_id: Uuid) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteScope {
    /// Votes cast outside any contest.
    Open,
    Contest(Uuid),
    Photo(Uuid),
}

#[derive(Debug, Clone)]
pub struct VoteSelection {
    pub scope: VoteScope,
    pub active_only: bool,
    pub filter: Option<Filter>,
}

impl VoteSelection {
    pub fn matches(&self, vote: &Vote) -> bool {
        let in_scope = match self.scope {
            VoteScope::Open => vote.contest_id.is_none(),
            VoteScope::Contest(contest_id) => vote.contest_id == Some(contest_id),
            VoteScope::Photo(photo_id) => vote.photo_id == photo_id,
        };

        in_scope
            && (!self.active_only || vote.snapshot.active)
            && self
                .filter
                .as_ref()
                .is_none_or(|filter| filter.matches_snapshot(&vote.snapshot))
    }
}

/// Per-photo vote aggregate over a selection.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteHistogram {
    pub photo_id: Uuid,
    pub photo_user_id: Uuid,
    pub title: String,
    pub description: String,
    pub count: i64,
    /// Vote counts for one to five hearts.
    pub buckets: [i64; 5],
    pub score_sum: f64,
}

#[async_trait]
pub trait VoteRepo: Send + Sync {
    /// Inserts or overwrites the vote with the same `VoteKey`; the stored
    /// vote keeps its original id. `NotFound` when the vote names a contest
    /// that no longer exists.
    async fn vote_upsert(&self, vote: &Vote) -> Result<Vote>;

    async fn vote_try_load(&self, key: &VoteKey) -> Result<Option<Vote>>;

    async fn vote_list_for_photo(&self, photo_id: Uuid) -> Result<Vec<Vote>>;

    async fn vote_refresh_snapshots(&self, photo_id: Uuid, snapshot: &PhotoSnapshot)
    -> Result<u64>;

    async fn vote_remove_for_photo(&self, photo_id: Uuid, open_only: bool) -> Result<u64>;

    async fn vote_histograms(&self, selection: &VoteSelection) -> Result<Vec<VoteHistogram>>;
}

#[async_trait]
pub trait CommentRepo: Send + Sync {
    async fn comment_insert(&self, comment: &Comment) -> Result<()>;

    /// Comments on the target, oldest first.
    async fn comment_list(&self, target: Commentable) -> Result<Vec<Comment>>;
}

pub trait Repo: PhotoRepo + ContestRepo + VoteRepo + CommentRepo {}

impl<T> Repo for T where T: PhotoRepo + ContestRepo + VoteRepo + CommentRepo {}
