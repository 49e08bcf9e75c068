use caliber_types::{
    CollectorId, Comment, Holding, ItemId, PostId, ProfileStats, RatingTarget, Review, SubjectRef,
    Vote, VoteChange, VoteTallies, Watch, WatchId,
};

use crate::error::StoreResult;

/// Lookup of known collectors.
pub trait CollectorDirectory: Send + Sync {
    fn collector_exists(&self, collector: &CollectorId) -> StoreResult<bool>;
}

/// Read access to the watch catalog.
pub trait WatchReader: Send + Sync {
    /// Returns `Ok(None)` if the watch does not exist.
    fn watch(&self, id: &WatchId) -> StoreResult<Option<Watch>>;

    /// Resolve several watches at once, preserving input order.
    ///
    /// Default implementation calls `watch()` for each ID. Backends may
    /// override for fewer round-trips.
    fn watches(&self, ids: &[WatchId]) -> StoreResult<Vec<Option<Watch>>> {
        ids.iter().map(|id| self.watch(id)).collect()
    }
}

/// Read access to vault membership.
pub trait HoldingReader: Send + Sync {
    /// Every holding of `collector`, oldest first.
    fn holdings_of(&self, collector: &CollectorId) -> StoreResult<Vec<Holding>>;
}

/// Write access to vault membership.
pub trait HoldingWriter: Send + Sync {
    /// Fails with `Duplicate` if the pair is already held.
    fn add_holding(&self, holding: &Holding) -> StoreResult<()>;

    /// Returns `true` if the holding existed.
    fn remove_holding(&self, collector: &CollectorId, watch: &WatchId) -> StoreResult<bool>;
}

/// Read access to reviews and their replies.
pub trait RatingReader: Send + Sync {
    fn review(&self, id: &ItemId) -> StoreResult<Option<Review>>;

    /// Every review and reply on `target`, in creation order.
    fn reviews_of(&self, target: &RatingTarget) -> StoreResult<Vec<Review>>;

    /// Only the top-level (star-carrying) reviews on `target`.
    fn ratings_of(&self, target: &RatingTarget) -> StoreResult<Vec<Review>> {
        Ok(self
            .reviews_of(target)?
            .into_iter()
            .filter(Review::is_top_level)
            .collect())
    }
}

/// Write access to reviews and their replies.
///
/// Implementations enforce one top-level review per `(author, target)`.
pub trait RatingWriter: Send + Sync {
    fn insert_review(&self, review: &Review) -> StoreResult<()>;

    /// Replace the editable fields (`stars`, `body`, `edited_at`) of an
    /// existing review. Identity, parentage and tallies are left untouched.
    fn update_review(&self, review: &Review) -> StoreResult<()>;

    /// Remove a review and its vote rows. Replies beneath it are kept and
    /// become orphans. Returns `true` if the review existed.
    fn delete_review(&self, id: &ItemId) -> StoreResult<bool>;
}

/// Storage for post comments.
pub trait CommentStore: Send + Sync {
    fn comment(&self, id: &ItemId) -> StoreResult<Option<Comment>>;

    /// Every comment on `post`, in creation order.
    fn comments_on(&self, post: &PostId) -> StoreResult<Vec<Comment>>;

    fn insert_comment(&self, comment: &Comment) -> StoreResult<()>;

    /// Remove a comment and its vote rows. Returns `true` if it existed.
    fn delete_comment(&self, id: &ItemId) -> StoreResult<bool>;
}

/// Vote rows plus the tallies cached on each subject record.
pub trait VoteLedger: Send + Sync {
    /// The voter's current row on `subject`, if any.
    fn current_vote(&self, voter: &CollectorId, subject: &SubjectRef) -> StoreResult<Option<Vote>>;

    /// Cached tallies of `subject`, or `Ok(None)` if the subject does not exist.
    fn subject_tallies(&self, subject: &SubjectRef) -> StoreResult<Option<VoteTallies>>;

    /// Every vote row on `subject`.
    fn votes_for(&self, subject: &SubjectRef) -> StoreResult<Vec<Vote>>;

    /// Apply a row change and its tally delta as one unit.
    ///
    /// Fails with `Conflict` if the voter's current row no longer matches
    /// [`VoteChange::expected_before`], and with `NotFound` if the subject
    /// is gone. Returns the subject's tallies after the change.
    fn commit_vote(&self, change: &VoteChange) -> StoreResult<VoteTallies>;

    /// Overwrite the cached tallies of `subject`.
    ///
    /// Reserved for reconciliation from the vote rows; regular voting goes
    /// through `commit_vote`.
    fn overwrite_tallies(&self, subject: &SubjectRef, tallies: VoteTallies) -> StoreResult<()>;
}

/// Read access to derived profile stats.
pub trait ProfileStatsReader: Send + Sync {
    fn profile_stats(&self, collector: &CollectorId) -> StoreResult<Option<ProfileStats>>;
}

/// Write access to derived profile stats. All fields are written at once.
pub trait ProfileStatsWriter: Send + Sync {
    fn write_profile_stats(&self, stats: &ProfileStats) -> StoreResult<()>;
}

/// Every contract the reputation core consumes.
pub trait CaliberStore:
    CollectorDirectory
    + WatchReader
    + HoldingReader
    + HoldingWriter
    + RatingReader
    + RatingWriter
    + CommentStore
    + VoteLedger
    + ProfileStatsReader
    + ProfileStatsWriter
{
}

impl<T> CaliberStore for T where
    T: CollectorDirectory
        + WatchReader
        + HoldingReader
        + HoldingWriter
        + RatingReader
        + RatingWriter
        + CommentStore
        + VoteLedger
        + ProfileStatsReader
        + ProfileStatsWriter
{
}
