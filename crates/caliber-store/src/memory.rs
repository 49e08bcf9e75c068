use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use caliber_types::{
    CollectorId, Comment, Holding, ItemId, PostId, ProfileStats, RatingTarget, Review, SubjectKind,
    SubjectRef, Vote, VoteChange, VoteState, VoteTallies, Watch, WatchId,
};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{
    CollectorDirectory, CommentStore, HoldingReader, HoldingWriter, ProfileStatsReader,
    ProfileStatsWriter, RatingReader, RatingWriter, VoteLedger, WatchReader,
};

/// In-memory, HashMap-based implementation of every store contract.
///
/// Intended for tests, the CLI and embedding. State lives behind a single
/// `RwLock`, so every contract call is atomic. Failure switches let tests
/// exercise the error paths of the synchronizer and the facade.
pub struct InMemoryCaliberStore {
    inner: RwLock<StoreState>,
    reads_fail: AtomicBool,
    read_only: AtomicBool,
    stats_writes_fail: AtomicBool,
}

#[derive(Default)]
struct StoreState {
    collectors: HashSet<CollectorId>,
    watches: HashMap<WatchId, Watch>,
    holdings: HashMap<CollectorId, Vec<Holding>>,
    reviews: HashMap<ItemId, Review>,
    /// `(author, target)` of every top-level review.
    rating_keys: HashSet<(CollectorId, RatingTarget)>,
    comments: HashMap<ItemId, Comment>,
    votes: HashMap<SubjectRef, HashMap<CollectorId, Vote>>,
    stats: HashMap<CollectorId, ProfileStats>,
}

impl StoreState {
    fn tallies_mut(&mut self, subject: &SubjectRef) -> Option<&mut VoteTallies> {
        match subject.kind {
            SubjectKind::Review => self.reviews.get_mut(&subject.id).map(|r| &mut r.tallies),
            SubjectKind::Comment => self.comments.get_mut(&subject.id).map(|c| &mut c.tallies),
        }
    }

    fn tallies(&self, subject: &SubjectRef) -> Option<VoteTallies> {
        match subject.kind {
            SubjectKind::Review => self.reviews.get(&subject.id).map(|r| r.tallies),
            SubjectKind::Comment => self.comments.get(&subject.id).map(|c| c.tallies),
        }
    }
}

impl InMemoryCaliberStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreState::default()),
            reads_fail: AtomicBool::new(false),
            read_only: AtomicBool::new(false),
            stats_writes_fail: AtomicBool::new(false),
        }
    }

    /// Register a collector so profile operations can resolve it.
    pub fn insert_collector(&self, collector: CollectorId) -> StoreResult<()> {
        let mut state = self.write_state()?;
        state.collectors.insert(collector);
        Ok(())
    }

    /// Add or replace a catalog watch.
    pub fn insert_watch(&self, watch: Watch) -> StoreResult<()> {
        let mut state = self.write_state()?;
        state.watches.insert(watch.id, watch);
        Ok(())
    }

    /// Remove a catalog watch without touching holdings that reference it.
    pub fn remove_watch(&self, id: &WatchId) -> StoreResult<bool> {
        let mut state = self.write_state()?;
        Ok(state.watches.remove(id).is_some())
    }

    /// Make every read fail with [`StoreError::Unavailable`].
    pub fn fail_reads(&self, fail: bool) {
        self.reads_fail.store(fail, Ordering::SeqCst);
    }

    /// Make every write fail with [`StoreError::ReadOnly`].
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Make only profile stats writes fail with [`StoreError::Unavailable`].
    pub fn fail_stats_writes(&self, fail: bool) {
        self.stats_writes_fail.store(fail, Ordering::SeqCst);
    }

    /// Number of vote rows across all subjects.
    pub fn vote_count(&self) -> usize {
        self.inner
            .read()
            .map(|state| state.votes.values().map(HashMap::len).sum())
            .unwrap_or(0)
    }

    /// All registered collectors, sorted.
    pub fn collectors(&self) -> StoreResult<Vec<CollectorId>> {
        let state = self.read_state()?;
        let mut ids: Vec<CollectorId> = state.collectors.iter().copied().collect();
        ids.sort();
        Ok(ids)
    }

    fn read_state(&self) -> StoreResult<RwLockReadGuard<'_, StoreState>> {
        if self.reads_fail.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("read failed".into()));
        }
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".into()))
    }

    fn write_state(&self) -> StoreResult<RwLockWriteGuard<'_, StoreState>> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::ReadOnly);
        }
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".into()))
    }
}

impl Default for InMemoryCaliberStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryCaliberStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (collectors, watches, reviews, comments) = self
            .inner
            .read()
            .map(|s| {
                (
                    s.collectors.len(),
                    s.watches.len(),
                    s.reviews.len(),
                    s.comments.len(),
                )
            })
            .unwrap_or_default();
        f.debug_struct("InMemoryCaliberStore")
            .field("collectors", &collectors)
            .field("watches", &watches)
            .field("reviews", &reviews)
            .field("comments", &comments)
            .finish()
    }
}

impl CollectorDirectory for InMemoryCaliberStore {
    fn collector_exists(&self, collector: &CollectorId) -> StoreResult<bool> {
        Ok(self.read_state()?.collectors.contains(collector))
    }
}

impl WatchReader for InMemoryCaliberStore {
    fn watch(&self, id: &WatchId) -> StoreResult<Option<Watch>> {
        Ok(self.read_state()?.watches.get(id).cloned())
    }

    fn watches(&self, ids: &[WatchId]) -> StoreResult<Vec<Option<Watch>>> {
        let state = self.read_state()?;
        Ok(ids.iter().map(|id| state.watches.get(id).cloned()).collect())
    }
}

impl HoldingReader for InMemoryCaliberStore {
    fn holdings_of(&self, collector: &CollectorId) -> StoreResult<Vec<Holding>> {
        let state = self.read_state()?;
        Ok(state.holdings.get(collector).cloned().unwrap_or_default())
    }
}

impl HoldingWriter for InMemoryCaliberStore {
    fn add_holding(&self, holding: &Holding) -> StoreResult<()> {
        let mut state = self.write_state()?;
        let vault = state.holdings.entry(holding.collector).or_default();
        if vault.iter().any(|h| h.watch == holding.watch) {
            return Err(StoreError::duplicate(
                "holding",
                format!("{}/{}", holding.collector, holding.watch),
            ));
        }
        vault.push(holding.clone());
        debug!(collector = %holding.collector, watch = %holding.watch, "holding added");
        Ok(())
    }

    fn remove_holding(&self, collector: &CollectorId, watch: &WatchId) -> StoreResult<bool> {
        let mut state = self.write_state()?;
        let Some(vault) = state.holdings.get_mut(collector) else {
            return Ok(false);
        };
        let before = vault.len();
        vault.retain(|h| &h.watch != watch);
        Ok(vault.len() != before)
    }
}

impl RatingReader for InMemoryCaliberStore {
    fn review(&self, id: &ItemId) -> StoreResult<Option<Review>> {
        Ok(self.read_state()?.reviews.get(id).cloned())
    }

    fn reviews_of(&self, target: &RatingTarget) -> StoreResult<Vec<Review>> {
        let state = self.read_state()?;
        let mut reviews: Vec<Review> = state
            .reviews
            .values()
            .filter(|r| &r.target == target)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(reviews)
    }
}

impl RatingWriter for InMemoryCaliberStore {
    fn insert_review(&self, review: &Review) -> StoreResult<()> {
        review.check_shape()?;
        let mut state = self.write_state()?;
        if state.reviews.contains_key(&review.id) {
            return Err(StoreError::duplicate("review", review.id));
        }
        if review.is_top_level() {
            let key = (review.author, review.target);
            if !state.rating_keys.insert(key) {
                return Err(StoreError::duplicate(
                    "rating",
                    format!("{} on {}", review.author, review.target),
                ));
            }
        }
        state.reviews.insert(review.id, review.clone());
        Ok(())
    }

    fn update_review(&self, review: &Review) -> StoreResult<()> {
        review.check_shape()?;
        let mut state = self.write_state()?;
        let stored = state
            .reviews
            .get_mut(&review.id)
            .ok_or_else(|| StoreError::not_found("review", review.id))?;
        if stored.parent != review.parent {
            return Err(StoreError::Conflict(format!(
                "review {} cannot change parent",
                review.id
            )));
        }
        stored.stars = review.stars;
        stored.body = review.body.clone();
        stored.edited_at = review.edited_at;
        Ok(())
    }

    fn delete_review(&self, id: &ItemId) -> StoreResult<bool> {
        let mut state = self.write_state()?;
        let Some(review) = state.reviews.remove(id) else {
            return Ok(false);
        };
        if review.is_top_level() {
            state.rating_keys.remove(&(review.author, review.target));
        }
        state.votes.remove(&SubjectRef::review(*id));
        Ok(true)
    }
}

impl CommentStore for InMemoryCaliberStore {
    fn comment(&self, id: &ItemId) -> StoreResult<Option<Comment>> {
        Ok(self.read_state()?.comments.get(id).cloned())
    }

    fn comments_on(&self, post: &PostId) -> StoreResult<Vec<Comment>> {
        let state = self.read_state()?;
        let mut comments: Vec<Comment> = state
            .comments
            .values()
            .filter(|c| &c.post == post)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    fn insert_comment(&self, comment: &Comment) -> StoreResult<()> {
        let mut state = self.write_state()?;
        if state.comments.contains_key(&comment.id) {
            return Err(StoreError::duplicate("comment", comment.id));
        }
        state.comments.insert(comment.id, comment.clone());
        Ok(())
    }

    fn delete_comment(&self, id: &ItemId) -> StoreResult<bool> {
        let mut state = self.write_state()?;
        let existed = state.comments.remove(id).is_some();
        if existed {
            state.votes.remove(&SubjectRef::comment(*id));
        }
        Ok(existed)
    }
}

impl VoteLedger for InMemoryCaliberStore {
    fn current_vote(&self, voter: &CollectorId, subject: &SubjectRef) -> StoreResult<Option<Vote>> {
        let state = self.read_state()?;
        Ok(state
            .votes
            .get(subject)
            .and_then(|rows| rows.get(voter))
            .cloned())
    }

    fn subject_tallies(&self, subject: &SubjectRef) -> StoreResult<Option<VoteTallies>> {
        Ok(self.read_state()?.tallies(subject))
    }

    fn votes_for(&self, subject: &SubjectRef) -> StoreResult<Vec<Vote>> {
        let state = self.read_state()?;
        Ok(state
            .votes
            .get(subject)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default())
    }

    fn commit_vote(&self, change: &VoteChange) -> StoreResult<VoteTallies> {
        let mut state = self.write_state()?;
        let subject = change.subject();
        let voter = change.voter();

        let cached = state
            .tallies(&subject)
            .ok_or_else(|| StoreError::not_found(subject.kind.as_str(), subject.id))?;

        let found: VoteState = state
            .votes
            .get(&subject)
            .and_then(|rows| rows.get(&voter))
            .map(|vote| vote.direction)
            .into();
        if found != change.expected_before() {
            return Err(StoreError::Conflict(format!(
                "vote by {voter} on {subject} is {found:?}, expected {:?}",
                change.expected_before()
            )));
        }

        let updated = cached.apply(change.delta())?;

        let rows = state.votes.entry(subject).or_default();
        match change {
            VoteChange::Insert(vote) => {
                rows.insert(voter, vote.clone());
            }
            VoteChange::Update { to, .. } => {
                if let Some(row) = rows.get_mut(&voter) {
                    row.direction = *to;
                }
            }
            VoteChange::Delete { .. } => {
                rows.remove(&voter);
            }
        }
        if rows.is_empty() {
            state.votes.remove(&subject);
        }

        if let Some(tallies) = state.tallies_mut(&subject) {
            *tallies = updated;
        }
        Ok(updated)
    }

    fn overwrite_tallies(&self, subject: &SubjectRef, tallies: VoteTallies) -> StoreResult<()> {
        let mut state = self.write_state()?;
        let slot = state
            .tallies_mut(subject)
            .ok_or_else(|| StoreError::not_found(subject.kind.as_str(), subject.id))?;
        *slot = tallies;
        Ok(())
    }
}

impl ProfileStatsReader for InMemoryCaliberStore {
    fn profile_stats(&self, collector: &CollectorId) -> StoreResult<Option<ProfileStats>> {
        Ok(self.read_state()?.stats.get(collector).copied())
    }
}

impl ProfileStatsWriter for InMemoryCaliberStore {
    fn write_profile_stats(&self, stats: &ProfileStats) -> StoreResult<()> {
        if self.stats_writes_fail.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("stats write failed".into()));
        }
        let mut state = self.write_state()?;
        state.stats.insert(stats.collector, *stats);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caliber_types::{Stars, VoteDirection};

    fn rated(author: CollectorId, target: RatingTarget, stars: u8) -> Review {
        Review::rating(author, target, Stars::new(stars).unwrap(), "")
    }

    fn seeded_review(store: &InMemoryCaliberStore) -> Review {
        let review = rated(
            CollectorId::new(),
            RatingTarget::Watch(WatchId::new()),
            4,
        );
        store.insert_review(&review).unwrap();
        review
    }

    // -----------------------------------------------------------------------
    // Holdings
    // -----------------------------------------------------------------------

    #[test]
    fn add_and_list_holdings() {
        let store = InMemoryCaliberStore::new();
        let collector = CollectorId::new();
        let first = Holding::new(collector, WatchId::new());
        let second = Holding::new(collector, WatchId::new());
        store.add_holding(&first).unwrap();
        store.add_holding(&second).unwrap();

        let held = store.holdings_of(&collector).unwrap();
        assert_eq!(held, vec![first, second]);
    }

    #[test]
    fn duplicate_holding_is_rejected() {
        let store = InMemoryCaliberStore::new();
        let holding = Holding::new(CollectorId::new(), WatchId::new());
        store.add_holding(&holding).unwrap();
        let err = store.add_holding(&holding).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { entity: "holding", .. }));
        assert_eq!(store.holdings_of(&holding.collector).unwrap().len(), 1);
    }

    #[test]
    fn remove_holding_reports_presence() {
        let store = InMemoryCaliberStore::new();
        let holding = Holding::new(CollectorId::new(), WatchId::new());
        store.add_holding(&holding).unwrap();
        assert!(store.remove_holding(&holding.collector, &holding.watch).unwrap());
        assert!(!store.remove_holding(&holding.collector, &holding.watch).unwrap());
        assert!(store.holdings_of(&holding.collector).unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // Reviews
    // -----------------------------------------------------------------------

    #[test]
    fn second_top_level_rating_is_duplicate() {
        let store = InMemoryCaliberStore::new();
        let author = CollectorId::new();
        let target = RatingTarget::Profile(CollectorId::new());
        store.insert_review(&rated(author, target, 5)).unwrap();

        let err = store.insert_review(&rated(author, target, 2)).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { entity: "rating", .. }));
        assert_eq!(store.ratings_of(&target).unwrap().len(), 1);
    }

    #[test]
    fn replies_do_not_count_against_rating_uniqueness() {
        let store = InMemoryCaliberStore::new();
        let author = CollectorId::new();
        let target = RatingTarget::Profile(CollectorId::new());
        let rating = rated(author, target, 5);
        store.insert_review(&rating).unwrap();
        store.insert_review(&Review::reply(author, &rating, "one")).unwrap();
        store.insert_review(&Review::reply(author, &rating, "two")).unwrap();

        assert_eq!(store.reviews_of(&target).unwrap().len(), 3);
        assert_eq!(store.ratings_of(&target).unwrap().len(), 1);
    }

    #[test]
    fn deleting_a_rating_frees_the_author_slot() {
        let store = InMemoryCaliberStore::new();
        let author = CollectorId::new();
        let target = RatingTarget::Watch(WatchId::new());
        let rating = rated(author, target, 1);
        store.insert_review(&rating).unwrap();
        assert!(store.delete_review(&rating.id).unwrap());
        store.insert_review(&rated(author, target, 3)).unwrap();
    }

    #[test]
    fn update_keeps_tallies_and_parent() {
        let store = InMemoryCaliberStore::new();
        let review = seeded_review(&store);
        let voter = CollectorId::new();
        store
            .commit_vote(&VoteChange::Insert(Vote::new(
                voter,
                SubjectRef::review(review.id),
                VoteDirection::Up,
            )))
            .unwrap();

        let mut edited = review.clone();
        edited.stars = Some(Stars::new(2).unwrap());
        edited.body = "changed my mind".into();
        edited.tallies = VoteTallies::default();
        store.update_review(&edited).unwrap();

        let stored = store.review(&review.id).unwrap().unwrap();
        assert_eq!(stored.stars, Some(Stars::new(2).unwrap()));
        assert_eq!(stored.tallies, VoteTallies::new(1, 0));
    }

    #[test]
    fn update_missing_review_is_not_found() {
        let store = InMemoryCaliberStore::new();
        let review = rated(CollectorId::new(), RatingTarget::Watch(WatchId::new()), 3);
        let err = store.update_review(&review).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "review", .. }));
    }

    // -----------------------------------------------------------------------
    // Votes
    // -----------------------------------------------------------------------

    #[test]
    fn commit_vote_moves_rows_and_tallies_together() {
        let store = InMemoryCaliberStore::new();
        let review = seeded_review(&store);
        let subject = SubjectRef::review(review.id);
        let voter = CollectorId::new();

        let tallies = store
            .commit_vote(&VoteChange::Insert(Vote::new(voter, subject, VoteDirection::Up)))
            .unwrap();
        assert_eq!(tallies, VoteTallies::new(1, 0));

        let tallies = store
            .commit_vote(&VoteChange::Update {
                voter,
                subject,
                from: VoteDirection::Up,
                to: VoteDirection::Down,
            })
            .unwrap();
        assert_eq!(tallies, VoteTallies::new(0, 1));
        assert_eq!(
            store.current_vote(&voter, &subject).unwrap().map(|v| v.direction),
            Some(VoteDirection::Down)
        );

        let tallies = store
            .commit_vote(&VoteChange::Delete {
                voter,
                subject,
                direction: VoteDirection::Down,
            })
            .unwrap();
        assert_eq!(tallies, VoteTallies::default());
        assert!(store.current_vote(&voter, &subject).unwrap().is_none());
        assert_eq!(store.vote_count(), 0);
    }

    #[test]
    fn stale_change_is_a_conflict() {
        let store = InMemoryCaliberStore::new();
        let review = seeded_review(&store);
        let subject = SubjectRef::review(review.id);
        let voter = CollectorId::new();
        let insert = VoteChange::Insert(Vote::new(voter, subject, VoteDirection::Up));
        store.commit_vote(&insert).unwrap();

        // A second request computed against the same `None` read loses.
        let err = store.commit_vote(&insert).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.subject_tallies(&subject).unwrap(), Some(VoteTallies::new(1, 0)));
    }

    #[test]
    fn vote_on_missing_subject_is_not_found() {
        let store = InMemoryCaliberStore::new();
        let subject = SubjectRef::comment(ItemId::new());
        let change = VoteChange::Insert(Vote::new(CollectorId::new(), subject, VoteDirection::Down));
        let err = store.commit_vote(&change).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "comment", .. }));
    }

    #[test]
    fn deleting_a_comment_drops_its_votes() {
        let store = InMemoryCaliberStore::new();
        let comment = Comment::new(PostId::new(), CollectorId::new(), None, "first");
        store.insert_comment(&comment).unwrap();
        let subject = SubjectRef::comment(comment.id);
        store
            .commit_vote(&VoteChange::Insert(Vote::new(
                CollectorId::new(),
                subject,
                VoteDirection::Up,
            )))
            .unwrap();
        assert!(store.delete_comment(&comment.id).unwrap());
        assert!(store.votes_for(&subject).unwrap().is_empty());
        assert_eq!(store.subject_tallies(&subject).unwrap(), None);
    }

    // -----------------------------------------------------------------------
    // Failure switches
    // -----------------------------------------------------------------------

    #[test]
    fn failing_reads_surface_unavailable() {
        let store = InMemoryCaliberStore::new();
        store.fail_reads(true);
        let err = store.holdings_of(&CollectorId::new()).unwrap_err();
        assert!(err.is_transient());
        store.fail_reads(false);
        assert!(store.holdings_of(&CollectorId::new()).is_ok());
    }

    #[test]
    fn read_only_blocks_writes() {
        let store = InMemoryCaliberStore::new();
        store.set_read_only(true);
        let err = store
            .add_holding(&Holding::new(CollectorId::new(), WatchId::new()))
            .unwrap_err();
        assert_eq!(err, StoreError::ReadOnly);
    }

    #[test]
    fn stats_write_failure_leaves_prior_stats() {
        let store = InMemoryCaliberStore::new();
        let collector = CollectorId::new();
        let mut stats = ProfileStats::empty(collector);
        stats.legacy_score = 10;
        store.write_profile_stats(&stats).unwrap();

        store.fail_stats_writes(true);
        stats.legacy_score = 99;
        assert!(store.write_profile_stats(&stats).is_err());
        assert_eq!(
            store.profile_stats(&collector).unwrap().map(|s| s.legacy_score),
            Some(10)
        );
    }

    #[test]
    fn vote_state_from_missing_row_is_none() {
        let store = InMemoryCaliberStore::new();
        let review = seeded_review(&store);
        let state: VoteState = store
            .current_vote(&CollectorId::new(), &SubjectRef::review(review.id))
            .unwrap()
            .map(|v| v.direction)
            .into();
        assert_eq!(state, VoteState::None);
    }

    #[test]
    fn debug_format() {
        let store = InMemoryCaliberStore::new();
        store.insert_collector(CollectorId::new()).unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryCaliberStore"));
        assert!(debug.contains("collectors"));
    }
}
