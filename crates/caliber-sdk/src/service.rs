use caliber_score::ScoreBreakdown;
use caliber_store::{CaliberStore, InMemoryCaliberStore};
use caliber_sync::{ProfileStatsSynchronizer, SyncTrigger};
use caliber_thread::{build_forest, ThreadDisplayConfig, TreeNode};
use caliber_types::{
    CollectorId, Comment, Holding, ItemId, PostId, ProfileStats, RatingTarget, Review, Stars,
    SubjectKind, SubjectRef, VoteDirection, WatchId,
};
use caliber_votes::{apply_vote, recount_tallies, Reconciliation, VoteOutcome};
use chrono::Utc;
use tracing::{debug, info};

use crate::config::CaliberConfig;
use crate::error::{CaliberError, CaliberResult};

/// High-level Caliber API over a store.
#[derive(Debug)]
pub struct Caliber<S = InMemoryCaliberStore> {
    store: S,
    sync: ProfileStatsSynchronizer,
    display: ThreadDisplayConfig,
}

impl Caliber<InMemoryCaliberStore> {
    /// A facade over a fresh in-memory store with default configuration.
    pub fn in_memory() -> Self {
        Self::new(InMemoryCaliberStore::new())
    }
}

impl<S: CaliberStore> Caliber<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            sync: ProfileStatsSynchronizer::default(),
            display: ThreadDisplayConfig::default(),
        }
    }

    pub fn with_config(store: S, config: &CaliberConfig) -> CaliberResult<Self> {
        Ok(Self {
            store,
            sync: ProfileStatsSynchronizer::new(config.score.build_engine()?),
            display: config.thread,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn display_config(&self) -> &ThreadDisplayConfig {
        &self.display
    }

    // ---- Vault operations ----

    /// Add a watch to a collector's vault and resync their stats.
    pub fn add_holding(&self, collector: CollectorId, watch: WatchId) -> CaliberResult<ProfileStats> {
        self.require_collector(collector)?;
        if self.store.watch(&watch)?.is_none() {
            return Err(CaliberError::not_found("watch", watch));
        }
        self.store.add_holding(&Holding::new(collector, watch))?;
        debug!(%collector, %watch, "holding added");
        self.resync(collector, SyncTrigger::HoldingAdded)
    }

    /// Remove a watch from a collector's vault and resync their stats.
    pub fn remove_holding(
        &self,
        collector: CollectorId,
        watch: WatchId,
    ) -> CaliberResult<ProfileStats> {
        if !self.store.remove_holding(&collector, &watch)? {
            return Err(CaliberError::not_found(
                "holding",
                format!("{collector}/{watch}"),
            ));
        }
        debug!(%collector, %watch, "holding removed");
        self.resync(collector, SyncTrigger::HoldingRemoved)
    }

    // ---- Ratings and replies ----

    /// Post a top-level rating. A second rating of the same target by the
    /// same author is a [`CaliberError::Duplicate`].
    pub fn post_rating(
        &self,
        author: CollectorId,
        target: RatingTarget,
        stars: u8,
        body: impl Into<String>,
    ) -> CaliberResult<Review> {
        let stars = Stars::new(stars)?;
        self.require_collector(author)?;
        self.require_target(target)?;

        let review = Review::rating(author, target, stars, body);
        self.store.insert_review(&review)?;
        info!(%author, %target, stars = stars.get(), "rating posted");

        self.resync_profile(target, SyncTrigger::RatingCreated)?;
        Ok(review)
    }

    /// Edit the author's own rating. `None` leaves a field unchanged.
    ///
    /// Only a change of star value resyncs the rated profile.
    pub fn edit_rating(
        &self,
        actor: CollectorId,
        id: ItemId,
        stars: Option<u8>,
        body: Option<String>,
    ) -> CaliberResult<Review> {
        let mut review = self.owned_review(actor, id)?;
        let Some(before) = review.stars else {
            return Err(CaliberError::Validation(
                "replies carry no rating to edit".into(),
            ));
        };
        let after = stars.map(Stars::new).transpose()?.unwrap_or(before);

        review.stars = Some(after);
        if let Some(body) = body {
            review.body = body;
        }
        review.edited_at = Some(Utc::now());
        self.store.update_review(&review)?;

        let trigger = SyncTrigger::for_rating_edit(before, after);
        debug!(%actor, review = %id, %trigger, "rating edited");
        self.resync_profile(review.target, trigger)?;
        Ok(review)
    }

    /// Delete the author's own rating or reply. Replies beneath it stay and
    /// render as roots.
    pub fn delete_rating(&self, actor: CollectorId, id: ItemId) -> CaliberResult<()> {
        let review = self.owned_review(actor, id)?;
        self.store.delete_review(&id)?;
        debug!(%actor, review = %id, "review deleted");
        if review.is_top_level() {
            self.resync_profile(review.target, SyncTrigger::RatingDeleted)?;
        }
        Ok(())
    }

    /// Reply to a rating or to another reply.
    pub fn post_reply(
        &self,
        author: CollectorId,
        parent: ItemId,
        body: impl Into<String>,
    ) -> CaliberResult<Review> {
        let body = non_empty(body.into())?;
        self.require_collector(author)?;
        let parent = self
            .store
            .review(&parent)?
            .ok_or_else(|| CaliberError::not_found("review", parent))?;

        let reply = Review::reply(author, &parent, body);
        self.store.insert_review(&reply)?;
        debug!(%author, parent = %parent.id, "reply posted");
        Ok(reply)
    }

    // ---- Post comments ----

    /// Comment on a post, optionally in reply to another comment on it.
    pub fn post_comment(
        &self,
        author: CollectorId,
        post: PostId,
        parent: Option<ItemId>,
        body: impl Into<String>,
    ) -> CaliberResult<Comment> {
        let body = non_empty(body.into())?;
        self.require_collector(author)?;
        if let Some(parent) = parent {
            let parent = self
                .store
                .comment(&parent)?
                .ok_or_else(|| CaliberError::not_found("comment", parent))?;
            if parent.post != post {
                return Err(CaliberError::Validation(format!(
                    "comment {} belongs to another post",
                    parent.id
                )));
            }
        }

        let comment = Comment::new(post, author, parent, body);
        self.store.insert_comment(&comment)?;
        debug!(%author, %post, "comment posted");
        Ok(comment)
    }

    /// Delete the author's own comment.
    pub fn delete_comment(&self, actor: CollectorId, id: ItemId) -> CaliberResult<()> {
        let comment = self
            .store
            .comment(&id)?
            .ok_or_else(|| CaliberError::not_found("comment", id))?;
        if comment.author != actor {
            return Err(CaliberError::Unauthorized {
                actor,
                entity: "comment",
                key: id.to_string(),
            });
        }
        self.store.delete_comment(&id)?;
        Ok(())
    }

    // ---- Voting ----

    /// Toggle a vote. `direction` is `"up"` or `"down"`.
    pub fn cast_vote(
        &self,
        voter: CollectorId,
        kind: SubjectKind,
        id: ItemId,
        direction: &str,
    ) -> CaliberResult<VoteOutcome> {
        let direction: VoteDirection = direction.parse()?;
        self.require_collector(voter)?;
        Ok(apply_vote(
            &self.store,
            voter,
            SubjectRef::new(kind, id),
            direction,
        )?)
    }

    /// Re-derive a subject's cached tallies from its vote rows.
    pub fn recount_tallies(&self, subject: SubjectRef) -> CaliberResult<Reconciliation> {
        Ok(recount_tallies(&self.store, subject)?)
    }

    // ---- Threads ----

    /// Every rating and reply on `target` as a forest.
    pub fn review_thread(&self, target: RatingTarget) -> CaliberResult<Vec<TreeNode<Review>>> {
        Ok(build_forest(self.store.reviews_of(&target)?))
    }

    /// Every comment on `post` as a forest.
    pub fn comment_thread(&self, post: PostId) -> CaliberResult<Vec<TreeNode<Comment>>> {
        Ok(build_forest(self.store.comments_on(&post)?))
    }

    // ---- Profile stats ----

    /// Recompute and store a collector's stats.
    pub fn sync_profile(&self, collector: CollectorId) -> CaliberResult<ProfileStats> {
        Ok(self.sync.sync(&self.store, collector)?)
    }

    /// The stats last written for a collector; zeroed if never synced.
    pub fn profile_stats(&self, collector: CollectorId) -> CaliberResult<ProfileStats> {
        self.require_collector(collector)?;
        Ok(self
            .store
            .profile_stats(&collector)?
            .unwrap_or_else(|| ProfileStats::empty(collector)))
    }

    /// Compute a collector's score from live data without writing it.
    pub fn legacy_score(&self, collector: CollectorId) -> CaliberResult<ScoreBreakdown> {
        let inputs = self.sync.gather(&self.store, collector)?;
        Ok(self
            .sync
            .engine()
            .breakdown(&inputs.watches, inputs.rating))
    }

    // ---- Internal ----

    fn require_collector(&self, collector: CollectorId) -> CaliberResult<()> {
        if self.store.collector_exists(&collector)? {
            Ok(())
        } else {
            Err(CaliberError::not_found("collector", collector))
        }
    }

    fn require_target(&self, target: RatingTarget) -> CaliberResult<()> {
        match target {
            RatingTarget::Profile(collector) => self.require_collector(collector),
            RatingTarget::Watch(watch) => match self.store.watch(&watch)? {
                Some(_) => Ok(()),
                None => Err(CaliberError::not_found("watch", watch)),
            },
        }
    }

    fn owned_review(&self, actor: CollectorId, id: ItemId) -> CaliberResult<Review> {
        let review = self
            .store
            .review(&id)?
            .ok_or_else(|| CaliberError::not_found("review", id))?;
        if review.author != actor {
            return Err(CaliberError::Unauthorized {
                actor,
                entity: "review",
                key: id.to_string(),
            });
        }
        Ok(review)
    }

    fn resync(&self, collector: CollectorId, trigger: SyncTrigger) -> CaliberResult<ProfileStats> {
        self.sync
            .sync(&self.store, collector)
            .map_err(CaliberError::StatsSync)
            .inspect(|_| debug!(%collector, %trigger, "stats resynced"))
    }

    /// Resync the rated collector when `target` is a profile.
    fn resync_profile(&self, target: RatingTarget, trigger: SyncTrigger) -> CaliberResult<()> {
        if let RatingTarget::Profile(collector) = target {
            self.sync
                .sync_after(&self.store, collector, trigger)
                .map_err(CaliberError::StatsSync)?;
        }
        Ok(())
    }
}

fn non_empty(body: String) -> CaliberResult<String> {
    if body.trim().is_empty() {
        Err(CaliberError::Validation("body must not be empty".into()))
    } else {
        Ok(body)
    }
}
