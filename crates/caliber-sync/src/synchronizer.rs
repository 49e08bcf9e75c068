use caliber_score::{LegacyScoreEngine, MeanRating};
use caliber_store::{
    CollectorDirectory, HoldingReader, ProfileStatsWriter, RatingReader, StoreError, WatchReader,
};
use caliber_types::{CollectorId, ProfileStats, RatingTarget, Watch, WatchId};
use tracing::{debug, info, info_span, warn};

use crate::error::{SyncError, SyncResult};
use crate::trigger::SyncTrigger;

/// The store contracts a sync reads from and writes to.
pub trait StatsSource:
    CollectorDirectory + HoldingReader + WatchReader + RatingReader + ProfileStatsWriter
{
}

impl<T> StatsSource for T where
    T: CollectorDirectory + HoldingReader + WatchReader + RatingReader + ProfileStatsWriter + ?Sized
{
}

/// Everything a collector's stats are computed from.
#[derive(Clone, Debug, PartialEq)]
pub struct SyncInputs {
    pub collector: CollectorId,
    /// Resolved watches of every holding, in holding order.
    pub watches: Vec<Watch>,
    /// Mean of the top-level ratings of the collector's profile.
    pub rating: Option<MeanRating>,
}

/// Compute a collector's stats from already-resolved inputs.
pub fn compute_stats(engine: &LegacyScoreEngine, inputs: &SyncInputs) -> ProfileStats {
    ProfileStats {
        collector: inputs.collector,
        total_pieces: inputs.watches.len() as u64,
        total_complications: inputs
            .watches
            .iter()
            .map(|watch| watch.complication_count() as u64)
            .sum(),
        legacy_score: engine.score(&inputs.watches, inputs.rating),
    }
}

/// Recomputes and writes derived profile stats.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileStatsSynchronizer {
    engine: LegacyScoreEngine,
}

impl ProfileStatsSynchronizer {
    pub fn new(engine: LegacyScoreEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &LegacyScoreEngine {
        &self.engine
    }

    /// Read every input of `collector`'s stats without writing anything.
    pub fn gather<S>(&self, store: &S, collector: CollectorId) -> SyncResult<SyncInputs>
    where
        S: StatsSource + ?Sized,
    {
        if !store.collector_exists(&collector).map_err(SyncError::Read)? {
            return Err(SyncError::CollectorNotFound(collector));
        }

        let watch_ids: Vec<WatchId> = store
            .holdings_of(&collector)
            .map_err(SyncError::Read)?
            .into_iter()
            .map(|holding| holding.watch)
            .collect();
        let resolved = store.watches(&watch_ids).map_err(SyncError::Read)?;
        let watches = watch_ids
            .iter()
            .zip(resolved)
            .map(|(watch, found)| {
                found.ok_or(SyncError::WatchNotFound {
                    collector,
                    watch: *watch,
                })
            })
            .collect::<SyncResult<Vec<Watch>>>()?;

        let ratings = store
            .ratings_of(&RatingTarget::Profile(collector))
            .map_err(SyncError::Read)?;
        let stars = ratings
            .iter()
            .map(|review| {
                review.stars.ok_or_else(|| {
                    SyncError::Read(StoreError::Corrupt(format!(
                        "top-level review {} has no stars",
                        review.id
                    )))
                })
            })
            .collect::<SyncResult<Vec<_>>>()?;

        debug!(
            %collector,
            pieces = watches.len(),
            ratings = stars.len(),
            "sync inputs gathered"
        );

        Ok(SyncInputs {
            collector,
            watches,
            rating: MeanRating::of(stars),
        })
    }

    /// Recompute `collector`'s stats and write them in one call.
    ///
    /// Aborts without writing if any input cannot be read or resolved.
    pub fn sync<S>(&self, store: &S, collector: CollectorId) -> SyncResult<ProfileStats>
    where
        S: StatsSource + ?Sized,
    {
        let _span = info_span!("sync_profile", %collector).entered();

        let inputs = self.gather(store, collector).inspect_err(|err| {
            warn!(error = %err, "profile sync aborted before write");
        })?;
        let stats = compute_stats(&self.engine, &inputs);

        store.write_profile_stats(&stats).map_err(|err| {
            warn!(error = %err, "profile stats write failed");
            SyncError::Write(err)
        })?;

        info!(
            pieces = stats.total_pieces,
            complications = stats.total_complications,
            legacy_score = stats.legacy_score,
            "profile stats synced"
        );
        Ok(stats)
    }

    /// Sync only if `trigger` can change the result.
    pub fn sync_after<S>(
        &self,
        store: &S,
        collector: CollectorId,
        trigger: SyncTrigger,
    ) -> SyncResult<Option<ProfileStats>>
    where
        S: StatsSource + ?Sized,
    {
        if !trigger.requires_resync() {
            debug!(%collector, %trigger, "sync skipped");
            return Ok(None);
        }
        self.sync(store, collector).map(Some)
    }
}
