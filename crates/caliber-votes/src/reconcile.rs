use caliber_store::VoteLedger;
use caliber_types::{SubjectRef, VoteTallies};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::VoteError;

/// Outcome of re-deriving a subject's tallies from its vote rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub subject: SubjectRef,
    pub cached: VoteTallies,
    pub counted: VoteTallies,
}

impl Reconciliation {
    /// Whether the cache disagreed with the rows and was rewritten.
    pub fn drifted(&self) -> bool {
        self.cached != self.counted
    }
}

/// Recount `subject`'s vote rows and rewrite its cached tallies if they
/// disagree.
pub fn recount_tallies<L>(ledger: &L, subject: SubjectRef) -> Result<Reconciliation, VoteError>
where
    L: VoteLedger + ?Sized,
{
    let cached = ledger
        .subject_tallies(&subject)?
        .ok_or(VoteError::SubjectNotFound(subject))?;
    let counted = VoteTallies::count(&ledger.votes_for(&subject)?);

    let reconciliation = Reconciliation {
        subject,
        cached,
        counted,
    };
    if reconciliation.drifted() {
        warn!(
            %subject,
            cached_up = cached.up,
            cached_down = cached.down,
            counted_up = counted.up,
            counted_down = counted.down,
            "cached tallies drifted from vote rows; rewriting"
        );
        ledger.overwrite_tallies(&subject, counted)?;
    }
    Ok(reconciliation)
}

#[cfg(test)]
mod tests {
    use caliber_store::{InMemoryCaliberStore, RatingWriter};
    use caliber_types::{CollectorId, ItemId, RatingTarget, Review, Stars, VoteDirection, WatchId};

    use super::*;
    use crate::toggle::apply_vote;

    fn store_with_review() -> (InMemoryCaliberStore, SubjectRef) {
        let store = InMemoryCaliberStore::new();
        let review = Review::rating(
            CollectorId::new(),
            RatingTarget::Watch(WatchId::new()),
            Stars::new(5).unwrap(),
            "holy grail",
        );
        store.insert_review(&review).unwrap();
        (store, SubjectRef::review(review.id))
    }

    #[test]
    fn consistent_cache_is_left_alone() {
        let (store, subject) = store_with_review();
        apply_vote(&store, CollectorId::new(), subject, VoteDirection::Up).unwrap();
        let result = recount_tallies(&store, subject).unwrap();
        assert!(!result.drifted());
        assert_eq!(result.counted, VoteTallies::new(1, 0));
    }

    #[test]
    fn drifted_cache_is_rewritten_from_rows() {
        let (store, subject) = store_with_review();
        apply_vote(&store, CollectorId::new(), subject, VoteDirection::Down).unwrap();
        store.overwrite_tallies(&subject, VoteTallies::new(7, 7)).unwrap();

        let result = recount_tallies(&store, subject).unwrap();
        assert!(result.drifted());
        assert_eq!(result.cached, VoteTallies::new(7, 7));
        assert_eq!(
            store.subject_tallies(&subject).unwrap(),
            Some(VoteTallies::new(0, 1))
        );
    }

    #[test]
    fn missing_subject_is_not_found() {
        let store = InMemoryCaliberStore::new();
        let subject = SubjectRef::review(ItemId::new());
        assert_eq!(
            recount_tallies(&store, subject),
            Err(VoteError::SubjectNotFound(subject))
        );
    }
}
