use caliber_store::{StoreError, VoteLedger};
use caliber_types::{
    CollectorId, SubjectRef, TallyDelta, Vote, VoteChange, VoteDirection, VoteState, VoteTallies,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::VoteError;

/// Result of applying one requested direction to a voter's state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub next: VoteState,
    pub delta: TallyDelta,
}

/// The toggle transition function.
///
/// Requesting the direction already held clears the vote; requesting the
/// other direction flips it; requesting from `None` casts it.
pub fn transition(current: VoteState, requested: VoteDirection) -> Transition {
    let next = if current.direction() == Some(requested) {
        VoteState::None
    } else {
        requested.into()
    };
    Transition {
        next,
        delta: TallyDelta::between(current, next),
    }
}

/// Plan the ledger change for `requested` against the voter's current row.
pub fn plan(
    voter: CollectorId,
    subject: SubjectRef,
    current: Option<&Vote>,
    requested: VoteDirection,
) -> (Transition, VoteChange) {
    let held = current.map(|vote| vote.direction);
    let step = transition(held.into(), requested);
    let change = match held {
        None => VoteChange::Insert(Vote::new(voter, subject, requested)),
        Some(direction) if direction == requested => VoteChange::Delete {
            voter,
            subject,
            direction,
        },
        Some(from) => VoteChange::Update {
            voter,
            subject,
            from,
            to: requested,
        },
    };
    debug_assert_eq!(change.after(), step.next);
    debug_assert_eq!(change.delta(), step.delta);
    (step, change)
}

/// Authoritative state after a vote was applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteOutcome {
    pub subject: SubjectRef,
    pub voter: CollectorId,
    /// The voter's state on the subject after the change.
    pub state: VoteState,
    pub tallies: VoteTallies,
}

/// Apply one voter's requested direction to a subject.
///
/// Reads the voter's row immediately before mutating and commits the row
/// change and tally delta as one unit. A concurrent change to the same row
/// surfaces as [`StoreError::Conflict`]; retrying re-reads and is safe.
pub fn apply_vote<L>(
    ledger: &L,
    voter: CollectorId,
    subject: SubjectRef,
    requested: VoteDirection,
) -> Result<VoteOutcome, VoteError>
where
    L: VoteLedger + ?Sized,
{
    if ledger.subject_tallies(&subject)?.is_none() {
        return Err(VoteError::SubjectNotFound(subject));
    }

    let current = ledger.current_vote(&voter, &subject)?;
    let (step, change) = plan(voter, subject, current.as_ref(), requested);

    let tallies = ledger.commit_vote(&change).map_err(|err| match err {
        StoreError::NotFound { .. } => VoteError::SubjectNotFound(subject),
        other => VoteError::Store(other),
    })?;

    debug!(
        %voter,
        %subject,
        requested = %requested,
        state = ?step.next,
        up = tallies.up,
        down = tallies.down,
        "vote applied"
    );

    Ok(VoteOutcome {
        subject,
        voter,
        state: step.next,
        tallies,
    })
}
