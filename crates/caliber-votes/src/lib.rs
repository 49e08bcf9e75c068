//! Vote toggle state machine for Caliber.
//!
//! One implementation serves review helpfulness votes and comment up/down
//! votes alike; the subject kind is data on [`SubjectRef`], not a code path.
//!
//! Per `(voter, subject)` the state is `None`, `Up` or `Down`:
//!
//! | current | requested | next | row | tallies |
//! |---|---|---|---|---|
//! | None | X | X | insert | X +1 |
//! | X | X | None | delete | X −1 |
//! | X | Y | Y | update | X −1, Y +1 |
//!
//! [`apply_vote`] reads the voter's row fresh, plans the transition, and
//! commits the row change together with its tally delta. Cached tallies are
//! a projection of the vote rows; [`recount_tallies`] re-derives them.
//!
//! [`SubjectRef`]: caliber_types::SubjectRef

pub mod error;
pub mod reconcile;
pub mod toggle;

pub use error::VoteError;
pub use reconcile::{recount_tallies, Reconciliation};
pub use toggle::{apply_vote, plan, transition, Transition, VoteOutcome};
