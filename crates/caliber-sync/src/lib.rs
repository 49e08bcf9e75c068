//! Profile stats synchronizer for Caliber.
//!
//! [`ProfileStats`](caliber_types::ProfileStats) are derived data: a pure
//! function of a collector's live holdings and the community's top-level
//! ratings of their profile. The [`ProfileStatsSynchronizer`] recomputes
//! them wholesale and writes every field in one store call.
//!
//! Sync runs after each mutation that can change the result (see
//! [`SyncTrigger`]). It is idempotent: running it twice against the same
//! store state writes the same stats, so a failed sync is safe to retry.
//!
//! A failed read or an unresolvable holding aborts before anything is
//! written. A failed write is reported to the caller; the mutation that
//! triggered the sync stays committed.

pub mod error;
pub mod synchronizer;
pub mod trigger;

pub use error::{SyncError, SyncResult};
pub use synchronizer::{compute_stats, ProfileStatsSynchronizer, StatsSource, SyncInputs};
pub use trigger::SyncTrigger;
