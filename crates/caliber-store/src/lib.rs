//! Data-access contracts for the Caliber reputation core.
//!
//! The persistent store is an external collaborator. This crate specifies
//! only the reads and writes the core needs from it, split into narrow
//! traits so each component depends on exactly what it uses:
//!
//! - [`CollectorDirectory`] -- does a collector exist
//! - [`WatchReader`] -- resolve catalog watches
//! - [`HoldingReader`] / [`HoldingWriter`] -- vault membership
//! - [`RatingReader`] / [`RatingWriter`] -- reviews and replies
//! - [`CommentStore`] -- post comments
//! - [`VoteLedger`] -- vote rows and the tallies cached on their subjects
//! - [`ProfileStatsReader`] / [`ProfileStatsWriter`] -- derived profile stats
//!
//! [`CaliberStore`] bundles all of them and is blanket-implemented.
//!
//! # Storage Backends
//!
//! - [`InMemoryCaliberStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Contract Rules
//!
//! 1. At most one top-level review per `(author, target)`; a second insert
//!    fails with [`StoreError::Duplicate`], never overwrites.
//! 2. At most one vote row per `(voter, subject)`.
//! 3. A vote row change and its tally delta are applied together, and only
//!    if the row still matches the state the change was computed from.
//! 4. All backend failures are propagated, never silently ignored.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryCaliberStore;
pub use traits::{
    CaliberStore, CollectorDirectory, CommentStore, HoldingReader, HoldingWriter,
    ProfileStatsReader, ProfileStatsWriter, RatingReader, RatingWriter, VoteLedger, WatchReader,
};
