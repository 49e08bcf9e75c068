//! Foundation types for Caliber.
//!
//! This crate provides the identity, catalog, social and derived-statistics
//! types shared by every other Caliber crate.
//!
//! # Key Types
//!
//! - [`CollectorId`], [`WatchId`], [`ItemId`], [`PostId`] -- UUID v7 identifiers
//! - [`Watch`] / [`Holding`] -- catalog entries and collection membership
//! - [`Review`] -- a top-level star rating or a text-only reply beneath one
//! - [`Comment`] -- a threaded comment on a social post
//! - [`Threadable`] -- the capability shared by reviews and comments
//! - [`Vote`], [`VoteDirection`], [`VoteState`], [`VoteTallies`] -- voting records
//! - [`ProfileStats`] -- derived per-collector statistics

pub mod error;
pub mod ids;
pub mod review;
pub mod stats;
pub mod vote;
pub mod watch;

pub use error::TypeError;
pub use ids::{CollectorId, ItemId, PostId, WatchId};
pub use review::{Comment, RatingTarget, Review, Stars, Threadable};
pub use stats::ProfileStats;
pub use vote::{
    SubjectKind, SubjectRef, TallyDelta, Vote, VoteChange, VoteDirection, VoteState, VoteTallies,
};
pub use watch::{Holding, Watch};
