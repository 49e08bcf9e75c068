//! High-level facade for the Caliber reputation core.
//!
//! [`Caliber`] is the entry point for applications embedding the core. It
//! performs each mutation against a [`CaliberStore`], then runs the profile
//! stats synchronizer when the mutation can change a collector's stats.
//! Voting and thread assembly go straight to their components.
//!
//! Every failure is reported as a [`CaliberError`]. Validation, duplicate
//! and authorization errors are user-facing; store errors are retryable.
//! [`CaliberError::StatsSync`] means the mutation itself succeeded and only
//! the follow-up sync failed.

pub mod config;
pub mod error;
pub mod service;

pub use config::CaliberConfig;
pub use error::{CaliberError, CaliberResult};
pub use service::Caliber;

// Re-export key types
pub use caliber_score::{LegacyScoreEngine, ScoreBreakdown, ScoreConfig};
pub use caliber_store::{CaliberStore, InMemoryCaliberStore};
pub use caliber_sync::SyncTrigger;
pub use caliber_thread::{ThreadDisplayConfig, ThreadViewState, TreeNode};
pub use caliber_types::{
    CollectorId, Comment, ItemId, PostId, ProfileStats, RatingTarget, Review, SubjectKind,
    SubjectRef, VoteTallies, Watch, WatchId,
};
pub use caliber_votes::{Reconciliation, VoteOutcome};
