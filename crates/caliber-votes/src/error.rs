use caliber_store::StoreError;
use caliber_types::{SubjectRef, TypeError};

/// Errors produced while applying a vote.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VoteError {
    /// The requested direction was empty or unknown.
    #[error("invalid vote: {0}")]
    Invalid(#[from] TypeError),

    /// The subject being voted on does not exist.
    #[error("vote subject not found: {0}")]
    SubjectNotFound(SubjectRef),

    /// The underlying store failed, or the row changed under us.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
