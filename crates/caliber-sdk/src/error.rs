use caliber_score::ScoreError;
use caliber_store::StoreError;
use caliber_sync::SyncError;
use caliber_types::{CollectorId, TypeError};
use caliber_votes::VoteError;
use thiserror::Error;

/// Shown when a collector tries to rate the same subject twice.
pub const DUPLICATE_RATING_MESSAGE: &str =
    "You already rated this. Edit your existing entry instead.";

#[derive(Debug, Error)]
pub enum CaliberError {
    /// Malformed input: star value, vote direction, empty body.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A uniqueness rule was violated.
    #[error("duplicate {entity}: {key}")]
    Duplicate { entity: &'static str, key: String },

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// The actor does not own the record they tried to change.
    #[error("{actor} may not modify {entity} {key}")]
    Unauthorized {
        actor: CollectorId,
        entity: &'static str,
        key: String,
    },

    #[error("store error: {0}")]
    Store(StoreError),

    /// The mutation committed but the follow-up sync failed; the collector's
    /// stats are stale until the next successful sync.
    #[error("change saved but profile stats are stale: {0}")]
    StatsSync(#[source] SyncError),

    #[error("configuration error: {0}")]
    Config(#[from] ScoreError),
}

impl CaliberError {
    pub(crate) fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Message suitable for showing to the person who caused the error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Duplicate {
                entity: "rating", ..
            } => DUPLICATE_RATING_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// Whether retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(_) | Self::StatsSync(_))
    }
}

impl From<StoreError> for CaliberError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, key } => Self::NotFound { entity, key },
            StoreError::Duplicate { entity, key } => Self::Duplicate { entity, key },
            other => Self::Store(other),
        }
    }
}

impl From<TypeError> for CaliberError {
    fn from(err: TypeError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<VoteError> for CaliberError {
    fn from(err: VoteError) -> Self {
        match err {
            VoteError::Invalid(err) => err.into(),
            VoteError::SubjectNotFound(subject) => {
                Self::not_found(subject.kind.as_str(), subject.id)
            }
            VoteError::Store(err) => err.into(),
        }
    }
}

/// Errors from an explicitly requested sync. Follow-up syncs after a
/// mutation are wrapped in [`CaliberError::StatsSync`] instead.
impl From<SyncError> for CaliberError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::CollectorNotFound(collector) => Self::not_found("collector", collector),
            SyncError::WatchNotFound { watch, .. } => Self::not_found("watch", watch),
            SyncError::Read(err) | SyncError::Write(err) => err.into(),
        }
    }
}

pub type CaliberResult<T> = Result<T, CaliberError>;
