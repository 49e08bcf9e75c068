use caliber_store::StoreError;
use caliber_types::{CollectorId, WatchId};

/// Errors from a profile stats sync.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// The collector is unknown to the store.
    #[error("collector not found: {0}")]
    CollectorNotFound(CollectorId),

    /// A holding references a watch the catalog cannot resolve.
    #[error("watch {watch} held by {collector} not found")]
    WatchNotFound {
        collector: CollectorId,
        watch: WatchId,
    },

    /// Reading the sync inputs failed; nothing was written.
    #[error("failed to read sync inputs: {0}")]
    Read(#[source] StoreError),

    /// The stats were computed but could not be written.
    #[error("failed to write profile stats: {0}")]
    Write(#[source] StoreError),
}

impl SyncError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::CollectorNotFound(_) | Self::WatchNotFound { .. })
    }

    /// Whether running the sync again may succeed without other changes.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Read(err) | Self::Write(err) => err.is_transient(),
            Self::CollectorNotFound(_) | Self::WatchNotFound { .. } => false,
        }
    }
}

/// Result alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;
