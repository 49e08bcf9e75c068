use caliber_types::TypeError;

/// Errors from store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A referenced record does not exist.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// A uniqueness constraint was violated.
    #[error("duplicate {entity}: {key}")]
    Duplicate { entity: &'static str, key: String },

    /// The record changed between the read and the write that depended on it.
    #[error("write conflict: {0}")]
    Conflict(String),

    /// A stored record violates a domain invariant.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// Storage backend is read-only.
    #[error("store is read-only")]
    ReadOnly,

    /// The backend could not be reached or failed mid-operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn duplicate(entity: &'static str, key: impl ToString) -> Self {
        Self::Duplicate {
            entity,
            key: key.to_string(),
        }
    }

    /// Whether retrying the whole operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::Unavailable(_))
    }
}

impl From<TypeError> for StoreError {
    fn from(err: TypeError) -> Self {
        Self::Corrupt(err.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
