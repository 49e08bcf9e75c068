use thiserror::Error;

/// Errors produced by type construction and parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("star rating must be between 1 and 5, got {0}")]
    InvalidStars(u8),

    #[error("vote direction is empty")]
    EmptyDirection,

    #[error("unknown vote direction: {0:?} (expected \"up\" or \"down\")")]
    UnknownDirection(String),

    #[error("unknown subject kind: {0:?} (expected \"review\" or \"comment\")")]
    UnknownSubjectKind(String),

    #[error("malformed review: {0}")]
    MalformedReview(&'static str),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("tally underflow: cannot apply {delta} to {current} {direction} vote(s)")]
    TallyUnderflow {
        direction: &'static str,
        current: u64,
        delta: i64,
    },
}
