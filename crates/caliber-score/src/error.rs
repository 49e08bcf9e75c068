use std::path::PathBuf;

/// Errors from score configuration and input validation.
#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    /// A mean rating outside the 1–5 star range, or not a finite number.
    #[error("mean rating must be within 1.0..=5.0, got {0}")]
    RatingOutOfRange(f64),

    /// A brand weight in a loaded table exceeds the allowed maximum.
    #[error("weight {weight} for brand {brand:?} exceeds the maximum of {max}")]
    WeightTooLarge { brand: String, weight: u32, max: u32 },

    /// A setting that feeds the score formula was configured as zero.
    #[error("{0} must be greater than zero")]
    ZeroSetting(&'static str),

    /// A brand key is empty after normalization.
    #[error("brand names must not be blank")]
    BlankBrand,

    /// Configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PartialEq for ScoreError {
    fn eq(&self, other: &Self) -> bool {
        // Compare by display representation for test convenience.
        self.to_string() == other.to_string()
    }
}
