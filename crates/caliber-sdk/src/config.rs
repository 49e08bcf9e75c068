use std::path::Path;

use caliber_score::{ScoreConfig, ScoreError};
use caliber_thread::ThreadDisplayConfig;
use serde::{Deserialize, Serialize};

/// Top-level configuration file.
///
/// ```toml
/// [score]
/// diversity_bonus = 20
///
/// [score.brands]
/// "Ming" = 40
///
/// [thread]
/// page_size = 3
/// max_indent = 4
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaliberConfig {
    pub score: ScoreConfig,
    pub thread: ThreadDisplayConfig,
}

impl CaliberConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ScoreError> {
        toml::from_str(s).map_err(|e| ScoreError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ScoreError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ScoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Load `path` if given, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ScoreError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }
}
