use serde::{Deserialize, Serialize};

use crate::ids::CollectorId;

/// Derived public statistics for a collector's profile.
///
/// Owned exclusively by the profile stats synchronizer and always
/// recomputed wholesale from the live holdings and profile ratings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileStats {
    pub collector: CollectorId,
    pub total_pieces: u64,
    pub total_complications: u64,
    pub legacy_score: u64,
}

impl ProfileStats {
    /// Stats for a collector with an empty vault.
    pub fn empty(collector: CollectorId) -> Self {
        Self {
            collector,
            total_pieces: 0,
            total_complications: 0,
            legacy_score: 0,
        }
    }
}
