use std::collections::BTreeSet;

use caliber_types::{Stars, Watch};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ScoreError;
use crate::tier::{normalize_brand, BrandTierTable};

/// Arithmetic mean of a profile's top-level star ratings.
///
/// Construction rejects anything outside `1.0..=5.0`; the engine never
/// clamps.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct MeanRating(f64);

impl MeanRating {
    pub fn new(mean: f64) -> Result<Self, ScoreError> {
        if mean.is_finite() && (1.0..=5.0).contains(&mean) {
            Ok(Self(mean))
        } else {
            Err(ScoreError::RatingOutOfRange(mean))
        }
    }

    /// Mean of `ratings`, or `None` when there are none.
    pub fn of<I>(ratings: I) -> Option<Self>
    where
        I: IntoIterator<Item = Stars>,
    {
        let (sum, count) = ratings
            .into_iter()
            .fold((0u64, 0u64), |(sum, count), stars| {
                (sum + u64::from(stars.get()), count + 1)
            });
        // Every Stars is within 1..=5, so the mean is too.
        (count > 0).then(|| Self(sum as f64 / count as f64))
    }

    pub fn get(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for MeanRating {
    type Error = ScoreError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MeanRating> for f64 {
    fn from(mean: MeanRating) -> Self {
        mean.0
    }
}

/// Community multiplier for an optional mean rating.
///
/// `None` is exactly `1.0`; a mean `r` maps linearly to `0.5 + r / 5`.
pub fn community_multiplier(rating: Option<MeanRating>) -> f64 {
    match rating {
        None => 1.0,
        Some(mean) => 0.5 + mean.get() / 5.0,
    }
}

/// Every intermediate of a score computation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub pieces: usize,
    pub base: u64,
    pub distinct_categories: usize,
    pub diversity: u64,
    pub multiplier: f64,
    pub total: u64,
}

/// Computes Legacy Scores against an injected brand table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegacyScoreEngine {
    table: BrandTierTable,
    diversity_bonus: u32,
}

impl LegacyScoreEngine {
    pub const DEFAULT_DIVERSITY_BONUS: u32 = 20;

    /// A zero `diversity_bonus` is rejected: each new category must raise
    /// the score.
    pub fn new(table: BrandTierTable, diversity_bonus: u32) -> Result<Self, ScoreError> {
        if diversity_bonus == 0 {
            return Err(ScoreError::ZeroSetting("diversity_bonus"));
        }
        Ok(Self {
            table,
            diversity_bonus,
        })
    }

    /// The standard brand table with the default diversity bonus.
    pub fn standard() -> Self {
        Self {
            table: BrandTierTable::standard(),
            diversity_bonus: Self::DEFAULT_DIVERSITY_BONUS,
        }
    }

    pub fn table(&self) -> &BrandTierTable {
        &self.table
    }

    pub fn diversity_bonus(&self) -> u32 {
        self.diversity_bonus
    }

    /// Prestige of a single watch: its brand weight, with no diversity bonus
    /// or community multiplier. Used for watch-level rankings.
    pub fn watch_prestige(&self, watch: &Watch) -> u32 {
        self.table.weight_for(&watch.brand)
    }

    /// Sum of brand weights over `holdings`.
    pub fn base_score(&self, holdings: &[Watch]) -> u64 {
        holdings
            .iter()
            .map(|watch| u64::from(self.watch_prestige(watch)))
            .sum()
    }

    /// Number of distinct categories, compared case-insensitively.
    pub fn distinct_categories(holdings: &[Watch]) -> usize {
        holdings
            .iter()
            .map(|watch| normalize_brand(&watch.category))
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn breakdown(&self, holdings: &[Watch], rating: Option<MeanRating>) -> ScoreBreakdown {
        let multiplier = community_multiplier(rating);
        if holdings.is_empty() {
            return ScoreBreakdown {
                pieces: 0,
                base: 0,
                distinct_categories: 0,
                diversity: 0,
                multiplier,
                total: 0,
            };
        }

        let base = self.base_score(holdings);
        let distinct_categories = Self::distinct_categories(holdings);
        let diversity = distinct_categories as u64 * u64::from(self.diversity_bonus);
        let total = ((base + diversity) as f64 * multiplier).round() as u64;

        debug!(
            pieces = holdings.len(),
            base,
            diversity,
            multiplier,
            total,
            "legacy score computed"
        );

        ScoreBreakdown {
            pieces: holdings.len(),
            base,
            distinct_categories,
            diversity,
            multiplier,
            total,
        }
    }

    /// The Legacy Score of a vault.
    pub fn score(&self, holdings: &[Watch], rating: Option<MeanRating>) -> u64 {
        self.breakdown(holdings, rating).total
    }
}

impl Default for LegacyScoreEngine {
    fn default() -> Self {
        Self::standard()
    }
}
