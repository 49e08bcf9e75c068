//! Legacy Score engine for Caliber.
//!
//! A collector's Legacy Score is a pure function of the watches they hold
//! and the mean of the community's top-level ratings of their profile:
//!
//! 1. **Base**: the sum of each held watch's brand-prestige weight, looked
//!    up in an injected [`BrandTierTable`]. Unknown brands weigh the
//!    enthusiast default, never zero.
//! 2. **Diversity**: the number of distinct categories held, times a fixed
//!    per-category bonus.
//! 3. **Community multiplier**: exactly `1.0` without ratings, otherwise
//!    `0.5 + mean / 5`, spanning `[0.7, 1.5]`.
//!
//! The final score is `(base + diversity) × multiplier`, rounded to the
//! nearest integer. An empty vault scores zero whatever its rating.
//!
//! # Quick Start
//!
//! ```rust
//! use caliber_score::{LegacyScoreEngine, MeanRating};
//! use caliber_types::Watch;
//!
//! let engine = LegacyScoreEngine::standard();
//! let vault = vec![
//!     Watch::new("Patek Philippe", "Dress"),
//!     Watch::new("Rolex", "Diver"),
//! ];
//! assert_eq!(engine.score(&vault, None), 190);
//! assert_eq!(engine.score(&vault, Some(MeanRating::new(4.0).unwrap())), 247);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod tier;

pub use config::ScoreConfig;
pub use engine::{community_multiplier, LegacyScoreEngine, MeanRating, ScoreBreakdown};
pub use error::ScoreError;
pub use tier::{BrandTier, BrandTierTable};
