use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::engine::LegacyScoreEngine;
use crate::error::ScoreError;
use crate::tier::{BrandTier, BrandTierTable};

/// Configuration for the Legacy Score engine.
///
/// ```toml
/// diversity_bonus = 20
/// default_weight = 25
///
/// [brands]
/// "Ming" = 40
/// ```
///
/// Entries under `[brands]` extend (and override) the standard table unless
/// `replace_standard_brands` is set, in which case they are the whole table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    /// Bonus per distinct category held.
    pub diversity_bonus: u32,
    /// Weight of brands absent from the table.
    pub default_weight: u32,
    /// Use only `brands`, ignoring the standard table.
    pub replace_standard_brands: bool,
    pub brands: BTreeMap<String, u32>,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            diversity_bonus: LegacyScoreEngine::DEFAULT_DIVERSITY_BONUS,
            default_weight: BrandTier::Enthusiast.weight(),
            replace_standard_brands: false,
            brands: BTreeMap::new(),
        }
    }
}

impl ScoreConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ScoreError> {
        toml::from_str(s).map_err(|e| ScoreError::Config(e.to_string()))
    }

    /// Resolve the brand table this configuration describes.
    pub fn tier_table(&self) -> Result<BrandTierTable, ScoreError> {
        let overrides = self.brands.iter().map(|(brand, weight)| (brand.as_str(), *weight));
        if self.replace_standard_brands {
            return BrandTierTable::from_weights(overrides, self.default_weight);
        }
        let standard = BrandTierTable::standard();
        let merged: Vec<(String, u32)> = standard
            .entries()
            .into_iter()
            .map(|(brand, weight)| (brand.to_string(), weight))
            .chain(overrides.map(|(brand, weight)| (brand.to_string(), weight)))
            .collect();
        BrandTierTable::from_weights(merged, self.default_weight)
    }

    /// Build an engine from this configuration.
    ///
    /// Fails if a brand weight is out of range or if `diversity_bonus` or
    /// `default_weight` is zero.
    pub fn build_engine(&self) -> Result<LegacyScoreEngine, ScoreError> {
        LegacyScoreEngine::new(self.tier_table()?, self.diversity_bonus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_reproduces_standard_engine() {
        let config = ScoreConfig::default();
        assert_eq!(config.diversity_bonus, 20);
        assert_eq!(config.default_weight, 25);
        assert_eq!(config.tier_table().unwrap(), BrandTierTable::standard());
    }

    #[test]
    fn empty_toml_is_default() {
        let config = ScoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, ScoreConfig::default());
    }

    #[test]
    fn brands_extend_the_standard_table() {
        let config = ScoreConfig::from_toml_str(
            r#"
            diversity_bonus = 30

            [brands]
            "Ming" = 40
            "Rolex" = 60
            "#,
        )
        .unwrap();
        let table = config.tier_table().unwrap();
        assert_eq!(table.weight_for("Ming"), 40);
        assert_eq!(table.weight_for("Rolex"), 60);
        assert_eq!(table.weight_for("Patek Philippe"), 100);
        assert_eq!(config.build_engine().unwrap().diversity_bonus(), 30);
    }

    #[test]
    fn replace_standard_drops_builtin_brands() {
        let config = ScoreConfig::from_toml_str(
            r#"
            replace_standard_brands = true
            default_weight = 1

            [brands]
            "Ming" = 40
            "#,
        )
        .unwrap();
        let table = config.tier_table().unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.weight_for("Patek Philippe"), 1);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let err = ScoreConfig::from_toml_str("diversity_bonus = \"lots\"").unwrap_err();
        assert!(matches!(err, ScoreError::Config(_)));
    }

    #[test]
    fn oversized_weight_is_rejected_on_resolve() {
        let config = ScoreConfig::from_toml_str("[brands]\n\"Hype\" = 99999\n").unwrap();
        assert!(matches!(
            config.tier_table(),
            Err(ScoreError::WeightTooLarge { .. })
        ));
    }

    #[test]
    fn zero_default_weight_is_rejected() {
        let config = ScoreConfig::from_toml_str("default_weight = 0").unwrap();
        assert_eq!(
            config.build_engine().unwrap_err(),
            ScoreError::ZeroSetting("default_weight")
        );
    }

    #[test]
    fn zero_diversity_bonus_is_rejected() {
        let config = ScoreConfig::from_toml_str("diversity_bonus = 0").unwrap();
        assert_eq!(
            config.build_engine().unwrap_err(),
            ScoreError::ZeroSetting("diversity_bonus")
        );
    }
}
