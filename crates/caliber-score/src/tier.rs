use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ScoreError;

/// Upper bound accepted for any single brand weight.
pub const MAX_BRAND_WEIGHT: u32 = 1000;

/// Prestige tiers of the standard brand table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrandTier {
    /// Apex independents and grand manufactures.
    Apex,
    /// Haute horlogerie and high-complication independents.
    Haute,
    /// The best-known heritage houses.
    HeritageMajor,
    /// Other heritage and established luxury brands.
    Heritage,
    /// Enthusiast and tool-watch brands. Also the weight of unknown brands.
    Enthusiast,
    /// Accessible mainstream brands.
    Accessible,
    /// Entry-level and fashion brands.
    Entry,
}

impl BrandTier {
    pub const ALL: [BrandTier; 7] = [
        Self::Apex,
        Self::Haute,
        Self::HeritageMajor,
        Self::Heritage,
        Self::Enthusiast,
        Self::Accessible,
        Self::Entry,
    ];

    pub fn weight(&self) -> u32 {
        match self {
            Self::Apex => 100,
            Self::Haute => 80,
            Self::HeritageMajor => 50,
            Self::Heritage => 40,
            Self::Enthusiast => 25,
            Self::Accessible => 10,
            Self::Entry => 5,
        }
    }

    /// The highest tier whose weight does not exceed `weight`.
    pub fn for_weight(weight: u32) -> Self {
        Self::ALL
            .into_iter()
            .find(|tier| tier.weight() <= weight)
            .unwrap_or(Self::Entry)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Apex => "apex",
            Self::Haute => "haute",
            Self::HeritageMajor => "heritage major",
            Self::Heritage => "heritage",
            Self::Enthusiast => "enthusiast",
            Self::Accessible => "accessible",
            Self::Entry => "entry",
        }
    }
}

impl fmt::Display for BrandTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const STANDARD_BRANDS: &[(&str, BrandTier)] = &[
    ("Patek Philippe", BrandTier::Apex),
    ("Audemars Piguet", BrandTier::Apex),
    ("Vacheron Constantin", BrandTier::Apex),
    ("A. Lange & Söhne", BrandTier::Apex),
    ("F.P. Journe", BrandTier::Apex),
    ("Greubel Forsey", BrandTier::Apex),
    ("Philippe Dufour", BrandTier::Apex),
    ("Richard Mille", BrandTier::Apex),
    ("Breguet", BrandTier::Apex),
    ("MB&F", BrandTier::Haute),
    ("H. Moser & Cie", BrandTier::Haute),
    ("Laurent Ferrier", BrandTier::Haute),
    ("Kari Voutilainen", BrandTier::Haute),
    ("De Bethune", BrandTier::Haute),
    ("Urwerk", BrandTier::Haute),
    ("Akrivia", BrandTier::Haute),
    ("Rolex", BrandTier::HeritageMajor),
    ("Omega", BrandTier::HeritageMajor),
    ("Jaeger-LeCoultre", BrandTier::HeritageMajor),
    ("Cartier", BrandTier::HeritageMajor),
    ("IWC", BrandTier::HeritageMajor),
    ("Blancpain", BrandTier::HeritageMajor),
    ("Panerai", BrandTier::HeritageMajor),
    ("Grand Seiko", BrandTier::Heritage),
    ("Tudor", BrandTier::Heritage),
    ("Zenith", BrandTier::Heritage),
    ("Breitling", BrandTier::Heritage),
    ("Glashütte Original", BrandTier::Heritage),
    ("Girard-Perregaux", BrandTier::Heritage),
    ("Ulysse Nardin", BrandTier::Heritage),
    ("TAG Heuer", BrandTier::Heritage),
    ("Nomos", BrandTier::Enthusiast),
    ("Sinn", BrandTier::Enthusiast),
    ("Oris", BrandTier::Enthusiast),
    ("Longines", BrandTier::Enthusiast),
    ("Hamilton", BrandTier::Enthusiast),
    ("Doxa", BrandTier::Enthusiast),
    ("Christopher Ward", BrandTier::Enthusiast),
    ("Tissot", BrandTier::Enthusiast),
    ("Seiko", BrandTier::Accessible),
    ("Citizen", BrandTier::Accessible),
    ("Orient", BrandTier::Accessible),
    ("Bulova", BrandTier::Accessible),
    ("Casio", BrandTier::Entry),
    ("Timex", BrandTier::Entry),
    ("Swatch", BrandTier::Entry),
];

/// Immutable brand → prestige weight mapping with a documented default.
///
/// Brand keys are normalized (trimmed, lower-cased, inner whitespace
/// collapsed) so `"  patek   PHILIPPE "` and `"Patek Philippe"` resolve to
/// the same weight. Brands absent from the table weigh `default_weight`,
/// which for the standard table is the enthusiast tier (25).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrandTierTable {
    weights: BTreeMap<String, u32>,
    default_weight: u32,
}

impl BrandTierTable {
    /// The built-in table.
    pub fn standard() -> Self {
        let weights = STANDARD_BRANDS
            .iter()
            .map(|(brand, tier)| (normalize_brand(brand), tier.weight()))
            .collect();
        Self {
            weights,
            default_weight: BrandTier::Enthusiast.weight(),
        }
    }

    /// Build a table from raw `(brand, weight)` pairs.
    ///
    /// Later entries win when two brands normalize to the same key. Unknown
    /// brands always count, so `default_weight` must be non-zero.
    pub fn from_weights<I, S>(entries: I, default_weight: u32) -> Result<Self, ScoreError>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: AsRef<str>,
    {
        if default_weight == 0 {
            return Err(ScoreError::ZeroSetting("default_weight"));
        }
        check_weight("<default>", default_weight)?;
        let mut weights = BTreeMap::new();
        for (brand, weight) in entries {
            let key = normalize_brand(brand.as_ref());
            if key.is_empty() {
                return Err(ScoreError::BlankBrand);
            }
            check_weight(brand.as_ref(), weight)?;
            weights.insert(key, weight);
        }
        Ok(Self {
            weights,
            default_weight,
        })
    }

    /// Prestige weight of `brand`, falling back to the default.
    pub fn weight_for(&self, brand: &str) -> u32 {
        self.weights
            .get(&normalize_brand(brand))
            .copied()
            .unwrap_or(self.default_weight)
    }

    /// Whether `brand` has an explicit entry.
    pub fn contains(&self, brand: &str) -> bool {
        self.weights.contains_key(&normalize_brand(brand))
    }

    pub fn default_weight(&self) -> u32 {
        self.default_weight
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Entries sorted by descending weight, then by normalized brand.
    pub fn entries(&self) -> Vec<(&str, u32)> {
        let mut entries: Vec<(&str, u32)> = self
            .weights
            .iter()
            .map(|(brand, weight)| (brand.as_str(), *weight))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        entries
    }
}

impl Default for BrandTierTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn check_weight(brand: &str, weight: u32) -> Result<(), ScoreError> {
    if weight > MAX_BRAND_WEIGHT {
        return Err(ScoreError::WeightTooLarge {
            brand: brand.to_string(),
            weight,
            max: MAX_BRAND_WEIGHT,
        });
    }
    Ok(())
}

/// Canonical lookup key for a brand name.
pub fn normalize_brand(brand: &str) -> String {
    brand
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_matches_tier_weights() {
        let table = BrandTierTable::standard();
        assert_eq!(table.weight_for("Patek Philippe"), 100);
        assert_eq!(table.weight_for("MB&F"), 80);
        assert_eq!(table.weight_for("Rolex"), 50);
        assert_eq!(table.weight_for("Grand Seiko"), 40);
        assert_eq!(table.weight_for("Sinn"), 25);
        assert_eq!(table.weight_for("Seiko"), 10);
        assert_eq!(table.weight_for("Casio"), 5);
    }

    #[test]
    fn unknown_brand_uses_enthusiast_default() {
        let table = BrandTierTable::standard();
        assert!(!table.contains("Unheard Of Microbrand"));
        assert_eq!(table.weight_for("Unheard Of Microbrand"), 25);
        assert_eq!(table.weight_for(""), 25);
    }

    #[test]
    fn lookup_ignores_case_and_spacing() {
        let table = BrandTierTable::standard();
        assert_eq!(table.weight_for("  patek   PHILIPPE "), 100);
        assert_eq!(table.weight_for("a. lange & söhne"), 100);
    }

    #[test]
    fn custom_table_rejects_oversized_weights() {
        let err = BrandTierTable::from_weights([("Hype", 5000)], 25).unwrap_err();
        assert!(matches!(err, ScoreError::WeightTooLarge { weight: 5000, .. }));
    }

    #[test]
    fn custom_table_rejects_blank_brand() {
        let err = BrandTierTable::from_weights([("   ", 10)], 25).unwrap_err();
        assert_eq!(err, ScoreError::BlankBrand);
    }

    #[test]
    fn custom_table_rejects_zero_default() {
        let err = BrandTierTable::from_weights([("Omega", 50)], 0).unwrap_err();
        assert_eq!(err, ScoreError::ZeroSetting("default_weight"));
    }

    #[test]
    fn later_duplicate_entries_win() {
        let table = BrandTierTable::from_weights([("Omega", 50), ("OMEGA", 60)], 25).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.weight_for("omega"), 60);
    }

    #[test]
    fn entries_are_sorted_by_weight() {
        let table = BrandTierTable::standard();
        let entries = table.entries();
        assert_eq!(entries.len(), table.len());
        for pair in entries.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }

    #[test]
    fn tier_for_weight_rounds_down() {
        assert_eq!(BrandTier::for_weight(100), BrandTier::Apex);
        assert_eq!(BrandTier::for_weight(60), BrandTier::HeritageMajor);
        assert_eq!(BrandTier::for_weight(25), BrandTier::Enthusiast);
        assert_eq!(BrandTier::for_weight(0), BrandTier::Entry);
    }
}
