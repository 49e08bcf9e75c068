use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CollectorId, WatchId};

/// A catalog watch reference.
///
/// Watches are owned by the catalog; the reputation core only reads them.
/// `complications` is a set, so listing the same complication twice counts
/// it once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watch {
    pub id: WatchId,
    pub brand: String,
    /// Style or genre, e.g. "Dress", "Diver", "Pilot".
    pub category: String,
    #[serde(default)]
    pub complications: BTreeSet<String>,
}

impl Watch {
    /// Create a watch with a fresh id and no complications.
    pub fn new(brand: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: WatchId::new(),
            brand: brand.into(),
            category: category.into(),
            complications: BTreeSet::new(),
        }
    }

    /// Builder-style helper to attach complications.
    pub fn with_complications<I, S>(mut self, complications: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.complications
            .extend(complications.into_iter().map(Into::into));
        self
    }

    /// Number of distinct complications on this watch.
    pub fn complication_count(&self) -> usize {
        self.complications.len()
    }
}

/// Membership of a watch in a collector's vault.
///
/// At most one holding exists per `(collector, watch)` pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub collector: CollectorId,
    pub watch: WatchId,
    pub added_at: DateTime<Utc>,
}

impl Holding {
    /// A holding added now.
    pub fn new(collector: CollectorId, watch: WatchId) -> Self {
        Self {
            collector,
            watch,
            added_at: Utc::now(),
        }
    }

    /// The `(collector, watch)` key the store enforces uniqueness on.
    pub fn key(&self) -> (CollectorId, WatchId) {
        (self.collector, self.watch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complications_are_deduplicated() {
        let watch = Watch::new("Patek Philippe", "Dress").with_complications([
            "perpetual calendar",
            "moon phase",
            "moon phase",
        ]);
        assert_eq!(watch.complication_count(), 2);
    }

    #[test]
    fn new_watch_has_no_complications() {
        let watch = Watch::new("Rolex", "Diver");
        assert_eq!(watch.complication_count(), 0);
    }

    #[test]
    fn missing_complications_deserialize_as_empty() {
        let json = format!(
            r#"{{"id":"{}","brand":"Seiko","category":"Field"}}"#,
            WatchId::new()
        );
        let watch: Watch = serde_json::from_str(&json).unwrap();
        assert!(watch.complications.is_empty());
    }

    #[test]
    fn holding_key_matches_fields() {
        let holding = Holding::new(CollectorId::new(), WatchId::new());
        assert_eq!(holding.key(), (holding.collector, holding.watch));
    }
}
