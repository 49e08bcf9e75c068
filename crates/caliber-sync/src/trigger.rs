use caliber_types::Stars;
use serde::{Deserialize, Serialize};

/// Mutations that may invalidate a collector's profile stats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncTrigger {
    HoldingAdded,
    HoldingRemoved,
    RatingCreated,
    /// A profile rating's star value changed.
    RatingValueEdited,
    /// Only a profile rating's text changed.
    RatingTextEdited,
    RatingDeleted,
}

impl SyncTrigger {
    pub const ALL: [SyncTrigger; 6] = [
        SyncTrigger::HoldingAdded,
        SyncTrigger::HoldingRemoved,
        SyncTrigger::RatingCreated,
        SyncTrigger::RatingValueEdited,
        SyncTrigger::RatingTextEdited,
        SyncTrigger::RatingDeleted,
    ];

    /// Classify an edit of a profile rating by whether its stars moved.
    pub fn for_rating_edit(before: Stars, after: Stars) -> Self {
        if before == after {
            Self::RatingTextEdited
        } else {
            Self::RatingValueEdited
        }
    }

    /// Text edits leave every input of the score unchanged.
    pub fn requires_resync(&self) -> bool {
        !matches!(self, Self::RatingTextEdited)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HoldingAdded => "holding-added",
            Self::HoldingRemoved => "holding-removed",
            Self::RatingCreated => "rating-created",
            Self::RatingValueEdited => "rating-value-edited",
            Self::RatingTextEdited => "rating-text-edited",
            Self::RatingDeleted => "rating-deleted",
        }
    }
}

impl std::fmt::Display for SyncTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_text_edits_skip_resync() {
        for trigger in SyncTrigger::ALL {
            assert_eq!(
                trigger.requires_resync(),
                trigger != SyncTrigger::RatingTextEdited,
                "{trigger}"
            );
        }
    }

    #[test]
    fn rating_edit_classification() {
        let three = Stars::new(3).unwrap();
        let four = Stars::new(4).unwrap();
        assert_eq!(
            SyncTrigger::for_rating_edit(three, three),
            SyncTrigger::RatingTextEdited
        );
        assert_eq!(
            SyncTrigger::for_rating_edit(three, four),
            SyncTrigger::RatingValueEdited
        );
    }

    #[test]
    fn serde_names_match_display() {
        for trigger in SyncTrigger::ALL {
            let json = serde_json::to_string(&trigger).unwrap();
            assert_eq!(json, format!("\"{trigger}\""));
        }
    }
}
