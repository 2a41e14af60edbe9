//! Detected narrative inconsistencies.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of fragment characters kept in an inconsistency snippet.
pub const SNIPPET_CHARS: usize = 150;

/// Kind of rule violation found in a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    /// An object or technology that did not exist in the setting's era.
    Anachronism,
    /// An event that could not have happened in the setting's era.
    HistoricalImpossibility,
    /// Contradicts something the story already established.
    Contradiction,
    Other,
}

/// Keyword stems checked in order; the first kind with a match wins.
const KIND_KEYWORDS: &[(ViolationKind, &[&str])] = &[
    (ViolationKind::Anachronism, &["ANACHRONIS", "ANACRONIS"]),
    (ViolationKind::HistoricalImpossibility, &["IMPOSSIB"]),
    (ViolationKind::Contradiction, &["CONTRADICT", "CONTRADDI"]),
];

impl ViolationKind {
    /// Classify a violation line by keyword, case-insensitively.
    pub fn classify(text: &str) -> Self {
        let upper = text.to_uppercase();
        KIND_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| upper.contains(k)))
            .map(|(kind, _)| *kind)
            .unwrap_or(ViolationKind::Other)
    }

    /// Wire name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            ViolationKind::Anachronism => "anachronism",
            ViolationKind::HistoricalImpossibility => "historical-impossibility",
            ViolationKind::Contradiction => "contradiction",
            ViolationKind::Other => "other",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A recorded inconsistency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inconsistency {
    pub turn: usize,
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    pub description: String,
    /// Start of the offending fragment.
    pub story_chunk: String,
}

impl Inconsistency {
    /// Create an inconsistency, keeping a truncated snippet of the fragment.
    pub fn new(
        turn: usize,
        kind: ViolationKind,
        description: impl Into<String>,
        fragment: &str,
    ) -> Self {
        Self {
            turn,
            kind,
            description: description.into(),
            story_chunk: snippet(fragment),
        }
    }

    /// Object categories this inconsistency mentions.
    pub fn banned_objects(&self) -> Vec<BannedObject> {
        BannedObject::detect(&self.description)
    }
}

/// Character-safe truncation followed by an ellipsis marker.
fn snippet(fragment: &str) -> String {
    let head: String = fragment.chars().take(SNIPPET_CHARS).collect();
    format!("{head}...")
}

/// Categories of anachronistic objects that get banned once detected.
///
/// The vocabulary is a small fixed table tuned for pre-modern settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BannedObject {
    SpottingDevice,
    Firearm,
    Timepiece,
}

const OBJECT_KEYWORDS: &[(BannedObject, &[&str])] = &[
    (
        BannedObject::SpottingDevice,
        &["telescop", "cannocchial", "spyglass"],
    ),
    (
        BannedObject::Firearm,
        &["pistol", "firearm", "musket", "armi da fuoco"],
    ),
    (
        BannedObject::Timepiece,
        &["orologi", "wristwatch", "pocket watch", "clock"],
    ),
];

impl BannedObject {
    /// Every category whose vocabulary appears in `text`, in table order.
    pub fn detect(text: &str) -> Vec<BannedObject> {
        let lower = text.to_lowercase();
        OBJECT_KEYWORDS
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(object, _)| *object)
            .collect()
    }

    /// Human-readable label used in prohibition clauses.
    pub fn label(&self) -> &'static str {
        match self {
            BannedObject::SpottingDevice => "telescopes/spyglasses",
            BannedObject::Firearm => "pistols/firearms",
            BannedObject::Timepiece => "clocks/watches",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_order() {
        assert_eq!(
            ViolationKind::classify("ANACRONISMO: reference to a telescope"),
            ViolationKind::Anachronism
        );
        assert_eq!(
            ViolationKind::classify("Historical impossibility: a map of America"),
            ViolationKind::HistoricalImpossibility
        );
        assert_eq!(
            ViolationKind::classify("impossibilità storica: mongolfiera"),
            ViolationKind::HistoricalImpossibility
        );
        assert_eq!(
            ViolationKind::classify("Contradiction: Li Wei was dead in turn 2"),
            ViolationKind::Contradiction
        );
        assert_eq!(ViolationKind::classify("Something odd"), ViolationKind::Other);
    }

    #[test]
    fn test_classify_matches_word_forms() {
        assert_eq!(
            ViolationKind::classify("Anachronistic object: spyglass"),
            ViolationKind::Anachronism
        );
        assert_eq!(
            ViolationKind::classify("oggetto anacronistico: orologio"),
            ViolationKind::Anachronism
        );
        assert_eq!(
            ViolationKind::classify("Historically impossible: a printing press"),
            ViolationKind::HistoricalImpossibility
        );
        assert_eq!(
            ViolationKind::classify("This contradicts turn 2"),
            ViolationKind::Contradiction
        );
    }

    #[test]
    fn test_classify_prefers_anachronism() {
        // Both keywords present; anachronism is checked first.
        assert_eq!(
            ViolationKind::classify("Anachronism and contradiction: a pistol again"),
            ViolationKind::Anachronism
        );
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&ViolationKind::HistoricalImpossibility).unwrap();
        assert_eq!(json, "\"historical-impossibility\"");
    }

    #[test]
    fn test_snippet_truncates_on_chars() {
        let fragment = "è".repeat(200);
        let inconsistency = Inconsistency::new(1, ViolationKind::Other, "x", &fragment);
        assert_eq!(inconsistency.story_chunk.chars().count(), SNIPPET_CHARS + 3);
        assert!(inconsistency.story_chunk.ends_with("..."));
    }

    #[test]
    fn test_short_fragment_still_gets_marker() {
        let inconsistency = Inconsistency::new(0, ViolationKind::Other, "x", "Short.");
        assert_eq!(inconsistency.story_chunk, "Short....");
    }

    #[test]
    fn test_detect_banned_objects() {
        assert_eq!(
            BannedObject::detect("Lin Yao uses a TELESCOPE"),
            vec![BannedObject::SpottingDevice]
        );
        assert_eq!(
            BannedObject::detect("uso di armi da fuoco e orologio"),
            vec![BannedObject::Firearm, BannedObject::Timepiece]
        );
        assert!(BannedObject::detect("a bronze mirror").is_empty());
    }
}
