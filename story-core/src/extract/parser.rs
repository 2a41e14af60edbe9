//! Parser for the extractor's sectioned analysis replies.
//!
//! The reply is plain text with three headed lists:
//!
//! ```text
//! FACTS:
//! - Li Wei finds the thief's trail
//! OBJECTS:
//! - Jade seal | thief | stolen
//! VIOLATIONS:
//! - ANACHRONISM: a spyglass in 1380
//! ```
//!
//! Parsing never touches the narrative state; it only produces an
//! [`AnalysisReport`].

use crate::memory::ViolationKind;

/// Status given to objects reported without one.
pub const DEFAULT_ITEM_STATUS: &str = "mentioned";

/// Location given to objects reported without one.
pub const UNKNOWN_LOCATION: &str = "unknown";

/// Which list the parser is currently reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Facts,
    Objects,
    Violations,
}

impl Section {
    /// Detect a section header on a non-bullet line.
    fn from_header(line: &str) -> Option<Self> {
        let upper = line.to_uppercase();
        if upper.contains("FACTS:") || upper.contains("FATTI:") {
            Some(Section::Facts)
        } else if upper.contains("OBJECTS:") || upper.contains("OGGETTI:") {
            Some(Section::Objects)
        } else if upper.contains("VIOLATIONS") || upper.contains("VIOLAZIONI") {
            Some(Section::Violations)
        } else {
            None
        }
    }
}

/// An object the analysis proposes adding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemProposal {
    pub name: String,
    pub location: String,
    pub status: String,
}

impl ItemProposal {
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            status: status.into(),
        }
    }

    /// Parse a `name | location | status` bullet; missing fields get defaults.
    fn parse(content: &str) -> Option<Self> {
        let fields: Vec<&str> = content.split('|').map(str::trim).collect();
        let name = fields.first().copied().unwrap_or_default();
        if name.is_empty() {
            return None;
        }
        let location = fields
            .get(1)
            .copied()
            .filter(|l| !l.is_empty())
            .unwrap_or(UNKNOWN_LOCATION);
        let status = fields
            .get(2)
            .copied()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_ITEM_STATUS);
        Some(Self::new(name, location, status))
    }
}

/// A violation the analysis reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationProposal {
    pub kind: ViolationKind,
    /// The full bullet text.
    pub description: String,
}

/// Everything parsed from one analysis reply, in reply order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisReport {
    pub facts: Vec<String>,
    pub items: Vec<ItemProposal>,
    pub violations: Vec<ViolationProposal>,
}

impl AnalysisReport {
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty() && self.items.is_empty() && self.violations.is_empty()
    }
}

/// Parse an analysis reply.
///
/// Returns `None` when the reply contains no section header at all.
pub fn parse_analysis(text: &str) -> Option<AnalysisReport> {
    let mut report = AnalysisReport::default();
    let mut section: Option<Section> = None;
    let mut saw_header = false;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let Some(content) = bullet_content(line) else {
            if let Some(next) = Section::from_header(line) {
                section = Some(next);
                saw_header = true;
            }
            continue;
        };
        if content.is_empty() || is_none_sentinel(content) {
            continue;
        }

        match section {
            Some(Section::Facts) => report.facts.push(content.to_string()),
            Some(Section::Objects) => {
                if let Some(item) = ItemProposal::parse(content) {
                    if !report.items.iter().any(|i| i.name == item.name) {
                        report.items.push(item);
                    }
                }
            }
            Some(Section::Violations) => report.violations.push(ViolationProposal {
                kind: ViolationKind::classify(content),
                description: content.to_string(),
            }),
            None => {}
        }
    }

    saw_header.then_some(report)
}

/// Text after a `-` or `•` bullet marker, if the line is a bullet.
fn bullet_content(line: &str) -> Option<&str> {
    line.strip_prefix('-')
        .or_else(|| line.strip_prefix('•'))
        .map(str::trim)
}

/// Leading markers of a bullet that reports an empty list.
const NONE_MARKERS: &[&str] = &[
    "NONE",
    "NESSUNA",
    "NESSUNO",
    "NO VIOLATIONS",
    "NO VIOLATION",
    "NO NEW",
];

/// Whether a bullet says "nothing here" instead of naming an entry.
///
/// Only the start of the bullet counts, so an entry that merely uses the
/// word "none" is kept.
fn is_none_sentinel(content: &str) -> bool {
    let normalized = content
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .to_uppercase();
    NONE_MARKERS.iter().any(|marker| {
        normalized
            .strip_prefix(marker)
            .is_some_and(|rest| rest.is_empty() || !rest.starts_with(char::is_alphanumeric))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_all_sections() {
        let reply = "\
FACTS:
- Li Wei finds the thief's trail
- The monastery bell rings at dawn

OBJECTS:
- Jade seal | thief | stolen
- Bronze mirror | Mei Lin

VIOLATIONS:
- ANACHRONISM: Lin Yao uses a spyglass
";
        let report = parse_analysis(reply).unwrap();

        assert_eq!(report.facts.len(), 2);
        assert_eq!(report.facts[0], "Li Wei finds the thief's trail");
        assert_eq!(report.items[0], ItemProposal::new("Jade seal", "thief", "stolen"));
        assert_eq!(
            report.items[1],
            ItemProposal::new("Bronze mirror", "Mei Lin", "mentioned")
        );
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].kind, ViolationKind::Anachronism);
        assert_eq!(
            report.violations[0].description,
            "ANACHRONISM: Lin Yao uses a spyglass"
        );
    }

    #[test]
    fn test_italian_headers_and_bullets() {
        let reply = "\
FATTI:
• Zhao tradisce il monastero
OGGETTI:
• Pergamena
VIOLAZIONI:
• ANACRONISMO: riferimento a un cannocchiale
";
        let report = parse_analysis(reply).unwrap();
        assert_eq!(report.facts, vec!["Zhao tradisce il monastero"]);
        assert_eq!(
            report.items,
            vec![ItemProposal::new("Pergamena", "unknown", "mentioned")]
        );
        assert_eq!(report.violations[0].kind, ViolationKind::Anachronism);
    }

    #[test]
    fn test_none_sentinel_is_skipped() {
        let reply = "FACTS:\n- A\nVIOLATIONS:\n- NONE\n- Nessuna violazione";
        let report = parse_analysis(reply).unwrap();
        assert!(report.violations.is_empty());
    }

    #[test]
    fn test_none_must_be_a_whole_word() {
        let reply = "VIOLATIONS:\n- CONTRADICTION: nonetheless the gate was open";
        let report = parse_analysis(reply).unwrap();
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].kind, ViolationKind::Contradiction);
    }

    #[test]
    fn test_violation_mentioning_none_is_kept() {
        let reply = "\
VIOLATIONS:
- CONTRADICTION: Li Wei said none of the monks survived, yet Mei Lin speaks in this scene
- ANACHRONISM: a pocket watch, none existed in 1380
";
        let report = parse_analysis(reply).unwrap();
        assert_eq!(report.violations.len(), 2);
        assert_eq!(report.violations[0].kind, ViolationKind::Contradiction);
        assert_eq!(report.violations[1].kind, ViolationKind::Anachronism);
    }

    #[test]
    fn test_no_violations_phrasing_is_skipped() {
        let reply = "VIOLATIONS:\n- No violations found.\n- None.\n- Nessuna.";
        let report = parse_analysis(reply).unwrap();
        assert!(report.violations.is_empty());
    }

    #[test]
    fn test_none_bullets_skipped_in_facts_and_objects() {
        let reply = "FACTS:\n- None\nOBJECTS:\n- NONE\n- Nonesuch lantern | Zhao";
        let report = parse_analysis(reply).unwrap();
        assert!(report.facts.is_empty());
        assert_eq!(
            report.items,
            vec![ItemProposal::new("Nonesuch lantern", "Zhao", "mentioned")]
        );
    }

    #[test]
    fn test_empty_bullets_ignored() {
        let reply = "FACTS:\n-\n- \n- Real fact";
        let report = parse_analysis(reply).unwrap();
        assert_eq!(report.facts, vec!["Real fact"]);
    }

    #[test]
    fn test_bullet_mentioning_header_word_stays_in_section() {
        let reply = "FACTS:\n- Zhao lists the objects: sword and seal";
        let report = parse_analysis(reply).unwrap();
        assert_eq!(report.facts.len(), 1);
        assert!(report.items.is_empty());
    }

    #[test]
    fn test_duplicate_items_in_one_reply() {
        let reply = "OBJECTS:\n- Scroll | Mei Lin | intact\n- Scroll | Zhao | burned";
        let report = parse_analysis(reply).unwrap();
        assert_eq!(report.items.len(), 1);
        assert_eq!(report.items[0].location, "Mei Lin");
    }

    #[test]
    fn test_bullets_before_any_header_ignored() {
        let reply = "- stray\nFACTS:\n- kept";
        let report = parse_analysis(reply).unwrap();
        assert_eq!(report.facts, vec!["kept"]);
    }

    #[test]
    fn test_unstructured_reply() {
        assert!(parse_analysis("I cannot analyze this text.").is_none());
        assert!(parse_analysis("").is_none());
    }

    #[test]
    fn test_unknown_violation_kind() {
        let reply = "VIOLATIONS:\n- The tone shifts oddly";
        let report = parse_analysis(reply).unwrap();
        assert_eq!(report.violations[0].kind, ViolationKind::Other);
    }
}
