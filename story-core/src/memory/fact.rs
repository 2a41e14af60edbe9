//! Facts and objects extracted from the narrative.

use serde::{Deserialize, Serialize};

/// An established story fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    /// 1-based position in the session's fact sequence.
    pub id: usize,
    pub description: String,
    /// Turn the fact was extracted from (0 for seed facts).
    pub turn_created: usize,
}

/// A significant object mentioned in the story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique key within the item collection.
    pub name: String,
    /// Current holder or location.
    pub location: String,
    pub status: String,
    pub discovered_turn: usize,
}
