//! Narrative state store: the aggregate root for one story session.

use super::fact::{Fact, Item};
use super::inconsistency::{BannedObject, Inconsistency, ViolationKind};
use super::world::{Character, World};
use crate::extract::AnalysisReport;
use serde::{Deserialize, Serialize};

/// One completed turn: the user's input and the generated continuation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub user: String,
    pub assistant: String,
}

/// What a single merge added to the state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub facts_added: usize,
    pub items_added: usize,
    /// Proposed items dropped because the name was already known.
    pub items_skipped: usize,
    pub inconsistencies_added: usize,
}

impl MergeSummary {
    /// Whether the merge changed nothing.
    pub fn is_empty(&self) -> bool {
        self.facts_added == 0 && self.items_added == 0 && self.inconsistencies_added == 0
    }
}

/// The running narrative memory of a story session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeState {
    world: World,
    characters: Vec<Character>,
    #[serde(default)]
    items: Vec<Item>,
    #[serde(default)]
    facts: Vec<Fact>,
    #[serde(default)]
    history: Vec<TurnRecord>,
    #[serde(default)]
    inconsistencies: Vec<Inconsistency>,
}

impl NarrativeState {
    /// Create a state from a world, a cast and seed fact descriptions.
    ///
    /// Seed facts are numbered from 1 and stamped with turn 0.
    pub fn new<I, S>(world: World, characters: Vec<Character>, initial_facts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = Self {
            world,
            characters,
            items: Vec::new(),
            facts: Vec::new(),
            history: Vec::new(),
            inconsistencies: Vec::new(),
        };
        for description in initial_facts {
            state.record_fact(description, 0);
        }
        state
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    pub fn inconsistencies(&self) -> &[Inconsistency] {
        &self.inconsistencies
    }

    pub fn history(&self) -> &[TurnRecord] {
        &self.history
    }

    /// Number of completed turns.
    pub fn turn_count(&self) -> usize {
        self.history.len()
    }

    /// Id of the turn about to be appended.
    pub fn next_turn_id(&self) -> usize {
        self.history.len()
    }

    /// Find an item by exact name.
    pub fn find_item(&self, name: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.name == name)
    }

    /// The `n` most recent facts, oldest first.
    pub fn recent_facts(&self, n: usize) -> &[Fact] {
        tail(&self.facts, n)
    }

    /// The `n` most recent inconsistencies, oldest first.
    pub fn recent_inconsistencies(&self, n: usize) -> &[Inconsistency] {
        tail(&self.inconsistencies, n)
    }

    /// The `n` most recently deduced implicit rules, oldest first.
    pub fn recent_implicit_rules(&self, n: usize) -> &[String] {
        tail(&self.world.implicit_rules, n)
    }

    /// Object categories banned by every anachronism recorded so far.
    ///
    /// De-duplicated, in order of first detection.
    pub fn banned_objects(&self) -> Vec<BannedObject> {
        let mut banned = Vec::new();
        for inconsistency in &self.inconsistencies {
            if inconsistency.kind != ViolationKind::Anachronism {
                continue;
            }
            for object in inconsistency.banned_objects() {
                if !banned.contains(&object) {
                    banned.push(object);
                }
            }
        }
        banned
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Append a fact, assigning the next id.
    pub fn record_fact(&mut self, description: impl Into<String>, turn: usize) -> &Fact {
        let id = self.facts.len() + 1;
        self.facts.push(Fact {
            id,
            description: description.into(),
            turn_created: turn,
        });
        &self.facts[id - 1]
    }

    /// Record an item unless one with the same name exists.
    ///
    /// Returns `false` when the item was already known.
    pub fn record_item(
        &mut self,
        name: impl Into<String>,
        location: impl Into<String>,
        status: impl Into<String>,
        turn: usize,
    ) -> bool {
        let name = name.into();
        if self.find_item(&name).is_some() {
            return false;
        }
        self.items.push(Item {
            name,
            location: location.into(),
            status: status.into(),
            discovered_turn: turn,
        });
        true
    }

    /// Append an inconsistency found in `fragment`.
    pub fn record_inconsistency(
        &mut self,
        kind: ViolationKind,
        description: impl Into<String>,
        fragment: &str,
        turn: usize,
    ) {
        self.inconsistencies
            .push(Inconsistency::new(turn, kind, description, fragment));
    }

    /// Append a deduced world rule.
    pub fn add_implicit_rule(&mut self, rule: impl Into<String>) {
        self.world.implicit_rules.push(rule.into());
    }

    /// Append a completed turn to the history.
    pub fn append_turn(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.history.push(TurnRecord {
            user: user.into(),
            assistant: assistant.into(),
        });
    }

    /// Merge a parsed analysis of `fragment` into the state.
    ///
    /// Facts and violations are appended in parse order; items are added
    /// only when no item with the same name exists yet.
    pub fn merge_analysis(
        &mut self,
        report: &AnalysisReport,
        fragment: &str,
        turn: usize,
    ) -> MergeSummary {
        let mut summary = MergeSummary::default();

        for violation in &report.violations {
            self.record_inconsistency(violation.kind, &violation.description, fragment, turn);
            summary.inconsistencies_added += 1;
        }

        for description in &report.facts {
            self.record_fact(description, turn);
            summary.facts_added += 1;
        }

        for item in &report.items {
            if self.record_item(&item.name, &item.location, &item.status, turn) {
                summary.items_added += 1;
            } else {
                summary.items_skipped += 1;
            }
        }

        summary
    }

    /// Full story transcript, one block per turn.
    pub fn story_text(&self) -> String {
        self.history
            .iter()
            .enumerate()
            .map(|(i, turn)| format!("=== Turn {} ===\n{}\n", i + 1, turn.assistant))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn tail<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}
