//! Testing utilities for story sessions.
//!
//! This module provides tools for offline testing:
//! - `ScriptedGenerator` for deterministic runs without API calls
//! - Sample world, cast and plot fixtures
//! - Assertion helpers for verifying narrative state

use crate::config::Plot;
use crate::llm::{GenerationError, GenerationRequest, TextGenerator};
use crate::memory::{Character, NarrativeState, ViolationKind, World};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A generator that returns scripted replies in order.
///
/// Story fragments and analysis replies share one queue, so a session turn
/// consumes two entries: the fragment, then its analysis. Once the queue is
/// empty every call fails with `EmptyResponse`. All requests are recorded.
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Script successful replies only.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(|t| Ok(t.into())).collect())
    }

    /// Add a reply to the end of the queue.
    pub fn push(&self, reply: Result<String, GenerationError>) {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(reply);
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Replies not yet consumed.
    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        request.validate()?;
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or(Err(GenerationError::EmptyResponse))
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// A small 14th-century world with two explicit rules.
pub fn sample_world() -> World {
    World::new("Five Elements", "Ming China, 1380")
        .with_description("Five monasteries each guard an elemental artifact.")
        .with_rule("No gunpowder weapons")
        .with_rule("Elemental magic requires meditation")
}

/// A monk, an apprentice and a thief.
pub fn sample_characters() -> Vec<Character> {
    vec![
        Character::new("Li Wei", "monk")
            .with_element("water")
            .with_trait("patient")
            .with_trait("stubborn")
            .with_goal("Recover the jade artifact"),
        Character::new("Lin Yao", "apprentice")
            .with_element("wood")
            .with_trait("curious")
            .with_goal("Prove herself to the abbot"),
        Character::new("Zhang Hao", "thief")
            .with_element("fire")
            .with_trait("cunning")
            .with_goal("Sell the artifact"),
    ]
}

pub fn sample_plot() -> Plot {
    Plot {
        inciting_incident: "The jade artifact is stolen from the water monastery".into(),
        complications: "Zhang Hao has allies among the palace guards".into(),
        climax: "A duel on the frozen lake".into(),
        resolution: "The artifact returns and Zhang Hao chooses exile".into(),
        theme: "Balance between duty and freedom".into(),
    }
}

/// Fresh state seeded with the sample plot's inciting incident.
pub fn sample_state() -> NarrativeState {
    NarrativeState::new(
        sample_world(),
        sample_characters(),
        [sample_plot().inciting_incident],
    )
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert that some fact description contains `needle`.
#[track_caller]
pub fn assert_has_fact(state: &NarrativeState, needle: &str) {
    assert!(
        state.facts().iter().any(|f| f.description.contains(needle)),
        "Expected a fact containing '{needle}'"
    );
}

/// Assert that an item with this exact name exists.
#[track_caller]
pub fn assert_has_item(state: &NarrativeState, name: &str) {
    assert!(
        state.find_item(name).is_some(),
        "Expected item '{name}' to exist"
    );
}

/// Assert the number of recorded inconsistencies of `kind`.
#[track_caller]
pub fn assert_inconsistency_count(state: &NarrativeState, kind: ViolationKind, expected: usize) {
    let actual = state
        .inconsistencies()
        .iter()
        .filter(|i| i.kind == kind)
        .count();
    assert_eq!(
        actual, expected,
        "Expected {expected} {kind} inconsistencies, got {actual}"
    );
}

/// Assert fact ids are exactly 1..=n.
#[track_caller]
pub fn assert_fact_ids_sequential(state: &NarrativeState) {
    for (index, fact) in state.facts().iter().enumerate() {
        assert_eq!(
            fact.id,
            index + 1,
            "Fact '{}' has id {} at position {}",
            fact.description,
            fact.id,
            index + 1
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_replies_in_order() {
        let generator = ScriptedGenerator::from_texts(["first", "second"]);
        let one = generator.generate(GenerationRequest::new("a", 0.7)).await;
        let two = generator.generate(GenerationRequest::new("b", 0.2)).await;
        let three = generator.generate(GenerationRequest::new("c", 0.2)).await;

        assert_eq!(one.unwrap(), "first");
        assert_eq!(two.unwrap(), "second");
        assert!(matches!(three, Err(GenerationError::EmptyResponse)));
        assert_eq!(generator.call_count(), 3);
        assert_eq!(generator.requests()[1].temperature, 0.2);
    }

    #[tokio::test]
    async fn test_push_extends_queue() {
        let generator = ScriptedGenerator::from_texts(Vec::<String>::new());
        generator.push(Ok("late".into()));
        assert_eq!(generator.remaining(), 1);
        let text = generator.generate(GenerationRequest::new("x", 0.5)).await;
        assert_eq!(text.unwrap(), "late");
    }

    #[test]
    fn test_sample_state() {
        let state = sample_state();
        assert_eq!(state.characters().len(), 3);
        assert_has_fact(&state, "jade artifact is stolen");
        assert_fact_ids_sequential(&state);
    }
}
