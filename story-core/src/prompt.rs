//! Prompt building for the two writing strategies.
//!
//! Strategy A (feedback) splits the prompt into a stable prefix (world, cast,
//! plot skeleton) and a per-turn body carrying recent facts, plot-phase
//! guidance and a learning block built from the session's own mistakes.
//! Strategy B (baseline) sends a single compact prompt with no feedback.

use crate::config::Plot;
use crate::memory::{Character, Fact, NarrativeState};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Facts shown in every prompt.
pub const RECENT_FACTS: usize = 10;
/// Implicit rules shown in the learning block.
pub const RECENT_IMPLICIT_RULES: usize = 5;
/// Past inconsistencies shown in the learning block.
pub const RECENT_INCONSISTENCIES: usize = 3;
/// Explicit rules shown in the compact world header.
pub const COMPACT_RULES: usize = 5;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const RESOLUTION_TEMPERATURE: f32 = 0.5;

pub const IMPLICIT_RULES_HEADER: &str = "IMPLICIT RULES (deduced from context, must be respected):";
pub const PAST_ERRORS_HEADER: &str = "CRITICAL ERRORS NEVER TO REPEAT:";
pub const BANNED_OBJECTS_HEADER: &str = "BANNED OBJECTS (anachronisms detected):";

/// How the next prompt is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Strategy {
    /// Feed past errors, implicit rules and plot guidance back to the model.
    #[serde(rename = "A")]
    Feedback,
    /// Plain continuation with a compact state summary.
    #[serde(rename = "B")]
    Baseline,
}

impl Strategy {
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Feedback => "A",
            Strategy::Baseline => "B",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error)]
#[error("Unknown strategy '{0}' (expected A, B, feedback or baseline)")]
pub struct UnknownStrategy(pub String);

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "a" | "feedback" => Ok(Strategy::Feedback),
            "b" | "baseline" => Ok(Strategy::Baseline),
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}

/// Where the story stands in its arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotPhase {
    Setup,
    RisingComplication,
    ClimaxApproach,
    Resolution,
}

impl PlotPhase {
    /// Phase for `turn_index` out of `total_turns`.
    pub fn from_progress(turn_index: usize, total_turns: usize) -> Self {
        let progress = if total_turns == 0 {
            0.0
        } else {
            turn_index as f64 / total_turns as f64
        };
        if progress < 0.3 {
            PlotPhase::Setup
        } else if progress < 0.6 {
            PlotPhase::RisingComplication
        } else if progress < 0.85 {
            PlotPhase::ClimaxApproach
        } else {
            PlotPhase::Resolution
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PlotPhase::Setup => "OPENING PHASE",
            PlotPhase::RisingComplication => "MIDDLE PHASE",
            PlotPhase::ClimaxApproach => "CLIMAX PHASE",
            PlotPhase::Resolution => "FINAL PHASE",
        }
    }

    fn guidance(&self) -> &'static str {
        match self {
            PlotPhase::Setup => "Introduce the conflicts and develop the situation.",
            PlotPhase::RisingComplication => {
                "Raise the tension, introduce obstacles and complications."
            }
            PlotPhase::ClimaxApproach => {
                "We are approaching the climax. Prepare the decisive confrontation."
            }
            PlotPhase::Resolution => "FINAL TURN - CONCLUDE THE STORY NOW!",
        }
    }

    /// The plot beat this phase steers towards.
    fn beat<'a>(&self, plot: &'a Plot) -> (&'static str, &'a str) {
        match self {
            PlotPhase::Setup => ("Inciting incident", plot.inciting_incident.as_str()),
            PlotPhase::RisingComplication => ("Complications", plot.complications.as_str()),
            PlotPhase::ClimaxApproach => ("Expected climax", plot.climax.as_str()),
            PlotPhase::Resolution => ("Final direction", plot.resolution.as_str()),
        }
    }

    pub fn temperature(&self) -> f32 {
        match self {
            PlotPhase::Resolution => RESOLUTION_TEMPERATURE,
            _ => DEFAULT_TEMPERATURE,
        }
    }
}

impl fmt::Display for PlotPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A ready-to-send prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptPlan {
    pub prompt: String,
    pub temperature: f32,
    pub cached_prefix: Option<String>,
}

/// Build the prompt for the next turn.
pub fn build_prompt(
    state: &NarrativeState,
    user_input: &str,
    strategy: Strategy,
    turn_index: usize,
    total_turns: usize,
    plot: Option<&Plot>,
) -> PromptPlan {
    match strategy {
        Strategy::Baseline => build_baseline(state, user_input),
        Strategy::Feedback => {
            let phase = PlotPhase::from_progress(turn_index, total_turns);
            build_feedback(state, user_input, phase, plot)
        }
    }
}

fn build_baseline(state: &NarrativeState, user_input: &str) -> PromptPlan {
    let mut prompt = String::new();
    prompt.push_str(include_str!("prompts/baseline.txt"));
    prompt.push_str("Current state:\n");
    prompt.push_str(&compact_state(state));
    prompt.push_str("\n\nUser input:\n");
    prompt.push_str(user_input);
    prompt.push('\n');

    PromptPlan {
        prompt,
        temperature: DEFAULT_TEMPERATURE,
        cached_prefix: None,
    }
}

fn build_feedback(
    state: &NarrativeState,
    user_input: &str,
    phase: PlotPhase,
    plot: Option<&Plot>,
) -> PromptPlan {
    let mut prompt = String::new();
    prompt.push_str(include_str!("prompts/feedback.txt"));

    prompt.push('\n');
    prompt.push_str(&phase_guidance(phase, plot));

    prompt.push_str("\nCurrent state:\nFacts:\n");
    prompt.push_str(&format_facts(state.recent_facts(RECENT_FACTS)));
    prompt.push_str(&format_item_names(state));
    prompt.push_str(&learning_block(state));

    prompt.push_str("\n\nUser input:\n");
    prompt.push_str(user_input);
    prompt.push('\n');

    PromptPlan {
        prompt,
        temperature: phase.temperature(),
        cached_prefix: Some(cacheable_context(state, plot)),
    }
}

/// The stable part of a feedback prompt: world, cast and plot skeleton.
///
/// Depends only on state that does not change during a run, so it is
/// identical across turns.
pub fn cacheable_context(state: &NarrativeState, plot: Option<&Plot>) -> String {
    let world = state.world();
    let mut context = String::new();

    context.push_str("# STORY CONTEXT (FIXED)\n\n");
    context.push_str(&format!("WORLD: {}\n", world.name));
    context.push_str(&format!("SETTING: {}\n", world.setting));
    context.push_str(&format!("DESCRIPTION: {}\n\n", world.description));

    context.push_str("WORLD RULES:\n");
    if world.rules_explicit.is_empty() {
        context.push_str("No explicit rules.\n");
    } else {
        for rule in &world.rules_explicit {
            context.push_str(&format!("- {rule}\n"));
        }
    }

    context.push_str("\nCHARACTERS:\n");
    for character in state.characters() {
        context.push_str(&full_character_line(character));
        context.push('\n');
    }

    if let Some(plot) = plot {
        context.push_str("\nPLOT STRUCTURE:\n");
        context.push_str(&format!("- Inciting incident: {}\n", plot.inciting_incident));
        context.push_str(&format!("- Complications: {}\n", plot.complications));
        context.push_str(&format!("- Climax: {}\n", plot.climax));
        context.push_str(&format!("- Resolution: {}\n", plot.resolution));
        context.push_str(&format!("- Theme: {}\n", plot.theme));
    }

    context
}

fn phase_guidance(phase: PlotPhase, plot: Option<&Plot>) -> String {
    let mut text = format!("\n{}: {}\n", phase.name(), phase.guidance());
    if phase == PlotPhase::Resolution {
        text.push_str(include_str!("prompts/conclusion.txt"));
    }
    if let Some(plot) = plot {
        let (label, beat) = phase.beat(plot);
        if !beat.is_empty() {
            text.push_str(&format!("{label}: {beat}\n"));
        }
    }
    text
}

fn learning_block(state: &NarrativeState) -> String {
    let mut text = String::new();

    let implicit_rules = state.recent_implicit_rules(RECENT_IMPLICIT_RULES);
    if !implicit_rules.is_empty() {
        text.push_str("\n\n");
        text.push_str(IMPLICIT_RULES_HEADER);
        text.push('\n');
        let lines: Vec<String> = implicit_rules.iter().map(|r| format!("- {r}")).collect();
        text.push_str(&lines.join("\n"));
    }

    let recent = state.recent_inconsistencies(RECENT_INCONSISTENCIES);
    if !recent.is_empty() {
        text.push_str("\n\n");
        text.push_str(PAST_ERRORS_HEADER);
        text.push('\n');
        for inconsistency in recent {
            text.push_str(&format!(
                "- Turn {} ({}): {}\n",
                inconsistency.turn, inconsistency.kind, inconsistency.description
            ));
        }
    }

    let banned = state.banned_objects();
    if !banned.is_empty() {
        let labels: Vec<&str> = banned.iter().map(|b| b.label()).collect();
        text.push_str(&format!("\n{} {}\n", BANNED_OBJECTS_HEADER, labels.join(", ")));
        text.push_str(
            "Do NOT mention these objects in ANY way (no use, no possession, no indirect mention).\n",
        );
    }

    text
}

/// World header, short roster, recent facts and item names.
fn compact_state(state: &NarrativeState) -> String {
    let world = state.world();
    let rules: Vec<&str> = world
        .rules_explicit
        .iter()
        .take(COMPACT_RULES)
        .map(String::as_str)
        .collect();

    let mut text = format!("World: {} ({})", world.name, world.setting);
    if !rules.is_empty() {
        text.push_str(&format!("\nRules: {}", rules.join(" | ")));
    }

    text.push_str("\n\nCharacters:\n");
    let roster: Vec<String> = state
        .characters()
        .iter()
        .map(compact_character_line)
        .collect();
    text.push_str(&roster.join("\n"));

    text.push_str("\n\nFacts:\n");
    text.push_str(&format_facts(state.recent_facts(RECENT_FACTS)));
    text.push_str(&format_item_names(state));
    text
}

fn compact_character_line(character: &Character) -> String {
    format!(
        "- {} ({}): {} [{}]",
        character.name, character.role, character.element, character.status
    )
}

fn full_character_line(character: &Character) -> String {
    format!(
        "- {} ({}, {}): {} | Goal: {} [{}]",
        character.name,
        character.role,
        character.element,
        character.traits.join(", "),
        character.primary_goal().unwrap_or("none"),
        character.status
    )
}

fn format_facts(facts: &[Fact]) -> String {
    if facts.is_empty() {
        return "No facts yet.".to_string();
    }
    facts
        .iter()
        .map(|f| format!("- T{}: {}", f.turn_created, f.description))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_item_names(state: &NarrativeState) -> String {
    if state.items().is_empty() {
        return String::new();
    }
    let names: Vec<&str> = state.items().iter().map(|i| i.name.as_str()).collect();
    format!("\nObjects: {}", names.join(", "))
}
