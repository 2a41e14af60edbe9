//! StorySession - the turn loop.
//!
//! Each turn runs four stages:
//!
//! 1. **Pending**: build the prompt for the session's strategy.
//! 2. **Generated**: the port returned the next story fragment.
//! 3. **Extracted**: the extractor merged facts, objects and violations.
//! 4. **Appended**: the turn record joined the history.
//!
//! A generation failure ends the run. Extraction failures only skip the
//! merge for that turn.

use crate::config::Plot;
use crate::extract::StateExtractor;
use crate::llm::{GenerationError, GenerationRequest, TextGenerator};
use crate::memory::{MergeSummary, NarrativeState};
use crate::prompt::{build_prompt, PlotPhase, Strategy};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from the turn loop.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Story generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Session already played all {0} turns")]
    Finished(usize),

    #[error("No user inputs to play")]
    NoInputs,
}

/// Where a turn is in its pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStage {
    Pending,
    Generated,
    Extracted,
    Appended,
}

/// Settings for one run.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub strategy: Strategy,
    pub total_turns: usize,
    pub plot: Option<Plot>,
}

impl SessionConfig {
    pub fn new(strategy: Strategy, total_turns: usize) -> Self {
        Self {
            strategy,
            total_turns,
            plot: None,
        }
    }

    /// Steer the feedback strategy with a plot skeleton.
    pub fn with_plot(mut self, plot: Plot) -> Self {
        self.plot = Some(plot);
        self
    }
}

/// Outcome of a single turn.
#[derive(Debug, Clone)]
pub struct TurnReport {
    pub turn_index: usize,
    pub fragment: String,
    pub phase: PlotPhase,
    /// `None` when extraction failed for this turn.
    pub merge: Option<MergeSummary>,
}

/// A story being co-written, turn by turn.
pub struct StorySession {
    generator: Arc<dyn TextGenerator>,
    extractor: StateExtractor,
    config: SessionConfig,
    state: NarrativeState,
}

impl StorySession {
    /// Create a session; the same generator also serves extraction.
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        config: SessionConfig,
        state: NarrativeState,
    ) -> Self {
        Self {
            extractor: StateExtractor::new(generator.clone()),
            generator,
            config,
            state,
        }
    }

    /// Use a different generator for analysis calls.
    pub fn with_extractor(mut self, extractor: StateExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn state(&self) -> &NarrativeState {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Consume the session and return its state.
    pub fn into_state(self) -> NarrativeState {
        self.state
    }

    /// Turns completed so far.
    pub fn turns_played(&self) -> usize {
        self.state.turn_count()
    }

    pub fn is_finished(&self) -> bool {
        self.turns_played() >= self.config.total_turns
    }

    /// Play one turn with the given user input.
    pub async fn play_turn(&mut self, user_input: &str) -> Result<TurnReport, SessionError> {
        if self.is_finished() {
            return Err(SessionError::Finished(self.config.total_turns));
        }

        let turn_id = self.state.next_turn_id();
        let strategy = self.config.strategy;
        let phase = PlotPhase::from_progress(turn_id, self.config.total_turns);
        debug!(turn = turn_id, stage = ?TurnStage::Pending, %strategy, ?phase, "Turn started");

        let plan = build_prompt(
            &self.state,
            user_input,
            strategy,
            turn_id,
            self.config.total_turns,
            self.config.plot.as_ref(),
        );
        let mut request = GenerationRequest::new(plan.prompt, plan.temperature);
        if let Some(prefix) = plan.cached_prefix {
            request = request.with_cached_prefix(prefix);
        }

        let fragment = self.generator.generate(request).await?;
        debug!(
            turn = turn_id,
            stage = ?TurnStage::Generated,
            chars = fragment.len(),
            "Fragment generated"
        );

        let merge = self
            .extractor
            .extract_and_merge(&mut self.state, &fragment, turn_id)
            .await;
        debug!(
            turn = turn_id,
            stage = ?TurnStage::Extracted,
            merged = merge.is_some(),
            "Fragment analyzed"
        );

        self.state.append_turn(user_input, fragment.clone());
        debug!(turn = turn_id, stage = ?TurnStage::Appended, "Turn recorded");

        info!(
            turn = turn_id,
            %strategy,
            facts = self.state.facts().len(),
            inconsistencies = self.state.inconsistencies().len(),
            "Turn complete"
        );

        Ok(TurnReport {
            turn_index: turn_id,
            fragment,
            phase,
            merge,
        })
    }

    /// Play the remaining turns, cycling through `inputs` by turn index.
    pub async fn run(&mut self, inputs: &[String]) -> Result<Vec<TurnReport>, SessionError> {
        if inputs.is_empty() {
            return Err(SessionError::NoInputs);
        }

        info!(
            strategy = %self.config.strategy,
            total_turns = self.config.total_turns,
            "Story session started"
        );

        let mut reports = Vec::new();
        while !self.is_finished() {
            let turn = self.turns_played();
            let input = &inputs[turn % inputs.len()];
            reports.push(self.play_turn(input).await?);
        }

        info!(
            strategy = %self.config.strategy,
            facts = self.state.facts().len(),
            items = self.state.items().len(),
            inconsistencies = self.state.inconsistencies().len(),
            "Story session finished"
        );
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Character, World};
    use crate::testing::ScriptedGenerator;

    fn state() -> NarrativeState {
        NarrativeState::new(
            World::new("Five Elements", "China, 1380"),
            vec![Character::new("Li Wei", "monk")],
            ["The jade artifact was stolen"],
        )
    }

    #[tokio::test]
    async fn test_play_turn_appends_history() {
        let generator = Arc::new(ScriptedGenerator::from_texts([
            "Li Wei left the monastery at dawn.",
            "FACTS:\n- Li Wei leaves the monastery\nVIOLATIONS:\n- NONE",
        ]));
        let mut session = StorySession::new(
            generator.clone(),
            SessionConfig::new(Strategy::Baseline, 2),
            state(),
        );

        let report = session.play_turn("Li Wei sets out").await.unwrap();

        assert_eq!(report.turn_index, 0);
        assert_eq!(report.fragment, "Li Wei left the monastery at dawn.");
        assert_eq!(report.merge.unwrap().facts_added, 1);
        assert_eq!(session.state().history()[0].user, "Li Wei sets out");
        assert_eq!(session.state().facts()[1].turn_created, 0);
        assert_eq!(generator.call_count(), 2);
    }

    #[tokio::test]
    async fn test_generation_failure_is_fatal() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Err(GenerationError::Blocked {
            reason: "SAFETY".into(),
        })]));
        let mut session =
            StorySession::new(generator, SessionConfig::new(Strategy::Baseline, 2), state());

        let err = session.play_turn("go").await.unwrap_err();
        assert!(matches!(err, SessionError::Generation(GenerationError::Blocked { .. })));
        assert_eq!(session.turns_played(), 0);
    }

    #[tokio::test]
    async fn test_extraction_failure_still_appends() {
        let generator = Arc::new(ScriptedGenerator::from_texts(["The story goes on."]));
        let mut session =
            StorySession::new(generator, SessionConfig::new(Strategy::Baseline, 1), state());

        let report = session.play_turn("go").await.unwrap();
        assert!(report.merge.is_none());
        assert_eq!(session.turns_played(), 1);
        assert_eq!(session.state().facts().len(), 1);
    }

    #[tokio::test]
    async fn test_finished_session_rejects_turns() {
        let generator = Arc::new(ScriptedGenerator::from_texts(["One.", "FACTS:\n- x"]));
        let mut session =
            StorySession::new(generator, SessionConfig::new(Strategy::Baseline, 1), state());

        session.play_turn("go").await.unwrap();
        assert!(session.is_finished());
        assert!(matches!(
            session.play_turn("again").await,
            Err(SessionError::Finished(1))
        ));
    }

    #[tokio::test]
    async fn test_run_requires_inputs() {
        let generator = Arc::new(ScriptedGenerator::from_texts(Vec::<String>::new()));
        let mut session =
            StorySession::new(generator, SessionConfig::new(Strategy::Feedback, 3), state());
        assert!(matches!(session.run(&[]).await, Err(SessionError::NoInputs)));
    }

    #[tokio::test]
    async fn test_run_cycles_inputs() {
        let generator = Arc::new(ScriptedGenerator::from_texts([
            "One.", "FACTS:\n- a", "Two.", "FACTS:\n- b", "Three.", "FACTS:\n- c",
        ]));
        let mut session =
            StorySession::new(generator, SessionConfig::new(Strategy::Baseline, 3), state());

        let inputs = vec!["left".to_string(), "right".to_string()];
        let reports = session.run(&inputs).await.unwrap();

        assert_eq!(reports.len(), 3);
        let users: Vec<_> = session.state().history().iter().map(|t| t.user.as_str()).collect();
        assert_eq!(users, vec!["left", "right", "left"]);
    }
}
