//! State extraction.
//!
//! After every generated fragment the extractor asks the model for a
//! structured analysis (facts, objects, rule violations), parses it and
//! merges the result into the [`NarrativeState`]. Extraction is fail-open:
//! a failed call or an unreadable reply leaves the state untouched.

mod parser;

pub use parser::{
    parse_analysis, AnalysisReport, ItemProposal, Section, ViolationProposal,
    DEFAULT_ITEM_STATUS, UNKNOWN_LOCATION,
};

use crate::llm::{GenerationError, GenerationRequest, TextGenerator};
use crate::memory::{MergeSummary, NarrativeState};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Temperature for analysis calls.
pub const ANALYSIS_TEMPERATURE: f32 = 0.2;

/// Errors from a single extraction attempt.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Analysis request failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Analysis reply has no recognizable sections")]
    Unstructured,
}

/// Runs analysis prompts and merges the results into the state.
#[derive(Clone)]
pub struct StateExtractor {
    generator: Arc<dyn TextGenerator>,
}

impl StateExtractor {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Analyze `fragment` without touching any state.
    pub async fn analyze(
        &self,
        state: &NarrativeState,
        fragment: &str,
    ) -> Result<AnalysisReport, ExtractionError> {
        let prompt = build_analysis_prompt(state, fragment);
        let reply = self
            .generator
            .generate(GenerationRequest::new(prompt, ANALYSIS_TEMPERATURE))
            .await?;
        parse_analysis(&reply).ok_or(ExtractionError::Unstructured)
    }

    /// Analyze `fragment` and merge the findings under `turn_id`.
    ///
    /// Returns `None` when the analysis failed; the state is then unchanged.
    pub async fn extract_and_merge(
        &self,
        state: &mut NarrativeState,
        fragment: &str,
        turn_id: usize,
    ) -> Option<MergeSummary> {
        match self.analyze(state, fragment).await {
            Ok(report) => {
                let summary = state.merge_analysis(&report, fragment, turn_id);
                debug!(
                    turn = turn_id,
                    facts = summary.facts_added,
                    items = summary.items_added,
                    inconsistencies = summary.inconsistencies_added,
                    "Merged analysis"
                );
                Some(summary)
            }
            Err(e) => {
                warn!(turn = turn_id, error = %e, "Extraction failed, state unchanged");
                None
            }
        }
    }
}

/// Analysis prompt: setting, explicit rules, fragment, then the format.
pub fn build_analysis_prompt(state: &NarrativeState, fragment: &str) -> String {
    let world = state.world();
    let rules = if world.rules_explicit.is_empty() {
        "No explicit rules.".to_string()
    } else {
        world
            .rules_explicit
            .iter()
            .map(|r| format!("- {r}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let mut prompt = String::new();
    prompt.push_str(&format!(
        "Analyze this story fragment set in: {}\n\n",
        world.setting
    ));
    prompt.push_str(&format!("EXPLICIT WORLD RULES:\n{rules}\n\n"));
    prompt.push_str(&format!("Story to analyze:\n{fragment}\n\n"));
    prompt.push_str(include_str!("../prompts/analysis.txt"));
    prompt
}
