//! Interactive story co-authoring engine with narrative memory.
//!
//! This crate provides:
//! - A text-generation port with a Gemini backend, rate limiting and retries
//! - A narrative state store (world, cast, objects, facts, inconsistencies)
//! - A state extractor that turns model analyses into state updates
//! - Prompt building for a feedback strategy (A) and a baseline (B)
//! - The turn loop, story persistence and run metrics
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use story_core::{GeminiGenerator, SessionConfig, StoryConfig, StorySession, Strategy};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StoryConfig::load("story_config.json").await?;
//!     let generator = Arc::new(GeminiGenerator::from_env()?);
//!
//!     let session_config = SessionConfig::new(Strategy::Feedback, 10)
//!         .with_plot(config.plot.clone());
//!     let mut session = StorySession::new(generator, session_config, config.initial_state());
//!
//!     session.run(&config.turn_inputs).await?;
//!     println!("{}", session.state().story_text());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod extract;
pub mod llm;
pub mod memory;
pub mod metrics;
pub mod persist;
pub mod prompt;
pub mod session;
pub mod testing;

// Primary public API
pub use config::{ConfigError, Plot, StoryConfig, WorldConfig};
pub use extract::{parse_analysis, AnalysisReport, ExtractionError, StateExtractor};
pub use llm::{
    GeminiGenerator, GenerationError, GenerationRequest, MinIntervalLimiter, RetryConfig,
    RetryingGenerator, TextGenerator,
};
pub use memory::{
    BannedObject, Character, Fact, Inconsistency, Item, MergeSummary, NarrativeState, TurnRecord,
    ViolationKind, World,
};
pub use metrics::{StoryMetrics, StrategyStats};
pub use persist::{PersistError, SaveMetadata, SavedStory};
pub use prompt::{build_prompt, PlotPhase, PromptPlan, Strategy};
pub use session::{SessionConfig, SessionError, StorySession, TurnReport, TurnStage};
pub use testing::ScriptedGenerator;
