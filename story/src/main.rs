//! Story runner.
//!
//! Loads a story configuration, plays a full session against Gemini with the
//! chosen strategy, saves the final state and prints the transcript and run
//! metrics. Configured through environment variables (a `.env` file is
//! honored):
//!
//! ```bash
//! GEMINI_API_KEY=... STORY_STRATEGY=B STORY_TURNS=6 cargo run -p story
//! ```

mod settings;

use anyhow::{Context, Result};
use settings::Settings;
use std::sync::Arc;
use std::time::Instant;
use story_core::{
    GeminiGenerator, RetryingGenerator, SavedStory, SessionConfig, StoryConfig, StoryMetrics,
    StorySession,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Used when the configuration has no scripted inputs.
const FALLBACK_INPUT: &str = "Continue the story.";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "story=info,story_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;
    let config = StoryConfig::load(&settings.config_path)
        .await
        .with_context(|| format!("loading {}", settings.config_path.display()))?;

    let mut client = gemini::Gemini::from_env().context("GEMINI_API_KEY must be set")?;
    if let Some(model) = &settings.model {
        client = client.with_model(model);
    }
    let gemini = GeminiGenerator::new(client).with_min_interval(settings.min_interval);
    let generator = Arc::new(RetryingGenerator::new(Arc::new(gemini)));

    let session_config =
        SessionConfig::new(settings.strategy, settings.turns).with_plot(config.plot.clone());
    let mut session = StorySession::new(generator, session_config, config.initial_state());

    let inputs = if config.turn_inputs.is_empty() {
        vec![FALLBACK_INPUT.to_string()]
    } else {
        config.turn_inputs.clone()
    };

    info!(
        world = %config.world.name,
        strategy = %settings.strategy,
        turns = settings.turns,
        "Starting story"
    );
    let started = Instant::now();
    session.run(&inputs).await?;
    let elapsed = started.elapsed();

    let state = session.into_state();
    let metrics = StoryMetrics::from_state(&state, settings.strategy, settings.turns, elapsed);

    SavedStory::new(settings.strategy, state.clone())
        .save_json(&settings.state_path)
        .await
        .with_context(|| format!("saving {}", settings.state_path.display()))?;
    info!(path = %settings.state_path.display(), "State saved");

    println!("{}", state.story_text());
    println!("{}", serde_json::to_string_pretty(&metrics)?);
    Ok(())
}
