//! Runner settings read from the environment.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use story_core::llm::DEFAULT_MIN_INTERVAL;
use story_core::Strategy;

pub const DEFAULT_CONFIG_PATH: &str = "story_config.json";
pub const DEFAULT_STATE_PATH: &str = "story_state.json";
pub const DEFAULT_TURNS: usize = 10;

/// Everything the runner needs besides the API key.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub config_path: PathBuf,
    pub state_path: PathBuf,
    pub strategy: Strategy,
    pub turns: usize,
    pub model: Option<String>,
    pub min_interval: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let strategy = match lookup("STORY_STRATEGY") {
            Some(raw) => raw.parse::<Strategy>().context("STORY_STRATEGY")?,
            None => Strategy::Feedback,
        };
        let turns = match lookup("STORY_TURNS") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("STORY_TURNS must be a number, got '{raw}'"))?,
            None => DEFAULT_TURNS,
        };
        let min_interval = match lookup("STORY_MIN_INTERVAL_SECS") {
            Some(raw) => Duration::from_secs(raw.trim().parse::<u64>().with_context(|| {
                format!("STORY_MIN_INTERVAL_SECS must be a number, got '{raw}'")
            })?),
            None => DEFAULT_MIN_INTERVAL,
        };

        Ok(Self {
            config_path: lookup("STORY_CONFIG")
                .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
                .into(),
            state_path: lookup("STORY_STATE_PATH")
                .unwrap_or_else(|| DEFAULT_STATE_PATH.to_string())
                .into(),
            strategy,
            turns,
            model: lookup("GEMINI_MODEL"),
            min_interval,
        })
    }
}
