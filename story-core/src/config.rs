//! Story configuration loading.
//!
//! A story is described by a JSON file with a world, a cast and a plot
//! skeleton, plus an optional list of scripted user inputs.

use crate::memory::{Character, NarrativeState, World};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing required section '{0}'")]
    MissingSection(&'static str),
}

/// The world section as written in configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    pub name: String,
    pub setting: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rules: Vec<String>,
}

impl From<WorldConfig> for World {
    fn from(config: WorldConfig) -> Self {
        World {
            name: config.name,
            setting: config.setting,
            description: config.description,
            rules_explicit: config.rules,
            implicit_rules: Vec::new(),
        }
    }
}

/// Plot skeleton steering the story arc.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plot {
    pub inciting_incident: String,
    #[serde(default)]
    pub complications: String,
    #[serde(default)]
    pub climax: String,
    #[serde(default)]
    pub resolution: String,
    #[serde(default)]
    pub theme: String,
}

/// A validated story configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryConfig {
    pub world: WorldConfig,
    pub characters: Vec<Character>,
    pub plot: Plot,
    /// Scripted user inputs, cycled by turn.
    pub turn_inputs: Vec<String>,
}

#[derive(Deserialize)]
struct RawConfig {
    world: Option<WorldConfig>,
    characters: Option<Vec<Character>>,
    plot: Option<Plot>,
    #[serde(default)]
    turn_inputs: Vec<String>,
}

impl StoryConfig {
    /// Load a configuration file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_json(&content)
    }

    /// Parse a configuration from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(json)?;
        Ok(Self {
            world: raw.world.ok_or(ConfigError::MissingSection("world"))?,
            characters: raw
                .characters
                .ok_or(ConfigError::MissingSection("characters"))?,
            plot: raw.plot.ok_or(ConfigError::MissingSection("plot"))?,
            turn_inputs: raw.turn_inputs,
        })
    }

    /// Fresh narrative state seeded with the inciting incident as fact 1.
    pub fn initial_state(&self) -> NarrativeState {
        let seed = Some(self.plot.inciting_incident.clone()).filter(|s| !s.trim().is_empty());
        NarrativeState::new(self.world.clone().into(), self.characters.clone(), seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "world": {
            "name": "Five Elements",
            "setting": "China, 1380",
            "description": "Monasteries guard five artifacts",
            "rules": ["No gunpowder weapons"]
        },
        "characters": [
            {"name": "Li Wei", "role": "monk", "element": "water", "traits": ["patient"], "goals": ["Recover the artifact"]},
            {"name": "Zhao", "role": "thief", "status": "hiding"}
        ],
        "plot": {
            "inciting_incident": "The jade artifact is stolen",
            "complications": "Zhao has allies",
            "climax": "Duel on the lake",
            "resolution": "The artifact returns",
            "theme": "Balance"
        },
        "turn_inputs": ["Li Wei follows the trail", "Li Wei confronts Zhao"]
    }"#;

    #[test]
    fn test_parse_full_config() {
        let config = StoryConfig::from_json(CONFIG).unwrap();
        assert_eq!(config.world.rules, vec!["No gunpowder weapons"]);
        assert_eq!(config.characters.len(), 2);
        assert_eq!(config.characters[0].status, "alive");
        assert_eq!(config.characters[1].status, "hiding");
        assert_eq!(config.plot.theme, "Balance");
        assert_eq!(config.turn_inputs.len(), 2);
    }

    #[test]
    fn test_initial_state_is_seeded() {
        let state = StoryConfig::from_json(CONFIG).unwrap().initial_state();
        assert_eq!(state.world().rules_explicit, vec!["No gunpowder weapons"]);
        assert_eq!(state.facts().len(), 1);
        assert_eq!(state.facts()[0].id, 1);
        assert_eq!(state.facts()[0].description, "The jade artifact is stolen");
        assert_eq!(state.facts()[0].turn_created, 0);
        assert_eq!(state.turn_count(), 0);
    }

    #[test]
    fn test_missing_sections() {
        let err =
            StoryConfig::from_json(r#"{"characters": [], "plot": {"inciting_incident": "x"}}"#)
                .unwrap_err();
        assert!(matches!(err, ConfigError::MissingSection("world")));

        let err = StoryConfig::from_json(
            r#"{"world": {"name": "W", "setting": "S"}, "plot": {"inciting_incident": "x"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingSection("characters")));

        let err = StoryConfig::from_json(
            r#"{"world": {"name": "W", "setting": "S"}, "characters": []}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingSection("plot")));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            StoryConfig::from_json("not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
