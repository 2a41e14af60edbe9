//! World and cast definitions.

use serde::{Deserialize, Serialize};

/// Status assigned to a character when the configuration omits one.
pub const DEFAULT_CHARACTER_STATUS: &str = "alive";

fn default_status() -> String {
    DEFAULT_CHARACTER_STATUS.to_string()
}

/// The story world: setting, description and rules.
///
/// Only `implicit_rules` grows during a session; everything else is fixed at
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub name: String,
    pub setting: String,
    #[serde(default)]
    pub description: String,
    /// Rules given up front by the configuration.
    #[serde(default)]
    pub rules_explicit: Vec<String>,
    /// Rules deduced during play, oldest first.
    #[serde(default)]
    pub implicit_rules: Vec<String>,
}

impl World {
    /// Create a world with a name and a setting.
    pub fn new(name: impl Into<String>, setting: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            setting: setting.into(),
            description: String::new(),
            rules_explicit: Vec::new(),
            implicit_rules: Vec::new(),
        }
    }

    /// Set the free-text description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add an explicit rule.
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rules_explicit.push(rule.into());
        self
    }
}

/// A member of the cast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    #[serde(default)]
    pub role: String,
    /// Thematic element tied to the character.
    #[serde(default)]
    pub element: String,
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default = "default_status")]
    pub status: String,
}

impl Character {
    /// Create a living character with a name and a role.
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            element: String::new(),
            traits: Vec::new(),
            goals: Vec::new(),
            status: default_status(),
        }
    }

    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = element.into();
        self
    }

    pub fn with_trait(mut self, character_trait: impl Into<String>) -> Self {
        self.traits.push(character_trait.into());
        self
    }

    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goals.push(goal.into());
        self
    }

    /// The character's main goal, if any.
    pub fn primary_goal(&self) -> Option<&str> {
        self.goals.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_character_status_defaults_to_alive() {
        let character: Character =
            serde_json::from_str(r#"{"name": "Li Wei", "role": "monk"}"#).unwrap();
        assert_eq!(character.status, "alive");
        assert!(character.traits.is_empty());
    }

    #[test]
    fn test_character_keeps_given_status() {
        let character: Character =
            serde_json::from_str(r#"{"name": "Zhao", "status": "wounded"}"#).unwrap();
        assert_eq!(character.status, "wounded");
        assert_eq!(character.role, "");
    }

    #[test]
    fn test_world_builder() {
        let world = World::new("Five Elements", "China, 1380")
            .with_description("A land of monasteries")
            .with_rule("No gunpowder weapons");

        assert_eq!(world.rules_explicit, vec!["No gunpowder weapons"]);
        assert!(world.implicit_rules.is_empty());
    }
}
