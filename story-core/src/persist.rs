//! Story persistence.
//!
//! A finished (or interrupted) session is saved as pretty JSON holding the
//! full narrative state plus a small metadata block that can be read
//! without loading the state.

use crate::memory::NarrativeState;
use crate::prompt::Strategy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current save file version.
const SAVE_VERSION: u32 = 1;

/// A saved story session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedStory {
    /// Save format version for compatibility checking.
    pub version: u32,

    /// RFC 3339 timestamp of the save.
    pub saved_at: String,

    pub session_id: Uuid,

    pub strategy: Strategy,

    pub state: NarrativeState,

    pub metadata: SaveMetadata,
}

/// Summary of a saved story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveMetadata {
    pub world_name: String,
    pub strategy: Strategy,
    pub turns_played: usize,
    pub fact_count: usize,
    pub item_count: usize,
    pub inconsistency_count: usize,
    /// Duplicated from the parent for peek access.
    #[serde(default)]
    pub saved_at: String,
}

impl SavedStory {
    /// Snapshot a state under a fresh session id.
    pub fn new(strategy: Strategy, state: NarrativeState) -> Self {
        Self::with_session_id(Uuid::new_v4(), strategy, state)
    }

    /// Snapshot a state under an existing session id.
    pub fn with_session_id(session_id: Uuid, strategy: Strategy, state: NarrativeState) -> Self {
        let saved_at = chrono::Utc::now().to_rfc3339();
        let metadata = SaveMetadata {
            world_name: state.world().name.clone(),
            strategy,
            turns_played: state.turn_count(),
            fact_count: state.facts().len(),
            item_count: state.items().len(),
            inconsistency_count: state.inconsistencies().len(),
            saved_at: saved_at.clone(),
        };

        Self {
            version: SAVE_VERSION,
            saved_at,
            session_id,
            strategy,
            state,
            metadata,
        }
    }

    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Load from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path).await?;
        let saved: Self = serde_json::from_str(&content)?;
        check_version(saved.version)?;
        Ok(saved)
    }

    /// Read only the metadata of a save file.
    pub async fn peek_metadata(path: impl AsRef<Path>) -> Result<SaveMetadata, PersistError> {
        let content = fs::read_to_string(path).await?;

        #[derive(Deserialize)]
        struct Partial {
            version: u32,
            metadata: SaveMetadata,
        }

        let partial: Partial = serde_json::from_str(&content)?;
        check_version(partial.version)?;
        Ok(partial.metadata)
    }
}

fn check_version(found: u32) -> Result<(), PersistError> {
    if found != SAVE_VERSION {
        return Err(PersistError::VersionMismatch {
            expected: SAVE_VERSION,
            found,
        });
    }
    Ok(())
}
