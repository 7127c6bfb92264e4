//! Game snapshot functionality for stop-and-resume play
//!
//! The full Zone Store + effect state exports as one opaque serializable
//! structure. The core defines no concrete encoding beyond "whatever
//! serde produces"; the persistence provider stores the blob as it
//! pleases. Round-tripping a snapshot reproduces a deeply equal state.

use crate::game::state::GameState;
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A snapshot of the whole game at a clean boundary (no transaction in
/// flight)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// The complete game state
    pub game_state: GameState,

    /// Turn number when this snapshot was created
    pub turn_number: u32,
}

impl GameSnapshot {
    /// Create a new snapshot from a game state
    pub fn new(game_state: GameState) -> Self {
        let turn_number = game_state.turn.turn_number;
        GameSnapshot {
            game_state,
            turn_number,
        }
    }

    /// Save this snapshot to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| EngineError::SerializationError(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a snapshot from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| EngineError::SerializationError(e.to_string()))
    }
}

impl GameState {
    /// Export the full engine state as an opaque blob
    pub fn export_state(&self) -> Result<String> {
        if self.tx.in_transaction() {
            return Err(EngineError::Protocol(
                "cannot export state while an action is in flight".to_string(),
            ));
        }
        serde_json::to_string(&GameSnapshot::new(self.clone()))
            .map_err(|e| EngineError::SerializationError(e.to_string()))
    }

    /// Restore the full engine state from an exported blob
    pub fn import_state(blob: &str) -> Result<GameState> {
        let snapshot: GameSnapshot =
            serde_json::from_str(blob).map_err(|e| EngineError::SerializationError(e.to_string()))?;
        Ok(snapshot.game_state)
    }
}
