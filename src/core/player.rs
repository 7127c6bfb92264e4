//! Player representation

use crate::core::{EntityId, GameEntity, PlayerName, TerrainId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub type PlayerId = EntityId<Player>;

/// Represents a player in the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Unique ID for this player
    pub id: PlayerId,

    /// Player name
    pub name: PlayerName,

    /// Terrains this player currently controls at the eighth face. The
    /// surrounding application watches this for the two-capture win.
    pub captured_terrains: SmallVec<[TerrainId; 2]>,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<PlayerName>) -> Self {
        Player {
            id,
            name: name.into(),
            captured_terrains: SmallVec::new(),
        }
    }

    pub fn capture(&mut self, terrain: TerrainId) {
        if !self.captured_terrains.contains(&terrain) {
            self.captured_terrains.push(terrain);
        }
    }

    pub fn release(&mut self, terrain: TerrainId) {
        self.captured_terrains.retain(|t| *t != terrain);
    }
}

impl GameEntity<Player> for Player {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}
