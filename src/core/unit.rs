//! Unit instances
//!
//! A Unit is one physical die on the table. Many units share the same
//! unit-type definition from the reference data; this struct is the
//! per-instance game state.

use crate::core::{DieFace, Element, EntityId, GameEntity, PlayerId, SpeciesName, UnitTypeId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub type UnitId = EntityId<Unit>;

/// Represents a single unit die during gameplay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Unique ID for this unit instance
    pub id: UnitId,

    /// Display name (e.g. "Footman #3")
    pub name: String,

    /// Reference-data id this unit was built from
    pub unit_type: UnitTypeId,

    /// Owning player
    pub owner: PlayerId,

    /// Species (promotion matching is within-species)
    pub species: SpeciesName,

    /// Health, which is also the unit's size class for promotion
    pub max_health: u8,

    /// Damage marked during the current action. Transient: cleared at
    /// action end if not lethal.
    pub damage: u8,

    /// The faces this unit can roll
    pub faces: SmallVec<[DieFace; 10]>,

    /// Unconditional save results added after all modifiers (armored skin
    /// and the like)
    pub auto_saves: u8,

    /// Elements of the unit's species
    pub elements: SmallVec<[Element; 2]>,
}

impl Unit {
    pub fn mark_damage(&mut self, amount: u8) {
        self.damage = self.damage.saturating_add(amount);
    }

    pub fn clear_damage(&mut self) {
        self.damage = 0;
    }

    pub fn is_lethally_damaged(&self) -> bool {
        self.damage >= self.max_health
    }

    /// Whether one of this unit's faces could have produced `face`.
    ///
    /// Tally validation: a reported face that no die in the army carries
    /// is an inconsistent roll.
    pub fn can_roll(&self, face: &DieFace) -> bool {
        self.faces.contains(face)
    }
}

impl GameEntity<Unit> for Unit {
    fn id(&self) -> UnitId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}
