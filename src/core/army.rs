//! Armies: the per-location groupings of units

use crate::core::{EntityId, GameEntity, PlayerId, TerrainId, UnitId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub type ArmyId = EntityId<Army>;

/// Where an army currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArmyLocation {
    /// At a terrain, possibly contesting it
    Terrain(TerrainId),
    /// In the owner's Reserve Area
    Reserve,
}

/// An army is an ordered set of unit references at one location
///
/// An army with zero units is considered dissolved, but that check is only
/// applied at the end of an action (exchange semantics keep effects alive
/// through mid-action churn).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Army {
    /// Unique ID for this army
    pub id: ArmyId,

    /// Display name (e.g. "Home Army")
    pub name: String,

    /// Owning player
    pub owner: PlayerId,

    /// Current location
    pub location: ArmyLocation,

    /// Units in roll order
    pub units: SmallVec<[UnitId; 8]>,

    /// Whether this army has taken its action this turn (one action per
    /// march, and the same army may not act twice while another eligible
    /// army has not acted)
    pub acted_this_turn: bool,
}

impl Army {
    pub fn new(id: ArmyId, name: impl Into<String>, owner: PlayerId, location: ArmyLocation) -> Self {
        Army {
            id,
            name: name.into(),
            owner,
            location,
            units: SmallVec::new(),
            acted_this_turn: false,
        }
    }

    pub fn terrain(&self) -> Option<TerrainId> {
        match self.location {
            ArmyLocation::Terrain(t) => Some(t),
            ArmyLocation::Reserve => None,
        }
    }

    pub fn contains(&self, unit: UnitId) -> bool {
        self.units.contains(&unit)
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }
}

impl GameEntity<Army> for Army {
    fn id(&self) -> ArmyId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_army_location() {
        let terrain = TerrainId::new(3);
        let army = Army::new(
            ArmyId::new(1),
            "Home Army",
            PlayerId::new(0),
            ArmyLocation::Terrain(terrain),
        );
        assert_eq!(army.terrain(), Some(terrain));
        assert!(army.is_empty());

        let reserve = Army::new(ArmyId::new(2), "Reserves", PlayerId::new(0), ArmyLocation::Reserve);
        assert_eq!(reserve.terrain(), None);
    }
}
