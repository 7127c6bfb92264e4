//! Dragons and the dragon targeting matrix
//!
//! Dragons are summoned by a player but are not owned by anyone for attack
//! purposes: every dragon present at a terrain attacks during the marching
//! player's Dragon Attack phase, and whether it prefers another dragon
//! over the army is decided by the element-compatibility matrix below.

use crate::core::{DragonTypeId, Element, EntityId, GameEntity, PlayerId, TerrainId};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type DragonId = EntityId<Dragon>;

/// Element composition classes the targeting matrix distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragonComposition {
    /// One element
    Elemental(Element),
    /// Two elements
    Hybrid(Element, Element),
    /// No element
    Ivory,
    /// Ivory plus one element
    IvoryHybrid(Element),
    /// All elements
    White,
}

impl DragonComposition {
    /// Elements for breath side-effect purposes
    pub fn element_set(&self) -> Vec<Element> {
        match self {
            DragonComposition::Elemental(e) => vec![*e],
            DragonComposition::Hybrid(a, b) => vec![*a, *b],
            DragonComposition::IvoryHybrid(e) => vec![*e],
            DragonComposition::Ivory => vec![],
            DragonComposition::White => vec![],
        }
    }

    fn shares_element(&self, other: &DragonComposition) -> bool {
        let mine = self.element_set();
        other.element_set().iter().any(|e| mine.contains(e))
    }

    fn same_elements(&self, other: &DragonComposition) -> bool {
        let mut a = self.element_set();
        let mut b = other.element_set();
        a.sort();
        b.sort();
        a == b
    }

    /// Whether a dragon of this composition must attack a present dragon
    /// of the other composition in preference to the army.
    ///
    /// Encodes the targeting matrix: Ivory and Ivory Hybrid dragons never
    /// attack other dragons; Elementals spare same-element kin; Hybrids
    /// spare exact twins and matching Ivory Hybrids; Whites attack
    /// everything elemental but never Ivory or each other.
    pub fn attacks_dragon(&self, target: &DragonComposition) -> bool {
        use DragonComposition::*;
        match (self, target) {
            (Ivory, _) | (IvoryHybrid(_), _) => false,
            (_, Ivory) => false,
            (Elemental(_), Elemental(_)) => !self.shares_element(target),
            (Elemental(_), Hybrid(_, _)) => true,
            (Elemental(_), IvoryHybrid(_)) => !self.shares_element(target),
            (Elemental(_), White) => true,
            (Hybrid(_, _), Elemental(_)) => true,
            (Hybrid(_, _), Hybrid(_, _)) => !self.same_elements(target),
            (Hybrid(_, _), IvoryHybrid(_)) => !self.shares_element(target),
            (Hybrid(_, _), White) => true,
            (White, Elemental(_)) => true,
            (White, Hybrid(_, _)) => true,
            (White, IvoryHybrid(_)) => true,
            (White, White) => false,
        }
    }

    /// Whether this dragon attacks the army when no dragon target exists.
    /// Every composition does; Ivory and Ivory Hybrid dragons only ever
    /// attack armies.
    pub fn attacks_army(&self) -> bool {
        true
    }

    /// White dragons have a ten-health pool; everything else five.
    pub fn health_pool(&self) -> u8 {
        match self {
            DragonComposition::White => 10,
            _ => 5,
        }
    }
}

impl fmt::Display for DragonComposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DragonComposition::Elemental(e) => write!(f, "{e} Elemental"),
            DragonComposition::Hybrid(a, b) => write!(f, "{a}/{b} Hybrid"),
            DragonComposition::Ivory => write!(f, "Ivory"),
            DragonComposition::IvoryHybrid(e) => write!(f, "Ivory/{e} Hybrid"),
            DragonComposition::White => write!(f, "White"),
        }
    }
}

/// Where a dragon currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragonLocation {
    Terrain(TerrainId),
    SummoningPool,
}

/// Faces of a dragon die
///
/// Breath and Tail chain when rolled against another dragon: the dragon is
/// rolled again and the new result added, terminating only on a
/// non-chaining face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragonFace {
    Jaws,
    Breath,
    ClawLeft,
    ClawRight,
    WingLeft,
    WingRight,
    BellyFront,
    BellyRear,
    Tail,
    Treasure,
}

impl DragonFace {
    /// Damage dealt to an army target (breath kills health-worth instead
    /// and is handled separately)
    pub fn army_damage(&self) -> u8 {
        match self {
            DragonFace::Jaws => 12,
            DragonFace::ClawLeft | DragonFace::ClawRight => 6,
            DragonFace::WingLeft | DragonFace::WingRight => 5,
            DragonFace::Tail => 3,
            _ => 0,
        }
    }

    /// Damage dealt to a dragon target
    pub fn dragon_damage(&self) -> u8 {
        match self {
            DragonFace::Jaws => 12,
            DragonFace::Breath => 5,
            DragonFace::ClawLeft | DragonFace::ClawRight => 6,
            DragonFace::WingLeft | DragonFace::WingRight => 5,
            DragonFace::Tail => 3,
            _ => 0,
        }
    }

    /// Whether this face forces a re-roll-and-add when the target is a
    /// dragon
    pub fn chains_against_dragon(&self) -> bool {
        matches!(self, DragonFace::Breath | DragonFace::Tail)
    }

    pub fn is_wing(&self) -> bool {
        matches!(self, DragonFace::WingLeft | DragonFace::WingRight)
    }

    pub fn is_belly(&self) -> bool {
        matches!(self, DragonFace::BellyFront | DragonFace::BellyRear)
    }
}

/// A dragon die on the table or in a Summoning Pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dragon {
    /// Unique ID for this dragon
    pub id: DragonId,

    /// Display name (e.g. "Red Fire Dragon")
    pub name: String,

    /// Reference-data id this dragon was built from
    pub dragon_type: DragonTypeId,

    /// The player who summoned it (owns its Summoning Pool slot, never the
    /// dragon's attacks)
    pub summoner: PlayerId,

    /// Element composition class
    pub composition: DragonComposition,

    /// Wounds marked this phase. A dragon dies at its health pool.
    pub wounds: u8,

    /// Current location
    pub location: DragonLocation,
}

impl Dragon {
    pub fn health_pool(&self) -> u8 {
        self.composition.health_pool()
    }

    pub fn is_dead(&self) -> bool {
        self.wounds >= self.health_pool()
    }

    /// Automatic save results a dragon applies against incoming damage,
    /// lost while its belly is showing.
    pub fn automatic_saves(&self, belly_showing: bool) -> u8 {
        if belly_showing {
            0
        } else {
            5
        }
    }
}

impl GameEntity<Dragon> for Dragon {
    fn id(&self) -> DragonId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}
