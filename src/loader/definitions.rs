//! Reference-data definitions
//!
//! The static catalogs the engine treats as read-only lookup tables:
//! unit types, terrains, dragons, and spells. Catalog files are JSON;
//! die faces are compact notation strings parsed at load time.

use crate::core::{
    DieFace, DragonComposition, DragonTypeId, EighthFaceKind, Element, Expiry, ModifierOp,
    ResultType, SpeciesName, SpellId, TerrainFaceIcon, TerrainTypeId, UnitTypeId,
};
use crate::loader::notation::parse_faces;
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// One unit type from the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct UnitDefinition {
    pub type_id: UnitTypeId,
    pub name: String,
    pub species: SpeciesName,
    pub health: u8,
    pub faces: Vec<DieFace>,
    pub auto_saves: u8,
    pub elements: Vec<Element>,
}

/// Raw catalog form of a unit, faces still in notation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawUnitDefinition {
    pub type_id: String,
    pub name: String,
    pub species: String,
    pub health: u8,
    pub faces: Vec<String>,
    #[serde(default)]
    pub auto_saves: u8,
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl TryFrom<RawUnitDefinition> for UnitDefinition {
    type Error = EngineError;

    fn try_from(raw: RawUnitDefinition) -> Result<Self> {
        if raw.health == 0 {
            return Err(EngineError::InvalidCatalogFormat(format!(
                "unit type '{}' has zero health",
                raw.type_id
            )));
        }
        Ok(UnitDefinition {
            type_id: UnitTypeId::new(raw.type_id),
            name: raw.name,
            species: SpeciesName::new(raw.species),
            health: raw.health,
            faces: parse_faces(&raw.faces)?,
            auto_saves: raw.auto_saves,
            elements: raw.elements,
        })
    }
}

/// One terrain from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainDefinition {
    pub type_id: TerrainTypeId,
    pub name: String,
    pub elements: Vec<Element>,
    /// Action icons for faces 1-7
    pub face_icons: Vec<TerrainFaceIcon>,
    pub eighth_face: EighthFaceKind,
}

impl TerrainDefinition {
    pub fn validate(&self) -> Result<()> {
        if self.face_icons.len() != 7 {
            return Err(EngineError::InvalidCatalogFormat(format!(
                "terrain '{}' must list exactly 7 face icons",
                self.type_id
            )));
        }
        Ok(())
    }
}

/// One dragon type from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragonDefinition {
    pub type_id: DragonTypeId,
    pub name: String,
    pub composition: DragonComposition,
}

/// What a spell does when cast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpellEffectDef {
    /// Deal health-worth of damage to the target
    Damage { amount: u8 },
    /// Register a roll modifier on the target
    Modifier {
        op: ModifierOp,
        result: ResultType,
        magnitude: u32,
        expiry: Expiry,
    },
    /// Killed units in the target army go to Reserve instead of the DUA
    KillToReserve { expiry: Expiry },
}

/// One spell from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellDefinition {
    pub id: SpellId,
    pub name: String,
    pub cost: u8,
    pub element: Element,
    pub effect: SpellEffectDef,
    /// The effect explicitly forbids a save roll
    #[serde(default)]
    pub no_save: bool,
}
