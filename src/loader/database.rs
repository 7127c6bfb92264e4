//! Reference data database
//!
//! Read-only lookups for unit/terrain/dragon/spell definitions, fully
//! populated before any resolver call. A missing id is a fatal
//! UnknownDefinition error, never silently defaulted.

use crate::core::{
    Dragon, DragonId, DragonLocation, DragonTypeId, PlayerId, SpellId, Terrain, TerrainId,
    TerrainTypeId, Unit, UnitId, UnitTypeId,
};
use crate::game::GameState;
use crate::loader::definitions::{
    DragonDefinition, RawUnitDefinition, SpellDefinition, TerrainDefinition, UnitDefinition,
};
use crate::zones::Zone;
use crate::{EngineError, Result};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// All static catalogs, indexed by id
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    units: HashMap<UnitTypeId, Arc<UnitDefinition>>,
    terrains: HashMap<TerrainTypeId, Arc<TerrainDefinition>>,
    dragons: HashMap<DragonTypeId, Arc<DragonDefinition>>,
    spells: HashMap<SpellId, Arc<SpellDefinition>>,
}

impl ReferenceData {
    /// An empty catalog set (tests and incremental setup)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load all catalogs from a directory containing `units.json`,
    /// `terrains.json`, `dragons.json`, and `spells.json`.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut data = ReferenceData::empty();
        data.load_units(&std::fs::read_to_string(dir.join("units.json"))?)?;
        data.load_terrains(&std::fs::read_to_string(dir.join("terrains.json"))?)?;
        data.load_dragons(&std::fs::read_to_string(dir.join("dragons.json"))?)?;
        data.load_spells(&std::fs::read_to_string(dir.join("spells.json"))?)?;
        Ok(data)
    }

    pub fn load_units(&mut self, json: &str) -> Result<()> {
        let raw: Vec<RawUnitDefinition> =
            serde_json::from_str(json).map_err(|e| EngineError::InvalidCatalogFormat(e.to_string()))?;
        for entry in raw {
            let def = UnitDefinition::try_from(entry)?;
            self.units.insert(def.type_id.clone(), Arc::new(def));
        }
        Ok(())
    }

    pub fn load_terrains(&mut self, json: &str) -> Result<()> {
        let defs: Vec<TerrainDefinition> =
            serde_json::from_str(json).map_err(|e| EngineError::InvalidCatalogFormat(e.to_string()))?;
        for def in defs {
            def.validate()?;
            self.terrains.insert(def.type_id.clone(), Arc::new(def));
        }
        Ok(())
    }

    pub fn load_dragons(&mut self, json: &str) -> Result<()> {
        let defs: Vec<DragonDefinition> =
            serde_json::from_str(json).map_err(|e| EngineError::InvalidCatalogFormat(e.to_string()))?;
        for def in defs {
            self.dragons.insert(def.type_id.clone(), Arc::new(def));
        }
        Ok(())
    }

    pub fn load_spells(&mut self, json: &str) -> Result<()> {
        let defs: Vec<SpellDefinition> =
            serde_json::from_str(json).map_err(|e| EngineError::InvalidCatalogFormat(e.to_string()))?;
        for def in defs {
            self.spells.insert(def.id.clone(), Arc::new(def));
        }
        Ok(())
    }

    // ---- lookups (a miss is fatal) ------------------------------------

    pub fn unit_definition(&self, id: &UnitTypeId) -> Result<&UnitDefinition> {
        self.units
            .get(id)
            .map(|d| d.as_ref())
            .ok_or_else(|| EngineError::UnknownDefinition(format!("unit type '{id}'")))
    }

    pub fn terrain_definition(&self, id: &TerrainTypeId) -> Result<&TerrainDefinition> {
        self.terrains
            .get(id)
            .map(|d| d.as_ref())
            .ok_or_else(|| EngineError::UnknownDefinition(format!("terrain '{id}'")))
    }

    pub fn dragon_definition(&self, id: &DragonTypeId) -> Result<&DragonDefinition> {
        self.dragons
            .get(id)
            .map(|d| d.as_ref())
            .ok_or_else(|| EngineError::UnknownDefinition(format!("dragon '{id}'")))
    }

    pub fn spell_definition(&self, id: &SpellId) -> Result<&SpellDefinition> {
        self.spells
            .get(id)
            .map(|d| d.as_ref())
            .ok_or_else(|| EngineError::UnknownDefinition(format!("spell '{id}'")))
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn terrain_count(&self) -> usize {
        self.terrains.len()
    }

    pub fn dragon_count(&self) -> usize {
        self.dragons.len()
    }

    pub fn spell_count(&self) -> usize {
        self.spells.len()
    }

    // ---- instantiation (setup collaborator) ---------------------------

    /// Create a unit instance from its definition and place it in a zone
    pub fn create_unit(
        &self,
        game: &mut GameState,
        type_id: &UnitTypeId,
        owner: PlayerId,
        name: impl Into<String>,
        zone: Zone,
    ) -> Result<UnitId> {
        let def = self.unit_definition(type_id)?;
        let id = game.zones.next_unit_id();
        let unit = Unit {
            id,
            name: name.into(),
            unit_type: def.type_id.clone(),
            owner,
            species: def.species.clone(),
            max_health: def.health,
            damage: 0,
            faces: SmallVec::from_vec(def.faces.clone()),
            auto_saves: def.auto_saves,
            elements: SmallVec::from_vec(def.elements.clone()),
        };
        game.zones.spawn_unit(unit, zone)
    }

    /// Create a terrain die from its definition
    pub fn create_terrain(
        &self,
        game: &mut GameState,
        type_id: &TerrainTypeId,
        starting_face: u8,
    ) -> Result<TerrainId> {
        if !(1..=8).contains(&starting_face) {
            return Err(EngineError::Validation(format!(
                "terrain face {starting_face} is out of range"
            )));
        }
        let def = self.terrain_definition(type_id)?;
        let id = game.terrains.next_id();
        game.terrains.insert(
            id,
            Terrain {
                id,
                name: def.name.clone(),
                terrain_type: def.type_id.clone(),
                face: starting_face,
                controller: None,
                elements: SmallVec::from_vec(def.elements.clone()),
                face_icons: SmallVec::from_vec(def.face_icons.clone()),
                eighth_face: def.eighth_face,
            },
        );
        Ok(id)
    }

    /// Create a dragon from its definition, starting in its summoner's
    /// pool or at a terrain
    pub fn create_dragon(
        &self,
        game: &mut GameState,
        type_id: &DragonTypeId,
        summoner: PlayerId,
        location: DragonLocation,
    ) -> Result<DragonId> {
        let def = self.dragon_definition(type_id)?;
        let id = game.dragons.next_id();
        game.dragons.insert(
            id,
            Dragon {
                id,
                name: def.name.clone(),
                dragon_type: def.type_id.clone(),
                summoner,
                composition: def.composition,
                wounds: 0,
                location,
            },
        );
        Ok(id)
    }
}
