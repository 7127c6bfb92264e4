//! Game zones (armies at terrains, Reserve, DUA, BUA, Summoning Pool)
//!
//! The Zone Store owns every unit record and a single owning-zone tag per
//! record. A unit reference exists in precisely one zone at a time; all
//! mutation goes through the primitives here, which keep the tag, the
//! per-player area lists, and the army unit lists coherent atomically and
//! record an inverse entry in the transaction log. No business rules live
//! here - pure data custody.

use crate::core::{Army, ArmyId, ArmyLocation, EntityStore, PlayerId, TerrainId, Unit, UnitId};
use crate::events::GameEvent;
use crate::undo::{StoreAction, TransactionLog};
use crate::{EngineError, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// The zones a unit can occupy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    /// Inside an army (at a terrain or in reserve formation)
    Army(ArmyId),
    /// The owner's Reserve Area
    Reserve,
    /// Dead Unit Area
    Dua,
    /// Buried Unit Area
    Bua,
    /// Summoning Pool (Dragonkin and the like)
    SummoningPool,
}

/// One player's fixed unit areas (order matters for deterministic replay,
/// so removal keeps list order)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerAreas {
    pub owner: PlayerId,
    pub reserve: Vec<UnitId>,
    pub dua: Vec<UnitId>,
    pub bua: Vec<UnitId>,
    pub summoning_pool: Vec<UnitId>,
}

impl PlayerAreas {
    pub fn new(owner: PlayerId) -> Self {
        PlayerAreas {
            owner,
            reserve: Vec::new(),
            dua: Vec::new(),
            bua: Vec::new(),
            summoning_pool: Vec::new(),
        }
    }

    fn list(&self, zone: Zone) -> Option<&Vec<UnitId>> {
        match zone {
            Zone::Reserve => Some(&self.reserve),
            Zone::Dua => Some(&self.dua),
            Zone::Bua => Some(&self.bua),
            Zone::SummoningPool => Some(&self.summoning_pool),
            Zone::Army(_) => None,
        }
    }

    fn list_mut(&mut self, zone: Zone) -> Option<&mut Vec<UnitId>> {
        match zone {
            Zone::Reserve => Some(&mut self.reserve),
            Zone::Dua => Some(&mut self.dua),
            Zone::Bua => Some(&mut self.bua),
            Zone::SummoningPool => Some(&mut self.summoning_pool),
            Zone::Army(_) => None,
        }
    }
}

/// Central custody of units, armies, and zone membership
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneStore {
    /// Arena of all unit records
    pub units: EntityStore<Unit>,

    /// All armies
    pub armies: EntityStore<Army>,

    /// Fixed areas per player (Vec for stable ordering, small count)
    pub player_areas: Vec<PlayerAreas>,

    /// The owning-zone tag: exactly one entry per unit
    zone_tags: FxHashMap<UnitId, Zone>,
}

impl ZoneStore {
    pub fn new(players: &[PlayerId]) -> Self {
        ZoneStore {
            units: EntityStore::new(),
            armies: EntityStore::new(),
            player_areas: players.iter().map(|p| PlayerAreas::new(*p)).collect(),
            zone_tags: FxHashMap::default(),
        }
    }

    // ---- queries ------------------------------------------------------

    /// The zone a unit currently occupies
    pub fn zone_of(&self, unit: UnitId) -> Result<Zone> {
        self.zone_tags
            .get(&unit)
            .copied()
            .ok_or(EngineError::EntityNotFound(unit.as_u32()))
    }

    pub fn areas(&self, player: PlayerId) -> Result<&PlayerAreas> {
        self.player_areas
            .iter()
            .find(|a| a.owner == player)
            .ok_or(EngineError::EntityNotFound(player.as_u32()))
    }

    fn areas_mut(&mut self, player: PlayerId) -> Result<&mut PlayerAreas> {
        self.player_areas
            .iter_mut()
            .find(|a| a.owner == player)
            .ok_or(EngineError::EntityNotFound(player.as_u32()))
    }

    /// All armies of one player, in id order
    pub fn armies_of(&self, player: PlayerId) -> Vec<ArmyId> {
        self.armies
            .ids()
            .into_iter()
            .filter(|id| self.armies.get(*id).map(|a| a.owner == player).unwrap_or(false))
            .collect()
    }

    /// All armies standing at a terrain, in id order
    pub fn armies_at_terrain(&self, terrain: TerrainId) -> Vec<ArmyId> {
        self.armies
            .ids()
            .into_iter()
            .filter(|id| {
                self.armies
                    .get(*id)
                    .map(|a| a.location == ArmyLocation::Terrain(terrain))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// DUA units of one player and species with the given health
    pub fn dua_matches(&self, player: PlayerId, species: &crate::core::SpeciesName, health: u8) -> Vec<UnitId> {
        self.area_matches(player, Zone::Dua, species, health)
    }

    /// Summoning Pool units of one player and species with the given health
    pub fn pool_matches(&self, player: PlayerId, species: &crate::core::SpeciesName, health: u8) -> Vec<UnitId> {
        self.area_matches(player, Zone::SummoningPool, species, health)
    }

    fn area_matches(
        &self,
        player: PlayerId,
        zone: Zone,
        species: &crate::core::SpeciesName,
        health: u8,
    ) -> Vec<UnitId> {
        let Ok(areas) = self.areas(player) else {
            return Vec::new();
        };
        areas
            .list(zone)
            .map(|list| {
                list.iter()
                    .copied()
                    .filter(|u| {
                        self.units
                            .get(*u)
                            .map(|unit| unit.species == *species && unit.max_health == health)
                            .unwrap_or(false)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    // ---- setup --------------------------------------------------------

    /// Create an army (setup and reserve formation)
    pub fn create_army(&mut self, name: impl Into<String>, owner: PlayerId, location: ArmyLocation) -> ArmyId {
        let id = self.armies.next_id();
        self.armies.insert(id, Army::new(id, name, owner, location));
        id
    }

    /// Introduce a unit record into a zone (setup only; not transactional)
    pub fn spawn_unit(&mut self, unit: Unit, zone: Zone) -> Result<UnitId> {
        let id = unit.id;
        let owner = unit.owner;
        self.units.insert(id, unit);
        match zone {
            Zone::Army(army) => self.armies.get_mut(army)?.units.push(id),
            _ => self
                .areas_mut(owner)?
                .list_mut(zone)
                .expect("fixed zone")
                .push(id),
        }
        self.zone_tags.insert(id, zone);
        Ok(id)
    }

    /// Allocate a fresh unit id
    pub fn next_unit_id(&mut self) -> UnitId {
        self.units.next_id()
    }

    // ---- primitives ---------------------------------------------------

    /// Move a unit to a new zone, preserving the one-zone invariant.
    ///
    /// This is the single mutation path every other primitive builds on.
    pub fn move_unit(&mut self, tx: &mut TransactionLog, unit: UnitId, to: Zone) -> Result<()> {
        let from = self.zone_of(unit)?;
        if from == to {
            return Ok(());
        }
        self.detach(unit, from)?;
        self.attach(unit, to)?;
        self.zone_tags.insert(unit, to);
        tx.log(StoreAction::MoveUnit { unit, from, to });
        Ok(())
    }

    /// Kill a unit out of an army. The destination is the owner's DUA
    /// unless an active effect redirects it (the caller queries the
    /// Effect Duration Manager and passes the redirect).
    pub fn kill(&mut self, tx: &mut TransactionLog, unit: UnitId, redirect: Option<Zone>) -> Result<()> {
        let from = self.zone_of(unit)?;
        let Zone::Army(army) = from else {
            return Err(EngineError::Validation(format!(
                "unit {unit} is not in an army and cannot be killed"
            )));
        };
        let to = redirect.unwrap_or(Zone::Dua);
        self.set_unit_damage(tx, unit, 0)?;
        self.move_unit(tx, unit, to)?;
        tx.queue_event(GameEvent::UnitKilled { unit, army });
        Ok(())
    }

    /// Bury a dead unit: DUA to BUA only
    pub fn bury(&mut self, tx: &mut TransactionLog, unit: UnitId) -> Result<()> {
        let from = self.zone_of(unit)?;
        if from != Zone::Dua {
            return Err(EngineError::Validation(format!(
                "unit {unit} is not in the DUA and cannot be buried"
            )));
        }
        self.move_unit(tx, unit, Zone::Bua)?;
        tx.queue_event(GameEvent::UnitBuried { unit });
        Ok(())
    }

    /// Exchange an army unit for a one-size-larger replacement from the
    /// DUA or Summoning Pool. The retired unit takes the replacement's
    /// old slot, so the trade is a swap, not a net gain.
    pub fn promote(&mut self, tx: &mut TransactionLog, retired: UnitId, replacement: UnitId) -> Result<()> {
        let army_zone = self.zone_of(retired)?;
        let Zone::Army(army) = army_zone else {
            return Err(EngineError::Validation(format!(
                "unit {retired} is not in an army and cannot be promoted"
            )));
        };
        let source_zone = self.zone_of(replacement)?;
        if !matches!(source_zone, Zone::Dua | Zone::SummoningPool) {
            return Err(EngineError::Validation(format!(
                "replacement {replacement} is not in the DUA or Summoning Pool"
            )));
        }
        self.move_unit(tx, retired, source_zone)?;
        self.move_unit(tx, replacement, army_zone)?;
        tx.queue_event(GameEvent::UnitPromoted {
            retired,
            replacement,
            army,
        });
        Ok(())
    }

    /// Recruit a unit from the DUA straight into an army (eighth-face
    /// City). The DUA count for that species goes down by one.
    pub fn recruit(&mut self, tx: &mut TransactionLog, unit: UnitId, army: ArmyId) -> Result<()> {
        let from = self.zone_of(unit)?;
        if from != Zone::Dua {
            return Err(EngineError::Validation(format!(
                "unit {unit} is not in the DUA and cannot be recruited"
            )));
        }
        self.move_unit(tx, unit, Zone::Army(army))?;
        tx.queue_event(GameEvent::UnitRecruited { unit, army });
        Ok(())
    }

    /// Set a unit's transient damage marker
    pub fn set_unit_damage(&mut self, tx: &mut TransactionLog, unit: UnitId, damage: u8) -> Result<()> {
        let record = self.units.get_mut(unit)?;
        let from = record.damage;
        if from == damage {
            return Ok(());
        }
        record.damage = damage;
        tx.log(StoreAction::SetUnitDamage {
            unit,
            from,
            to: damage,
        });
        Ok(())
    }

    // ---- rollback support --------------------------------------------

    /// Apply the inverse of a logged mutation. Only called by the game
    /// state's rollback path; does not log.
    pub(crate) fn apply_inverse(&mut self, action: &StoreAction) -> Result<()> {
        match action {
            StoreAction::MoveUnit { unit, from, to } => {
                self.detach(*unit, *to)?;
                self.attach(*unit, *from)?;
                self.zone_tags.insert(*unit, *from);
                Ok(())
            }
            StoreAction::SetUnitDamage { unit, from, .. } => {
                self.units.get_mut(*unit)?.damage = *from;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn detach(&mut self, unit: UnitId, zone: Zone) -> Result<()> {
        match zone {
            Zone::Army(army) => {
                let army = self.armies.get_mut(army)?;
                let pos = army.units.iter().position(|u| *u == unit).ok_or_else(|| {
                    EngineError::Validation(format!("unit {unit} missing from its tagged army"))
                })?;
                // remove() not swap_remove(): iteration order matters for
                // deterministic replay
                army.units.remove(pos);
            }
            _ => {
                let owner = self.units.get(unit)?.owner;
                let list = self
                    .areas_mut(owner)?
                    .list_mut(zone)
                    .expect("fixed zone");
                let pos = list.iter().position(|u| *u == unit).ok_or_else(|| {
                    EngineError::Validation(format!("unit {unit} missing from its tagged area"))
                })?;
                list.remove(pos);
            }
        }
        Ok(())
    }

    fn attach(&mut self, unit: UnitId, zone: Zone) -> Result<()> {
        match zone {
            Zone::Army(army) => self.armies.get_mut(army)?.units.push(unit),
            _ => {
                let owner = self.units.get(unit)?.owner;
                self.areas_mut(owner)?
                    .list_mut(zone)
                    .expect("fixed zone")
                    .push(unit);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ArmyLocation, DieFace, ResultType, SpeciesName, TerrainId, UnitTypeId};
    use smallvec::SmallVec;

    fn store_with_unit() -> (ZoneStore, UnitId, ArmyId, PlayerId) {
        let player = PlayerId::new(0);
        let mut store = ZoneStore::new(&[player]);
        let army = store.create_army("Home", player, ArmyLocation::Terrain(TerrainId::new(0)));
        let id = store.next_unit_id();
        let unit = Unit {
            id,
            name: "Footman #1".to_string(),
            unit_type: UnitTypeId::new("footman"),
            owner: player,
            species: SpeciesName::new("Dwarves"),
            max_health: 2,
            damage: 0,
            faces: SmallVec::from_vec(vec![DieFace::Id, DieFace::icon(ResultType::Melee, 1)]),
            auto_saves: 0,
            elements: SmallVec::new(),
        };
        store.spawn_unit(unit, Zone::Army(army)).unwrap();
        (store, id, army, player)
    }

    #[test]
    fn test_one_zone_invariant() {
        let (mut store, unit, army, player) = store_with_unit();
        let mut tx = TransactionLog::new();

        assert_eq!(store.zone_of(unit).unwrap(), Zone::Army(army));
        store.kill(&mut tx, unit, None).unwrap();
        assert_eq!(store.zone_of(unit).unwrap(), Zone::Dua);
        assert!(store.armies.get(army).unwrap().units.is_empty());
        assert_eq!(store.areas(player).unwrap().dua, vec![unit]);
    }

    #[test]
    fn test_kill_respects_redirect() {
        let (mut store, unit, _, player) = store_with_unit();
        let mut tx = TransactionLog::new();

        store.kill(&mut tx, unit, Some(Zone::Reserve)).unwrap();
        assert_eq!(store.zone_of(unit).unwrap(), Zone::Reserve);
        assert!(store.areas(player).unwrap().dua.is_empty());
    }

    #[test]
    fn test_bury_requires_dua() {
        let (mut store, unit, _, _) = store_with_unit();
        let mut tx = TransactionLog::new();

        assert!(store.bury(&mut tx, unit).is_err());
        store.kill(&mut tx, unit, None).unwrap();
        store.bury(&mut tx, unit).unwrap();
        assert_eq!(store.zone_of(unit).unwrap(), Zone::Bua);
    }

    #[test]
    fn test_rollback_restores_zone() {
        let (mut store, unit, army, _) = store_with_unit();
        let mut tx = TransactionLog::new();

        tx.checkpoint();
        store.kill(&mut tx, unit, None).unwrap();
        assert_eq!(store.zone_of(unit).unwrap(), Zone::Dua);

        for action in tx.rollback() {
            store.apply_inverse(&action).unwrap();
        }
        assert_eq!(store.zone_of(unit).unwrap(), Zone::Army(army));
        assert_eq!(store.armies.get(army).unwrap().units.len(), 1);
    }

    #[test]
    fn test_promote_is_a_swap() {
        let (mut store, retired, army, player) = store_with_unit();
        let mut tx = TransactionLog::new();

        let big_id = store.next_unit_id();
        let big = Unit {
            id: big_id,
            name: "Sergeant #1".to_string(),
            unit_type: UnitTypeId::new("sergeant"),
            owner: player,
            species: SpeciesName::new("Dwarves"),
            max_health: 3,
            damage: 0,
            faces: SmallVec::new(),
            auto_saves: 0,
            elements: SmallVec::new(),
        };
        store.spawn_unit(big, Zone::Dua).unwrap();

        store.promote(&mut tx, retired, big_id).unwrap();
        assert_eq!(store.zone_of(big_id).unwrap(), Zone::Army(army));
        assert_eq!(store.zone_of(retired).unwrap(), Zone::Dua);
        assert_eq!(store.armies.get(army).unwrap().units.len(), 1);
    }
}
