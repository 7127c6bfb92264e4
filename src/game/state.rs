//! Main game state structure

use crate::core::{
    ArmyId, Dragon, DragonId, DragonLocation, EntityStore, Player, PlayerId, Terrain, TerrainId,
};
use crate::events::{EventLog, GameEvent};
use crate::game::effects::EffectManager;
use crate::game::logger::GameLogger;
use crate::game::phase::TurnStructure;
use crate::undo::{StoreAction, TransactionLog};
use crate::zones::ZoneStore;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Complete game state
///
/// The central structure holding all authoritative game information. The
/// Zone Store is the single source of truth for unit custody; everything
/// here is mutated through transactional wrappers so an aborted action
/// leaves no trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// All players in the game (Vec for stable ordering, small count)
    pub players: Vec<Player>,

    /// Unit and army custody
    pub zones: ZoneStore,

    /// All terrain dice
    pub terrains: EntityStore<Terrain>,

    /// All dragons, at terrains or in Summoning Pools
    pub dragons: EntityStore<Dragon>,

    /// Turn structure
    pub turn: TurnStructure,

    /// Active effects and their expiry bookkeeping
    pub effects: EffectManager,

    /// Transaction log for the current action
    pub tx: TransactionLog,

    /// Committed events awaiting the presentation layer
    pub events: EventLog,

    /// Centralized logger for engine output
    #[serde(skip, default)]
    pub logger: GameLogger,
}

impl GameState {
    /// Create a new game for the given players, first name moves first
    pub fn new(player_names: &[&str]) -> Self {
        let mut players = Vec::with_capacity(player_names.len());
        for (idx, name) in player_names.iter().enumerate() {
            players.push(Player::new(PlayerId::new(idx as u32), *name));
        }
        let ids: Vec<PlayerId> = players.iter().map(|p| p.id).collect();
        let first = ids[0];

        GameState {
            players,
            zones: ZoneStore::new(&ids),
            terrains: EntityStore::new(),
            dragons: EntityStore::new(),
            turn: TurnStructure::new(first, 0),
            effects: EffectManager::new(),
            tx: TransactionLog::new(),
            events: EventLog::new(),
            logger: GameLogger::new(),
        }
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// The player after `id` in seating order
    pub fn next_player(&self, idx: usize) -> (PlayerId, usize) {
        let next_idx = (idx + 1) % self.players.len();
        (self.players[next_idx].id, next_idx)
    }

    /// Whether a player holds an active eighth face of the given kind
    /// anywhere on the table (Temple burial protection, Tower ranging)
    pub fn player_controls_eighth_face(&self, player: PlayerId, kind: crate::core::EighthFaceKind) -> bool {
        self.terrains.ids().into_iter().any(|id| {
            self.terrains
                .get(id)
                .map(|t| t.eighth_face_active() && t.controller == Some(player) && t.eighth_face == kind)
                .unwrap_or(false)
        })
    }

    /// Terrains a player currently controls at the eighth face
    pub fn captured_terrains(&self, player: PlayerId) -> Vec<TerrainId> {
        self.terrains
            .ids()
            .into_iter()
            .filter(|id| {
                self.terrains
                    .get(*id)
                    .map(|t| t.eighth_face_active() && t.controller == Some(player))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Dragons currently at a terrain, in id order
    pub fn dragons_at_terrain(&self, terrain: TerrainId) -> Vec<DragonId> {
        self.dragons
            .ids()
            .into_iter()
            .filter(|id| {
                self.dragons
                    .get(*id)
                    .map(|d| d.location == DragonLocation::Terrain(terrain))
                    .unwrap_or(false)
            })
            .collect()
    }

    // ---- transactions -------------------------------------------------

    /// Open a transaction. Mutations stage until commit; rollback rewinds
    /// them all and discards their events.
    pub fn begin(&mut self) {
        self.tx.checkpoint();
    }

    /// Commit the innermost transaction and publish its events in commit
    /// order.
    pub fn commit(&mut self) {
        let events = self.tx.commit();
        self.events.publish(events);
    }

    /// Abort the innermost transaction, rewinding every staged mutation.
    pub fn rollback(&mut self) {
        for action in self.tx.rollback() {
            // Inverse application cannot fail on a log we wrote ourselves;
            // a miss here means the store was mutated outside a primitive.
            self.apply_inverse(&action)
                .expect("transaction log inverse must apply");
        }
    }

    fn apply_inverse(&mut self, action: &StoreAction) -> Result<()> {
        match action {
            StoreAction::MoveUnit { .. } | StoreAction::SetUnitDamage { .. } => {
                self.zones.apply_inverse(action)
            }
            StoreAction::SetTerrainFace { terrain, from, .. } => {
                self.terrains.get_mut(*terrain)?.face = *from;
                Ok(())
            }
            StoreAction::SetTerrainController { terrain, from, .. } => {
                self.terrains.get_mut(*terrain)?.controller = *from;
                Ok(())
            }
            StoreAction::SetDragonWounds { dragon, from, .. } => {
                self.dragons.get_mut(*dragon)?.wounds = *from;
                Ok(())
            }
            StoreAction::MoveDragon { dragon, from, .. } => {
                self.dragons.get_mut(*dragon)?.location = *from;
                Ok(())
            }
            StoreAction::RegisterEffect { effect } => {
                self.effects.remove_raw(*effect);
                Ok(())
            }
            StoreAction::RemoveEffect { effect } => {
                self.effects.insert_raw(effect.as_ref().clone());
                Ok(())
            }
            StoreAction::SetArmyActed { army, from, .. } => {
                self.zones.armies.get_mut(*army)?.acted_this_turn = *from;
                Ok(())
            }
        }
    }

    // ---- transactional mutations beyond unit custody ------------------

    /// Turn a terrain die to a new face
    pub fn set_terrain_face(&mut self, terrain: TerrainId, face: u8) -> Result<()> {
        let record = self.terrains.get_mut(terrain)?;
        let from = record.face;
        if from == face {
            return Ok(());
        }
        record.face = face;
        self.tx.log(StoreAction::SetTerrainFace {
            terrain,
            from,
            to: face,
        });
        Ok(())
    }

    /// Set or clear a terrain's controlling player
    pub fn set_terrain_controller(&mut self, terrain: TerrainId, controller: Option<PlayerId>) -> Result<()> {
        let record = self.terrains.get_mut(terrain)?;
        let from = record.controller;
        if from == controller {
            return Ok(());
        }
        record.controller = controller;
        self.tx.log(StoreAction::SetTerrainController {
            terrain,
            from,
            to: controller,
        });
        if let Some(player) = controller {
            self.tx.queue_event(GameEvent::TerrainCaptured {
                terrain,
                by: player,
            });
        } else if let Some(player) = from {
            self.tx.queue_event(GameEvent::TerrainControlLost {
                terrain,
                by: player,
            });
        }
        Ok(())
    }

    /// Mark wounds on a dragon
    pub fn set_dragon_wounds(&mut self, dragon: DragonId, wounds: u8) -> Result<()> {
        let record = self.dragons.get_mut(dragon)?;
        let from = record.wounds;
        if from == wounds {
            return Ok(());
        }
        record.wounds = wounds;
        self.tx.log(StoreAction::SetDragonWounds {
            dragon,
            from,
            to: wounds,
        });
        Ok(())
    }

    /// Move a dragon between a terrain and its Summoning Pool
    pub fn move_dragon(&mut self, dragon: DragonId, to: DragonLocation) -> Result<()> {
        let record = self.dragons.get_mut(dragon)?;
        let from = record.location;
        if from == to {
            return Ok(());
        }
        record.location = to;
        self.tx.log(StoreAction::MoveDragon { dragon, from, to });
        Ok(())
    }

    /// Flag an army as having acted this turn
    pub fn set_army_acted(&mut self, army: ArmyId, acted: bool) -> Result<()> {
        let record = self.zones.armies.get_mut(army)?;
        let from = record.acted_this_turn;
        if from == acted {
            return Ok(());
        }
        record.acted_this_turn = acted;
        self.tx.log(StoreAction::SetArmyActed { army, from, to: acted });
        Ok(())
    }

    /// Re-check eighth-face control of a terrain after units moved or
    /// died: control requires a controlling-player army still standing
    /// there. Losing control reverts the die to face 7.
    pub fn recheck_terrain_control(&mut self, terrain: TerrainId) -> Result<()> {
        let record = self.terrains.get(terrain)?;
        let Some(controller) = record.controller else {
            return Ok(());
        };
        let still_occupied = self
            .zones
            .armies_at_terrain(terrain)
            .into_iter()
            .any(|a| {
                self.zones
                    .armies
                    .get(a)
                    .map(|army| army.owner == controller && !army.units.is_empty())
                    .unwrap_or(false)
            });
        if !still_occupied {
            let was_eighth = record.face == 8;
            self.set_terrain_controller(terrain, None)?;
            if was_eighth {
                self.set_terrain_face(terrain, 7)?;
            }
        }
        Ok(())
    }
}

impl PartialEq for GameState {
    // Durable state only: the logger and in-flight transaction internals
    // don't participate in snapshot equality.
    fn eq(&self, other: &Self) -> bool {
        self.players == other.players
            && self.zones == other.zones
            && self.terrains == other.terrains
            && self.dragons == other.dragons
            && self.turn == other.turn
            && self.effects == other.effects
            && self.events == other.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EighthFaceKind, TerrainFaceIcon, TerrainTypeId};
    use smallvec::SmallVec;

    fn state_with_terrain(face: u8, controller: Option<PlayerId>) -> (GameState, TerrainId) {
        let mut game = GameState::new(&["Alice", "Bob"]);
        let id = game.terrains.next_id();
        game.terrains.insert(
            id,
            Terrain {
                id,
                name: "Coastland Tower".to_string(),
                terrain_type: TerrainTypeId::new("coastland_tower"),
                face,
                controller,
                elements: SmallVec::new(),
                face_icons: SmallVec::from_vec(vec![TerrainFaceIcon::Maneuver; 7]),
                eighth_face: EighthFaceKind::Tower,
            },
        );
        (game, id)
    }

    #[test]
    fn test_rollback_restores_terrain() {
        let (mut game, terrain) = state_with_terrain(5, None);

        game.begin();
        game.set_terrain_face(terrain, 6).unwrap();
        game.set_terrain_controller(terrain, Some(PlayerId::new(0))).unwrap();
        game.rollback();

        let record = game.terrains.get(terrain).unwrap();
        assert_eq!(record.face, 5);
        assert_eq!(record.controller, None);
        assert!(game.events.is_empty());
    }

    #[test]
    fn test_commit_publishes_events() {
        let (mut game, terrain) = state_with_terrain(8, None);

        game.begin();
        game.set_terrain_controller(terrain, Some(PlayerId::new(1))).unwrap();
        game.commit();

        let events = game.events.drain();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], GameEvent::TerrainCaptured { .. }));
    }

    #[test]
    fn test_lost_control_reverts_face() {
        let (mut game, terrain) = state_with_terrain(8, Some(PlayerId::new(0)));

        // No army of player 0 stands there, so control lapses
        game.begin();
        game.recheck_terrain_control(terrain).unwrap();
        game.commit();

        let record = game.terrains.get(terrain).unwrap();
        assert_eq!(record.controller, None);
        assert_eq!(record.face, 7);
    }
}
