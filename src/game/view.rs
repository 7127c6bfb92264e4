//! Read-only view of game state for the decision layer
//!
//! The presentation layer inspects this view to build its prompts; it
//! cannot mutate anything through it. Mutation happens only by submitting
//! signals to the sequencer or inputs to the resolvers.

use crate::core::{ArmyId, DragonId, PlayerId, ResultType, TerrainId, UnitId};
use crate::game::phase::Step;
use crate::game::GameState;
use crate::zones::Zone;

/// Read-only window onto the game from one player's perspective
pub struct GameStateView<'a> {
    game: &'a GameState,
    player_id: PlayerId,
}

impl<'a> GameStateView<'a> {
    /// Create a new view of the game state from a player's perspective
    pub fn new(game: &'a GameState, player_id: PlayerId) -> Self {
        GameStateView { game, player_id }
    }

    /// Get the player ID this view is for
    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    pub fn current_step(&self) -> Step {
        self.game.turn.current_step
    }

    pub fn turn_number(&self) -> u32 {
        self.game.turn.turn_number
    }

    pub fn is_my_turn(&self) -> bool {
        self.game.turn.active_player == self.player_id
    }

    /// This player's armies, in id order
    pub fn my_armies(&self) -> Vec<ArmyId> {
        self.game.zones.armies_of(self.player_id)
    }

    /// Units in an army, in roll order
    pub fn army_units(&self, army: ArmyId) -> Vec<UnitId> {
        self.game
            .zones
            .armies
            .get(army)
            .map(|a| a.units.iter().copied().collect())
            .unwrap_or_default()
    }

    /// This player's Dead Unit Area
    pub fn dua(&self) -> Vec<UnitId> {
        self.game
            .zones
            .areas(self.player_id)
            .map(|a| a.dua.clone())
            .unwrap_or_default()
    }

    /// This player's Reserve Area
    pub fn reserve(&self) -> Vec<UnitId> {
        self.game
            .zones
            .areas(self.player_id)
            .map(|a| a.reserve.clone())
            .unwrap_or_default()
    }

    /// Which zone a unit occupies
    pub fn zone_of(&self, unit: UnitId) -> Option<Zone> {
        self.game.zones.zone_of(unit).ok()
    }

    /// A unit's display name
    pub fn unit_name(&self, unit: UnitId) -> Option<String> {
        self.game.zones.units.get(unit).ok().map(|u| u.name.clone())
    }

    /// Current face of a terrain
    pub fn terrain_face(&self, terrain: TerrainId) -> Option<u8> {
        self.game.terrains.get(terrain).ok().map(|t| t.face)
    }

    /// Whether this player holds the terrain's eighth face
    pub fn controls_terrain(&self, terrain: TerrainId) -> bool {
        self.game
            .terrains
            .get(terrain)
            .map(|t| t.eighth_face_active() && t.controller == Some(self.player_id))
            .unwrap_or(false)
    }

    /// Terrains this player has captured (the surrounding application's
    /// win check reads this)
    pub fn captured_terrains(&self) -> Vec<TerrainId> {
        self.game.captured_terrains(self.player_id)
    }

    /// Dragons at a terrain, in id order
    pub fn dragons_at(&self, terrain: TerrainId) -> Vec<DragonId> {
        self.game.dragons_at_terrain(terrain)
    }

    /// Eligible promotion replacements for one of this player's units:
    /// same-species units one size larger in the DUA (Summoning Pool too
    /// for Dragonkin)
    pub fn promotion_candidates(&self, unit: UnitId) -> Vec<UnitId> {
        let Ok(record) = self.game.zones.units.get(unit) else {
            return Vec::new();
        };
        let mut candidates =
            self.game
                .zones
                .dua_matches(record.owner, &record.species, record.max_health + 1);
        if record.species.is_dragonkin() {
            candidates.extend(self.game.zones.pool_matches(
                record.owner,
                &record.species,
                record.max_health + 1,
            ));
        }
        candidates
    }

    /// Count of active modifiers on an army for one result type
    pub fn active_modifier_count(&self, army: ArmyId, result: ResultType) -> usize {
        self.game
            .effects
            .active_effects_for(crate::core::EffectTarget::Army(army), result)
            .len()
    }
}
