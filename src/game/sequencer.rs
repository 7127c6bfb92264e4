//! Turn Phase Sequencer
//!
//! The top-level state machine driving players through the fixed phase
//! list each turn. It is a cooperative, single-threaded driver: every
//! transition out of a step requires an explicitly submitted signal from
//! the decision layer, and the sequencer never advances on its own. The
//! one exception is the Dragon Attack phase, which auto-skips when no
//! dragon shares a terrain with the marching player's armies.

use crate::core::{
    ArmyId, EffectId, EffectKind, EffectTarget, Expiry, PlayerId, TerrainId, UnitId,
};
use crate::events::GameEvent;
use crate::game::dragon_attack::{resolve_dragon_attack, DragonAttackInput, DragonPhaseOutcome};
use crate::game::phase::Step;
use crate::game::resolver::{
    resolve_action, resolve_city_turn, resolve_maneuver, resolve_reinforce, resolve_retreat,
    ActionInput, ActionOutcome, ManeuverInput, ManeuverOutcome, PromotionPair,
};
use crate::game::GameState;
use crate::loader::ReferenceData;
use crate::log_if_verbose;
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// A decision submitted by the surrounding application.
///
/// Signals that carry a payload both resolve it and, where noted, serve
/// as the step's completion signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PhaseSignal {
    /// Complete the current bookkeeping step
    PhaseComplete,
    /// Use a controlled City eighth face (EighthFace step, does not advance)
    CityTurn {
        army: ArmyId,
        recruit: Option<UnitId>,
        promotion: Option<PromotionPair>,
    },
    /// Resolve one terrain's dragon attacks (DragonAttack step, does not
    /// advance; every pending terrain must be resolved before completion)
    DragonAttack(DragonAttackInput),
    /// Register a species-ability effect (SpeciesAbilities step, does not
    /// advance)
    SpeciesAbility {
        target: EffectTarget,
        kind: EffectKind,
        expiry: Expiry,
        source: String,
    },
    /// Decline the march's maneuver sub-step
    SkipManeuver,
    /// Attempt a maneuver (advances to the action sub-step)
    Maneuver(ManeuverInput),
    /// Decline the march's action sub-step
    SkipAction,
    /// Take the march action (advances)
    Action(ActionInput),
    /// Move reserve units into armies (advances to Retreat)
    Reinforce(Vec<(UnitId, ArmyId)>),
    /// Pull armies back to Reserve and end the turn
    Retreat(Vec<ArmyId>),
}

/// What a submitted signal did
#[derive(Debug, Clone, PartialEq)]
pub enum SignalOutcome {
    Advanced(Step),
    CityTurnResolved,
    DragonAttackResolved(DragonPhaseOutcome),
    EffectRegistered(EffectId),
    ManeuverResolved(ManeuverOutcome),
    ActionResolved(ActionOutcome),
    TurnEnded { next_player: PlayerId },
}

/// Cooperative turn driver
///
/// Owns no state of its own beyond march bookkeeping; everything durable
/// lives in the GameState it drives.
pub struct TurnSequencer<'a> {
    game: &'a mut GameState,
    refdata: &'a ReferenceData,
    /// The one acting army of the current march
    march_army: Option<ArmyId>,
    /// Terrains still owed a dragon attack this phase
    pending_dragon_terrains: Vec<TerrainId>,
}

impl<'a> TurnSequencer<'a> {
    /// Start driving a game. Runs the active player's ExpireEffects work
    /// immediately; the phase still waits for its completion signal.
    pub fn new(game: &'a mut GameState, refdata: &'a ReferenceData) -> Self {
        let mut seq = TurnSequencer {
            game,
            refdata,
            march_army: None,
            pending_dragon_terrains: Vec::new(),
        };
        seq.enter_turn();
        seq
    }

    pub fn current_step(&self) -> Step {
        self.game.turn.current_step
    }

    pub fn active_player(&self) -> PlayerId {
        self.game.turn.active_player
    }

    /// Terrains still owed a dragon attack in the current phase
    pub fn pending_dragon_terrains(&self) -> &[TerrainId] {
        &self.pending_dragon_terrains
    }

    /// Submit one decision. Invalid signals for the current step are
    /// rejected with a protocol error and change nothing.
    pub fn submit(&mut self, signal: PhaseSignal) -> Result<SignalOutcome> {
        let step = self.game.turn.current_step;
        match (step, signal) {
            (Step::ExpireEffects, PhaseSignal::PhaseComplete)
            | (Step::EighthFace, PhaseSignal::PhaseComplete)
            | (Step::SpeciesAbilities, PhaseSignal::PhaseComplete) => self.advance(),

            (Step::EighthFace, PhaseSignal::CityTurn { army, recruit, promotion }) => {
                self.check_owner(army)?;
                resolve_city_turn(self.game, army, recruit, promotion)?;
                Ok(SignalOutcome::CityTurnResolved)
            }

            (Step::DragonAttack, PhaseSignal::DragonAttack(input)) => {
                let position = self
                    .pending_dragon_terrains
                    .iter()
                    .position(|t| *t == input.terrain)
                    .ok_or_else(|| {
                        EngineError::Protocol(format!(
                            "terrain {} has no pending dragon attack",
                            input.terrain
                        ))
                    })?;
                let outcome = resolve_dragon_attack(self.game, input)?;
                self.pending_dragon_terrains.remove(position);
                Ok(SignalOutcome::DragonAttackResolved(outcome))
            }
            (Step::DragonAttack, PhaseSignal::PhaseComplete) => {
                if !self.pending_dragon_terrains.is_empty() {
                    return Err(EngineError::Protocol(format!(
                        "{} terrain(s) still owe a dragon attack",
                        self.pending_dragon_terrains.len()
                    )));
                }
                self.advance()
            }

            (Step::SpeciesAbilities, PhaseSignal::SpeciesAbility { target, kind, expiry, source }) => {
                let owner = match target {
                    EffectTarget::Army(army) => self.game.zones.armies.get(army)?.owner,
                    EffectTarget::Unit(unit) => self.game.zones.units.get(unit)?.owner,
                };
                self.game.begin();
                match self
                    .game
                    .effects
                    .register(&mut self.game.tx, target, owner, kind, expiry, source)
                {
                    Ok(id) => {
                        self.game.commit();
                        Ok(SignalOutcome::EffectRegistered(id))
                    }
                    Err(err) => {
                        self.game.rollback();
                        Err(err)
                    }
                }
            }

            (step, PhaseSignal::SkipManeuver) if step.is_maneuver() => {
                self.march_army = None;
                self.advance()
            }
            (step, PhaseSignal::Maneuver(input)) if step.is_maneuver() => {
                self.check_owner(input.army)?;
                let outcome = resolve_maneuver(self.game, input.clone())?;
                self.march_army = Some(input.army);
                self.advance()?;
                Ok(SignalOutcome::ManeuverResolved(outcome))
            }

            (step, PhaseSignal::SkipAction) if step.is_action() => {
                self.march_army = None;
                self.advance()
            }
            (step, PhaseSignal::Action(input)) if step.is_action() => {
                self.check_owner(input.acting_army)?;
                if let Some(march_army) = self.march_army {
                    if march_army != input.acting_army {
                        return Err(EngineError::Protocol(format!(
                            "army {march_army} maneuvered this march; only it may act"
                        )));
                    }
                }
                if step == Step::SecondMarchAction {
                    self.check_second_march_army(input.acting_army)?;
                }
                let outcome = resolve_action(self.game, self.refdata, input)?;
                self.march_army = None;
                self.advance()?;
                Ok(SignalOutcome::ActionResolved(outcome))
            }

            (Step::ReservesReinforce, PhaseSignal::Reinforce(moves)) => {
                for (unit, _) in &moves {
                    let owner = self.game.zones.units.get(*unit)?.owner;
                    if owner != self.active_player() {
                        return Err(EngineError::Protocol(format!(
                            "unit {unit} does not belong to the active player"
                        )));
                    }
                }
                resolve_reinforce(self.game, moves)?;
                self.advance()
            }
            (Step::ReservesRetreat, PhaseSignal::Retreat(armies)) => {
                for army in &armies {
                    self.check_owner(*army)?;
                }
                resolve_retreat(self.game, armies)?;
                self.advance()
            }

            (step, signal) => Err(EngineError::Protocol(format!(
                "signal {signal:?} is not valid in step {step:?}"
            ))),
        }
    }

    // ---- internals ----------------------------------------------------

    fn check_owner(&self, army: ArmyId) -> Result<()> {
        let owner = self.game.zones.armies.get(army)?.owner;
        if owner != self.active_player() {
            return Err(EngineError::Protocol(format!(
                "army {army} does not belong to the active player"
            )));
        }
        Ok(())
    }

    /// In Second March the same army may not act twice while another
    /// eligible army has not acted this turn.
    fn check_second_march_army(&self, army_id: ArmyId) -> Result<()> {
        let army = self.game.zones.armies.get(army_id)?;
        if !army.acted_this_turn {
            return Ok(());
        }
        let another_eligible = self
            .game
            .zones
            .armies_of(self.active_player())
            .into_iter()
            .filter(|id| *id != army_id)
            .any(|id| {
                self.game
                    .zones
                    .armies
                    .get(id)
                    .map(|a| !a.units.is_empty() && !a.acted_this_turn)
                    .unwrap_or(false)
            });
        if another_eligible {
            return Err(EngineError::Protocol(format!(
                "army {army_id} already acted; another eligible army has not"
            )));
        }
        Ok(())
    }

    fn advance(&mut self) -> Result<SignalOutcome> {
        if self.game.turn.advance_step() {
            self.on_step_entered()?;
            Ok(SignalOutcome::Advanced(self.game.turn.current_step))
        } else {
            let next = self.end_turn()?;
            Ok(SignalOutcome::TurnEnded { next_player: next })
        }
    }

    fn on_step_entered(&mut self) -> Result<()> {
        let step = self.game.turn.current_step;
        self.game.begin();
        self.game.tx.queue_event(GameEvent::PhaseAdvanced {
            player: self.active_player(),
            phase: step.phase(),
        });
        self.game.commit();
        log_if_verbose!(self.game.logger, "entering {:?}", step);

        match step {
            Step::DragonAttack => {
                self.pending_dragon_terrains = self.dragon_attack_terrains();
                if self.pending_dragon_terrains.is_empty() {
                    // No dragon shares a terrain with the marching
                    // player's armies: the phase is a no-op and skips.
                    return self.advance().map(|_| ());
                }
            }
            Step::FirstMarchManeuver | Step::SecondMarchManeuver => {
                self.march_army = None;
            }
            _ => {}
        }
        Ok(())
    }

    /// Terrains where the marching player has a non-empty army and at
    /// least one dragon is present
    fn dragon_attack_terrains(&self) -> Vec<TerrainId> {
        let player = self.active_player();
        self.game
            .terrains
            .ids()
            .into_iter()
            .filter(|terrain| {
                let has_army = self
                    .game
                    .zones
                    .armies_at_terrain(*terrain)
                    .into_iter()
                    .any(|a| {
                        self.game
                            .zones
                            .armies
                            .get(a)
                            .map(|army| army.owner == player && !army.units.is_empty())
                            .unwrap_or(false)
                    });
                has_army && !self.game.dragons_at_terrain(*terrain).is_empty()
            })
            .collect()
    }

    fn end_turn(&mut self) -> Result<PlayerId> {
        let (next_player, next_idx) = self.game.next_player(self.game.turn.active_player_idx);
        self.game.turn.next_turn(next_player, next_idx);
        self.march_army = None;
        self.enter_turn();
        Ok(next_player)
    }

    /// Turn start: emit the event, reset acted flags, and run the new
    /// active player's effect expiry (the ExpireEffects phase's work).
    fn enter_turn(&mut self) {
        let player = self.game.turn.active_player;
        self.game.begin();
        self.game.tx.queue_event(GameEvent::TurnStarted {
            player,
            turn_number: self.game.turn.turn_number,
        });
        // Acted flags are per turn.
        for army in self.game.zones.armies.ids() {
            self.game
                .set_army_acted(army, false)
                .expect("army ids from the store are valid");
        }
        self.game.effects.expire_at_turn_start(&mut self.game.tx, player);
        self.game.commit();
        log_if_verbose!(
            self.game.logger,
            "turn {} begins for player {}",
            self.game.turn.turn_number,
            player
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::ReferenceData;

    #[test]
    fn test_bookkeeping_phases_advance_on_signal() {
        let mut game = GameState::new(&["Alice", "Bob"]);
        let refdata = ReferenceData::empty();
        let mut seq = TurnSequencer::new(&mut game, &refdata);

        assert_eq!(seq.current_step(), Step::ExpireEffects);
        seq.submit(PhaseSignal::PhaseComplete).unwrap();
        assert_eq!(seq.current_step(), Step::EighthFace);
        // No dragons anywhere: DragonAttack auto-skips.
        seq.submit(PhaseSignal::PhaseComplete).unwrap();
        assert_eq!(seq.current_step(), Step::SpeciesAbilities);
    }

    #[test]
    fn test_double_skip_maneuver_is_a_protocol_error() {
        let mut game = GameState::new(&["Alice", "Bob"]);
        let refdata = ReferenceData::empty();
        let mut seq = TurnSequencer::new(&mut game, &refdata);

        for _ in 0..3 {
            seq.submit(PhaseSignal::PhaseComplete).unwrap();
        }
        assert_eq!(seq.current_step(), Step::FirstMarchManeuver);

        seq.submit(PhaseSignal::SkipManeuver).unwrap();
        assert_eq!(seq.current_step(), Step::FirstMarchAction);

        let err = seq.submit(PhaseSignal::SkipManeuver).unwrap_err();
        assert!(matches!(err, EngineError::Protocol(_)));
        // The step did not move.
        assert_eq!(seq.current_step(), Step::FirstMarchAction);
    }

    #[test]
    fn test_full_turn_rotates_players() {
        let mut game = GameState::new(&["Alice", "Bob"]);
        let refdata = ReferenceData::empty();
        let mut seq = TurnSequencer::new(&mut game, &refdata);
        let first = seq.active_player();

        // Walk a decision-free turn: complete phases, skip both marches,
        // move nothing in Reserves.
        for _ in 0..3 {
            seq.submit(PhaseSignal::PhaseComplete).unwrap();
        }
        seq.submit(PhaseSignal::SkipManeuver).unwrap();
        seq.submit(PhaseSignal::SkipAction).unwrap();
        seq.submit(PhaseSignal::SkipManeuver).unwrap();
        seq.submit(PhaseSignal::SkipAction).unwrap();
        seq.submit(PhaseSignal::Reinforce(Vec::new())).unwrap();
        let outcome = seq.submit(PhaseSignal::Retreat(Vec::new())).unwrap();

        match outcome {
            SignalOutcome::TurnEnded { next_player } => assert_ne!(next_player, first),
            other => panic!("expected TurnEnded, got {other:?}"),
        }
        assert_eq!(seq.current_step(), Step::ExpireEffects);
        assert_eq!(seq.game.turn.turn_number, 2);
    }
}
