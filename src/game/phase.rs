//! Turn phases and steps

use serde::{Deserialize, Serialize};

/// Major phases of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    ExpireEffects,
    EighthFace,
    DragonAttack,
    SpeciesAbilities,
    FirstMarch,
    SecondMarch,
    Reserves,
}

/// Specific steps within phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    // Bookkeeping
    ExpireEffects,
    EighthFace,
    DragonAttack,
    SpeciesAbilities,

    // First March
    FirstMarchManeuver,
    FirstMarchAction,

    // Second March
    SecondMarchManeuver,
    SecondMarchAction,

    // Reserves Phase
    ReservesReinforce,
    ReservesRetreat,
}

impl Step {
    /// Get the phase this step belongs to
    pub fn phase(&self) -> Phase {
        match self {
            Step::ExpireEffects => Phase::ExpireEffects,
            Step::EighthFace => Phase::EighthFace,
            Step::DragonAttack => Phase::DragonAttack,
            Step::SpeciesAbilities => Phase::SpeciesAbilities,
            Step::FirstMarchManeuver | Step::FirstMarchAction => Phase::FirstMarch,
            Step::SecondMarchManeuver | Step::SecondMarchAction => Phase::SecondMarch,
            Step::ReservesReinforce | Step::ReservesRetreat => Phase::Reserves,
        }
    }

    /// Get the next step in turn order
    pub fn next(&self) -> Option<Step> {
        match self {
            Step::ExpireEffects => Some(Step::EighthFace),
            Step::EighthFace => Some(Step::DragonAttack),
            Step::DragonAttack => Some(Step::SpeciesAbilities),
            Step::SpeciesAbilities => Some(Step::FirstMarchManeuver),
            Step::FirstMarchManeuver => Some(Step::FirstMarchAction),
            Step::FirstMarchAction => Some(Step::SecondMarchManeuver),
            Step::SecondMarchManeuver => Some(Step::SecondMarchAction),
            Step::SecondMarchAction => Some(Step::ReservesReinforce),
            Step::ReservesReinforce => Some(Step::ReservesRetreat),
            Step::ReservesRetreat => None, // End of turn
        }
    }

    /// Is this one of the two march maneuver sub-steps?
    pub fn is_maneuver(&self) -> bool {
        matches!(self, Step::FirstMarchManeuver | Step::SecondMarchManeuver)
    }

    /// Is this one of the two march action sub-steps?
    pub fn is_action(&self) -> bool {
        matches!(self, Step::FirstMarchAction | Step::SecondMarchAction)
    }
}

/// Represents the current turn structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnStructure {
    /// Current turn number (starts at 1)
    pub turn_number: u32,

    /// Current step
    pub current_step: Step,

    /// Active player (whose turn it is)
    pub active_player: crate::core::PlayerId,

    /// Active player's index in GameState::players Vec (for O(1) next player lookup)
    pub active_player_idx: usize,
}

impl TurnStructure {
    pub fn new(starting_player: crate::core::PlayerId, starting_idx: usize) -> Self {
        TurnStructure {
            turn_number: 1,
            current_step: Step::ExpireEffects,
            active_player: starting_player,
            active_player_idx: starting_idx,
        }
    }

    pub fn current_phase(&self) -> Phase {
        self.current_step.phase()
    }

    /// Advance to the next step
    pub fn advance_step(&mut self) -> bool {
        if let Some(next_step) = self.current_step.next() {
            self.current_step = next_step;
            true
        } else {
            false // End of turn
        }
    }

    /// Start a new turn
    pub fn next_turn(&mut self, next_player: crate::core::PlayerId, next_idx: usize) {
        self.turn_number += 1;
        self.current_step = Step::ExpireEffects;
        self.active_player = next_player;
        self.active_player_idx = next_idx;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PlayerId;

    #[test]
    fn test_step_phases() {
        assert_eq!(Step::ExpireEffects.phase(), Phase::ExpireEffects);
        assert_eq!(Step::FirstMarchManeuver.phase(), Phase::FirstMarch);
        assert_eq!(Step::SecondMarchAction.phase(), Phase::SecondMarch);
        assert_eq!(Step::ReservesRetreat.phase(), Phase::Reserves);
    }

    #[test]
    fn test_step_progression() {
        let mut step = Step::ExpireEffects;
        step = step.next().unwrap();
        assert_eq!(step, Step::EighthFace);
        step = step.next().unwrap();
        assert_eq!(step, Step::DragonAttack);
    }

    #[test]
    fn test_turn_structure() {
        let player = PlayerId::new(1);
        let mut turn = TurnStructure::new(player, 0);

        assert_eq!(turn.turn_number, 1);
        assert_eq!(turn.current_step, Step::ExpireEffects);
        assert_eq!(turn.active_player, player);

        assert!(turn.advance_step());
        assert_eq!(turn.current_step, Step::EighthFace);

        // Advance through entire turn
        while turn.advance_step() {}
        assert_eq!(turn.current_step, Step::ReservesRetreat);

        let player2 = PlayerId::new(2);
        turn.next_turn(player2, 1);
        assert_eq!(turn.turn_number, 2);
        assert_eq!(turn.current_step, Step::ExpireEffects);
        assert_eq!(turn.active_player, player2);
    }

    #[test]
    fn test_march_sub_steps() {
        assert!(Step::FirstMarchManeuver.is_maneuver());
        assert!(Step::SecondMarchAction.is_action());
        assert!(!Step::EighthFace.is_maneuver());
    }
}
