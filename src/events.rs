//! Discrete event records for the presentation layer
//!
//! Every committed mutation produces one event. Events are staged inside
//! the current transaction and only become visible here when the action
//! commits, so an aborted action never leaks partial events. Delivery is
//! synchronous, in commit order, at most once per event.

use crate::core::{ArmyId, DragonId, EffectId, PlayerId, TerrainId, UnitId};
use crate::game::Phase;
use serde::{Deserialize, Serialize};

/// A single committed state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    TurnStarted {
        player: PlayerId,
        turn_number: u32,
    },
    PhaseAdvanced {
        player: PlayerId,
        phase: Phase,
    },
    UnitKilled {
        unit: UnitId,
        army: ArmyId,
    },
    UnitBuried {
        unit: UnitId,
    },
    UnitPromoted {
        retired: UnitId,
        replacement: UnitId,
        army: ArmyId,
    },
    UnitRecruited {
        unit: UnitId,
        army: ArmyId,
    },
    UnitMoved {
        unit: UnitId,
    },
    EffectRegistered {
        effect: EffectId,
    },
    EffectExpired {
        effect: EffectId,
    },
    ManeuverResolved {
        terrain: TerrainId,
        new_face: u8,
    },
    TerrainCaptured {
        terrain: TerrainId,
        by: PlayerId,
    },
    TerrainControlLost {
        terrain: TerrainId,
        by: PlayerId,
    },
    ActionResolved {
        army: ArmyId,
        damage_dealt: u32,
        units_killed: u32,
    },
    DragonSlain {
        dragon: DragonId,
        at: TerrainId,
    },
    DragonWinged {
        dragon: DragonId,
        at: TerrainId,
    },
}

/// Buffer of committed events awaiting the presentation layer
///
/// The sink drains in commit order; the engine never re-delivers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    committed: Vec<GameEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn publish(&mut self, events: impl IntoIterator<Item = GameEvent>) {
        self.committed.extend(events);
    }

    /// Take all pending events, oldest first
    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.committed)
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    /// Peek without consuming (tests and debugging)
    pub fn pending(&self) -> &[GameEvent] {
        &self.committed
    }
}
