//! Transaction log for atomic action resolution
//!
//! Every Zone Store and state mutation is recorded here as it happens.
//! An action marks a checkpoint before its first mutation; if validation
//! fails mid-way the whole run of mutations is rewound, leaving the store
//! untouched. Events queued during the transaction are discarded with it.

use crate::core::{ArmyId, DragonId, DragonLocation, Effect, EffectId, PlayerId, TerrainId, UnitId};
use crate::events::GameEvent;
use crate::zones::Zone;
use serde::{Deserialize, Serialize};

/// Atomic state mutations that can be logged and undone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StoreAction {
    /// Move a unit between zones
    MoveUnit {
        unit: UnitId,
        from: Zone,
        to: Zone,
    },

    /// Change a unit's transient damage marker
    SetUnitDamage {
        unit: UnitId,
        from: u8,
        to: u8,
    },

    /// Turn a terrain die
    SetTerrainFace {
        terrain: TerrainId,
        from: u8,
        to: u8,
    },

    /// Change a terrain's controlling player
    SetTerrainController {
        terrain: TerrainId,
        from: Option<PlayerId>,
        to: Option<PlayerId>,
    },

    /// Change a dragon's wound count
    SetDragonWounds {
        dragon: DragonId,
        from: u8,
        to: u8,
    },

    /// Move a dragon between a terrain and its Summoning Pool
    MoveDragon {
        dragon: DragonId,
        from: DragonLocation,
        to: DragonLocation,
    },

    /// An effect was registered (rollback removes it)
    RegisterEffect {
        effect: EffectId,
    },

    /// An effect was removed (rollback restores the full record)
    RemoveEffect {
        effect: Box<Effect>,
    },

    /// An army's acted-this-turn flag changed
    SetArmyActed {
        army: ArmyId,
        from: bool,
        to: bool,
    },
}

/// Transaction log of staged mutations and their queued events
///
/// Checkpoints snapshot both the action and event positions so a rollback
/// rewinds mutations and drops the events they queued in one motion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionLog {
    /// Stack of mutations (most recent at end)
    actions: Vec<StoreAction>,

    /// Events queued by the staged mutations, flushed on commit
    staged_events: Vec<GameEvent>,

    /// (actions.len(), staged_events.len()) marks for open transactions
    checkpoints: Vec<(usize, usize)>,
}

impl TransactionLog {
    pub fn new() -> Self {
        TransactionLog {
            actions: Vec::new(),
            staged_events: Vec::new(),
            checkpoints: Vec::new(),
        }
    }

    /// Record a mutation
    pub fn log(&mut self, action: StoreAction) {
        self.actions.push(action);
    }

    /// Queue an event to be published when the transaction commits
    pub fn queue_event(&mut self, event: GameEvent) {
        self.staged_events.push(event);
    }

    /// Mark the start of a transaction
    pub fn checkpoint(&mut self) {
        self.checkpoints
            .push((self.actions.len(), self.staged_events.len()));
    }

    /// Whether a transaction is currently open
    pub fn in_transaction(&self) -> bool {
        !self.checkpoints.is_empty()
    }

    /// Commit the innermost transaction: drop its checkpoint and return
    /// the events queued since it opened (empty for nested commits, which
    /// release their events to the enclosing transaction).
    pub fn commit(&mut self) -> Vec<GameEvent> {
        self.checkpoints.pop();
        if self.checkpoints.is_empty() {
            // Outermost commit: the staged history is no longer needed.
            self.actions.clear();
            std::mem::take(&mut self.staged_events)
        } else {
            Vec::new()
        }
    }

    /// Abort the innermost transaction, returning the mutations to rewind
    /// in reverse order. Their queued events are discarded.
    pub fn rollback(&mut self) -> Vec<StoreAction> {
        let Some((action_mark, event_mark)) = self.checkpoints.pop() else {
            return Vec::new();
        };
        self.staged_events.truncate(event_mark);
        let mut tail = self.actions.split_off(action_mark);
        tail.reverse();
        tail
    }

    /// Number of staged mutations
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Default for TransactionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for TransactionLog {
    // Snapshot equality only cares that no transaction was in flight.
    fn eq(&self, other: &Self) -> bool {
        self.checkpoints == other.checkpoints
            && self.actions.len() == other.actions.len()
            && self.staged_events == other.staged_events
    }
}
