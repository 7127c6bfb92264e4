//! Effect Duration Manager
//!
//! Tracks active modifiers and their expiry triggers. Everything that used
//! to be ambient "expire on various triggers" state is an explicit record
//! here, queried by the roll pipeline and purged on the enumerated expiry
//! boundaries. Registration enforces the non-cumulative rule: at most one
//! multiplying and one dividing modifier per (target, result-type) pair.

use crate::core::{
    Effect, EffectId, EffectKind, EffectTarget, EntityStore, Expiry, ModifierOp, PlayerId, ResultType,
};
use crate::events::GameEvent;
use crate::undo::{StoreAction, TransactionLog};
use crate::zones::ZoneStore;
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Owner of all active effects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectManager {
    effects: EntityStore<Effect>,
}

impl EffectManager {
    pub fn new() -> Self {
        EffectManager {
            effects: EntityStore::new(),
        }
    }

    /// Register a new effect.
    ///
    /// A second multiply (or divide) for the same (target, result-type) is
    /// rejected, not silently replaced.
    pub fn register(
        &mut self,
        tx: &mut TransactionLog,
        target: EffectTarget,
        owner: PlayerId,
        kind: EffectKind,
        expiry: Expiry,
        source: impl Into<String>,
    ) -> Result<EffectId> {
        if let EffectKind::Modifier(m) = &kind {
            if matches!(m.op, ModifierOp::Multiply | ModifierOp::Divide)
                && self.has_modifier(target, m.op, m.result)
            {
                return Err(EngineError::RuleViolation(format!(
                    "a {} modifier for {} is already active on this target",
                    m.op, m.result
                )));
            }
            if matches!(m.op, ModifierOp::Divide) && m.magnitude == 0 {
                return Err(EngineError::RuleViolation(
                    "divide modifier magnitude must be nonzero".to_string(),
                ));
            }
        }

        let id = self.effects.next_id();
        let effect = Effect {
            id,
            target,
            owner,
            kind,
            expiry,
            source: source.into(),
        };
        self.effects.insert(id, effect);
        tx.log(StoreAction::RegisterEffect { effect: id });
        tx.queue_event(GameEvent::EffectRegistered { effect: id });
        Ok(id)
    }

    fn has_modifier(&self, target: EffectTarget, op: ModifierOp, result: ResultType) -> bool {
        self.effects.iter().any(|(_, e)| {
            e.target == target
                && e.modifier()
                    .map(|m| m.op == op && m.result == result)
                    .unwrap_or(false)
        })
    }

    /// All modifiers applicable to one roll of the given target.
    ///
    /// The target-kind check lives here: an army-scoped modifier never
    /// reaches an individual-unit roll and vice versa.
    pub fn active_effects_for(&self, target: EffectTarget, result: ResultType) -> Vec<&Effect> {
        let mut hits: Vec<&Effect> = self
            .effects
            .iter()
            .filter(|(_, e)| {
                e.target == target
                    && e.modifier().map(|m| m.result == result).unwrap_or(false)
            })
            .map(|(_, e)| e)
            .collect();
        hits.sort_by_key(|e| e.id);
        hits
    }

    /// Whether the target's ID results are suppressed (dragon plague)
    pub fn ignores_id(&self, target: EffectTarget) -> bool {
        self.effects
            .iter()
            .any(|(_, e)| e.target == target && matches!(e.kind, EffectKind::IgnoreId))
    }

    /// An active kill redirect for the target, if any
    pub fn kill_redirect(&self, target: EffectTarget) -> Option<crate::zones::Zone> {
        self.effects
            .iter()
            .find(|(_, e)| e.target == target && matches!(e.kind, EffectKind::KillToReserve))
            .map(|_| crate::zones::Zone::Reserve)
    }

    /// Purge effects that expire at the start of this player's turn.
    ///
    /// Idempotent: a second call in a row finds nothing left to expire.
    pub fn expire_at_turn_start(&mut self, tx: &mut TransactionLog, player: PlayerId) {
        self.expire_where(tx, |e| e.expiry == Expiry::OwnersNextTurn && e.owner == player);
    }

    /// Purge end-of-action effects, plus any army-scoped effect whose army
    /// stands empty now that the action is over. The zero-units check is
    /// only ever applied at this boundary.
    pub fn expire_at_action_end(&mut self, tx: &mut TransactionLog, zones: &ZoneStore) {
        self.expire_where(tx, |e| {
            if e.expiry == Expiry::EndOfAction {
                return true;
            }
            match e.target {
                EffectTarget::Army(army) => zones
                    .armies
                    .get(army)
                    .map(|a| a.units.is_empty())
                    .unwrap_or(true),
                EffectTarget::Unit(_) => false,
            }
        });
    }

    /// Purge until-re-rolled effects when their target rolls again
    pub fn expire_on_reroll(&mut self, tx: &mut TransactionLog, target: EffectTarget) {
        self.expire_where(tx, |e| e.expiry == Expiry::UntilRerolled && e.target == target);
    }

    /// Remove one effect by handle (spell dispels and the like)
    pub fn remove(&mut self, tx: &mut TransactionLog, id: EffectId) -> Result<()> {
        let effect = self
            .effects
            .remove(id)
            .ok_or(EngineError::EntityNotFound(id.as_u32()))?;
        tx.log(StoreAction::RemoveEffect {
            effect: Box::new(effect),
        });
        tx.queue_event(GameEvent::EffectExpired { effect: id });
        Ok(())
    }

    fn expire_where(&mut self, tx: &mut TransactionLog, pred: impl Fn(&Effect) -> bool) {
        let doomed: Vec<EffectId> = self
            .effects
            .ids()
            .into_iter()
            .filter(|id| self.effects.get(*id).map(|e| pred(e)).unwrap_or(false))
            .collect();
        for id in doomed {
            if let Some(effect) = self.effects.remove(id) {
                tx.log(StoreAction::RemoveEffect {
                    effect: Box::new(effect),
                });
                tx.queue_event(GameEvent::EffectExpired { effect: id });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn get(&self, id: EffectId) -> Result<&Effect> {
        self.effects.get(id)
    }

    // ---- rollback support --------------------------------------------

    pub(crate) fn insert_raw(&mut self, effect: Effect) {
        self.effects.insert(effect.id, effect);
    }

    pub(crate) fn remove_raw(&mut self, id: EffectId) {
        self.effects.remove(id);
    }
}

impl Default for EffectManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ArmyId, Modifier};

    fn subtract_melee(magnitude: u32) -> EffectKind {
        EffectKind::Modifier(Modifier {
            op: ModifierOp::Subtract,
            result: ResultType::Melee,
            magnitude,
        })
    }

    fn multiply_melee(magnitude: u32) -> EffectKind {
        EffectKind::Modifier(Modifier {
            op: ModifierOp::Multiply,
            result: ResultType::Melee,
            magnitude,
        })
    }

    #[test]
    fn test_second_multiply_rejected_first_subtract_survives() {
        let mut mgr = EffectManager::new();
        let mut tx = TransactionLog::new();
        let target = EffectTarget::Army(ArmyId::new(1));
        let owner = PlayerId::new(0);

        mgr.register(&mut tx, target, owner, subtract_melee(3), Expiry::OwnersNextTurn, "palsy")
            .unwrap();
        mgr.register(&mut tx, target, owner, multiply_melee(2), Expiry::OwnersNextTurn, "rage")
            .unwrap();

        let err = mgr
            .register(&mut tx, target, owner, multiply_melee(3), Expiry::OwnersNextTurn, "rage2")
            .unwrap_err();
        assert!(matches!(err, EngineError::RuleViolation(_)));

        // subtract and the first multiply remain
        assert_eq!(mgr.active_effects_for(target, ResultType::Melee).len(), 2);
    }

    #[test]
    fn test_multiply_cap_is_per_target() {
        let mut mgr = EffectManager::new();
        let mut tx = TransactionLog::new();
        let owner = PlayerId::new(0);

        mgr.register(
            &mut tx,
            EffectTarget::Army(ArmyId::new(1)),
            owner,
            multiply_melee(2),
            Expiry::Permanent,
            "a",
        )
        .unwrap();
        // Same op on a different army is fine
        mgr.register(
            &mut tx,
            EffectTarget::Army(ArmyId::new(2)),
            owner,
            multiply_melee(2),
            Expiry::Permanent,
            "b",
        )
        .unwrap();
        assert_eq!(mgr.len(), 2);
    }

    #[test]
    fn test_expire_at_turn_start_is_idempotent() {
        let mut mgr = EffectManager::new();
        let mut tx = TransactionLog::new();
        let target = EffectTarget::Army(ArmyId::new(1));
        let owner = PlayerId::new(0);

        mgr.register(&mut tx, target, owner, subtract_melee(1), Expiry::OwnersNextTurn, "x")
            .unwrap();
        mgr.register(&mut tx, target, PlayerId::new(1), subtract_melee(2), Expiry::OwnersNextTurn, "y")
            .unwrap();

        mgr.expire_at_turn_start(&mut tx, owner);
        assert_eq!(mgr.len(), 1);

        // Second run in a row: nothing left for this player, no errors
        mgr.expire_at_turn_start(&mut tx, owner);
        assert_eq!(mgr.len(), 1);
    }

    #[test]
    fn test_army_and_unit_scopes_are_disjoint() {
        let mut mgr = EffectManager::new();
        let mut tx = TransactionLog::new();
        let army_target = EffectTarget::Army(ArmyId::new(1));
        let unit_target = EffectTarget::Unit(crate::core::UnitId::new(9));
        let owner = PlayerId::new(0);

        mgr.register(&mut tx, army_target, owner, subtract_melee(1), Expiry::Permanent, "army-only")
            .unwrap();

        assert_eq!(mgr.active_effects_for(unit_target, ResultType::Melee).len(), 0);
        assert_eq!(mgr.active_effects_for(army_target, ResultType::Melee).len(), 1);
    }
}
