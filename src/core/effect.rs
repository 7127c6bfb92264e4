//! Active effect records
//!
//! An Effect is a temporally-scoped modification attached to an army or a
//! single unit: a numeric modifier on one result type, a kill redirect, or
//! an ID-suppression. Effects are owned by the Effect Duration Manager;
//! this module is only the data model.

use crate::core::{ArmyId, EntityId, PlayerId, ResultType, UnitId};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type EffectId = EntityId<Effect>;

/// What an effect is attached to
///
/// Army-scoped modifiers never apply to an individual-unit roll and vice
/// versa; the pipeline checks this before applying anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectTarget {
    Army(ArmyId),
    Unit(UnitId),
}

/// Arithmetic applied to one result type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl fmt::Display for ModifierOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModifierOp::Add => "add",
            ModifierOp::Subtract => "subtract",
            ModifierOp::Multiply => "multiply",
            ModifierOp::Divide => "divide",
        };
        write!(f, "{s}")
    }
}

/// A numeric roll modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    pub op: ModifierOp,
    pub result: ResultType,
    pub magnitude: u32,
}

/// Non-arithmetic effect behaviors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    /// Shape a roll's result count
    Modifier(Modifier),
    /// Killed units go to the owner's Reserve Area instead of the DUA
    KillToReserve,
    /// The target ignores all of its ID results (dragon plague)
    IgnoreId,
}

/// When an effect tears itself down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expiry {
    /// At the beginning of the owning player's next turn
    OwnersNextTurn,
    /// At the end of the current action
    EndOfAction,
    /// The next time the target rolls
    UntilRerolled,
    /// Until some external condition removes it
    Permanent,
}

/// An active effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    /// Unique handle
    pub id: EffectId,

    /// What it is attached to
    pub target: EffectTarget,

    /// The player whose turn scopes `OwnersNextTurn` expiry (the affected
    /// player, not the caster)
    pub owner: PlayerId,

    /// Behavior
    pub kind: EffectKind,

    /// Expiry predicate
    pub expiry: Expiry,

    /// Where the effect came from, for stacking-rule checks and display
    pub source: String,
}

impl Effect {
    pub fn modifier(&self) -> Option<&Modifier> {
        match &self.kind {
            EffectKind::Modifier(m) => Some(m),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_accessor() {
        let effect = Effect {
            id: EffectId::new(0),
            target: EffectTarget::Army(ArmyId::new(1)),
            owner: PlayerId::new(0),
            kind: EffectKind::Modifier(Modifier {
                op: ModifierOp::Subtract,
                result: ResultType::Melee,
                magnitude: 3,
            }),
            expiry: Expiry::OwnersNextTurn,
            source: "Lightning Bolt breath".to_string(),
        };
        let m = effect.modifier().unwrap();
        assert_eq!(m.op, ModifierOp::Subtract);
        assert_eq!(m.magnitude, 3);

        let redirect = Effect {
            kind: EffectKind::KillToReserve,
            ..effect
        };
        assert!(redirect.modifier().is_none());
    }
}
