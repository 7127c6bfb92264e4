//! Roll Resolution Pipeline
//!
//! Takes one player-reported roll and shapes it into final per-type result
//! counts. The operation order is fixed and is the game's core fairness
//! guarantee:
//!
//! 1. tally raw action icons (ID excluded)
//! 2. non-modifier SAI resolutions
//! 3. ID / combination assignment (ID scales to unit health)
//! 4. add modifiers
//! 5. subtract modifiers (floor 0, non-ID consumed first)
//! 6. the single multiply modifier
//! 7. the single divide modifier (round down, non-ID consumed first)
//! 8. (ID-last consumption is folded into 5 and 7)
//! 9. automatic/innate save additions
//! 10. totals out, PendingRoll discarded
//!
//! All purpose-dependent icon shaping happens here and nowhere else.

use crate::core::{
    DieFace, EffectTarget, EntityStore, ModifierOp, ResultType, RollPurpose, Unit, UnitId,
};
use crate::game::effects::EffectManager;
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One reported die result: which unit rolled which face
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolledFace {
    pub unit: UnitId,
    pub face: DieFace,
}

/// The roller's interpretation pick for an ambiguous SAI
///
/// `index` points into `PendingRoll::results`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaiChoice {
    pub index: usize,
    pub result: ResultType,
}

/// The roller's split of one ID icon across a combination roll's counted
/// types. Allocations must sum to the unit's health.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdAssignment {
    pub index: usize,
    pub allocations: Vec<(ResultType, u32)>,
}

/// A transient value object: one submitted roll awaiting resolution.
/// Created at roll submission, consumed and discarded by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRoll {
    pub purpose: RollPurpose,
    pub results: Vec<RolledFace>,
    pub sai_choices: Vec<SaiChoice>,
    pub id_assignments: Vec<IdAssignment>,
}

impl PendingRoll {
    pub fn new(purpose: RollPurpose, results: Vec<RolledFace>) -> Self {
        PendingRoll {
            purpose,
            results,
            sai_choices: Vec::new(),
            id_assignments: Vec::new(),
        }
    }

    pub fn with_sai_choices(mut self, choices: Vec<SaiChoice>) -> Self {
        self.sai_choices = choices;
        self
    }

    pub fn with_id_assignments(mut self, assignments: Vec<IdAssignment>) -> Self {
        self.id_assignments = assignments;
        self
    }
}

/// Per-type counts split into ordinary and ID-derived portions.
///
/// Subtracts and divides consume the ordinary portion before touching the
/// ID-derived portion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Pool {
    normal: u32,
    id_derived: u32,
}

impl Pool {
    fn total(&self) -> u32 {
        self.normal + self.id_derived
    }

    fn subtract(&mut self, amount: u32) {
        let from_normal = amount.min(self.normal);
        self.normal -= from_normal;
        let remainder = amount - from_normal;
        self.id_derived = self.id_derived.saturating_sub(remainder);
    }

    fn scale(&mut self, factor: u32) {
        self.normal *= factor;
        self.id_derived *= factor;
    }

    fn divide(&mut self, divisor: u32) {
        let new_total = self.total() / divisor;
        let removed = self.total() - new_total;
        self.subtract(removed);
    }
}

/// Final result counts for one resolved roll
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollOutcome {
    totals: BTreeMap<ResultType, u32>,
}

impl RollOutcome {
    pub fn get(&self, result: ResultType) -> u32 {
        self.totals.get(&result).copied().unwrap_or(0)
    }

    pub fn sum(&self) -> u32 {
        self.totals.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResultType, u32)> + '_ {
        self.totals.iter().map(|(t, n)| (*t, *n))
    }
}

/// Check a submitted tally against the units that actually rolled.
///
/// Every reported face must belong to a unit in the rolling set, each unit
/// reports at most one face, and every referenced unit must exist.
pub fn validate_roll(roll: &PendingRoll, rolling_units: &[UnitId], units: &EntityStore<Unit>) -> Result<()> {
    let mut seen: Vec<UnitId> = Vec::with_capacity(roll.results.len());
    for reported in &roll.results {
        if !rolling_units.contains(&reported.unit) {
            return Err(EngineError::Validation(format!(
                "unit {} is not part of this roll",
                reported.unit
            )));
        }
        if seen.contains(&reported.unit) {
            return Err(EngineError::Validation(format!(
                "unit {} reported more than one face",
                reported.unit
            )));
        }
        let unit = units.get(reported.unit)?;
        if !unit.can_roll(&reported.face) {
            return Err(EngineError::Validation(format!(
                "unit {} has no face {}",
                unit.name, reported.face
            )));
        }
        seen.push(reported.unit);
    }
    Ok(())
}

/// Extra pipeline context beyond the roll itself
#[derive(Debug, Clone, Copy, Default)]
pub struct RollContext {
    /// ID results are suppressed (dragon plague)
    pub ignore_id: bool,
    /// ID results are doubled (vortex eighth face)
    pub double_id: bool,
}

/// Run the fixed pipeline. Consumes the PendingRoll.
pub fn resolve_roll(
    roll: PendingRoll,
    target: EffectTarget,
    effects: &EffectManager,
    units: &EntityStore<Unit>,
    ctx: RollContext,
) -> Result<RollOutcome> {
    let counted: Vec<ResultType> = roll.purpose.counted_types().to_vec();
    let mut pools: BTreeMap<ResultType, Pool> = counted.iter().map(|t| (*t, Pool::default())).collect();

    // Step 1: tally raw action icons, excluding ID
    for reported in &roll.results {
        if let DieFace::Icon { result, count } = reported.face {
            if let Some(pool) = pools.get_mut(&result) {
                pool.normal += count as u32;
            }
        }
    }

    // Step 2: SAI resolutions that are not modifiers. An SAI whose
    // interpretations leave exactly one counted option resolves itself;
    // more than one requires the roller's choice.
    for (index, reported) in roll.results.iter().enumerate() {
        let DieFace::Sai { kind, count } = reported.face else {
            continue;
        };
        let mut options: Vec<ResultType> = Vec::new();
        for t in &counted {
            for interp in kind.interpretations(*t) {
                if counted.contains(&interp) && !options.contains(&interp) {
                    options.push(interp);
                }
            }
        }
        let chosen = match options.len() {
            0 => continue,
            1 => options[0],
            _ => {
                let choice = roll
                    .sai_choices
                    .iter()
                    .find(|c| c.index == index)
                    .ok_or_else(|| {
                        EngineError::Validation(format!(
                            "SAI {kind} at index {index} is ambiguous and needs a choice"
                        ))
                    })?;
                if !options.contains(&choice.result) {
                    return Err(EngineError::Validation(format!(
                        "SAI {kind} cannot count as {}",
                        choice.result
                    )));
                }
                choice.result
            }
        };
        pools
            .get_mut(&chosen)
            .expect("chosen type is counted")
            .normal += count as u32;
    }

    // Step 3: ID icons generate whichever type is being rolled for, scaled
    // to the unit's health; combination rolls assign them explicitly.
    if !ctx.ignore_id {
        for (index, reported) in roll.results.iter().enumerate() {
            if !reported.face.is_id() {
                continue;
            }
            let health = units.get(reported.unit)?.max_health as u32;
            let generated = if ctx.double_id { health * 2 } else { health };
            match &roll.purpose {
                RollPurpose::Single(t) => {
                    pools.get_mut(t).expect("single type is counted").id_derived += generated;
                }
                RollPurpose::Combination(_) => {
                    let assignment = roll
                        .id_assignments
                        .iter()
                        .find(|a| a.index == index)
                        .ok_or_else(|| {
                            EngineError::Validation(format!(
                                "ID icon at index {index} needs an assignment in a combination roll"
                            ))
                        })?;
                    let allocated: u32 = assignment.allocations.iter().map(|(_, n)| n).sum();
                    if allocated != generated {
                        return Err(EngineError::Validation(format!(
                            "ID icon at index {index} must allocate exactly {generated} results"
                        )));
                    }
                    for (t, n) in &assignment.allocations {
                        let pool = pools.get_mut(t).ok_or_else(|| {
                            EngineError::Validation(format!(
                                "ID allocation to {t} which this roll does not count"
                            ))
                        })?;
                        pool.id_derived += n;
                    }
                }
            }
        }
    }

    // Steps 4-7: modifiers in fixed order. The manager has already
    // enforced the single-multiply / single-divide cap and the army/unit
    // scope split.
    for t in &counted {
        let applicable = effects.active_effects_for(target, *t);
        let pool = pools.get_mut(t).expect("counted");

        for op in [ModifierOp::Add, ModifierOp::Subtract, ModifierOp::Multiply, ModifierOp::Divide] {
            for effect in applicable.iter().filter(|e| e.modifier().map(|m| m.op == op).unwrap_or(false)) {
                let m = effect.modifier().expect("filtered to modifiers");
                match op {
                    ModifierOp::Add => pool.normal += m.magnitude,
                    ModifierOp::Subtract => pool.subtract(m.magnitude),
                    ModifierOp::Multiply => pool.scale(m.magnitude),
                    ModifierOp::Divide => pool.divide(m.magnitude),
                }
            }
        }
    }

    // Step 9: automatic save additions, after the caps, uncapped
    if counted.contains(&ResultType::Save) {
        for reported in &roll.results {
            let auto = units.get(reported.unit)?.auto_saves as u32;
            if auto > 0 {
                pools.get_mut(&ResultType::Save).expect("counted").normal += auto;
            }
        }
    }

    // Step 10: totals out; the PendingRoll dies here
    let totals = pools.into_iter().map(|(t, p)| (t, p.total())).collect();
    Ok(RollOutcome { totals })
}
