//! Action & Combat Resolver
//!
//! Orchestrates a single march action end to end: eligibility, roll
//! pipeline invocation, damage assignment, kills, promotion, and effect
//! side-effects. The resolver is transactional: either the whole action's
//! mutations commit, or a validation failure rewinds every one of them.

use crate::core::{
    ArmyId, ArmyLocation, EffectKind, EffectTarget, Modifier, PlayerId, ResultType, RollPurpose,
    SpellId, TerrainFaceIcon, UnitId,
};
use crate::events::GameEvent;
use crate::game::roll::{resolve_roll, validate_roll, PendingRoll, RollContext, RollOutcome};
use crate::game::GameState;
use crate::loader::{ReferenceData, SpellEffectDef};
use crate::log_if_verbose;
use crate::zones::Zone;
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// The three army actions a march can take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Melee,
    Missile,
    Magic,
}

impl ActionKind {
    pub fn result_type(&self) -> ResultType {
        match self {
            ActionKind::Melee => ResultType::Melee,
            ActionKind::Missile => ResultType::Missile,
            ActionKind::Magic => ResultType::Magic,
        }
    }
}

/// One spell cast out of a magic action's results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellCast {
    pub spell: SpellId,
    pub target: EffectTarget,
    /// Save roll of the targeted unit or army, when the spell allows one
    pub save_roll: Option<PendingRoll>,
}

/// A promotion pair: the army unit retiring and its one-size-larger
/// replacement from the DUA (or Summoning Pool for Dragonkin)
pub type PromotionPair = (UnitId, UnitId);

/// Everything the decision layer supplies for one action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionInput {
    pub acting_army: ArmyId,
    pub kind: ActionKind,
    pub attacker_roll: PendingRoll,
    /// Defending army for melee and missile
    pub target: Option<ArmyId>,
    /// The defender's save roll (melee/missile)
    pub defender_save_roll: Option<PendingRoll>,
    /// Defender's chosen dead units covering the net damage
    pub casualties: Vec<UnitId>,
    /// Attacker's promotion batch after the kills
    pub promotions: Vec<PromotionPair>,
    /// Spells cast from a magic action's results
    pub spells: Vec<SpellCast>,
}

/// What one resolved action did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub attack_results: u32,
    pub save_results: u32,
    pub net_damage: u32,
    pub killed: Vec<UnitId>,
    pub promoted: Vec<PromotionPair>,
}

/// Decision input for one march maneuver attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManeuverInput {
    pub army: ArmyId,
    /// Turn the terrain die up or down on success
    pub turn_up: bool,
    pub maneuver_roll: PendingRoll,
    /// A defending army's counter-maneuver, if contested
    pub counter: Option<(ArmyId, PendingRoll)>,
}

/// Result of a maneuver attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManeuverOutcome {
    pub succeeded: bool,
    pub maneuver_results: u32,
    pub counter_results: u32,
    pub new_face: u8,
    pub captured: bool,
}

// ---- public operations ------------------------------------------------

/// Resolve a full action transactionally.
///
/// On any validation failure the Zone Store is left exactly as it was and
/// the caller may resubmit.
pub fn resolve_action(game: &mut GameState, refdata: &ReferenceData, input: ActionInput) -> Result<ActionOutcome> {
    game.begin();
    let result = resolve_action_inner(game, refdata, input);
    finish(game, result)
}

/// Resolve a maneuver attempt (and any counter-maneuver) transactionally.
pub fn resolve_maneuver(game: &mut GameState, input: ManeuverInput) -> Result<ManeuverOutcome> {
    game.begin();
    let result = resolve_maneuver_inner(game, input);
    finish(game, result)
}

/// Eighth-face City turn: recruit a 1-health unit from the DUA and/or
/// promote one army unit.
pub fn resolve_city_turn(
    game: &mut GameState,
    army: ArmyId,
    recruit: Option<UnitId>,
    promotion: Option<PromotionPair>,
) -> Result<()> {
    game.begin();
    let result = resolve_city_turn_inner(game, army, recruit, promotion);
    finish(game, result)
}

/// Reserves phase: move reserve units into armies at terrains.
pub fn resolve_reinforce(game: &mut GameState, moves: Vec<(UnitId, ArmyId)>) -> Result<()> {
    game.begin();
    let result = (|| {
        for (unit, army) in &moves {
            if game.zones.zone_of(*unit)? != Zone::Reserve {
                return Err(EngineError::Validation(format!(
                    "unit {unit} is not in the Reserve Area"
                )));
            }
            let target = game.zones.armies.get(*army)?;
            let owner = game.zones.units.get(*unit)?.owner;
            if target.owner != owner {
                return Err(EngineError::Validation(format!(
                    "unit {unit} cannot reinforce another player's army"
                )));
            }
            if target.terrain().is_none() {
                return Err(EngineError::Validation(format!(
                    "army {army} is not at a terrain"
                )));
            }
            game.zones.move_unit(&mut game.tx, *unit, Zone::Army(*army))?;
            game.tx.queue_event(GameEvent::UnitMoved { unit: *unit });
        }
        Ok(())
    })();
    finish(game, result)
}

/// Reserves phase: pull whole armies at terrains back into Reserve.
pub fn resolve_retreat(game: &mut GameState, armies: Vec<ArmyId>) -> Result<()> {
    game.begin();
    let result = (|| {
        for army_id in &armies {
            let army = game.zones.armies.get(*army_id)?;
            let Some(terrain) = army.terrain() else {
                return Err(EngineError::Validation(format!(
                    "army {army_id} is already in Reserve"
                )));
            };
            let units: Vec<UnitId> = army.units.iter().copied().collect();
            for unit in units {
                game.zones.move_unit(&mut game.tx, unit, Zone::Reserve)?;
                game.tx.queue_event(GameEvent::UnitMoved { unit });
            }
            game.recheck_terrain_control(terrain)?;
        }
        Ok(())
    })();
    finish(game, result)
}

fn finish<T>(game: &mut GameState, result: Result<T>) -> Result<T> {
    match result {
        Ok(value) => {
            game.commit();
            Ok(value)
        }
        Err(err) => {
            game.rollback();
            Err(err)
        }
    }
}

// ---- action internals -------------------------------------------------

fn resolve_action_inner(
    game: &mut GameState,
    refdata: &ReferenceData,
    input: ActionInput,
) -> Result<ActionOutcome> {
    let army = game.zones.armies.get(input.acting_army)?;
    if army.units.is_empty() {
        return Err(EngineError::EmptyArmy(input.acting_army.as_u32()));
    }
    check_action_eligibility(game, input.acting_army, input.kind)?;

    let expected = RollPurpose::Single(input.kind.result_type());
    if input.attacker_roll.purpose != expected {
        return Err(EngineError::Validation(format!(
            "attacker roll purpose does not match a {} action",
            input.kind.result_type()
        )));
    }

    let attack = run_army_roll(game, input.acting_army, input.attacker_roll.clone())?;
    let attack_results = attack.get(input.kind.result_type());
    log_if_verbose!(
        game.logger,
        "army {} rolled {} {} results",
        input.acting_army,
        attack_results,
        input.kind.result_type()
    );

    let mut outcome = match input.kind {
        ActionKind::Melee | ActionKind::Missile => resolve_combat_damage(game, &input, attack_results)?,
        ActionKind::Magic => {
            let killed = resolve_magic(game, refdata, &input, attack_results)?;
            ActionOutcome {
                attack_results,
                save_results: 0,
                net_damage: 0,
                killed,
                promoted: Vec::new(),
            }
        }
    };

    // Promotion is a single batch after a kill-triggering event. Matches
    // are fixed against the pre-exchange state, so a replacement cannot
    // be re-matched within the same batch.
    if outcome.killed.is_empty() && !input.promotions.is_empty() {
        return Err(EngineError::RuleViolation(
            "promotion requires a kill-triggering event".to_string(),
        ));
    }
    outcome.promoted = apply_promotion_batch(game, input.acting_army, &input.promotions)?;

    game.set_army_acted(input.acting_army, true)?;

    // Damage markers are transient: anything not lethal clears now.
    clear_surviving_damage(game, input.target)?;

    game.effects.expire_at_action_end(&mut game.tx, &game.zones);

    if let Some(defender) = input.target {
        if let Some(terrain) = game.zones.armies.get(defender)?.terrain() {
            game.recheck_terrain_control(terrain)?;
        }
    }

    game.tx.queue_event(GameEvent::ActionResolved {
        army: input.acting_army,
        damage_dealt: outcome.net_damage,
        units_killed: outcome.killed.len() as u32,
    });

    Ok(outcome)
}

/// Which actions the acting army's location allows.
///
/// The controller of an eighth-face terrain may take any action. Below
/// the eighth face the terrain's icon names the action, with melee always
/// available to armies locked in at the same terrain. Armies in Reserve
/// may only channel magic.
fn check_action_eligibility(game: &GameState, army_id: ArmyId, kind: ActionKind) -> Result<()> {
    let army = game.zones.armies.get(army_id)?;
    match army.location {
        ArmyLocation::Reserve => {
            if kind != ActionKind::Magic {
                return Err(EngineError::RuleViolation(
                    "an army in Reserve may only take a magic action".to_string(),
                ));
            }
            Ok(())
        }
        ArmyLocation::Terrain(terrain_id) => {
            let terrain = game.terrains.get(terrain_id)?;
            if terrain.eighth_face_active() && terrain.controller == Some(army.owner) {
                return Ok(());
            }
            let allowed = match terrain.current_icon() {
                Some(TerrainFaceIcon::Melee) | Some(TerrainFaceIcon::Maneuver) | None => {
                    kind == ActionKind::Melee
                }
                Some(TerrainFaceIcon::Missile) => matches!(kind, ActionKind::Missile | ActionKind::Melee),
                Some(TerrainFaceIcon::Magic) => matches!(kind, ActionKind::Magic | ActionKind::Melee),
            };
            if !allowed {
                return Err(EngineError::RuleViolation(format!(
                    "terrain face {} does not allow a {} action",
                    terrain.face,
                    kind.result_type()
                )));
            }
            Ok(())
        }
    }
}

/// Melee reaches only the attacker's own terrain. Missile does too,
/// unless the attacker stands on a Tower it controls at the eighth face,
/// which ranges every terrain.
fn check_target_range(
    game: &GameState,
    attacker_id: ArmyId,
    defender_id: ArmyId,
    kind: ActionKind,
) -> Result<()> {
    let attacker = game.zones.armies.get(attacker_id)?;
    let defender = game.zones.armies.get(defender_id)?;
    let Some(defender_terrain) = defender.terrain() else {
        return Err(EngineError::Validation(
            "an army in Reserve cannot be attacked".to_string(),
        ));
    };
    if attacker.terrain() == Some(defender_terrain) {
        return Ok(());
    }
    let tower_ranged = kind == ActionKind::Missile
        && attacker
            .terrain()
            .and_then(|t| game.terrains.get(t).ok())
            .map(|t| {
                t.eighth_face_active()
                    && t.controller == Some(attacker.owner)
                    && t.eighth_face == crate::core::EighthFaceKind::Tower
            })
            .unwrap_or(false);
    if !tower_ranged {
        return Err(EngineError::Validation(format!(
            "army {defender_id} is out of range for a {} action",
            kind.result_type()
        )));
    }
    Ok(())
}

/// Validate and run one army roll through the pipeline, then consume any
/// until-re-rolled effects on that army.
pub(crate) fn run_army_roll(game: &mut GameState, army_id: ArmyId, roll: PendingRoll) -> Result<RollOutcome> {
    let army = game.zones.armies.get(army_id)?;
    let rolling: Vec<UnitId> = army.units.iter().copied().collect();
    validate_roll(&roll, &rolling, &game.zones.units)?;

    let target = EffectTarget::Army(army_id);
    let ctx = roll_context(game, army_id, target)?;
    let outcome = resolve_roll(roll, target, &game.effects, &game.zones.units, ctx)?;

    game.effects.expire_on_reroll(&mut game.tx, target);
    Ok(outcome)
}

fn roll_context(game: &GameState, army_id: ArmyId, target: EffectTarget) -> Result<RollContext> {
    let army = game.zones.armies.get(army_id)?;
    let double_id = match army.terrain() {
        Some(terrain_id) => {
            let terrain = game.terrains.get(terrain_id)?;
            terrain.eighth_face_active()
                && terrain.controller == Some(army.owner)
                && terrain.eighth_face == crate::core::EighthFaceKind::Vortex
        }
        None => false,
    };
    Ok(RollContext {
        ignore_id: game.effects.ignores_id(target),
        double_id,
    })
}

fn resolve_combat_damage(
    game: &mut GameState,
    input: &ActionInput,
    attack_results: u32,
) -> Result<ActionOutcome> {
    let defender_id = input.target.ok_or_else(|| {
        EngineError::Validation("a melee or missile action needs a target army".to_string())
    })?;
    if defender_id == input.acting_army {
        return Err(EngineError::Validation("an army cannot target itself".to_string()));
    }
    let defender = game.zones.armies.get(defender_id)?;
    if defender.units.is_empty() {
        return Err(EngineError::EmptyArmy(defender_id.as_u32()));
    }
    check_target_range(game, input.acting_army, defender_id, input.kind)?;

    // Army-target attacks grant the save roll to the whole army.
    let save_results = match &input.defender_save_roll {
        Some(roll) => {
            if roll.purpose != RollPurpose::Single(ResultType::Save) {
                return Err(EngineError::Validation(
                    "the defender's roll must be a save roll".to_string(),
                ));
            }
            run_army_roll(game, defender_id, roll.clone())?.get(ResultType::Save)
        }
        None => 0,
    };

    let net = attack_results.saturating_sub(save_results);
    apply_casualties(game, defender_id, net, &input.casualties)?;

    Ok(ActionOutcome {
        attack_results,
        save_results,
        net_damage: net,
        killed: input.casualties.clone(),
        promoted: Vec::new(),
    })
}

/// Check the defender's chosen dead against the exact-cover rule and kill
/// them.
///
/// The summed health must cover the net damage exactly when possible, and
/// otherwise equal the minimal achievable overshoot.
pub(crate) fn apply_casualties(
    game: &mut GameState,
    defender_id: ArmyId,
    net: u32,
    casualties: &[UnitId],
) -> Result<()> {
    let defender = game.zones.armies.get(defender_id)?.clone();

    if net == 0 {
        if !casualties.is_empty() {
            return Err(EngineError::Validation(
                "no damage was dealt, so no units may be selected".to_string(),
            ));
        }
        return Ok(());
    }

    let mut chosen_health: u32 = 0;
    let mut seen: Vec<UnitId> = Vec::new();
    for unit_id in casualties {
        if seen.contains(unit_id) {
            return Err(EngineError::Validation(format!(
                "unit {unit_id} selected twice"
            )));
        }
        if !defender.units.contains(unit_id) {
            return Err(EngineError::Validation(format!(
                "unit {unit_id} is not in the defending army"
            )));
        }
        chosen_health += game.zones.units.get(*unit_id)?.max_health as u32;
        seen.push(*unit_id);
    }

    let all_healths: Vec<u32> = defender
        .units
        .iter()
        .map(|u| game.zones.units.get(*u).map(|unit| unit.max_health as u32))
        .collect::<Result<_>>()?;
    let required = minimal_cover(&all_healths, net);

    if chosen_health != required {
        return Err(EngineError::Validation(format!(
            "selected {chosen_health} health for {net} damage; the minimal legal cover is {required}"
        )));
    }

    let redirect = game.effects.kill_redirect(EffectTarget::Army(defender_id));
    for unit_id in casualties {
        let health = game.zones.units.get(*unit_id)?.max_health;
        game.zones.set_unit_damage(&mut game.tx, *unit_id, health)?;
        game.zones.kill(&mut game.tx, *unit_id, redirect)?;
    }
    Ok(())
}

/// The smallest achievable summed health >= `net` over any subset of the
/// army. Classic subset-sum over the (small) total health of the army.
pub(crate) fn minimal_cover(healths: &[u32], net: u32) -> u32 {
    let total: u32 = healths.iter().sum();
    if total <= net {
        return total;
    }
    let mut reachable = vec![false; (total + 1) as usize];
    reachable[0] = true;
    for h in healths {
        for sum in (*h..=total).rev() {
            if reachable[(sum - h) as usize] {
                reachable[sum as usize] = true;
            }
        }
    }
    (net..=total)
        .find(|sum| reachable[*sum as usize])
        .unwrap_or(total)
}

/// A concrete unit subset whose health sums to exactly the minimal cover.
/// Subset-sum with parent tracking; used where no player selection
/// applies (army-target spell damage, dragon breath).
pub(crate) fn cover_subset(units: &[(u32, UnitId)], net: u32) -> Vec<UnitId> {
    if net == 0 {
        return Vec::new();
    }
    let healths: Vec<u32> = units.iter().map(|(h, _)| *h).collect();
    let total: u32 = healths.iter().sum();
    if total <= net {
        return units.iter().map(|(_, u)| *u).collect();
    }
    let target = minimal_cover(&healths, net);

    // chooser[sum] = index of the last unit used to reach `sum`
    let mut chooser: Vec<Option<usize>> = vec![None; (total + 1) as usize];
    let mut reachable = vec![false; (total + 1) as usize];
    reachable[0] = true;
    for (idx, h) in healths.iter().enumerate() {
        for sum in (*h..=total).rev() {
            if reachable[(sum - h) as usize] && !reachable[sum as usize] {
                reachable[sum as usize] = true;
                chooser[sum as usize] = Some(idx);
            }
        }
    }

    let mut chosen = Vec::new();
    let mut sum = target;
    while sum > 0 {
        let idx = chooser[sum as usize].expect("reachable sums have a chooser chain");
        chosen.push(units[idx].1);
        sum -= healths[idx];
    }
    chosen
}

/// Validate the whole promotion batch against the pre-exchange state and
/// apply it.
pub(crate) fn apply_promotion_batch(
    game: &mut GameState,
    army_id: ArmyId,
    promotions: &[PromotionPair],
) -> Result<Vec<PromotionPair>> {
    if promotions.is_empty() {
        return Ok(Vec::new());
    }
    let army = game.zones.armies.get(army_id)?.clone();

    let mut retired_seen: Vec<UnitId> = Vec::new();
    let mut replacement_seen: Vec<UnitId> = Vec::new();
    for (retired, replacement) in promotions {
        if retired_seen.contains(retired) || replacement_seen.contains(replacement) {
            return Err(EngineError::RuleViolation(
                "a unit may appear only once in a promotion batch".to_string(),
            ));
        }
        if !army.units.contains(retired) {
            return Err(EngineError::Validation(format!(
                "unit {retired} is not in the promoting army"
            )));
        }
        let small = game.zones.units.get(*retired)?;
        let big = game.zones.units.get(*replacement)?;
        if small.owner != big.owner {
            return Err(EngineError::RuleViolation(
                "promotion matches come from the owner's own DUA".to_string(),
            ));
        }
        if small.species != big.species {
            return Err(EngineError::RuleViolation(format!(
                "promotion must stay within the species ({} vs {})",
                small.species, big.species
            )));
        }
        if big.max_health != small.max_health + 1 {
            return Err(EngineError::RuleViolation(format!(
                "promotion must be to a unit exactly one size larger ({} -> {})",
                small.max_health, big.max_health
            )));
        }
        let source = game.zones.zone_of(*replacement)?;
        let allowed = match source {
            Zone::Dua => true,
            Zone::SummoningPool => small.species.is_dragonkin(),
            _ => false,
        };
        if !allowed {
            return Err(EngineError::RuleViolation(format!(
                "replacement {replacement} has no eligible DUA match"
            )));
        }
        retired_seen.push(*retired);
        replacement_seen.push(*replacement);
    }

    // Matches fixed; now exchange.
    for (retired, replacement) in promotions {
        game.zones.promote(&mut game.tx, *retired, *replacement)?;
    }
    Ok(promotions.to_vec())
}

fn clear_surviving_damage(game: &mut GameState, target: Option<ArmyId>) -> Result<()> {
    let Some(army_id) = target else {
        return Ok(());
    };
    let units: Vec<UnitId> = game.zones.armies.get(army_id)?.units.iter().copied().collect();
    for unit in units {
        if game.zones.units.get(unit)?.damage > 0 {
            game.zones.set_unit_damage(&mut game.tx, unit, 0)?;
        }
    }
    Ok(())
}

// ---- magic ------------------------------------------------------------

fn resolve_magic(
    game: &mut GameState,
    refdata: &ReferenceData,
    input: &ActionInput,
    magic_results: u32,
) -> Result<Vec<UnitId>> {
    // A Standing Stones eighth face lets the army's magic count as any
    // element; otherwise the spell's element must be present in the army.
    let caster = game.zones.armies.get(input.acting_army)?;
    let any_element = caster
        .terrain()
        .and_then(|t| game.terrains.get(t).ok())
        .map(|t| {
            t.eighth_face_active()
                && t.controller == Some(caster.owner)
                && t.eighth_face == crate::core::EighthFaceKind::StandingStones
        })
        .unwrap_or(false);
    let army_elements: Vec<crate::core::Element> = caster
        .units
        .iter()
        .filter_map(|u| game.zones.units.get(*u).ok())
        .flat_map(|u| u.elements.iter().copied())
        .collect();

    let mut spent: u32 = 0;
    for cast in &input.spells {
        let def = refdata.spell_definition(&cast.spell)?;
        spent += def.cost as u32;
        if !any_element && !army_elements.contains(&def.element) {
            return Err(EngineError::RuleViolation(format!(
                "the army has no {} units to channel {}",
                def.element, def.name
            )));
        }
    }
    if spent > magic_results {
        return Err(EngineError::Validation(format!(
            "spells cost {spent} but the roll produced only {magic_results} magic"
        )));
    }

    let mut killed = Vec::new();
    for cast in &input.spells {
        let def = refdata.spell_definition(&cast.spell)?.clone();
        match def.effect {
            SpellEffectDef::Damage { amount } => {
                killed.extend(resolve_spell_damage(game, cast, amount, def.no_save)?);
            }
            SpellEffectDef::Modifier {
                op,
                result,
                magnitude,
                expiry,
            } => {
                let owner = effect_owner(game, cast.target)?;
                game.effects.register(
                    &mut game.tx,
                    cast.target,
                    owner,
                    EffectKind::Modifier(Modifier { op, result, magnitude }),
                    expiry,
                    def.name.clone(),
                )?;
            }
            SpellEffectDef::KillToReserve { expiry } => {
                let owner = effect_owner(game, cast.target)?;
                game.effects.register(
                    &mut game.tx,
                    cast.target,
                    owner,
                    EffectKind::KillToReserve,
                    expiry,
                    def.name.clone(),
                )?;
            }
        }
        log_if_verbose!(game.logger, "cast {} ({} magic)", def.name, def.cost);
    }
    Ok(killed)
}

/// The player whose next turn scopes the effect's expiry: the one the
/// effect lands on.
fn effect_owner(game: &GameState, target: EffectTarget) -> Result<PlayerId> {
    match target {
        EffectTarget::Army(army) => Ok(game.zones.armies.get(army)?.owner),
        EffectTarget::Unit(unit) => Ok(game.zones.units.get(unit)?.owner),
    }
}

/// Individual-target spells grant the save roll only to the targeted
/// unit; army-target spells grant it to the whole army.
fn resolve_spell_damage(
    game: &mut GameState,
    cast: &SpellCast,
    amount: u8,
    no_save: bool,
) -> Result<Vec<UnitId>> {
    match cast.target {
        EffectTarget::Unit(unit_id) => {
            let unit = game.zones.units.get(unit_id)?.clone();
            let Zone::Army(army_id) = game.zones.zone_of(unit_id)? else {
                return Err(EngineError::Validation(format!(
                    "unit {unit_id} is not in an army and cannot be targeted"
                )));
            };

            let saves = match (&cast.save_roll, no_save) {
                (_, true) | (None, _) => 0,
                (Some(roll), false) => {
                    if roll.purpose != RollPurpose::Single(ResultType::Save) {
                        return Err(EngineError::Validation(
                            "the targeted unit's roll must be a save roll".to_string(),
                        ));
                    }
                    validate_roll(roll, &[unit_id], &game.zones.units)?;
                    let target = EffectTarget::Unit(unit_id);
                    let ctx = RollContext {
                        ignore_id: game.effects.ignores_id(target),
                        double_id: false,
                    };
                    let outcome =
                        resolve_roll(roll.clone(), target, &game.effects, &game.zones.units, ctx)?;
                    game.effects.expire_on_reroll(&mut game.tx, target);
                    outcome.get(ResultType::Save)
                }
            };

            let net = (amount as u32).saturating_sub(saves);
            if net >= unit.max_health as u32 {
                let redirect = game.effects.kill_redirect(EffectTarget::Army(army_id));
                game.zones.set_unit_damage(&mut game.tx, unit_id, unit.max_health)?;
                game.zones.kill(&mut game.tx, unit_id, redirect)?;
                Ok(vec![unit_id])
            } else {
                // Damage below health leaves no persistent effect.
                Ok(Vec::new())
            }
        }
        EffectTarget::Army(army_id) => {
            let saves = match (&cast.save_roll, no_save) {
                (_, true) | (None, _) => 0,
                (Some(roll), false) => {
                    if roll.purpose != RollPurpose::Single(ResultType::Save) {
                        return Err(EngineError::Validation(
                            "the army's roll must be a save roll".to_string(),
                        ));
                    }
                    run_army_roll(game, army_id, roll.clone())?.get(ResultType::Save)
                }
            };
            let net = (amount as u32).saturating_sub(saves);
            // The caster's input cannot know the save outcome in advance,
            // so army damage spells cover the net weakest-first.
            let army = game.zones.armies.get(army_id)?;
            let units: Vec<(u32, UnitId)> = army
                .units
                .iter()
                .map(|u| game.zones.units.get(*u).map(|unit| (unit.max_health as u32, *u)))
                .collect::<Result<_>>()?;
            let casualties = cover_subset(&units, net);
            apply_casualties(game, army_id, net, &casualties)?;
            Ok(casualties)
        }
    }
}

// ---- maneuver ---------------------------------------------------------

fn resolve_maneuver_inner(game: &mut GameState, input: ManeuverInput) -> Result<ManeuverOutcome> {
    let army = game.zones.armies.get(input.army)?.clone();
    if army.units.is_empty() {
        return Err(EngineError::EmptyArmy(input.army.as_u32()));
    }
    let Some(terrain_id) = army.terrain() else {
        return Err(EngineError::Validation(
            "an army in Reserve cannot maneuver".to_string(),
        ));
    };

    if input.maneuver_roll.purpose != RollPurpose::Single(ResultType::Maneuver) {
        return Err(EngineError::Validation(
            "the maneuver roll must count maneuver results".to_string(),
        ));
    }
    let maneuver_results = run_army_roll(game, input.army, input.maneuver_roll.clone())?.get(ResultType::Maneuver);

    let counter_results = match &input.counter {
        Some((counter_army_id, roll)) => {
            let counter_army = game.zones.armies.get(*counter_army_id)?;
            if counter_army.terrain() != Some(terrain_id) {
                return Err(EngineError::Validation(
                    "only an army at the same terrain may counter-maneuver".to_string(),
                ));
            }
            if counter_army.owner == army.owner {
                return Err(EngineError::Validation(
                    "a counter-maneuver must come from a defending army".to_string(),
                ));
            }
            if roll.purpose != RollPurpose::Single(ResultType::Maneuver) {
                return Err(EngineError::Validation(
                    "the counter-maneuver roll must count maneuver results".to_string(),
                ));
            }
            run_army_roll(game, *counter_army_id, roll.clone())?.get(ResultType::Maneuver)
        }
        None => 0,
    };

    // The maneuvering army succeeds on ties.
    let succeeded = maneuver_results >= counter_results;
    let terrain = game.terrains.get(terrain_id)?;
    let mut new_face = terrain.face;
    let mut captured = false;

    if succeeded {
        new_face = if input.turn_up {
            (terrain.face + 1).min(8)
        } else {
            (terrain.face - 1).max(1)
        };
        game.set_terrain_face(terrain_id, new_face)?;
        if new_face == 8 {
            game.set_terrain_controller(terrain_id, Some(army.owner))?;
            captured = true;
        }
        game.tx.queue_event(GameEvent::ManeuverResolved {
            terrain: terrain_id,
            new_face,
        });
    }

    Ok(ManeuverOutcome {
        succeeded,
        maneuver_results,
        counter_results,
        new_face,
        captured,
    })
}

// ---- eighth face ------------------------------------------------------

fn resolve_city_turn_inner(
    game: &mut GameState,
    army_id: ArmyId,
    recruit: Option<UnitId>,
    promotion: Option<PromotionPair>,
) -> Result<()> {
    let army = game.zones.armies.get(army_id)?.clone();
    let Some(terrain_id) = army.terrain() else {
        return Err(EngineError::Validation(
            "only an army at a terrain can use a City".to_string(),
        ));
    };
    let terrain = game.terrains.get(terrain_id)?;
    if !(terrain.eighth_face_active()
        && terrain.controller == Some(army.owner)
        && terrain.eighth_face == crate::core::EighthFaceKind::City)
    {
        return Err(EngineError::RuleViolation(
            "the army does not control a City eighth face".to_string(),
        ));
    }

    if let Some(unit_id) = recruit {
        let unit = game.zones.units.get(unit_id)?;
        if unit.owner != army.owner {
            return Err(EngineError::Validation(format!(
                "unit {unit_id} belongs to another player"
            )));
        }
        if unit.max_health != 1 {
            return Err(EngineError::RuleViolation(
                "a City recruits only small (1-health) units".to_string(),
            ));
        }
        game.zones.recruit(&mut game.tx, unit_id, army_id)?;
    }

    if let Some(pair) = promotion {
        apply_promotion_batch(game, army_id, &[pair])?;
    }
    Ok(())
}
