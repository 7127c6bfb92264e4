//! Dragon Attack Resolver
//!
//! During the marching player's Dragon Attack phase every dragon present
//! at a terrain with one of their armies attacks. Targeting follows the
//! element-compatibility matrix on `DragonComposition`; resolution runs a
//! fixed order: dragon rolls, breath against armies immediately, treasure,
//! the army's combined melee/missile/save response, all remaining damage
//! simultaneously, promotion on dragon kills, and finally dead or winged
//! dragons return to their Summoning Pools.

use crate::core::{
    ArmyId, DragonFace, DragonId, DragonLocation, EffectKind, EffectTarget, Element, Expiry,
    Modifier, ModifierOp, ResultType, RollPurpose, TerrainId, UnitId,
};
use crate::events::GameEvent;
use crate::game::resolver::{apply_casualties, apply_promotion_batch, cover_subset, PromotionPair};
use crate::game::roll::{resolve_roll, validate_roll, PendingRoll, RollContext};
use crate::game::GameState;
use crate::log_if_verbose;
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What one dragon ended up attacking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragonTarget {
    Dragon(DragonId),
    Army,
}

/// One dragon's reported roll: the first face plus any forced
/// re-roll-and-add chain (breath or tail against another dragon)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragonRoll {
    pub dragon: DragonId,
    pub faces: Vec<DragonFace>,
}

/// Everything the decision layer supplies for one terrain's dragon attacks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragonAttackInput {
    pub terrain: TerrainId,
    /// The marching player's army at this terrain
    pub army: ArmyId,
    /// One roll per attacking dragon
    pub rolls: Vec<DragonRoll>,
    /// Owner designations where the matrix leaves more than one dragon
    /// target (secret simultaneous designation, then reveal)
    pub target_choices: Vec<(DragonId, DragonId)>,
    /// Units the army owner gives up to breath (health-worth per breath)
    pub breath_casualties: Vec<UnitId>,
    /// Breath casualties that failed their fire-burial save roll
    pub buried_by_fire: Vec<UnitId>,
    /// The army's combined melee/missile/save response
    pub response_roll: Option<PendingRoll>,
    /// Units the army owner gives up to the remaining (non-breath) damage
    pub casualties: Vec<UnitId>,
    /// How the army's melee+missile results split among the dragons that
    /// attacked it
    pub damage_allocation: Vec<(DragonId, u32)>,
    /// Promotion batch earned by treasure or dragon kills
    pub promotions: Vec<PromotionPair>,
}

/// What the whole terrain's dragon attack did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragonPhaseOutcome {
    pub targets: Vec<(DragonId, DragonTarget)>,
    pub breath_kills: Vec<UnitId>,
    pub army_damage: u32,
    pub save_results: u32,
    pub treasure_count: u32,
    pub dragons_slain: Vec<DragonId>,
    pub dragons_winged: Vec<DragonId>,
    pub promoted: Vec<PromotionPair>,
}

/// Compute each present dragon's forced target.
///
/// A dragon that could attack more than one dragon needs an owner
/// designation; a dragon with no dragon target attacks the army.
pub fn determine_targets(
    game: &GameState,
    terrain: TerrainId,
    choices: &[(DragonId, DragonId)],
) -> Result<Vec<(DragonId, DragonTarget)>> {
    let present = game.dragons_at_terrain(terrain);
    let mut targets = Vec::with_capacity(present.len());

    for attacker_id in &present {
        let attacker = game.dragons.get(*attacker_id)?;
        let candidates: Vec<DragonId> = present
            .iter()
            .filter(|other| **other != *attacker_id)
            .filter(|other| {
                game.dragons
                    .get(**other)
                    .map(|d| attacker.composition.attacks_dragon(&d.composition))
                    .unwrap_or(false)
            })
            .copied()
            .collect();

        let target = match candidates.len() {
            0 => DragonTarget::Army,
            1 => DragonTarget::Dragon(candidates[0]),
            _ => {
                let chosen = choices
                    .iter()
                    .find(|(d, _)| d == attacker_id)
                    .map(|(_, t)| *t)
                    .ok_or_else(|| {
                        EngineError::Protocol(format!(
                            "dragon {attacker_id} can attack more than one dragon; a designation is required"
                        ))
                    })?;
                if !candidates.contains(&chosen) {
                    return Err(EngineError::Validation(format!(
                        "dragon {attacker_id} cannot attack the designated target"
                    )));
                }
                DragonTarget::Dragon(chosen)
            }
        };
        targets.push((*attacker_id, target));
    }
    Ok(targets)
}

/// Resolve every dragon attack at one terrain, transactionally.
pub fn resolve_dragon_attack(game: &mut GameState, input: DragonAttackInput) -> Result<DragonPhaseOutcome> {
    game.begin();
    let result = resolve_inner(game, input);
    match result {
        Ok(outcome) => {
            game.commit();
            Ok(outcome)
        }
        Err(err) => {
            game.rollback();
            Err(err)
        }
    }
}

fn resolve_inner(game: &mut GameState, input: DragonAttackInput) -> Result<DragonPhaseOutcome> {
    let army = game.zones.armies.get(input.army)?.clone();
    if army.terrain() != Some(input.terrain) {
        return Err(EngineError::Validation(
            "the army is not at the attacked terrain".to_string(),
        ));
    }
    if army.units.is_empty() {
        return Err(EngineError::EmptyArmy(input.army.as_u32()));
    }

    // Step 1: all attacking dragons roll. Targets first, so the chain
    // rules can be checked per roll.
    let targets = determine_targets(game, input.terrain, &input.target_choices)?;
    if targets.is_empty() {
        return Ok(empty_outcome());
    }
    validate_dragon_rolls(&input.rolls, &targets)?;

    // Membership before breath: units dead to breath still contribute
    // their previously-rolled results to the response roll, since all
    // physical dice hit the table at once.
    let pre_breath_units: Vec<UnitId> = army.units.iter().copied().collect();

    // Step 2: breath against the army resolves immediately.
    let (breath_health, fire_breathers, treasure_count) = tally_breath(game, &input.rolls, &targets)?;
    if breath_health > 0 {
        apply_casualties(game, input.army, breath_health, &input.breath_casualties)?;
        apply_breath_side_effects(game, &input, &targets, &fire_breathers)?;
    } else if !input.breath_casualties.is_empty() {
        return Err(EngineError::Validation(
            "no breath was rolled against the army".to_string(),
        ));
    }

    // Step 3: treasure promotion eligibility is tallied above; the batch
    // itself resolves at step 6 with any kill-earned promotions.

    // Step 4: the army's combined melee/missile/save response.
    let response = match &input.response_roll {
        Some(roll) => {
            let expected = RollPurpose::Combination(vec![
                ResultType::Melee,
                ResultType::Missile,
                ResultType::Save,
            ]);
            if roll.purpose != expected {
                return Err(EngineError::Validation(
                    "the response must be a combined melee/missile/save roll".to_string(),
                ));
            }
            validate_roll(roll, &pre_breath_units, &game.zones.units)?;
            let target = EffectTarget::Army(input.army);
            let ctx = RollContext {
                ignore_id: game.effects.ignores_id(target),
                double_id: false,
            };
            let outcome = resolve_roll(roll.clone(), target, &game.effects, &game.zones.units, ctx)?;
            game.effects.expire_on_reroll(&mut game.tx, target);
            Some(outcome)
        }
        None => None,
    };
    let save_results = response.as_ref().map(|r| r.get(ResultType::Save)).unwrap_or(0);
    let army_attack = response
        .as_ref()
        .map(|r| r.get(ResultType::Melee) + r.get(ResultType::Missile))
        .unwrap_or(0);

    // Step 5: all remaining damage lands simultaneously.
    let mut belly: BTreeMap<DragonId, bool> = BTreeMap::new();
    let mut winged: Vec<DragonId> = Vec::new();
    let mut army_damage: u32 = 0;
    let mut dragon_wounds: BTreeMap<DragonId, u32> = BTreeMap::new();

    for roll in &input.rolls {
        let target = target_of(&targets, roll.dragon);
        let shows_belly = roll.faces.iter().any(|f| f.is_belly());
        belly.insert(roll.dragon, shows_belly);
        if roll.faces.iter().any(|f| f.is_wing()) {
            winged.push(roll.dragon);
        }
        match target {
            DragonTarget::Army => {
                army_damage += roll
                    .faces
                    .iter()
                    .map(|f| f.army_damage() as u32)
                    .sum::<u32>();
            }
            DragonTarget::Dragon(victim) => {
                let dealt: u32 = roll.faces.iter().map(|f| f.dragon_damage() as u32).sum();
                *dragon_wounds.entry(victim).or_default() += dealt;
            }
        }
    }

    // The army's own results wound the dragons that attacked it.
    let army_targets: Vec<DragonId> = targets
        .iter()
        .filter(|(_, t)| *t == DragonTarget::Army)
        .map(|(d, _)| *d)
        .collect();
    let mut allocated: u32 = 0;
    for (dragon, amount) in &input.damage_allocation {
        if !army_targets.contains(dragon) {
            return Err(EngineError::Validation(format!(
                "dragon {dragon} did not attack the army and cannot be wounded by it"
            )));
        }
        allocated += amount;
        *dragon_wounds.entry(*dragon).or_default() += amount;
    }
    if allocated > army_attack {
        return Err(EngineError::Validation(format!(
            "allocated {allocated} damage but the response produced only {army_attack}"
        )));
    }

    let net_army_damage = army_damage.saturating_sub(save_results);
    apply_casualties(game, input.army, net_army_damage, &input.casualties)?;

    // Dragons apply their automatic saves unless their belly is showing.
    let mut dragons_slain: Vec<DragonId> = Vec::new();
    for (dragon_id, raw) in &dragon_wounds {
        let dragon = game.dragons.get(*dragon_id)?;
        let auto = dragon.automatic_saves(belly.get(dragon_id).copied().unwrap_or(false)) as u32;
        let wounds = raw.saturating_sub(auto);
        if wounds == 0 {
            continue;
        }
        let new_total = dragon.wounds.saturating_add(wounds.min(u8::MAX as u32) as u8);
        game.set_dragon_wounds(*dragon_id, new_total)?;
        if game.dragons.get(*dragon_id)?.is_dead() {
            dragons_slain.push(*dragon_id);
        }
    }

    // Step 6: promotion on dragon kill (and treasure).
    if input.promotions.len() as u32 > promotion_allowance(&dragons_slain, treasure_count) {
        return Err(EngineError::RuleViolation(
            "more promotions than dragon kills and treasure results allow".to_string(),
        ));
    }
    let promoted = apply_promotion_batch(game, input.army, &input.promotions)?;

    // Step 7: killed and winged dragons return to their Summoning Pools.
    for dragon_id in &dragons_slain {
        game.move_dragon(*dragon_id, DragonLocation::SummoningPool)?;
        game.set_dragon_wounds(*dragon_id, 0)?;
        game.tx.queue_event(GameEvent::DragonSlain {
            dragon: *dragon_id,
            at: input.terrain,
        });
        log_if_verbose!(game.logger, "dragon {} slain at terrain {}", dragon_id, input.terrain);
    }
    let mut dragons_winged = Vec::new();
    for dragon_id in winged {
        if dragons_slain.contains(&dragon_id) {
            continue;
        }
        game.move_dragon(dragon_id, DragonLocation::SummoningPool)?;
        game.set_dragon_wounds(dragon_id, 0)?;
        game.tx.queue_event(GameEvent::DragonWinged {
            dragon: dragon_id,
            at: input.terrain,
        });
        dragons_winged.push(dragon_id);
    }

    game.effects.expire_at_action_end(&mut game.tx, &game.zones);
    game.recheck_terrain_control(input.terrain)?;

    Ok(DragonPhaseOutcome {
        targets,
        breath_kills: input.breath_casualties.clone(),
        army_damage: net_army_damage,
        save_results,
        treasure_count,
        dragons_slain,
        dragons_winged,
        promoted,
    })
}

fn empty_outcome() -> DragonPhaseOutcome {
    DragonPhaseOutcome {
        targets: Vec::new(),
        breath_kills: Vec::new(),
        army_damage: 0,
        save_results: 0,
        treasure_count: 0,
        dragons_slain: Vec::new(),
        dragons_winged: Vec::new(),
        promoted: Vec::new(),
    }
}

fn target_of(targets: &[(DragonId, DragonTarget)], dragon: DragonId) -> DragonTarget {
    targets
        .iter()
        .find(|(d, _)| *d == dragon)
        .map(|(_, t)| *t)
        .unwrap_or(DragonTarget::Army)
}

/// Every dragon with a target needs exactly one roll; chains are only
/// legal against dragon targets and terminate on a non-chaining face.
fn validate_dragon_rolls(rolls: &[DragonRoll], targets: &[(DragonId, DragonTarget)]) -> Result<()> {
    for (dragon, target) in targets {
        let roll = rolls
            .iter()
            .find(|r| r.dragon == *dragon)
            .ok_or_else(|| EngineError::Validation(format!("dragon {dragon} has no reported roll")))?;
        if roll.faces.is_empty() {
            return Err(EngineError::Validation(format!(
                "dragon {dragon} reported an empty roll"
            )));
        }
        let (last, chain) = roll.faces.split_last().expect("non-empty");
        match target {
            DragonTarget::Army => {
                if roll.faces.len() != 1 {
                    return Err(EngineError::Validation(format!(
                        "dragon {dragon} attacks the army and rolls exactly once"
                    )));
                }
            }
            DragonTarget::Dragon(_) => {
                if !chain.iter().all(|f| f.chains_against_dragon()) {
                    return Err(EngineError::Validation(format!(
                        "dragon {dragon} re-rolled without a chaining face"
                    )));
                }
                if last.chains_against_dragon() {
                    return Err(EngineError::Validation(format!(
                        "dragon {dragon} ended its roll on a chaining face"
                    )));
                }
            }
        }
    }
    for roll in rolls {
        if !targets.iter().any(|(d, _)| *d == roll.dragon) {
            return Err(EngineError::Validation(format!(
                "dragon {} did not attack this turn",
                roll.dragon
            )));
        }
    }
    Ok(())
}

/// Health-worth the army must give up to breath, the fire-element
/// breathers for burial effects, and the treasure count.
fn tally_breath(
    game: &GameState,
    rolls: &[DragonRoll],
    targets: &[(DragonId, DragonTarget)],
) -> Result<(u32, Vec<DragonId>, u32)> {
    let mut health: u32 = 0;
    let mut fire_breathers = Vec::new();
    let mut treasure: u32 = 0;

    for roll in rolls {
        let target = target_of(targets, roll.dragon);
        for face in &roll.faces {
            match (face, target) {
                (DragonFace::Breath, DragonTarget::Army) => {
                    let dragon = game.dragons.get(roll.dragon)?;
                    // White breath brings the total to ten health-worth.
                    health += if dragon.composition == crate::core::DragonComposition::White {
                        10
                    } else {
                        5
                    };
                    let elements = dragon.composition.element_set();
                    if elements.contains(&Element::Fire) {
                        fire_breathers.push(roll.dragon);
                    }
                }
                (DragonFace::Treasure, DragonTarget::Army) => treasure += 1,
                _ => {}
            }
        }
    }
    Ok((health, fire_breathers, treasure))
}

/// Elemental side-effects of breath against an army, each registered as a
/// normal effect expiring at the beginning of the army owner's next turn.
fn apply_breath_side_effects(
    game: &mut GameState,
    input: &DragonAttackInput,
    targets: &[(DragonId, DragonTarget)],
    fire_breathers: &[DragonId],
) -> Result<()> {
    let army_owner = game.zones.armies.get(input.army)?.owner;
    let target = EffectTarget::Army(input.army);

    let mut elements: Vec<Element> = Vec::new();
    for roll in &input.rolls {
        if !roll.faces.contains(&DragonFace::Breath) {
            continue;
        }
        let dragon = game.dragons.get(roll.dragon)?;
        if target_of(targets, roll.dragon) != DragonTarget::Army {
            continue;
        }
        if dragon.composition == crate::core::DragonComposition::White {
            // Terrain empathy: both of the terrain's elements apply.
            let terrain = game.terrains.get(input.terrain)?;
            elements.extend(terrain.elements.iter().copied());
        } else {
            elements.extend(dragon.composition.element_set());
        }
    }

    for element in elements {
        let halved = |result: ResultType| {
            EffectKind::Modifier(Modifier {
                op: ModifierOp::Divide,
                result,
                magnitude: 2,
            })
        };
        let (kind, source) = match element {
            Element::Air => (halved(ResultType::Melee), "Lightning Bolt breath"),
            Element::Earth => (halved(ResultType::Maneuver), "Petrify breath"),
            Element::Water => (halved(ResultType::Missile), "Poisonous Cloud breath"),
            Element::Death => (EffectKind::IgnoreId, "Dragon Plague breath"),
            Element::Fire => continue, // handled below via burial
        };
        // A second breath of the same element hits the divide cap; the
        // duplicate changes nothing, so it is skipped rather than refused.
        match game
            .effects
            .register(&mut game.tx, target, army_owner, kind, Expiry::OwnersNextTurn, source)
        {
            Ok(_) => {}
            Err(EngineError::RuleViolation(_)) => {}
            Err(err) => return Err(err),
        }
    }

    // Dragon Fire: breath casualties that failed their save are buried.
    // A controlled Temple protects the owner's dead from burial.
    if !fire_breathers.is_empty() {
        if !input.buried_by_fire.is_empty()
            && game.player_controls_eighth_face(army_owner, crate::core::EighthFaceKind::Temple)
        {
            return Err(EngineError::RuleViolation(
                "units cannot be buried while their owner controls a Temple".to_string(),
            ));
        }
        for unit in &input.buried_by_fire {
            if !input.breath_casualties.contains(unit) {
                return Err(EngineError::Validation(format!(
                    "unit {unit} was not killed by breath and cannot be buried by it"
                )));
            }
            game.zones.bury(&mut game.tx, *unit)?;
        }
    } else if !input.buried_by_fire.is_empty() {
        return Err(EngineError::Validation(
            "no fire breath was rolled; nothing is buried".to_string(),
        ));
    }
    Ok(())
}

fn promotion_allowance(dragons_slain: &[DragonId], treasure_count: u32) -> u32 {
    if dragons_slain.is_empty() {
        treasure_count
    } else {
        // A dragon kill opens the whole army to promotion.
        u32::MAX
    }
}

/// Default breath casualty selection when the owner declines to choose:
/// weakest units first, covering the health-worth exactly when possible.
pub fn default_breath_casualties(game: &GameState, army: ArmyId, health: u32) -> Result<Vec<UnitId>> {
    let army = game.zones.armies.get(army)?;
    let units: Vec<(u32, UnitId)> = army
        .units
        .iter()
        .map(|u| game.zones.units.get(*u).map(|unit| (unit.max_health as u32, *u)))
        .collect::<Result<_>>()?;
    Ok(cover_subset(&units, health))
}
