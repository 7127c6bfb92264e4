//! End-to-end tests for the Dragon Attack Resolver

use dragon_dice_rs::core::{
    ArmyLocation, DieFace, DragonFace, DragonLocation, DragonTypeId, ResultType, RollPurpose,
    TerrainTypeId, UnitTypeId,
};
use dragon_dice_rs::events::GameEvent;
use dragon_dice_rs::game::{
    resolve_dragon_attack, DragonAttackInput, DragonRoll, GameState, IdAssignment, PendingRoll,
    RolledFace,
};
use dragon_dice_rs::loader::ReferenceData;
use dragon_dice_rs::zones::Zone;
use dragon_dice_rs::{EngineError, Result};

const UNITS: &str = r#"[
    {
        "type_id": "dwarves_footman",
        "name": "Footman",
        "species": "Dwarves",
        "health": 1,
        "faces": ["ID", "Melee", "Melee", "Save", "Maneuver", "Missile"]
    }
]"#;

const TERRAINS: &str = r#"[
    {
        "type_id": "flatland",
        "name": "Flatland",
        "elements": ["Air", "Earth"],
        "face_icons": ["Maneuver", "Magic", "Melee", "Missile", "Magic", "Melee", "Missile"],
        "eighth_face": "Tower"
    }
]"#;

const DRAGONS: &str = r#"[
    { "type_id": "fire_drake", "name": "Fire Drake", "composition": { "Elemental": "Fire" } },
    { "type_id": "air_drake", "name": "Air Drake", "composition": { "Elemental": "Air" } }
]"#;

struct Field {
    game: GameState,
    terrain: dragon_dice_rs::core::TerrainId,
    army: dragon_dice_rs::core::ArmyId,
    units: Vec<dragon_dice_rs::core::UnitId>,
}

fn set_field(unit_count: usize) -> Result<(ReferenceData, Field)> {
    let mut data = ReferenceData::empty();
    data.load_units(UNITS)?;
    data.load_terrains(TERRAINS)?;
    data.load_dragons(DRAGONS)?;

    let mut game = GameState::new(&["Alice", "Bob"]);
    let alice = game.players[0].id;
    let terrain = data.create_terrain(&mut game, &TerrainTypeId::new("flatland"), 3)?;
    let army = game.zones.create_army("Home", alice, ArmyLocation::Terrain(terrain));
    let footman = UnitTypeId::new("dwarves_footman");
    let units: Vec<_> = (0..unit_count)
        .map(|i| {
            data.create_unit(&mut game, &footman, alice, format!("F{i}"), Zone::Army(army))
                .unwrap()
        })
        .collect();

    Ok((
        data,
        Field {
            game,
            terrain,
            army,
            units,
        },
    ))
}

/// A lone dragon showing its belly has no automatic saves: five melee
/// from the army kills it and it returns to the Summoning Pool.
#[test]
fn test_belly_dragon_slain_by_army_response() -> Result<()> {
    let (data, mut field) = set_field(6)?;
    let bob = field.game.players[1].id;
    let drake = data.create_dragon(
        &mut field.game,
        &DragonTypeId::new("fire_drake"),
        bob,
        DragonLocation::Terrain(field.terrain),
    )?;

    // 4 melee icons + an ID assigned to melee = 5 melee, 1 save.
    let mut results: Vec<RolledFace> = field.units[..4]
        .iter()
        .map(|u| RolledFace {
            unit: *u,
            face: DieFace::icon(ResultType::Melee, 1),
        })
        .collect();
    results.push(RolledFace {
        unit: field.units[4],
        face: DieFace::Id,
    });
    results.push(RolledFace {
        unit: field.units[5],
        face: DieFace::icon(ResultType::Save, 1),
    });
    let response = PendingRoll::new(
        RollPurpose::Combination(vec![ResultType::Melee, ResultType::Missile, ResultType::Save]),
        results,
    )
    .with_id_assignments(vec![IdAssignment {
        index: 4,
        allocations: vec![(ResultType::Melee, 1)],
    }]);

    let outcome = resolve_dragon_attack(
        &mut field.game,
        DragonAttackInput {
            terrain: field.terrain,
            army: field.army,
            rolls: vec![DragonRoll {
                dragon: drake,
                faces: vec![DragonFace::BellyFront],
            }],
            target_choices: Vec::new(),
            breath_casualties: Vec::new(),
            buried_by_fire: Vec::new(),
            response_roll: Some(response),
            casualties: Vec::new(),
            damage_allocation: vec![(drake, 5)],
            promotions: Vec::new(),
        },
    )?;

    assert_eq!(outcome.dragons_slain, vec![drake]);
    assert_eq!(outcome.army_damage, 0);
    let dragon = field.game.dragons.get(drake)?;
    assert_eq!(dragon.location, DragonLocation::SummoningPool);
    assert_eq!(dragon.wounds, 0);
    assert!(field
        .game
        .events
        .drain()
        .iter()
        .any(|e| matches!(e, GameEvent::DragonSlain { .. })));
    Ok(())
}

/// Breath against the army kills five health-worth immediately and
/// registers the elemental side-effect; the army's saves blunt the rest.
#[test]
fn test_air_breath_halves_melee_until_next_turn() -> Result<()> {
    let (data, mut field) = set_field(6)?;
    let bob = field.game.players[1].id;
    let drake = data.create_dragon(
        &mut field.game,
        &DragonTypeId::new("air_drake"),
        bob,
        DragonLocation::Terrain(field.terrain),
    )?;

    let breath_casualties: Vec<_> = field.units[..5].to_vec();
    let outcome = resolve_dragon_attack(
        &mut field.game,
        DragonAttackInput {
            terrain: field.terrain,
            army: field.army,
            rolls: vec![DragonRoll {
                dragon: drake,
                faces: vec![DragonFace::Breath],
            }],
            target_choices: Vec::new(),
            breath_casualties: breath_casualties.clone(),
            buried_by_fire: Vec::new(),
            response_roll: None,
            casualties: Vec::new(),
            damage_allocation: Vec::new(),
            promotions: Vec::new(),
        },
    )?;

    assert_eq!(outcome.breath_kills.len(), 5);
    for unit in &breath_casualties {
        assert_eq!(field.game.zones.zone_of(*unit)?, Zone::Dua);
    }
    // Lightning Bolt: the army's melee is halved until the beginning of
    // its owner's next turn.
    let target = dragon_dice_rs::core::EffectTarget::Army(field.army);
    assert_eq!(
        field
            .game
            .effects
            .active_effects_for(target, ResultType::Melee)
            .len(),
        1
    );
    Ok(())
}

/// Fire breath buries the killed units that failed their save.
#[test]
fn test_fire_breath_buries_failed_saves() -> Result<()> {
    let (data, mut field) = set_field(6)?;
    let bob = field.game.players[1].id;
    let drake = data.create_dragon(
        &mut field.game,
        &DragonTypeId::new("fire_drake"),
        bob,
        DragonLocation::Terrain(field.terrain),
    )?;

    let breath_casualties: Vec<_> = field.units[..5].to_vec();
    let buried: Vec<_> = field.units[..2].to_vec();
    resolve_dragon_attack(
        &mut field.game,
        DragonAttackInput {
            terrain: field.terrain,
            army: field.army,
            rolls: vec![DragonRoll {
                dragon: drake,
                faces: vec![DragonFace::Breath],
            }],
            target_choices: Vec::new(),
            breath_casualties,
            buried_by_fire: buried.clone(),
            response_roll: None,
            casualties: Vec::new(),
            damage_allocation: Vec::new(),
            promotions: Vec::new(),
        },
    )?;

    for unit in &buried {
        assert_eq!(field.game.zones.zone_of(*unit)?, Zone::Bua);
    }
    assert_eq!(field.game.zones.zone_of(field.units[2])?, Zone::Dua);
    Ok(())
}

/// A chain must end on a non-chaining face, and a roll reported for a
/// dragon that did not attack is rejected with nothing applied.
#[test]
fn test_invalid_roll_is_transactional() -> Result<()> {
    let (data, mut field) = set_field(3)?;
    let bob = field.game.players[1].id;
    let drake = data.create_dragon(
        &mut field.game,
        &DragonTypeId::new("fire_drake"),
        bob,
        DragonLocation::Terrain(field.terrain),
    )?;

    let before = field.game.export_state()?;
    let err = resolve_dragon_attack(
        &mut field.game,
        DragonAttackInput {
            terrain: field.terrain,
            army: field.army,
            rolls: vec![DragonRoll {
                dragon: drake,
                // Chain reported against an army target
                faces: vec![DragonFace::Breath, DragonFace::Jaws],
            }],
            target_choices: Vec::new(),
            breath_casualties: Vec::new(),
            buried_by_fire: Vec::new(),
            response_roll: None,
            casualties: Vec::new(),
            damage_allocation: Vec::new(),
            promotions: Vec::new(),
        },
    )
    .unwrap_err();

    assert!(matches!(err, EngineError::Validation(_)));
    let after = field.game.export_state()?;
    assert_eq!(GameState::import_state(&before)?, GameState::import_state(&after)?);
    Ok(())
}
