//! Rule scenario tests
//!
//! Each test pins one of the engine's behavioral guarantees: lethal
//! overkill without residue, eighth-face City recruiting, the modifier
//! caps, dragon targeting preferences, and the pipeline's upper bound.

use dragon_dice_rs::core::{
    ArmyLocation, DieFace, DragonLocation, DragonTypeId, EffectKind, EffectTarget, Element, Expiry,
    Modifier, ModifierOp, ResultType, RollPurpose, TerrainTypeId, UnitTypeId,
};
use dragon_dice_rs::game::{
    determine_targets, resolve_action, resolve_city_turn, ActionInput, ActionKind, DragonTarget,
    GameState, PendingRoll, RolledFace,
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
    },
    {
        "type_id": "dwarves_sergeant",
        "name": "Sergeant",
        "species": "Dwarves",
        "health": 2,
        "faces": ["ID", "Melee:2", "Melee", "Save", "Save", "Maneuver"]
    }
]"#;

const TERRAINS: &str = r#"[
    {
        "type_id": "highland_city",
        "name": "Highland City",
        "elements": ["Fire", "Earth"],
        "face_icons": ["Maneuver", "Magic", "Melee", "Missile", "Magic", "Melee", "Missile"],
        "eighth_face": "City"
    }
]"#;

const DRAGONS: &str = r#"[
    { "type_id": "fire_drake", "name": "Fire Drake", "composition": { "Elemental": "Fire" } },
    { "type_id": "water_drake", "name": "Water Drake", "composition": { "Elemental": "Water" } }
]"#;

fn refdata() -> Result<ReferenceData> {
    let mut data = ReferenceData::empty();
    data.load_units(UNITS)?;
    data.load_terrains(TERRAINS)?;
    data.load_dragons(DRAGONS)?;
    Ok(data)
}

/// A 2-health unit takes 3 damage with no save available: it dies, moves
/// to the DUA with no residual damage, and nothing promotes (the DUA had
/// no match yet).
#[test]
fn test_overkill_leaves_no_residue() -> Result<()> {
    let data = refdata()?;
    let mut game = GameState::new(&["Alice", "Bob"]);
    let alice = game.players[0].id;
    let bob = game.players[1].id;

    let terrain = data.create_terrain(&mut game, &TerrainTypeId::new("highland_city"), 3)?;
    let home = game.zones.create_army("Home", alice, ArmyLocation::Terrain(terrain));
    let horde = game.zones.create_army("Horde", bob, ArmyLocation::Terrain(terrain));

    let footman = UnitTypeId::new("dwarves_footman");
    let attackers: Vec<_> = (0..3)
        .map(|i| {
            data.create_unit(&mut game, &footman, alice, format!("F{i}"), Zone::Army(home))
                .unwrap()
        })
        .collect();
    let victim = data.create_unit(
        &mut game,
        &UnitTypeId::new("dwarves_sergeant"),
        bob,
        "Sergeant",
        Zone::Army(horde),
    )?;

    let roll = PendingRoll::new(
        RollPurpose::Single(ResultType::Melee),
        attackers
            .iter()
            .map(|u| RolledFace {
                unit: *u,
                face: DieFace::icon(ResultType::Melee, 1),
            })
            .collect(),
    );
    let outcome = resolve_action(
        &mut game,
        &data,
        ActionInput {
            acting_army: home,
            kind: ActionKind::Melee,
            attacker_roll: roll,
            target: Some(horde),
            defender_save_roll: None,
            casualties: vec![victim],
            promotions: Vec::new(),
            spells: Vec::new(),
        },
    )?;

    assert_eq!(outcome.net_damage, 3);
    assert_eq!(game.zones.zone_of(victim)?, Zone::Dua);
    assert_eq!(game.zones.units.get(victim)?.damage, 0);
    assert!(outcome.promoted.is_empty());
    Ok(())
}

/// An army controlling a City eighth face recruits a 1-health unit: the
/// Zone Store shows the unit in the army and the DUA count for that
/// species reduced by one.
#[test]
fn test_city_recruit_reduces_dua() -> Result<()> {
    let data = refdata()?;
    let mut game = GameState::new(&["Alice", "Bob"]);
    let alice = game.players[0].id;

    let terrain = data.create_terrain(&mut game, &TerrainTypeId::new("highland_city"), 8)?;
    let home = game.zones.create_army("Home", alice, ArmyLocation::Terrain(terrain));
    let footman = UnitTypeId::new("dwarves_footman");
    data.create_unit(&mut game, &footman, alice, "Garrison", Zone::Army(home))?;
    let dead = data.create_unit(&mut game, &footman, alice, "Casualty", Zone::Dua)?;

    game.begin();
    game.set_terrain_controller(terrain, Some(alice))?;
    game.commit();

    let dua_before = game.zones.areas(alice)?.dua.len();
    resolve_city_turn(&mut game, home, Some(dead), None)?;

    assert_eq!(game.zones.zone_of(dead)?, Zone::Army(home));
    assert_eq!(game.zones.areas(alice)?.dua.len(), dua_before - 1);
    Ok(())
}

/// A "subtract 3 melee" effect plus a later second "multiply melee"
/// registration: the second multiply is rejected and the subtract stays.
#[test]
fn test_modifier_caps_keep_earlier_effects() -> Result<()> {
    let mut game = GameState::new(&["Alice", "Bob"]);
    let alice = game.players[0].id;
    let army = game.zones.create_army("Home", alice, ArmyLocation::Reserve);
    let target = EffectTarget::Army(army);

    let modifier = |op, magnitude| {
        EffectKind::Modifier(Modifier {
            op,
            result: ResultType::Melee,
            magnitude,
        })
    };

    game.begin();
    game.effects
        .register(&mut game.tx, target, alice, modifier(ModifierOp::Subtract, 3), Expiry::Permanent, "palsy")?;
    game.effects
        .register(&mut game.tx, target, alice, modifier(ModifierOp::Multiply, 2), Expiry::Permanent, "rage")?;
    let err = game
        .effects
        .register(&mut game.tx, target, alice, modifier(ModifierOp::Multiply, 3), Expiry::Permanent, "rage again")
        .unwrap_err();
    game.commit();

    assert!(matches!(err, EngineError::RuleViolation(_)));
    let active = game.effects.active_effects_for(target, ResultType::Melee);
    assert_eq!(active.len(), 2);
    assert!(active
        .iter()
        .any(|e| matches!(e.kind, EffectKind::Modifier(m) if m.op == ModifierOp::Subtract)));
    Ok(())
}

/// Two Elemental dragons of different elements with one marching-player
/// army: the targeting matrix forces dragon-vs-dragon, not dragon-vs-army.
#[test]
fn test_elemental_dragons_prefer_each_other() -> Result<()> {
    let data = refdata()?;
    let mut game = GameState::new(&["Alice", "Bob"]);
    let alice = game.players[0].id;
    let bob = game.players[1].id;

    let terrain = data.create_terrain(&mut game, &TerrainTypeId::new("highland_city"), 3)?;
    let home = game.zones.create_army("Home", alice, ArmyLocation::Terrain(terrain));
    data.create_unit(&mut game, &UnitTypeId::new("dwarves_footman"), alice, "F1", Zone::Army(home))?;

    let fire = data.create_dragon(
        &mut game,
        &DragonTypeId::new("fire_drake"),
        alice,
        DragonLocation::Terrain(terrain),
    )?;
    let water = data.create_dragon(
        &mut game,
        &DragonTypeId::new("water_drake"),
        bob,
        DragonLocation::Terrain(terrain),
    )?;

    let targets = determine_targets(&game, terrain, &[])?;
    assert_eq!(targets.len(), 2);
    for (dragon, target) in targets {
        let expected = if dragon == fire { water } else { fire };
        assert_eq!(target, DragonTarget::Dragon(expected));
    }
    Ok(())
}

const MAGES: &str = r#"[
    {
        "type_id": "dwarves_mage",
        "name": "Mage",
        "species": "Dwarves",
        "health": 1,
        "faces": ["ID", "Magic", "Magic:2", "Save", "Maneuver", "Melee"],
        "elements": ["Death", "Earth"]
    },
    {
        "type_id": "dwarves_footman2",
        "name": "Footman",
        "species": "Dwarves",
        "health": 1,
        "faces": ["ID", "Melee", "Melee", "Save", "Maneuver", "Missile"],
        "elements": ["Death", "Earth"]
    }
]"#;

const SPELLS: &str = r#"[
    { "id": "palsy", "name": "Palsy", "cost": 2, "element": "Death",
      "effect": { "Modifier": { "op": "Subtract", "result": "Melee", "magnitude": 1, "expiry": "OwnersNextTurn" } } },
    { "id": "open_grave", "name": "Open Grave", "cost": 3, "element": "Death",
      "effect": { "KillToReserve": { "expiry": "OwnersNextTurn" } } }
]"#;

/// A magic action pays for its spells out of the rolled magic results,
/// and an Open Grave redirects later kills to the Reserve Area.
#[test]
fn test_magic_action_and_kill_redirect() -> Result<()> {
    use dragon_dice_rs::game::SpellCast;

    let mut data = ReferenceData::empty();
    data.load_units(MAGES)?;
    data.load_terrains(TERRAINS)?;
    data.load_spells(SPELLS)?;

    let mut game = GameState::new(&["Alice", "Bob"]);
    let alice = game.players[0].id;
    let bob = game.players[1].id;

    // Face 2 of this terrain shows a magic icon.
    let terrain = data.create_terrain(&mut game, &TerrainTypeId::new("highland_city"), 2)?;
    let home = game.zones.create_army("Home", alice, ArmyLocation::Terrain(terrain));
    let horde = game.zones.create_army("Horde", bob, ArmyLocation::Terrain(terrain));

    let mage = UnitTypeId::new("dwarves_mage");
    let m1 = data.create_unit(&mut game, &mage, alice, "Mage #1", Zone::Army(home))?;
    let m2 = data.create_unit(&mut game, &mage, alice, "Mage #2", Zone::Army(home))?;
    let raider = data.create_unit(
        &mut game,
        &UnitTypeId::new("dwarves_footman2"),
        bob,
        "Raider",
        Zone::Army(horde),
    )?;

    let magic_roll = || {
        PendingRoll::new(
            RollPurpose::Single(ResultType::Magic),
            vec![
                RolledFace {
                    unit: m1,
                    face: DieFace::icon(ResultType::Magic, 2),
                },
                RolledFace {
                    unit: m2,
                    face: DieFace::icon(ResultType::Magic, 1),
                },
            ],
        )
    };
    let open_grave = SpellCast {
        spell: dragon_dice_rs::core::SpellId::new("open_grave"),
        target: EffectTarget::Army(home),
        save_roll: None,
    };

    // Both spells together cost 5 against 3 magic: rejected, nothing
    // registered.
    let palsy = SpellCast {
        spell: dragon_dice_rs::core::SpellId::new("palsy"),
        target: EffectTarget::Army(horde),
        save_roll: None,
    };
    let err = resolve_action(
        &mut game,
        &data,
        ActionInput {
            acting_army: home,
            kind: ActionKind::Magic,
            attacker_roll: magic_roll(),
            target: None,
            defender_save_roll: None,
            casualties: Vec::new(),
            promotions: Vec::new(),
            spells: vec![open_grave.clone(), palsy],
        },
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert!(game.effects.is_empty());

    // Open Grave alone fits the 3 magic rolled.
    resolve_action(
        &mut game,
        &data,
        ActionInput {
            acting_army: home,
            kind: ActionKind::Magic,
            attacker_roll: magic_roll(),
            target: None,
            defender_save_roll: None,
            casualties: Vec::new(),
            promotions: Vec::new(),
            spells: vec![open_grave],
        },
    )?;
    assert_eq!(game.effects.len(), 1);

    // Bob's melee kill now lands in Alice's Reserve Area, not her DUA.
    resolve_action(
        &mut game,
        &data,
        ActionInput {
            acting_army: horde,
            kind: ActionKind::Melee,
            attacker_roll: PendingRoll::new(
                RollPurpose::Single(ResultType::Melee),
                vec![RolledFace {
                    unit: raider,
                    face: DieFace::icon(ResultType::Melee, 1),
                }],
            ),
            target: Some(home),
            defender_save_roll: None,
            casualties: vec![m1],
            promotions: Vec::new(),
            spells: Vec::new(),
        },
    )?;
    assert_eq!(game.zones.zone_of(m1)?, Zone::Reserve);
    assert!(game.zones.areas(alice)?.dua.is_empty());
    Ok(())
}

/// Pipeline upper bound: final totals never exceed raw icons plus add
/// magnitudes plus automatic saves (no multiply in play).
#[test]
fn test_pipeline_upper_bound() -> Result<()> {
    use dragon_dice_rs::core::{EntityStore, SpeciesName, Unit};
    use dragon_dice_rs::game::{resolve_roll, EffectManager, RollContext};
    use dragon_dice_rs::undo::TransactionLog;
    use smallvec::SmallVec;

    let mut units = EntityStore::new();
    let mut ids = Vec::new();
    for i in 0..6u32 {
        let id = units.next_id();
        units.insert(
            id,
            Unit {
                id,
                name: format!("u{i}"),
                unit_type: UnitTypeId::new("x"),
                owner: game_player(),
                species: SpeciesName::new("Dwarves"),
                max_health: 2,
                damage: 0,
                faces: SmallVec::from_vec(vec![
                    DieFace::Id,
                    DieFace::icon(ResultType::Save, 1),
                    DieFace::icon(ResultType::Melee, 2),
                ]),
                auto_saves: 1,
                elements: SmallVec::from_vec(vec![Element::Earth]),
            },
        );
        ids.push(id);
    }

    let army = dragon_dice_rs::core::ArmyId::new(0);
    let target = EffectTarget::Army(army);
    let mut effects = EffectManager::new();
    let mut tx = TransactionLog::new();
    let add_magnitude = 4;
    effects.register(
        &mut tx,
        target,
        game_player(),
        EffectKind::Modifier(Modifier {
            op: ModifierOp::Add,
            result: ResultType::Save,
            magnitude: add_magnitude,
        }),
        Expiry::Permanent,
        "bound test",
    )?;

    let results: Vec<RolledFace> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| RolledFace {
            unit: *id,
            face: if i % 2 == 0 {
                DieFace::icon(ResultType::Save, 1)
            } else {
                DieFace::Id
            },
        })
        .collect();
    let raw_icons: u32 = 3; // three plain save icons
    let id_generated: u32 = 3 * 2; // three IDs at health 2
    let auto_saves: u32 = ids.len() as u32;

    let roll = PendingRoll::new(RollPurpose::Single(ResultType::Save), results);
    let outcome = resolve_roll(roll, target, &effects, &units, RollContext::default())?;

    assert!(outcome.sum() <= raw_icons + id_generated + add_magnitude + auto_saves);
    Ok(())
}

fn game_player() -> dragon_dice_rs::core::PlayerId {
    dragon_dice_rs::core::PlayerId::new(0)
}
