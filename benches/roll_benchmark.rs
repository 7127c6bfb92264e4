//! Roll Resolution Pipeline benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dragon_dice_rs::core::{
    ArmyId, DieFace, EffectKind, EffectTarget, EntityStore, Expiry, Modifier, ModifierOp, PlayerId,
    ResultType, RollPurpose, SpeciesName, Unit, UnitId, UnitTypeId,
};
use dragon_dice_rs::game::{resolve_roll, EffectManager, PendingRoll, RollContext, RolledFace};
use dragon_dice_rs::undo::TransactionLog;
use smallvec::SmallVec;

fn build_units(count: usize) -> (EntityStore<Unit>, Vec<UnitId>) {
    let mut store = EntityStore::new();
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let id = store.next_id();
        store.insert(
            id,
            Unit {
                id,
                name: format!("unit-{i}"),
                unit_type: UnitTypeId::new("bench"),
                owner: PlayerId::new(0),
                species: SpeciesName::new("Dwarves"),
                max_health: 1 + (i % 3) as u8,
                damage: 0,
                faces: SmallVec::from_vec(vec![
                    DieFace::Id,
                    DieFace::icon(ResultType::Melee, 1),
                    DieFace::icon(ResultType::Melee, 2),
                    DieFace::icon(ResultType::Save, 1),
                    DieFace::icon(ResultType::Maneuver, 1),
                    DieFace::icon(ResultType::Missile, 1),
                ]),
                auto_saves: (i % 2) as u8,
                elements: SmallVec::new(),
            },
        );
        ids.push(id);
    }
    (store, ids)
}

fn build_effects(target: EffectTarget) -> EffectManager {
    let mut effects = EffectManager::new();
    let mut tx = TransactionLog::new();
    let owner = PlayerId::new(0);
    for (op, magnitude) in [
        (ModifierOp::Add, 3),
        (ModifierOp::Subtract, 2),
        (ModifierOp::Multiply, 2),
        (ModifierOp::Divide, 2),
    ] {
        effects
            .register(
                &mut tx,
                target,
                owner,
                EffectKind::Modifier(Modifier {
                    op,
                    result: ResultType::Melee,
                    magnitude,
                }),
                Expiry::Permanent,
                "bench",
            )
            .expect("registration within caps");
    }
    effects
}

fn bench_pipeline(c: &mut Criterion) {
    let (units, ids) = build_units(20);
    let target = EffectTarget::Army(ArmyId::new(0));
    let effects = build_effects(target);

    let results: Vec<RolledFace> = ids
        .iter()
        .enumerate()
        .map(|(i, unit)| RolledFace {
            unit: *unit,
            face: if i % 4 == 0 {
                DieFace::Id
            } else {
                DieFace::icon(ResultType::Melee, 1 + (i % 2) as u8)
            },
        })
        .collect();

    c.bench_function("resolve_roll_20_units_full_modifiers", |b| {
        b.iter(|| {
            let roll = PendingRoll::new(RollPurpose::Single(ResultType::Melee), results.clone());
            let outcome = resolve_roll(
                black_box(roll),
                target,
                &effects,
                &units,
                RollContext::default(),
            )
            .expect("pipeline resolves");
            black_box(outcome.get(ResultType::Melee))
        })
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
