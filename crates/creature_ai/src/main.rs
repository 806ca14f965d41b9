//! Headless симуляция существа
//!
//! Один хищник, стена и водолаз за стеной. Запускает Bevy App без рендера и
//! печатает состояние AI раз в секунду симуляции.

use bevy::prelude::*;
use creature_ai::{
    create_headless_app, creature_bundle, log_info, AiConfig, AiTarget, AttackType, EnemyAi,
    EntityIdAllocator, Health, Limb, LimbAttack, SimulationPlugin, Structure, TargetCategory,
    TICK_HZ,
};

fn main() {
    let seed = 42;
    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);
    log_info(&format!("Starting creature AI headless simulation (seed: {})", seed));

    let world = app.world_mut();
    let mut ids = EntityIdAllocator::default();
    let (Some(hunter_id), Some(wall_id), Some(diver_id)) =
        (ids.allocate(), ids.allocate(), ids.allocate())
    else {
        return;
    };

    let claws = vec![
        Limb::new(Vec2::new(0.5, 0.3), 2.0)
            .with_attack(LimbAttack::pinch(AttackType::PinchCw, 2.5, 1.5, 20.0)),
        Limb::new(Vec2::new(0.5, -0.3), 2.0)
            .with_attack(LimbAttack::pinch(AttackType::PinchCcw, 2.5, 1.5, 20.0)),
    ];
    let hunter = world
        .spawn(creature_bundle(
            hunter_id,
            Vec2::ZERO,
            AiConfig::default(),
            claws,
            AiTarget::new(
                TargetCategory::Creature {
                    species: "crawler".to_string(),
                    combat_strength: 3.0,
                },
                15.0,
                5.0,
            ),
            200.0,
        ))
        .id();

    world.spawn((
        wall_id,
        Transform::from_xyz(6.0, 0.0, 0.0),
        Structure::wall(1.0, Vec2::new(6.0, -3.0), Vec2::new(6.0, 3.0), 6, 50.0),
        Health::new(300.0),
    ));

    world.spawn((
        diver_id,
        Transform::from_xyz(10.0, 0.0, 0.0),
        AiTarget::new(
            TargetCategory::Creature {
                species: "diver".to_string(),
                combat_strength: 1.0,
            },
            20.0,
            10.0,
        ),
        Health::new(100.0),
    ));

    let ticks = (TICK_HZ as usize) * 30;
    for tick in 0..=ticks {
        app.update();

        if tick % TICK_HZ as usize == 0 {
            let world = app.world();
            let (Some(ai), Some(transform)) =
                (world.get::<EnemyAi>(hunter), world.get::<Transform>(hunter))
            else {
                break;
            };
            log_info(&format!(
                "t={:>2}s state={:?} target={:?} wall_point={:?} pos=({:.1}, {:.1})",
                tick / TICK_HZ as usize,
                ai.state(),
                ai.target_entity(),
                ai.wall_attack_pos(),
                transform.translation.x,
                transform.translation.y,
            ));
        }
    }

    log_info("Simulation complete!");
}
