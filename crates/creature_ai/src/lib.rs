//! Creature AI Simulation Core
//!
//! ECS-симуляция враждебных существ на Bevy 0.16 (headless)
//!
//! Слои:
//! - ai: выбор цели, память, attack state machine (ECS-независимый core + systems)
//! - combat: урон от конечностей, смерть
//! - replication: битовые snapshot'ы AI для observers
//! - components: ECS компоненты мира

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod combat;
pub mod components;
pub mod logger;
pub mod replication;

// Re-export базовых типов для удобства
pub use ai::{AIPlugin, AiConfig, AiState, CreatureAttacked, EnemyAi, TargetingPriorities};
pub use combat::{Dead, EntityDied, LimbStruck};
pub use components::*;
pub use logger::{init_logger, log, log_error, log_info, log_warning};
pub use replication::{AgentSnapshot, AiSnapshot, DecodeError, Replicated, ReplicationPlugin, ReplicationRole};

/// Частота simulation tick
pub const TICK_HZ: f64 = 60.0;

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(TICK_HZ))
            .add_plugins((ReplicationPlugin, AIPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время продвигается вручную на один fixed tick за `app.update()`
/// (первый update только стартует часы), поэтому число тиков не зависит
/// от скорости машины.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(TICK_HZ))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            1.0 / TICK_HZ,
        )));

    app
}

/// Всё, что нужно существу с AI
pub fn creature_bundle(
    id: EntityId,
    position: Vec2,
    config: AiConfig,
    limbs: Vec<Limb>,
    target: AiTarget,
    health: f32,
) -> impl Bundle {
    (
        id,
        Transform::from_translation(position.extend(0.0)),
        EnemyAi::new(config),
        SteeringIntents::default(),
        MovementSpeed::default(),
        Limbs(limbs),
        target,
        Health::new(health),
        Replicated,
    )
}

/// Snapshot мира для сравнения детерминизма
///
/// Порядок по EntityId (стабилен между прогонами), компонент через Debug.
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(&EntityId, &T)>();
    let mut entries: Vec<_> = query.iter(world).collect();
    entries.sort_by_key(|(id, _)| **id);

    for (id, component) in entries {
        snapshot.extend_from_slice(&id.get().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
