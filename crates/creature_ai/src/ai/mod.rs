//! AI decision-making module
//!
//! Враждебное существо: выбор цели (память + взвешенная оценка) и
//! attack state machine, исполняющая атаку через конечности.
//!
//! Core (`memory`, `selector`, `controller`) не зависит от ECS queries:
//! внешний мир приходит через traits из `world`. ECS-привязка: в `systems`.

use bevy::prelude::*;

pub mod config;
pub mod controller;
pub mod events;
pub mod memory;
pub mod selector;
pub mod systems;
pub mod world;


// Re-export основных типов
pub use config::{AiConfig, TargetingPriorities};
pub use controller::{AiState, AttackExecution, EnemyAi, Intent};
pub use events::CreatureAttacked;
pub use memory::{TargetMemory, TargetMemoryStore, MAX_PRIORITY, MIN_PRIORITY};
pub use selector::{SelectionOutcome, SelectionResult, TargetSelector};
pub use systems::{ObstacleField, StrikeBuffer};
pub use world::{
    AgentView, AiContext, ClearSight, LimbActuator, LimbStrike, Obstruction, RayHit, Steering,
    TargetRegistry, TargetSnapshot, TargetView, VisibilityQuery,
};

use crate::combat::{apply_limb_strikes, disable_ai_on_death, EntityDied, LimbStruck};
use crate::replication::{apply_ai_snapshots, is_authority, is_observer, publish_ai_snapshots, AiSnapshot};
use crate::DeterministicRng;

/// AI Plugin
///
/// Регистрирует AI системы в FixedUpdate для детерминизма.
/// Порядок выполнения:
/// 1. enemy_ai_update: решения агентов (authority)
/// 2. apply_limb_strikes: урон от конечностей
/// 3. disable_ai_on_death: мёртвые перестают думать
/// 4. react_to_attacks: on_attacked до следующего решения
/// 5. integrate_steering: движение (authority)
/// 6. publish_ai_snapshots / apply_ai_snapshots: репликация
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<CreatureAttacked>()
            .add_event::<LimbStruck>()
            .add_event::<EntityDied>()
            .add_event::<AiSnapshot>();

        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        app.add_systems(
            FixedUpdate,
            (
                systems::enemy_ai_update.run_if(is_authority),
                apply_limb_strikes,
                disable_ai_on_death,
                systems::react_to_attacks,
                systems::integrate_steering.run_if(is_authority),
                publish_ai_snapshots.run_if(is_authority),
                apply_ai_snapshots.run_if(is_observer),
            )
                .chain(), // Последовательное выполнение для детерминизма
        );
    }
}
