//! Target selection: взвешенный выбор цели раз в цикл
//!
//! Алгоритм (один проход по реестру в порядке регистрации):
//! 1. Disengagement: застряли на месте → с шансом 1/N бросаем цель
//! 2. `decay_and_prune` памяти
//! 3. Для каждого кандидата:
//!    `raw = modifier * priority / max(distance, 1)`, range gate по sight/sound,
//!    делим на здоровье препятствия / цели (или на 1000)
//! 4. Побеждает max |raw|, при равенстве: первый найденный

use bevy::math::Vec2;
use rand::{Rng, RngCore};

use crate::components::EntityId;
use crate::logger;

use super::config::AiConfig;
use super::memory::TargetMemoryStore;
use super::world::{AgentView, TargetRegistry, TargetView, VisibilityQuery};

/// Минимальная эффективная дистанция (защита от деления на ноль)
pub const MIN_TARGET_DISTANCE: f32 = 1.0;

/// Делитель для целей без здоровья (отсеки и т.п.)
pub const NON_DAMAGEABLE_DIVISOR: f32 = 1000.0;

/// Минимальный делитель здоровья (пробитая стена не даёт бесконечность)
pub const MIN_HEALTH_DIVISOR: f32 = 1.0;

/// Выбранная цель
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionResult {
    /// Цель (её память лежит в `TargetMemoryStore` под этим ключом)
    pub target: EntityId,
    /// > 0 атаковать, < 0 убегать; модуль: сила предпочтения
    pub value: f32,
}

impl SelectionResult {
    pub fn is_attack(&self) -> bool {
        self.value > 0.0
    }
}

/// Итог одного цикла оценки
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SelectionOutcome {
    pub selection: Option<SelectionResult>,
    /// Агент застрял и бросил цель в этом цикле
    pub disengaged: bool,
}

/// Выбор цели + память о целях
#[derive(Debug, Clone, Default)]
pub struct TargetSelector {
    memory: TargetMemoryStore,
    /// Позиция агента на прошлом цикле (для disengagement)
    prev_position: Option<Vec2>,
}

impl TargetSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn memory(&self) -> &TargetMemoryStore {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut TargetMemoryStore {
        &mut self.memory
    }

    /// Полный цикл оценки всех кандидатов
    pub fn evaluate(
        &mut self,
        config: &AiConfig,
        agent: &AgentView,
        registry: &dyn TargetRegistry,
        visibility: &dyn VisibilityQuery,
        rng: &mut dyn RngCore,
    ) -> SelectionOutcome {
        if self.should_disengage(config, agent.position, rng) {
            logger::log(&format!(
                "🌀 {} stuck at {:?} → dropping target",
                agent.id, agent.position
            ));
            return SelectionOutcome {
                selection: None,
                disengaged: true,
            };
        }

        self.memory
            .decay_and_prune(registry, config.memory_regen_per_cycle);

        let mut best: Option<SelectionResult> = None;

        for candidate in registry.all_live_targets() {
            let Some(raw) = self.score(config, agent, candidate, visibility) else {
                continue;
            };

            let beats_best = best.map_or(true, |current| raw.abs() > current.value.abs());
            if beats_best {
                best = Some(SelectionResult {
                    target: candidate.id,
                    value: raw,
                });
            }
        }

        SelectionOutcome {
            selection: best,
            disengaged: false,
        }
    }

    /// Застряли (сдвиг < порога с прошлого цикла) и выпал шанс 1/N
    fn should_disengage(&mut self, config: &AiConfig, position: Vec2, rng: &mut dyn RngCore) -> bool {
        let Some(prev) = self.prev_position.replace(position) else {
            return false;
        };

        if prev.distance(position) >= config.disengage_distance {
            return false;
        }

        config.disengage_odds > 0 && rng.gen_range(0..config.disengage_odds) == 0
    }

    /// Signed score кандидата, `None` если кандидат отсеян
    fn score(
        &mut self,
        config: &AiConfig,
        agent: &AgentView,
        candidate: &TargetView,
        visibility: &dyn VisibilityQuery,
    ) -> Option<f32> {
        if candidate.id == agent.id || candidate.is_destroyed() {
            return None;
        }

        let modifier = config
            .priorities
            .modifier_for(&candidate.category, config.combat_strength);
        if modifier == 0.0 {
            return None;
        }

        let distance = agent.position.distance(candidate.position).max(MIN_TARGET_DISTANCE);
        let priority = self.memory.get_or_create(candidate.id).priority();
        let mut raw = modifier * priority / distance;

        let seen = distance < candidate.sight_range * config.sight;
        let heard = distance < candidate.sound_range * config.hearing;
        if !seen && !heard {
            return None;
        }

        let hit = visibility.cast(agent.position, candidate.position);
        let blocking_structure = hit
            .obstruction
            .as_ref()
            .filter(|o| o.entity != candidate.id)
            .and_then(|o| o.health);

        raw /= match (blocking_structure, candidate.health) {
            (Some(wall_health), _) => wall_health.max(MIN_HEALTH_DIVISOR),
            (None, Some(health)) => health.max(MIN_HEALTH_DIVISOR),
            (None, None) => NON_DAMAGEABLE_DIVISOR,
        };

        raw.is_finite().then_some(raw)
    }
}
