//! Параметры AI существа
//!
//! Serde с `#[serde(default)]`: embedding-слой грузит частичный документ
//! (JSON/RON из species data), недостающие поля берутся из `Default`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::components::TargetCategory;

/// Отношение к категориям целей
///
/// Знак: > 0 атаковать, < 0 убегать, 0: игнорировать категорию.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetingPriorities {
    /// Отсеки и конструкции (стены, двери)
    pub attack_rooms: f32,
    /// Существа слабее нас (по combat strength)
    pub attack_weaker: f32,
    /// Существа сильнее нас
    pub attack_stronger: f32,
    /// Явное отношение к конкретным видам (перекрывает weaker/stronger)
    pub species: HashMap<String, f32>,
}

impl Default for TargetingPriorities {
    fn default() -> Self {
        Self {
            attack_rooms: 1.0,
            attack_weaker: 1.0,
            attack_stronger: -1.0,
            species: HashMap::new(),
        }
    }
}

impl TargetingPriorities {
    /// Signed modifier для категории цели (0.0: не рассматривать)
    pub fn modifier_for(&self, category: &TargetCategory, own_strength: f32) -> f32 {
        match category {
            TargetCategory::Room | TargetCategory::Structure => self.attack_rooms,
            TargetCategory::Creature {
                species,
                combat_strength,
            } => {
                if let Some(&affinity) = self.species.get(species) {
                    affinity
                } else if *combat_strength > own_strength {
                    self.attack_stronger
                } else if *combat_strength < own_strength {
                    self.attack_weaker
                } else {
                    0.0
                }
            }
        }
    }
}

/// Параметры AI (интервалы, дистанции, чувства)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Интервал пересчёта целей (секунды)
    pub update_targets_interval: f32,
    /// Интервал пересчёта после получения урона (секунды)
    pub reactive_update_interval: f32,
    /// Интервал ray cast к выбранной цели (секунды)
    pub raycast_interval: f32,
    /// Cooldown после завершённой атаки (секунды)
    pub attack_cooldown: f32,
    /// Cooldown стартует только если атака закончилась ближе этой дистанции
    pub cooldown_proximity: f32,
    /// Во время cooldown ближе этой дистанции: отступаем от точки атаки
    pub cooldown_retreat_distance: f32,
    /// Смещение за цикл меньше этого = "застряли"
    pub disengage_distance: f32,
    /// Шанс бросить цель при застревании: 1 из N
    pub disengage_odds: u32,
    /// Прирост priority памяти за цикл
    pub memory_regen_per_cycle: f32,
    /// Множитель sight range целей
    pub sight: f32,
    /// Множитель sound range целей
    pub hearing: f32,
    /// Боевая сила (сравнивается с чужой для weaker/stronger)
    pub combat_strength: f32,
    pub priorities: TargetingPriorities,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            update_targets_interval: 5.0,
            reactive_update_interval: 0.1,
            raycast_interval: 1.0,
            attack_cooldown: 5.0,
            cooldown_proximity: 5.0,
            cooldown_retreat_distance: 3.0,
            disengage_distance: 1.0,
            disengage_odds: 3,
            memory_regen_per_cycle: 0.5,
            sight: 1.0,
            hearing: 1.0,
            combat_strength: 1.0,
            priorities: TargetingPriorities::default(),
        }
    }
}
