//! Базовые компоненты акторов: EntityId, AiTarget, Health

use std::num::NonZeroU16;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Стабильный numeric ID сущности (ключ памяти AI, сетевой wire id)
///
/// 0 зарезервирован под "нет цели" в snapshot, поэтому ID всегда ненулевой.
/// В отличие от `bevy::Entity`, одинаков у authority и observers.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(NonZeroU16);

impl EntityId {
    pub fn new(raw: u16) -> Option<Self> {
        NonZeroU16::new(raw).map(Self)
    }

    pub fn get(self) -> u16 {
        self.0.get()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Выдаёт `EntityId` в порядке спавна
///
/// Порядок выдачи = порядок регистрации целей (TargetSnapshot сортирует по ID).
#[derive(Debug)]
pub struct EntityIdAllocator {
    next: u16,
}

impl Default for EntityIdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl EntityIdAllocator {
    /// `None` когда 16-битное пространство ID исчерпано.
    pub fn allocate(&mut self) -> Option<EntityId> {
        let id = EntityId::new(self.next)?;
        self.next = self.next.checked_add(1).unwrap_or(0);
        Some(id)
    }
}

/// Категория цели для AI target selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TargetCategory {
    /// Damageable конструкция (стена, дверь, механизм)
    Structure,
    /// Отсек / комната
    Room,
    /// Другое существо
    Creature {
        species: String,
        combat_strength: f32,
    },
}

/// Цель, видимая AI (sight/sound ranges + категория)
///
/// Позиция берётся из Transform, здоровье: из опционального Health.
#[derive(Component, Debug, Clone)]
pub struct AiTarget {
    /// Дальность, с которой цель видна (умножается на sight агента)
    pub sight_range: f32,
    /// Дальность, с которой цель слышна (умножается на hearing агента)
    pub sound_range: f32,
    pub category: TargetCategory,
}

impl AiTarget {
    pub fn new(category: TargetCategory, sight_range: f32, sound_range: f32) -> Self {
        Self {
            sight_range,
            sound_range,
            category,
        }
    }
}

/// Здоровье damageable сущности
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.current = (self.current - amount.max(0.0)).max(0.0);
    }
}
