//! Память существа о целях ("обиды")
//!
//! Одна запись на каждую когда-либо оценённую цель:
//! - создаётся лениво с priority 100
//! - +0.5 за цикл оценки (старые обиды не исчезают, а упираются в потолок)
//! - тает по времени, пока цель преследуется
//! - растёт, когда цель нас атакует
//!
//! Инвариант: 1 ≤ priority ≤ 100.

use std::collections::HashMap;

use crate::components::EntityId;

use super::world::TargetRegistry;

pub const MIN_PRIORITY: f32 = 1.0;
pub const MAX_PRIORITY: f32 = 100.0;

/// Память об одной цели
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetMemory {
    priority: f32,
}

impl Default for TargetMemory {
    fn default() -> Self {
        Self {
            priority: MAX_PRIORITY,
        }
    }
}

impl TargetMemory {
    pub fn priority(&self) -> f32 {
        self.priority
    }

    pub fn set_priority(&mut self, priority: f32) {
        if priority.is_nan() {
            return;
        }
        self.priority = priority.clamp(MIN_PRIORITY, MAX_PRIORITY);
    }

    pub fn adjust(&mut self, delta: f32) {
        self.set_priority(self.priority + delta);
    }
}

/// Память агента, ключ: стабильный `EntityId`
#[derive(Debug, Clone, Default)]
pub struct TargetMemoryStore {
    memories: HashMap<EntityId, TargetMemory>,
}

impl TargetMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, target: EntityId) -> Option<&TargetMemory> {
        self.memories.get(&target)
    }

    pub fn get_or_create(&mut self, target: EntityId) -> &mut TargetMemory {
        self.memories.entry(target).or_default()
    }

    /// Раз за цикл, до выбора цели: прирост priority + чистка мёртвых записей
    pub fn decay_and_prune(&mut self, live_targets: &dyn TargetRegistry, regen: f32) {
        for memory in self.memories.values_mut() {
            memory.adjust(regen);
        }

        self.memories.retain(|&target, memory| {
            memory.priority > 0.0 && live_targets.find_by_id(target).is_some()
        });
    }

    /// Нас атаковала `target`: обида растёт на `amount`
    pub fn reinforce(&mut self, target: EntityId, amount: f32) {
        self.get_or_create(target).adjust(amount);
    }

    /// Цель преследуется: обида тает на `amount`
    pub fn drain(&mut self, target: EntityId, amount: f32) {
        if let Some(memory) = self.memories.get_mut(&target) {
            memory.adjust(-amount);
        }
    }

    pub fn len(&self) -> usize {
        self.memories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memories.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &TargetMemory)> {
        self.memories.iter().map(|(&id, memory)| (id, memory))
    }
}
