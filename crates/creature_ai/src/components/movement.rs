//! Movement компоненты: steering intents, скорость
//!
//! Архитектура:
//! - AI пишет high-level intents (seek/avoid/wander) через `Steering` trait
//! - `integrate_steering` (или внешний locomotion layer) превращает их в движение
//! - Wander angle принадлежит locomotion, AI его только читает (для snapshot)

use bevy::prelude::*;

use crate::ai::Steering;

/// Один steering intent за тик
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SteeringIntent {
    Seek { point: Vec2, weight: f32 },
    Avoid { weight: f32 },
    Wander { weight: f32 },
}

/// Steering state агента: накопленные intents + wander angle
#[derive(Component, Debug, Clone, Default)]
pub struct SteeringIntents {
    /// Intents текущего тика (очищаются после интеграции)
    pub intents: Vec<SteeringIntent>,
    /// Текущий угол блуждания (радианы)
    pub wander_angle: f32,
    /// Последнее направление движения (normalized или ноль)
    pub target_movement: Vec2,
}

impl Steering for SteeringIntents {
    fn seek(&mut self, point: Vec2, weight: f32) {
        self.intents.push(SteeringIntent::Seek { point, weight });
    }

    fn avoid(&mut self, weight: f32) {
        self.intents.push(SteeringIntent::Avoid { weight });
    }

    fn wander(&mut self, weight: f32) {
        self.intents.push(SteeringIntent::Wander { weight });
    }

    fn reverse_movement(&mut self) {
        self.intents.clear();
        self.target_movement = -self.target_movement;
    }
}

/// Скорость движения (метры/сек)
#[derive(Component, Clone, Copy, Debug)]
pub struct MovementSpeed {
    pub speed: f32,
}

impl Default for MovementSpeed {
    fn default() -> Self {
        Self { speed: 2.0 } // 2 m/s: базовая скорость плавания
    }
}
