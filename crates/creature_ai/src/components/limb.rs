//! Limb компоненты: конечности существа и их attack descriptors
//!
//! Атака всегда идёт через конкретную конечность (клешня, челюсть, хвост).
//! AI коммитит одну конечность на атаку и ведёт её attack timer.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Тип атаки конечности
///
/// Pinch-атаки анимируются фазами (вращение + урон в радиусе).
/// `Other` пока завершается мгновенно.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackType {
    /// Щипок по часовой стрелке
    PinchCw,
    /// Щипок против часовой стрелки
    PinchCcw,
    Other,
}

impl AttackType {
    /// Направление вращения для pinch-атак (`None` для остальных)
    pub fn pinch_direction(self) -> Option<f32> {
        match self {
            AttackType::PinchCw => Some(1.0),
            AttackType::PinchCcw => Some(-1.0),
            AttackType::Other => None,
        }
    }
}

/// Attack descriptor конечности
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimbAttack {
    pub kind: AttackType,
    /// Дальность атаки (метры от конечности до точки атаки)
    pub range: f32,
    /// Полная длительность атаки (секунды attack timer)
    pub duration: f32,
    /// Минимальный интервал между hit sounds (секунды)
    pub hit_interval: f32,
    /// Урон в секунду контакта
    pub damage: f32,
}

impl LimbAttack {
    pub fn pinch(kind: AttackType, range: f32, duration: f32, damage: f32) -> Self {
        Self {
            kind,
            range,
            duration,
            hit_interval: 0.5,
            damage,
        }
    }
}

/// Конечность существа
#[derive(Debug, Clone, PartialEq)]
pub struct Limb {
    /// Смещение от позиции агента
    pub offset: Vec2,
    pub mass: f32,
    pub attack: Option<LimbAttack>,
    /// Отрубленная конечность не атакует
    pub severed: bool,
    /// Накопленный torque за тик (читает physics layer)
    pub torque: f32,
}

impl Limb {
    pub fn new(offset: Vec2, mass: f32) -> Self {
        Self {
            offset,
            mass,
            attack: None,
            severed: false,
            torque: 0.0,
        }
    }

    pub fn with_attack(mut self, attack: LimbAttack) -> Self {
        self.attack = Some(attack);
        self
    }

    pub fn world_position(&self, agent_position: Vec2) -> Vec2 {
        agent_position + self.offset
    }

    /// Attack descriptor, если конечность может атаковать сейчас
    pub fn active_attack(&self) -> Option<&LimbAttack> {
        if self.severed {
            return None;
        }
        self.attack.as_ref()
    }
}

/// Набор конечностей агента (порядок = приоритет при выборе атакующей)
#[derive(Component, Debug, Clone, Default, Deref, DerefMut)]
pub struct Limbs(pub Vec<Limb>);
