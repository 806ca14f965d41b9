//! AI events
//!
//! `CreatureAttacked`: combat сообщает AI жертвы о полученном уроне.
//! Реакция: `EnemyAi::on_attacked` (быстрый пересчёт целей + обида на атакующего).

use bevy::prelude::*;

use crate::components::EntityId;

/// Существо с `EnemyAi` получило урон
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct CreatureAttacked {
    /// Entity жертвы
    pub victim: Entity,
    /// Атакующий (`None`: среда, неизвестный источник)
    pub attacker: Option<EntityId>,
    /// Нанесённый урон (прирост обиды)
    pub amount: f32,
}
