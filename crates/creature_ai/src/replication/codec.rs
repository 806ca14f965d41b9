//! Wire format replicated состояния AI
//!
//! Битовая структура (LSB-first, см. `bits`):
//! - 8 bits: AiState tag
//! - 1 bit: есть ли wall attack point
//! - 10 + 10 bits: x, y точки атаки (fixed point по [-50, 50]), только если флаг = 1
//! - 8 bits: wander angle (полный круг / 256)
//! - 16 bits: target entity id (0 = нет цели)
//!
//! Квантование lossy: позиция ±0.05 м, угол ±π/256.

use std::f32::consts::TAU;

use bevy::math::Vec2;
use thiserror::Error;

use crate::ai::AiState;
use crate::components::EntityId;

use super::bits::{BitReader, BitWriter};

pub const STATE_BITS: u8 = 8;
pub const WALL_COORD_BITS: u8 = 10;
/// Координаты точки атаки кодируются в `[-WALL_COORD_RANGE, WALL_COORD_RANGE]`
pub const WALL_COORD_RANGE: f32 = 50.0;
pub const WANDER_ANGLE_BITS: u8 = 8;
pub const TARGET_ID_BITS: u8 = 16;

/// Максимальный размер snapshot в битах
pub const MAX_SNAPSHOT_BITS: usize = (STATE_BITS
    + 1
    + 2 * WALL_COORD_BITS
    + WANDER_ANGLE_BITS
    + TARGET_ID_BITS) as usize;

/// Ошибка декодирования snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("snapshot truncated: needed {needed} more bits, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error("unknown AI state tag {0}")]
    UnknownState(u8),
}

/// Replicated состояние агента
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentSnapshot {
    pub state: AiState,
    pub wall_attack_pos: Option<Vec2>,
    /// Радианы
    pub wander_angle: f32,
    pub target_entity: Option<EntityId>,
}

impl AgentSnapshot {
    pub fn encode(&self, writer: &mut BitWriter) {
        writer.write_bits(u32::from(self.state.to_wire()), STATE_BITS);

        writer.write_bool(self.wall_attack_pos.is_some());
        if let Some(point) = self.wall_attack_pos {
            writer.write_ranged_f32(point.x, -WALL_COORD_RANGE, WALL_COORD_RANGE, WALL_COORD_BITS);
            writer.write_ranged_f32(point.y, -WALL_COORD_RANGE, WALL_COORD_RANGE, WALL_COORD_BITS);
        }

        writer.write_bits(quantize_angle(self.wander_angle), WANDER_ANGLE_BITS);
        writer.write_bits(
            u32::from(self.target_entity.map_or(0, EntityId::get)),
            TARGET_ID_BITS,
        );
    }

    /// Всё или ничего: при ошибке вызывающий сохраняет прежнее состояние
    pub fn decode(reader: &mut BitReader<'_>) -> Result<Self, DecodeError> {
        let tag = reader.read_bits(STATE_BITS)? as u8;
        let state = AiState::from_wire(tag).ok_or(DecodeError::UnknownState(tag))?;

        let wall_attack_pos = if reader.read_bool()? {
            let x = reader.read_ranged_f32(-WALL_COORD_RANGE, WALL_COORD_RANGE, WALL_COORD_BITS)?;
            let y = reader.read_ranged_f32(-WALL_COORD_RANGE, WALL_COORD_RANGE, WALL_COORD_BITS)?;
            Some(Vec2::new(x, y))
        } else {
            None
        };

        let wander_angle = dequantize_angle(reader.read_bits(WANDER_ANGLE_BITS)?);
        let target_entity = EntityId::new(reader.read_bits(TARGET_ID_BITS)? as u16);

        Ok(Self {
            state,
            wall_attack_pos,
            wander_angle,
            target_entity,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BitWriter::new();
        self.encode(&mut writer);
        writer.into_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::decode(&mut BitReader::new(bytes))
    }
}

fn angle_steps() -> f32 {
    (1u32 << WANDER_ANGLE_BITS) as f32
}

/// Угол → [0, 256), любой знак и число оборотов
fn quantize_angle(angle: f32) -> u32 {
    let turns = angle.rem_euclid(TAU) / TAU;
    ((turns * angle_steps()).round() as u32) % (1 << WANDER_ANGLE_BITS)
}

fn dequantize_angle(quantized: u32) -> f32 {
    quantized as f32 * TAU / angle_steps()
}
