//! Bit-level упаковка для snapshot'ов
//!
//! Биты пишутся LSB-first внутри байта, байты: по порядку.
//! Квантование float: `[min, max]` → `[0, 2^bits - 1]` с округлением.

use super::codec::DecodeError;

/// Писатель битового потока
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bit_len: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Младшие `count` бит `value` (count ≤ 32)
    pub fn write_bits(&mut self, value: u32, count: u8) {
        debug_assert!(count <= 32);
        for bit in 0..count {
            if self.bit_len % 8 == 0 {
                self.bytes.push(0);
            }
            if (value >> bit) & 1 == 1 {
                let last = self.bytes.len() - 1;
                self.bytes[last] |= 1 << (self.bit_len % 8);
            }
            self.bit_len += 1;
        }
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_bits(u32::from(value), 1);
    }

    /// Float в диапазоне `[min, max]`, зажимается в него
    pub fn write_ranged_f32(&mut self, value: f32, min: f32, max: f32, count: u8) {
        let steps = max_quantized(count) as f32;
        let normalized = ((value - min) / (max - min)).clamp(0.0, 1.0);
        let normalized = if normalized.is_nan() { 0.0 } else { normalized };
        self.write_bits((normalized * steps).round() as u32, count);
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Читатель битового потока
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() * 8 - self.position
    }

    pub fn read_bits(&mut self, count: u8) -> Result<u32, DecodeError> {
        debug_assert!(count <= 32);
        if self.remaining() < usize::from(count) {
            return Err(DecodeError::Truncated {
                needed: usize::from(count),
                remaining: self.remaining(),
            });
        }

        let mut value = 0u32;
        for bit in 0..count {
            let byte = self.bytes[self.position / 8];
            if (byte >> (self.position % 8)) & 1 == 1 {
                value |= 1 << bit;
            }
            self.position += 1;
        }
        Ok(value)
    }

    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        Ok(self.read_bits(1)? == 1)
    }

    pub fn read_ranged_f32(&mut self, min: f32, max: f32, count: u8) -> Result<f32, DecodeError> {
        let quantized = self.read_bits(count)?;
        let steps = max_quantized(count) as f32;
        Ok(min + (max - min) * quantized as f32 / steps)
    }
}

fn max_quantized(count: u8) -> u32 {
    if count >= 32 {
        u32::MAX
    } else {
        (1u32 << count) - 1
    }
}
