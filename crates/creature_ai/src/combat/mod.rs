//! Combat module: урон от атак конечностей
//!
//! ECS ответственность:
//! - Game state: Health, секции Structure
//! - Combat rules: урон = damage × время контакта
//! - Events: LimbStruck → CreatureAttacked, EntityDied
//!
//! Решение "кого и когда бить" принимает `ai::EnemyAi`, здесь только последствия.

pub mod damage;

pub use damage::{apply_limb_strikes, disable_ai_on_death, strike_damage, Dead, EntityDied, LimbStruck};
