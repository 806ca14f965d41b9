//! Damage от конечностей
//!
//! Обрабатывает LimbStruck события (их пишет `enemy_ai_update` через `StrikeBuffer`):
//! - урон = damage атаки конечности × время контакта
//! - у конструкций дополнительно страдает ближайшая секция стены
//! - жертва с `EnemyAi` получает `CreatureAttacked` (реакция AI)

use std::collections::HashMap;

use bevy::prelude::*;

use crate::ai::{CreatureAttacked, EnemyAi, LimbStrike};
use crate::components::{EntityId, Health, Limbs, Structure};
use crate::logger;

/// Событие: конечность контактирует с целью (один тик)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct LimbStruck {
    pub strike: LimbStrike,
}

/// Событие: entity умер (health <= 0)
#[derive(Event, Debug, Clone)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<EntityId>,
}

/// Компонент-маркер: entity мертв (Health <= 0)
///
/// Трупы остаются на месте, AI снимается в `disable_ai_on_death`.
#[derive(Component, Debug)]
pub struct Dead;

/// Урон одного тика контакта
pub fn strike_damage(strike: &LimbStrike, limbs: &Limbs) -> Option<f32> {
    let attack = limbs.get(strike.limb)?.active_attack()?;
    Some(attack.damage * strike.elapsed)
}

/// Система: apply damage от LimbStruck событий
///
/// 1. Находим атакующего и жертву по EntityId
/// 2. Урон по Health (+ секция стены для Structure)
/// 3. CreatureAttacked жертвам с AI, EntityDied при смерти
pub fn apply_limb_strikes(
    mut strikes: EventReader<LimbStruck>,
    mut attacked_events: EventWriter<CreatureAttacked>,
    mut died_events: EventWriter<EntityDied>,
    ids: Query<(Entity, &EntityId)>,
    attackers: Query<&Limbs>,
    mut victims: Query<(&mut Health, Option<&mut Structure>, Has<EnemyAi>)>,
) {
    if strikes.is_empty() {
        return;
    }

    let entities: HashMap<EntityId, Entity> = ids.iter().map(|(entity, id)| (*id, entity)).collect();

    for LimbStruck { strike } in strikes.read() {
        let Some(damage) = entities
            .get(&strike.attacker)
            .and_then(|&attacker| attackers.get(attacker).ok())
            .and_then(|limbs| strike_damage(strike, limbs))
        else {
            logger::log_warning(&format!(
                "LimbStruck: attacker {} limb {} has no active attack",
                strike.attacker, strike.limb
            ));
            continue;
        };

        let Some(&victim) = entities.get(&strike.target) else {
            continue;
        };
        let Ok((mut health, structure, has_ai)) = victims.get_mut(victim) else {
            logger::log_warning(&format!("LimbStruck: target {} has no Health", strike.target));
            continue;
        };

        if let Some(mut structure) = structure {
            structure.damage_near(strike.point, damage);
        }

        let was_alive = health.is_alive();
        health.take_damage(damage);

        if has_ai {
            attacked_events.write(CreatureAttacked {
                victim,
                attacker: Some(strike.attacker),
                amount: damage,
            });
        }

        if was_alive && !health.is_alive() {
            died_events.write(EntityDied {
                entity: victim,
                killer: Some(strike.attacker),
            });
            logger::log_info(&format!("💀 {} killed by {}", strike.target, strike.attacker));
        }
    }
}

/// Система: отключение AI при смерти
///
/// AI замирает в Idle и больше не обновляется (фильтр `Without<Dead>`).
pub fn disable_ai_on_death(
    mut commands: Commands,
    mut death_events: EventReader<EntityDied>,
    mut agents: Query<&mut EnemyAi>,
) {
    for event in death_events.read() {
        if let Ok(mut ai) = agents.get_mut(event.entity) {
            ai.stand_down();
        }

        if let Ok(mut entity_commands) = commands.get_entity(event.entity) {
            entity_commands.insert(Dead);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{AttackType, Limb, LimbAttack};
    use bevy::math::Vec2;

    fn id(raw: u16) -> EntityId {
        EntityId::new(raw).unwrap()
    }

    fn strike(limb: usize, elapsed: f32) -> LimbStrike {
        LimbStrike {
            attacker: id(1),
            limb,
            target: id(2),
            point: Vec2::ZERO,
            elapsed,
            play_sound: false,
        }
    }

    #[test]
    fn test_strike_damage_scales_with_contact_time() {
        let limbs = Limbs(vec![Limb::new(Vec2::ZERO, 1.0)
            .with_attack(LimbAttack::pinch(AttackType::PinchCw, 2.0, 1.0, 40.0))]);

        assert_eq!(strike_damage(&strike(0, 0.25), &limbs), Some(10.0));
    }

    #[test]
    fn test_strike_damage_missing_or_severed_limb() {
        let mut claw = Limb::new(Vec2::ZERO, 1.0)
            .with_attack(LimbAttack::pinch(AttackType::PinchCw, 2.0, 1.0, 40.0));
        claw.severed = true;
        let limbs = Limbs(vec![claw]);

        assert_eq!(strike_damage(&strike(0, 0.25), &limbs), None);
        assert_eq!(strike_damage(&strike(3, 0.25), &limbs), None);
    }
}
