//! AI systems: ECS-реализации collaborators + тик `EnemyAi`
//!
//! Каждый FixedUpdate тик:
//! 1. `react_to_attacks`: CreatureAttacked → `EnemyAi::on_attacked`
//! 2. `enemy_ai_update`: реестр целей + препятствия → решение каждого агента
//! 3. `integrate_steering`: intents → движение Transform
//!
//! Позиции: XY плоскость, `Transform::translation.truncate()`.

use bevy::prelude::*;
use rand::Rng;

use crate::combat::{Dead, LimbStruck};
use crate::components::{
    AiTarget, EntityId, Health, Limbs, MovementSpeed, SteeringIntent, SteeringIntents, Structure,
};
use crate::DeterministicRng;

use super::controller::EnemyAi;
use super::events::CreatureAttacked;
use super::world::{
    AgentView, AiContext, LimbActuator, LimbStrike, Obstruction, RayHit, TargetSnapshot, TargetView,
    VisibilityQuery,
};

/// Максимальный поворот wander angle за тик (радианы)
pub const WANDER_JITTER: f32 = 0.3;

/// Зазор вокруг конструкции, в котором работает avoid
pub const AVOID_MARGIN: f32 = 1.0;

/// Препятствие для ray cast: круг вокруг Structure
#[derive(Debug, Clone)]
struct Obstacle {
    id: EntityId,
    center: Vec2,
    health: Option<f32>,
    structure: Structure,
}

impl Obstacle {
    /// Где луч упирается в препятствие (доля отрезка)
    ///
    /// Луч из тела стены блокируется сразу, если агент не стоит в проломе.
    fn entry(&self, from: Vec2, to: Vec2) -> Option<f32> {
        if self.center.distance(from) <= self.structure.radius {
            return self.structure.is_solid_at(self.center, from).then_some(0.0);
        }
        segment_entry(from, to, self.center, self.structure.radius)
    }
}

/// Headless line-of-sight: отрезок против кругов `Structure`
#[derive(Debug, Clone, Default)]
pub struct ObstacleField {
    obstacles: Vec<Obstacle>,
}

impl ObstacleField {
    pub fn push(
        &mut self,
        id: EntityId,
        center: Vec2,
        structure: &Structure,
        health: Option<f32>,
    ) {
        self.obstacles.push(Obstacle {
            id,
            center,
            health,
            structure: structure.clone(),
        });
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }
}

/// Параметр входа отрезка `from + t*(to-from)` в круг, `None` если не пересекает
///
/// `from` снаружи круга. Касание на самой границе считается входом в `t = 0`.
fn segment_entry(from: Vec2, to: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let d = to - from;
    let f = from - center;
    let a = d.dot(d);
    if a <= f32::EPSILON {
        return None;
    }

    let b = 2.0 * f.dot(d);
    let c = f.dot(f) - radius * radius;
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let root = discriminant.sqrt();
    let exit = (-b + root) / (2.0 * a);
    if exit < 0.0 {
        return None;
    }

    let entry = ((-b - root) / (2.0 * a)).max(0.0);
    (entry <= 1.0).then_some(entry)
}

impl VisibilityQuery for ObstacleField {
    fn cast(&self, from: Vec2, to: Vec2) -> RayHit {
        let nearest = self
            .obstacles
            .iter()
            .filter_map(|o| o.entry(from, to).map(|t| (t, o)))
            .min_by(|(a, _), (b, _)| a.total_cmp(b));

        match nearest {
            Some((fraction, obstacle)) => RayHit {
                obstruction: Some(Obstruction {
                    entity: obstacle.id,
                    health: obstacle.health,
                    sections: obstacle.structure.sections.clone(),
                }),
                fraction,
                point: from.lerp(to, fraction),
            },
            None => RayHit::clear(to),
        }
    }
}

/// LimbActuator тика: копит torque и strikes до записи в ECS
#[derive(Debug, Default)]
pub struct StrikeBuffer {
    pub torques: Vec<(usize, f32)>,
    pub strikes: Vec<LimbStrike>,
}

impl LimbActuator for StrikeBuffer {
    fn apply_torque(&mut self, limb: usize, torque: f32) {
        self.torques.push((limb, torque));
    }

    fn do_damage(&mut self, strike: LimbStrike) {
        self.strikes.push(strike);
    }
}

/// Реестр целей тика, отсортирован по EntityId (= порядок спавна)
pub fn build_target_snapshot<'a>(
    targets: impl Iterator<Item = (&'a EntityId, &'a AiTarget, &'a Transform, Option<&'a Health>)>,
) -> TargetSnapshot {
    let mut views: Vec<TargetView> = targets
        .map(|(id, target, transform, health)| TargetView {
            id: *id,
            position: transform.translation.truncate(),
            sight_range: target.sight_range,
            sound_range: target.sound_range,
            category: target.category.clone(),
            health: health.map(|h| h.current),
        })
        .collect();
    views.sort_by_key(|view| view.id);

    TargetSnapshot::new(views)
}

/// +1.0 если агент смотрит вдоль +X, иначе -1.0
fn facing(transform: &Transform) -> f32 {
    if (transform.rotation * Vec3::X).x < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Система: реакция AI на полученный урон
pub fn react_to_attacks(
    mut attacked_events: EventReader<CreatureAttacked>,
    mut agents: Query<&mut EnemyAi>,
) {
    for event in attacked_events.read() {
        let Ok(mut ai) = agents.get_mut(event.victim) else {
            continue;
        };
        ai.on_attacked(event.attacker, event.amount);
    }
}

/// Система: тик решения всех живых агентов
///
/// Агенты обрабатываются по возрастанию EntityId (детерминизм RNG).
pub fn enemy_ai_update(
    time: Res<Time<Fixed>>,
    mut rng: ResMut<DeterministicRng>,
    targets: Query<(&EntityId, &AiTarget, &Transform, Option<&Health>)>,
    structures: Query<(&EntityId, &Structure, &Transform, Option<&Health>)>,
    mut agents: Query<
        (Entity, &EntityId, &Transform, &mut EnemyAi, &mut SteeringIntents, &mut Limbs),
        Without<Dead>,
    >,
    mut strike_events: EventWriter<LimbStruck>,
) {
    let dt = time.delta_secs();
    if dt <= 0.0 {
        return;
    }

    let registry = build_target_snapshot(targets.iter());

    let mut field = ObstacleField::default();
    for (id, structure, transform, health) in structures.iter() {
        field.push(*id, transform.translation.truncate(), structure, health.map(|h| h.current));
    }

    let mut order: Vec<(EntityId, Entity)> =
        agents.iter().map(|(entity, id, ..)| (*id, entity)).collect();
    order.sort_by_key(|(id, _)| *id);

    for (_, entity) in order {
        let Ok((_, id, transform, mut ai, mut steering, mut limbs)) = agents.get_mut(entity) else {
            continue;
        };

        for limb in limbs.iter_mut() {
            limb.torque = 0.0;
        }

        let mut buffer = StrikeBuffer::default();
        let mut ctx = AiContext {
            agent: AgentView {
                id: *id,
                position: transform.translation.truncate(),
                facing: facing(transform),
            },
            limbs: &limbs.0,
            registry: &registry,
            visibility: &field,
            steering: &mut *steering,
            actuator: &mut buffer,
            rng: &mut rng.rng,
        };
        ai.update(dt, &mut ctx);

        for (index, torque) in buffer.torques {
            if let Some(limb) = limbs.get_mut(index) {
                limb.torque += torque;
            }
        }
        for strike in buffer.strikes {
            strike_events.write(LimbStruck { strike });
        }
    }
}

/// Система: steering intents → движение
///
/// Seek тянет к точке, Wander: по wander angle, Avoid отталкивает от
/// конструкций в пределах `radius + AVOID_MARGIN`. Без intents агент
/// продолжает двигаться по `target_movement` (так работает разворот).
///
/// Шаг, уводящий глубже в целое тело `Structure`, отменяется: сквозь стену
/// проходят только через пробитую секцию.
pub fn integrate_steering(
    time: Res<Time<Fixed>>,
    mut rng: ResMut<DeterministicRng>,
    mut agents: Query<(&mut Transform, &mut SteeringIntents, &MovementSpeed), Without<Dead>>,
    structures: Query<(&Structure, &Transform), Without<SteeringIntents>>,
) {
    let dt = time.delta_secs();

    for (mut transform, mut steering, speed) in agents.iter_mut() {
        let position = transform.translation.truncate();
        let mut desired = Vec2::ZERO;

        let intents = std::mem::take(&mut steering.intents);
        for intent in &intents {
            match *intent {
                SteeringIntent::Seek { point, weight } => {
                    desired += (point - position).normalize_or_zero() * weight;
                }
                SteeringIntent::Wander { weight } => {
                    steering.wander_angle += rng.rng.gen_range(-WANDER_JITTER..=WANDER_JITTER);
                    desired += Vec2::from_angle(steering.wander_angle) * weight;
                }
                SteeringIntent::Avoid { weight } => {
                    for (structure, structure_transform) in structures.iter() {
                        let center = structure_transform.translation.truncate();
                        let reach = structure.radius + AVOID_MARGIN;
                        let distance = position.distance(center);
                        if distance < reach {
                            let push = (position - center).normalize_or_zero();
                            desired += push * weight * (1.0 - distance / reach);
                        }
                    }
                }
            }
        }

        if !intents.is_empty() {
            steering.target_movement = desired.normalize_or_zero();
        }

        let movement = steering.target_movement;
        if movement == Vec2::ZERO {
            continue;
        }

        transform.rotation = if movement.x < 0.0 {
            Quat::from_rotation_z(std::f32::consts::PI)
        } else {
            Quat::IDENTITY
        };

        let next = position + movement * speed.speed * dt;
        let blocked = structures.iter().any(|(structure, structure_transform)| {
            let center = structure_transform.translation.truncate();
            structure.is_solid_at(center, next) && next.distance(center) < position.distance(center)
        });
        if blocked {
            continue;
        }

        transform.translation = next.extend(transform.translation.z);
    }
}
