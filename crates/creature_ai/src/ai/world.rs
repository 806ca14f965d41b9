//! Collaborator contracts для AI core
//!
//! AI ничего не знает про ECS queries, physics engine или рендер. Всё внешнее
//! приходит через эти traits:
//! - `TargetRegistry`: read-only список живых целей (insertion order)
//! - `VisibilityQuery`: ray cast между двумя точками
//! - `Steering`: locomotion intents
//! - `LimbActuator`: torque + damage через конечности
//!
//! ECS-реализации живут в `ai::systems`, тесты подставляют свои.

use bevy::math::Vec2;
use rand::RngCore;

use crate::components::{EntityId, Limb, TargetCategory, WallSection};

/// Агент, за которого принимается решение
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentView {
    pub id: EntityId,
    pub position: Vec2,
    /// +1.0 смотрит вправо, -1.0 влево (знак torque pinch-атак)
    pub facing: f32,
}

/// Снимок одной цели на текущий тик
#[derive(Debug, Clone, PartialEq)]
pub struct TargetView {
    pub id: EntityId,
    pub position: Vec2,
    pub sight_range: f32,
    pub sound_range: f32,
    pub category: TargetCategory,
    /// `None`: цель не damageable (например, отсек)
    pub health: Option<f32>,
}

impl TargetView {
    pub fn is_damageable(&self) -> bool {
        self.health.is_some()
    }

    /// Damageable цель с нулевым здоровьем уже уничтожена
    pub fn is_destroyed(&self) -> bool {
        matches!(self.health, Some(health) if health <= 0.0)
    }
}

/// Read-only реестр живых целей
pub trait TargetRegistry {
    fn find_by_id(&self, id: EntityId) -> Option<&TargetView>;

    /// Все живые цели в порядке регистрации
    fn all_live_targets(&self) -> &[TargetView];
}

/// Vec-backed реестр (ECS снимок тика или тестовый набор)
#[derive(Debug, Clone, Default)]
pub struct TargetSnapshot {
    targets: Vec<TargetView>,
}

impl TargetSnapshot {
    pub fn new(targets: Vec<TargetView>) -> Self {
        Self { targets }
    }

    pub fn push(&mut self, target: TargetView) {
        self.targets.push(target);
    }

    pub fn remove(&mut self, id: EntityId) -> Option<TargetView> {
        let index = self.targets.iter().position(|t| t.id == id)?;
        Some(self.targets.remove(index))
    }
}

impl TargetRegistry for TargetSnapshot {
    fn find_by_id(&self, id: EntityId) -> Option<&TargetView> {
        self.targets.iter().find(|t| t.id == id)
    }

    fn all_live_targets(&self) -> &[TargetView] {
        &self.targets
    }
}

/// Препятствие, в которое упёрся луч
#[derive(Debug, Clone, PartialEq)]
pub struct Obstruction {
    pub entity: EntityId,
    /// `Some` для damageable конструкций (стены), `None` для глухой геометрии
    pub health: Option<f32>,
    /// Секции стены в порядке вдоль неё (пусто у не-стен)
    pub sections: Vec<WallSection>,
}

impl Obstruction {
    pub fn is_damageable_structure(&self) -> bool {
        self.health.is_some()
    }
}

/// Результат ray cast
#[derive(Debug, Clone, PartialEq)]
pub struct RayHit {
    pub obstruction: Option<Obstruction>,
    /// 1.0: луч дошёл до конца без препятствий
    pub fraction: f32,
    pub point: Vec2,
}

impl RayHit {
    pub fn clear(to: Vec2) -> Self {
        Self {
            obstruction: None,
            fraction: 1.0,
            point: to,
        }
    }
}

/// Line-of-sight ray cast
pub trait VisibilityQuery {
    fn cast(&self, from: Vec2, to: Vec2) -> RayHit;
}

/// Мир без препятствий
#[derive(Debug, Clone, Copy, Default)]
pub struct ClearSight;

impl VisibilityQuery for ClearSight {
    fn cast(&self, _from: Vec2, to: Vec2) -> RayHit {
        RayHit::clear(to)
    }
}

/// Locomotion intents
pub trait Steering {
    fn seek(&mut self, point: Vec2, weight: f32);
    fn avoid(&mut self, weight: f32);
    fn wander(&mut self, weight: f32);
    /// Развернуть текущее направление движения
    fn reverse_movement(&mut self);
}

/// Один тик контакта конечности с целью
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimbStrike {
    pub attacker: EntityId,
    pub limb: usize,
    pub target: EntityId,
    pub point: Vec2,
    /// Длительность контакта (секунды)
    pub elapsed: f32,
    pub play_sound: bool,
}

/// Физические эффекты атаки через конечности
pub trait LimbActuator {
    fn apply_torque(&mut self, limb: usize, torque: f32);
    fn do_damage(&mut self, strike: LimbStrike);
}

/// Всё, что нужно `EnemyAi::update` на один тик
pub struct AiContext<'a> {
    pub agent: AgentView,
    pub limbs: &'a [Limb],
    pub registry: &'a dyn TargetRegistry,
    pub visibility: &'a dyn VisibilityQuery,
    pub steering: &'a mut dyn Steering,
    pub actuator: &'a mut dyn LimbActuator,
    /// Seeded RNG (disengagement rolls)
    pub rng: &'a mut dyn RngCore,
}
