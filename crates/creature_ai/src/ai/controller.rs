//! EnemyAi: attack state machine существа
//!
//! Idle (блуждание) → Pursuing (атака/бегство) → CoolingDown (отход после атаки).
//!
//! Каждый тик `update`:
//! 1. Таймер пересчёта целей → `TargetSelector::evaluate`
//! 2. Переход по результату (нет цели → Idle)
//! 3. Поведение текущего режима: wander / flee / cooldown / attack phases
//!
//! Атака идёт через одну закоммиченную конечность. Если между нами и целью
//! стоит стена: бьём слабое место стены (`wall_attack_pos`).

use bevy::prelude::*;

use crate::components::{nearest_section, AttackType, EntityId, Limb, LimbAttack, WallSection};
use crate::logger;
use crate::replication::AgentSnapshot;

use super::config::AiConfig;
use super::selector::{SelectionResult, TargetSelector};
use super::world::{AiContext, LimbStrike, Obstruction, TargetView, VisibilityQuery};

/// Value принудительно выбранной цели (`select_target`)
pub const FORCED_SELECTION_VALUE: f32 = 100.0;

/// Множитель cooldown при получении урона
pub const COOLDOWN_INTERRUPT_FACTOR: f32 = 0.1;

/// Torque pinch-атаки на единицу массы конечности
pub const PINCH_TORQUE_PER_MASS: f32 = 50.0;

/// Скорость attack timer вне половины дальности (доля от dt)
pub const APPROACH_TIMER_RATE: f32 = 0.05;

/// Сколько секций в каждую сторону от точки попадания проверяем на слабое место
pub const WEAK_POINT_SEARCH_RADIUS: usize = 2;

/// Режим AI (replicated, wire tag = discriminant)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum AiState {
    #[default]
    Idle = 0,
    Pursuing = 1,
    CoolingDown = 2,
}

impl AiState {
    pub fn from_wire(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(AiState::Idle),
            1 => Some(AiState::Pursuing),
            2 => Some(AiState::CoolingDown),
            _ => None,
        }
    }

    pub fn to_wire(self) -> u8 {
        self as u8
    }
}

/// Намерение по отношению к выбранной цели
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Attack,
    Flee,
}

/// Состояние исполнения атаки
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AttackExecution {
    /// Индекс закоммиченной конечности в `Limbs`
    pub attacking_limb: Option<usize>,
    pub attack_timer: f32,
    pub cool_down_timer: f32,
    /// До следующего разрешённого hit sound
    pub sound_timer: f32,
}

impl AttackExecution {
    fn reset_attack(&mut self) {
        self.attacking_limb = None;
        self.attack_timer = 0.0;
        self.sound_timer = 0.0;
    }

    fn tick_cooldown(&mut self, dt: f32) {
        self.cool_down_timer = (self.cool_down_timer - dt).max(0.0);
    }
}

/// AI враждебного существа (один на агента)
#[derive(Component, Debug, Clone)]
pub struct EnemyAi {
    config: AiConfig,
    selector: TargetSelector,
    state: AiState,
    selected: Option<SelectionResult>,
    update_targets_timer: f32,
    raycast_timer: f32,
    execution: AttackExecution,
    wall_attack_pos: Option<Vec2>,
    target_entity: Option<EntityId>,
}

impl Default for EnemyAi {
    fn default() -> Self {
        Self::new(AiConfig::default())
    }
}

impl EnemyAi {
    /// Первый `update` сразу запускает оценку целей
    pub fn new(config: AiConfig) -> Self {
        Self {
            config,
            selector: TargetSelector::new(),
            state: AiState::Idle,
            selected: None,
            update_targets_timer: 0.0,
            raycast_timer: 0.0,
            execution: AttackExecution::default(),
            wall_attack_pos: None,
            target_entity: None,
        }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    pub fn state(&self) -> AiState {
        self.state
    }

    pub fn selected(&self) -> Option<SelectionResult> {
        self.selected
    }

    pub fn intent(&self) -> Option<Intent> {
        self.selected.map(|selection| {
            if selection.is_attack() {
                Intent::Attack
            } else {
                Intent::Flee
            }
        })
    }

    pub fn execution(&self) -> &AttackExecution {
        &self.execution
    }

    pub fn wall_attack_pos(&self) -> Option<Vec2> {
        self.wall_attack_pos
    }

    pub fn target_entity(&self) -> Option<EntityId> {
        self.target_entity
    }

    pub fn update_targets_timer(&self) -> f32 {
        self.update_targets_timer
    }

    pub fn selector(&self) -> &TargetSelector {
        &self.selector
    }

    pub fn selector_mut(&mut self) -> &mut TargetSelector {
        &mut self.selector
    }

    /// Один тик решения
    pub fn update(&mut self, dt: f32, ctx: &mut AiContext<'_>) {
        self.update_targets_timer -= dt;
        if self.update_targets_timer <= 0.0 {
            self.update_targets_timer = self.config.update_targets_interval;

            let outcome = self.selector.evaluate(
                &self.config,
                &ctx.agent,
                ctx.registry,
                ctx.visibility,
                &mut *ctx.rng,
            );

            if outcome.disengaged {
                ctx.steering.reverse_movement();
                self.enter_idle();
                return;
            }

            let previous = self.selected.map(|s| s.target);
            self.apply_selection(outcome.selection);
            log_retarget(ctx.agent.id, previous, outcome.selection);
        }

        let Some(selection) = self.selected else {
            self.update_idle(dt, ctx);
            return;
        };

        let registry = ctx.registry;
        let Some(target) = registry.find_by_id(selection.target) else {
            logger::log(&format!(
                "👻 {} lost target {} → Idle",
                ctx.agent.id, selection.target
            ));
            self.enter_idle();
            self.update_idle(dt, ctx);
            return;
        };

        if !selection.is_attack() {
            self.update_flee(dt, target, ctx);
        } else if self.execution.cool_down_timer > 0.0 {
            self.update_cooldown(dt, target, ctx);
        } else {
            self.update_attack(dt, selection, target, ctx);
        }
    }

    /// Нас ударили: быстрее пересчитать цели, сократить cooldown, запомнить обидчика
    pub fn on_attacked(&mut self, attacker: Option<EntityId>, amount: f32) {
        self.update_targets_timer = self
            .update_targets_timer
            .min(self.config.reactive_update_interval);
        self.execution.cool_down_timer *= COOLDOWN_INTERRUPT_FACTOR;

        if let Some(attacker) = attacker {
            self.selector.memory_mut().reinforce(attacker, amount);
        }
    }

    /// Принудительная цель (до следующего цикла оценки)
    pub fn select_target(&mut self, target: EntityId) {
        logger::log(&format!("🎯 forced target {}", target));
        self.apply_selection(Some(SelectionResult {
            target,
            value: FORCED_SELECTION_VALUE,
        }));
    }

    /// Сбросить цель и атаку (смерть, оглушение)
    pub fn stand_down(&mut self) {
        self.enter_idle();
        self.execution.cool_down_timer = 0.0;
    }

    /// Replicated часть состояния (wander angle принадлежит steering)
    pub fn agent_state(&self, wander_angle: f32) -> AgentSnapshot {
        AgentSnapshot {
            state: self.state,
            wall_attack_pos: self.wall_attack_pos,
            wander_angle,
            target_entity: self.target_entity,
        }
    }

    /// Observer: перезаписать состояние пришедшим snapshot
    pub fn apply_agent_state(&mut self, snapshot: &AgentSnapshot) {
        self.state = snapshot.state;
        self.wall_attack_pos = snapshot.wall_attack_pos;
        self.target_entity = snapshot.target_entity;
    }

    fn apply_selection(&mut self, selection: Option<SelectionResult>) {
        let Some(selection) = selection else {
            self.enter_idle();
            return;
        };

        let previous_target = self.selected.map(|s| s.target);
        if previous_target != Some(selection.target) {
            self.wall_attack_pos = None;
            self.target_entity = None;
            self.raycast_timer = 0.0;
            self.execution.reset_attack();
        }

        self.selected = Some(selection);
        self.state = if self.execution.cool_down_timer > 0.0 {
            AiState::CoolingDown
        } else {
            AiState::Pursuing
        };
    }

    fn enter_idle(&mut self) {
        self.selected = None;
        self.state = AiState::Idle;
        self.wall_attack_pos = None;
        self.target_entity = None;
        self.execution.reset_attack();
    }

    fn update_idle(&mut self, dt: f32, ctx: &mut AiContext<'_>) {
        self.state = AiState::Idle;
        ctx.steering.wander(1.0);
        ctx.steering.avoid(1.0);
        self.execution.reset_attack();
        self.execution.tick_cooldown(dt);
    }

    /// Бежим к точке, зеркальной цели относительно агента
    fn update_flee(&mut self, dt: f32, target: &TargetView, ctx: &mut AiContext<'_>) {
        self.state = AiState::Pursuing;
        self.execution.reset_attack();
        self.execution.tick_cooldown(dt);

        let agent = ctx.agent.position;
        let away = (agent - target.position).normalize_or_zero();
        let away = if away == Vec2::ZERO { Vec2::X } else { away };
        let flee_distance = agent.distance(target.position).max(1.0);

        ctx.steering.seek(agent + away * flee_distance, 1.0);
        ctx.steering.avoid(1.0);
    }

    fn update_cooldown(&mut self, dt: f32, target: &TargetView, ctx: &mut AiContext<'_>) {
        self.state = AiState::CoolingDown;

        let agent = ctx.agent.position;
        let attack_point = self.wall_attack_pos.unwrap_or(target.position);
        let retreat = self.config.cooldown_retreat_distance;

        if agent.distance(attack_point) < retreat {
            let away = (agent - attack_point).normalize_or_zero();
            ctx.steering.seek(agent + away * retreat, 1.0);
        } else {
            ctx.steering.seek(attack_point, 1.0);
        }
        ctx.steering.avoid(1.0);

        self.execution.tick_cooldown(dt);
        if self.execution.cool_down_timer <= 0.0 {
            self.state = AiState::Pursuing;
        }
    }

    fn update_attack(
        &mut self,
        dt: f32,
        selection: SelectionResult,
        target: &TargetView,
        ctx: &mut AiContext<'_>,
    ) {
        self.state = AiState::Pursuing;
        self.selector.memory_mut().drain(selection.target, dt);

        self.raycast_timer -= dt;
        if self.raycast_timer <= 0.0 {
            self.raycast_timer = self.config.raycast_interval;
            self.locate_attack_point(ctx.agent.position, target, ctx.visibility);
        }

        let attack_point = self.wall_attack_pos.unwrap_or(target.position);
        ctx.steering.seek(attack_point, 1.0);

        let limbs = ctx.limbs;
        if self.execution.attacking_limb.is_none() {
            self.execution.attacking_limb = pick_limb(limbs, ctx.agent.position, attack_point);
            self.execution.sound_timer = 0.0;
        }

        let Some(limb_index) = self.execution.attacking_limb else {
            return;
        };

        let Some(limb) = limbs.get(limb_index) else {
            self.execution.reset_attack();
            return;
        };
        let Some(attack) = limb.active_attack().copied() else {
            // конечность отрубили посреди атаки
            self.execution.reset_attack();
            return;
        };

        match attack.kind {
            AttackType::PinchCw | AttackType::PinchCcw => {
                self.advance_pinch(dt, limb_index, limb, &attack, attack_point, ctx)
            }
            AttackType::Other => self.advance_instant(&attack),
        }

        if self.execution.attack_timer >= attack.duration {
            self.finish_attack(ctx.agent.id, ctx.agent.position, attack_point);
        }
    }

    /// Ray cast к цели: прямое попадание или слабое место стены
    fn locate_attack_point(
        &mut self,
        agent: Vec2,
        target: &TargetView,
        visibility: &dyn VisibilityQuery,
    ) {
        let hit = visibility.cast(agent, target.position);
        let wall = hit
            .obstruction
            .as_ref()
            .filter(|o| o.entity != target.id && o.is_damageable_structure());

        match wall {
            Some(wall) => {
                self.wall_attack_pos = Some(weak_point(wall, hit.point));
                self.target_entity = Some(wall.entity);
            }
            None => {
                self.wall_attack_pos = None;
                self.target_entity = target.is_damageable().then_some(target.id);
            }
        }
    }

    /// Pinch: вращаем конечность и наносим урон, пока точка в половине дальности
    fn advance_pinch(
        &mut self,
        dt: f32,
        limb_index: usize,
        limb: &Limb,
        attack: &LimbAttack,
        attack_point: Vec2,
        ctx: &mut AiContext<'_>,
    ) {
        let Some(direction) = attack.kind.pinch_direction() else {
            return;
        };

        let reach = limb.world_position(ctx.agent.position).distance(attack_point);
        if reach >= attack.range * 0.5 {
            self.execution.attack_timer += dt * APPROACH_TIMER_RATE;
            return;
        }

        self.execution.attack_timer += dt;
        ctx.actuator.apply_torque(
            limb_index,
            limb.mass * PINCH_TORQUE_PER_MASS * ctx.agent.facing * direction,
        );

        let Some(target) = self.target_entity else {
            return;
        };

        self.execution.sound_timer -= dt;
        let play_sound = self.execution.sound_timer <= 0.0;
        if play_sound {
            self.execution.sound_timer = attack.hit_interval;
        }

        ctx.actuator.do_damage(LimbStrike {
            attacker: ctx.agent.id,
            limb: limb_index,
            target,
            point: attack_point,
            elapsed: dt,
            play_sound,
        });
    }

    fn advance_instant(&mut self, attack: &LimbAttack) {
        self.execution.attack_timer = attack.duration;
    }

    fn finish_attack(&mut self, agent: EntityId, position: Vec2, attack_point: Vec2) {
        self.wall_attack_pos = None;
        self.execution.reset_attack();

        if position.distance(attack_point) < self.config.cooldown_proximity {
            self.execution.cool_down_timer = self.config.attack_cooldown;
            self.state = AiState::CoolingDown;
            logger::log(&format!(
                "⚔️ {} attack finished → cooldown {:.1}s",
                agent, self.config.attack_cooldown
            ));
        }
    }
}

fn log_retarget(agent: EntityId, previous: Option<EntityId>, selection: Option<SelectionResult>) {
    match (previous, selection) {
        (Some(previous), None) => {
            logger::log(&format!("💤 {} dropped target {} → Idle", agent, previous));
        }
        (_, Some(selection)) if previous != Some(selection.target) => {
            logger::log(&format!(
                "🎯 {} → target {} (value {:.3})",
                agent, selection.target, selection.value
            ));
        }
        _ => {}
    }
}

/// Первая активная конечность, достающая до точки атаки
fn pick_limb(limbs: &[Limb], agent: Vec2, attack_point: Vec2) -> Option<usize> {
    limbs.iter().position(|limb| {
        limb.active_attack()
            .is_some_and(|attack| limb.world_position(agent).distance(attack_point) <= attack.range)
    })
}

/// Слабое место стены рядом с точкой попадания
///
/// Пробитая секция (±2 от ближайшей) выигрывает сразу, иначе самая повреждённая.
fn weak_point(wall: &Obstruction, impact: Vec2) -> Vec2 {
    let sections: &[WallSection] = &wall.sections;
    let Some(hit_index) = nearest_section(sections, impact) else {
        return impact;
    };

    let first = hit_index.saturating_sub(WEAK_POINT_SEARCH_RADIUS);
    let last = (hit_index + WEAK_POINT_SEARCH_RADIUS).min(sections.len() - 1);

    let mut best = hit_index;
    for index in first..=last {
        if sections[index].is_breached() {
            best = index;
            break;
        }
        if sections[index].damage() > sections[best].damage() {
            best = index;
        }
    }

    sections[best].position
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::world::{AgentView, ClearSight, LimbActuator, RayHit, TargetSnapshot};
    use crate::components::{SteeringIntent, SteeringIntents, TargetCategory};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rstest::rstest;

    const AGENT: u16 = 100;

    fn id(raw: u16) -> EntityId {
        EntityId::new(raw).unwrap()
    }

    fn creature(raw: u16, position: Vec2, combat_strength: f32, health: f32) -> TargetView {
        TargetView {
            id: id(raw),
            position,
            sight_range: 20.0,
            sound_range: 0.0,
            category: TargetCategory::Creature {
                species: "diver".to_string(),
                combat_strength,
            },
            health: Some(health),
        }
    }

    fn prey_at(x: f32) -> TargetSnapshot {
        TargetSnapshot::new(vec![creature(1, Vec2::new(x, 0.0), 0.5, 10.0)])
    }

    fn claw(kind: AttackType, range: f32) -> Limb {
        Limb::new(Vec2::ZERO, 2.0).with_attack(LimbAttack::pinch(kind, range, 1.0, 10.0))
    }

    #[derive(Default)]
    struct RecordingActuator {
        torques: Vec<(usize, f32)>,
        strikes: Vec<LimbStrike>,
    }

    impl LimbActuator for RecordingActuator {
        fn apply_torque(&mut self, limb: usize, torque: f32) {
            self.torques.push((limb, torque));
        }

        fn do_damage(&mut self, strike: LimbStrike) {
            self.strikes.push(strike);
        }
    }

    /// Любой луч упирается в одну и ту же стену
    struct WallInTheWay(Obstruction, Vec2);

    impl VisibilityQuery for WallInTheWay {
        fn cast(&self, _from: Vec2, _to: Vec2) -> RayHit {
            RayHit {
                obstruction: Some(self.0.clone()),
                fraction: 0.5,
                point: self.1,
            }
        }
    }

    struct Harness {
        steering: SteeringIntents,
        actuator: RecordingActuator,
        rng: ChaCha8Rng,
        position: Vec2,
    }

    impl Harness {
        fn new(seed: u64) -> Self {
            Self {
                steering: SteeringIntents::default(),
                actuator: RecordingActuator::default(),
                rng: ChaCha8Rng::seed_from_u64(seed),
                position: Vec2::ZERO,
            }
        }

        fn tick(
            &mut self,
            ai: &mut EnemyAi,
            dt: f32,
            limbs: &[Limb],
            registry: &TargetSnapshot,
            visibility: &dyn VisibilityQuery,
        ) {
            self.steering.intents.clear();
            let mut ctx = AiContext {
                agent: AgentView {
                    id: id(AGENT),
                    position: self.position,
                    facing: 1.0,
                },
                limbs,
                registry,
                visibility,
                steering: &mut self.steering,
                actuator: &mut self.actuator,
                rng: &mut self.rng,
            };
            ai.update(dt, &mut ctx);
        }
    }

    #[test]
    fn test_no_targets_wanders() {
        let mut ai = EnemyAi::default();
        let mut harness = Harness::new(1);

        harness.tick(&mut ai, 0.1, &[], &TargetSnapshot::default(), &ClearSight);

        assert_eq!(ai.state(), AiState::Idle);
        assert!(ai.selected().is_none());
        assert!(harness.steering.intents.contains(&SteeringIntent::Wander { weight: 1.0 }));
        assert!(harness.steering.intents.contains(&SteeringIntent::Avoid { weight: 1.0 }));
    }

    #[test]
    fn test_on_attacked_shortens_cooldown_and_cycle() {
        let mut ai = EnemyAi::default();
        ai.execution.cool_down_timer = 10.0;
        ai.update_targets_timer = 4.0;
        ai.selector_mut().memory_mut().get_or_create(id(7)).set_priority(50.0);

        ai.on_attacked(Some(id(7)), 5.0);

        assert_eq!(ai.execution().cool_down_timer, 1.0);
        assert_eq!(ai.update_targets_timer(), 0.1);
        let priority = ai.selector().memory().get(id(7)).map(|m| m.priority());
        assert_eq!(priority, Some(55.0));
    }

    #[test]
    fn test_on_attacked_without_attacker_keeps_memory_untouched() {
        let mut ai = EnemyAi::default();
        ai.update_targets_timer = 0.05;

        ai.on_attacked(None, 5.0);

        assert_eq!(ai.update_targets_timer(), 0.05);
        assert!(ai.selector().memory().is_empty());
    }

    #[rstest]
    #[case::close_starts_cooldown(3.0, true)]
    #[case::far_no_cooldown(8.0, false)]
    fn attack_completion_cooldown_depends_on_proximity(
        #[case] target_x: f32,
        #[case] expect_cooldown: bool,
    ) {
        let mut ai = EnemyAi::default();
        let mut harness = Harness::new(1);
        let limbs = [claw(AttackType::Other, 10.0)];

        harness.tick(&mut ai, 0.1, &limbs, &prey_at(target_x), &ClearSight);

        assert_eq!(ai.execution().attacking_limb, None);
        assert_eq!(ai.execution().attack_timer, 0.0);
        if expect_cooldown {
            assert_eq!(ai.execution().cool_down_timer, 5.0);
            assert_eq!(ai.state(), AiState::CoolingDown);
        } else {
            assert_eq!(ai.execution().cool_down_timer, 0.0);
            assert_eq!(ai.state(), AiState::Pursuing);
        }
    }

    #[test]
    fn test_pinch_applies_torque_and_rate_limits_sound() {
        let mut ai = EnemyAi::default();
        let mut harness = Harness::new(1);
        let limbs = [claw(AttackType::PinchCw, 4.0)];
        let registry = prey_at(1.0);

        for _ in 0..4 {
            harness.tick(&mut ai, 0.25, &limbs, &registry, &ClearSight);
        }

        assert_eq!(harness.actuator.torques, vec![(0, 100.0); 4]);
        let sounds: Vec<bool> = harness.actuator.strikes.iter().map(|s| s.play_sound).collect();
        assert_eq!(sounds, vec![true, false, true, false]);
        assert!(harness.actuator.strikes.iter().all(|s| s.target == id(1) && s.elapsed == 0.25));

        // 4 × 0.25 = duration → атака завершена вплотную к цели
        assert_eq!(ai.state(), AiState::CoolingDown);
        assert_eq!(ai.execution().attacking_limb, None);
    }

    #[test]
    fn test_ccw_pinch_reverses_torque() {
        let mut ai = EnemyAi::default();
        let mut harness = Harness::new(1);
        let limbs = [claw(AttackType::PinchCcw, 4.0)];

        harness.tick(&mut ai, 0.25, &limbs, &prey_at(1.0), &ClearSight);

        assert_eq!(harness.actuator.torques, vec![(0, -100.0)]);
    }

    #[test]
    fn test_pinch_outside_half_range_only_creeps_timer() {
        let mut ai = EnemyAi::default();
        let mut harness = Harness::new(1);
        let limbs = [claw(AttackType::PinchCw, 4.0)];

        harness.tick(&mut ai, 0.25, &limbs, &prey_at(3.0), &ClearSight);

        assert_eq!(ai.execution().attacking_limb, Some(0));
        approx::assert_relative_eq!(ai.execution().attack_timer, 0.25 * APPROACH_TIMER_RATE);
        assert!(harness.actuator.torques.is_empty());
        assert!(harness.actuator.strikes.is_empty());
    }

    #[test]
    fn test_no_limb_in_range_skips_attack() {
        let mut ai = EnemyAi::default();
        let mut harness = Harness::new(1);
        let limbs = [claw(AttackType::PinchCw, 2.0)];

        harness.tick(&mut ai, 0.25, &limbs, &prey_at(6.0), &ClearSight);

        assert_eq!(ai.state(), AiState::Pursuing);
        assert_eq!(ai.execution().attacking_limb, None);
        assert!(harness
            .steering
            .intents
            .contains(&SteeringIntent::Seek { point: Vec2::new(6.0, 0.0), weight: 1.0 }));
    }

    #[test]
    fn test_severed_limb_is_never_committed() {
        let mut ai = EnemyAi::default();
        let mut harness = Harness::new(1);
        let mut severed = claw(AttackType::PinchCw, 4.0);
        severed.severed = true;
        let limbs = [severed, claw(AttackType::PinchCcw, 4.0)];

        harness.tick(&mut ai, 0.25, &limbs, &prey_at(1.0), &ClearSight);

        assert_eq!(ai.execution().attacking_limb, Some(1));
    }

    #[test]
    fn test_stale_target_falls_back_to_idle() {
        let mut ai = EnemyAi::default();
        let mut harness = Harness::new(1);
        let mut registry = prey_at(6.0);

        harness.tick(&mut ai, 0.1, &[], &registry, &ClearSight);
        assert_eq!(ai.selected().map(|s| s.target), Some(id(1)));

        registry.remove(id(1));
        harness.tick(&mut ai, 0.1, &[], &registry, &ClearSight);

        assert_eq!(ai.state(), AiState::Idle);
        assert!(ai.selected().is_none());
        assert!(ai.target_entity().is_none());
        assert!(harness.steering.intents.contains(&SteeringIntent::Wander { weight: 1.0 }));
    }

    #[test]
    fn test_stronger_creature_triggers_flee() {
        let mut ai = EnemyAi::default();
        let mut harness = Harness::new(1);
        let registry = TargetSnapshot::new(vec![creature(3, Vec2::new(2.0, 0.0), 5.0, 50.0)]);

        harness.tick(&mut ai, 0.1, &[claw(AttackType::Other, 10.0)], &registry, &ClearSight);

        assert_eq!(ai.intent(), Some(Intent::Flee));
        assert_eq!(ai.execution().attacking_limb, None);
        assert!(harness
            .steering
            .intents
            .contains(&SteeringIntent::Seek { point: Vec2::new(-2.0, 0.0), weight: 1.0 }));
    }

    #[test]
    fn test_cooldown_retreats_when_close() {
        let mut ai = EnemyAi::default();
        let mut harness = Harness::new(1);
        let limbs = [claw(AttackType::Other, 10.0)];
        let registry = prey_at(1.0);

        harness.tick(&mut ai, 0.1, &limbs, &registry, &ClearSight);
        assert_eq!(ai.state(), AiState::CoolingDown);

        harness.tick(&mut ai, 0.5, &limbs, &registry, &ClearSight);

        assert_eq!(ai.state(), AiState::CoolingDown);
        assert_eq!(ai.execution().cool_down_timer, 4.5);
        assert!(harness
            .steering
            .intents
            .contains(&SteeringIntent::Seek { point: Vec2::new(-3.0, 0.0), weight: 1.0 }));
    }

    #[test]
    fn test_select_target_forces_pursuit() {
        let mut ai = EnemyAi::default();

        ai.select_target(id(42));

        assert_eq!(ai.state(), AiState::Pursuing);
        assert_eq!(
            ai.selected(),
            Some(SelectionResult {
                target: id(42),
                value: FORCED_SELECTION_VALUE
            })
        );
    }

    fn wall_obstruction(breached: Option<usize>, damaged: &[(usize, f32)]) -> Obstruction {
        let mut sections: Vec<WallSection> = (0..7)
            .map(|i| WallSection::new(Vec2::new(5.0, i as f32 - 3.0), 100.0))
            .collect();
        for &(index, health) in damaged {
            sections[index].health = health;
        }
        if let Some(index) = breached {
            sections[index].health = 0.0;
        }
        Obstruction {
            entity: id(50),
            health: Some(300.0),
            sections,
        }
    }

    #[rstest]
    #[case::breach_wins(Some(1), &[(4, 10.0)], Vec2::new(5.0, -2.0))]
    #[case::most_damaged_in_reach(None, &[(4, 40.0), (5, 20.0), (6, 1.0)], Vec2::new(5.0, 2.0))]
    #[case::intact_wall_hits_impact_section(None, &[], Vec2::new(5.0, 0.0))]
    fn wall_weak_point_selection(
        #[case] breached: Option<usize>,
        #[case] damaged: &[(usize, f32)],
        #[case] expected: Vec2,
    ) {
        let mut ai = EnemyAi::default();
        let mut harness = Harness::new(1);
        let visibility = WallInTheWay(wall_obstruction(breached, damaged), Vec2::new(5.0, 0.1));

        harness.tick(&mut ai, 0.1, &[], &prey_at(10.0), &visibility);

        assert_eq!(ai.wall_attack_pos(), Some(expected));
        assert_eq!(ai.target_entity(), Some(id(50)));
    }

    #[test]
    fn test_disengage_reverses_movement_for_some_seeds() {
        let mut outcomes = Vec::new();

        for seed in 0..64 {
            let mut ai = EnemyAi::default();
            let mut harness = Harness::new(seed);
            let registry = prey_at(15.0);

            harness.tick(&mut ai, 5.0, &[], &registry, &ClearSight);
            harness.steering.target_movement = Vec2::X;
            harness.tick(&mut ai, 5.0, &[], &registry, &ClearSight);

            let disengaged = ai.selected().is_none();
            if disengaged {
                assert_eq!(ai.state(), AiState::Idle);
                assert_eq!(harness.steering.target_movement, Vec2::NEG_X);
            }
            outcomes.push(disengaged);
        }

        assert!(outcomes.iter().any(|&d| d));
        assert!(outcomes.iter().any(|&d| !d));
    }

    #[test]
    fn test_agent_state_round_trip_through_apply() {
        let mut authority = EnemyAi::default();
        let mut harness = Harness::new(1);
        let visibility = WallInTheWay(wall_obstruction(None, &[]), Vec2::new(5.0, 0.0));
        harness.tick(&mut authority, 0.1, &[], &prey_at(10.0), &visibility);

        let snapshot = authority.agent_state(1.5);
        let mut observer = EnemyAi::default();
        observer.apply_agent_state(&snapshot);

        assert_eq!(observer.state(), AiState::Pursuing);
        assert_eq!(observer.wall_attack_pos(), Some(Vec2::new(5.0, 0.0)));
        assert_eq!(observer.target_entity(), Some(id(50)));
        assert_eq!(snapshot.wander_angle, 1.5);
    }

    #[rstest]
    #[case(0, Some(AiState::Idle))]
    #[case(1, Some(AiState::Pursuing))]
    #[case(2, Some(AiState::CoolingDown))]
    #[case(3, None)]
    #[case(255, None)]
    fn ai_state_wire_tags(#[case] tag: u8, #[case] expected: Option<AiState>) {
        assert_eq!(AiState::from_wire(tag), expected);
        if let Some(state) = expected {
            assert_eq!(state.to_wire(), tag);
        }
    }
}
