//! Adversary FSM (Idle/Chase/BasicAttack/Pattern/Down/Dead).
//!
//! `AdversaryBrain::update` - чистая функция от perception + коллабораторов
//! (PatternBook, AttackCapability, RNG), вызывается раз в frame tick.
//! Единственный gate движения - `can_move`, true только в Chase.

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ai::components::pattern::PatternBook;
use crate::combat::AttackCapability;
use crate::logger;

/// AI FSM состояния
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Reflect)]
pub enum AdversaryState {
    #[default]
    Idle,
    Chase,
    BasicAttack,
    Pattern,
    /// Groggy/stunned
    Down,
    Dead,
}

/// Health-fraction пороги фаз (по убыванию). Фаза 1 - стартовая.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
pub struct PhaseThresholds(pub Vec<f32>);

impl Default for PhaseThresholds {
    fn default() -> Self {
        Self(vec![0.5])
    }
}

impl PhaseThresholds {
    pub fn phase_for(&self, health_fraction: f32) -> u8 {
        let crossed = self.0.iter().filter(|t| health_fraction <= **t).count();
        (1 + crossed).min(u8::MAX as usize) as u8
    }
}

/// Параметры адверсария
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct AdversaryConfig {
    /// Дальше этого цель считается потерянной
    pub lose_distance: f32,
    /// Дистанция basic attack (от attack origin, не от root)
    pub attack_range: f32,
    /// Выход BasicAttack → Chase при distance > attack_range × factor
    pub hysteresis_factor: f32,
    /// Chase останавливается на этой дистанции (root → target)
    pub stand_off_distance: f32,
    /// Attack origin в локальном frame (−Z = вперёд)
    pub attack_origin_offset: Vec3,
    pub phases: PhaseThresholds,
    /// Animation trigger для Down после парирования
    pub parry_down_trigger: String,
}

impl Default for AdversaryConfig {
    fn default() -> Self {
        Self {
            lose_distance: 25.0,
            attack_range: 2.5,
            hysteresis_factor: 1.2,
            stand_off_distance: 1.5,
            attack_origin_offset: Vec3::new(0.0, 1.0, -0.8),
            phases: PhaseThresholds::default(),
            parry_down_trigger: "Groggy".to_string(),
        }
    }
}

/// Что FSM видит в этот tick (заполняет perception система).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perception {
    pub alive: bool,
    pub target: Option<Entity>,
    pub target_visible: bool,
    /// Root → target (XZ)
    pub distance: f32,
    /// Attack origin → target (XZ)
    pub attack_distance: f32,
}

impl Perception {
    pub fn no_target() -> Self {
        Self {
            alive: true,
            target: None,
            target_visible: false,
            distance: f32::INFINITY,
            attack_distance: f32::INFINITY,
        }
    }

    pub fn target_at(target: Entity, distance: f32, attack_distance: f32) -> Self {
        Self {
            alive: true,
            target: Some(target),
            target_visible: true,
            distance,
            attack_distance,
        }
    }
}

/// Коллабораторы одного `update`.
pub struct BrainContext<'a, R: Rng> {
    pub perception: Perception,
    pub patterns: Option<&'a mut PatternBook>,
    pub attack: Option<&'a mut AttackCapability>,
    pub rng: &'a mut R,
    pub now: f32,
    pub dt: f32,
}

/// Побочный эффект tick'а для ECS слоя.
#[derive(Debug, Clone, PartialEq)]
pub enum BrainAction {
    /// Basic attack вариант начат → `playAction(name)`
    PlayAction(String),
    PatternStarted(usize),
}

/// FSM адверсария.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct AdversaryBrain {
    pub config: AdversaryConfig,
    state: AdversaryState,
    target: Option<Entity>,
    can_move: bool,
    current_pattern: Option<usize>,
    down_remaining: f32,
    phase: u8,
    missing_capability_warned: bool,
}

impl Default for AdversaryBrain {
    fn default() -> Self {
        Self::new(AdversaryConfig::default())
    }
}

impl AdversaryBrain {
    pub fn new(config: AdversaryConfig) -> Self {
        Self {
            config,
            state: AdversaryState::Idle,
            target: None,
            can_move: false,
            current_pattern: None,
            down_remaining: 0.0,
            phase: 1,
            missing_capability_warned: false,
        }
    }

    pub fn state(&self) -> AdversaryState {
        self.state
    }

    pub fn target(&self) -> Option<Entity> {
        self.target
    }

    pub fn set_target(&mut self, target: Option<Entity>) {
        self.target = target;
    }

    pub fn can_move(&self) -> bool {
        self.can_move
    }

    pub fn current_pattern(&self) -> Option<usize> {
        self.current_pattern
    }

    pub fn down_remaining(&self) -> f32 {
        self.down_remaining
    }

    pub fn phase(&self) -> u8 {
        self.phase
    }

    /// Фаза только растёт. Returns (old, new) при смене.
    pub fn update_phase(&mut self, health_fraction: f32) -> Option<(u8, u8)> {
        let phase = self.config.phases.phase_for(health_fraction);
        if phase <= self.phase {
            return None;
        }
        let old = self.phase;
        self.phase = phase;
        Some((old, phase))
    }

    /// Вход в Down (parry success, "core broken"). Повторный вход во время
    /// Down перезапускает таймер. Все паттерны и swing отменяются.
    pub fn enter_down(
        &mut self,
        duration: f32,
        patterns: Option<&mut PatternBook>,
        attack: Option<&mut AttackCapability>,
    ) -> bool {
        if self.state == AdversaryState::Dead {
            return false;
        }

        if let Some(patterns) = patterns {
            patterns.stop_all();
        }
        if let Some(attack) = attack {
            attack.cancel();
        }
        self.current_pattern = None;
        self.down_remaining = duration.max(0.0);
        self.transition(AdversaryState::Down);
        true
    }

    /// Один frame tick FSM.
    pub fn update<R: Rng>(&mut self, ctx: &mut BrainContext<'_, R>) -> Option<BrainAction> {
        let perception = ctx.perception;

        if self.state == AdversaryState::Dead {
            return None;
        }

        if !perception.alive {
            if let Some(patterns) = ctx.patterns.as_deref_mut() {
                patterns.stop_all();
            }
            if let Some(attack) = ctx.attack.as_deref_mut() {
                attack.cancel();
            }
            self.current_pattern = None;
            self.transition(AdversaryState::Dead);
            return None;
        }

        self.target = perception.target;
        let lost = perception.target.is_none() || perception.distance > self.config.lose_distance;

        match self.state {
            AdversaryState::Dead => None,

            AdversaryState::Down => {
                self.down_remaining -= ctx.dt;
                if self.down_remaining <= 0.0 {
                    self.down_remaining = 0.0;
                    let next = if perception.target.is_some() {
                        AdversaryState::Chase
                    } else {
                        AdversaryState::Idle
                    };
                    self.transition(next);
                }
                None
            }

            AdversaryState::Idle => {
                if !lost && perception.target_visible {
                    self.transition(AdversaryState::Chase);
                }
                None
            }

            AdversaryState::Chase => {
                if lost {
                    self.transition(AdversaryState::Idle);
                    return None;
                }
                if let Some(action) = self.try_start_pattern(ctx) {
                    return Some(action);
                }
                if perception.attack_distance <= self.config.attack_range {
                    self.transition(AdversaryState::BasicAttack);
                }
                None
            }

            AdversaryState::BasicAttack => {
                if lost {
                    self.transition(AdversaryState::Idle);
                    return None;
                }

                let mid_swing = ctx.attack.as_deref().is_some_and(AttackCapability::is_mid_swing);
                if !mid_swing {
                    let leave_at = self.config.attack_range * self.config.hysteresis_factor;
                    if perception.attack_distance > leave_at {
                        self.transition(AdversaryState::Chase);
                        return None;
                    }
                    if let Some(action) = self.try_start_pattern(ctx) {
                        return Some(action);
                    }
                }

                self.try_basic_attack(ctx)
            }

            AdversaryState::Pattern => {
                let running = match (self.current_pattern, ctx.patterns.as_deref()) {
                    (Some(index), Some(patterns)) => patterns.is_running(index),
                    _ => false,
                };
                if running {
                    return None;
                }

                self.current_pattern = None;
                let next = if lost {
                    AdversaryState::Idle
                } else if perception.attack_distance <= self.config.attack_range {
                    AdversaryState::BasicAttack
                } else {
                    AdversaryState::Chase
                };
                self.transition(next);
                None
            }
        }
    }

    fn try_start_pattern<R: Rng>(&mut self, ctx: &mut BrainContext<'_, R>) -> Option<BrainAction> {
        let patterns = ctx.patterns.as_deref_mut()?;
        let index = patterns.select_pattern(ctx.now, ctx.perception.distance, self.phase)?;
        if !patterns.execute(index, ctx.now) {
            return None;
        }

        self.current_pattern = Some(index);
        self.transition(AdversaryState::Pattern);
        Some(BrainAction::PatternStarted(index))
    }

    fn try_basic_attack<R: Rng>(&mut self, ctx: &mut BrainContext<'_, R>) -> Option<BrainAction> {
        let target = ctx.perception.target?;
        let Some(attack) = ctx.attack.as_deref_mut() else {
            if !self.missing_capability_warned {
                self.missing_capability_warned = true;
                logger::log_warning("⚠️ BasicAttack skipped: adversary has no AttackCapability");
            }
            return None;
        };

        attack
            .try_attack(target, ctx.rng)
            .map(|variant| BrainAction::PlayAction(variant.action.clone()))
    }

    fn transition(&mut self, to: AdversaryState) {
        self.state = to;
        self.can_move = to == AdversaryState::Chase;
    }
}

/// Move intent для Chase: к цели, стоп на stand-off дистанции.
pub fn chase_intent(position: Vec3, target: Vec3, stand_off_distance: f32) -> Vec2 {
    let offset = Vec2::new(target.x - position.x, target.z - position.z);
    let distance = offset.length();
    if distance <= stand_off_distance || distance <= f32::EPSILON {
        return Vec2::ZERO;
    }
    offset / distance
}

/// Горизонтальная дистанция.
pub fn flat_distance(a: Vec3, b: Vec3) -> f32 {
    Vec2::new(a.x - b.x, a.z - b.z).length()
}
