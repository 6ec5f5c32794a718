//! Parry subsystem: timed, facing-constrained acceptance window.
//!
//! Lifecycle окна:
//! - opened: telegraph атакующего (`ParryWindowOpen` trigger / pattern cue)
//! - closed: успешный consume, явный `ParryWindowClose`, или expiry по времени
//!
//! Время абсолютное (`Time<Virtual>::elapsed_secs`), чтобы Update (открытие)
//! и FixedUpdate (consume в hit detection) смотрели на одни часы.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Defender-side tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct ParryConfig {
    /// dot(forward, toAttacker) ≥ threshold. 0.3 ≈ 72.5° от прямого взгляда.
    pub min_facing_dot: f32,
    /// Страховка, если `ParryStanceEnd` так и не пришёл (0 = ждать trigger).
    pub max_stance_duration: f32,
}

impl Default for ParryConfig {
    fn default() -> Self {
        Self {
            min_facing_dot: 0.3,
            max_stance_duration: 1.0,
        }
    }
}

/// Открытое окно парирования у защитника.
#[derive(Debug, Clone, Copy, Default, PartialEq, Reflect)]
pub struct ParryWindow {
    open: bool,
    expires_at: f32,
    attacker: Option<Entity>,
    min_facing_dot: f32,
    stun_duration: f32,
}

impl ParryWindow {
    pub fn open(
        &mut self,
        attacker: Option<Entity>,
        expires_at: f32,
        min_facing_dot: f32,
        stun_duration: f32,
    ) {
        self.open = true;
        self.expires_at = expires_at;
        self.attacker = attacker;
        self.min_facing_dot = min_facing_dot;
        self.stun_duration = stun_duration;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.attacker = None;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_open_at(&self, now: f32) -> bool {
        self.open && now < self.expires_at
    }

    /// Закрывает окно, если время вышло. Returns true on expiry.
    pub fn expire(&mut self, now: f32) -> bool {
        if self.open && now >= self.expires_at {
            self.close();
            return true;
        }
        false
    }

    pub fn attacker(&self) -> Option<Entity> {
        self.attacker
    }

    pub fn expires_at(&self) -> f32 {
        self.expires_at
    }

    pub fn min_facing_dot(&self) -> f32 {
        self.min_facing_dot
    }

    pub fn stun_duration(&self) -> f32 {
        self.stun_duration
    }
}

/// Результат успешного consume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParrySuccess {
    pub attacker: Entity,
    pub stun_duration: f32,
}

/// Событие: парирование удалось (атакующий уходит в Down).
#[derive(Event, Debug, Clone, Copy)]
pub struct ParrySucceeded {
    pub defender: Entity,
    pub attacker: Entity,
    pub stun_duration: f32,
}

/// dot(forward, направление на цель) в горизонтальной плоскости.
///
/// None если цель в той же точке или forward вертикальный.
pub fn facing_dot(forward: Vec3, from: Vec3, to: Vec3) -> Option<f32> {
    let forward = Vec3::new(forward.x, 0.0, forward.z).try_normalize()?;
    let offset = to - from;
    let direction = Vec3::new(offset.x, 0.0, offset.z).try_normalize()?;
    Some(forward.dot(direction))
}
