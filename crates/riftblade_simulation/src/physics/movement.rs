//! Locomotion Body: kinematic контроллер для игрока и боссов.
//!
//! Архитектура:
//! - Custom velocity integration (gravity, ground probe, jump, dash, knockback)
//! - Ground/sweep запросы через `SpatialQueries` (внешний коллаборатор)
//! - FixedUpdate (60Hz): каждое тело self-contained, порядок акторов не важен
//!
//! Velocity пишет только `LocomotionBody::tick`. Combat/AI системы могут
//! только выставить intent, lock и impulse.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::physics::spatial::{GroundContact, SpatialQueries};

const INTENT_EPSILON: f32 = 1e-4;
const KNOCKBACK_EPSILON: f32 = 0.01;

/// Tuning for one body (m, m/s, m/s², seconds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Скорость ходьбы (m/s)
    pub move_speed: f32,
    /// Разгон к target скорости (m/s²)
    pub acceleration: f32,
    /// Торможение при нулевом intent (m/s²)
    pub deceleration: f32,
    /// Множитель accel/decel в воздухе
    pub air_control: f32,
    /// Сопротивление воздуха (доля горизонтальной скорости в секунду)
    pub air_drag: f32,
    pub jump_power: f32,
    /// Гравитация (отрицательная, m/s²)
    pub gravity: f32,
    pub terminal_velocity: f32,
    /// Окно после схода с края, в котором прыжок ещё разрешён
    pub coyote_time: f32,
    pub dash_speed: f32,
    pub dash_duration: f32,
    /// Отсчитывается от начала dash
    pub dash_cooldown: f32,
    /// Экспоненциальное затухание knockback (1/s)
    pub knockback_decay: f32,
    pub ground_probe_distance: f32,
    /// Радиус тела для sweep-запросов
    pub body_radius: f32,
    /// Скорость поворота (rad/s)
    pub turn_speed: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            acceleration: 40.0,
            deceleration: 50.0,
            air_control: 0.4,
            air_drag: 0.5,
            jump_power: 6.0,
            gravity: -20.0,
            terminal_velocity: 30.0,
            coyote_time: 0.12,
            dash_speed: 14.0,
            dash_duration: 0.2,
            dash_cooldown: 0.6,
            knockback_decay: 8.0,
            ground_probe_distance: 0.1,
            body_radius: 0.4,
            turn_speed: 12.0,
        }
    }
}

/// Активный dash (направление нормализовано, без вертикали).
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct ActiveDash {
    pub direction: Vec3,
    pub remaining: f32,
}

/// Результат одного physics tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LocomotionStep {
    pub displacement: Vec3,
    pub landed: bool,
    pub jumped: bool,
}

/// LocomotionState + его tuning. Единственный владелец velocity.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct LocomotionBody {
    pub config: LocomotionConfig,
    velocity: Vec3,
    /// Горизонтальная скорость от intent/dash (без knockback)
    planar_velocity: Vec3,
    knockback: Vec3,
    move_intent: Vec2,
    facing_override: Option<Vec3>,
    jump_requested: bool,
    grounded: bool,
    falling: bool,
    time_since_grounded: f32,
    coyote_available: bool,
    dash: Option<ActiveDash>,
    dash_cooldown: f32,
    movement_locked: bool,
}

impl Default for LocomotionBody {
    fn default() -> Self {
        Self::new(LocomotionConfig::default())
    }
}

impl LocomotionBody {
    pub fn new(config: LocomotionConfig) -> Self {
        Self {
            config,
            velocity: Vec3::ZERO,
            planar_velocity: Vec3::ZERO,
            knockback: Vec3::ZERO,
            move_intent: Vec2::ZERO,
            facing_override: None,
            jump_requested: false,
            grounded: false,
            falling: false,
            time_since_grounded: 0.0,
            coyote_available: false,
            dash: None,
            dash_cooldown: 0.0,
            movement_locked: false,
        }
    }

    // ------------------------------------------------------------------
    // Input surface
    // ------------------------------------------------------------------

    /// Intent в плоскости XZ: `x` → world X, `y` → world Z. Длина ≤ 1.
    pub fn set_move_intent(&mut self, intent: Vec2) {
        self.move_intent = intent.clamp_length_max(1.0);
    }

    /// Буферизует один прыжок; применяется (или сгорает) на следующем tick.
    pub fn request_jump(&mut self) {
        self.jump_requested = true;
    }

    /// Начинает dash. Отклоняется во время dash/cooldown и при почти
    /// нулевом направлении после удаления вертикали.
    pub fn try_dash(&mut self, direction: Vec3) -> bool {
        if self.dash.is_some() || self.dash_cooldown > 0.0 {
            return false;
        }

        let flat = Vec3::new(direction.x, 0.0, direction.z);
        if flat.length_squared() < INTENT_EPSILON {
            return false;
        }

        self.dash = Some(ActiveDash {
            direction: flat.normalize(),
            remaining: self.config.dash_duration,
        });
        self.dash_cooldown = self.config.dash_cooldown;
        true
    }

    /// External impulse (knockback, combo step). Горизонталь затухает,
    /// вертикаль сразу уходит в velocity.y.
    pub fn add_impulse(&mut self, impulse: Vec3) {
        self.knockback += Vec3::new(impulse.x, 0.0, impulse.z);
        if impulse.y != 0.0 {
            self.velocity.y += impulse.y;
        }
    }

    /// Exclusive gate (combat/cutscene). Писатели обязаны снять lock на
    /// каждом exit path.
    pub fn set_movement_locked(&mut self, locked: bool) {
        self.movement_locked = locked;
    }

    /// Куда смотреть независимо от velocity (например, на цель во время атаки).
    pub fn set_facing_override(&mut self, direction: Option<Vec3>) {
        self.facing_override = direction
            .map(|d| Vec3::new(d.x, 0.0, d.z))
            .filter(|d| d.length_squared() > INTENT_EPSILON)
            .map(Vec3::normalize);
    }

    // ------------------------------------------------------------------
    // Read-only state
    // ------------------------------------------------------------------

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn knockback(&self) -> Vec3 {
        self.knockback
    }

    pub fn move_intent(&self) -> Vec2 {
        self.move_intent
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn is_falling(&self) -> bool {
        self.falling
    }

    pub fn is_dashing(&self) -> bool {
        self.dash.is_some()
    }

    pub fn active_dash(&self) -> Option<ActiveDash> {
        self.dash
    }

    pub fn dash_cooldown_remaining(&self) -> f32 {
        self.dash_cooldown
    }

    pub fn is_movement_locked(&self) -> bool {
        self.movement_locked
    }

    pub fn is_jump_buffered(&self) -> bool {
        self.jump_requested
    }

    /// Направление, к которому надо довернуть Transform (или None).
    pub fn facing_hint(&self) -> Option<Vec3> {
        if let Some(direction) = self.facing_override {
            return Some(direction);
        }
        if let Some(dash) = self.dash {
            return Some(dash.direction);
        }
        if self.movement_locked || self.planar_velocity.length_squared() < 0.01 {
            return None;
        }
        Some(self.planar_velocity.normalize())
    }

    // ------------------------------------------------------------------
    // Physics tick
    // ------------------------------------------------------------------

    /// Один physics tick. `ground` - результат downward probe (или None).
    pub fn tick(&mut self, ground: Option<GroundContact>, dt: f32) -> LocomotionStep {
        let mut step = LocomotionStep::default();
        let mut ground_correction = 0.0;

        // 1. Ground check
        let was_grounded = self.grounded;
        let contact = ground
            .filter(|c| c.distance <= self.config.ground_probe_distance)
            .filter(|_| self.velocity.y <= 0.0);

        if let Some(contact) = contact {
            step.landed = !was_grounded;
            self.grounded = true;
            self.falling = false;
            self.coyote_available = true;
            self.time_since_grounded = 0.0;
            if self.velocity.y < 0.0 {
                self.velocity.y = 0.0;
            }
            ground_correction = -contact.distance;
        } else {
            self.grounded = false;
            self.time_since_grounded += dt;
            self.falling = self.velocity.y < 0.0;
        }

        // 2. Dash/cooldown timers
        self.dash_cooldown = (self.dash_cooldown - dt).max(0.0);
        if let Some(dash) = self.dash.as_mut() {
            dash.remaining -= dt;
            if dash.remaining <= 0.0 {
                self.dash = None;
            }
        }

        // 3. Horizontal velocity
        let horizontal = if self.movement_locked {
            self.planar_velocity = Vec3::ZERO;
            self.knockback
        } else if let Some(dash) = self.dash {
            self.planar_velocity = dash.direction * self.config.dash_speed;
            self.planar_velocity
        } else {
            let target =
                Vec3::new(self.move_intent.x, 0.0, self.move_intent.y) * self.config.move_speed;
            let mut rate = if target.length_squared() > INTENT_EPSILON {
                self.config.acceleration
            } else {
                self.config.deceleration
            };
            if !self.grounded {
                rate *= self.config.air_control;
            }

            self.planar_velocity = move_towards(self.planar_velocity, target, rate * dt);
            if !self.grounded && self.config.air_drag > 0.0 {
                self.planar_velocity *= (1.0 - self.config.air_drag * dt).max(0.0);
            }
            self.planar_velocity + self.knockback
        };

        self.velocity.x = horizontal.x;
        self.velocity.z = horizontal.z;

        self.knockback *= (1.0 - self.config.knockback_decay * dt).max(0.0);
        if self.knockback.length_squared() < KNOCKBACK_EPSILON * KNOCKBACK_EPSILON {
            self.knockback = Vec3::ZERO;
        }

        // 4. Buffered jump (grounded или coyote window)
        if self.jump_requested {
            self.jump_requested = false;

            let in_coyote =
                self.coyote_available && self.time_since_grounded <= self.config.coyote_time;
            if !self.movement_locked && (self.grounded || in_coyote) {
                self.velocity.y = self.config.jump_power;
                self.grounded = false;
                self.falling = false;
                self.coyote_available = false;
                ground_correction = 0.0;
                step.jumped = true;
            }
        }

        // 5. Gravity (clamped to terminal velocity)
        if !self.grounded {
            self.velocity.y =
                (self.velocity.y + self.config.gravity * dt).max(-self.config.terminal_velocity);
        }

        step.displacement = self.velocity * dt + Vec3::Y * ground_correction;
        step
    }

    /// Sweep упёрся в статику: гасим скорость вдоль нормали.
    pub fn block_against(&mut self, normal: Vec3) {
        let normal = Vec3::new(normal.x, 0.0, normal.z).normalize_or_zero();
        if normal == Vec3::ZERO {
            return;
        }

        let strip = |v: Vec3| {
            let into = v.dot(normal);
            if into < 0.0 {
                v - normal * into
            } else {
                v
            }
        };
        self.planar_velocity = strip(self.planar_velocity);
        self.knockback = strip(self.knockback);
        if let Some(dash) = self.dash.as_mut() {
            if dash.direction.dot(normal) < 0.0 {
                self.dash = None;
            }
        }
    }
}

fn move_towards(current: Vec3, target: Vec3, max_delta: f32) -> Vec3 {
    let delta = target - current;
    let distance = delta.length();
    if distance <= max_delta || distance <= f32::EPSILON {
        target
    } else {
        current + delta / distance * max_delta
    }
}

/// Yaw-rotation, при которой Transform::forward() (−Z) смотрит вдоль `direction`.
pub fn yaw_rotation(direction: Vec3) -> Quat {
    Quat::from_rotation_y((-direction.x).atan2(-direction.z))
}

/// Доворачивает `rotation` к `direction` не больше чем на `max_angle` радиан.
pub fn turn_towards(rotation: Quat, direction: Vec3, max_angle: f32) -> Quat {
    let target = yaw_rotation(direction);
    let angle = rotation.angle_between(target);
    if angle <= max_angle || angle <= f32::EPSILON {
        target
    } else {
        rotation.slerp(target, max_angle / angle)
    }
}

/// Система: интеграция всех LocomotionBody (FixedUpdate).
///
/// 1. Ground probe через SpatialQueries
/// 2. `LocomotionBody::tick`
/// 3. Sweep горизонтального смещения (стены арены)
/// 4. Transform += displacement, доворот к facing hint
pub fn integrate_locomotion(
    mut bodies: Query<(&mut LocomotionBody, &mut Transform)>,
    spatial: Res<SpatialQueries>,
    time: Res<Time<Fixed>>,
) {
    let dt = time.delta_secs();
    if dt <= 0.0 {
        return;
    }
    let backend = spatial.backend();

    for (mut body, mut transform) in bodies.iter_mut() {
        let ground =
            backend.query_ground_contact(transform.translation, body.config.ground_probe_distance);
        let step = body.tick(ground, dt);

        let mut displacement = step.displacement;
        let horizontal = Vec3::new(displacement.x, 0.0, displacement.z);
        if horizontal.length_squared() > 0.0 {
            let radius = body.config.body_radius;
            let origin = transform.translation + Vec3::Y * radius;
            if let Some(hit) = backend.query_sweep(origin, horizontal, radius) {
                displacement.x = horizontal.x * hit.fraction;
                displacement.z = horizontal.z * hit.fraction;
                body.block_against(hit.normal);
            }
        }

        transform.translation += displacement;

        if let Some(direction) = body.facing_hint() {
            let max_angle = body.config.turn_speed * dt;
            transform.rotation = turn_towards(transform.rotation, direction, max_angle);
        }
    }
}

/// Plugin: locomotion в FixedUpdate.
pub struct LocomotionPlugin;

impl Plugin for LocomotionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SpatialQueries>()
            .add_systems(FixedUpdate, integrate_locomotion.in_set(crate::SimulationSet::Physics));
    }
}
