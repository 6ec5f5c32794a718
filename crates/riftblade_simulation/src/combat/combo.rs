//! Combat State Machine (player-side combo + parry initiation)
//!
//! Состояния неявные: `combo_index` (0 = idle) + флаги attacking / buffered /
//! parrying. Переходы двигают input-методы и animation triggers
//! (`handle_trigger`); неожиданные triggers логируются и игнорируются.
//!
//! Коллабораторы (LocomotionBody, HitVolume) передаются явными параметрами.
//! Movement lock снимается на каждом exit path (reset, force stop, stance end).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::hitbox::HitVolume;
use crate::combat::parry::{facing_dot, ParryConfig, ParrySuccess, ParryWindow};
use crate::combat::triggers::{ActionRequest, PlayerAction, TriggerKind};
use crate::logger;
use crate::physics::LocomotionBody;

/// Combo tables. Индекс таблиц = combo_index − 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct ComboConfig {
    pub base_damage: f32,
    /// Длина таблицы = max combo
    pub damage_multipliers: Vec<f32>,
    pub forward_impulses: Vec<f32>,
    pub backward_impulses: Vec<f32>,
}

impl Default for ComboConfig {
    fn default() -> Self {
        Self {
            base_damage: 10.0,
            damage_multipliers: vec![1.0, 1.2, 1.5],
            forward_impulses: vec![3.0, 3.5, 5.0],
            backward_impulses: vec![0.0, 0.0, 4.0],
        }
    }
}

impl ComboConfig {
    pub fn max_combo(&self) -> u8 {
        self.damage_multipliers.len().min(u8::MAX as usize) as u8
    }

    /// Урон шага combo. Index вне таблицы клампится к ближайшему шагу.
    pub fn damage_for(&self, combo_index: u8) -> f32 {
        let max = self.max_combo();
        if max == 0 {
            return self.base_damage;
        }
        let step = combo_index.clamp(1, max) as usize - 1;
        self.base_damage * self.damage_multipliers[step]
    }

    fn lookup(table: &[f32], combo_index: u8) -> Option<f32> {
        let step = (combo_index as usize).checked_sub(1)?;
        table.get(step).copied().filter(|m| *m > 0.0)
    }
}

/// Combat state игрока.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct CombatState {
    pub combo: ComboConfig,
    pub parry: ParryConfig,
    combo_index: u8,
    attacking: bool,
    buffered_next: bool,
    weapon_equipped: bool,
    parrying: bool,
    /// Выставляется успешным consume; damage multiplier = 0 до конца стойки
    parry_guard: bool,
    stance_elapsed: f32,
    input_locked: bool,
    window: ParryWindow,
}

impl Default for CombatState {
    fn default() -> Self {
        Self::new(ComboConfig::default(), ParryConfig::default())
    }
}

impl CombatState {
    pub fn new(combo: ComboConfig, parry: ParryConfig) -> Self {
        Self {
            combo,
            parry,
            combo_index: 0,
            attacking: false,
            buffered_next: false,
            weapon_equipped: true,
            parrying: false,
            parry_guard: false,
            stance_elapsed: 0.0,
            input_locked: false,
            window: ParryWindow::default(),
        }
    }

    pub fn combo_index(&self) -> u8 {
        self.combo_index
    }

    pub fn is_attacking(&self) -> bool {
        self.attacking
    }

    pub fn is_next_buffered(&self) -> bool {
        self.buffered_next
    }

    pub fn is_weapon_equipped(&self) -> bool {
        self.weapon_equipped
    }

    pub fn is_parrying(&self) -> bool {
        self.parrying
    }

    pub fn is_parry_window_open(&self) -> bool {
        self.window.is_open()
    }

    pub fn parry_window(&self) -> &ParryWindow {
        &self.window
    }

    pub fn is_input_locked(&self) -> bool {
        self.input_locked
    }

    /// Урон текущего шага combo.
    pub fn current_damage(&self) -> f32 {
        self.combo.damage_for(self.combo_index)
    }

    /// Incoming-damage policy цели: 0 пока активен parry guard.
    pub fn incoming_damage_multiplier(&self) -> f32 {
        if self.parry_guard {
            0.0
        } else {
            1.0
        }
    }

    // ------------------------------------------------------------------
    // Input surface
    // ------------------------------------------------------------------

    pub fn on_attack_input(&mut self, body: &mut LocomotionBody) -> Option<ActionRequest> {
        if !self.weapon_equipped || self.parrying || body.is_dashing() || self.input_locked {
            return None;
        }

        if !self.attacking {
            if self.combo.max_combo() == 0 {
                logger::log_warning("⚠️ Attack ignored: combo table is empty");
                return None;
            }
            self.combo_index = 1;
            self.attacking = true;
            self.buffered_next = false;
            body.set_movement_locked(true);
            return Some(ActionRequest::attack(1));
        }

        // One-slot буфер: лишние нажатия до consume отбрасываются
        if !self.buffered_next {
            self.buffered_next = true;
        }
        None
    }

    /// Dash-cancel: атака сбрасывается до передачи в LocomotionBody.
    pub fn try_dash(
        &mut self,
        body: &mut LocomotionBody,
        volume: &mut HitVolume,
        direction: Vec3,
    ) -> Option<ActionRequest> {
        if self.input_locked || self.parrying {
            return None;
        }

        if self.attacking {
            self.force_stop_attack(body, volume);
        }

        if body.try_dash(direction) {
            Some(ActionRequest::new(PlayerAction::Dash))
        } else {
            None
        }
    }

    pub fn toggle_weapon(&mut self, body: &mut LocomotionBody, volume: &mut HitVolume) -> ActionRequest {
        self.weapon_equipped = !self.weapon_equipped;

        if self.weapon_equipped {
            return ActionRequest::new(PlayerAction::DrawWeapon);
        }

        if self.attacking {
            self.force_stop_attack(body, volume);
        }
        if self.parrying {
            self.end_parry_stance(body);
        }
        ActionRequest::new(PlayerAction::SheatheWeapon)
    }

    /// Отмена атаки: volume off, combo reset, movement unlock.
    pub fn force_stop_attack(&mut self, body: &mut LocomotionBody, volume: &mut HitVolume) {
        volume.deactivate();
        self.reset_combo(body);
    }

    pub fn try_start_parry(&mut self, body: &mut LocomotionBody) -> Option<ActionRequest> {
        if self.attacking
            || !self.weapon_equipped
            || body.is_dashing()
            || self.parrying
            || self.input_locked
        {
            return None;
        }

        self.parrying = true;
        self.parry_guard = false;
        self.stance_elapsed = 0.0;
        self.buffered_next = false;
        body.set_movement_locked(true);
        Some(ActionRequest::new(PlayerAction::Parry))
    }

    /// Consume окна: окно открыто ∧ стойка ∧ dot(forward, toAttacker) ≥ threshold.
    /// Нет attacker или чужой attacker → fail closed.
    pub fn try_consume_parry(
        &mut self,
        attacker: Option<Entity>,
        attacker_position: Vec3,
        own_position: Vec3,
        own_forward: Vec3,
        now: f32,
    ) -> Option<ParrySuccess> {
        if !self.parrying || !self.window.is_open_at(now) {
            return None;
        }

        let attacker = attacker?;
        if self.window.attacker() != Some(attacker) {
            return None;
        }

        let dot = facing_dot(own_forward, own_position, attacker_position)?;
        if dot < self.window.min_facing_dot() {
            logger::log(&format!(
                "Parry rejected: facing dot {:.3} < {:.3}",
                dot,
                self.window.min_facing_dot()
            ));
            return None;
        }

        let success = ParrySuccess {
            attacker,
            stun_duration: self.window.stun_duration(),
        };
        self.window.close();
        self.parry_guard = true;
        Some(success)
    }

    /// Cutscene/диалог gate: блокирует input и прерывает атаку/стойку.
    pub fn set_input_locked(&mut self, locked: bool, body: &mut LocomotionBody, volume: &mut HitVolume) {
        self.input_locked = locked;
        if locked {
            if self.attacking {
                self.force_stop_attack(body, volume);
            }
            if self.parrying {
                self.end_parry_stance(body);
            }
        }
    }

    // ------------------------------------------------------------------
    // Trigger callbacks
    // ------------------------------------------------------------------

    pub fn on_attack_anim_end(
        &mut self,
        body: &mut LocomotionBody,
        volume: &mut HitVolume,
    ) -> Option<ActionRequest> {
        if !self.attacking {
            logger::log("AttackAnimEnd ignored: not attacking");
            return None;
        }

        if self.weapon_equipped && self.buffered_next && self.combo_index < self.combo.max_combo() {
            self.combo_index += 1;
            self.buffered_next = false;
            body.set_movement_locked(true);
            return Some(ActionRequest::attack(self.combo_index));
        }

        volume.deactivate();
        self.reset_combo(body);
        None
    }

    pub fn on_move_forward(&mut self, body: &mut LocomotionBody, forward: Vec3) {
        if let Some(magnitude) = ComboConfig::lookup(&self.combo.forward_impulses, self.combo_index) {
            body.add_impulse(flat(forward) * magnitude);
        }
    }

    pub fn on_step_back(&mut self, body: &mut LocomotionBody, forward: Vec3) {
        if let Some(magnitude) = ComboConfig::lookup(&self.combo.backward_impulses, self.combo_index) {
            body.add_impulse(-flat(forward) * magnitude);
        }
    }

    /// `damage_override` - явный урон из trigger payload.
    pub fn on_hit_start(&mut self, volume: &mut HitVolume, damage_override: Option<f32>) -> bool {
        if !self.attacking {
            logger::log("HitStart ignored: not attacking");
            return false;
        }
        volume.activate(damage_override.unwrap_or_else(|| self.current_damage()))
    }

    pub fn on_hit_end(&mut self, volume: &mut HitVolume) {
        volume.deactivate();
    }

    /// Окно открывает telegraph атакующего (не зависит от стойки).
    pub fn on_parry_window_open(
        &mut self,
        attacker: Option<Entity>,
        now: f32,
        duration: f32,
        stun_duration: f32,
    ) {
        self.window.open(
            attacker,
            now + duration.max(0.0),
            self.parry.min_facing_dot,
            stun_duration,
        );
    }

    pub fn on_parry_window_close(&mut self) {
        self.window.close();
    }

    pub fn on_parry_stance_end(&mut self, body: &mut LocomotionBody) {
        if !self.parrying {
            return;
        }
        self.end_parry_stance(body);
    }

    /// Typed dispatch animation triggers своего entity.
    pub fn handle_trigger(
        &mut self,
        trigger: TriggerKind,
        body: &mut LocomotionBody,
        volume: &mut HitVolume,
        forward: Vec3,
    ) -> Option<ActionRequest> {
        match trigger {
            TriggerKind::HitStart { damage } => {
                self.on_hit_start(volume, damage);
                None
            }
            TriggerKind::HitEnd => {
                self.on_hit_end(volume);
                None
            }
            TriggerKind::MoveForward => {
                self.on_move_forward(body, forward);
                None
            }
            TriggerKind::StepBack => {
                self.on_step_back(body, forward);
                None
            }
            TriggerKind::AttackAnimEnd => self.on_attack_anim_end(body, volume),
            TriggerKind::ParryStanceEnd => {
                self.on_parry_stance_end(body);
                None
            }
            TriggerKind::ParryWindowOpen { .. } | TriggerKind::ParryWindowClose => {
                logger::log(&format!("{:?} ignored: routed to the attacker's target", trigger));
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Frame tick
    // ------------------------------------------------------------------

    /// Expiry окна + страховочный таймаут стойки.
    pub fn tick(&mut self, body: &mut LocomotionBody, now: f32, dt: f32) {
        self.window.expire(now);

        if self.parrying && self.parry.max_stance_duration > 0.0 {
            self.stance_elapsed += dt;
            if self.stance_elapsed >= self.parry.max_stance_duration {
                logger::log("Parry stance timed out without ParryStanceEnd");
                self.end_parry_stance(body);
            }
        }
    }

    fn reset_combo(&mut self, body: &mut LocomotionBody) {
        self.combo_index = 0;
        self.attacking = false;
        self.buffered_next = false;
        body.set_movement_locked(false);
    }

    fn end_parry_stance(&mut self, body: &mut LocomotionBody) {
        self.parrying = false;
        self.parry_guard = false;
        self.stance_elapsed = 0.0;
        body.set_movement_locked(false);
    }
}

fn flat(direction: Vec3) -> Vec3 {
    Vec3::new(direction.x, 0.0, direction.z).normalize_or_zero()
}
