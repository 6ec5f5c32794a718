//! Animation collaborator contract.
//!
//! Inbound: `AnimationTrigger` - именованные callbacks, которые анимация
//! стреляет в скриптованных точках действия (hit start, step forward...).
//! Outbound: `ActionRequested` - core просит проиграть действие
//! (`playAction(name, comboIndex)`), рендер/анимация на стороне хоста.

use bevy::prelude::*;

/// Trigger kinds fired by animation playback (или pattern timeline).
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum TriggerKind {
    /// Открыть hit volume. `damage: None` - урон определяет сам актор
    /// (combo table у игрока, текущий вариант атаки у босса).
    /// `Some` у не-игрока - wave hit паттерна (`DamageReason::Heavy`).
    HitStart { damage: Option<f32> },
    HitEnd,
    MoveForward,
    StepBack,
    AttackAnimEnd,
    /// Telegraph атакующего: открыть parry window у его цели.
    ParryWindowOpen { duration: f32 },
    ParryWindowClose,
    ParryStanceEnd,
}

/// Inbound trigger for one entity. At most one firing per logical event per
/// attack cycle.
#[derive(Event, Debug, Clone, Copy)]
pub struct AnimationTrigger {
    pub entity: Entity,
    pub trigger: TriggerKind,
}

/// Player-side actions the core may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum PlayerAction {
    Attack,
    Dash,
    Parry,
    DrawWeapon,
    SheatheWeapon,
}

impl PlayerAction {
    pub fn name(&self) -> &'static str {
        match self {
            PlayerAction::Attack => "Attack",
            PlayerAction::Dash => "Dash",
            PlayerAction::Parry => "Parry",
            PlayerAction::DrawWeapon => "DrawWeapon",
            PlayerAction::SheatheWeapon => "SheatheWeapon",
        }
    }
}

/// Результат state machine: какое действие проиграть.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionRequest {
    pub action: PlayerAction,
    /// 1..=max_combo для Attack, 0 для остального
    pub combo_index: u8,
}

impl ActionRequest {
    pub fn new(action: PlayerAction) -> Self {
        Self {
            action,
            combo_index: 0,
        }
    }

    pub fn attack(combo_index: u8) -> Self {
        Self {
            action: PlayerAction::Attack,
            combo_index,
        }
    }
}

/// Outbound: `playAction(name, comboIndex)`.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct ActionRequested {
    pub entity: Entity,
    pub action: String,
    pub combo_index: u8,
}

impl ActionRequested {
    pub fn from_request(entity: Entity, request: ActionRequest) -> Self {
        Self {
            entity,
            action: request.action.name().to_string(),
            combo_index: request.combo_index,
        }
    }

    pub fn named(entity: Entity, action: impl Into<String>) -> Self {
        Self {
            entity,
            action: action.into(),
            combo_index: 0,
        }
    }
}
