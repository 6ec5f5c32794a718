//! AI Events - входящие команды и уведомления наблюдателям
//!
//! Inbound: `AdversaryDownRequested` (parry success, scripted "core broken").
//! Outbound: FSM transitions, phase changes, presentational pattern cues.

use bevy::prelude::*;

use crate::ai::components::{AdversaryState, PatternCue};

/// Команда: отправить адверсария в Down (groggy).
///
/// Повторная команда во время Down перезапускает таймер.
#[derive(Event, Debug, Clone)]
pub struct AdversaryDownRequested {
    pub entity: Entity,
    pub duration: f32,
    /// Animation trigger для `playAction`
    pub trigger: String,
}

/// Переход FSM (для UI/музыки/логов)
#[derive(Event, Debug, Clone, Copy)]
pub struct AdversaryStateChanged {
    pub entity: Entity,
    pub from: AdversaryState,
    pub to: AdversaryState,
}

/// Смена фазы босса
#[derive(Event, Debug, Clone, Copy)]
pub struct PhaseChanged {
    pub entity: Entity,
    pub from: u8,
    pub to: u8,
}

/// Presentational cue паттерна (telegraph show/hide, wave start/end)
#[derive(Event, Debug, Clone)]
pub struct PatternCueFired {
    pub entity: Entity,
    pub pattern: String,
    pub cue: PatternCue,
}
