//! Adversary AI module
//!
//! FSM (Idle/Chase/BasicAttack/Pattern/Down/Dead) + pattern scheduler для
//! боссов и врагов. Все "ожидания" - счётчики в frame tick.

use bevy::prelude::*;

pub mod components;
pub mod events;
pub mod systems;

// Re-export основных типов
pub use components::{
    AdversaryBrain, AdversaryConfig, AdversaryState, BrainAction, BrainContext, Pattern,
    PatternBook, PatternConfig, PatternCue, PatternStep, Perception, PhaseThresholds,
};
pub use events::{AdversaryDownRequested, AdversaryStateChanged, PatternCueFired, PhaseChanged};

use crate::{DeterministicRng, SimulationSet};

/// Adversary Plugin
///
/// Регистрирует AI системы в Update (frame tick).
/// Порядок выполнения:
/// 1. update_phases - health → phase
/// 2. stun_parried_attackers - ParrySucceeded → AdversaryDownRequested
/// 3. apply_down_requests - вход в Down
/// 4. run_adversary_fsm - perception + FSM transitions
/// 5. run_patterns - timeline cues текущего паттерна
/// 6. drive_adversary_locomotion - can_move gate → LocomotionBody
pub struct AdversaryPlugin;

impl Plugin for AdversaryPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<AdversaryDownRequested>()
            .add_event::<AdversaryStateChanged>()
            .add_event::<PhaseChanged>()
            .add_event::<PatternCueFired>()
            .init_resource::<DeterministicRng>();

        app.add_systems(
            Update,
            (
                systems::update_phases,
                systems::stun_parried_attackers,
                systems::apply_down_requests,
                systems::run_adversary_fsm,
                systems::run_patterns,
                systems::drive_adversary_locomotion,
            )
                .chain() // Последовательное выполнение для детерминизма
                .in_set(SimulationSet::Ai),
        );
    }
}
