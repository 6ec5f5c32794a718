//! Combat system module
//!
//! ECS ответственность:
//! - Game state: Health, CombatState (combo/parry), HitVolume, AttackCapability
//! - Combat rules: damage resolution, parry windows, one hit per activation
//! - Events: HealRequested (inbound), HealthChanged, ActorDamaged, EntityDied, HitConfirmed, ParrySucceeded
//!
//! Animation collaborator ответственность:
//! - проигрывает `ActionRequested`
//! - стреляет `AnimationTrigger` в скриптованных точках действия

use bevy::prelude::*;

pub mod attacker;
pub mod combo;
pub mod damage;
pub mod hitbox;
pub mod parry;
pub mod systems;
pub mod triggers;


// Re-export основных типов
pub use attacker::{tick_attack_capabilities, AttackCapability, AttackCapabilityConfig, AttackVariant};
pub use combo::{ComboConfig, CombatState};
pub use damage::{
    ActorDamaged, DamageEvent, DamageOutcome, DamageReason, Dead, DespawnAfter, EntityDied,
    HealRequested, HealthChanged, RejectReason,
};
pub use hitbox::{query_overlap, CollisionMask, HitConfirmed, HitVolume, Hurtbox, OverlapSphere};
pub use parry::{ParryConfig, ParrySucceeded, ParrySuccess, ParryWindow};
pub use triggers::{ActionRequest, ActionRequested, AnimationTrigger, PlayerAction, TriggerKind};

use crate::config::CombatTuning;
use crate::input::{process_player_input, PlayerInput};
use crate::SimulationSet;

/// Combat Plugin
///
/// Update (frame tick):
/// 1. tick timers (attack cooldown/swing, parry window expiry, stance timeout)
/// 2. process_player_input - PlayerInput → CombatState/LocomotionBody
/// 3. apply_heals - HealRequested → Health + HealthChanged
/// 4. route_animation_triggers - AnimationTrigger → state machines
///
/// FixedUpdate (physics tick, после locomotion):
/// 1. detect_hit_volume_overlaps - overlap → parry / damage resolution
/// 2. handle_deaths - Dead marker, DespawnAfter
/// 3. despawn_after_timeout
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        // Регистрация событий
        app.add_event::<PlayerInput>()
            .add_event::<AnimationTrigger>()
            .add_event::<ActionRequested>()
            .add_event::<HealthChanged>()
            .add_event::<HealRequested>()
            .add_event::<ActorDamaged>()
            .add_event::<EntityDied>()
            .add_event::<HitConfirmed>()
            .add_event::<ParrySucceeded>()
            .init_resource::<CombatTuning>();

        app.add_systems(
            Update,
            (
                (
                    tick_attack_capabilities,
                    systems::tick_combat_states,
                    process_player_input,
                    systems::apply_heals,
                )
                    .chain()
                    .in_set(SimulationSet::Input),
                systems::route_animation_triggers.in_set(SimulationSet::Triggers),
            ),
        );

        app.add_systems(
            FixedUpdate,
            (
                systems::detect_hit_volume_overlaps,
                systems::handle_deaths,
                systems::despawn_after_timeout,
            )
                .chain() // Последовательное выполнение
                .in_set(SimulationSet::Combat),
        );
    }
}
