//! Trigger routing + combat timers (Update / frame tick)

use bevy::prelude::*;

use crate::ai::AdversaryBrain;
use crate::combat::attacker::AttackCapability;
use crate::combat::combo::CombatState;
use crate::combat::damage::{DamageReason, Dead};
use crate::combat::hitbox::HitVolume;
use crate::combat::triggers::{ActionRequested, AnimationTrigger, TriggerKind};
use crate::config::CombatTuning;
use crate::logger;
use crate::physics::LocomotionBody;

/// Система: animation triggers → state machines.
///
/// - Игрок (CombatState): typed dispatch в `CombatState::handle_trigger`
/// - Остальные: hit window с уроном cue (или текущего варианта атаки),
///   telegraph открывает/закрывает parry window у текущей цели.
///   `AttackCapability` опциональна: без неё pattern cues работают,
///   цель берётся у `AdversaryBrain`.
pub fn route_animation_triggers(
    mut triggers: EventReader<AnimationTrigger>,
    mut fighters: Query<
        (&mut CombatState, &mut LocomotionBody, &mut HitVolume, &Transform),
        Without<Dead>,
    >,
    mut attackers: Query<
        (
            Option<&mut AttackCapability>,
            Option<&mut HitVolume>,
            Option<&AdversaryBrain>,
        ),
        (
            Without<CombatState>,
            Without<Dead>,
            Or<(With<AttackCapability>, With<HitVolume>, With<AdversaryBrain>)>,
        ),
    >,
    mut actions: EventWriter<ActionRequested>,
    tuning: Res<CombatTuning>,
    time: Res<Time<Virtual>>,
) {
    let now = time.elapsed_secs();

    for AnimationTrigger { entity, trigger } in triggers.read().copied() {
        if let Ok((mut combat, mut body, mut volume, transform)) = fighters.get_mut(entity) {
            let forward = transform.forward().as_vec3();
            if let Some(request) = combat.handle_trigger(trigger, &mut body, &mut volume, forward) {
                actions.write(ActionRequested::from_request(entity, request));
            }
            continue;
        }

        let Ok((mut capability, mut volume, brain)) = attackers.get_mut(entity) else {
            logger::log(&format!("{:?} ignored: {:?} is dead or has no combat state", trigger, entity));
            continue;
        };

        let target = capability
            .as_ref()
            .and_then(|capability| capability.target())
            .or_else(|| brain.and_then(|brain| brain.target()));

        match trigger {
            TriggerKind::HitStart { damage } => {
                let Some(volume) = volume.as_mut() else {
                    logger::log_warning(&format!("⚠️ HitStart ignored: {:?} has no HitVolume", entity));
                    continue;
                };
                // Урон из cue = wave hit паттерна
                let (amount, reason) = match damage {
                    Some(amount) => (Some(amount), DamageReason::Heavy),
                    None => (
                        capability.as_ref().and_then(|capability| capability.current_damage()),
                        DamageReason::Normal,
                    ),
                };
                match amount {
                    Some(amount) => {
                        if volume.activate(amount) {
                            volume.reason = reason;
                        }
                    }
                    None => logger::log_warning(&format!(
                        "⚠️ HitStart ignored: {:?} has no attack in progress",
                        entity
                    )),
                }
            }
            TriggerKind::HitEnd => {
                if let Some(volume) = volume.as_mut() {
                    volume.deactivate();
                }
            }
            TriggerKind::AttackAnimEnd => {
                if let Some(capability) = capability.as_mut() {
                    capability.finish_swing();
                }
                if let Some(volume) = volume.as_mut() {
                    volume.deactivate();
                }
            }
            TriggerKind::ParryWindowOpen { duration } => {
                let Some(target) = target else {
                    logger::log(&format!("ParryWindowOpen ignored: {:?} has no target", entity));
                    continue;
                };
                let stun = capability
                    .as_ref()
                    .map_or(tuning.attack.parry_stun_duration, |capability| {
                        capability.config.parry_stun_duration
                    });
                if let Ok((mut defender, ..)) = fighters.get_mut(target) {
                    defender.on_parry_window_open(Some(entity), now, duration, stun);
                }
            }
            TriggerKind::ParryWindowClose => {
                let Some(target) = target else {
                    continue;
                };
                if let Ok((mut defender, ..)) = fighters.get_mut(target) {
                    if defender.parry_window().attacker() == Some(entity) {
                        defender.on_parry_window_close();
                    }
                }
            }
            TriggerKind::MoveForward | TriggerKind::StepBack | TriggerKind::ParryStanceEnd => {
                logger::log(&format!("{:?} ignored for non-player {:?}", trigger, entity));
            }
        }
    }
}

/// Система: parry window expiry + stance timeout.
pub fn tick_combat_states(
    mut fighters: Query<(&mut CombatState, &mut LocomotionBody), Without<Dead>>,
    virtual_time: Res<Time<Virtual>>,
    time: Res<Time>,
) {
    let now = virtual_time.elapsed_secs();
    let dt = time.delta_secs();

    for (mut combat, mut body) in fighters.iter_mut() {
        combat.tick(&mut body, now, dt);
    }
}
