//! AI reaction systems (parry stun, down requests, phase changes).

use bevy::prelude::*;

use crate::ai::components::{AdversaryBrain, PatternBook};
use crate::ai::events::{AdversaryDownRequested, AdversaryStateChanged, PhaseChanged};
use crate::combat::{ActionRequested, AttackCapability, HitVolume, ParrySucceeded};
use crate::components::Health;
use crate::logger;

/// System: успешное парирование → атакующий уходит в Down
///
/// Stun duration берётся из окна (атакующий положил её туда при telegraph).
pub fn stun_parried_attackers(
    mut parries: EventReader<ParrySucceeded>,
    brains: Query<&AdversaryBrain>,
    mut down_requests: EventWriter<AdversaryDownRequested>,
) {
    for parry in parries.read() {
        let Ok(brain) = brains.get(parry.attacker) else {
            continue;
        };

        down_requests.write(AdversaryDownRequested {
            entity: parry.attacker,
            duration: parry.stun_duration,
            trigger: brain.config.parry_down_trigger.clone(),
        });
    }
}

/// System: AdversaryDownRequested → stop-all-then-reenter Down
pub fn apply_down_requests(
    mut requests: EventReader<AdversaryDownRequested>,
    mut adversaries: Query<(
        &mut AdversaryBrain,
        Option<&mut PatternBook>,
        Option<&mut AttackCapability>,
        Option<&mut HitVolume>,
    )>,
    mut state_changed: EventWriter<AdversaryStateChanged>,
    mut actions: EventWriter<ActionRequested>,
) {
    for request in requests.read() {
        let Ok((mut brain, mut patterns, mut attack, volume)) = adversaries.get_mut(request.entity)
        else {
            logger::log_warning(&format!(
                "⚠️ Down request ignored: {:?} is not an adversary",
                request.entity
            ));
            continue;
        };

        let from = brain.state();
        if !brain.enter_down(request.duration, patterns.as_deref_mut(), attack.as_deref_mut()) {
            continue;
        }

        if let Some(mut volume) = volume {
            volume.deactivate();
        }

        logger::log_info(&format!(
            "💫 {:?} down for {:.1}s ({})",
            request.entity, request.duration, request.trigger
        ));
        actions.write(ActionRequested::named(request.entity, request.trigger.clone()));

        if from != brain.state() {
            state_changed.write(AdversaryStateChanged {
                entity: request.entity,
                from,
                to: brain.state(),
            });
        }
    }
}

/// System: health fraction → phase (только вперёд)
pub fn update_phases(
    mut adversaries: Query<(Entity, &Health, &mut AdversaryBrain), Changed<Health>>,
    mut phase_changed: EventWriter<PhaseChanged>,
) {
    for (entity, health, mut brain) in adversaries.iter_mut() {
        if let Some((from, to)) = brain.update_phase(health.fraction()) {
            logger::log_info(&format!("🔥 {:?} phase {} → {}", entity, from, to));
            phase_changed.write(PhaseChanged { entity, from, to });
        }
    }
}
