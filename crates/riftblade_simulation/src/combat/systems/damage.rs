//! Damage systems (FixedUpdate)
//!
//! 1. detect_hit_volume_overlaps - active HitVolume × Hurtbox → parry / take_damage
//! 2. handle_deaths - EntityDied → Dead marker, gates off, DespawnAfter для не-игроков
//! 3. despawn_after_timeout - удаление после death sequence
//!
//! apply_heals (Update) - HealRequested → `Healable::heal` → HealthChanged

use bevy::prelude::*;

use crate::combat::attacker::AttackCapability;
use crate::combat::combo::CombatState;
use crate::combat::damage::{
    notify_damage_outcome, ActorDamaged, Dead, DamageEvent, DespawnAfter, EntityDied,
    HealRequested, HealthChanged,
};
use crate::combat::hitbox::{query_overlap, HitConfirmed, HitVolume, Hurtbox};
use crate::combat::parry::ParrySucceeded;
use crate::components::{Healable, Health, Player};
use crate::config::CombatTuning;
use crate::logger;
use crate::physics::LocomotionBody;

/// Система: overlap активных hit volumes с hurtboxes.
///
/// Порядок на цель:
/// 1. `query_overlap` по mask; исключения: владелец и вся его иерархия,
///    уже в hit set, мёртвые
/// 2. Parry consume (успех = урон отклонён, цель НЕ попадает в hit set)
/// 3. `Health::take_damage` с multiplier цели
/// 4. Принято → hit set, первый hit за activation → `HitConfirmed`
pub fn detect_hit_volume_overlaps(
    mut volumes: Query<(Entity, &mut HitVolume, &Transform), Without<Dead>>,
    mut targets: Query<
        (
            Entity,
            &Transform,
            &Hurtbox,
            &mut Health,
            Option<&mut CombatState>,
        ),
        Without<Dead>,
    >,
    parents: Query<&ChildOf>,
    mut health_changed: EventWriter<HealthChanged>,
    mut damaged: EventWriter<ActorDamaged>,
    mut died: EventWriter<EntityDied>,
    mut hit_confirmed: EventWriter<HitConfirmed>,
    mut parried: EventWriter<ParrySucceeded>,
    time: Res<Time<Virtual>>,
) {
    let now = time.elapsed_secs();

    for (owner, mut volume, owner_transform) in volumes.iter_mut() {
        if !volume.is_active() {
            continue;
        }
        let shape = volume.shape(owner_transform);
        let overlapping = query_overlap(
            shape,
            volume.mask,
            targets
                .iter()
                .map(|(entity, transform, hurtbox, ..)| (entity, transform, hurtbox)),
        );

        for candidate in overlapping {
            if candidate == owner || is_owned_by(&parents, candidate, owner) {
                continue;
            }
            let Ok((target, target_transform, hurtbox, mut health, mut combat)) =
                targets.get_mut(candidate)
            else {
                continue;
            };
            if !volume.can_hit(target) || !health.is_alive() {
                continue;
            }

            let center = hurtbox.center(target_transform);
            // Contact point/normal из вектора owner → target
            let normal = (center - shape.center)
                .try_normalize()
                .unwrap_or_else(|| target_transform.translation - owner_transform.translation)
                .normalize_or_zero();
            let point = center - normal * hurtbox.radius;
            let event = DamageEvent::new(volume.damage(), volume.reason)
                .with_contact(point, normal)
                .with_source(owner);

            let mut multiplier = 1.0;
            if let Some(combat) = combat.as_mut() {
                if combat.is_parrying() {
                    let success = combat.try_consume_parry(
                        Some(owner),
                        owner_transform.translation,
                        target_transform.translation,
                        target_transform.forward().as_vec3(),
                        now,
                    );
                    if let Some(success) = success {
                        logger::log_info(&format!(
                            "🛡️ Parry: {:?} parried {:?} (stun {:.1}s)",
                            target, owner, success.stun_duration
                        ));
                        parried.write(ParrySucceeded {
                            defender: target,
                            attacker: success.attacker,
                            stun_duration: success.stun_duration,
                        });
                        continue;
                    }
                }
                multiplier = combat.incoming_damage_multiplier();
            }

            let outcome = health.take_damage(&event, multiplier);
            if !outcome.applied() {
                continue;
            }

            notify_damage_outcome(
                target,
                &health,
                &event,
                outcome,
                &mut health_changed,
                &mut damaged,
                &mut died,
            );

            if volume.register_hit(target) {
                hit_confirmed.write(HitConfirmed {
                    attacker: owner,
                    target,
                    damage: event.amount,
                });
            }
        }
    }
}

/// Владелец volume и вся его иерархия (оружие, дети оружия) не получают урон.
fn is_owned_by(parents: &Query<&ChildOf>, entity: Entity, owner: Entity) -> bool {
    let mut current = entity;
    while let Ok(child_of) = parents.get(current) {
        let parent = child_of.parent();
        if parent == owner {
            return true;
        }
        current = parent;
    }
    false
}

/// Система: лечение расходниками.
///
/// HealthChanged только если что-то реально восстановлено
/// (мёртвые и полные не лечатся).
pub fn apply_heals(
    mut requests: EventReader<HealRequested>,
    mut actors: Query<&mut Health, Without<Dead>>,
    mut health_changed: EventWriter<HealthChanged>,
) {
    for request in requests.read() {
        let Ok(mut health) = actors.get_mut(request.entity) else {
            continue;
        };

        let restored = health.heal(request.amount);
        if restored <= 0.0 {
            continue;
        }

        logger::log(&format!(
            "💚 {:?} healed {:.1} ({:.1}/{:.1})",
            request.entity,
            restored,
            health.current(),
            health.max()
        ));
        health_changed.write(HealthChanged {
            entity: request.entity,
            current: health.current(),
            max: health.max(),
        });
    }
}

/// Система: death bookkeeping.
///
/// Dead marker + все gates выключены (combo reset, volume off, movement lock).
/// Игрок остаётся в мире, остальные получают DespawnAfter.
pub fn handle_deaths(
    mut commands: Commands,
    mut death_events: EventReader<EntityDied>,
    mut actors: Query<(
        Option<&mut LocomotionBody>,
        Option<&mut HitVolume>,
        Option<&mut CombatState>,
        Option<&mut AttackCapability>,
        Has<Player>,
    )>,
    tuning: Res<CombatTuning>,
    time: Res<Time<Fixed>>,
) {
    for event in death_events.read() {
        let Ok((mut body, mut volume, mut combat, capability, is_player)) =
            actors.get_mut(event.entity)
        else {
            continue;
        };

        if let Some(volume) = volume.as_mut() {
            volume.deactivate();
        }
        if let Some(body) = body.as_mut() {
            if let (Some(combat), Some(volume)) = (combat.as_mut(), volume.as_mut()) {
                combat.set_input_locked(true, body, volume);
            }
            body.set_move_intent(Vec2::ZERO);
            body.set_movement_locked(true);
        }
        if let Some(mut capability) = capability {
            capability.cancel();
        }

        let Ok(mut entity_commands) = commands.get_entity(event.entity) else {
            continue;
        };
        entity_commands.insert(Dead);

        if is_player {
            logger::log_info(&format!(
                "💀 Player {:?} died ({:?})",
                event.entity, event.cause.reason
            ));
        } else {
            entity_commands.insert(DespawnAfter {
                despawn_time: time.elapsed_secs() + tuning.despawn_delay,
            });
            logger::log_info(&format!(
                "💀 {:?} died ({:?}), despawn in {:.1}s",
                event.entity, event.cause.reason, tuning.despawn_delay
            ));
        }
    }
}

/// Система: despawn entities после timeout
pub fn despawn_after_timeout(
    mut commands: Commands,
    query: Query<(Entity, &DespawnAfter)>,
    time: Res<Time<Fixed>>,
) {
    let current_time = time.elapsed_secs();

    for (entity, despawn_after) in query.iter() {
        if current_time >= despawn_after.despawn_time {
            if let Ok(mut entity_commands) = commands.get_entity(entity) {
                entity_commands.despawn();
            }
        }
    }
}
