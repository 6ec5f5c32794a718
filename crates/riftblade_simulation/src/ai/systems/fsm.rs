//! AI FSM systems: perception → `AdversaryBrain::update` → locomotion.

use bevy::prelude::*;

use crate::ai::components::{
    chase_intent, flat_distance, AdversaryBrain, AdversaryState, BrainAction, BrainContext,
    PatternBook, Perception,
};
use crate::ai::events::AdversaryStateChanged;
use crate::combat::{ActionRequested, AttackCapability, Dead, HitVolume};
use crate::components::{Actor, Health, Player};
use crate::logger;
use crate::physics::{LocomotionBody, SpatialQueries};
use crate::DeterministicRng;

/// Высота "груди" цели для LOS проверки.
const TARGET_CHEST_HEIGHT: f32 = 1.0;

type AdversaryQuery<'a> = (
    Entity,
    &'a mut AdversaryBrain,
    &'a Transform,
    &'a Health,
    Option<&'a Actor>,
    Option<&'a mut PatternBook>,
    Option<&'a mut AttackCapability>,
    Option<&'a mut HitVolume>,
);

/// System: AI FSM (frame tick)
///
/// 1. Target: текущая цель, если жива, иначе ближайший Player (tag lookup)
/// 2. Perception: дистанции от root и attack origin, LOS через SpatialQueries
/// 3. `AdversaryBrain::update`
/// 4. Переход → AdversaryStateChanged, выход из атаки гасит hit volume
pub fn run_adversary_fsm(
    mut adversaries: Query<AdversaryQuery, Without<Player>>,
    players: Query<(Entity, &Transform, Option<&Actor>), (With<Player>, Without<Dead>)>,
    spatial: Res<SpatialQueries>,
    mut rng: ResMut<DeterministicRng>,
    mut state_changed: EventWriter<AdversaryStateChanged>,
    mut actions: EventWriter<ActionRequested>,
    virtual_time: Res<Time<Virtual>>,
    time: Res<Time>,
) {
    let now = virtual_time.elapsed_secs();
    let dt = time.delta_secs();

    for (entity, mut brain, transform, health, actor, mut patterns, mut attack, volume) in
        adversaries.iter_mut()
    {
        let faction = actor.map(|a| a.faction_id);
        let target = acquire_target(brain.target(), transform.translation, faction, &players);

        let perception = match target {
            Some((target, target_position)) => {
                let origin = transform.transform_point(brain.config.attack_origin_offset);
                let visible = !spatial
                    .backend()
                    .is_obstructed(origin, target_position + Vec3::Y * TARGET_CHEST_HEIGHT);
                Perception {
                    alive: health.is_alive(),
                    target: Some(target),
                    target_visible: visible,
                    distance: flat_distance(transform.translation, target_position),
                    attack_distance: flat_distance(origin, target_position),
                }
            }
            None => Perception {
                alive: health.is_alive(),
                ..Perception::no_target()
            },
        };

        if let Some(attack) = attack.as_mut() {
            attack.set_target(perception.target);
        }

        let from = brain.state();
        let action = {
            let mut ctx = BrainContext {
                perception,
                patterns: patterns.as_deref_mut(),
                attack: attack.as_deref_mut(),
                rng: &mut rng.rng,
                now,
                dt,
            };
            brain.update(&mut ctx)
        };
        let to = brain.state();

        if from != to {
            logger::log(&format!("{:?}: {:?} → {:?}", entity, from, to));
            state_changed.write(AdversaryStateChanged { entity, from, to });

            let was_attacking = matches!(from, AdversaryState::BasicAttack | AdversaryState::Pattern);
            if was_attacking {
                if let Some(mut volume) = volume {
                    volume.deactivate();
                }
            }
        }

        match action {
            Some(BrainAction::PlayAction(name)) => {
                actions.write(ActionRequested::named(entity, name));
            }
            Some(BrainAction::PatternStarted(index)) => {
                let name = patterns
                    .as_deref()
                    .and_then(|book| book.get(index))
                    .map(|pattern| pattern.name().to_string())
                    .unwrap_or_default();
                logger::log_info(&format!("⚔️ {:?} starts pattern '{}'", entity, name));
            }
            None => {}
        }
    }
}

/// Текущая цель если валидна, иначе ближайший живой Player чужой фракции.
fn acquire_target(
    current: Option<Entity>,
    position: Vec3,
    faction: Option<u64>,
    players: &Query<(Entity, &Transform, Option<&Actor>), (With<Player>, Without<Dead>)>,
) -> Option<(Entity, Vec3)> {
    if let Some(current) = current {
        if let Ok((entity, transform, _)) = players.get(current) {
            return Some((entity, transform.translation));
        }
    }

    players
        .iter()
        .filter(|(_, _, actor)| match (faction, actor) {
            (Some(own), Some(other)) => own != other.faction_id,
            _ => true,
        })
        .map(|(entity, transform, _)| (entity, transform.translation))
        .min_by(|a, b| {
            flat_distance(position, a.1)
                .total_cmp(&flat_distance(position, b.1))
                .then(a.0.cmp(&b.0))
        })
}

/// System: FSM → LocomotionBody (единственный gate - `can_move`)
///
/// - Chase: intent к цели до stand-off, поворот по движению
/// - BasicAttack/Pattern: стоим, доворачиваемся к цели
/// - Idle/Down/Dead: стоим
pub fn drive_adversary_locomotion(
    mut adversaries: Query<(&AdversaryBrain, &mut LocomotionBody, &Transform)>,
    targets: Query<&Transform, Without<AdversaryBrain>>,
) {
    for (brain, mut body, transform) in adversaries.iter_mut() {
        body.set_movement_locked(!brain.can_move());

        let target_position = brain
            .target()
            .and_then(|target| targets.get(target).ok())
            .map(|t| t.translation);

        match (brain.state(), target_position) {
            (AdversaryState::Chase, Some(target)) => {
                body.set_facing_override(None);
                body.set_move_intent(chase_intent(
                    transform.translation,
                    target,
                    brain.config.stand_off_distance,
                ));
            }
            (AdversaryState::BasicAttack | AdversaryState::Pattern, Some(target)) => {
                body.set_move_intent(Vec2::ZERO);
                body.set_facing_override(Some(target - transform.translation));
            }
            _ => {
                body.set_move_intent(Vec2::ZERO);
                body.set_facing_override(None);
            }
        }
    }
}
