//! Combat integration tests
//!
//! Полный SimulationPlugin headless, время через ManualDuration (60 fps).
//! Animation host заменён ручной отправкой AnimationTrigger.
//!
//! Проверяем:
//! - combo игрока через события (10 → 12 → 15)
//! - босс: Chase → BasicAttack → урон
//! - parry → Down → восстановление
//! - смерть: Dead marker, despawn адверсария, игрок остаётся
//! - паттерн: Pattern → cooldown → BasicAttack

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use riftblade_simulation::ai::{AdversaryState, AdversaryStateChanged, PatternCue, PatternCueFired, PhaseChanged};
use riftblade_simulation::combat::{DamageEvent, DamageReason, ParrySucceeded};
use riftblade_simulation::*;

/// Всё, что core отдал наружу за прогон.
#[derive(Resource, Default)]
struct Recorded {
    actions: Vec<(Entity, String, u8)>,
    deaths: Vec<Entity>,
    parries: Vec<(Entity, Entity)>,
    transitions: Vec<(Entity, AdversaryState)>,
    cues: Vec<(Entity, PatternCue)>,
    phases: Vec<(Entity, u8)>,
}

fn record(
    mut recorded: ResMut<Recorded>,
    mut actions: EventReader<ActionRequested>,
    mut deaths: EventReader<EntityDied>,
    mut parries: EventReader<ParrySucceeded>,
    mut transitions: EventReader<AdversaryStateChanged>,
    mut cues: EventReader<PatternCueFired>,
    mut phases: EventReader<PhaseChanged>,
) {
    for a in actions.read() {
        recorded.actions.push((a.entity, a.action.clone(), a.combo_index));
    }
    for d in deaths.read() {
        recorded.deaths.push(d.entity);
    }
    for p in parries.read() {
        recorded.parries.push((p.defender, p.attacker));
    }
    for t in transitions.read() {
        recorded.transitions.push((t.entity, t.to));
    }
    for c in cues.read() {
        recorded.cues.push((c.entity, c.cue.clone()));
    }
    for p in phases.read() {
        recorded.phases.push((p.entity, p.to));
    }
}

/// Helper: combat App с ManualDuration временем
fn create_combat_app(tuning: CombatTuning) -> App {
    let mut app = create_headless_app(42);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
        1.0 / 60.0,
    )))
    .insert_resource(tuning)
    .init_resource::<Recorded>()
    .add_plugins(SimulationPlugin)
    .add_systems(Last, record);
    app
}

fn tuning_without_patterns() -> CombatTuning {
    CombatTuning {
        patterns: Vec::new(),
        ..CombatTuning::default()
    }
}

fn spawn_pair(app: &mut App, boss_position: Vec3) -> (Entity, Entity) {
    let tuning = app.world().resource::<CombatTuning>().clone();
    let player = spawn_player(&mut app.world_mut().commands(), &tuning, Vec3::ZERO);
    let boss = spawn_adversary(&mut app.world_mut().commands(), &tuning, boss_position);
    app.world_mut().flush();
    (player, boss)
}

/// Босс сразу смотрит на игрока (origin).
fn face_origin(app: &mut App, entity: Entity) {
    if let Some(mut transform) = app.world_mut().get_mut::<Transform>(entity) {
        *transform = transform.looking_at(Vec3::ZERO, Vec3::Y);
    }
}

fn run(app: &mut App, frames: usize) {
    for _ in 0..frames {
        app.update();
    }
}

/// Крутит кадры, пока условие не выполнится. Returns false по таймауту.
fn run_until(app: &mut App, max_frames: usize, mut condition: impl FnMut(&World) -> bool) -> bool {
    for _ in 0..max_frames {
        app.update();
        if condition(app.world()) {
            return true;
        }
    }
    false
}

fn input(app: &mut App, entity: Entity, command: InputCommand) {
    app.world_mut().send_event(PlayerInput::new(entity, command));
}

fn trigger(app: &mut App, entity: Entity, trigger: TriggerKind) {
    app.world_mut().send_event(AnimationTrigger { entity, trigger });
}

fn health(app: &App, entity: Entity) -> f32 {
    app.world().get::<Health>(entity).map(|h| h.current()).unwrap_or(-1.0)
}

fn state(world: &World, entity: Entity) -> Option<AdversaryState> {
    world.get::<AdversaryBrain>(entity).map(|b| b.state())
}

fn boss_swung(world: &World, boss: Entity) -> bool {
    world
        .resource::<Recorded>()
        .actions
        .iter()
        .any(|(entity, action, _)| *entity == boss && (action == "Slash" || action == "Thrust"))
}

#[test]
fn test_player_combo_through_events() {
    let mut app = create_combat_app(tuning_without_patterns());
    let tuning = CombatTuning::default();
    let player = spawn_player(&mut app.world_mut().commands(), &tuning, Vec3::ZERO);
    // Манекен: damageable, без AI
    let dummy = app
        .world_mut()
        .spawn((
            Transform::from_xyz(0.0, 0.0, -1.5),
            Actor {
                faction_id: ADVERSARY_FACTION,
            },
            Health::new(100.0),
            Hurtbox::new(0.6, CollisionMask::ADVERSARY),
        ))
        .id();
    app.world_mut().flush();
    run(&mut app, 3);

    input(&mut app, player, InputCommand::Attack);
    run(&mut app, 1);
    trigger(&mut app, player, TriggerKind::HitStart { damage: None });
    run(&mut app, 2);
    assert_eq!(health(&app, dummy), 90.0);

    for expected in [78.0, 63.0] {
        // Буфер + конец анимации → следующий шаг combo
        input(&mut app, player, InputCommand::Attack);
        trigger(&mut app, player, TriggerKind::HitEnd);
        trigger(&mut app, player, TriggerKind::AttackAnimEnd);
        run(&mut app, 1);
        trigger(&mut app, player, TriggerKind::HitStart { damage: None });
        run(&mut app, 2);
        assert_eq!(health(&app, dummy), expected);
    }

    trigger(&mut app, player, TriggerKind::HitEnd);
    trigger(&mut app, player, TriggerKind::AttackAnimEnd);
    run(&mut app, 1);

    let combat = app.world().get::<CombatState>(player).unwrap();
    assert!(!combat.is_attacking());
    assert_eq!(combat.combo_index(), 0);

    let attacks: Vec<u8> = app
        .world()
        .resource::<Recorded>()
        .actions
        .iter()
        .filter(|(entity, action, _)| *entity == player && action == "Attack")
        .map(|(_, _, index)| *index)
        .collect();
    assert_eq!(attacks, vec![1, 2, 3]);
}

#[test]
fn test_boss_chases_and_lands_basic_attack() {
    let mut app = create_combat_app(tuning_without_patterns());
    let (player, boss) = spawn_pair(&mut app, Vec3::new(0.0, 0.0, -8.0));

    let reached = run_until(&mut app, 300, |world| {
        state(world, boss) == Some(AdversaryState::BasicAttack) && boss_swung(world, boss)
    });
    assert!(reached, "boss should close in and swing");

    let transitions: Vec<AdversaryState> = app
        .world()
        .resource::<Recorded>()
        .transitions
        .iter()
        .filter(|(entity, _)| *entity == boss)
        .map(|(_, to)| *to)
        .collect();
    assert_eq!(
        &transitions[..2],
        &[AdversaryState::Chase, AdversaryState::BasicAttack]
    );

    let boss_z = app.world().get::<Transform>(boss).unwrap().translation.z;
    assert!(boss_z > -4.0, "boss moved towards player, z = {}", boss_z);

    // Даём довернуться к цели и бьём
    run(&mut app, 10);
    trigger(&mut app, boss, TriggerKind::HitStart { damage: None });
    run(&mut app, 2);

    let hp = health(&app, player);
    assert!(hp == 85.0 || hp == 80.0, "Slash (15) or Thrust (20), got {}", hp);
}

#[test]
fn test_parry_sends_attacker_down_then_recovers() {
    let mut app = create_combat_app(tuning_without_patterns());
    let (player, boss) = spawn_pair(&mut app, Vec3::new(0.0, 0.0, -3.0));
    face_origin(&mut app, boss);

    assert!(run_until(&mut app, 120, |world| boss_swung(world, boss)));

    input(&mut app, player, InputCommand::Parry);
    trigger(&mut app, boss, TriggerKind::ParryWindowOpen { duration: 0.4 });
    trigger(&mut app, boss, TriggerKind::HitStart { damage: None });
    run(&mut app, 3);

    let recorded = app.world().resource::<Recorded>();
    assert_eq!(recorded.parries, vec![(player, boss)]);
    assert!(recorded
        .actions
        .iter()
        .any(|(entity, action, _)| *entity == boss && action == "Groggy"));
    assert_eq!(state(app.world(), boss), Some(AdversaryState::Down));
    assert_eq!(health(&app, player), 100.0);
    assert!(!app.world().get::<HitVolume>(boss).unwrap().is_active());

    // Stun 2.0s (AttackCapabilityConfig::parry_stun_duration)
    run(&mut app, 60);
    assert_eq!(state(app.world(), boss), Some(AdversaryState::Down));
    run(&mut app, 90);
    assert_ne!(state(app.world(), boss), Some(AdversaryState::Down));
}

#[test]
fn test_adversary_death_and_despawn() {
    let tuning = CombatTuning {
        adversary_health: 10.0,
        despawn_delay: 0.5,
        ..tuning_without_patterns()
    };
    let mut app = create_combat_app(tuning);
    let (player, boss) = spawn_pair(&mut app, Vec3::new(0.0, 0.0, -1.5));
    run(&mut app, 3);

    input(&mut app, player, InputCommand::Attack);
    run(&mut app, 1);
    trigger(&mut app, player, TriggerKind::HitStart { damage: None });
    run(&mut app, 3);

    assert_eq!(health(&app, boss), 0.0);
    assert_eq!(app.world().resource::<Recorded>().deaths, vec![boss]);
    assert!(app.world().get::<Dead>(boss).is_some());
    assert_eq!(state(app.world(), boss), Some(AdversaryState::Dead));

    run(&mut app, 45);
    assert!(app.world().get_entity(boss).is_err(), "despawned after delay");
    assert!(app.world().get_entity(player).is_ok());
    assert_eq!(app.world().resource::<Recorded>().deaths.len(), 1);
}

#[test]
fn test_player_death_keeps_entity_and_boss_goes_idle() {
    let tuning = CombatTuning {
        player_health: 10.0,
        ..tuning_without_patterns()
    };
    let mut app = create_combat_app(tuning);
    let (player, boss) = spawn_pair(&mut app, Vec3::new(0.0, 0.0, -3.0));
    face_origin(&mut app, boss);

    assert!(run_until(&mut app, 120, |world| boss_swung(world, boss)));
    trigger(&mut app, boss, TriggerKind::HitStart { damage: None });
    run(&mut app, 3);

    assert_eq!(app.world().resource::<Recorded>().deaths, vec![player]);
    assert!(app.world().get::<Dead>(player).is_some());
    assert!(app.world().get::<CombatState>(player).unwrap().is_input_locked());

    run(&mut app, 120);
    assert!(app.world().get_entity(player).is_ok(), "player is never despawned");
    assert_eq!(state(app.world(), boss), Some(AdversaryState::Idle));
}

#[test]
fn test_pattern_runs_then_cooldown_falls_back_to_basic_attack() {
    let mut app = create_combat_app(CombatTuning::default());
    let (_player, boss) = spawn_pair(&mut app, Vec3::new(0.0, 0.0, -8.0));
    face_origin(&mut app, boss);

    assert!(run_until(&mut app, 30, |world| {
        state(world, boss) == Some(AdversaryState::Pattern)
    }));
    assert_eq!(
        app.world().get::<AdversaryBrain>(boss).unwrap().current_pattern(),
        Some(0)
    );

    // LeapSlam длится 1.8s; после него cooldown 10s
    run(&mut app, 300);

    let recorded = app.world().resource::<Recorded>();
    assert!(recorded
        .actions
        .iter()
        .any(|(entity, action, _)| *entity == boss && action == "LeapSlam"));
    assert!(recorded
        .cues
        .iter()
        .any(|(entity, cue)| *entity == boss && *cue == PatternCue::TelegraphShow));

    let states: Vec<AdversaryState> = recorded
        .transitions
        .iter()
        .filter(|(entity, _)| *entity == boss)
        .map(|(_, to)| *to)
        .collect();
    assert_eq!(states.iter().filter(|s| **s == AdversaryState::Pattern).count(), 1);
    assert_eq!(states.last(), Some(&AdversaryState::BasicAttack));
    assert!(!app.world().get::<HitVolume>(boss).unwrap().is_active());
}

#[test]
fn test_phase_advances_on_health_threshold() {
    let mut app = create_combat_app(tuning_without_patterns());
    let (_player, boss) = spawn_pair(&mut app, Vec3::new(0.0, 0.0, -20.0));
    run(&mut app, 2);

    if let Some(mut health) = app.world_mut().get_mut::<Health>(boss) {
        health.take_damage(&DamageEvent::new(160.0, DamageReason::Environment), 1.0);
    }
    run(&mut app, 1);

    assert_eq!(app.world().resource::<Recorded>().phases, vec![(boss, 2)]);
    assert_eq!(app.world().get::<AdversaryBrain>(boss).unwrap().phase(), 2);
}
