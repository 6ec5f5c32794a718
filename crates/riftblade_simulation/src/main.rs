//! Headless симуляция Riftblade
//!
//! Игрок против босса без рендера. Анимации заменены скриптованным host'ом:
//! каждое `ActionRequested` раскладывается в `AnimationTrigger` по таймингам.
//!
//! Usage: `riftblade_simulation [tuning.ron]`

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use riftblade_simulation::ai::AdversaryStateChanged;
use riftblade_simulation::*;

const FRAME: f32 = 1.0 / 60.0;
const TICKS: u32 = 3600;

/// Тайминги анимаций (секунды от начала action).
const ATTACK_SCRIPT: &[(f32, TriggerKind)] = &[
    (0.05, TriggerKind::MoveForward),
    (0.15, TriggerKind::HitStart { damage: None }),
    (0.3, TriggerKind::HitEnd),
    (0.35, TriggerKind::StepBack),
    (0.5, TriggerKind::AttackAnimEnd),
];

const PARRY_SCRIPT: &[(f32, TriggerKind)] = &[(0.5, TriggerKind::ParryStanceEnd)];

const ADVERSARY_SWING_SCRIPT: &[(f32, TriggerKind)] = &[
    (0.2, TriggerKind::ParryWindowOpen { duration: 0.4 }),
    (0.45, TriggerKind::HitStart { damage: None }),
    (0.6, TriggerKind::ParryWindowClose),
    (0.65, TriggerKind::HitEnd),
    (1.0, TriggerKind::AttackAnimEnd),
];

fn script_for(action: &str) -> &'static [(f32, TriggerKind)] {
    match action {
        "Attack" => ATTACK_SCRIPT,
        "Parry" => PARRY_SCRIPT,
        "Slash" | "Thrust" => ADVERSARY_SWING_SCRIPT,
        _ => &[],
    }
}

/// Очередь триггеров, ждущих своего времени.
#[derive(Resource, Default)]
struct ScriptedAnimations {
    pending: Vec<(Entity, f32, TriggerKind)>,
}

/// Host: новое action на entity отменяет его недоигранную анимацию.
fn play_requested_actions(
    mut requests: EventReader<ActionRequested>,
    mut animations: ResMut<ScriptedAnimations>,
    time: Res<Time<Virtual>>,
) {
    let now = time.elapsed_secs();
    for request in requests.read() {
        animations.pending.retain(|(entity, _, _)| *entity != request.entity);
        for (offset, trigger) in script_for(&request.action) {
            animations.pending.push((request.entity, now + offset, *trigger));
        }
    }
}

fn fire_due_triggers(
    mut animations: ResMut<ScriptedAnimations>,
    mut triggers: EventWriter<AnimationTrigger>,
    time: Res<Time<Virtual>>,
) {
    let now = time.elapsed_secs();
    animations.pending.retain(|(entity, at, trigger)| {
        if *at > now {
            return true;
        }
        triggers.write(AnimationTrigger {
            entity: *entity,
            trigger: *trigger,
        });
        false
    });
}

/// Пилот игрока: подходит к боссу, рубит, изредка парирует.
fn pilot_player(
    players: Query<(Entity, &Transform), (With<Player>, Without<Dead>)>,
    adversaries: Query<&Transform, With<AdversaryBrain>>,
    mut inputs: EventWriter<PlayerInput>,
    time: Res<Time<Virtual>>,
    mut last_attack: Local<f32>,
    mut last_parry: Local<f32>,
) {
    let now = time.elapsed_secs();
    for (player, transform) in players.iter() {
        let Some(target) = adversaries.iter().next() else {
            inputs.write(PlayerInput::new(player, InputCommand::Move(Vec2::ZERO)));
            continue;
        };

        let to_target = target.translation - transform.translation;
        let distance = Vec2::new(to_target.x, to_target.z).length();

        if distance > 2.0 {
            let direction = Vec2::new(to_target.x, to_target.z).normalize_or_zero();
            inputs.write(PlayerInput::new(player, InputCommand::Move(direction)));
            continue;
        }

        inputs.write(PlayerInput::new(player, InputCommand::Move(Vec2::ZERO)));
        if now - *last_parry > 3.0 {
            *last_parry = now;
            inputs.write(PlayerInput::new(player, InputCommand::Parry));
        } else if now - *last_attack > 0.4 {
            *last_attack = now;
            inputs.write(PlayerInput::new(player, InputCommand::Attack));
        }
    }
}

fn report_events(
    mut deaths: EventReader<EntityDied>,
    mut transitions: EventReader<AdversaryStateChanged>,
) {
    for death in deaths.read() {
        log_info(&format!("💀 {:?} died (killer: {:?})", death.entity, death.killer));
    }
    for change in transitions.read() {
        log(&format!("🤖 {:?}: {:?} → {:?}", change.entity, change.from, change.to));
    }
}

fn load_tuning() -> CombatTuning {
    let Some(path) = std::env::args().nth(1) else {
        return CombatTuning::default();
    };

    let source = match std::fs::read_to_string(&path) {
        Ok(source) => source,
        Err(err) => {
            log_error(&format!("❌ Cannot read {}: {}, using defaults", path, err));
            return CombatTuning::default();
        }
    };

    match CombatTuning::from_ron(&source) {
        Ok(tuning) => tuning,
        Err(err) => {
            log_error(&format!("❌ {}: {}, using defaults", path, err));
            CombatTuning::default()
        }
    }
}

fn main() {
    let seed = 42;
    let mut app = create_headless_app(seed);
    log_info(&format!("Starting Riftblade headless simulation (seed: {})", seed));

    let tuning = load_tuning();
    app.insert_resource(tuning.clone())
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(FRAME)))
        .init_resource::<ScriptedAnimations>()
        .add_plugins(SimulationPlugin)
        .add_systems(Update, pilot_player.before(SimulationSet::Input))
        .add_systems(
            Update,
            (play_requested_actions, fire_due_triggers, report_events)
                .chain()
                .after(SimulationSet::Triggers),
        );

    let player = spawn_player(&mut app.world_mut().commands(), &tuning, Vec3::ZERO);
    let boss = spawn_adversary(
        &mut app.world_mut().commands(),
        &tuning,
        Vec3::new(0.0, 0.0, -8.0),
    );
    app.world_mut().flush();

    for tick in 0..TICKS {
        app.update();

        if tick % 300 == 0 {
            let world = app.world();
            let player_hp = world.get::<Health>(player).map(|h| h.current());
            let boss_hp = world.get::<Health>(boss).map(|h| h.current());
            let boss_state = world.get::<AdversaryBrain>(boss).map(|b| b.state());
            log_info(&format!(
                "Tick {}: player {:?} HP, boss {:?} HP ({:?})",
                tick, player_hp, boss_hp, boss_state
            ));
        }
    }

    log_info("Simulation complete!");
}
