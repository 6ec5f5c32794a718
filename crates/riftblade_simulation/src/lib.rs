//! Riftblade Simulation Core
//!
//! Headless ECS combat core на Bevy 0.16: locomotion, hit volumes, damage,
//! combo/parry state machine игрока, FSM адверсариев и pattern scheduler.
//!
//! Host (engine/editor/тесты) отвечает за:
//! - анимации: проигрывает `ActionRequested`, стреляет `AnimationTrigger`
//! - spatial queries: подставляет свой `SpatialQuery` backend
//! - input: пишет `PlayerInput`

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod combat;
pub mod components;
pub mod config;
pub mod input;
pub mod logger;
pub mod physics;

// Re-export базовых типов для удобства
pub use ai::{AdversaryBrain, AdversaryPlugin, AdversaryState, PatternBook};
pub use combat::{
    ActionRequested, AnimationTrigger, AttackCapability, CombatPlugin, CombatState,
    CollisionMask, Dead, EntityDied, HealRequested, HealthChanged, HitVolume, Hurtbox,
    TriggerKind,
};
pub use components::*;
pub use config::{CombatTuning, ConfigError};
pub use input::{InputCommand, PlayerInput};
pub use logger::{init_logger, log, log_error, log_info, log_warning};
pub use physics::{LocomotionBody, LocomotionPlugin, SpatialQueries};

/// Порядок систем внутри tick'а.
///
/// Update (frame tick): Input → Ai → Triggers
/// FixedUpdate (60Hz): Physics → Combat
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Timers + player input
    Input,
    Ai,
    /// Animation triggers от host'а и pattern cues
    Triggers,
    Physics,
    /// Hit detection, damage, deaths
    Combat,
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для physics tick
            .insert_resource(Time::<Fixed>::from_hz(60.0))
            .configure_sets(
                Update,
                (SimulationSet::Input, SimulationSet::Ai, SimulationSet::Triggers).chain(),
            )
            .configure_sets(
                FixedUpdate,
                (SimulationSet::Physics, SimulationSet::Combat).chain(),
            )
            .add_plugins((LocomotionPlugin, CombatPlugin, AdversaryPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed));

    app
}

/// Фракция игрока (адверсарии бьют только чужих)
pub const PLAYER_FACTION: u64 = 1;
pub const ADVERSARY_FACTION: u64 = 2;

/// Spawn игрока со всем combat стеком (tuning из `CombatTuning`).
pub fn spawn_player(commands: &mut Commands, tuning: &CombatTuning, position: Vec3) -> Entity {
    commands
        .spawn((
            Transform::from_translation(position),
            Actor {
                faction_id: PLAYER_FACTION,
            },
            Player,
            Health::new(tuning.player_health),
            LocomotionBody::new(tuning.locomotion),
            CombatState::new(tuning.combo.clone(), tuning.parry),
            // Меч: сфера перед грудью
            HitVolume::new(0.8, Vec3::new(0.0, 1.0, -1.0), CollisionMask::ADVERSARY),
            Hurtbox::new(tuning.locomotion.body_radius, CollisionMask::PLAYER),
        ))
        .id()
}

/// Spawn адверсария (FSM + паттерны + basic attack).
pub fn spawn_adversary(commands: &mut Commands, tuning: &CombatTuning, position: Vec3) -> Entity {
    commands
        .spawn((
            Transform::from_translation(position),
            Actor {
                faction_id: ADVERSARY_FACTION,
            },
            Health::new(tuning.adversary_health),
            AdversaryBrain::new(tuning.adversary.clone()),
            PatternBook::new(tuning.patterns.iter().cloned()),
            AttackCapability::new(tuning.attack.clone()),
            LocomotionBody::new(tuning.locomotion),
            // Basic attack достаёт цель на attack_range от attack origin
            HitVolume::new(1.5, Vec3::new(0.0, 1.0, -1.5), CollisionMask::PLAYER),
            Hurtbox::new(tuning.locomotion.body_radius * 1.5, CollisionMask::ADVERSARY),
        ))
        .id()
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
