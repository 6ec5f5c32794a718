//! Player input surface
//!
//! Input collaborator (keyboard/gamepad, уже debounced и нормализованный)
//! шлёт `PlayerInput` события. Core раздаёт их в LocomotionBody
//! (move/jump) и CombatState (attack/dash/weapon/parry).

use bevy::prelude::*;

use crate::combat::{ActionRequested, CombatState, Dead, HitVolume};
use crate::physics::LocomotionBody;

/// Дискретная команда игрока.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputCommand {
    /// Move intent в плоскости XZ (x → X, y → Z)
    Move(Vec2),
    Jump,
    /// Направление dash; ZERO = по move intent, иначе вперёд
    Dash(Vec2),
    Attack,
    ToggleWeapon,
    Parry,
}

/// Event: команда игрока для конкретного entity
#[derive(Event, Debug, Clone, Copy)]
pub struct PlayerInput {
    pub entity: Entity,
    pub command: InputCommand,
}

impl PlayerInput {
    pub fn new(entity: Entity, command: InputCommand) -> Self {
        Self { entity, command }
    }
}

/// Система: PlayerInput → LocomotionBody / CombatState.
pub fn process_player_input(
    mut inputs: EventReader<PlayerInput>,
    mut players: Query<
        (&mut CombatState, &mut LocomotionBody, &mut HitVolume, &Transform),
        Without<Dead>,
    >,
    mut actions: EventWriter<ActionRequested>,
) {
    for PlayerInput { entity, command } in inputs.read().copied() {
        let Ok((mut combat, mut body, mut volume, transform)) = players.get_mut(entity) else {
            continue;
        };

        let request = match command {
            InputCommand::Move(intent) => {
                let intent = if combat.is_input_locked() { Vec2::ZERO } else { intent };
                body.set_move_intent(intent);
                None
            }
            InputCommand::Jump => {
                if !combat.is_input_locked() {
                    body.request_jump();
                }
                None
            }
            InputCommand::Dash(direction) => {
                let direction = dash_direction(direction, body.move_intent(), transform);
                combat.try_dash(&mut body, &mut volume, direction)
            }
            InputCommand::Attack => combat.on_attack_input(&mut body),
            InputCommand::ToggleWeapon => Some(combat.toggle_weapon(&mut body, &mut volume)),
            InputCommand::Parry => combat.try_start_parry(&mut body),
        };

        if let Some(request) = request {
            actions.write(ActionRequested::from_request(entity, request));
        }
    }
}

fn dash_direction(requested: Vec2, intent: Vec2, transform: &Transform) -> Vec3 {
    if requested.length_squared() > f32::EPSILON {
        return Vec3::new(requested.x, 0.0, requested.y);
    }
    if intent.length_squared() > f32::EPSILON {
        return Vec3::new(intent.x, 0.0, intent.y);
    }
    transform.forward().as_vec3()
}
