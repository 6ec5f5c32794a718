//! Damage Resolution
//!
//! `Health::take_damage` - единственная точка мутации health от урона:
//! - мёртвых не бьём (reject)
//! - amount × incoming multiplier (0 во время parry guard)
//! - полностью поглощённый удар = reject без мутации
//! - смерть one-shot, последующие вызовы - no-op
//!
//! Hooks (damaged/death/health-changed) уходят наблюдателям через Bevy events.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::Health;

/// Причина урона (death-state UI/вариант смерти выбираются по ней)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Reflect)]
pub enum DamageReason {
    #[default]
    Normal,
    /// Сильный удар паттерна (wave hit)
    Heavy,
    /// Скриптованный финал (cutscene kill)
    ScriptedFinale,
    Environment,
}

/// Immutable значение урона; создаётся в момент подтверждённого попадания.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct DamageEvent {
    /// ≥ 0
    pub amount: f32,
    pub point: Vec3,
    pub normal: Vec3,
    pub reason: DamageReason,
    /// Кто нанёс (None = окружение/скрипт)
    pub source: Option<Entity>,
}

impl DamageEvent {
    pub fn new(amount: f32, reason: DamageReason) -> Self {
        Self {
            amount: amount.max(0.0),
            point: Vec3::ZERO,
            normal: Vec3::ZERO,
            reason,
            source: None,
        }
    }

    pub fn with_contact(mut self, point: Vec3, normal: Vec3) -> Self {
        self.point = point;
        self.normal = normal;
        self
    }

    pub fn with_source(mut self, source: Entity) -> Self {
        self.source = Some(source);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    TargetDead,
    /// multiplier/amount дали 0 (parry guard)
    Absorbed,
}

/// Результат `take_damage`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    Rejected(RejectReason),
    Damaged { dealt: f32, remaining: f32 },
    Killed { dealt: f32 },
}

impl DamageOutcome {
    pub fn applied(&self) -> bool {
        !matches!(self, DamageOutcome::Rejected(_))
    }
}

impl Health {
    /// Damage Resolution. `incoming_multiplier` запрашивается у цели
    /// (`CombatState::incoming_damage_multiplier`, 1.0 если политики нет).
    pub fn take_damage(&mut self, event: &DamageEvent, incoming_multiplier: f32) -> DamageOutcome {
        if !self.alive {
            return DamageOutcome::Rejected(RejectReason::TargetDead);
        }

        let amount = event.amount.max(0.0) * incoming_multiplier.max(0.0);
        if amount <= 0.0 {
            return DamageOutcome::Rejected(RejectReason::Absorbed);
        }

        let dealt = amount.min(self.current);
        self.current = (self.current - amount).max(0.0);

        if self.current <= 0.0 {
            self.current = 0.0;
            self.alive = false;
            return DamageOutcome::Killed { dealt };
        }

        DamageOutcome::Damaged {
            dealt,
            remaining: self.current,
        }
    }
}

/// Change-notification для UI (вместо polling).
#[derive(Event, Debug, Clone, Copy)]
pub struct HealthChanged {
    pub entity: Entity,
    pub current: f32,
    pub max: f32,
}

/// Inbound: расходник (аптечка, зелье) лечит entity через `Healable`.
#[derive(Event, Debug, Clone, Copy)]
pub struct HealRequested {
    pub entity: Entity,
    pub amount: f32,
}

/// Damaged hook: урон принят, цель жива.
#[derive(Event, Debug, Clone, Copy)]
pub struct ActorDamaged {
    pub entity: Entity,
    pub damage: DamageEvent,
    pub dealt: f32,
    pub remaining: f32,
}

/// Death hook: вызывается ровно один раз, с исходным DamageEvent.
#[derive(Event, Debug, Clone, Copy)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
    pub cause: DamageEvent,
}

/// Компонент-маркер: entity мертв (Health == 0)
///
/// Игрок остаётся с маркером, боссы дополнительно получают DespawnAfter.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Dead;

/// Компонент: despawn entity после указанного времени
///
/// Death sequence завершилась → entity удаляется.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct DespawnAfter {
    /// Абсолютное время despawn (Time<Fixed>::elapsed_secs)
    pub despawn_time: f32,
}

/// Шлёт hooks по результату `take_damage`.
pub fn notify_damage_outcome(
    entity: Entity,
    health: &Health,
    damage: &DamageEvent,
    outcome: DamageOutcome,
    health_changed: &mut EventWriter<HealthChanged>,
    damaged: &mut EventWriter<ActorDamaged>,
    died: &mut EventWriter<EntityDied>,
) {
    match outcome {
        DamageOutcome::Rejected(_) => return,
        DamageOutcome::Damaged { dealt, remaining } => {
            damaged.write(ActorDamaged {
                entity,
                damage: *damage,
                dealt,
                remaining,
            });
        }
        DamageOutcome::Killed { .. } => {
            died.write(EntityDied {
                entity,
                killer: damage.source,
                cause: *damage,
            });
        }
    }

    health_changed.write(HealthChanged {
        entity,
        current: health.current(),
        max: health.max(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(amount: f32) -> DamageEvent {
        DamageEvent::new(amount, DamageReason::Normal)
    }

    #[test]
    fn test_health_sequence_and_single_death() {
        let mut health = Health::new(100.0);

        assert_eq!(
            health.take_damage(&hit(30.0), 1.0),
            DamageOutcome::Damaged {
                dealt: 30.0,
                remaining: 70.0
            }
        );
        assert_eq!(health.current(), 70.0);

        health.take_damage(&hit(30.0), 1.0);
        assert_eq!(health.current(), 40.0);

        let killing = health.take_damage(&hit(40.0), 1.0);
        assert_eq!(killing, DamageOutcome::Killed { dealt: 40.0 });
        assert_eq!(health.current(), 0.0);
        assert!(!health.is_alive());

        let after = health.take_damage(&hit(40.0), 1.0);
        assert!(!after.applied());
        assert_eq!(after, DamageOutcome::Rejected(RejectReason::TargetDead));
        assert_eq!(health.current(), 0.0);
    }

    #[test]
    fn test_overkill_clamps_to_zero() {
        let mut health = Health::new(50.0);
        let outcome = health.take_damage(&hit(500.0), 1.0);
        assert_eq!(outcome, DamageOutcome::Killed { dealt: 50.0 });
        assert_eq!(health.current(), 0.0);
    }

    #[test]
    fn test_guard_multiplier_absorbs_without_mutation() {
        let mut health = Health::new(100.0);
        let outcome = health.take_damage(&hit(30.0), 0.0);
        assert_eq!(outcome, DamageOutcome::Rejected(RejectReason::Absorbed));
        assert_eq!(health.current(), 100.0);
        assert!(health.is_alive());
    }

    #[test]
    fn test_negative_amount_is_clamped() {
        let event = DamageEvent::new(-5.0, DamageReason::Normal);
        assert_eq!(event.amount, 0.0);

        let mut health = Health::new(100.0);
        assert!(!health.take_damage(&event, 1.0).applied());
    }

    #[test]
    fn test_builder_sets_contact_and_source() {
        let event = hit(10.0)
            .with_contact(Vec3::X, Vec3::NEG_X)
            .with_source(Entity::PLACEHOLDER);
        assert_eq!(event.point, Vec3::X);
        assert_eq!(event.normal, Vec3::NEG_X);
        assert_eq!(event.source, Some(Entity::PLACEHOLDER));
    }
}
