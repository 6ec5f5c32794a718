//! Attack capability - basic attack non-player актора
//!
//! ECS хранит: варианты атаки, cooldown, swing timer, текущую цель.
//! Анимация варианта играется хостом (`ActionRequested`), hit window
//! открывается trigger'ами (`HitStart`/`HitEnd`) с уроном текущего варианта.

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Один вариант basic attack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
pub struct AttackVariant {
    /// Имя для `playAction`
    pub action: String,
    pub damage: f32,
}

impl AttackVariant {
    pub fn new(action: impl Into<String>, damage: f32) -> Self {
        Self {
            action: action.into(),
            damage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct AttackCapabilityConfig {
    pub variants: Vec<AttackVariant>,
    /// Пауза между атаками (от начала swing)
    pub cooldown: f32,
    /// Длительность swing ("mid-swing" пока идёт)
    pub swing_duration: f32,
    /// Stun, который получит этот актор при успешном парировании
    pub parry_stun_duration: f32,
}

impl Default for AttackCapabilityConfig {
    fn default() -> Self {
        Self {
            variants: vec![
                AttackVariant::new("Slash", 15.0),
                AttackVariant::new("Thrust", 20.0),
            ],
            cooldown: 1.6,
            swing_duration: 1.0,
            parry_stun_duration: 2.0,
        }
    }
}

/// AttackCapability - компонент для акторов которые могут атаковать
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct AttackCapability {
    pub config: AttackCapabilityConfig,
    cooldown_timer: f32,
    swing_timer: f32,
    current_variant: Option<usize>,
    target: Option<Entity>,
}

impl Default for AttackCapability {
    fn default() -> Self {
        Self::new(AttackCapabilityConfig::default())
    }
}

impl AttackCapability {
    pub fn new(config: AttackCapabilityConfig) -> Self {
        Self {
            config,
            cooldown_timer: 0.0,
            swing_timer: 0.0,
            current_variant: None,
            target: None,
        }
    }

    /// Может ли атаковать (cooldown == 0, не mid-swing, есть варианты)
    pub fn can_attack(&self) -> bool {
        self.cooldown_timer <= 0.0 && self.swing_timer <= 0.0 && !self.config.variants.is_empty()
    }

    pub fn is_mid_swing(&self) -> bool {
        self.swing_timer > 0.0
    }

    /// Начать атаку: вариант выбирается seeded RNG.
    pub fn try_attack(&mut self, target: Entity, rng: &mut impl Rng) -> Option<&AttackVariant> {
        if !self.can_attack() {
            return None;
        }

        let index = rng.gen_range(0..self.config.variants.len());
        self.current_variant = Some(index);
        self.target = Some(target);
        self.cooldown_timer = self.config.cooldown;
        self.swing_timer = self.config.swing_duration;
        self.config.variants.get(index)
    }

    /// Урон текущего (или последнего) варианта.
    pub fn current_damage(&self) -> Option<f32> {
        self.current_variant
            .and_then(|index| self.config.variants.get(index))
            .map(|variant| variant.damage)
    }

    pub fn target(&self) -> Option<Entity> {
        self.target
    }

    /// Цель для parry windows (обновляется FSM и во время паттернов).
    pub fn set_target(&mut self, target: Option<Entity>) {
        self.target = target;
    }

    /// AttackAnimEnd: swing закончился раньше таймера.
    pub fn finish_swing(&mut self) {
        self.swing_timer = 0.0;
    }

    /// Down/Dead: прервать swing (cooldown сохраняется).
    pub fn cancel(&mut self) {
        self.swing_timer = 0.0;
        self.current_variant = None;
    }

    pub fn tick(&mut self, delta: f32) {
        self.cooldown_timer = (self.cooldown_timer - delta).max(0.0);
        self.swing_timer = (self.swing_timer - delta).max(0.0);
    }
}

/// System: обновление attack таймеров (frame tick)
pub fn tick_attack_capabilities(mut query: Query<&mut AttackCapability>, time: Res<Time>) {
    let delta = time.delta_secs();

    for mut capability in query.iter_mut() {
        capability.tick(delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_attack_cooldown_and_swing() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut capability = AttackCapability::default();
        let target = Entity::from_raw(1);
        assert!(capability.can_attack());

        let variant = capability.try_attack(target, &mut rng).cloned();
        assert!(variant.is_some());
        assert!(capability.is_mid_swing());
        assert_eq!(capability.target(), Some(target));
        assert_eq!(capability.current_damage(), variant.map(|v| v.damage));
        assert!(capability.try_attack(target, &mut rng).is_none());

        capability.tick(1.0);
        assert!(!capability.is_mid_swing());
        assert!(!capability.can_attack(), "cooldown 1.6 > swing 1.0");

        capability.tick(0.7);
        assert!(capability.can_attack());
    }

    #[test]
    fn test_variant_choice_is_seeded() {
        let pick = |seed: u64| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut capability = AttackCapability::default();
            (0..8)
                .map(|_| {
                    let action = capability
                        .try_attack(Entity::from_raw(1), &mut rng)
                        .map(|v| v.action.clone());
                    capability.tick(10.0);
                    action
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(pick(7), pick(7));
    }

    #[test]
    fn test_no_variants_never_attacks() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut capability = AttackCapability::new(AttackCapabilityConfig {
            variants: Vec::new(),
            ..AttackCapabilityConfig::default()
        });
        assert!(!capability.can_attack());
        assert!(capability.try_attack(Entity::from_raw(1), &mut rng).is_none());
    }

    #[test]
    fn test_cancel_clears_swing() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut capability = AttackCapability::default();
        capability.try_attack(Entity::from_raw(1), &mut rng);
        capability.cancel();
        assert!(!capability.is_mid_swing());
        assert_eq!(capability.current_damage(), None);
    }
}
