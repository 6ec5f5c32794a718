//! Базовые компоненты акторов: Actor, Health, Player

use bevy::prelude::*;

/// Актор (игрок, враг, босс) - базовый компонент для живых существ
///
/// Автоматически добавляет Health через Required Components.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(Health)]
pub struct Actor {
    /// Stable ID фракции (враги бьют только чужих)
    pub faction_id: u64,
}

/// Маркер игрока (tag lookup для target acquisition у боссов)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Player;

/// Здоровье актора
///
/// Инвариант: 0 ≤ current ≤ max, alive == (current > 0).
/// Мутируется только через Damage Resolution (`Health::take_damage`) и `Healable`.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub(crate) current: f32,
    pub(crate) max: f32,
    pub(crate) alive: bool,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Health {
    pub fn new(max: f32) -> Self {
        let max = max.max(1.0);
        Self {
            current: max,
            max,
            alive: true,
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Доля здоровья 0.0..=1.0 (для phase thresholds и UI)
    pub fn fraction(&self) -> f32 {
        self.current / self.max
    }
}

/// Capability для расходников (аптечки, зелья).
///
/// Returns the amount actually restored.
pub trait Healable {
    fn heal(&mut self, amount: f32) -> f32;
}

impl Healable for Health {
    fn heal(&mut self, amount: f32) -> f32 {
        // Мёртвых не лечим: смерть one-shot
        if !self.alive || amount <= 0.0 {
            return 0.0;
        }

        let restored = amount.min(self.max - self.current);
        self.current += restored;
        restored
    }
}
