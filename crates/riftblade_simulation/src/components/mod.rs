//! ECS Components для игровых entity
//!
//! Организация по доменам:
//! - actor: базовые характеристики (faction, health, player tag)
//!
//! Доменные компоненты (LocomotionBody, CombatState, AdversaryBrain...) живут
//! в своих модулях (physics, combat, ai).

pub mod actor;

// Re-exports для удобного импорта
pub use actor::*;
