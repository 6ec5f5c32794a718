//! Combat tuning (RON-loadable).
//!
//! Единственное место, где core возвращает ошибки: загрузка и валидация
//! tuning файлов. Gameplay пути ошибок не возвращают.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::{AdversaryConfig, PatternConfig};
use crate::combat::{AttackCapabilityConfig, ComboConfig, ParryConfig};
use crate::physics::LocomotionConfig;

/// Errors that can occur while loading tuning.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// RON не распарсился
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("combo table is empty")]
    EmptyComboTable,

    /// Скорость/длительность должна быть > 0
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },

    #[error("pattern '{pattern}': inverted {band} band")]
    InvertedBand {
        pattern: String,
        band: &'static str,
    },

    #[error("parry facing threshold {0} is outside [-1, 1]")]
    ThresholdOutOfRange(f32),
}

/// Весь tuning симуляции.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    pub locomotion: LocomotionConfig,
    pub combo: ComboConfig,
    pub parry: ParryConfig,
    pub adversary: AdversaryConfig,
    pub attack: AttackCapabilityConfig,
    /// Паттерны босса в порядке приоритета
    pub patterns: Vec<PatternConfig>,
    pub player_health: f32,
    pub adversary_health: f32,
    /// Сколько мёртвый адверсарий лежит до despawn (секунды)
    pub despawn_delay: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            locomotion: LocomotionConfig::default(),
            combo: ComboConfig::default(),
            parry: ParryConfig::default(),
            adversary: AdversaryConfig::default(),
            attack: AttackCapabilityConfig::default(),
            patterns: vec![PatternConfig::leap_slam(), PatternConfig::shockwaves()],
            player_health: 100.0,
            adversary_health: 300.0,
            despawn_delay: 3.0,
        }
    }
}

impl CombatTuning {
    /// Парсит RON и валидирует. Отсутствующие поля берутся из `Default`.
    pub fn from_ron(source: &str) -> Result<Self, ConfigError> {
        let tuning: Self = ron::from_str(source)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.combo.damage_multipliers.is_empty() {
            return Err(ConfigError::EmptyComboTable);
        }

        positive("locomotion.move_speed", self.locomotion.move_speed)?;
        positive("locomotion.dash_speed", self.locomotion.dash_speed)?;
        positive("locomotion.dash_duration", self.locomotion.dash_duration)?;
        positive("locomotion.turn_speed", self.locomotion.turn_speed)?;
        positive("adversary.attack_range", self.adversary.attack_range)?;
        positive("adversary.lose_distance", self.adversary.lose_distance)?;
        positive("adversary.hysteresis_factor", self.adversary.hysteresis_factor)?;
        positive("player_health", self.player_health)?;
        positive("adversary_health", self.adversary_health)?;

        if !(-1.0..=1.0).contains(&self.parry.min_facing_dot) {
            return Err(ConfigError::ThresholdOutOfRange(self.parry.min_facing_dot));
        }

        for pattern in &self.patterns {
            // 0 = граница отключена, поэтому сравниваем только если обе заданы
            let distance_inverted = pattern.min_distance > 0.0
                && pattern.max_distance > 0.0
                && pattern.min_distance > pattern.max_distance;
            if distance_inverted {
                return Err(ConfigError::InvertedBand {
                    pattern: pattern.name.clone(),
                    band: "distance",
                });
            }
            if pattern.min_phase > pattern.max_phase {
                return Err(ConfigError::InvertedBand {
                    pattern: pattern.name.clone(),
                    band: "phase",
                });
            }
        }

        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}
