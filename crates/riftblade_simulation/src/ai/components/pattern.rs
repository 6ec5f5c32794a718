//! Attack patterns + Pattern Scheduler.
//!
//! Pattern - скриптованный timeline (`PatternStep { at, cue }`), которым
//! владеет адверсарий (`PatternBook`). Scheduler только выбирает.
//! "Корутина" паттерна = elapsed counter, продвигаемый frame tick'ом.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Cue в timeline паттерна.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
pub enum PatternCue {
    /// `playAction(name)`
    Action(String),
    TelegraphShow,
    TelegraphHide,
    WaveStart(u32),
    WaveEnd(u32),
    /// Открыть hit volume с указанным уроном
    HitStart(f32),
    HitEnd,
    /// Telegraph для parry (duration окна)
    ParryWindowOpen(f32),
    ParryWindowClose,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
pub struct PatternStep {
    /// Секунды от старта паттерна
    pub at: f32,
    pub cue: PatternCue,
}

impl PatternStep {
    pub fn new(at: f32, cue: PatternCue) -> Self {
        Self { at, cue }
    }
}

/// Gating + timeline паттерна.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct PatternConfig {
    pub name: String,
    pub cooldown: f32,
    /// 0 = без нижней границы
    pub min_distance: f32,
    /// 0 = без верхней границы
    pub max_distance: f32,
    pub min_phase: u8,
    pub max_phase: u8,
    /// Минимальная длительность (паттерн длится max(duration, последний step))
    pub duration: f32,
    pub steps: Vec<PatternStep>,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            name: "Pattern".to_string(),
            cooldown: 8.0,
            min_distance: 0.0,
            max_distance: 0.0,
            min_phase: 0,
            max_phase: u8::MAX,
            duration: 0.0,
            steps: Vec::new(),
        }
    }
}

impl PatternConfig {
    pub fn total_duration(&self) -> f32 {
        self.steps
            .iter()
            .map(|step| step.at)
            .fold(self.duration.max(0.0), f32::max)
    }

    pub fn distance_in_band(&self, distance: f32) -> bool {
        (self.min_distance <= 0.0 || distance >= self.min_distance)
            && (self.max_distance <= 0.0 || distance <= self.max_distance)
    }

    pub fn phase_in_band(&self, phase: u8) -> bool {
        (self.min_phase..=self.max_phase).contains(&phase)
    }

    /// Пример: прыжок с ударом по площади + parry telegraph.
    pub fn leap_slam() -> Self {
        Self {
            name: "LeapSlam".to_string(),
            cooldown: 10.0,
            min_distance: 4.0,
            max_distance: 12.0,
            steps: vec![
                PatternStep::new(0.0, PatternCue::Action("LeapSlam".to_string())),
                PatternStep::new(0.0, PatternCue::TelegraphShow),
                PatternStep::new(0.6, PatternCue::ParryWindowOpen(0.4)),
                PatternStep::new(0.8, PatternCue::TelegraphHide),
                PatternStep::new(0.9, PatternCue::HitStart(25.0)),
                PatternStep::new(1.1, PatternCue::HitEnd),
                PatternStep::new(1.1, PatternCue::ParryWindowClose),
            ],
            duration: 1.8,
            ..Self::default()
        }
    }

    /// Пример: волны ударов во второй фазе.
    pub fn shockwaves() -> Self {
        let mut steps = vec![PatternStep::new(0.0, PatternCue::Action("Shockwave".to_string()))];
        for wave in 0..3u32 {
            let start = 0.5 + wave as f32 * 0.8;
            steps.push(PatternStep::new(start, PatternCue::WaveStart(wave + 1)));
            steps.push(PatternStep::new(start, PatternCue::HitStart(12.0)));
            steps.push(PatternStep::new(start + 0.3, PatternCue::HitEnd));
            steps.push(PatternStep::new(start + 0.3, PatternCue::WaveEnd(wave + 1)));
        }

        Self {
            name: "Shockwaves".to_string(),
            cooldown: 14.0,
            max_distance: 8.0,
            min_phase: 2,
            steps,
            duration: 3.2,
            ..Self::default()
        }
    }
}

/// Паттерн адверсария: config + runtime состояние прогона.
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct Pattern {
    pub config: PatternConfig,
    running: bool,
    elapsed: f32,
    next_step: usize,
    last_used: Option<f32>,
}

impl Pattern {
    pub fn new(mut config: PatternConfig) -> Self {
        // Timeline проигрывается по порядку времени
        config.steps.sort_by(|a, b| a.at.total_cmp(&b.at));
        Self {
            config,
            running: false,
            elapsed: 0.0,
            next_step: 0,
            last_used: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn last_used(&self) -> Option<f32> {
        self.last_used
    }

    pub fn cooldown_elapsed(&self, now: f32) -> bool {
        self.last_used
            .is_none_or(|used| now - used >= self.config.cooldown)
    }

    pub fn is_eligible(&self, now: f32, distance: f32, phase: u8) -> bool {
        !self.running
            && self.cooldown_elapsed(now)
            && self.config.distance_in_band(distance)
            && self.config.phase_in_band(phase)
    }

    /// Запуск. Повторный вызов во время прогона - no-op (false).
    pub fn execute(&mut self, now: f32) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.elapsed = 0.0;
        self.next_step = 0;
        self.last_used = Some(now);
        true
    }

    /// Продвигает timeline; возвращает cues, чьё время наступило.
    pub fn advance(&mut self, dt: f32) -> Vec<PatternCue> {
        if !self.running {
            return Vec::new();
        }

        self.elapsed += dt.max(0.0);
        let mut due = Vec::new();
        while let Some(step) = self.config.steps.get(self.next_step) {
            if step.at > self.elapsed {
                break;
            }
            due.push(step.cue.clone());
            self.next_step += 1;
        }

        if self.next_step >= self.config.steps.len() && self.elapsed >= self.config.total_duration() {
            self.running = false;
        }
        due
    }

    /// Отмена (Down/Dead). Cooldown сохраняется.
    pub fn stop(&mut self) {
        self.running = false;
        self.elapsed = 0.0;
        self.next_step = 0;
    }
}

/// Набор паттернов адверсария (в порядке объявления = приоритет).
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct PatternBook {
    patterns: Vec<Pattern>,
}

impl PatternBook {
    pub fn new(configs: impl IntoIterator<Item = PatternConfig>) -> Self {
        Self {
            patterns: configs.into_iter().map(Pattern::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Pattern> {
        self.patterns.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Pattern> {
        self.patterns.get_mut(index)
    }

    /// `selectPattern`: первый в порядке объявления, прошедший cooldown,
    /// distance band и phase band.
    pub fn select_pattern(&self, now: f32, distance: f32, phase: u8) -> Option<usize> {
        self.patterns
            .iter()
            .position(|pattern| pattern.is_eligible(now, distance, phase))
    }

    /// Index вне диапазона игнорируется (false).
    pub fn execute(&mut self, index: usize, now: f32) -> bool {
        self.patterns
            .get_mut(index)
            .is_some_and(|pattern| pattern.execute(now))
    }

    pub fn is_running(&self, index: usize) -> bool {
        self.patterns.get(index).is_some_and(Pattern::is_running)
    }

    pub fn stop_all(&mut self) {
        for pattern in &mut self.patterns {
            pattern.stop();
        }
    }
}
