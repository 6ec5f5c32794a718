//! Pattern runner: продвигает timeline текущего паттерна и раздаёт cues.
//!
//! Combat cues (hit window, parry telegraph) идут тем же путём, что и
//! animation triggers; presentational cues - наблюдателям.

use bevy::prelude::*;

use crate::ai::components::{AdversaryBrain, AdversaryState, PatternBook, PatternCue};
use crate::ai::events::PatternCueFired;
use crate::combat::{ActionRequested, AnimationTrigger, TriggerKind};

/// Cue → AnimationTrigger (None для presentational cues).
pub fn cue_trigger(cue: &PatternCue) -> Option<TriggerKind> {
    match cue {
        PatternCue::HitStart(damage) => Some(TriggerKind::HitStart {
            damage: Some(*damage),
        }),
        PatternCue::HitEnd => Some(TriggerKind::HitEnd),
        PatternCue::ParryWindowOpen(duration) => Some(TriggerKind::ParryWindowOpen {
            duration: *duration,
        }),
        PatternCue::ParryWindowClose => Some(TriggerKind::ParryWindowClose),
        PatternCue::Action(_)
        | PatternCue::TelegraphShow
        | PatternCue::TelegraphHide
        | PatternCue::WaveStart(_)
        | PatternCue::WaveEnd(_) => None,
    }
}

/// System: advance running pattern (frame tick)
pub fn run_patterns(
    mut adversaries: Query<(Entity, &AdversaryBrain, &mut PatternBook)>,
    mut triggers: EventWriter<AnimationTrigger>,
    mut actions: EventWriter<ActionRequested>,
    mut cues: EventWriter<PatternCueFired>,
    time: Res<Time>,
) {
    let dt = time.delta_secs();

    for (entity, brain, mut book) in adversaries.iter_mut() {
        if brain.state() != AdversaryState::Pattern {
            continue;
        }
        let Some(pattern) = brain.current_pattern().and_then(|index| book.get_mut(index)) else {
            continue;
        };

        let name = pattern.name().to_string();
        for cue in pattern.advance(dt) {
            if let Some(trigger) = cue_trigger(&cue) {
                triggers.write(AnimationTrigger { entity, trigger });
                continue;
            }

            if let PatternCue::Action(action) = &cue {
                actions.write(ActionRequested::named(entity, action.clone()));
                continue;
            }

            cues.write(PatternCueFired {
                entity,
                pattern: name.clone(),
                cue,
            });
        }
    }
}
