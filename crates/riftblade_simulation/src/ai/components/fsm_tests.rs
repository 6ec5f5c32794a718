//! Tests for the adversary FSM.

#[cfg(test)]
mod tests {
    use bevy::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::super::fsm::{
        chase_intent, AdversaryBrain, AdversaryState, BrainAction, BrainContext, Perception,
        PhaseThresholds,
    };
    use super::super::pattern::{PatternBook, PatternConfig};
    use crate::combat::AttackCapability;

    const DT: f32 = 0.1;

    struct Rig {
        brain: AdversaryBrain,
        patterns: PatternBook,
        attack: AttackCapability,
        rng: ChaCha8Rng,
        now: f32,
    }

    impl Rig {
        fn new() -> Self {
            Self::with_patterns(Vec::new())
        }

        fn with_patterns(patterns: Vec<PatternConfig>) -> Self {
            Self {
                brain: AdversaryBrain::default(),
                patterns: PatternBook::new(patterns),
                attack: AttackCapability::default(),
                rng: ChaCha8Rng::seed_from_u64(42),
                now: 0.0,
            }
        }

        fn tick(&mut self, perception: Perception) -> Option<BrainAction> {
            self.now += DT;
            self.attack.tick(DT);
            let mut ctx = BrainContext {
                perception,
                patterns: Some(&mut self.patterns),
                attack: Some(&mut self.attack),
                rng: &mut self.rng,
                now: self.now,
                dt: DT,
            };
            self.brain.update(&mut ctx)
        }

        fn range(&self) -> f32 {
            self.brain.config.attack_range
        }
    }

    fn target() -> Entity {
        Entity::from_raw(9)
    }

    fn at(distance: f32) -> Perception {
        Perception::target_at(target(), distance, distance)
    }

    #[test]
    fn test_idle_until_visible_target() {
        let mut rig = Rig::new();
        rig.tick(Perception::no_target());
        assert_eq!(rig.brain.state(), AdversaryState::Idle);

        let mut hidden = at(5.0);
        hidden.target_visible = false;
        rig.tick(hidden);
        assert_eq!(rig.brain.state(), AdversaryState::Idle);

        rig.tick(at(5.0));
        assert_eq!(rig.brain.state(), AdversaryState::Chase);
        assert!(rig.brain.can_move());
        assert_eq!(rig.brain.target(), Some(target()));
    }

    #[test]
    fn test_converges_to_chase_outside_range() {
        let mut rig = Rig::new();
        let distance = rig.range() * 1.5;
        for _ in 0..20 {
            rig.tick(at(distance));
        }
        assert_eq!(rig.brain.state(), AdversaryState::Chase);
        assert!(rig.brain.can_move());
    }

    #[test]
    fn test_enters_basic_attack_within_range_and_swings() {
        let mut rig = Rig::new();
        rig.tick(at(5.0));
        rig.tick(at(rig.range() * 0.8));
        assert_eq!(rig.brain.state(), AdversaryState::BasicAttack);
        assert!(!rig.brain.can_move(), "only Chase moves");

        let action = rig.tick(at(rig.range() * 0.8));
        assert!(matches!(action, Some(BrainAction::PlayAction(_))));
        assert!(rig.attack.is_mid_swing());
    }

    #[test]
    fn test_hysteresis_keeps_basic_attack_at_1_1x() {
        let mut rig = Rig::new();
        rig.tick(at(5.0));
        rig.tick(at(rig.range()));
        assert_eq!(rig.brain.state(), AdversaryState::BasicAttack);

        let distance = rig.range() * 1.1;
        for _ in 0..40 {
            rig.tick(at(distance));
            assert_eq!(rig.brain.state(), AdversaryState::BasicAttack);
        }
    }

    #[test]
    fn test_leaves_basic_attack_beyond_1_2x_after_swing() {
        let mut rig = Rig::new();
        rig.tick(at(5.0));
        rig.tick(at(rig.range()));
        rig.tick(at(rig.range()));
        assert!(rig.attack.is_mid_swing());

        // Mid-swing: не уходим даже за порогом
        let far = rig.range() * 1.3;
        rig.tick(at(far));
        assert_eq!(rig.brain.state(), AdversaryState::BasicAttack);

        for _ in 0..20 {
            rig.tick(at(far));
        }
        assert_eq!(rig.brain.state(), AdversaryState::Chase);
    }

    #[test]
    fn test_lost_target_returns_to_idle() {
        let mut rig = Rig::new();
        rig.tick(at(5.0));
        assert_eq!(rig.brain.state(), AdversaryState::Chase);

        let lose = rig.brain.config.lose_distance;
        rig.tick(at(lose + 1.0));
        assert_eq!(rig.brain.state(), AdversaryState::Idle);
        assert!(!rig.brain.can_move());

        rig.tick(at(5.0));
        rig.tick(at(1.0));
        assert_eq!(rig.brain.state(), AdversaryState::BasicAttack);
        rig.tick(Perception::no_target());
        assert_eq!(rig.brain.state(), AdversaryState::Idle);
    }

    #[test]
    fn test_pattern_runs_then_returns_to_chase() {
        let mut rig = Rig::with_patterns(vec![PatternConfig::leap_slam()]);
        rig.tick(at(6.0));
        assert_eq!(rig.brain.state(), AdversaryState::Chase);

        let action = rig.tick(at(6.0));
        assert_eq!(action, Some(BrainAction::PatternStarted(0)));
        assert_eq!(rig.brain.state(), AdversaryState::Pattern);
        assert_eq!(rig.brain.current_pattern(), Some(0));
        assert!(!rig.brain.can_move());

        rig.tick(at(6.0));
        assert_eq!(rig.brain.state(), AdversaryState::Pattern);

        if let Some(pattern) = rig.patterns.get_mut(0) {
            pattern.advance(5.0);
        }
        rig.tick(at(6.0));
        assert_eq!(rig.brain.state(), AdversaryState::Chase);
        assert_eq!(rig.brain.current_pattern(), None);
        assert!(rig.brain.can_move());

        // Cooldown 10s: сразу не повторяется
        rig.tick(at(6.0));
        assert_eq!(rig.brain.state(), AdversaryState::Chase);
    }

    #[test]
    fn test_pattern_completion_in_range_goes_to_basic_attack() {
        let mut rig = Rig::with_patterns(vec![PatternConfig {
            name: "Close".to_string(),
            duration: 0.5,
            ..PatternConfig::default()
        }]);
        rig.tick(at(2.0));
        rig.tick(at(2.0));
        assert_eq!(rig.brain.state(), AdversaryState::Pattern);

        if let Some(pattern) = rig.patterns.get_mut(0) {
            pattern.advance(1.0);
        }
        rig.tick(at(2.0));
        assert_eq!(rig.brain.state(), AdversaryState::BasicAttack);
    }

    #[test]
    fn test_down_restarts_timer_instead_of_stacking() {
        let mut rig = Rig::new();
        rig.tick(at(5.0));

        assert!(rig.brain.enter_down(2.0, Some(&mut rig.patterns), Some(&mut rig.attack)));
        assert_eq!(rig.brain.state(), AdversaryState::Down);
        assert!(!rig.brain.can_move());

        for _ in 0..10 {
            rig.tick(at(5.0));
        }
        assert_eq!(rig.brain.state(), AdversaryState::Down);

        // Re-enter: таймер снова 2.0, не 2.0 + остаток
        rig.brain.enter_down(2.0, Some(&mut rig.patterns), Some(&mut rig.attack));
        for _ in 0..15 {
            rig.tick(at(5.0));
        }
        assert_eq!(rig.brain.state(), AdversaryState::Down);
        assert!(rig.brain.down_remaining() <= 2.0);

        for _ in 0..6 {
            rig.tick(at(5.0));
        }
        assert_eq!(rig.brain.state(), AdversaryState::Chase);
    }

    #[test]
    fn test_down_without_target_recovers_to_idle() {
        let mut rig = Rig::new();
        rig.brain.enter_down(0.2, None, None);
        for _ in 0..3 {
            rig.tick(Perception::no_target());
        }
        assert_eq!(rig.brain.state(), AdversaryState::Idle);
    }

    #[test]
    fn test_down_cancels_pattern_and_swing() {
        let mut rig = Rig::with_patterns(vec![PatternConfig::leap_slam()]);
        rig.tick(at(6.0));
        rig.tick(at(6.0));
        assert!(rig.patterns.is_running(0));

        rig.brain.enter_down(1.0, Some(&mut rig.patterns), Some(&mut rig.attack));
        assert!(!rig.patterns.is_running(0));
        assert!(!rig.attack.is_mid_swing());
        assert_eq!(rig.brain.current_pattern(), None);
    }

    #[test]
    fn test_death_from_any_state_is_final() {
        let mut rig = Rig::new();
        rig.tick(at(1.0));
        rig.tick(at(1.0));
        assert_eq!(rig.brain.state(), AdversaryState::BasicAttack);

        let mut dead = at(1.0);
        dead.alive = false;
        rig.tick(dead);
        assert_eq!(rig.brain.state(), AdversaryState::Dead);
        assert!(!rig.brain.can_move());

        assert!(!rig.brain.enter_down(2.0, None, None));
        rig.tick(at(1.0));
        assert_eq!(rig.brain.state(), AdversaryState::Dead);
    }

    #[test]
    fn test_missing_attack_capability_is_inert() {
        let mut brain = AdversaryBrain::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for now in 0..5 {
            let mut ctx = BrainContext {
                perception: at(1.0),
                patterns: None,
                attack: None,
                rng: &mut rng,
                now: now as f32,
                dt: DT,
            };
            assert_eq!(brain.update(&mut ctx), None);
        }
        assert_eq!(brain.state(), AdversaryState::BasicAttack);
    }

    #[test]
    fn test_phase_only_advances() {
        let mut brain = AdversaryBrain::default();
        assert_eq!(brain.phase(), 1);
        assert_eq!(brain.update_phase(0.6), None);
        assert_eq!(brain.update_phase(0.5), Some((1, 2)));
        assert_eq!(brain.update_phase(0.9), None);
        assert_eq!(brain.phase(), 2);
    }

    #[test]
    fn test_phase_thresholds_count_crossings() {
        let phases = PhaseThresholds(vec![0.7, 0.3]);
        assert_eq!(phases.phase_for(1.0), 1);
        assert_eq!(phases.phase_for(0.7), 2);
        assert_eq!(phases.phase_for(0.1), 3);
    }

    #[test]
    fn test_chase_intent_stops_at_stand_off() {
        let intent = chase_intent(Vec3::ZERO, Vec3::new(0.0, 3.0, 4.0), 1.5);
        assert!((intent - Vec2::new(0.0, 1.0)).length() < 1e-5);

        assert_eq!(chase_intent(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), 1.5), Vec2::ZERO);
    }
}
