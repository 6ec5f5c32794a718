//! Tests for patterns and the pattern scheduler.

#[cfg(test)]
mod tests {
    use super::super::pattern::{Pattern, PatternBook, PatternConfig, PatternCue, PatternStep};

    fn named(name: &str) -> PatternConfig {
        PatternConfig {
            name: name.to_string(),
            cooldown: 5.0,
            duration: 1.0,
            ..PatternConfig::default()
        }
    }

    #[test]
    fn test_selects_first_eligible_in_declaration_order() {
        let book = PatternBook::new([named("A"), named("B")]);
        assert_eq!(book.select_pattern(0.0, 3.0, 1), Some(0));
    }

    #[test]
    fn test_cooldown_gates_reuse() {
        let mut book = PatternBook::new([named("A"), named("B")]);
        assert!(book.execute(0, 0.0));
        if let Some(pattern) = book.get_mut(0) {
            pattern.advance(2.0);
        }
        assert!(!book.is_running(0));

        // A на cooldown → B
        assert_eq!(book.select_pattern(1.0, 3.0, 1), Some(1));
        // После cooldown снова A
        assert_eq!(book.select_pattern(5.0, 3.0, 1), Some(0));
    }

    #[test]
    fn test_distance_band_zero_disables_bound() {
        let near_only = PatternConfig {
            max_distance: 4.0,
            ..named("Near")
        };
        assert!(near_only.distance_in_band(0.0));
        assert!(near_only.distance_in_band(4.0));
        assert!(!near_only.distance_in_band(4.1));

        let far_only = PatternConfig {
            min_distance: 6.0,
            ..named("Far")
        };
        assert!(!far_only.distance_in_band(5.9));
        assert!(far_only.distance_in_band(100.0));

        let book = PatternBook::new([near_only, far_only]);
        assert_eq!(book.select_pattern(0.0, 2.0, 1), Some(0));
        assert_eq!(book.select_pattern(0.0, 8.0, 1), Some(1));
        assert_eq!(book.select_pattern(0.0, 5.0, 1), None);
    }

    #[test]
    fn test_phase_band_gates_selection() {
        let book = PatternBook::new([PatternConfig::shockwaves()]);
        assert_eq!(book.select_pattern(0.0, 3.0, 1), None);
        assert_eq!(book.select_pattern(0.0, 3.0, 2), Some(0));
    }

    #[test]
    fn test_execute_is_idempotent_while_running() {
        let mut pattern = Pattern::new(named("A"));
        assert!(pattern.execute(1.0));
        pattern.advance(0.5);

        assert!(!pattern.execute(3.0));
        assert_eq!(pattern.last_used(), Some(1.0));
        assert!(pattern.is_running());
    }

    #[test]
    fn test_timeline_fires_cues_in_order_then_completes() {
        let mut pattern = Pattern::new(PatternConfig {
            steps: vec![
                PatternStep::new(0.5, PatternCue::HitStart(10.0)),
                PatternStep::new(0.0, PatternCue::Action("Slam".to_string())),
                PatternStep::new(0.7, PatternCue::HitEnd),
            ],
            duration: 1.0,
            ..named("Slam")
        });
        pattern.execute(0.0);

        assert_eq!(pattern.advance(0.1), vec![PatternCue::Action("Slam".to_string())]);
        assert_eq!(pattern.advance(0.3), Vec::<PatternCue>::new());
        assert_eq!(
            pattern.advance(0.4),
            vec![PatternCue::HitStart(10.0), PatternCue::HitEnd]
        );
        assert!(pattern.is_running(), "duration 1.0 not reached yet");

        pattern.advance(0.3);
        assert!(!pattern.is_running());
        assert!(pattern.advance(1.0).is_empty());
    }

    #[test]
    fn test_stop_all_cancels_runs_and_keeps_cooldown() {
        let mut book = PatternBook::new([named("A")]);
        book.execute(0, 2.0);
        book.stop_all();
        assert!(!book.is_running(0));
        assert_eq!(book.select_pattern(3.0, 1.0, 1), None, "cooldown kept");
    }

    #[test]
    fn test_out_of_range_index_is_ignored() {
        let mut book = PatternBook::new([named("A")]);
        assert!(!book.execute(5, 0.0));
        assert!(!book.is_running(5));
        assert!(book.get(5).is_none());
    }

    #[test]
    fn test_total_duration_covers_last_step() {
        let config = PatternConfig {
            duration: 0.5,
            steps: vec![PatternStep::new(2.0, PatternCue::TelegraphHide)],
            ..named("Long")
        };
        assert_eq!(config.total_duration(), 2.0);
        assert!(PatternConfig::leap_slam().total_duration() >= 1.8);
    }
}
