//! Scoring and proficiency behavior over the public module API.

use accentor::analysis::proficiency::{estimate, ProficiencyLevel};
use accentor::analysis::scores::{analyze_pauses, words_per_minute, ScoreVector};

#[test]
fn proficiency_never_decreases_with_score() {
    let mut previous = estimate(0.0).value();
    for step in 0..=200 {
        let level = estimate(step as f32 / 200.0).value();
        assert!(level >= previous, "regression at score {}", step as f32 / 200.0);
        previous = level;
    }
    assert_eq!(estimate(0.0).value(), 0.0);
    assert_eq!(estimate(0.98).value(), 5.0);
}

#[test]
fn proficiency_levels_are_half_steps() {
    for step in 0..=100 {
        let level = estimate(step as f32 / 100.0).value();
        assert_eq!((level * 2.0).fract(), 0.0);
        assert!((0.0..=5.0).contains(&level));
    }
    assert!(ProficiencyLevel::new(2.5).is_ok());
    assert!(ProficiencyLevel::new(2.3).is_err());
}

#[test]
fn score_vector_enforces_unit_range() {
    assert!(ScoreVector::new(0.9, 0.8, 0.7, 0.6, 0.5).is_ok());
    assert!(ScoreVector::new(-0.1, 0.5, 0.5, 0.5, 0.5).is_err());
    assert!(ScoreVector::new(0.5, 0.5, 1.1, 0.5, 0.5).is_err());
}

#[test]
fn words_per_minute_needs_positive_duration() {
    assert_eq!(words_per_minute("hello world", 1.0), Some(120.0));
    assert_eq!(words_per_minute("one two three four", 2.0), Some(120.0));
    assert_eq!(words_per_minute("hello", 0.0), None);
    assert_eq!(words_per_minute("", 1.0), Some(0.0));
}

#[test]
fn pause_analysis_measures_silence_runs() {
    let hop = 0.01;
    let mut energy = vec![1.0_f32; 100];
    energy.extend(std::iter::repeat(0.0).take(50));
    energy.extend(std::iter::repeat(1.0).take(100));
    energy.extend(std::iter::repeat(0.0).take(40));
    energy.extend(std::iter::repeat(1.0).take(10));
    let stats = analyze_pauses(&energy, hop);
    assert_eq!(stats.count, 2);
    assert!((stats.total_secs - 0.9).abs() < 1e-9);
    assert!((stats.longest_secs - 0.5).abs() < 1e-9);
    assert_eq!(stats.positions.len(), 2);
}
