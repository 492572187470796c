//! End-to-end pipeline tests over the public API.

use std::sync::Arc;

use accentor::analysis::classify::{PhonemeClassifier, SegmentFeatures};
use accentor::analysis::phonemize::ReferencePhonemizer;
use accentor::{AnalysisError, AnalysisRequest, Analyzer, QualityRating};
use accentor::LanguageRegistry;

fn sine(freq: f64, secs: f64, rate: u32) -> Vec<f32> {
    let count = (secs * rate as f64) as usize;
    (0..count)
        .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / rate as f64).sin() as f32 * 0.5)
        .collect()
}

fn request(text: &str) -> AnalysisRequest {
    AnalysisRequest {
        samples: sine(220.0, 1.5, 16_000),
        sample_rate: 16_000,
        reference_text: text.to_string(),
        language_code: "en".to_string(),
        fsi_level_hint: None,
        focus_phonemes: Vec::new(),
    }
}

/// Returns a fixed label sequence regardless of the audio, standing in for a
/// model that recognizes the utterance perfectly.
struct FixedClassifier {
    labels: Vec<String>,
}

impl PhonemeClassifier for FixedClassifier {
    fn classify(&self, _: &SegmentFeatures, _: &str) -> anyhow::Result<String> {
        anyhow::bail!("per-segment path unused")
    }

    fn classify_sequence(
        &self,
        _: &[SegmentFeatures],
        _: &str,
    ) -> anyhow::Result<Vec<String>> {
        Ok(self.labels.clone())
    }
}

fn reference_labels(text: &str) -> Vec<String> {
    let profile = LanguageRegistry::shared().get("en").unwrap();
    let (units, _) = ReferencePhonemizer::new().phonemize(text, profile);
    units.into_iter().map(|u| u.symbol).collect()
}

#[test]
fn perfect_match_scores_full_marks() {
    let text = "test word";
    let classifier = FixedClassifier {
        labels: reference_labels(text),
    };
    let analyzer = Analyzer::new().with_classifier(Arc::new(classifier));
    let report = analyzer.analyze(&request(text)).unwrap();

    assert!((report.overall_score - 1.0).abs() < 1e-6);
    assert_eq!(report.fsi_estimated_level.value(), 5.0);
    assert_eq!(report.quality_rating, QualityRating::Excellent);
    assert!(report.common_errors.is_empty());
    assert_eq!(report.words.len(), 2);
    assert!(report
        .words
        .iter()
        .all(|w| (w.accuracy_score - 1.0).abs() < 1e-6));
}

#[test]
fn missing_classifier_degrades_to_floor_scores() {
    let report = Analyzer::new().analyze(&request("test word")).unwrap();

    assert_eq!(report.overall_score, 0.0);
    assert_eq!(report.fsi_estimated_level.value(), 0.0);
    assert_eq!(report.quality_rating, QualityRating::VeryPoor);
    assert_eq!(report.words.len(), 2);
    // Degraded output is still a complete, well-formed report.
    assert!(!report.words[0].phonemes.is_empty());
    assert!(!report.common_errors.is_empty());
    assert_eq!(report.model_version, "1.0.0");
    assert!(report.audio_duration > 1.0);
}

#[test]
fn word_timings_partition_the_audio() {
    let report = Analyzer::new().analyze(&request("one two three")).unwrap();
    assert_eq!(report.words.len(), 3);
    assert_eq!(report.words[0].start_time, 0.0);
    for pair in report.words.windows(2) {
        assert!((pair[0].end_time - pair[1].start_time).abs() < 1e-9);
    }
    let last = report.words.last().unwrap();
    assert!((last.end_time - report.audio_duration).abs() < 1e-9);
}

#[test]
fn short_audio_is_rejected() {
    let mut req = request("hello");
    req.samples.truncate(800);
    let err = Analyzer::new().analyze(&req).unwrap_err();
    assert!(matches!(err, AnalysisError::AudioTooShort { .. }));
}

#[test]
fn empty_text_and_unknown_language_are_rejected() {
    let mut req = request("  ");
    assert_eq!(
        Analyzer::new().analyze(&req).unwrap_err(),
        AnalysisError::EmptyReferenceText
    );

    req.reference_text = "hola".to_string();
    req.language_code = "klingon".to_string();
    assert!(matches!(
        Analyzer::new().analyze(&req).unwrap_err(),
        AnalysisError::UnsupportedLanguage(_)
    ));
}

#[test]
fn level_hint_below_estimate_adds_no_suggestion() {
    let text = "test word";
    let mut req = request(text);
    req.fsi_level_hint = Some(4.5);
    let classifier = FixedClassifier {
        labels: reference_labels(text),
    };
    let report = Analyzer::new()
        .with_classifier(Arc::new(classifier))
        .analyze(&req)
        .unwrap();
    // Estimate is 5.0, so the target was met and no extra suggestion appears.
    assert!(!report
        .improvement_suggestions
        .iter()
        .any(|s| s.contains("below your target")));
}

#[test]
fn unmet_level_hint_is_called_out() {
    let mut req = request("test word");
    req.fsi_level_hint = Some(3.0);
    let report = Analyzer::new().analyze(&req).unwrap();
    assert!(report
        .improvement_suggestions
        .iter()
        .any(|s| s.contains("below your target")));
}

#[test]
fn focus_phoneme_misses_are_called_out() {
    let mut req = request("test word");
    req.focus_phonemes = vec!["t".to_string()];
    let report = Analyzer::new().analyze(&req).unwrap();
    assert!(report
        .improvement_suggestions
        .iter()
        .any(|s| s.contains("the t sound")));
}

#[test]
fn pool_runs_requests_off_thread() {
    let pool = accentor::analysis::AnalysisPool::new(2);
    let analyzer = Arc::new(Analyzer::new());
    let first = pool.submit(Arc::clone(&analyzer), request("test word"));
    let second = pool.submit(analyzer, request("another phrase"));
    let report = first.recv().unwrap().unwrap();
    assert_eq!(report.words.len(), 2);
    assert!(second.recv().unwrap().is_ok());
}

#[test]
fn report_round_trips_through_json() {
    let report = Analyzer::new().analyze(&request("hello world")).unwrap();
    let json = serde_json::to_string(&report).unwrap();
    let parsed: accentor::AnalysisReport = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.language_code, "en");
    assert_eq!(parsed.words.len(), report.words.len());
    assert!(json.contains("\"quality_rating\":\"very_poor\""));
}
