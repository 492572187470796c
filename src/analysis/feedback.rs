//! Learner-facing feedback assembly.
//!
//! Turns word results, the utterance score vector, and pause statistics into
//! the three feedback lists of the report, plus the optional register and
//! cultural observations driven by per-language marker vocabularies.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::language::LanguageProfile;

use super::scores::{PauseStats, ScoreVector};
use super::WordResult;

const WEAK_PHONEME_ACCURACY: f32 = 0.6;
const STRONG_DIMENSION: f32 = 0.8;
const WEAK_DIMENSION: f32 = 0.6;
const MAX_COMMON_ERRORS: usize = 5;
const MAX_SUGGESTIONS: usize = 5;

/// Aggregated utterance-level feedback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Feedback {
    pub common_errors: Vec<String>,
    pub strengths: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Builds feedback lists from the scored analysis.
#[derive(Debug, Default)]
pub struct FeedbackBuilder {}

impl FeedbackBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(
        &self,
        words: &[WordResult],
        scores: &ScoreVector,
        pauses: &PauseStats,
    ) -> Feedback {
        if words.is_empty() {
            return Feedback::default();
        }
        Feedback {
            common_errors: common_errors(words),
            strengths: strengths(words, scores),
            suggestions: suggestions(words, scores, pauses),
        }
    }
}

/// Distinct weak phonemes across the utterance, capped and ordered by symbol
/// so repeated runs produce identical lists.
fn common_errors(words: &[WordResult]) -> Vec<String> {
    let weak: BTreeSet<&str> = words
        .iter()
        .flat_map(|word| word.phonemes.iter())
        .filter(|p| !p.expected.is_empty() && p.accuracy_score < WEAK_PHONEME_ACCURACY)
        .map(|p| p.phoneme.as_str())
        .collect();
    weak.into_iter()
        .take(MAX_COMMON_ERRORS)
        .map(|symbol| format!("Difficulty with the {symbol} sound"))
        .collect()
}

fn strengths(words: &[WordResult], scores: &ScoreVector) -> Vec<String> {
    let mut strengths = Vec::new();
    if scores.overall() > STRONG_DIMENSION {
        strengths.push("Strong overall pronunciation accuracy".to_string());
    }
    if scores.fluency() > STRONG_DIMENSION {
        strengths.push("Smooth, fluent delivery with few interruptions".to_string());
    }
    if scores.intonation() > STRONG_DIMENSION {
        strengths.push("Natural intonation for this language".to_string());
    }
    if scores.clarity() > STRONG_DIMENSION {
        strengths.push("Clear articulation throughout".to_string());
    }
    let accurate = words
        .iter()
        .filter(|w| w.accuracy_score > STRONG_DIMENSION)
        .count();
    if accurate * 2 > words.len() && scores.overall() <= STRONG_DIMENSION {
        strengths.push("Most words pronounced accurately".to_string());
    }
    strengths
}

fn suggestions(words: &[WordResult], scores: &ScoreVector, pauses: &PauseStats) -> Vec<String> {
    let mut suggestions = Vec::new();
    if pauses.longest_secs > 1.0 || pauses.count > 3 {
        suggestions.push(
            "Work on reducing long pauses; try reading the phrase in one breath".to_string(),
        );
    }
    if scores.rhythm() < WEAK_DIMENSION {
        suggestions.push("Practice the rhythm by clapping along with each syllable".to_string());
    }
    if scores.intonation() < WEAK_DIMENSION {
        suggestions
            .push("Listen to native speakers and mimic their pitch movement".to_string());
    }
    if scores.clarity() < WEAK_DIMENSION {
        suggestions.push("Slow down and exaggerate each consonant for clarity".to_string());
    }
    let mut weakest: Vec<&WordResult> = words
        .iter()
        .filter(|w| w.accuracy_score < WEAK_PHONEME_ACCURACY)
        .collect();
    weakest.sort_by(|a, b| {
        a.accuracy_score
            .partial_cmp(&b.accuracy_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for word in weakest.iter().take(2) {
        suggestions.push(format!("Give extra practice to \"{}\"", word.word));
    }
    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}

/// Register analysis from the language profile's marker vocabularies: the
/// share of formal markers among all markers found in the reference text,
/// plus a cultural note when the balance is informative. Languages without
/// marker data yield `(None, None)`.
pub fn analyze_register(
    reference_text: &str,
    profile: &LanguageProfile,
) -> (Option<f32>, Option<String>) {
    if profile.formal_markers.is_empty() && profile.informal_markers.is_empty() {
        return (None, None);
    }
    let text = reference_text.to_lowercase();
    let formal = count_markers(&text, profile.formal_markers);
    let informal = count_markers(&text, profile.informal_markers);
    let total = formal + informal;
    if total == 0 {
        return (None, None);
    }
    let formality = formal as f32 / total as f32;
    let note = if formality >= 0.5 {
        format!(
            "This phrase uses formal register; appropriate for polite or unfamiliar company in {}",
            profile.name
        )
    } else {
        format!(
            "This phrase uses informal register; best kept for friends and family in {}",
            profile.name
        )
    };
    (Some(formality), Some(note))
}

fn count_markers(text: &str, markers: &[&str]) -> usize {
    markers.iter().filter(|marker| text.contains(*marker)).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::PhonemeResult;
    use crate::language::LanguageRegistry;

    fn word(name: &str, accuracy: f32, phonemes: Vec<PhonemeResult>) -> WordResult {
        WordResult {
            word: name.to_string(),
            start_time: 0.0,
            end_time: 1.0,
            accuracy_score: accuracy,
            stress_pattern: None,
            phonemes,
            suggestions: Vec::new(),
        }
    }

    fn phoneme(symbol: &str, accuracy: f32) -> PhonemeResult {
        PhonemeResult {
            phoneme: symbol.to_string(),
            expected: symbol.to_string(),
            actual: symbol.to_string(),
            accuracy_score: accuracy,
            feedback: String::new(),
            is_critical: false,
        }
    }

    fn scores(overall: f32) -> ScoreVector {
        ScoreVector::new(overall, overall, overall, overall, overall).unwrap()
    }

    #[test]
    fn empty_input_yields_empty_feedback() {
        let feedback = FeedbackBuilder::new().build(&[], &scores(0.9), &PauseStats::default());
        assert!(feedback.common_errors.is_empty());
        assert!(feedback.strengths.is_empty());
        assert!(feedback.suggestions.is_empty());
    }

    #[test]
    fn weak_phonemes_become_common_errors() {
        let words = vec![word(
            "ship",
            0.4,
            vec![phoneme("ʃ", 0.3), phoneme("ɪ", 0.9)],
        )];
        let feedback =
            FeedbackBuilder::new().build(&words, &scores(0.4), &PauseStats::default());
        assert_eq!(
            feedback.common_errors,
            vec!["Difficulty with the ʃ sound".to_string()]
        );
        assert!(feedback
            .suggestions
            .iter()
            .any(|s| s.contains("\"ship\"")));
    }

    #[test]
    fn strong_scores_become_strengths() {
        let words = vec![word("good", 0.95, vec![phoneme("g", 0.95)])];
        let feedback =
            FeedbackBuilder::new().build(&words, &scores(0.95), &PauseStats::default());
        assert!(!feedback.strengths.is_empty());
        assert!(feedback.common_errors.is_empty());
    }

    #[test]
    fn register_analysis_needs_marker_vocabulary() {
        let registry = LanguageRegistry::shared();
        let english = registry.get("en").unwrap();
        assert_eq!(analyze_register("hello there", english), (None, None));

        let japanese = registry.get("ja").unwrap();
        let (formality, note) = analyze_register("ありがとうございます", japanese);
        assert!(formality.is_some());
        assert!(formality.unwrap() >= 0.5);
        assert!(note.unwrap().contains("formal"));
    }
}
