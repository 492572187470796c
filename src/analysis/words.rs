//! Word-level scoring.
//!
//! Partitions the phoneme alignment back into word boundaries derived from
//! the reference text. Word timing divides the audio duration proportionally
//! across words in text order; that is an approximation, not forced
//! alignment. The per-word phoneme budget is an explicit, replaceable
//! heuristic proportional to character count.

use super::phonemize::PhonemizationQuality;
use super::{AlignmentEntry, PhonemeResult, WordResult};

/// Accuracy assigned to a word with no attributable phoneme entries. Neutral
/// rather than zero so segmentation error is not over-penalized.
const NEUTRAL_ACCURACY: f32 = 0.5;

/// Floor applied to matched-pair similarities under character-fallback
/// phonemization, widening tolerance for the degraded reference.
const DEGRADED_SIMILARITY_FLOOR: f32 = 0.3;

const LOW_WORD_ACCURACY: f32 = 0.6;

/// Inputs the scorer needs beyond the alignment itself.
pub struct WordContext<'a> {
    pub quality: PhonemizationQuality,
    pub audio_duration: f64,
    pub energy: &'a [f32],
    pub hop_secs: f64,
}

/// Produces per-word accuracy, suggestions, and timing estimates.
#[derive(Debug, Default)]
pub struct WordScorer {}

impl WordScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score_words(
        &self,
        reference_text: &str,
        alignment: &[AlignmentEntry],
        ctx: &WordContext<'_>,
    ) -> Vec<WordResult> {
        let words: Vec<&str> = reference_text.split_whitespace().collect();
        if words.is_empty() {
            return Vec::new();
        }
        let word_count = words.len();
        let mut results = Vec::with_capacity(word_count);
        let mut cursor = 0;

        for (index, word) in words.iter().enumerate() {
            let start_time = ctx.audio_duration * index as f64 / word_count as f64;
            let end_time = ctx.audio_duration * (index + 1) as f64 / word_count as f64;
            let budget = phoneme_budget(word);

            let mut phonemes = Vec::new();
            let mut attributed = Vec::new();
            let mut extra_sounds = 0;
            let mut consumed = 0;
            while consumed < budget && cursor < alignment.len() {
                let entry = &alignment[cursor];
                cursor += 1;
                if entry.is_insertion() {
                    // Insertions attach to the adjacent word for feedback but
                    // do not count toward its accuracy.
                    phonemes.push(insertion_result(entry));
                    extra_sounds += 1;
                } else {
                    attributed.push(attributed_similarity(entry, ctx.quality));
                    phonemes.push(phoneme_result(entry, ctx.quality));
                    consumed += 1;
                }
            }
            // Trailing insertions belong to the closest preceding word.
            while cursor < alignment.len() && alignment[cursor].is_insertion() {
                phonemes.push(insertion_result(&alignment[cursor]));
                extra_sounds += 1;
                cursor += 1;
            }

            let accuracy_score = if attributed.is_empty() {
                NEUTRAL_ACCURACY
            } else {
                attributed.iter().sum::<f32>() / attributed.len() as f32
            };
            let stress_pattern =
                stress_pattern(ctx.energy, ctx.hop_secs, start_time, end_time);
            let suggestions = word_suggestions(word, &phonemes, accuracy_score, extra_sounds);

            results.push(WordResult {
                word: (*word).to_string(),
                start_time,
                end_time,
                accuracy_score,
                stress_pattern,
                phonemes,
                suggestions,
            });
        }
        results
    }
}

/// Estimated phoneme count for a word: proportional to character count, at
/// least one. Preserved from the original heuristic; no accuracy guarantee.
pub fn phoneme_budget(word: &str) -> usize {
    (word.chars().count() / 2).max(1)
}

fn attributed_similarity(entry: &AlignmentEntry, quality: PhonemizationQuality) -> f32 {
    let matched = entry.reference.is_some() && entry.actual.is_some();
    if matched && quality == PhonemizationQuality::CharacterFallback {
        entry.similarity.max(DEGRADED_SIMILARITY_FLOOR)
    } else {
        entry.similarity
    }
}

fn phoneme_result(entry: &AlignmentEntry, quality: PhonemizationQuality) -> PhonemeResult {
    let reference = entry.reference.as_ref().expect("non-insertion entry");
    let actual = entry
        .actual
        .as_ref()
        .map(|unit| unit.symbol.clone())
        .unwrap_or_else(|| "?".to_string());
    let accuracy = attributed_similarity(entry, quality);
    PhonemeResult {
        phoneme: reference.symbol.clone(),
        expected: reference.symbol.clone(),
        actual,
        accuracy_score: accuracy,
        feedback: phoneme_feedback(&reference.symbol, accuracy),
        is_critical: reference.critical,
    }
}

fn insertion_result(entry: &AlignmentEntry) -> PhonemeResult {
    let actual = entry.actual.as_ref().expect("insertion entry");
    PhonemeResult {
        phoneme: actual.symbol.clone(),
        expected: String::new(),
        actual: actual.symbol.clone(),
        accuracy_score: 0.0,
        feedback: "Extra sound detected".to_string(),
        is_critical: false,
    }
}

fn phoneme_feedback(symbol: &str, accuracy: f32) -> String {
    if accuracy > 0.8 {
        "Excellent pronunciation".to_string()
    } else if accuracy > 0.6 {
        "Good, with minor adjustments needed".to_string()
    } else {
        format!("Practice the {symbol} sound more")
    }
}

/// Energy balance across the word's time slice, labelled as a coarse stress
/// position. None when the slice holds no energy frames.
fn stress_pattern(energy: &[f32], hop_secs: f64, start: f64, end: f64) -> Option<String> {
    if energy.is_empty() || hop_secs <= 0.0 || end <= start {
        return None;
    }
    let first = ((start / hop_secs) as usize).min(energy.len());
    let last = ((end / hop_secs).ceil() as usize).min(energy.len());
    let slice = &energy[first..last];
    if slice.len() < 2 {
        return None;
    }
    let mid = slice.len() / 2;
    let front = slice[..mid].iter().sum::<f32>() / mid as f32;
    let back = slice[mid..].iter().sum::<f32>() / (slice.len() - mid) as f32;
    if back <= f32::EPSILON && front <= f32::EPSILON {
        return Some("even".to_string());
    }
    let ratio = front / back.max(f32::EPSILON);
    let label = if ratio > 1.25 {
        "initial"
    } else if ratio < 0.8 {
        "final"
    } else {
        "even"
    };
    Some(label.to_string())
}

fn word_suggestions(
    word: &str,
    phonemes: &[PhonemeResult],
    accuracy: f32,
    extra_sounds: usize,
) -> Vec<String> {
    let mut suggestions = Vec::new();
    if accuracy < LOW_WORD_ACCURACY {
        suggestions.push(format!("Practice \"{word}\" slowly, one sound at a time"));
    }
    for phoneme in phonemes {
        if phoneme.is_critical && phoneme.accuracy_score < LOW_WORD_ACCURACY {
            suggestions.push(format!(
                "The {} sound distinguishes meaning here; listen and repeat it",
                phoneme.phoneme
            ));
            break;
        }
    }
    if extra_sounds > 0 {
        suggestions.push("Avoid inserting extra sounds between syllables".to_string());
    }
    suggestions
}
