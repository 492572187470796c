//! Phoneme similarity based on articulatory feature vectors.
//!
//! Each known IPA unit maps to a compact numeric encoding of its articulatory
//! features; similarity between two units is the cosine of their encodings,
//! clamped to [0, 1]. Units without an encoding fall back to exact-match /
//! fixed-penalty comparison so unseen inventories still score deterministically.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::Result;

/// Similarity assigned when neither unit has a feature encoding and the
/// symbols differ.
const UNENCODED_MISMATCH: f32 = 0.3;

/// Placeholder emitted by classification for windows it could not label.
/// Carries no articulatory information, so it scores zero against everything.
pub const UNKNOWN_UNIT: &str = "?";

/// Encoding dimensions: [consonantal, voiced, manner/height, place/backness,
/// rounded, nasal].
type FeatureVector = [f32; 6];

static FEATURE_TABLE: Lazy<HashMap<&'static str, FeatureVector>> = Lazy::new(|| {
    let mut table = HashMap::new();
    // Vowels: consonantal=0, voiced=1, height (open 0.0 .. close 1.0),
    // backness (front 0.0 .. back 1.0), roundedness, nasal=0.
    for (symbol, height, backness, rounded) in [
        ("i", 1.0, 0.0, 0.0),
        ("ɪ", 0.85, 0.1, 0.0),
        ("e", 0.7, 0.0, 0.0),
        ("ɛ", 0.5, 0.1, 0.0),
        ("æ", 0.25, 0.2, 0.0),
        ("a", 0.0, 0.3, 0.0),
        ("ɑ", 0.0, 0.9, 0.0),
        ("ɒ", 0.05, 0.95, 1.0),
        ("ʌ", 0.4, 0.7, 0.0),
        ("ə", 0.5, 0.5, 0.0),
        ("ɜ", 0.45, 0.5, 0.0),
        ("ɨ", 1.0, 0.5, 0.0),
        ("o", 0.7, 1.0, 1.0),
        ("ɔ", 0.5, 0.9, 1.0),
        ("u", 1.0, 1.0, 1.0),
        ("ʊ", 0.85, 0.9, 1.0),
        ("y", 1.0, 0.0, 1.0),
        ("ø", 0.7, 0.1, 1.0),
    ] {
        table.insert(symbol, [0.0, 1.0, height, backness, rounded, 0.0]);
    }
    // Consonants: manner (stop 0.0, affricate 0.2, fricative 0.4, nasal 0.6,
    // liquid 0.8, glide 1.0), place (bilabial 0.0 .. glottal 1.0).
    for (symbol, voiced, manner, place, nasal) in [
        ("p", 0.0, 0.0, 0.0, 0.0),
        ("b", 1.0, 0.0, 0.0, 0.0),
        ("t", 0.0, 0.0, 0.3, 0.0),
        ("d", 1.0, 0.0, 0.3, 0.0),
        ("k", 0.0, 0.0, 0.7, 0.0),
        ("g", 1.0, 0.0, 0.7, 0.0),
        ("q", 0.0, 0.0, 0.85, 0.0),
        ("ʔ", 0.0, 0.0, 1.0, 0.0),
        ("ts", 0.0, 0.2, 0.3, 0.0),
        ("tʃ", 0.0, 0.2, 0.45, 0.0),
        ("dʒ", 1.0, 0.2, 0.45, 0.0),
        ("f", 0.0, 0.4, 0.1, 0.0),
        ("v", 1.0, 0.4, 0.1, 0.0),
        ("θ", 0.0, 0.4, 0.25, 0.0),
        ("ð", 1.0, 0.4, 0.25, 0.0),
        ("s", 0.0, 0.4, 0.3, 0.0),
        ("z", 1.0, 0.4, 0.3, 0.0),
        ("ʃ", 0.0, 0.4, 0.45, 0.0),
        ("ʒ", 1.0, 0.4, 0.45, 0.0),
        ("ç", 0.0, 0.4, 0.6, 0.0),
        ("x", 0.0, 0.4, 0.7, 0.0),
        ("ɣ", 1.0, 0.4, 0.7, 0.0),
        ("h", 0.0, 0.4, 1.0, 0.0),
        ("m", 1.0, 0.6, 0.0, 1.0),
        ("n", 1.0, 0.6, 0.3, 1.0),
        ("ɲ", 1.0, 0.6, 0.6, 1.0),
        ("ŋ", 1.0, 0.6, 0.7, 1.0),
        ("l", 1.0, 0.8, 0.3, 0.0),
        ("ʎ", 1.0, 0.8, 0.6, 0.0),
        ("r", 1.0, 0.8, 0.3, 0.0),
        ("ɾ", 1.0, 0.8, 0.3, 0.0),
        ("ɹ", 1.0, 0.8, 0.45, 0.0),
        ("ʁ", 1.0, 0.8, 0.85, 0.0),
        ("j", 1.0, 1.0, 0.6, 0.0),
        ("w", 1.0, 1.0, 0.0, 0.0),
    ] {
        table.insert(symbol, [1.0, voiced, manner, place, 0.0, nasal]);
    }
    table
});

/// Looks up the articulatory encoding for a phonetic unit.
pub fn feature_vector(symbol: &str) -> Option<&'static FeatureVector> {
    FEATURE_TABLE.get(symbol)
}

/// Whether a unit is a vowel in the feature table (used for criticality rules).
pub fn is_vowel(symbol: &str) -> bool {
    feature_vector(symbol).is_some_and(|v| v[0] == 0.0)
}

/// Similarity between two phonetic units in [0, 1].
///
/// Identical units score 1.0; an empty side or the unknown placeholder scores
/// 0.0 against anything. When both units carry a feature encoding, the score
/// is the clamped cosine of the two vectors; otherwise case-insensitive
/// equality scores 1.0 and any other pair scores a fixed fallback.
pub fn similarity(reference: &str, actual: &str) -> Result<f32> {
    if reference == UNKNOWN_UNIT || actual == UNKNOWN_UNIT {
        return Ok(0.0);
    }
    if reference == actual {
        return Ok(if reference.is_empty() { 0.0 } else { 1.0 });
    }
    if reference.is_empty() || actual.is_empty() {
        return Ok(0.0);
    }
    if let (Some(lhs), Some(rhs)) = (feature_vector(reference), feature_vector(actual)) {
        if let Some(value) = cosine(lhs, rhs) {
            return Ok(value.clamp(0.0, 1.0));
        }
    }
    if reference.to_lowercase() == actual.to_lowercase() {
        Ok(1.0)
    } else {
        Ok(UNENCODED_MISMATCH)
    }
}

fn cosine(lhs: &FeatureVector, rhs: &FeatureVector) -> Option<f32> {
    let mut dot = 0.0;
    let mut lhs_norm = 0.0;
    let mut rhs_norm = 0.0;
    for (a, b) in lhs.iter().zip(rhs.iter()) {
        dot += a * b;
        lhs_norm += a * a;
        rhs_norm += b * b;
    }
    if lhs_norm <= f32::EPSILON || rhs_norm <= f32::EPSILON {
        return None;
    }
    Some(dot / (lhs_norm.sqrt() * rhs_norm.sqrt()))
}
