//! Reference text phonemization.
//!
//! Produces the ordered phonetic unit sequence for a reference text through a
//! deterministic fallback chain: pluggable transliterator, built-in
//! transliteration table, script-family rules, then one unit per character.
//! The chain is designed behavior, not an error path; the quality tag on the
//! result tells downstream scoring which rung produced it.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::language::{transliteration_table, LanguageProfile, ScriptType};

use super::worker::call_with_timeout;
use super::PhoneticUnit;

/// Provenance of a phonemization result. Downstream scoring widens its error
/// tolerance for character-level fallback output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhonemizationQuality {
    Transliterated,
    RuleBased,
    CharacterFallback,
}

/// Pluggable per-language transliteration capability.
pub trait Transliterator: Send + Sync {
    fn transliterate(&self, text: &str, language_code: &str) -> anyhow::Result<Vec<String>>;
}

/// Turns reference text plus language metadata into phonetic units.
pub struct ReferencePhonemizer {
    custom: Option<Arc<dyn Transliterator>>,
    capability_timeout: Duration,
}

impl Default for ReferencePhonemizer {
    fn default() -> Self {
        Self {
            custom: None,
            capability_timeout: Duration::from_secs(2),
        }
    }
}

impl ReferencePhonemizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transliterator(mut self, transliterator: Arc<dyn Transliterator>) -> Self {
        self.custom = Some(transliterator);
        self
    }

    pub fn with_capability_timeout(mut self, timeout: Duration) -> Self {
        self.capability_timeout = timeout;
        self
    }

    pub fn phonemize(
        &self,
        text: &str,
        profile: &LanguageProfile,
    ) -> (Vec<PhoneticUnit>, PhonemizationQuality) {
        if let Some(units) = self.try_custom(text, profile.code) {
            return (units, PhonemizationQuality::Transliterated);
        }
        if let Some(table) = transliteration_table(profile.code) {
            let units = apply_table(text, table);
            if !units.is_empty() {
                return (units, PhonemizationQuality::Transliterated);
            }
        }
        if let Some(table) = script_rules(profile.script) {
            let units = apply_table(text, table);
            if !units.is_empty() {
                debug!(language = profile.code, "phonemized via script-family rules");
                return (units, PhonemizationQuality::RuleBased);
            }
        }
        debug!(
            language = profile.code,
            "phonemization degraded to character fallback"
        );
        (character_fallback(text), PhonemizationQuality::CharacterFallback)
    }

    fn try_custom(&self, text: &str, code: &str) -> Option<Vec<PhoneticUnit>> {
        let transliterator = self.custom.clone()?;
        let owned_text = text.to_string();
        let owned_code = code.to_string();
        let outcome = call_with_timeout("transliterate", self.capability_timeout, move || {
            transliterator.transliterate(&owned_text, &owned_code)
        })?;
        match outcome {
            Ok(symbols) if !symbols.is_empty() => Some(
                symbols
                    .into_iter()
                    .map(PhoneticUnit::reference)
                    .collect(),
            ),
            Ok(_) => None,
            Err(err) => {
                warn!(language = code, error = %err, "transliterator capability failed");
                None
            }
        }
    }
}

/// Longest-match grapheme walk over a transliteration table.
fn apply_table(text: &str, table: &[(&str, &str)]) -> Vec<PhoneticUnit> {
    let normalized = text.to_lowercase();
    let mut units = Vec::new();
    let mut rest = normalized.as_str();
    'outer: while !rest.is_empty() {
        let ch = rest.chars().next().expect("non-empty remainder");
        if ch.is_whitespace() || ch.is_ascii_punctuation() {
            rest = &rest[ch.len_utf8()..];
            continue;
        }
        for (grapheme, ipa) in table {
            if let Some(after) = rest.strip_prefix(grapheme) {
                if !ipa.is_empty() {
                    units.push(PhoneticUnit::reference(*ipa));
                }
                rest = after;
                continue 'outer;
            }
        }
        // No rule for this character; carry it through as its own unit.
        units.push(PhoneticUnit::reference(ch.to_string()));
        rest = &rest[ch.len_utf8()..];
    }
    units
}

/// Last-resort degraded mode: one unit per non-whitespace character.
fn character_fallback(text: &str) -> Vec<PhoneticUnit> {
    text.chars()
        .filter(|ch| !ch.is_whitespace())
        .map(|ch| PhoneticUnit::reference(ch.to_string()))
        .collect()
}

/// Generic grapheme-to-phoneme defaults per script family.
fn script_rules(script: ScriptType) -> Option<&'static [(&'static str, &'static str)]> {
    match script {
        ScriptType::Latin => Some(LATIN_RULES),
        _ => None,
    }
}

const LATIN_RULES: &[(&str, &str)] = &[
    ("sh", "ʃ"),
    ("ch", "tʃ"),
    ("th", "θ"),
    ("ph", "f"),
    ("ng", "ŋ"),
    ("qu", "kw"),
    ("ck", "k"),
    ("a", "æ"),
    ("b", "b"),
    ("c", "k"),
    ("d", "d"),
    ("e", "ɛ"),
    ("f", "f"),
    ("g", "g"),
    ("h", "h"),
    ("i", "ɪ"),
    ("j", "dʒ"),
    ("k", "k"),
    ("l", "l"),
    ("m", "m"),
    ("n", "n"),
    ("o", "ɒ"),
    ("p", "p"),
    ("q", "k"),
    ("r", "ɹ"),
    ("s", "s"),
    ("t", "t"),
    ("u", "ʌ"),
    ("v", "v"),
    ("w", "w"),
    ("x", "ks"),
    ("y", "j"),
    ("z", "z"),
];
