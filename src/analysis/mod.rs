//! Pronunciation analysis pipeline.
//!
//! The [`Analyzer`] drives the full pass over one utterance: validate the
//! request, extract audio features, phonemize the reference text, classify
//! the audio into actual phonetic units, align the two sequences, then score
//! words, utterance dimensions, proficiency, and feedback. Stages degrade
//! rather than fail wherever a documented fallback exists; the errors below
//! are reserved for requests the pipeline cannot meaningfully process.

pub mod align;
pub mod classify;
pub mod features;
pub mod feedback;
pub mod phonemize;
pub mod proficiency;
pub mod scores;
pub mod similarity;
pub mod words;
pub mod worker;

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::language::{LanguageProfile, LanguageRegistry};

use align::PhoneticAligner;
use classify::{AcousticPhonemeClassifier, PhonemeClassifier};
use features::FeatureExtractor;
use feedback::{analyze_register, Feedback, FeedbackBuilder};
use phonemize::{ReferencePhonemizer, Transliterator};
use proficiency::ProficiencyLevel;
use scores::{analyze_pauses, words_per_minute, PauseStats, ScoreEngine, ScoreVector};
use words::{WordContext, WordScorer};

pub use worker::AnalysisPool;

/// Reported in every response so stored results can be tied to the scoring
/// revision that produced them.
pub const MODEL_VERSION: &str = "1.0.0";

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Failures that abort an analysis request.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    UnsupportedLanguage(String),
    EmptyReferenceText,
    AudioTooShort { duration_ms: f64, minimum_ms: f64 },
    UnsupportedFormat(String),
    SequenceTooLong { length: usize, cap: usize },
    OutOfRange { field: &'static str, value: f32 },
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedLanguage(code) => {
                write!(f, "unsupported language code: {code}")
            }
            Self::EmptyReferenceText => write!(f, "reference text is empty"),
            Self::AudioTooShort {
                duration_ms,
                minimum_ms,
            } => write!(
                f,
                "audio too short: {duration_ms:.1} ms (minimum {minimum_ms:.1} ms)"
            ),
            Self::UnsupportedFormat(detail) => {
                write!(f, "unsupported audio format: {detail}")
            }
            Self::SequenceTooLong { length, cap } => {
                write!(f, "phonetic sequence of {length} units exceeds cap of {cap}")
            }
            Self::OutOfRange { field, value } => {
                write!(f, "{field} value {value} is outside its valid range")
            }
        }
    }
}

impl std::error::Error for AnalysisError {}

/// One phonetic unit flowing through the pipeline. Reference units carry the
/// criticality and focus tags; actual units carry the audio segment index
/// they were classified from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneticUnit {
    pub symbol: String,
    pub critical: bool,
    pub focus: bool,
    pub segment: Option<usize>,
}

impl PhoneticUnit {
    pub fn reference(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            critical: false,
            focus: false,
            segment: None,
        }
    }

    pub fn actual(symbol: impl Into<String>, segment: usize) -> Self {
        Self {
            symbol: symbol.into(),
            critical: false,
            focus: false,
            segment: Some(segment),
        }
    }
}

/// One step of the reference/actual alignment. A missing `actual` is a
/// deletion (the learner omitted the unit); a missing `reference` is an
/// insertion (the learner added one).
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentEntry {
    pub reference: Option<PhoneticUnit>,
    pub actual: Option<PhoneticUnit>,
    pub similarity: f32,
}

impl AlignmentEntry {
    pub fn matched(reference: PhoneticUnit, actual: PhoneticUnit, similarity: f32) -> Self {
        Self {
            reference: Some(reference),
            actual: Some(actual),
            similarity,
        }
    }

    pub fn insertion(actual: PhoneticUnit) -> Self {
        Self {
            reference: None,
            actual: Some(actual),
            similarity: 0.0,
        }
    }

    pub fn deletion(reference: PhoneticUnit) -> Self {
        Self {
            reference: Some(reference),
            actual: None,
            similarity: 0.0,
        }
    }

    pub fn is_insertion(&self) -> bool {
        self.reference.is_none()
    }

    pub fn is_deletion(&self) -> bool {
        self.actual.is_none()
    }
}

/// Scored comparison for one expected phoneme (or one extra sound).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhonemeResult {
    pub phoneme: String,
    pub expected: String,
    pub actual: String,
    pub accuracy_score: f32,
    pub feedback: String,
    pub is_critical: bool,
}

/// Scored result for one word of the reference text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordResult {
    pub word: String,
    pub start_time: f64,
    pub end_time: f64,
    pub accuracy_score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stress_pattern: Option<String>,
    pub phonemes: Vec<PhonemeResult>,
    pub suggestions: Vec<String>,
}

/// Coarse quality band derived from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityRating {
    Excellent,
    Good,
    Fair,
    Poor,
    VeryPoor,
}

impl QualityRating {
    pub fn from_score(overall: f32) -> Self {
        if overall >= 0.90 {
            Self::Excellent
        } else if overall >= 0.75 {
            Self::Good
        } else if overall >= 0.60 {
            Self::Fair
        } else if overall >= 0.40 {
            Self::Poor
        } else {
            Self::VeryPoor
        }
    }
}

/// One utterance to analyze: mono samples plus the text the speaker was
/// attempting and the language it is in.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub reference_text: String,
    pub language_code: String,
    /// Learner's target level; an estimate falling short of it earns an
    /// extra suggestion.
    pub fsi_level_hint: Option<f32>,
    /// Phonemes the learner is drilling; misses on these are called out.
    pub focus_phonemes: Vec<String>,
}

/// Complete analysis response for one utterance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub language_code: String,
    pub overall_score: f32,
    pub fluency_score: f32,
    pub rhythm_score: f32,
    pub intonation_score: f32,
    pub clarity_score: f32,
    pub quality_rating: QualityRating,
    pub fsi_estimated_level: ProficiencyLevel,
    pub words: Vec<WordResult>,
    pub common_errors: Vec<String>,
    pub strengths: Vec<String>,
    pub improvement_suggestions: Vec<String>,
    pub pauses: PauseStats,
    /// Pauses per minute of audio.
    pub pause_frequency: f32,
    pub average_pause_duration: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub words_per_minute: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cultural_appropriateness: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub register_appropriateness: Option<String>,
    pub audio_duration: f64,
    pub processing_time: f64,
    pub model_version: String,
}

/// The assembled pipeline. Construction is cheap; one instance can serve any
/// number of requests and is safe to share behind an `Arc`.
pub struct Analyzer {
    registry: &'static LanguageRegistry,
    extractor: FeatureExtractor,
    phonemizer: ReferencePhonemizer,
    classifier: AcousticPhonemeClassifier,
    aligner: PhoneticAligner,
    word_scorer: WordScorer,
    score_engine: ScoreEngine,
    feedback: FeedbackBuilder,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            registry: LanguageRegistry::shared(),
            extractor: FeatureExtractor::new(),
            phonemizer: ReferencePhonemizer::new(),
            classifier: AcousticPhonemeClassifier::new(),
            aligner: PhoneticAligner::new(),
            word_scorer: WordScorer::new(),
            score_engine: ScoreEngine::new(),
            feedback: FeedbackBuilder::new(),
        }
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transliterator(mut self, transliterator: Arc<dyn Transliterator>) -> Self {
        self.phonemizer = self.phonemizer.with_transliterator(transliterator);
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn PhonemeClassifier>) -> Self {
        self.classifier = self.classifier.with_capability(classifier);
        self
    }

    /// Bounds every pluggable capability call (transliterator, classifier).
    pub fn with_capability_timeout(mut self, timeout: Duration) -> Self {
        self.phonemizer = self.phonemizer.with_capability_timeout(timeout);
        self.classifier = self.classifier.with_capability_timeout(timeout);
        self
    }

    pub fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisReport> {
        let started = Instant::now();
        let profile = self.validate(request)?;
        let text = request.reference_text.trim();

        let bundle = self
            .extractor
            .extract(&request.samples, request.sample_rate)?;
        debug!(
            duration_secs = bundle.duration,
            frames = bundle.frame_count,
            "extracted audio features"
        );

        let (mut reference, quality) = self.phonemizer.phonemize(text, profile);
        tag_reference_units(&mut reference, profile, &request.focus_phonemes);
        let actual = self.classifier.classify(&bundle, profile.code);
        let alignment = self.aligner.align(&reference, &actual)?;

        let pauses = analyze_pauses(&bundle.energy, bundle.hop_secs);
        let word_results = self.word_scorer.score_words(
            text,
            &alignment,
            &WordContext {
                quality,
                audio_duration: bundle.duration,
                energy: &bundle.energy,
                hop_secs: bundle.hop_secs,
            },
        );
        let score_vector = self
            .score_engine
            .compute(&word_results, &bundle, profile, &pauses)?;
        let level = proficiency::estimate(score_vector.overall());

        let mut report_feedback = self.feedback.build(&word_results, &score_vector, &pauses);
        augment_focus_feedback(&mut report_feedback, &word_results, &request.focus_phonemes);
        augment_level_feedback(&mut report_feedback, level, request.fsi_level_hint);

        let (cultural_appropriateness, register_appropriateness) = analyze_register(text, profile);

        let report = assemble_report(
            profile,
            text,
            bundle.duration,
            score_vector,
            level,
            word_results,
            report_feedback,
            pauses,
            cultural_appropriateness,
            register_appropriateness,
            started.elapsed().as_secs_f64(),
        );
        info!(
            language = report.language_code.as_str(),
            overall = report.overall_score,
            level = report.fsi_estimated_level.value(),
            "analysis complete"
        );
        Ok(report)
    }

    fn validate(&self, request: &AnalysisRequest) -> Result<&'static LanguageProfile> {
        if request.reference_text.trim().is_empty() {
            return Err(AnalysisError::EmptyReferenceText);
        }
        self.registry
            .get(&request.language_code)
            .ok_or_else(|| AnalysisError::UnsupportedLanguage(request.language_code.clone()))
    }
}

/// Marks reference units as critical (vowels everywhere, everything in tonal
/// languages) and as focus targets from the request.
fn tag_reference_units(
    units: &mut [PhoneticUnit],
    profile: &LanguageProfile,
    focus_phonemes: &[String],
) {
    for unit in units {
        unit.critical = profile.is_tonal || similarity::is_vowel(&unit.symbol);
        unit.focus = focus_phonemes.iter().any(|f| f == &unit.symbol);
    }
}

/// Calls out misses on the learner's focus phonemes.
fn augment_focus_feedback(
    feedback: &mut Feedback,
    words: &[WordResult],
    focus_phonemes: &[String],
) {
    for focus in focus_phonemes {
        let missed = words
            .iter()
            .flat_map(|w| w.phonemes.iter())
            .any(|p| &p.phoneme == focus && p.accuracy_score < 0.6);
        if missed {
            feedback
                .suggestions
                .push(format!("Keep drilling the {focus} sound; it slipped here"));
        }
    }
}

fn augment_level_feedback(feedback: &mut Feedback, level: ProficiencyLevel, hint: Option<f32>) {
    if let Some(target) = hint {
        if level.value() < target {
            feedback.suggestions.push(format!(
                "This attempt scored at level {:.1}, below your target of {target:.1}; shorter phrases may help",
                level.value()
            ));
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn assemble_report(
    profile: &LanguageProfile,
    text: &str,
    audio_duration: f64,
    scores: ScoreVector,
    level: ProficiencyLevel,
    words: Vec<WordResult>,
    feedback: Feedback,
    pauses: PauseStats,
    cultural_appropriateness: Option<f32>,
    register_appropriateness: Option<String>,
    processing_time: f64,
) -> AnalysisReport {
    let pause_frequency = if audio_duration > 0.0 {
        (pauses.count as f64 * 60.0 / audio_duration) as f32
    } else {
        0.0
    };
    let average_pause_duration = if pauses.count > 0 {
        pauses.total_secs / pauses.count as f64
    } else {
        0.0
    };
    AnalysisReport {
        language_code: profile.code.to_string(),
        overall_score: scores.overall(),
        fluency_score: scores.fluency(),
        rhythm_score: scores.rhythm(),
        intonation_score: scores.intonation(),
        clarity_score: scores.clarity(),
        quality_rating: QualityRating::from_score(scores.overall()),
        fsi_estimated_level: level,
        words,
        common_errors: feedback.common_errors,
        strengths: feedback.strengths,
        improvement_suggestions: feedback.suggestions,
        pauses,
        pause_frequency,
        average_pause_duration,
        words_per_minute: words_per_minute(text, audio_duration),
        cultural_appropriateness,
        register_appropriateness,
        audio_duration,
        processing_time,
        model_version: MODEL_VERSION.to_string(),
    }
}
