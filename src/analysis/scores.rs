//! Utterance-level scoring.
//!
//! Derives the five-dimension score vector (overall, fluency, rhythm,
//! intonation, clarity) from word results and the audio feature bundle, plus
//! the pause statistics and speaking-rate figures surfaced alongside it.
//! Every dimension lands in [0, 1]; non-finite intermediate values resolve to
//! the neutral midpoint instead of propagating.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::language::LanguageProfile;

use super::features::AudioFeatureBundle;
use super::{AnalysisError, Result, WordResult};

/// Fraction of peak frame energy below which a frame counts as silent.
const SILENCE_RATIO: f32 = 0.15;

/// Minimum silent stretch that counts as a pause, in seconds.
const MIN_PAUSE_SECS: f64 = 0.25;

/// Score assigned when a dimension has too little signal to measure.
const NEUTRAL_SCORE: f32 = 0.5;

/// Semitone spread a tonal language is expected to exercise.
const TONAL_SPREAD_SEMITONES: f32 = 4.0;

/// Per-frame semitone movement treated as maximally unstable for non-tonal
/// languages.
const MONOTONE_DELTA_SEMITONES: f32 = 2.0;

/// Validated utterance-level scores, each in [0, 1]. Fields stay private so
/// every value, including deserialized ones, passes through [`ScoreVector::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawScoreVector")]
pub struct ScoreVector {
    overall: f32,
    fluency: f32,
    rhythm: f32,
    intonation: f32,
    clarity: f32,
}

impl ScoreVector {
    pub fn new(
        overall: f32,
        fluency: f32,
        rhythm: f32,
        intonation: f32,
        clarity: f32,
    ) -> Result<Self> {
        for (field, value) in [
            ("overall", overall),
            ("fluency", fluency),
            ("rhythm", rhythm),
            ("intonation", intonation),
            ("clarity", clarity),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(AnalysisError::OutOfRange { field, value });
            }
        }
        Ok(Self {
            overall,
            fluency,
            rhythm,
            intonation,
            clarity,
        })
    }

    pub fn overall(&self) -> f32 {
        self.overall
    }

    pub fn fluency(&self) -> f32 {
        self.fluency
    }

    pub fn rhythm(&self) -> f32 {
        self.rhythm
    }

    pub fn intonation(&self) -> f32 {
        self.intonation
    }

    pub fn clarity(&self) -> f32 {
        self.clarity
    }
}

/// Unvalidated wire shape; conversion into [`ScoreVector`] runs the range
/// checks, so JSON input cannot bypass them.
#[derive(Debug, Deserialize)]
struct RawScoreVector {
    overall: f32,
    fluency: f32,
    rhythm: f32,
    intonation: f32,
    clarity: f32,
}

impl TryFrom<RawScoreVector> for ScoreVector {
    type Error = AnalysisError;

    fn try_from(raw: RawScoreVector) -> Result<Self> {
        Self::new(raw.overall, raw.fluency, raw.rhythm, raw.intonation, raw.clarity)
    }
}

/// Silence-gap statistics over the frame energy contour.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PauseStats {
    pub count: usize,
    pub total_secs: f64,
    pub longest_secs: f64,
    /// Start time of each pause, in seconds from utterance start.
    pub positions: Vec<f64>,
}

/// Computes the utterance score vector from word results and audio features.
#[derive(Debug, Default)]
pub struct ScoreEngine {}

impl ScoreEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compute(
        &self,
        words: &[WordResult],
        bundle: &AudioFeatureBundle,
        profile: &LanguageProfile,
        pauses: &PauseStats,
    ) -> Result<ScoreVector> {
        let overall = overall_accuracy(words);
        let fluency = fluency_score(pauses, bundle.duration);
        let rhythm = rhythm_score(&bundle.onsets);
        let intonation = intonation_score(bundle, profile.is_tonal);
        let clarity = clarity_score(bundle);
        debug!(
            overall,
            fluency, rhythm, intonation, clarity, "computed utterance scores"
        );
        ScoreVector::new(overall, fluency, rhythm, intonation, clarity)
    }
}

/// Mean word accuracy; zero when nothing aligned at all.
fn overall_accuracy(words: &[WordResult]) -> f32 {
    if words.is_empty() {
        return 0.0;
    }
    let sum: f32 = words.iter().map(|w| w.accuracy_score).sum();
    clamp_unit(sum / words.len() as f32)
}

/// Finds silent stretches in the frame energy contour. A stretch counts as a
/// pause once it spans at least `MIN_PAUSE_SECS` of frames below the relative
/// silence threshold.
pub fn analyze_pauses(energy: &[f32], hop_secs: f64) -> PauseStats {
    let peak = energy.iter().copied().fold(0.0_f32, f32::max);
    if energy.is_empty() || peak <= 0.0 || hop_secs <= 0.0 {
        return PauseStats::default();
    }
    let threshold = peak * SILENCE_RATIO;
    let min_frames = (MIN_PAUSE_SECS / hop_secs).ceil() as usize;

    let mut stats = PauseStats::default();
    let mut run_start: Option<usize> = None;
    for (index, &value) in energy.iter().enumerate() {
        if value < threshold {
            run_start.get_or_insert(index);
        } else if let Some(start) = run_start.take() {
            record_pause(&mut stats, start, index, min_frames, hop_secs);
        }
    }
    if let Some(start) = run_start {
        record_pause(&mut stats, start, energy.len(), min_frames, hop_secs);
    }
    stats
}

fn record_pause(
    stats: &mut PauseStats,
    start: usize,
    end: usize,
    min_frames: usize,
    hop_secs: f64,
) {
    let frames = end - start;
    if frames < min_frames {
        return;
    }
    let duration = frames as f64 * hop_secs;
    stats.count += 1;
    stats.total_secs += duration;
    stats.longest_secs = stats.longest_secs.max(duration);
    stats.positions.push(start as f64 * hop_secs);
}

/// Fluency penalizes both time spent pausing and an elevated pause rate.
fn fluency_score(pauses: &PauseStats, duration: f64) -> f32 {
    if duration <= 0.0 {
        return NEUTRAL_SCORE;
    }
    let pause_ratio = (pauses.total_secs / duration) as f32;
    let pause_rate = pauses.count as f32 / duration as f32;
    let excess_rate = (pause_rate - 0.5).max(0.0);
    clamp_unit(1.0 - 1.5 * pause_ratio - 0.5 * excess_rate)
}

/// Rhythm from inter-onset regularity: the coefficient of variation of
/// inter-onset intervals, inverted. Too few onsets reads as neutral.
fn rhythm_score(onsets: &[f64]) -> f32 {
    if onsets.len() < 3 {
        return NEUTRAL_SCORE;
    }
    let intervals: Vec<f64> = onsets.windows(2).map(|pair| pair[1] - pair[0]).collect();
    let mean = intervals.iter().sum::<f64>() / intervals.len() as f64;
    if mean <= 0.0 {
        return NEUTRAL_SCORE;
    }
    let variance = intervals
        .iter()
        .map(|&interval| (interval - mean).powi(2))
        .sum::<f64>()
        / intervals.len() as f64;
    let cv = (variance.sqrt() / mean) as f32;
    clamp_unit(1.0 - cv.min(1.0))
}

/// Intonation from the voiced pitch contour, in semitones relative to the
/// contour's own mean. Tonal languages reward pitch movement; non-tonal
/// languages reward a stable, smoothly varying contour.
fn intonation_score(bundle: &AudioFeatureBundle, is_tonal: bool) -> f32 {
    let voiced: Vec<f32> = bundle.pitch.voiced().collect();
    if voiced.len() < 2 {
        return NEUTRAL_SCORE;
    }
    let reference = voiced.iter().sum::<f32>() / voiced.len() as f32;
    if reference <= 0.0 {
        return NEUTRAL_SCORE;
    }
    let semitones: Vec<f32> = voiced
        .iter()
        .map(|&hz| 12.0 * (hz / reference).log2())
        .collect();
    if is_tonal {
        let mean = semitones.iter().sum::<f32>() / semitones.len() as f32;
        let variance = semitones
            .iter()
            .map(|&st| (st - mean).powi(2))
            .sum::<f32>()
            / semitones.len() as f32;
        clamp_unit((variance.sqrt() / TONAL_SPREAD_SEMITONES).min(1.0))
    } else {
        let mean_delta = semitones
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).abs())
            .sum::<f32>()
            / (semitones.len() - 1) as f32;
        clamp_unit(1.0 - (mean_delta / MONOTONE_DELTA_SEMITONES).min(1.0))
    }
}

/// Clarity blends low zero-crossing noise with formant presence.
fn clarity_score(bundle: &AudioFeatureBundle) -> f32 {
    if bundle.zero_crossing_rate.is_empty() {
        return NEUTRAL_SCORE;
    }
    let mean_zcr = bundle.zero_crossing_rate.iter().sum::<f32>()
        / bundle.zero_crossing_rate.len() as f32;
    let noise = (mean_zcr * 2.0).min(1.0);
    let formant_presence = bundle.formants.iter().filter(|&&f| f > 0.0).count() as f32 / 4.0;
    clamp_unit(0.5 * (1.0 - noise) + 0.5 * formant_presence)
}

/// Speaking rate over the reference text. `None` when the audio has no
/// measurable duration.
pub fn words_per_minute(reference_text: &str, duration_secs: f64) -> Option<f32> {
    if duration_secs <= 0.0 {
        return None;
    }
    let word_count = reference_text.split_whitespace().count();
    Some((word_count as f64 * 60.0 / duration_secs) as f32)
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        NEUTRAL_SCORE
    } else {
        value.clamp(0.0, 1.0)
    }
}
