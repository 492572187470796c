//! Audio feature extraction.
//!
//! Turns a raw mono signal into the descriptor bundle the rest of the
//! pipeline consumes: pitch contour, spectral envelope, formants, rhythm
//! markers, and energy. Pure function of its input; the bundle is created
//! fresh per request and never mutated afterwards.

mod pitch;
mod spectral;

use ndarray::Array2;
use tracing::debug;

use super::{AnalysisError, Result};

pub(crate) const TARGET_SAMPLE_RATE: u32 = 16_000;
pub(crate) const WINDOW_MS: usize = 25;
pub(crate) const HOP_MS: usize = 10;

/// Minimum signal length carrying any phonetic content.
const MIN_DURATION_MS: f64 = 100.0;

/// Fundamental frequency contour. Unvoiced frames hold no value.
#[derive(Debug, Clone, Default)]
pub struct PitchContour {
    pub times: Vec<f64>,
    pub values: Vec<Option<f32>>,
}

impl PitchContour {
    /// Pitch values for voiced frames only, in Hz.
    pub fn voiced(&self) -> impl Iterator<Item = f32> + '_ {
        self.values.iter().filter_map(|v| *v)
    }
}

/// Numeric descriptors derived from one audio signal.
#[derive(Debug, Clone)]
pub struct AudioFeatureBundle {
    pub sample_rate: u32,
    pub duration: f64,
    pub frame_count: usize,
    pub hop_secs: f64,
    pub pitch: PitchContour,
    pub mfcc: Array2<f32>,
    pub spectral_centroid: Vec<f32>,
    pub spectral_rolloff: Vec<f32>,
    pub zero_crossing_rate: Vec<f32>,
    pub formants: [f32; 4],
    pub onsets: Vec<f64>,
    pub tempo: f32,
    pub energy: Vec<f32>,
}

/// Prepares the feature bundle from recorded audio.
#[derive(Debug, Default)]
pub struct FeatureExtractor {}

impl FeatureExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extract(&self, samples: &[f32], sample_rate: u32) -> Result<AudioFeatureBundle> {
        if sample_rate == 0 {
            return Err(AnalysisError::UnsupportedFormat(
                "sample rate must be positive".into(),
            ));
        }
        let duration = samples.len() as f64 / sample_rate as f64;
        let duration_ms = duration * 1000.0;
        if duration_ms < MIN_DURATION_MS {
            return Err(AnalysisError::AudioTooShort {
                duration_ms,
                minimum_ms: MIN_DURATION_MS,
            });
        }

        let mono = resample_to_target(samples, sample_rate);
        let spectral = spectral::compute(&mono)?;
        let pitch = pitch::extract(&mono, spectral.frame_count);
        let hop_secs = HOP_MS as f64 / 1000.0;
        let onsets = spectral::detect_onsets(&spectral.flux, hop_secs);
        let tempo = estimate_tempo(&onsets);
        debug!(
            frames = spectral.frame_count,
            onsets = onsets.len(),
            tempo,
            duration,
            "extracted audio feature bundle"
        );

        Ok(AudioFeatureBundle {
            sample_rate: TARGET_SAMPLE_RATE,
            duration,
            frame_count: spectral.frame_count,
            hop_secs,
            pitch,
            mfcc: spectral.mfcc,
            spectral_centroid: spectral.centroid,
            spectral_rolloff: spectral.rolloff,
            zero_crossing_rate: spectral.zcr,
            formants: spectral.formants,
            onsets,
            tempo,
            energy: spectral.energy,
        })
    }
}

/// Linearly resample to the analysis rate.
fn resample_to_target(samples: &[f32], source_rate: u32) -> Vec<f32> {
    if samples.is_empty() || source_rate == TARGET_SAMPLE_RATE {
        return samples.to_vec();
    }
    let ratio = TARGET_SAMPLE_RATE as f32 / source_rate as f32;
    let output_len = ((samples.len() as f32) * ratio).ceil().max(1.0) as usize;
    let mut output = Vec::with_capacity(output_len);
    let last_index = samples.len() - 1;
    for i in 0..output_len {
        let position = i as f32 / ratio;
        let left = position.floor() as usize;
        let right = (left + 1).min(last_index);
        let t = position - left as f32;
        output.push(samples[left] * (1.0 - t) + samples[right] * t);
    }
    output
}

/// Estimated speaking tempo in onsets per minute; zero when onsets are sparse.
fn estimate_tempo(onsets: &[f64]) -> f32 {
    if onsets.len() < 2 {
        return 0.0;
    }
    let span = onsets[onsets.len() - 1] - onsets[0];
    if span <= f64::EPSILON {
        return 0.0;
    }
    ((onsets.len() - 1) as f64 * 60.0 / span) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, secs: f64, rate: u32) -> Vec<f32> {
        let count = (secs * rate as f64) as usize;
        (0..count)
            .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / rate as f64).sin() as f32 * 0.5)
            .collect()
    }

    #[test]
    fn rejects_audio_below_minimum_duration() {
        let samples = sine(200.0, 0.05, 16_000);
        let err = FeatureExtractor::new()
            .extract(&samples, 16_000)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::AudioTooShort { .. }));
    }

    #[test]
    fn extracts_bundle_from_steady_tone() {
        let samples = sine(220.0, 1.0, 16_000);
        let bundle = FeatureExtractor::new().extract(&samples, 16_000).unwrap();
        assert!(bundle.frame_count > 50);
        assert_eq!(bundle.energy.len(), bundle.frame_count);
        assert_eq!(bundle.spectral_centroid.len(), bundle.frame_count);
        assert!((bundle.duration - 1.0).abs() < 1e-6);
    }

    #[test]
    fn pitch_holds_values_only_for_voiced_frames() {
        let mut samples = sine(220.0, 0.5, 16_000);
        samples.extend(std::iter::repeat(0.0).take(8_000));
        let bundle = FeatureExtractor::new().extract(&samples, 16_000).unwrap();
        let voiced = bundle.pitch.voiced().count();
        let total = bundle.pitch.values.len();
        assert!(voiced > 0, "steady tone should register voiced frames");
        assert!(voiced < total, "trailing silence should stay unvoiced");
    }

    #[test]
    fn resampling_preserves_constant_signal() {
        let resampled = resample_to_target(&vec![0.25; 48_000], 48_000);
        assert_eq!(resampled.len(), 16_000);
        assert!(resampled.iter().all(|&s| (s - 0.25).abs() < 1e-6));
    }

    #[test]
    fn tempo_needs_at_least_two_onsets() {
        assert_eq!(estimate_tempo(&[]), 0.0);
        assert_eq!(estimate_tempo(&[0.4]), 0.0);
        let tempo = estimate_tempo(&[0.0, 0.5, 1.0]);
        assert!((tempo - 120.0).abs() < 1e-3);
    }
}
