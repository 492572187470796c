//! Acoustic phoneme classification.
//!
//! Segments the audio into phoneme-candidate windows from the feature
//! bundle's onset markers (even division when onsets are unusable), derives a
//! compact feature vector per window, and asks the pluggable classifier
//! capability for a unit label. A missing, failing, or timed-out capability
//! yields unknown placeholder units; this stage never fails the pipeline.

use std::sync::Arc;
use std::time::Duration;

use ndarray::Axis;
use tracing::{debug, warn};

use super::features::AudioFeatureBundle;
use super::worker::call_with_timeout;
use super::PhoneticUnit;

pub use super::similarity::UNKNOWN_UNIT;

/// Target window length when onset detection yields no usable boundaries.
const FALLBACK_WINDOW_FRAMES: usize = 8;

/// Compact per-window descriptors handed to the classifier capability.
#[derive(Debug, Clone)]
pub struct SegmentFeatures {
    pub mfcc_mean: Vec<f32>,
    pub energy_mean: f32,
    pub start_frame: usize,
    pub end_frame: usize,
}

/// Pluggable classification capability supplied by an external model.
pub trait PhonemeClassifier: Send + Sync {
    fn classify(&self, segment: &SegmentFeatures, language_code: &str) -> anyhow::Result<String>;

    /// Batch entry point; the default delegates to `classify` per segment.
    fn classify_sequence(
        &self,
        segments: &[SegmentFeatures],
        language_code: &str,
    ) -> anyhow::Result<Vec<String>> {
        segments
            .iter()
            .map(|segment| self.classify(segment, language_code))
            .collect()
    }
}

/// Maps audio feature windows to an ordered actual-unit sequence.
pub struct AcousticPhonemeClassifier {
    capability: Option<Arc<dyn PhonemeClassifier>>,
    capability_timeout: Duration,
}

impl Default for AcousticPhonemeClassifier {
    fn default() -> Self {
        Self {
            capability: None,
            capability_timeout: Duration::from_secs(2),
        }
    }
}

impl AcousticPhonemeClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capability(mut self, capability: Arc<dyn PhonemeClassifier>) -> Self {
        self.capability = Some(capability);
        self
    }

    pub fn with_capability_timeout(mut self, timeout: Duration) -> Self {
        self.capability_timeout = timeout;
        self
    }

    /// Classifies each window into a phonetic unit. The output length depends
    /// only on segmentation, never on the reference sequence.
    pub fn classify(&self, bundle: &AudioFeatureBundle, language_code: &str) -> Vec<PhoneticUnit> {
        let windows = segment_windows(bundle);
        let segments = window_features(bundle, &windows);
        let labels = self.classify_segments(&segments, language_code);
        debug!(
            windows = segments.len(),
            language = language_code,
            "classified audio windows"
        );
        labels
            .into_iter()
            .enumerate()
            .map(|(index, symbol)| PhoneticUnit::actual(symbol, index))
            .collect()
    }

    fn classify_segments(&self, segments: &[SegmentFeatures], language_code: &str) -> Vec<String> {
        let unknowns = || vec![UNKNOWN_UNIT.to_string(); segments.len()];
        let Some(capability) = self.capability.clone() else {
            return unknowns();
        };
        let owned_segments = segments.to_vec();
        let owned_code = language_code.to_string();
        let outcome = call_with_timeout("classify", self.capability_timeout, move || {
            capability.classify_sequence(&owned_segments, &owned_code)
        });
        match outcome {
            Some(Ok(labels)) if labels.len() == segments.len() => labels,
            Some(Ok(labels)) => {
                warn!(
                    expected = segments.len(),
                    got = labels.len(),
                    "classifier returned mismatched label count; treating as sequence override"
                );
                labels
            }
            Some(Err(err)) => {
                warn!(language = language_code, error = %err, "classifier capability failed");
                unknowns()
            }
            None => unknowns(),
        }
    }
}

/// Frame ranges for phoneme-candidate windows. Onset markers drive the
/// boundaries; with fewer than two usable onsets the audio divides evenly.
fn segment_windows(bundle: &AudioFeatureBundle) -> Vec<(usize, usize)> {
    let frame_count = bundle.frame_count;
    if frame_count == 0 {
        return Vec::new();
    }
    let mut boundaries: Vec<usize> = bundle
        .onsets
        .iter()
        .map(|&t| ((t / bundle.hop_secs) as usize).min(frame_count))
        .collect();
    boundaries.dedup();
    boundaries.retain(|&frame| frame > 0 && frame < frame_count);

    if boundaries.len() < 2 {
        return even_windows(frame_count);
    }
    let mut windows = Vec::with_capacity(boundaries.len() + 1);
    let mut start = 0;
    for boundary in boundaries {
        if boundary > start {
            windows.push((start, boundary));
            start = boundary;
        }
    }
    if start < frame_count {
        windows.push((start, frame_count));
    }
    windows
}

fn even_windows(frame_count: usize) -> Vec<(usize, usize)> {
    let window_count = (frame_count / FALLBACK_WINDOW_FRAMES).max(1);
    let mut windows = Vec::with_capacity(window_count);
    for index in 0..window_count {
        let start = index * frame_count / window_count;
        let end = (index + 1) * frame_count / window_count;
        if end > start {
            windows.push((start, end));
        }
    }
    windows
}

fn window_features(bundle: &AudioFeatureBundle, windows: &[(usize, usize)]) -> Vec<SegmentFeatures> {
    windows
        .iter()
        .map(|&(start, end)| {
            let span = (end - start).max(1) as f32;
            let mfcc_mean = if bundle.mfcc.is_empty() {
                Vec::new()
            } else {
                let end = end.min(bundle.mfcc.len_of(Axis(0)));
                let slice = bundle.mfcc.slice(ndarray::s![start..end, ..]);
                slice
                    .axis_iter(Axis(1))
                    .map(|column| column.iter().sum::<f32>() / span)
                    .collect()
            };
            let energy_mean = bundle.energy[start..end.min(bundle.energy.len())]
                .iter()
                .copied()
                .sum::<f32>()
                / span;
            SegmentFeatures {
                mfcc_mean,
                energy_mean,
                start_frame: start,
                end_frame: end,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::features::{AudioFeatureBundle, PitchContour};
    use ndarray::Array2;

    fn bundle_with(frame_count: usize, onsets: Vec<f64>) -> AudioFeatureBundle {
        AudioFeatureBundle {
            sample_rate: 16_000,
            duration: frame_count as f64 * 0.01,
            frame_count,
            hop_secs: 0.01,
            pitch: PitchContour::default(),
            mfcc: Array2::zeros((frame_count, 13)),
            spectral_centroid: vec![0.0; frame_count],
            spectral_rolloff: vec![0.0; frame_count],
            zero_crossing_rate: vec![0.0; frame_count],
            formants: [0.0; 4],
            onsets,
            tempo: 0.0,
            energy: vec![0.5; frame_count],
        }
    }

    #[test]
    fn missing_capability_yields_unknown_units() {
        let bundle = bundle_with(64, vec![0.1, 0.3, 0.5]);
        let units = AcousticPhonemeClassifier::new().classify(&bundle, "en");
        assert!(!units.is_empty());
        assert!(units.iter().all(|u| u.symbol == UNKNOWN_UNIT));
        assert!(units.iter().enumerate().all(|(i, u)| u.segment == Some(i)));
    }

    #[test]
    fn onsets_drive_window_boundaries() {
        let bundle = bundle_with(60, vec![0.2, 0.4]);
        let windows = segment_windows(&bundle);
        assert_eq!(windows, vec![(0, 20), (20, 40), (40, 60)]);
    }

    #[test]
    fn sparse_onsets_fall_back_to_even_division() {
        let bundle = bundle_with(64, Vec::new());
        let windows = segment_windows(&bundle);
        assert_eq!(windows.len(), 64 / FALLBACK_WINDOW_FRAMES);
        assert!(windows.windows(2).all(|w| w[0].1 == w[1].0));
    }

    #[test]
    fn failing_capability_degrades_to_unknowns() {
        struct Offline;
        impl PhonemeClassifier for Offline {
            fn classify(&self, _: &SegmentFeatures, _: &str) -> anyhow::Result<String> {
                anyhow::bail!("model unavailable")
            }
        }
        let bundle = bundle_with(32, Vec::new());
        let classifier =
            AcousticPhonemeClassifier::new().with_capability(std::sync::Arc::new(Offline));
        let units = classifier.classify(&bundle, "th");
        assert!(units.iter().all(|u| u.symbol == UNKNOWN_UNIT));
    }
}
