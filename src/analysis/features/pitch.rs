//! Pitch contour extraction via pYIN.

use aus::analysis;

use super::{spectral, PitchContour, TARGET_SAMPLE_RATE};

const FREQ_MIN: f64 = 55.0;
const FREQ_MAX: f64 = 1_200.0;

/// Extracts the fundamental-frequency contour, aligned to the spectral frame
/// grid. Unvoiced frames carry no value rather than a zero.
pub(super) fn extract(mono: &[f32], frame_count: usize) -> PitchContour {
    let audio: Vec<f64> = mono.iter().map(|&s| s as f64).collect();
    let frame_len = spectral::frame_length_samples();
    let (timestamps, pitches, voiced_flags, _confidence) =
        analysis::pyin_pitch_estimator(&audio, TARGET_SAMPLE_RATE, FREQ_MIN, FREQ_MAX, frame_len);

    let values: Vec<Option<f32>> = pitches
        .iter()
        .zip(voiced_flags.iter())
        .map(|(&pitch, &voiced)| {
            (voiced && pitch.is_finite() && pitch > 0.0).then_some(pitch as f32)
        })
        .collect();
    let contour = PitchContour {
        times: timestamps,
        values,
    };
    align_to_frames(contour, frame_count)
}

/// Resamples the contour index grid onto the spectral frame count so pitch,
/// energy, and MFCC rows line up one-to-one.
fn align_to_frames(contour: PitchContour, frame_count: usize) -> PitchContour {
    let len = contour.values.len();
    if frame_count == 0 || len == 0 || len == frame_count {
        return contour;
    }
    let mut times = Vec::with_capacity(frame_count);
    let mut values = Vec::with_capacity(frame_count);
    for frame in 0..frame_count {
        let position = frame * (len - 1) / (frame_count - 1).max(1);
        times.push(contour.times.get(position).copied().unwrap_or_default());
        values.push(contour.values[position]);
    }
    PitchContour { times, values }
}
