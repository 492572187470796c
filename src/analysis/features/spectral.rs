//! Spectral descriptors: MFCCs, centroid/rolloff, zero crossings, energy,
//! onset detection, and a coarse formant estimate.

use aus::analysis;
use aus::analysis::mel::MelFilterbank;
use aus::spectrum;
use aus::WindowType;
use ndarray::Array2;

use super::{HOP_MS, TARGET_SAMPLE_RATE, WINDOW_MS};
use crate::analysis::Result;

const MEL_BANDS: usize = 40;
const MFCC_COUNT: usize = 13;
const MIN_FREQ: f64 = 20.0;
const ROLLOFF_FRACTION: f64 = 0.85;
const FORMANT_PEAK_RATIO: f64 = 0.1;

pub(super) struct SpectralFeatures {
    pub frame_count: usize,
    pub mfcc: Array2<f32>,
    pub centroid: Vec<f32>,
    pub rolloff: Vec<f32>,
    pub zcr: Vec<f32>,
    pub energy: Vec<f32>,
    pub flux: Vec<f32>,
    pub formants: [f32; 4],
}

pub(super) fn compute(mono: &[f32]) -> Result<SpectralFeatures> {
    let audio_f64: Vec<f64> = mono.iter().map(|&s| s as f64).collect();
    let fft_size = frame_length_samples();
    let hop_size = ((TARGET_SAMPLE_RATE as usize * HOP_MS) / 1000).max(1);

    let stft = spectrum::rstft(&audio_f64, fft_size, hop_size, WindowType::Hanning);
    let (magnitude, _) = spectrum::complex_to_polar_rstft(&stft);
    let power = analysis::make_power_spectrogram(&magnitude);
    let freqs = spectrum::rfftfreq(fft_size, TARGET_SAMPLE_RATE);

    let filterbank = MelFilterbank::new(
        MIN_FREQ,
        (TARGET_SAMPLE_RATE as f64) / 2.0,
        MEL_BANDS,
        &freqs,
        true,
    );
    let mel = analysis::mel::make_mel_spectrogram(&power, &filterbank);
    let mfcc_raw = analysis::mel::mfcc_spectrogram(&mel, MFCC_COUNT, None);
    let mfcc = array_from_vec2(&mfcc_raw);

    let frame_count = magnitude.len();
    let centroid = spectral_centroid(&magnitude, &freqs);
    let rolloff = spectral_rolloff(&magnitude, &freqs);
    let zcr = zero_crossing_rate(mono, fft_size, hop_size, frame_count);
    let energy = frame_energy(&power);
    let flux = spectral_flux(&magnitude);
    let formants = estimate_formants(&magnitude, &freqs);

    Ok(SpectralFeatures {
        frame_count,
        mfcc,
        centroid,
        rolloff,
        zcr,
        energy,
        flux,
        formants,
    })
}

pub(super) fn frame_length_samples() -> usize {
    ((TARGET_SAMPLE_RATE as usize * WINDOW_MS) / 1000).max(1)
}

/// Onset timestamps from local spectral-flux peaks above an adaptive floor.
pub(super) fn detect_onsets(flux: &[f32], hop_secs: f64) -> Vec<f64> {
    if flux.len() < 3 {
        return Vec::new();
    }
    let mean = flux.iter().sum::<f32>() / flux.len() as f32;
    let variance = flux.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / flux.len() as f32;
    let threshold = mean + variance.sqrt() * 0.5;
    let mut onsets = Vec::new();
    for i in 1..flux.len() - 1 {
        if flux[i] > threshold && flux[i] > flux[i - 1] && flux[i] >= flux[i + 1] {
            onsets.push(i as f64 * hop_secs);
        }
    }
    onsets
}

fn array_from_vec2(data: &[Vec<f64>]) -> Array2<f32> {
    if data.is_empty() {
        return Array2::zeros((0, 0));
    }
    let rows = data.len();
    let cols = data[0].len();
    let mut flat = Vec::with_capacity(rows * cols);
    for row in data {
        flat.extend(row.iter().map(|v| *v as f32));
    }
    Array2::from_shape_vec((rows, cols), flat).expect("valid mfcc dimensions")
}

fn spectral_centroid(magnitude: &[Vec<f64>], freqs: &[f64]) -> Vec<f32> {
    magnitude
        .iter()
        .map(|frame| {
            let total: f64 = frame.iter().sum();
            if total <= f64::EPSILON {
                return 0.0;
            }
            let weighted: f64 = frame.iter().zip(freqs.iter()).map(|(m, f)| m * f).sum();
            (weighted / total) as f32
        })
        .collect()
}

fn spectral_rolloff(magnitude: &[Vec<f64>], freqs: &[f64]) -> Vec<f32> {
    magnitude
        .iter()
        .map(|frame| {
            let total: f64 = frame.iter().sum();
            if total <= f64::EPSILON {
                return 0.0;
            }
            let target = total * ROLLOFF_FRACTION;
            let mut running = 0.0;
            for (bin, m) in frame.iter().enumerate() {
                running += m;
                if running >= target {
                    return freqs[bin] as f32;
                }
            }
            *freqs.last().unwrap_or(&0.0) as f32
        })
        .collect()
}

fn zero_crossing_rate(
    mono: &[f32],
    frame_len: usize,
    hop_size: usize,
    frame_count: usize,
) -> Vec<f32> {
    let mut rates = Vec::with_capacity(frame_count);
    for frame in 0..frame_count {
        let start = frame * hop_size;
        let end = (start + frame_len).min(mono.len());
        if start + 1 >= end {
            rates.push(0.0);
            continue;
        }
        let crossings = mono[start..end]
            .windows(2)
            .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
            .count();
        rates.push(crossings as f32 / (end - start) as f32);
    }
    rates
}

fn frame_energy(power: &[Vec<f64>]) -> Vec<f32> {
    power
        .iter()
        .map(|frame| frame.iter().sum::<f64>().sqrt() as f32)
        .collect()
}

fn spectral_flux(magnitude: &[Vec<f64>]) -> Vec<f32> {
    if magnitude.is_empty() {
        return Vec::new();
    }
    let mut flux = Vec::with_capacity(magnitude.len());
    flux.push(0.0_f32);
    for i in 1..magnitude.len() {
        let mut sum = 0.0;
        for (curr, prev) in magnitude[i].iter().zip(magnitude[i - 1].iter()) {
            let diff = (curr - prev).max(0.0);
            sum += diff * diff;
        }
        flux.push(sum.sqrt() as f32);
    }
    flux
}

/// First four resonance peaks of the time-averaged spectrum. Zeros fill
/// positions where no qualifying peak exists.
fn estimate_formants(magnitude: &[Vec<f64>], freqs: &[f64]) -> [f32; 4] {
    let mut formants = [0.0_f32; 4];
    if magnitude.is_empty() {
        return formants;
    }
    let bins = magnitude[0].len();
    let mut average = vec![0.0_f64; bins];
    for frame in magnitude {
        for (slot, value) in average.iter_mut().zip(frame.iter()) {
            *slot += value;
        }
    }
    let frame_count = magnitude.len() as f64;
    for slot in average.iter_mut() {
        *slot /= frame_count;
    }
    let peak = average.iter().cloned().fold(0.0_f64, f64::max);
    if peak <= f64::EPSILON {
        return formants;
    }
    let floor = peak * FORMANT_PEAK_RATIO;
    let mut found = 0;
    for bin in 1..bins.saturating_sub(1) {
        if found == formants.len() {
            break;
        }
        let value = average[bin];
        if value > floor && value > average[bin - 1] && value >= average[bin + 1] {
            formants[found] = freqs[bin] as f32;
            found += 1;
        }
    }
    formants
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn onset_detection_flags_flux_spikes() {
        let mut flux = vec![0.1_f32; 40];
        flux[10] = 2.0;
        flux[25] = 2.5;
        let onsets = detect_onsets(&flux, 0.01);
        assert_eq!(onsets.len(), 2);
        assert!((onsets[0] - 0.10).abs() < 1e-9);
        assert!((onsets[1] - 0.25).abs() < 1e-9);
    }

    #[test]
    fn flat_flux_yields_no_onsets() {
        let onsets = detect_onsets(&vec![0.5_f32; 64], 0.01);
        assert!(onsets.is_empty());
    }

    #[test]
    fn centroid_of_single_bin_is_that_frequency() {
        let magnitude = vec![vec![0.0, 1.0, 0.0]];
        let freqs = vec![0.0, 100.0, 200.0];
        let centroid = spectral_centroid(&magnitude, &freqs);
        assert!((centroid[0] - 100.0).abs() < 1e-6);
    }

    #[test]
    fn formant_estimate_picks_ascending_peaks() {
        let mut frame = vec![0.0_f64; 64];
        frame[5] = 1.0;
        frame[12] = 0.8;
        frame[20] = 0.6;
        let freqs: Vec<f64> = (0..64).map(|i| i as f64 * 50.0).collect();
        let formants = estimate_formants(&[frame], &freqs);
        assert_eq!(formants[0], 250.0);
        assert_eq!(formants[1], 600.0);
        assert_eq!(formants[2], 1000.0);
        assert_eq!(formants[3], 0.0);
    }
}
