//! Command-line interface tests.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};

fn write_wav(dir: &Path, secs: f64) -> PathBuf {
    let path = dir.join("utterance.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    let count = (secs * 16_000.0) as usize;
    for i in 0..count {
        let sample = (2.0 * std::f64::consts::PI * 220.0 * i as f64 / 16_000.0).sin();
        writer.write_sample((sample * 0.5 * i16::MAX as f64) as i16).unwrap();
    }
    writer.finalize().unwrap();
    path
}

#[test]
fn analyzes_a_wav_file_and_prints_json() {
    let dir = tempfile::tempdir().unwrap();
    let wav = write_wav(dir.path(), 1.5);

    Command::cargo_bin("accentor")
        .unwrap()
        .arg(&wav)
        .args(["--text", "hello world"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"overall_score\""))
        .stdout(predicate::str::contains("\"fsi_estimated_level\""))
        .stdout(predicate::str::contains("\"language_code\":\"en\""));
}

#[test]
fn pretty_flag_formats_the_report() {
    let dir = tempfile::tempdir().unwrap();
    let wav = write_wav(dir.path(), 1.0);

    Command::cargo_bin("accentor")
        .unwrap()
        .arg(&wav)
        .args(["--text", "hola", "--language", "es", "--pretty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("  \"overall_score\""));
}

#[test]
fn missing_input_file_fails() {
    Command::cargo_bin("accentor")
        .unwrap()
        .arg("/nonexistent/utterance.wav")
        .args(["--text", "hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn unsupported_language_fails() {
    let dir = tempfile::tempdir().unwrap();
    let wav = write_wav(dir.path(), 1.0);

    Command::cargo_bin("accentor")
        .unwrap()
        .arg(&wav)
        .args(["--text", "hello", "--language", "xx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported language code"));
}

#[test]
fn out_of_range_fsi_level_fails() {
    let dir = tempfile::tempdir().unwrap();
    let wav = write_wav(dir.path(), 1.0);

    Command::cargo_bin("accentor")
        .unwrap()
        .arg(&wav)
        .args(["--text", "hello", "--fsi-level", "7.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("between 0.0 and 5.0"));
}

#[test]
fn too_short_audio_reports_the_limit() {
    let dir = tempfile::tempdir().unwrap();
    let wav = write_wav(dir.path(), 0.05);

    Command::cargo_bin("accentor")
        .unwrap()
        .arg(&wav)
        .args(["--text", "hi"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("audio too short"));
}
