use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use accentor::{AnalysisRequest, Analyzer, LanguageRegistry};

/// Accentor - pronunciation assessment for language learners
///
/// Scores a recorded utterance against the text the speaker was attempting
/// and prints the full analysis report as JSON.
#[derive(Parser, Debug)]
#[command(name = "accentor")]
#[command(version = "0.1.0")]
#[command(about = "Pronunciation assessment engine", long_about = None)]
struct Args {
    /// Input WAV file with the recorded utterance
    #[arg(value_name = "INPUT")]
    input_file: PathBuf,

    /// Reference text the speaker was attempting
    #[arg(long, value_name = "TEXT")]
    text: String,

    /// Language code of the reference text (e.g. en, es, ja)
    #[arg(long, default_value = "en")]
    language: String,

    /// Learner's target FSI level, in half steps from 0.0 to 5.0
    #[arg(long, value_name = "LEVEL")]
    fsi_level: Option<f32>,

    /// Phonemes the learner is drilling; may be repeated
    #[arg(long, value_name = "PHONEME")]
    focus: Vec<String>,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,
}

impl Args {
    fn validate(&self) -> Result<()> {
        if !self.input_file.exists() {
            anyhow::bail!("Input file does not exist: {:?}", self.input_file);
        }
        if !self.input_file.is_file() {
            anyhow::bail!("Input path is not a file: {:?}", self.input_file);
        }
        if self.text.trim().is_empty() {
            anyhow::bail!("Reference text must not be empty");
        }
        if !LanguageRegistry::shared().supports(&self.language) {
            anyhow::bail!("Unsupported language code: {}", self.language);
        }
        if let Some(level) = self.fsi_level {
            if !(0.0..=5.0).contains(&level) {
                anyhow::bail!("FSI level must be between 0.0 and 5.0, got: {}", level);
            }
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    args.validate()
        .context("Failed to validate command-line arguments")?;

    let (samples, sample_rate) = read_wav(&args.input_file)
        .with_context(|| format!("Failed to read WAV file {:?}", args.input_file))?;

    let request = AnalysisRequest {
        samples,
        sample_rate,
        reference_text: args.text,
        language_code: args.language,
        fsi_level_hint: args.fsi_level,
        focus_phonemes: args.focus,
    };
    let report = Analyzer::new()
        .analyze(&request)
        .context("Analysis failed")?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}

/// Decodes a WAV file to mono f32 samples, averaging channels.
fn read_wav(path: &std::path::Path) -> Result<(Vec<f32>, u32)> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    let mono: Vec<f32> = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();
    Ok((mono, spec.sample_rate))
}
