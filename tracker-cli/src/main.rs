//! # pitch-tracker
//!
//! Headless host for the cepstral pitch tracker. Audio comes either from the
//! default input device (`live`) or from a WAV file (`file`); every note the
//! tracker finalizes is printed as it appears, and the complete feature set
//! can be written out as JSON.

mod live;
mod report;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};
use tracker_core::audio::downmix;
use tracker_core::tracker::{DEFAULT_BLOCK_SIZE, DEFAULT_STEP_SIZE};
use tracker_core::{analyse_signal, FeatureSet, TrackerConfig};

#[derive(Debug, Parser)]
#[command(name = "pitch-tracker", version, about = "Monophonic cepstral pitch and note tracker")]
struct Cli {
    /// JSON file with tracker parameters; missing fields keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write every f0 point and note to this JSON file
    #[arg(long, short, global = true)]
    output: Option<PathBuf>,

    /// Samples per analysis block (power of two)
    #[arg(long, global = true, default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: usize,

    /// Samples between the starts of consecutive blocks
    #[arg(long, global = true, default_value_t = DEFAULT_STEP_SIZE)]
    step_size: usize,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Track the default audio input device
    Live {
        /// Stop after this many seconds
        #[arg(long, default_value_t = 10.0)]
        seconds: f64,
    },
    /// Track a WAV file
    File {
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => report::load_config(path)?,
        None => TrackerConfig::default(),
    };

    let features = match cli.mode {
        Mode::Live { seconds } => {
            if !(seconds > 0.0 && seconds.is_finite()) {
                bail!("--seconds must be a positive number, got {}", seconds);
            }
            live::run(config, cli.block_size, cli.step_size, seconds)?
        }
        Mode::File { ref path } => {
            let features = analyse_file(path, config, cli.block_size, cli.step_size)?;
            for note in &features.notes {
                println!("{}", report::describe_note(note));
            }
            features
        }
    };

    info!(
        "{} notes, {} f0 points",
        features.notes.len(),
        features.f0.len()
    );

    if let Some(path) = &cli.output {
        report::save_features(&features, path)?;
        info!("Features written to {}", path.display());
    }
    Ok(())
}

/// Reads a WAV file, downmixes it to mono and runs the tracker over it.
fn analyse_file(
    path: &Path,
    config: TrackerConfig,
    block_size: usize,
    step_size: usize,
) -> Result<FeatureSet> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    info!(
        "{}: {} Hz, {} channel(s), {} bits {:?}",
        path.display(),
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
        spec.sample_format
    );

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .context("reading float samples")?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .context("reading integer samples")?
        }
    };
    let mono = downmix(&interleaved, spec.channels as usize);

    analyse_signal(
        &mono,
        spec.sample_rate as f32,
        step_size,
        block_size,
        config,
    )
    .with_context(|| format!("analysing {}", path.display()))
}
