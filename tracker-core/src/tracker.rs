//! # Cepstral Pitch Tracker
//!
//! The host-facing processor. Each frequency-domain block is turned into a
//! single pitch [`Estimate`] by picking the highest cepstral peak in the
//! quefrency range of interest, and the estimate is handed to an
//! [`AgentFeeder`]. Whenever the feeder finalizes a hypothesis, its
//! estimates are emitted on the `f0` output and its averaged note on the
//! `notes` output.

use crate::cepstrum::Cepstrum;
use crate::error::{TrackerError, TrackerResult};
use crate::feeder::AgentFeeder;
use crate::fft::SpectrumAnalyzer;
use crate::hypothesis::NoteHypothesis;
use crate::note::Estimate;
use crate::peak::{find_peak_location_at, MeanFilter};
use crate::{Feature, FeatureSet};
use log::{debug, trace};
use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Preferred number of samples per analysis block.
pub const DEFAULT_BLOCK_SIZE: usize = 1024;
/// Preferred number of samples between consecutive blocks.
pub const DEFAULT_STEP_SIZE: usize = 256;

/// Tunable parameters of the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Lowest frequency of interest in Hz.
    pub fmin: f32,
    /// Highest frequency of interest in Hz.
    pub fmax: f32,
    /// Gap tolerated between consecutive estimates of one note, in ms.
    pub slack_ms: u64,
    /// Mean spectral magnitude below which a block is treated as silence.
    pub threshold: f64,
    /// Scale applied to the cepstral peak prominence to give a confidence.
    pub sensitivity: f64,
    /// Length of the mean filter applied to the cepstrum. Must be odd.
    pub filter_length: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            fmin: 50.0,
            fmax: 900.0,
            slack_ms: 40,
            threshold: 0.1,
            sensitivity: 10.0,
            filter_length: 1,
        }
    }
}

impl TrackerConfig {
    pub fn slack(&self) -> Duration {
        Duration::from_millis(self.slack_ms)
    }

    /// Checks the parameters that do not depend on the stream layout.
    pub fn validate(&self) -> TrackerResult<()> {
        if !(self.fmin > 0.0 && self.fmax > self.fmin && self.fmax.is_finite()) {
            return Err(TrackerError::InvalidFrequencyRange {
                min: self.fmin,
                max: self.fmax,
            });
        }
        if self.filter_length % 2 == 0 {
            return Err(TrackerError::EvenFilterLength(self.filter_length));
        }
        Ok(())
    }
}

/// Per-stream buffers, created by `initialise`.
struct Analysis {
    cepstrum: Cepstrum,
    filter: MeanFilter,
    raw: Vec<f64>,
    filtered: Vec<f64>,
    bin_from: usize,
}

pub struct CepstralPitchTracker {
    sample_rate: f32,
    config: TrackerConfig,
    step_size: usize,
    block_size: usize,
    analysis: Option<Analysis>,
    feeder: AgentFeeder,
    reported: usize,
}

impl CepstralPitchTracker {
    pub fn new(sample_rate: f32, config: TrackerConfig) -> Self {
        let feeder = AgentFeeder::new(config.slack());
        CepstralPitchTracker {
            sample_rate,
            config,
            step_size: DEFAULT_STEP_SIZE,
            block_size: DEFAULT_BLOCK_SIZE,
            analysis: None,
            feeder,
            reported: 0,
        }
    }

    /// Prepares the tracker for a stream of `block_size`-point spectra
    /// arriving every `step_size` samples, and resets it.
    pub fn initialise(
        &mut self,
        channels: usize,
        step_size: usize,
        block_size: usize,
    ) -> TrackerResult<()> {
        if channels != 1 {
            return Err(TrackerError::UnsupportedChannelCount(channels));
        }
        if !(self.sample_rate > 0.0 && self.sample_rate.is_finite()) {
            return Err(TrackerError::InvalidSampleRate(self.sample_rate));
        }
        if block_size < 4 || !block_size.is_power_of_two() {
            return Err(TrackerError::InvalidBlockSize(block_size));
        }
        if step_size == 0 || step_size > block_size {
            return Err(TrackerError::InvalidStepSize {
                step_size,
                block_size,
            });
        }
        self.config.validate()?;

        let (bin_from, bin_to) = self.quefrency_range(block_size);
        let bins = bin_to - bin_from + 1;
        debug!(
            "initialised: sample rate {} Hz, step {}, block {}, quefrency bins {}..={}",
            self.sample_rate, step_size, block_size, bin_from, bin_to
        );

        self.step_size = step_size;
        self.block_size = block_size;
        self.analysis = Some(Analysis {
            cepstrum: Cepstrum::new(block_size)?,
            filter: MeanFilter::new(self.config.filter_length),
            raw: vec![0.0; block_size],
            filtered: vec![0.0; bins],
            bin_from,
        });
        self.reset();
        Ok(())
    }

    /// Discards all tracking state, ready for an unrelated stream.
    pub fn reset(&mut self) {
        self.feeder = AgentFeeder::new(self.config.slack());
        self.reported = 0;
    }

    /// Processes one frequency-domain block of `block_size/2 + 1` bins
    /// whose analysis frame is centred at `timestamp`.
    ///
    /// Returns the features of any notes finalized by this block, or an
    /// error if the tracker is not initialised or the block has the wrong
    /// number of bins.
    pub fn process(
        &mut self,
        spectrum: &[Complex<f32>],
        timestamp: Duration,
    ) -> TrackerResult<FeatureSet> {
        let analysis = self.analysis.as_mut().ok_or(TrackerError::NotInitialised)?;
        let expected = self.block_size / 2 + 1;
        if spectrum.len() != expected {
            return Err(TrackerError::InvalidSpectrumLength {
                expected,
                actual: spectrum.len(),
            });
        }

        let magnitude_mean = analysis.cepstrum.process(spectrum, &mut analysis.raw);
        analysis
            .filter
            .filter_subsequence(&analysis.raw, &mut analysis.filtered, analysis.bin_from);
        let data = &analysis.filtered;

        let mut max_value = 0.0;
        let mut max_bin = None;
        for (i, value) in data.iter().enumerate() {
            if *value > max_value {
                max_value = *value;
                max_bin = Some(i);
            }
        }

        let Some(max_bin) = max_bin else {
            trace!("no cepstral peak at {:?}", timestamp);
            return Ok(FeatureSet::default());
        };

        let mut next_peak_value = 0.0;
        for i in 1..data.len().saturating_sub(1) {
            if data[i] > data[i - 1]
                && data[i] > data[i + 1]
                && i != max_bin
                && data[i] > next_peak_value
            {
                next_peak_value = data[i];
            }
        }

        let peak = find_peak_location_at(data, max_bin);
        let frequency = self.sample_rate as f64 / (peak + analysis.bin_from as f64);

        let mut confidence = 0.0;
        if next_peak_value != 0.0 {
            confidence = (max_value - next_peak_value) * self.config.sensitivity;
            if magnitude_mean < self.config.threshold {
                confidence = 0.0;
            }
        }

        self.feeder
            .feed(Estimate::new(frequency, timestamp, confidence));

        Ok(self.new_features())
    }

    /// Flushes the tracker at the end of the stream.
    pub fn remaining_features(&mut self) -> FeatureSet {
        self.feeder.finish();
        self.new_features()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn step_size(&self) -> usize {
        self.step_size
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Returns the cepstral bin range `[from, to]` searched for a peak.
    fn quefrency_range(&self, block_size: usize) -> (usize, usize) {
        let mut bin_from = (self.sample_rate / self.config.fmax) as usize;
        let mut bin_to = (self.sample_rate / self.config.fmin) as usize;

        if bin_to >= block_size / 2 {
            bin_to = block_size / 2 - 1;
        }
        if bin_from >= bin_to {
            // Only for degenerate sample rate / block size combinations
            bin_from = bin_to.saturating_sub(1);
        }
        (bin_from, bin_to)
    }

    fn new_features(&mut self) -> FeatureSet {
        let accepted = self.feeder.accepted_hypotheses();
        let mut features = FeatureSet::default();
        for hypothesis in &accepted[self.reported..] {
            add_features_from(hypothesis, &mut features);
        }
        self.reported = accepted.len();
        features
    }
}

fn add_features_from(hypothesis: &NoteHypothesis, features: &mut FeatureSet) {
    features
        .f0
        .extend(hypothesis.accepted_estimates().iter().map(|e| Feature {
            timestamp: e.timestamp,
            duration: None,
            frequency: e.frequency,
        }));

    let note = hypothesis.averaged_note();
    features.notes.push(Feature {
        timestamp: note.start,
        duration: Some(note.duration),
        frequency: note.frequency,
    });
}

/// Runs the whole chain over a mono signal: framing, spectrum, tracking.
///
/// Blocks of `block_size` samples are taken every `step_size` samples, each
/// timestamped at its centre. Trailing samples that do not fill a block are
/// ignored.
pub fn analyse_signal(
    samples: &[f32],
    sample_rate: f32,
    step_size: usize,
    block_size: usize,
    config: TrackerConfig,
) -> TrackerResult<FeatureSet> {
    let mut tracker = CepstralPitchTracker::new(sample_rate, config);
    tracker.initialise(1, step_size, block_size)?;
    let mut analyzer = SpectrumAnalyzer::new(block_size);

    let mut features = FeatureSet::default();
    let mut start = 0;
    while start + block_size <= samples.len() {
        let centre = (start + block_size / 2) as f64 / sample_rate as f64;
        let spectrum = analyzer.process(&samples[start..start + block_size]);
        features.extend(tracker.process(spectrum, Duration::from_secs_f64(centre))?);
        start += step_size;
    }
    features.extend(tracker.remaining_features());

    debug!(
        "analysed {} samples: {} notes, {} f0 points",
        samples.len(),
        features.notes.len(),
        features.f0.len()
    );
    Ok(features)
}
