// tracker-core/src/lib.rs

//! The core logic for the cepstral pitch tracker.
//! This crate estimates the fundamental frequency of monophonic audio from
//! successive spectra and groups consistent estimates into notes. It is
//! completely headless: hosts feed it frequency-domain blocks and collect
//! the features it emits.
//!
//! The note tracking engine is [`hypothesis::NoteHypothesis`] (one
//! candidate note) and [`feeder::AgentFeeder`] (arbitration between
//! competing candidates). Everything else turns audio into the per-frame
//! [`note::Estimate`] records the engine consumes.

pub mod audio;
pub mod cepstrum;
pub mod feeder;
pub mod fft;
pub mod hypothesis;
pub mod note;
pub mod peak;
pub mod tracker;
pub mod tuning;

mod error;

pub use error::{TrackerError, TrackerResult};
pub use feeder::AgentFeeder;
pub use hypothesis::{NoteHypothesis, State};
pub use note::{Estimate, Note};
pub use tracker::{analyse_signal, CepstralPitchTracker, TrackerConfig};

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A single timestamped output value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Time of the feature from the start of the stream.
    pub timestamp: Duration,
    /// Present for notes, absent for instantaneous f0 values.
    pub duration: Option<Duration>,
    /// Frequency in Hz.
    pub frequency: f64,
}

/// The features emitted by one call into the tracker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    /// Estimated fundamental frequency, one value per accepted estimate.
    pub f0: Vec<Feature>,
    /// Derived fixed-pitch notes, one per finalized hypothesis.
    pub notes: Vec<Feature>,
}

impl FeatureSet {
    pub fn is_empty(&self) -> bool {
        self.f0.is_empty() && self.notes.is_empty()
    }

    /// Appends the features of `other`, keeping output order.
    pub fn extend(&mut self, other: FeatureSet) {
        self.f0.extend(other.f0);
        self.notes.extend(other.notes);
    }
}
