//! # Note Value Types
//!
//! The two small value types that flow through the tracking engine:
//! a per-frame [`Estimate`] produced by the cepstral estimator, and the
//! [`Note`] summary derived from a satisfied hypothesis.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One frame's pitch observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    /// Estimated fundamental frequency in Hz.
    pub frequency: f64,
    /// Time of the analysis frame, measured from the start of the stream.
    pub timestamp: Duration,
    /// Dimensionless confidence. 0 means "no reliable pitch".
    pub confidence: f64,
}

impl Estimate {
    pub fn new(frequency: f64, timestamp: Duration, confidence: f64) -> Self {
        Estimate {
            frequency,
            timestamp,
            confidence,
        }
    }
}

impl Default for Estimate {
    fn default() -> Self {
        Estimate::new(0.0, Duration::ZERO, 1.0)
    }
}

/// A fixed-pitch note summarizing the estimates of one hypothesis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Mean frequency of the accepted estimates in Hz.
    pub frequency: f64,
    /// Timestamp of the first accepted estimate.
    pub start: Duration,
    /// Time from the first to the last accepted estimate.
    pub duration: Duration,
}

impl Note {
    pub fn new(frequency: f64, start: Duration, duration: Duration) -> Self {
        Note {
            frequency,
            start,
            duration,
        }
    }
}
