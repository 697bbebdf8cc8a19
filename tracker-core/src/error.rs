//! Error types for tracker configuration

use thiserror::Error;

/// Errors raised while configuring the pitch tracker.
///
/// The note tracking engine itself never fails: non-acceptance is reported
/// through hypothesis states instead.
#[derive(Debug, Error, PartialEq)]
pub enum TrackerError {
    /// Only mono input is supported
    #[error("Unsupported channel count: {0} (expected 1)")]
    UnsupportedChannelCount(usize),

    /// The cepstrum needs a power-of-two FFT size
    #[error("Block size must be a power of two of at least 4, got {0}")]
    InvalidBlockSize(usize),

    /// Step size must be non-zero and no larger than the block
    #[error("Invalid step size {step_size} for block size {block_size}")]
    InvalidStepSize { step_size: usize, block_size: usize },

    /// Invalid sample rate
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(f32),

    /// Invalid frequency range
    #[error("Invalid frequency range: {min} - {max} Hz")]
    InvalidFrequencyRange { min: f32, max: f32 },

    /// The smoothing filter must have an odd length
    #[error("Filter length must be odd, got {0}")]
    EvenFilterLength(usize),

    /// A block did not hold the `block_size/2 + 1` bins of the configured FFT
    #[error("Spectrum holds {actual} bins, expected {expected}")]
    InvalidSpectrumLength { expected: usize, actual: usize },

    /// Processing was attempted before `initialise`
    #[error("Tracker has not been initialised")]
    NotInitialised,
}

/// Result type for tracker operations
pub type TrackerResult<T> = Result<T, TrackerError>;
