//! # Cepstrum Module
//!
//! Converts one frequency-domain block into the real cepstrum: the inverse
//! FFT of the log magnitude spectrum. A periodic (pitched) signal has evenly
//! spaced harmonics, which show up as a peak in the cepstrum at the
//! quefrency of the fundamental period.

use crate::error::{TrackerError, TrackerResult};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Added to magnitudes before taking the log, so silent bins stay finite.
const EPSILON: f64 = 1e-10;

/// An n-point cepstrum converter. Owns its FFT plan and work buffers, so
/// repeated calls to [`process`](Cepstrum::process) do not allocate.
pub struct Cepstrum {
    size: usize,
    ifft: Arc<dyn Fft<f64>>,
    buffer: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
}

impl Cepstrum {
    /// Constructs a cepstrum converter based on an n-point FFT.
    /// `size` must be a power of two.
    pub fn new(size: usize) -> TrackerResult<Self> {
        if !size.is_power_of_two() {
            return Err(TrackerError::InvalidBlockSize(size));
        }

        let mut planner = FftPlanner::new();
        let ifft = planner.plan_fft_inverse(size);
        let scratch = vec![Complex::default(); ifft.get_inplace_scratch_len()];

        Ok(Cepstrum {
            size,
            ifft,
            buffer: vec![Complex::default(); size],
            scratch,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Converts `spectrum` to the cepstral domain.
    ///
    /// `spectrum` holds bins `0..=n/2` of an n-point FFT. The base-10 log
    /// magnitude spectrum is mirrored to make it symmetric, inverse
    /// transformed (scaled by 1/n) and the real part written to `out`,
    /// which must hold n values.
    ///
    /// Returns the mean magnitude of the input bins.
    ///
    /// # Panics
    /// * If `spectrum` does not hold n/2+1 bins or `out` does not hold n values
    pub fn process(&mut self, spectrum: &[Complex<f32>], out: &mut [f64]) -> f64 {
        let n = self.size;
        let half = n / 2 + 1;
        assert_eq!(spectrum.len(), half, "spectrum must hold n/2+1 bins");
        assert_eq!(out.len(), n, "output must hold n values");

        let mut magnitude_sum = 0.0;
        for (i, bin) in spectrum.iter().enumerate() {
            let re = bin.re as f64;
            let im = bin.im as f64;
            let magnitude = (re * re + im * im).sqrt();
            magnitude_sum += magnitude;

            let log_magnitude = Complex::new((magnitude + EPSILON).log10(), 0.0);
            self.buffer[i] = log_magnitude;
            if i > 0 {
                // Mirror to make the log magnitude spectrum symmetric
                self.buffer[n - i] = log_magnitude;
            }
        }

        self.ifft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        let scale = 1.0 / n as f64;
        for (value, c) in out.iter_mut().zip(self.buffer.iter()) {
            *value = c.re * scale;
        }

        magnitude_sum / half as f64
    }
}
