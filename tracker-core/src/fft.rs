//! # Fast Fourier Transform (FFT) Module
//!
//! The spectrum front end: turns a block of time-domain samples into the
//! frequency-domain block the pitch tracker consumes, the way an analysis
//! host would before calling the tracker.
//!
//! ## Features
//! - FFT using RustFFT, planned once per analyzer
//! - DC offset removal
//! - Hann windowing for reduced spectral leakage
//! - Returns only the non-redundant bins `0..=n/2`

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Removes the DC offset from a signal by making its average value zero.
fn remove_dc_offset(signal: &mut [f32]) {
    let len = signal.len();
    if len == 0 {
        return;
    }
    let avg = signal.iter().sum::<f32>() / len as f32;
    if avg.abs() > 1e-6 {
        for sample in signal.iter_mut() {
            *sample -= avg;
        }
    }
}

/// Computes a periodic Hann window of length `n`.
fn hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n as f32).cos()))
        .collect()
}

/// Forward FFT of fixed-size blocks, with the plan, window and work
/// buffers allocated once up front.
pub struct SpectrumAnalyzer {
    block_size: usize,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    frame: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl SpectrumAnalyzer {
    pub fn new(block_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(block_size);
        let scratch = vec![Complex::default(); fft.get_inplace_scratch_len()];

        SpectrumAnalyzer {
            block_size,
            fft,
            window: hann_window(block_size),
            frame: vec![0.0; block_size],
            buffer: vec![Complex::default(); block_size],
            scratch,
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Transforms one block of samples and returns bins `0..=n/2`.
    ///
    /// The signal is DC-corrected and Hann windowed before the transform.
    ///
    /// # Panics
    /// * If `frame` length is not equal to the block size
    pub fn process(&mut self, frame: &[f32]) -> &[Complex<f32>] {
        if frame.len() != self.block_size {
            panic!(
                "Input frame size {} must be equal to the block size {}",
                frame.len(),
                self.block_size
            );
        }

        self.frame.copy_from_slice(frame);
        remove_dc_offset(&mut self.frame);

        for ((out, sample), w) in self
            .buffer
            .iter_mut()
            .zip(self.frame.iter())
            .zip(self.window.iter())
        {
            *out = Complex {
                re: sample * w,
                im: 0.0,
            };
        }

        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);
        &self.buffer[..self.block_size / 2 + 1]
    }
}
