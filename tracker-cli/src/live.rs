//! Live tracking from the default input device.
//!
//! Capture and analysis run on a dedicated worker thread which owns the cpal
//! stream. Finalized features come back to the main thread over a channel
//! and are printed as they arrive; the main thread stops the worker once the
//! requested duration has elapsed.

use crate::report;
use anyhow::{anyhow, Context, Result};
use cpal::traits::StreamTrait;
use crossbeam_channel::{Receiver, Sender};
use log::{debug, error, info, warn};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracker_core::audio::{self, AudioBlock};
use tracker_core::fft::SpectrumAnalyzer;
use tracker_core::{CepstralPitchTracker, FeatureSet, TrackerConfig};

/// Handle on the capture/analysis thread.
struct TrackerWorker {
    shutdown_tx: Sender<()>,
    thread_handle: Option<JoinHandle<Result<()>>>,
}

impl TrackerWorker {
    fn spawn(
        config: TrackerConfig,
        block_size: usize,
        step_size: usize,
        features_tx: Sender<FeatureSet>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
        let thread_handle = thread::spawn(move || {
            track_input(config, block_size, step_size, features_tx, shutdown_rx)
        });
        TrackerWorker {
            shutdown_tx,
            thread_handle: Some(thread_handle),
        }
    }

    /// Signals the worker and waits for it to flush and exit.
    fn stop(&mut self) -> Result<()> {
        // The worker may already have exited on a capture error
        let _ = self.shutdown_tx.try_send(());
        match self.thread_handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| anyhow!("tracker thread panicked"))?,
            None => Ok(()),
        }
    }
}

impl Drop for TrackerWorker {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!("Stopping tracker thread: {:#}", e);
        }
    }
}

/// Tracks the default input device for `seconds` and returns everything
/// the tracker produced.
pub fn run(
    config: TrackerConfig,
    block_size: usize,
    step_size: usize,
    seconds: f64,
) -> Result<FeatureSet> {
    let (features_tx, features_rx) = crossbeam_channel::unbounded();
    let mut worker = TrackerWorker::spawn(config, block_size, step_size, features_tx);

    info!("Listening for {:.1} s", seconds);
    let deadline = crossbeam_channel::after(Duration::from_secs_f64(seconds));
    let mut collected = FeatureSet::default();

    loop {
        crossbeam_channel::select! {
            recv(features_rx) -> msg => match msg {
                Ok(features) => print_and_collect(features, &mut collected),
                // Worker gone before the deadline: capture failed
                Err(_) => break,
            },
            recv(deadline) -> _ => {
                debug!("Deadline reached, stopping capture");
                break;
            },
        }
    }

    worker.stop()?;
    // Features flushed by the worker on shutdown
    for features in features_rx.try_iter() {
        print_and_collect(features, &mut collected);
    }
    Ok(collected)
}

fn print_and_collect(features: FeatureSet, collected: &mut FeatureSet) {
    for note in &features.notes {
        println!("{}", report::describe_note(note));
    }
    collected.extend(features);
}

fn track_input(
    config: TrackerConfig,
    block_size: usize,
    step_size: usize,
    features_tx: Sender<FeatureSet>,
    shutdown_rx: Receiver<()>,
) -> Result<()> {
    let (block_tx, block_rx) = crossbeam_channel::unbounded::<AudioBlock>();
    let (stream, sample_rate) = audio::start_audio_capture(block_tx, block_size, step_size)
        .context("starting audio capture")?;

    let mut tracker = CepstralPitchTracker::new(sample_rate as f32, config);
    tracker
        .initialise(1, step_size, block_size)
        .context("initialising tracker")?;
    let mut analyzer = SpectrumAnalyzer::new(block_size);
    let started = Instant::now();

    loop {
        crossbeam_channel::select! {
            recv(block_rx) -> msg => match msg {
                Ok(block) => {
                    let centre = block.start_sample + (block_size / 2) as u64;
                    let timestamp = Duration::from_secs_f64(centre as f64 / sample_rate as f64);
                    let spectrum = analyzer.process(&block.samples);
                    let features = tracker.process(spectrum, timestamp)?;
                    if !features.is_empty() && features_tx.send(features).is_err() {
                        warn!("Feature receiver closed");
                        break;
                    }
                },
                Err(_) => {
                    warn!("Audio channel closed");
                    break;
                },
            },
            recv(shutdown_rx) -> _ => {
                debug!("Received shutdown signal");
                break;
            },
        }
    }

    stream.pause().ok();
    drop(stream);
    debug!("Captured {:.2} s of audio", started.elapsed().as_secs_f64());

    let remaining = tracker.remaining_features();
    if !remaining.is_empty() {
        // The receiver may be gone if the main thread is unwinding
        let _ = features_tx.send(remaining);
    }
    Ok(())
}
