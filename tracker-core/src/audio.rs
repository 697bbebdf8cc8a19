//! # Audio Capture Module
//!
//! Real-time audio capture using CPAL (Cross-Platform Audio Library).
//! Captured samples are downmixed to mono, cut into overlapping analysis
//! blocks and streamed to the analysis thread over a channel.
//!
//! ## Features
//! - Automatic input device selection
//! - Mono downmix of multi-channel devices
//! - Overlapping blocks (block size / step size) tagged with their position

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SupportedStreamConfigRange;
use crossbeam_channel::Sender;
use log::{error, info, warn};

/// Preferred capture sample rate in Hz.
pub const TARGET_SAMPLE_RATE: u32 = 44100;

/// One analysis block of mono samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBlock {
    /// Index of the first sample of the block since capture started.
    pub start_sample: u64,
    pub samples: Vec<f32>,
}

/// Cuts a continuous sample stream into overlapping blocks.
#[derive(Debug)]
pub struct BlockFramer {
    block_size: usize,
    step_size: usize,
    buffer: Vec<f32>,
    next_start: u64,
}

impl BlockFramer {
    pub fn new(block_size: usize, step_size: usize) -> Self {
        BlockFramer {
            block_size,
            step_size: step_size.max(1),
            buffer: Vec::with_capacity(block_size * 2),
            next_start: 0,
        }
    }

    /// Appends samples and calls `emit` for every block that is now full.
    pub fn push<F>(&mut self, samples: &[f32], mut emit: F)
    where
        F: FnMut(AudioBlock),
    {
        self.buffer.extend_from_slice(samples);

        while self.buffer.len() >= self.block_size {
            emit(AudioBlock {
                start_sample: self.next_start,
                samples: self.buffer[..self.block_size].to_vec(),
            });
            let step = self.step_size.min(self.buffer.len());
            self.buffer.drain(..step);
            self.next_start += step as u64;
        }
    }
}

/// Averages interleaved frames of `channels` samples down to mono.
pub fn downmix(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Starts audio capture from the default input device.
///
/// Blocks of `block_size` samples are sent every `step_size` samples. The
/// channel should be unbounded or generously sized: a block that cannot be
/// sent is dropped and logged.
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Audio stream handle (keep it alive) and sample rate
/// * `Err(e)` - No usable input device or format
pub fn start_audio_capture(
    sender: Sender<AudioBlock>,
    block_size: usize,
    step_size: usize,
) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    info!("Using audio input device: {}", device.name()?);

    let configs = device
        .supported_input_configs()
        .context("querying supported input configs")?
        .collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, TARGET_SAMPLE_RATE)
        .ok_or_else(|| anyhow!("No suitable f32 input format found"))?;

    let sample_rate = clamp_sample_rate(&supported_config, TARGET_SAMPLE_RATE);
    let config = supported_config.with_sample_rate(cpal::SampleRate(sample_rate));
    let channels = config.channels() as usize;
    let config: cpal::StreamConfig = config.into();

    info!("Selected sample rate: {} Hz, {} channel(s)", sample_rate, channels);

    let err_fn = |err| error!("An error occurred on the audio stream: {}", err);

    let mut framer = BlockFramer::new(block_size, step_size);

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            let mono = downmix(data, channels);
            framer.push(&mono, |block| {
                if sender.try_send(block).is_err() {
                    warn!("Analysis channel full or closed, dropping block");
                }
            });
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate))
}

/// Picks the f32 input configuration closest to the target sample rate,
/// preferring fewer channels.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let min_diff = (c.min_sample_rate().0 as i64 - target_rate as i64).abs();
            let max_diff = (c.max_sample_rate().0 as i64 - target_rate as i64).abs();
            let rate_diff = if (c.min_sample_rate().0..=c.max_sample_rate().0).contains(&target_rate)
            {
                0
            } else {
                min_diff.min(max_diff)
            };
            (rate_diff, c.channels())
        })
}

fn clamp_sample_rate(config: &SupportedStreamConfigRange, target_rate: u32) -> u32 {
    target_rate.clamp(config.min_sample_rate().0, config.max_sample_rate().0)
}
