//! Runs the full chain (spectrum, cepstrum, tracking) over generated
//! harmonic tones.

use approx::assert_relative_eq;
use std::time::Duration;
use tracker_core::tracker::{DEFAULT_BLOCK_SIZE, DEFAULT_STEP_SIZE};
use tracker_core::{analyse_signal, TrackerConfig};

const SAMPLE_RATE: f32 = 44100.0;

/// A band-limited sawtooth: every harmonic below Nyquist at amplitude 1/k.
fn sawtooth(frequency: f32, seconds: f32) -> Vec<f32> {
    let count = (SAMPLE_RATE * seconds) as usize;
    let harmonics = ((SAMPLE_RATE / 2.0) / frequency) as usize;
    (0..count)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            let value: f32 = (1..=harmonics)
                .filter(|k| *k as f32 * frequency < SAMPLE_RATE / 2.0)
                .map(|k| (2.0 * std::f32::consts::PI * k as f32 * frequency * t).sin() / k as f32)
                .sum();
            0.3 * value
        })
        .collect()
}

#[test]
fn steady_tone_gives_one_note() {
    let signal = sawtooth(220.0, 1.0);
    let features = analyse_signal(
        &signal,
        SAMPLE_RATE,
        DEFAULT_STEP_SIZE,
        DEFAULT_BLOCK_SIZE,
        TrackerConfig::default(),
    )
    .expect("default layout is valid");

    assert_eq!(features.notes.len(), 1);
    let note = &features.notes[0];
    assert_relative_eq!(note.frequency, 220.0, max_relative = 0.02);
    assert!(note.timestamp < Duration::from_millis(100));
    assert!(note.duration.expect("notes have a duration") > Duration::from_millis(800));

    assert!(!features.f0.is_empty());
    for point in &features.f0 {
        assert_relative_eq!(point.frequency, 220.0, max_relative = 0.02);
        assert!(point.duration.is_none());
    }
}

#[test]
fn tones_separated_by_silence_give_two_notes() {
    let mut signal = sawtooth(220.0, 0.5);
    signal.extend(std::iter::repeat(0.0).take((SAMPLE_RATE * 0.3) as usize));
    signal.extend(sawtooth(330.0, 0.5));

    let features = analyse_signal(
        &signal,
        SAMPLE_RATE,
        DEFAULT_STEP_SIZE,
        DEFAULT_BLOCK_SIZE,
        TrackerConfig::default(),
    )
    .expect("default layout is valid");

    assert_eq!(features.notes.len(), 2);
    assert_relative_eq!(features.notes[0].frequency, 220.0, max_relative = 0.02);
    assert_relative_eq!(features.notes[1].frequency, 330.0, max_relative = 0.02);
    assert!(features.notes[0].timestamp < features.notes[1].timestamp);
    assert!(features.notes[1].timestamp > Duration::from_millis(700));
}

#[test]
fn silence_gives_nothing() {
    let signal = vec![0.0; SAMPLE_RATE as usize];
    let features = analyse_signal(
        &signal,
        SAMPLE_RATE,
        DEFAULT_STEP_SIZE,
        DEFAULT_BLOCK_SIZE,
        TrackerConfig::default(),
    )
    .expect("default layout is valid");
    assert!(features.is_empty());
}

#[test]
fn invalid_layout_is_reported() {
    let signal = vec![0.0; 4096];
    assert!(analyse_signal(&signal, SAMPLE_RATE, 256, 1000, TrackerConfig::default()).is_err());
}
