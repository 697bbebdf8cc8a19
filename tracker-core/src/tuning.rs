//! # Musical Tuning Module
//!
//! Equal temperament helpers used by the tracker and its front ends:
//! interval measurement in cents, and mapping a frequency onto the nearest
//! key of a standard 88-key piano for labelling detected notes.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Represents a single equal-tempered key with its name and frequency.
#[derive(Debug, Clone)]
pub struct Key {
    /// Note name (e.g., "A4", "C#3")
    pub name: String,
    /// Frequency in Hz
    pub frequency: f64,
}

/// Statically computed keys for a standard 88-key piano (A0 to C8),
/// equal temperament with A4 = 440 Hz.
static KEYS: Lazy<Vec<Key>> = Lazy::new(|| {
    const NOTE_NAMES: [&str; 12] = [
        "A", "A#", "B", "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#",
    ];

    (0..88)
        .map(|i| {
            // A4 is the 49th key, index 48
            let frequency = 440.0 * 2.0_f64.powf((i as f64 - 48.0) / 12.0);
            // The octave number changes at C
            let octave = (i + 9) / 12;
            Key {
                name: format!("{}{}", NOTE_NAMES[i % 12], octave),
                frequency,
            }
        })
        .collect()
});

/// Note name to key index.
static KEY_MAP: Lazy<BTreeMap<String, u8>> = Lazy::new(|| {
    KEYS.iter()
        .enumerate()
        .map(|(i, key)| (key.name.clone(), i as u8))
        .collect()
});

/// Returns the interval from `reference` to `freq` in cents.
///
/// 100 cents = 1 semitone, 1200 cents = 1 octave. Positive when `freq` is
/// above the reference. Non-positive inputs give a non-finite result.
pub fn cents_between(freq: f64, reference: f64) -> f64 {
    1200.0 * (freq / reference).log2()
}

/// Finds the closest piano key to a given frequency.
///
/// # Returns
/// * `(note_name, target_frequency)` of the nearest key
pub fn find_nearest_note(freq: f64) -> (String, f64) {
    let closest = KEYS
        .iter()
        .min_by(|a, b| {
            let diff_a = cents_between(freq, a.frequency).abs();
            let diff_b = cents_between(freq, b.frequency).abs();
            diff_a.total_cmp(&diff_b)
        })
        .unwrap_or(&KEYS[0]);

    (closest.name.clone(), closest.frequency)
}

/// Gets the 88-key index from a note name such as "A4" or "C#3".
pub fn key_index_from_name(name: &str) -> Option<u8> {
    KEY_MAP.get(name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn octave_is_1200_cents() {
        assert_abs_diff_eq!(cents_between(880.0, 440.0), 1200.0, epsilon = 1e-9);
        assert_abs_diff_eq!(cents_between(220.0, 440.0), -1200.0, epsilon = 1e-9);
        assert_eq!(cents_between(440.0, 440.0), 0.0);
    }

    #[test]
    fn zero_reference_is_not_finite() {
        assert!(!cents_between(440.0, 0.0).is_finite());
        assert!(cents_between(0.0, 0.0).is_nan());
    }

    #[test]
    fn nearest_note() {
        let (name, freq) = find_nearest_note(442.0);
        assert_eq!(name, "A4");
        assert_abs_diff_eq!(freq, 440.0, epsilon = 1e-9);

        let (name, _) = find_nearest_note(261.0);
        assert_eq!(name, "C4");

        let (name, _) = find_nearest_note(10.0);
        assert_eq!(name, "A0");
    }

    #[test]
    fn key_lookup() {
        assert_eq!(key_index_from_name("A0"), Some(0));
        assert_eq!(key_index_from_name("A4"), Some(48));
        assert_eq!(key_index_from_name("C8"), Some(87));
        assert_eq!(key_index_from_name("H2"), None);
    }
}
