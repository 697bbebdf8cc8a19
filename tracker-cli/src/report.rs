use anyhow::{Context, Result};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracker_core::tuning::{cents_between, find_nearest_note, key_index_from_name};
use tracker_core::{Feature, FeatureSet, TrackerConfig};

/// One human-readable line for a finalized note: onset, length, frequency
/// and the nearest piano key with the deviation from it.
pub fn describe_note(note: &Feature) -> String {
    let (name, target) = find_nearest_note(note.frequency);
    let key = key_index_from_name(&name)
        .map(|i| format!(" (key {})", i + 1))
        .unwrap_or_default();
    format!(
        "{:>8.3} s  {:>7.3} s  {:>8.2} Hz  {}{} {:+.1} cents",
        note.timestamp.as_secs_f64(),
        note.duration.unwrap_or_default().as_secs_f64(),
        note.frequency,
        name,
        key,
        cents_between(note.frequency, target)
    )
}

/// Loads tracker parameters from a JSON file.
pub fn load_config(path: &Path) -> Result<TrackerConfig> {
    let mut file =
        File::open(path).with_context(|| format!("opening config {}", path.display()))?;
    let mut data = String::new();
    file.read_to_string(&mut data)?;
    let config: TrackerConfig = serde_json::from_str(&data)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}

/// Writes the features as pretty-printed JSON.
pub fn save_features(features: &FeatureSet, path: &Path) -> Result<()> {
    let json_string = serde_json::to_string_pretty(features)?;
    let mut file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    file.write_all(json_string.as_bytes())?;
    Ok(())
}
