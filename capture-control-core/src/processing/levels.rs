//! Audio level math for the volmeter feed.

/// Floor of the normalized loudness scale in dBFS.
pub const LOUDNESS_FLOOR_DB: f32 = -60.0;

/// RMS level of a buffer (0.0–1.0 for full-scale input).
pub fn rms_level(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Absolute peak of a buffer.
pub fn peak_level(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()))
}

/// Convert a linear amplitude to dBFS, clamped at the loudness floor.
pub fn to_dbfs(level: f32) -> f32 {
    if level <= 0.0 {
        return LOUDNESS_FLOOR_DB;
    }
    (20.0 * level.log10()).max(LOUDNESS_FLOOR_DB)
}

/// Map a linear amplitude onto the 0.0–1.0 loudness range reported by the volmeter.
///
/// `LOUDNESS_FLOOR_DB` maps to 0.0 and full scale to 1.0.
pub fn normalized_loudness(level: f32) -> f32 {
    let db = to_dbfs(level).min(0.0);
    (db - LOUDNESS_FLOOR_DB) / -LOUDNESS_FLOOR_DB
}
