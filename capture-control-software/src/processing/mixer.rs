//! Stereo buffer math for the software audio pipeline.
//!
//! All buffers are interleaved stereo `[L0, R0, L1, R1, ...]` at the
//! engine's fixed output rate.

/// Per-source processing applied before mixing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceGain {
    pub volume: f32,
    pub muted: bool,
    pub force_mono: bool,
}

impl Default for SourceGain {
    fn default() -> Self {
        Self {
            volume: 1.0,
            muted: false,
            force_mono: false,
        }
    }
}

/// Interleave two mono channels; the shorter one is padded with silence.
pub fn interleave(left: &[f32], right: &[f32]) -> Vec<f32> {
    let frame_count = left.len().max(right.len());
    let mut stereo = vec![0.0f32; frame_count * 2];
    for i in 0..frame_count {
        stereo[i * 2] = left.get(i).copied().unwrap_or(0.0);
        stereo[i * 2 + 1] = right.get(i).copied().unwrap_or(0.0);
    }
    stereo
}

/// Replace both channels of every frame with their average.
pub fn fold_to_mono(stereo: &mut [f32]) {
    for frame in stereo.chunks_exact_mut(2) {
        let mid = (frame[0] + frame[1]) * 0.5;
        frame[0] = mid;
        frame[1] = mid;
    }
}

/// Apply mono folding, volume and mute in place.
pub fn apply_gain(stereo: &mut [f32], gain: &SourceGain) {
    if gain.muted {
        stereo.fill(0.0);
        return;
    }
    if gain.force_mono {
        fold_to_mono(stereo);
    }
    if (gain.volume - 1.0).abs() > f32::EPSILON {
        for sample in stereo.iter_mut() {
            *sample *= gain.volume;
        }
    }
}

/// Add `source` into `bus`. Samples past the end of `bus` are ignored.
pub fn mix_into(bus: &mut [f32], source: &[f32]) {
    for (out, sample) in bus.iter_mut().zip(source) {
        *out += sample;
    }
}

/// Convert f32 samples `[-1.0, 1.0]` to 16-bit little-endian PCM, clamping.
pub fn convert_to_int16_pcm(samples: &[f32]) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        data.extend_from_slice(&value.to_le_bytes());
    }
    data
}

/// Decode 16-bit little-endian PCM back to f32.
pub fn int16_pcm_to_f32(pcm: &[u8]) -> Vec<f32> {
    pcm.chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / i16::MAX as f32)
        .collect()
}
