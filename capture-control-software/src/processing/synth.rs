use std::f32::consts::TAU;

use crate::processing::mixer;

/// Test-signal generator standing in for a capture device.
///
/// Produces a sine tone (louder on the left) plus low-level noise, so
/// force-mono and noise suppression have an audible effect.
#[derive(Debug, Clone)]
pub struct ToneGenerator {
    frequency: f32,
    sample_rate: f32,
    phase: f32,
    noise_state: u32,
}

const LEFT_AMPLITUDE: f32 = 0.5;
const RIGHT_AMPLITUDE: f32 = 0.25;
const NOISE_AMPLITUDE: f32 = 0.05;

impl ToneGenerator {
    pub fn new(frequency: f32, sample_rate: u32, seed: u32) -> Self {
        Self {
            frequency,
            sample_rate: sample_rate as f32,
            phase: 0.0,
            noise_state: seed.max(1),
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Next noise sample in `[-NOISE_AMPLITUDE, NOISE_AMPLITUDE]`.
    fn next_noise(&mut self) -> f32 {
        self.noise_state = self.noise_state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let unit = (self.noise_state >> 8) as f32 / (1u32 << 24) as f32;
        (unit * 2.0 - 1.0) * NOISE_AMPLITUDE
    }

    /// Render `frames` stereo frames. Noise is left out when `suppress_noise`.
    pub fn render(&mut self, frames: usize, suppress_noise: bool) -> Vec<f32> {
        let step = TAU * self.frequency / self.sample_rate;
        let mut left = Vec::with_capacity(frames);
        let mut right = Vec::with_capacity(frames);
        for _ in 0..frames {
            let tone = self.phase.sin();
            self.phase = (self.phase + step) % TAU;
            let noise = self.next_noise();
            let noise = if suppress_noise { 0.0 } else { noise };
            left.push(tone * LEFT_AMPLITUDE + noise);
            right.push(tone * RIGHT_AMPLITUDE + noise);
        }
        mixer::interleave(&left, &right)
    }
}
