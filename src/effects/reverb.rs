//! Sparse convolution reverb
//!
//! Convolves the input with a generated impulse: a set of taps at increasing
//! delays with exponentially decaying, sign-randomized gains. Room size
//! scales the impulse length; changing it regenerates the tap set.

use crate::dsp::DelayLine;

/// Number of taps in the generated impulse
const TAP_COUNT: usize = 48;

/// Impulse length range in seconds, mapped from room size 0..1
const MIN_IMPULSE_SECS: f32 = 0.08;
const MAX_IMPULSE_SECS: f32 = 0.4;

struct Tap {
    delay_secs: f32,
    gain: f32,
}

/// Reverb effect
pub struct Reverb {
    line: DelayLine,
    taps: Vec<Tap>,
    wet: f32,
    room_size: f32,
    rng_state: u64,
}

impl Reverb {
    pub fn new(sample_rate: f32) -> Self {
        let mut reverb = Self {
            line: DelayLine::new(sample_rate, MAX_IMPULSE_SECS + 0.01),
            taps: Vec::new(),
            wet: 0.0,
            room_size: 0.5,
            rng_state: 0x9e3779b9,
        };
        reverb.generate_impulse();
        reverb
    }

    pub fn set_wet(&mut self, wet: f32) {
        self.wet = wet.clamp(0.0, 1.0);
    }

    /// Set room size (0.0-1.0). Regenerates the impulse when it changes.
    pub fn set_room_size(&mut self, room_size: f32) {
        let room_size = room_size.clamp(0.0, 1.0);
        if (room_size - self.room_size).abs() > f32::EPSILON {
            self.room_size = room_size;
            self.generate_impulse();
        }
    }

    /// Rebuild the tap set for the current room size
    fn generate_impulse(&mut self) {
        let length = MIN_IMPULSE_SECS + (MAX_IMPULSE_SECS - MIN_IMPULSE_SECS) * self.room_size;

        self.taps.clear();
        for i in 0..TAP_COUNT {
            // Taps cluster early: quadratic spacing with a random jitter
            let t = (i as f32 + 0.5) / TAP_COUNT as f32;
            let jitter = self.random() * 0.5 / TAP_COUNT as f32;
            let delay_secs = (length * (t * t + jitter)).clamp(0.001, length);

            // Exponential decay, random sign, normalized so total energy
            // stays roughly constant across room sizes
            let decay = (-4.0 * delay_secs / length).exp();
            let sign = if self.random() < 0.0 { -1.0 } else { 1.0 };
            self.taps.push(Tap {
                delay_secs,
                gain: sign * decay / (TAP_COUNT as f32).sqrt(),
            });
        }
    }

    /// Process a single sample (wet/dry mixed)
    pub fn process(&mut self, input: f32) -> f32 {
        self.line.write(input);

        let mut wet = 0.0;
        for tap in &self.taps {
            wet += self.line.read(tap.delay_secs) * tap.gain;
        }

        input * (1.0 - self.wet) + wet * self.wet
    }

    pub fn reset(&mut self) {
        self.line.reset();
    }

    fn random(&mut self) -> f32 {
        let mut x = self.rng_state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.rng_state = x;
        (x as f64 / u64::MAX as f64) as f32 * 2.0 - 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverb_dry_at_zero_wet() {
        let mut reverb = Reverb::new(44100.0);
        reverb.set_wet(0.0);

        let out = reverb.process(0.5);
        assert_eq!(out, 0.5);
    }

    #[test]
    fn test_reverb_produces_tail() {
        let mut reverb = Reverb::new(44100.0);
        reverb.set_wet(1.0);
        reverb.set_room_size(1.0);

        reverb.process(1.0);
        let mut tail = 0.0f32;
        for _ in 0..(44100.0 * 0.3) as usize {
            tail = tail.max(reverb.process(0.0).abs());
        }
        assert!(tail > 0.0, "expected a reverb tail");
    }

    #[test]
    fn test_reverb_room_size_changes_impulse() {
        let mut reverb = Reverb::new(44100.0);
        reverb.set_room_size(0.1);
        let small: Vec<f32> = reverb.taps.iter().map(|t| t.delay_secs).collect();

        reverb.set_room_size(0.9);
        let large: Vec<f32> = reverb.taps.iter().map(|t| t.delay_secs).collect();

        assert!(large.last().unwrap() > small.last().unwrap());
    }

    #[test]
    fn test_reverb_tap_delays_within_line() {
        let reverb = Reverb::new(44100.0);
        let max = reverb.line.max_delay_secs();
        for tap in &reverb.taps {
            assert!(tap.delay_secs < max);
        }
    }
}
