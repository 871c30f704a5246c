//! Low Frequency Oscillator for modulation
//!
//! Provides slow modulation for pitch, filter, and amplitude. Output passes
//! through a one-pole smoother at twice the LFO rate so square and
//! sample-and-hold shapes do not step the modulated parameters audibly.

use super::OnePole;
use std::f32::consts::PI;

/// LFO waveform shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LfoShape {
    Sine,
    Triangle,
    Saw,
    Square,
    SampleAndHold,
}

impl LfoShape {
    /// Parse a shape from its lowercase name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sine" => Some(Self::Sine),
            "triangle" => Some(Self::Triangle),
            "saw" | "sawtooth" => Some(Self::Saw),
            "square" => Some(Self::Square),
            "sample_and_hold" | "random" => Some(Self::SampleAndHold),
            _ => None,
        }
    }
}

/// Low Frequency Oscillator
pub struct Lfo {
    shape: LfoShape,
    frequency: f32,
    phase: f32,
    sample_rate: f32,
    /// Depth of modulation (0.0 to 1.0)
    depth: f32,
    /// Output smoothing at 2x the LFO rate
    smoother: OnePole,
    /// Last sample-and-hold value
    sh_value: f32,
    /// RNG state for S&H
    rng_state: u64,
}

impl Lfo {
    /// Create a new LFO
    pub fn new(sample_rate: f32) -> Self {
        let frequency = 0.5;
        Self {
            shape: LfoShape::Sine,
            frequency,
            phase: 0.0,
            sample_rate,
            depth: 1.0,
            smoother: OnePole::new(sample_rate, frequency * 2.0),
            sh_value: 0.0,
            rng_state: 12345,
        }
    }

    /// Set LFO frequency in Hz
    pub fn set_frequency(&mut self, hz: f32) {
        self.frequency = hz.clamp(0.01, 100.0);
        self.smoother.set_cutoff(self.frequency * 2.0);
    }

    /// Get LFO frequency
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Set modulation depth (0.0 to 1.0)
    pub fn set_depth(&mut self, depth: f32) {
        self.depth = depth.clamp(0.0, 1.0);
    }

    /// Get modulation depth
    pub fn depth(&self) -> f32 {
        self.depth
    }

    /// Set LFO shape
    pub fn set_shape(&mut self, shape: LfoShape) {
        self.shape = shape;
    }

    /// Get LFO shape
    pub fn shape(&self) -> LfoShape {
        self.shape
    }

    /// Reset phase
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.smoother.reset();
    }

    /// Generate next sample (-1.0 to 1.0, scaled by depth, smoothed)
    pub fn process(&mut self) -> f32 {
        let raw = match self.shape {
            LfoShape::Sine => (self.phase * 2.0 * PI).sin(),
            LfoShape::Triangle => {
                if self.phase < 0.25 {
                    4.0 * self.phase
                } else if self.phase < 0.75 {
                    2.0 - 4.0 * self.phase
                } else {
                    4.0 * self.phase - 4.0
                }
            }
            LfoShape::Saw => 2.0 * self.phase - 1.0,
            LfoShape::Square => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            LfoShape::SampleAndHold => {
                // Update value at phase wrap
                if self.phase < self.frequency / self.sample_rate {
                    self.sh_value = self.random();
                }
                self.sh_value
            }
        };

        // Advance phase
        self.phase += self.frequency / self.sample_rate;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        self.smoother.process(raw) * self.depth
    }

    /// Simple RNG for sample-and-hold
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
    fn test_lfo_creation() {
        let lfo = Lfo::new(44100.0);
        assert_eq!(lfo.frequency(), 0.5);
        assert_eq!(lfo.depth(), 1.0);
        assert_eq!(lfo.shape(), LfoShape::Sine);
    }

    #[test]
    fn test_lfo_sine_range() {
        let mut lfo = Lfo::new(44100.0);
        lfo.set_shape(LfoShape::Sine);
        lfo.set_frequency(1.0);

        for _ in 0..44100 {
            let sample = lfo.process();
            assert!((-1.0..=1.0).contains(&sample));
        }
    }

    #[test]
    fn test_lfo_depth() {
        let mut lfo = Lfo::new(44100.0);
        lfo.set_depth(0.5);
        lfo.set_shape(LfoShape::Square);

        for _ in 0..1000 {
            let sample = lfo.process();
            assert!(sample.abs() <= 0.5);
        }
    }

    #[test]
    fn test_lfo_square_is_smoothed() {
        let mut lfo = Lfo::new(44100.0);
        lfo.set_shape(LfoShape::Square);
        lfo.set_frequency(2.0);

        // The smoothed square should never jump a full step between samples
        let mut prev = lfo.process();
        for _ in 0..44100 {
            let sample = lfo.process();
            assert!((sample - prev).abs() < 0.1, "step too large: {} -> {}", prev, sample);
            prev = sample;
        }
    }

    #[test]
    fn test_lfo_frequency_clamping() {
        let mut lfo = Lfo::new(44100.0);

        lfo.set_frequency(0.001);
        assert_eq!(lfo.frequency(), 0.01);

        lfo.set_frequency(200.0);
        assert_eq!(lfo.frequency(), 100.0);
    }
}
