//! Basic oscillator implementation

use std::f32::consts::PI;

/// Waveform types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Saw,
    Square,
    /// White noise (uniform random)
    WhiteNoise,
}

impl Waveform {
    /// Parse a waveform from its lowercase name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sine" => Some(Self::Sine),
            "triangle" => Some(Self::Triangle),
            "saw" | "sawtooth" => Some(Self::Saw),
            "square" => Some(Self::Square),
            "noise" | "white_noise" => Some(Self::WhiteNoise),
            _ => None,
        }
    }
}

/// A basic oscillator that generates waveforms
pub struct Oscillator {
    waveform: Waveform,
    phase: f32,
    frequency: f32,
    sample_rate: f32,
    /// Simple RNG state (xorshift)
    rng_state: u64,
}

impl Oscillator {
    /// Create a new oscillator
    pub fn new(waveform: Waveform, frequency: f32, sample_rate: f32) -> Self {
        Self {
            waveform,
            phase: 0.0,
            frequency,
            sample_rate,
            // Seed must be non-zero for xorshift
            rng_state: ((frequency * 1000.0) as u64).max(1),
        }
    }

    /// Set the frequency
    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
    }

    /// Get the current frequency
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Reset the phase
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Generate the next sample
    pub fn generate(&mut self) -> f32 {
        let sample = match self.waveform {
            Waveform::Sine => self.sine(),
            Waveform::Triangle => self.triangle(),
            Waveform::Saw => self.saw(),
            Waveform::Square => self.square(),
            Waveform::WhiteNoise => self.random(),
        };

        self.phase += self.frequency / self.sample_rate;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        sample
    }

    fn sine(&self) -> f32 {
        (self.phase * 2.0 * PI).sin()
    }

    fn triangle(&self) -> f32 {
        let p = self.phase;
        if p < 0.25 {
            4.0 * p
        } else if p < 0.75 {
            2.0 - 4.0 * p
        } else {
            4.0 * p - 4.0
        }
    }

    fn saw(&self) -> f32 {
        2.0 * self.phase - 1.0
    }

    fn square(&self) -> f32 {
        if self.phase < 0.5 {
            1.0
        } else {
            -1.0
        }
    }

    /// Xorshift noise, mapped to -1.0..1.0
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
    fn test_sine_oscillator() {
        let mut osc = Oscillator::new(Waveform::Sine, 440.0, 44100.0);

        // First sample should be 0 (sin(0))
        let sample = osc.generate();
        assert!((sample - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_square_oscillator() {
        let mut osc = Oscillator::new(Waveform::Square, 1.0, 4.0);

        // 4 samples per cycle at 1 Hz, 4 Hz sample rate
        assert_eq!(osc.generate(), 1.0); // phase 0.0
        assert_eq!(osc.generate(), 1.0); // phase 0.25
        assert_eq!(osc.generate(), -1.0); // phase 0.5
        assert_eq!(osc.generate(), -1.0); // phase 0.75
    }

    #[test]
    fn test_saw_oscillator() {
        let mut osc = Oscillator::new(Waveform::Saw, 1.0, 4.0);

        // Saw goes from -1 to 1 linearly
        assert_eq!(osc.generate(), -1.0); // phase 0.0
        assert_eq!(osc.generate(), -0.5); // phase 0.25
        assert_eq!(osc.generate(), 0.0); // phase 0.5
        assert_eq!(osc.generate(), 0.5); // phase 0.75
    }

    #[test]
    fn test_frequency_change() {
        let mut osc = Oscillator::new(Waveform::Sine, 440.0, 44100.0);
        assert_eq!(osc.frequency(), 440.0);

        osc.set_frequency(880.0);
        assert_eq!(osc.frequency(), 880.0);
    }

    #[test]
    fn test_white_noise() {
        let mut osc = Oscillator::new(Waveform::WhiteNoise, 440.0, 44100.0);

        // Generate samples and check they're in range
        let mut sum = 0.0;
        for _ in 0..1000 {
            let sample = osc.generate();
            assert!(
                (-1.0..=1.0).contains(&sample),
                "Sample out of range: {}",
                sample
            );
            sum += sample;
        }

        // Mean should be close to 0 for uniform noise
        let mean = sum / 1000.0;
        assert!(mean.abs() < 0.1, "Mean too far from 0: {}", mean);
    }

    #[test]
    fn test_waveform_from_name() {
        assert_eq!(Waveform::from_name("sine"), Some(Waveform::Sine));
        assert_eq!(Waveform::from_name("sawtooth"), Some(Waveform::Saw));
        assert_eq!(Waveform::from_name("unknown"), None);
    }
}
