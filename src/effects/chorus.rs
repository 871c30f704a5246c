//! Chorus effect
//!
//! A short delay line whose read position is swept by a sine LFO, mixed
//! against the dry signal.

use crate::dsp::DelayLine;
use std::f32::consts::PI;

/// Center of the swept delay in seconds
const CENTER_DELAY_SECS: f32 = 0.02;

/// Maximum sweep either side of center at full depth
const SWEEP_SECS: f32 = 0.01;

/// Chorus effect
pub struct Chorus {
    line: DelayLine,
    wet: f32,
    rate: f32,
    depth: f32,
    phase: f32,
    sample_rate: f32,
}

impl Chorus {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            line: DelayLine::new(sample_rate, CENTER_DELAY_SECS + SWEEP_SECS + 0.005),
            wet: 0.0,
            rate: 0.8,
            depth: 0.3,
            phase: 0.0,
            sample_rate,
        }
    }

    pub fn set_wet(&mut self, wet: f32) {
        self.wet = wet.clamp(0.0, 1.0);
    }

    /// Set modulation rate in Hz
    pub fn set_rate(&mut self, hz: f32) {
        self.rate = hz.clamp(0.01, 10.0);
    }

    /// Set modulation depth (0.0-1.0)
    pub fn set_depth(&mut self, depth: f32) {
        self.depth = depth.clamp(0.0, 1.0);
    }

    /// Process a single sample (wet/dry mixed)
    pub fn process(&mut self, input: f32) -> f32 {
        self.line.write(input);

        let sweep = (self.phase * 2.0 * PI).sin() * SWEEP_SECS * self.depth;
        let delayed = self.line.read(CENTER_DELAY_SECS + sweep);

        self.phase += self.rate / self.sample_rate;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        input * (1.0 - self.wet) + delayed * self.wet
    }

    pub fn reset(&mut self) {
        self.line.reset();
        self.phase = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chorus_dry_at_zero_wet() {
        let mut chorus = Chorus::new(44100.0);
        chorus.set_wet(0.0);
        assert_eq!(chorus.process(0.4), 0.4);
    }

    #[test]
    fn test_chorus_delays_signal() {
        let mut chorus = Chorus::new(44100.0);
        chorus.set_wet(1.0);
        chorus.set_depth(0.0);

        // With no sweep the wet path is a fixed 20ms delay
        let first = chorus.process(1.0);
        assert!(first.abs() < 0.001, "wet path leaked early: {}", first);

        let mut echoed = false;
        for _ in 0..(44100.0 * 0.03) as usize {
            if chorus.process(0.0).abs() > 0.5 {
                echoed = true;
                break;
            }
        }
        assert!(echoed);
    }

    #[test]
    fn test_chorus_output_bounded() {
        let mut chorus = Chorus::new(44100.0);
        chorus.set_wet(0.5);
        chorus.set_depth(1.0);
        chorus.set_rate(2.0);

        for i in 0..44100 {
            let input = ((i as f32 / 44100.0) * 2.0 * PI * 220.0).sin();
            let out = chorus.process(input);
            assert!(out.abs() <= 2.0);
        }
    }
}
