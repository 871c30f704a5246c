//! ADSR envelope generator
//!
//! Attack-Decay-Sustain-Release envelope with linear ramps for click-free
//! amplitude and filter shaping.

/// Envelope stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Linear ADSR envelope generator
///
/// The attack ramp starts from a configurable floor rather than hard zero so
/// a triggered voice never produces a discontinuity at its first sample.
pub struct Envelope {
    sample_rate: f32,

    // Time parameters (in seconds)
    attack: f32,
    decay: f32,
    sustain: f32, // Level (0.0-1.0)
    release: f32,

    /// Starting level for the attack ramp
    floor: f32,

    // State
    stage: EnvelopeStage,
    level: f32,
    release_start_level: f32,
}

impl Envelope {
    /// Create a new envelope with default parameters
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            attack: 0.01,
            decay: 0.1,
            sustain: 0.7,
            release: 0.3,
            floor: 0.0,
            stage: EnvelopeStage::Idle,
            level: 0.0,
            release_start_level: 0.0,
        }
    }

    /// Set attack time in seconds
    pub fn set_attack(&mut self, seconds: f32) {
        self.attack = seconds.max(0.001); // Minimum 1ms
    }

    /// Set decay time in seconds
    pub fn set_decay(&mut self, seconds: f32) {
        self.decay = seconds.max(0.001);
    }

    /// Set sustain level (0.0-1.0)
    pub fn set_sustain(&mut self, level: f32) {
        self.sustain = level.clamp(0.0, 1.0);
    }

    /// Set release time in seconds
    pub fn set_release(&mut self, seconds: f32) {
        self.release = seconds.max(0.001);
    }

    /// Set the attack starting floor (0.0-1.0)
    pub fn set_floor(&mut self, floor: f32) {
        self.floor = floor.clamp(0.0, 1.0);
    }

    /// Configure all ADSR parameters at once
    pub fn configure(&mut self, attack: f32, decay: f32, sustain: f32, release: f32) {
        self.set_attack(attack);
        self.set_decay(decay);
        self.set_sustain(sustain);
        self.set_release(release);
    }

    /// Get release time in seconds
    pub fn release_time(&self) -> f32 {
        self.release
    }

    /// Trigger the envelope (start attack phase from the floor)
    pub fn trigger(&mut self) {
        self.stage = EnvelopeStage::Attack;
        self.level = self.level.max(self.floor);
    }

    /// Release the envelope (start release phase)
    pub fn release(&mut self) {
        if self.stage != EnvelopeStage::Idle && self.stage != EnvelopeStage::Release {
            self.release_start_level = self.level;
            self.stage = EnvelopeStage::Release;
        }
    }

    /// Reset envelope to idle state
    pub fn reset(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.level = 0.0;
    }

    /// Get current stage
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    /// Check if envelope is active (not idle)
    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Idle
    }

    /// Generate the next envelope sample
    pub fn process(&mut self) -> f32 {
        let dt = 1.0 / self.sample_rate;

        match self.stage {
            EnvelopeStage::Idle => {
                self.level = 0.0;
            }

            EnvelopeStage::Attack => {
                // Linear ramp from the floor to 1.0
                self.level += (1.0 - self.floor) * dt / self.attack;

                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = EnvelopeStage::Decay;
                }
            }

            EnvelopeStage::Decay => {
                // Linear ramp from 1.0 down to the sustain level
                let rate = (1.0 - self.sustain) / self.decay;
                self.level -= rate * dt;

                if self.level <= self.sustain {
                    self.level = self.sustain;
                    self.stage = EnvelopeStage::Sustain;
                }
            }

            EnvelopeStage::Sustain => {
                self.level = self.sustain;
            }

            EnvelopeStage::Release => {
                // Linear ramp from the level at release time down to 0
                let rate = self.release_start_level.max(f32::EPSILON) / self.release;
                self.level -= rate * dt;

                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Idle;
                }
            }
        }

        self.level
    }

    /// Get current level without advancing
    pub fn level(&self) -> f32 {
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_creation() {
        let env = Envelope::new(44100.0);
        assert_eq!(env.stage(), EnvelopeStage::Idle);
        assert_eq!(env.level(), 0.0);
        assert!(!env.is_active());
    }

    #[test]
    fn test_envelope_trigger() {
        let mut env = Envelope::new(44100.0);
        env.trigger();

        assert_eq!(env.stage(), EnvelopeStage::Attack);
        assert!(env.is_active());
    }

    #[test]
    fn test_envelope_starts_from_floor() {
        let mut env = Envelope::new(44100.0);
        env.set_floor(0.01);
        env.trigger();

        assert!(env.level() >= 0.01);
    }

    #[test]
    fn test_envelope_attack_phase() {
        let mut env = Envelope::new(44100.0);
        env.set_attack(0.01); // 10ms attack
        env.trigger();

        // Process through attack (441 samples for 10ms at 44100 Hz)
        for _ in 0..500 {
            env.process();
        }

        // Should be at or near 1.0 (in decay or sustain)
        assert!(env.level() > 0.9);
    }

    #[test]
    fn test_envelope_sustain_level() {
        let mut env = Envelope::new(44100.0);
        env.configure(0.001, 0.001, 0.5, 0.001); // Very fast ADSR
        env.trigger();

        // Process through attack and decay
        for _ in 0..500 {
            env.process();
        }

        // Should be at sustain level
        assert!((env.level() - 0.5).abs() < 0.01);
        assert_eq!(env.stage(), EnvelopeStage::Sustain);
    }

    #[test]
    fn test_envelope_release() {
        let mut env = Envelope::new(44100.0);
        env.configure(0.001, 0.001, 0.5, 0.01); // 10ms release
        env.trigger();

        // Process to sustain
        for _ in 0..200 {
            env.process();
        }

        // Trigger release
        env.release();
        assert_eq!(env.stage(), EnvelopeStage::Release);

        // Process through release
        for _ in 0..1000 {
            env.process();
        }

        // Should be at 0 and idle
        assert_eq!(env.level(), 0.0);
        assert_eq!(env.stage(), EnvelopeStage::Idle);
    }

    #[test]
    fn test_envelope_release_duration() {
        let sample_rate = 1000.0;
        let mut env = Envelope::new(sample_rate);
        env.configure(0.001, 0.001, 0.8, 0.1); // 100ms release
        env.trigger();
        for _ in 0..100 {
            env.process();
        }
        env.release();

        // 100ms at 1 kHz is 100 samples; allow a couple of samples slack
        let mut samples = 0;
        while env.is_active() && samples < 1000 {
            env.process();
            samples += 1;
        }
        assert!((90..=110).contains(&samples), "release took {} samples", samples);
    }

    #[test]
    fn test_envelope_reset() {
        let mut env = Envelope::new(44100.0);
        env.trigger();

        for _ in 0..100 {
            env.process();
        }

        env.reset();
        assert_eq!(env.stage(), EnvelopeStage::Idle);
        assert_eq!(env.level(), 0.0);
    }
}
