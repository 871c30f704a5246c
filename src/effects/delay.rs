//! Feedback delay effect

use crate::dsp::DelayLine;

/// Feedback never reaches unity, so the loop always decays
const MAX_FEEDBACK: f32 = 0.95;

const MAX_DELAY_SECS: f32 = 2.0;

/// Feedback delay
pub struct Delay {
    line: DelayLine,
    wet: f32,
    time: f32,
    feedback: f32,
}

impl Delay {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            line: DelayLine::new(sample_rate, MAX_DELAY_SECS),
            wet: 0.0,
            time: 0.35,
            feedback: 0.4,
        }
    }

    pub fn set_wet(&mut self, wet: f32) {
        self.wet = wet.clamp(0.0, 1.0);
    }

    /// Set delay time in seconds
    pub fn set_time(&mut self, secs: f32) {
        self.time = secs.clamp(0.01, MAX_DELAY_SECS);
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, MAX_FEEDBACK);
    }

    /// Process a single sample (wet/dry mixed)
    pub fn process(&mut self, input: f32) -> f32 {
        let delayed = self.line.read(self.time);
        self.line.write(input + delayed * self.feedback);

        input * (1.0 - self.wet) + delayed * self.wet
    }

    pub fn reset(&mut self) {
        self.line.reset();
    }
}
