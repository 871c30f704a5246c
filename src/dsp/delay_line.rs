//! Circular delay buffer
//!
//! Shared building block for the delay and chorus effects. Supports
//! fractional-sample reads with linear interpolation.

/// A fixed-capacity circular delay buffer
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
    sample_rate: f32,
}

impl DelayLine {
    /// Create a delay line with the given maximum delay in seconds
    pub fn new(sample_rate: f32, max_delay_secs: f32) -> Self {
        let capacity = ((sample_rate * max_delay_secs).ceil() as usize).max(2);
        Self {
            buffer: vec![0.0; capacity],
            write_pos: 0,
            sample_rate,
        }
    }

    /// Maximum delay this line supports, in seconds
    pub fn max_delay_secs(&self) -> f32 {
        self.buffer.len() as f32 / self.sample_rate
    }

    /// Write a sample and advance the write position
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Read the sample delayed by `delay_secs` (linear interpolation)
    pub fn read(&self, delay_secs: f32) -> f32 {
        let len = self.buffer.len();
        let delay_samples = (delay_secs * self.sample_rate)
            .clamp(1.0, (len - 1) as f32);

        let whole = delay_samples.floor();
        let frac = delay_samples - whole;

        let idx0 = (self.write_pos + len - whole as usize) % len;
        let idx1 = (idx0 + len - 1) % len;

        self.buffer[idx0] * (1.0 - frac) + self.buffer[idx1] * frac
    }

    /// Clear the buffer
    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}
