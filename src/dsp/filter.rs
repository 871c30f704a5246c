//! Filter implementations
//!
//! Biquad filter for voice and master filtering, plus a one-pole low-pass
//! used for anti-aliasing, LFO smoothing, and DC blocking.

use std::f32::consts::PI;

/// Filter type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    LowPass,
    HighPass,
    BandPass,
}

impl FilterType {
    /// Parse a filter type from its lowercase name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "lowpass" | "low_pass" | "lp" => Some(Self::LowPass),
            "highpass" | "high_pass" | "hp" => Some(Self::HighPass),
            "bandpass" | "band_pass" | "bp" => Some(Self::BandPass),
            _ => None,
        }
    }
}

/// Biquad filter coefficients
#[derive(Debug, Clone, Copy)]
struct Coefficients {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

impl Default for Coefficients {
    fn default() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
        }
    }
}

/// Biquad filter for audio processing
pub struct Filter {
    filter_type: FilterType,
    sample_rate: f32,
    cutoff: f32,
    resonance: f32, // Q factor

    coeffs: Coefficients,

    // Filter state (Direct Form II transposed)
    z1: f32,
    z2: f32,
}

impl Filter {
    /// Create a new low-pass filter
    pub fn new(sample_rate: f32) -> Self {
        Self::with_type(sample_rate, FilterType::LowPass)
    }

    /// Create a filter with specific type
    pub fn with_type(sample_rate: f32, filter_type: FilterType) -> Self {
        let mut filter = Self {
            filter_type,
            sample_rate,
            cutoff: 1000.0,
            resonance: 0.707, // Butterworth Q
            coeffs: Coefficients::default(),
            z1: 0.0,
            z2: 0.0,
        };
        filter.calculate_coefficients();
        filter
    }

    /// Set cutoff frequency in Hz
    pub fn set_cutoff(&mut self, hz: f32) {
        // Clamp to valid range (20 Hz to Nyquist - margin)
        self.cutoff = hz.clamp(20.0, self.sample_rate * 0.45);
        self.calculate_coefficients();
    }

    /// Get cutoff frequency
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Set resonance (Q factor)
    pub fn set_resonance(&mut self, q: f32) {
        // Clamp Q to prevent instability
        self.resonance = q.clamp(0.1, 20.0);
        self.calculate_coefficients();
    }

    /// Get resonance
    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    /// Set filter type
    pub fn set_type(&mut self, filter_type: FilterType) {
        self.filter_type = filter_type;
        self.calculate_coefficients();
    }

    /// Get filter type
    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    /// Reset filter state (clear history)
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    /// Calculate biquad coefficients based on current parameters
    fn calculate_coefficients(&mut self) {
        let omega = 2.0 * PI * self.cutoff / self.sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * self.resonance);

        let (b0, b1, b2, a0, a1, a2) = match self.filter_type {
            FilterType::LowPass => {
                let b0 = (1.0 - cos_omega) / 2.0;
                let b1 = 1.0 - cos_omega;
                let b2 = (1.0 - cos_omega) / 2.0;
                (b0, b1, b2, 1.0 + alpha, -2.0 * cos_omega, 1.0 - alpha)
            }
            FilterType::HighPass => {
                let b0 = (1.0 + cos_omega) / 2.0;
                let b1 = -(1.0 + cos_omega);
                let b2 = (1.0 + cos_omega) / 2.0;
                (b0, b1, b2, 1.0 + alpha, -2.0 * cos_omega, 1.0 - alpha)
            }
            FilterType::BandPass => {
                (alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cos_omega, 1.0 - alpha)
            }
        };

        // Normalize by a0
        self.coeffs = Coefficients {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        };
    }

    /// Process a single sample through the filter
    pub fn process(&mut self, input: f32) -> f32 {
        // Direct Form II Transposed
        let output = self.coeffs.b0 * input + self.z1;

        self.z1 = self.coeffs.b1 * input - self.coeffs.a1 * output + self.z2;
        self.z2 = self.coeffs.b2 * input - self.coeffs.a2 * output;

        output
    }
}

/// One-pole low-pass filter
///
/// Cheap smoothing stage used for per-oscillator anti-aliasing and LFO
/// output smoothing.
pub struct OnePole {
    sample_rate: f32,
    alpha: f32,
    state: f32,
}

impl OnePole {
    /// Create a one-pole low-pass with the given cutoff
    pub fn new(sample_rate: f32, cutoff: f32) -> Self {
        let mut filter = Self {
            sample_rate,
            alpha: 1.0,
            state: 0.0,
        };
        filter.set_cutoff(cutoff);
        filter
    }

    /// Set the cutoff frequency in Hz
    pub fn set_cutoff(&mut self, cutoff: f32) {
        let cutoff = cutoff.clamp(1.0, self.sample_rate * 0.45);
        let rc = 1.0 / (2.0 * PI * cutoff);
        let dt = 1.0 / self.sample_rate;
        self.alpha = dt / (rc + dt);
    }

    /// Process a single sample
    pub fn process(&mut self, input: f32) -> f32 {
        self.state += self.alpha * (input - self.state);
        self.state
    }

    /// Reset filter state
    pub fn reset(&mut self) {
        self.state = 0.0;
    }
}

/// DC-blocking high-pass filter
///
/// First-order blocker placed between the effects mixer and the master gain.
pub struct DcBlocker {
    x1: f32,
    y1: f32,
    r: f32,
}

impl DcBlocker {
    pub fn new() -> Self {
        Self {
            x1: 0.0,
            y1: 0.0,
            r: 0.995,
        }
    }

    /// Process a single sample
    pub fn process(&mut self, input: f32) -> f32 {
        let output = input - self.x1 + self.r * self.y1;
        self.x1 = input;
        self.y1 = output;
        output
    }

    /// Reset filter state
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.y1 = 0.0;
    }
}

impl Default for DcBlocker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_creation() {
        let filter = Filter::new(44100.0);
        assert_eq!(filter.cutoff(), 1000.0);
        assert!((filter.resonance() - 0.707).abs() < 0.001);
        assert_eq!(filter.filter_type(), FilterType::LowPass);
    }

    #[test]
    fn test_filter_cutoff_clamping() {
        let mut filter = Filter::new(44100.0);

        // Too low
        filter.set_cutoff(5.0);
        assert_eq!(filter.cutoff(), 20.0);

        // Too high (above Nyquist)
        filter.set_cutoff(25000.0);
        assert!(filter.cutoff() < 44100.0 * 0.5);
    }

    #[test]
    fn test_filter_resonance_clamping() {
        let mut filter = Filter::new(44100.0);

        filter.set_resonance(0.01);
        assert_eq!(filter.resonance(), 0.1);

        filter.set_resonance(100.0);
        assert_eq!(filter.resonance(), 20.0);
    }

    #[test]
    fn test_lowpass_attenuates_high_frequencies() {
        let mut filter = Filter::new(44100.0);
        filter.set_cutoff(100.0); // Very low cutoff

        // Generate high frequency signal (5000 Hz)
        let freq = 5000.0;
        let mut max_input = 0.0f32;
        let mut max_output = 0.0f32;

        for i in 0..1000 {
            let t = i as f32 / 44100.0;
            let input = (2.0 * PI * freq * t).sin();
            let output = filter.process(input);

            max_input = max_input.max(input.abs());
            max_output = max_output.max(output.abs());
        }

        // High frequency should be significantly attenuated
        assert!(
            max_output < max_input * 0.1,
            "Expected attenuation, got output={} input={}",
            max_output,
            max_input
        );
    }

    #[test]
    fn test_highpass_filter() {
        let mut filter = Filter::with_type(44100.0, FilterType::HighPass);
        filter.set_cutoff(1000.0);

        // Low frequency (100 Hz) should be attenuated
        let freq = 100.0;
        let mut max_output = 0.0f32;

        for i in 0..2000 {
            let t = i as f32 / 44100.0;
            let input = (2.0 * PI * freq * t).sin();
            let output = filter.process(input);

            if i > 500 {
                max_output = max_output.max(output.abs());
            }
        }

        assert!(max_output < 0.5, "Expected attenuation, got {}", max_output);
    }

    #[test]
    fn test_bandpass_passes_center() {
        let mut filter = Filter::with_type(44100.0, FilterType::BandPass);
        filter.set_cutoff(1000.0);
        filter.set_resonance(2.0);

        let freq = 1000.0;
        let mut max_output = 0.0f32;
        for i in 0..4410 {
            let t = i as f32 / 44100.0;
            let output = filter.process((2.0 * PI * freq * t).sin());
            if i > 1000 {
                max_output = max_output.max(output.abs());
            }
        }

        assert!(max_output > 0.5, "Expected passthrough at center, got {}", max_output);
    }

    #[test]
    fn test_filter_reset() {
        let mut filter = Filter::new(44100.0);

        for _ in 0..100 {
            filter.process(1.0);
        }

        filter.reset();

        let output = filter.process(0.0);
        assert!(output.abs() < 0.001, "Expected near-zero after reset, got {}", output);
    }

    #[test]
    fn test_one_pole_smooths() {
        let mut filter = OnePole::new(44100.0, 100.0);

        // A step input should approach 1.0 gradually
        let first = filter.process(1.0);
        assert!(first < 0.5);

        let mut last = first;
        for _ in 0..10000 {
            last = filter.process(1.0);
        }
        assert!(last > 0.95);
    }

    #[test]
    fn test_dc_blocker_removes_offset() {
        let mut blocker = DcBlocker::new();

        // Constant input should decay toward zero
        let mut output = 0.0;
        for _ in 0..10000 {
            output = blocker.process(1.0);
        }
        assert!(output.abs() < 0.01, "Expected DC removed, got {}", output);
    }
}
