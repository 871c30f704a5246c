//! Waveshaping distortion
//!
//! Shapes the signal through a precomputed tanh curve. The curve is a
//! lookup table indexed by input amplitude, recomputed only when the drive
//! amount changes.

/// Lookup table resolution
const CURVE_SIZE: usize = 1024;

/// Waveshaping distortion
pub struct Distortion {
    curve: Vec<f32>,
    wet: f32,
    amount: f32,
}

impl Distortion {
    pub fn new() -> Self {
        let mut distortion = Self {
            curve: vec![0.0; CURVE_SIZE],
            wet: 0.0,
            amount: 0.4,
        };
        distortion.compute_curve();
        distortion
    }

    pub fn set_wet(&mut self, wet: f32) {
        self.wet = wet.clamp(0.0, 1.0);
    }

    /// Set drive amount (0.0-1.0). Recomputes the curve when it changes.
    pub fn set_amount(&mut self, amount: f32) {
        let amount = amount.clamp(0.0, 1.0);
        if (amount - self.amount).abs() > f32::EPSILON {
            self.amount = amount;
            self.compute_curve();
        }
    }

    /// Fill the lookup table: tanh with drive mapped 1x..20x, normalized
    /// so full-scale input stays at full scale
    fn compute_curve(&mut self) {
        let drive = 1.0 + self.amount * 19.0;
        let norm = (drive as f64).tanh() as f32;

        for (i, entry) in self.curve.iter_mut().enumerate() {
            let x = (i as f32 / (CURVE_SIZE - 1) as f32) * 2.0 - 1.0;
            *entry = ((x * drive) as f64).tanh() as f32 / norm;
        }
    }

    /// Process a single sample (wet/dry mixed)
    pub fn process(&mut self, input: f32) -> f32 {
        let clamped = input.clamp(-1.0, 1.0);
        let pos = (clamped + 1.0) * 0.5 * (CURVE_SIZE - 1) as f32;

        let idx = pos as usize;
        let frac = pos - idx as f32;
        let next = (idx + 1).min(CURVE_SIZE - 1);
        let shaped = self.curve[idx] * (1.0 - frac) + self.curve[next] * frac;

        input * (1.0 - self.wet) + shaped * self.wet
    }
}

impl Default for Distortion {
    fn default() -> Self {
        Self::new()
    }
}
