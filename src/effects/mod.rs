//! Shared effects bus
//!
//! Fixed topology applied to the summed voice and drum mix: master filter,
//! reverb, delay, distortion, chorus, then a DC blocker and the master gain.
//! Each effect mixes its own wet/dry; a disabled effect runs with its wet
//! gain at zero, so its internal buffers keep tracking the live signal and
//! re-enabling never replays stale audio.

mod chorus;
mod delay;
mod distortion;
mod reverb;

pub use chorus::Chorus;
pub use delay::Delay;
pub use distortion::Distortion;
pub use reverb::Reverb;

use crate::dsp::{DcBlocker, Filter};
use crate::synth::params::EffectsParams;

/// The effects bus
pub struct EffectsChain {
    filter: Filter,
    /// Base cutoff before LFO modulation
    filter_cutoff: f32,
    /// Current LFO modulation in octaves
    lfo_mod: f32,
    reverb: Reverb,
    delay: Delay,
    distortion: Distortion,
    chorus: Chorus,
    dc_blocker: DcBlocker,
    master_volume: f32,
}

impl EffectsChain {
    pub fn new(sample_rate: f32) -> Self {
        let mut filter = Filter::new(sample_rate);
        filter.set_cutoff(8000.0);

        Self {
            filter,
            filter_cutoff: 8000.0,
            lfo_mod: 0.0,
            reverb: Reverb::new(sample_rate),
            delay: Delay::new(sample_rate),
            distortion: Distortion::new(),
            chorus: Chorus::new(sample_rate),
            dc_blocker: DcBlocker::new(),
            master_volume: 0.7,
        }
    }

    /// Push the current parameter set onto the effects
    ///
    /// Cheap to call every block: the reverb and distortion only rebuild
    /// their tables when room size or drive actually changed.
    pub fn apply(&mut self, params: &EffectsParams, master_volume: f32) {
        if (params.filter.cutoff - self.filter_cutoff).abs() > f32::EPSILON {
            self.filter_cutoff = params.filter.cutoff;
            self.filter
                .set_cutoff(self.filter_cutoff * 2f32.powf(self.lfo_mod));
        }
        self.filter.set_type(params.filter.kind);
        self.filter.set_resonance(params.filter.resonance);

        let wet = |enabled: bool, wet: f32| if enabled { wet } else { 0.0 };

        self.reverb.set_wet(wet(params.reverb.enabled, params.reverb.wet));
        self.reverb.set_room_size(params.reverb.room_size);

        self.delay.set_wet(wet(params.delay.enabled, params.delay.wet));
        self.delay.set_time(params.delay.time);
        self.delay.set_feedback(params.delay.feedback);

        self.distortion
            .set_wet(wet(params.distortion.enabled, params.distortion.wet));
        self.distortion.set_amount(params.distortion.amount);

        self.chorus.set_wet(wet(params.chorus.enabled, params.chorus.wet));
        self.chorus.set_rate(params.chorus.rate);
        self.chorus.set_depth(params.chorus.depth);

        self.master_volume = master_volume.clamp(0.0, 1.0);
    }

    /// Set the master filter LFO modulation in octaves
    ///
    /// Called once per control interval with the accumulated per-voice
    /// contributions.
    pub fn set_lfo_mod(&mut self, octaves: f32) {
        if (octaves - self.lfo_mod).abs() > 0.001 {
            self.lfo_mod = octaves;
            self.filter
                .set_cutoff(self.filter_cutoff * 2f32.powf(octaves));
        }
    }

    /// Process a single sample through the full bus
    pub fn process(&mut self, input: f32) -> f32 {
        let mut sample = self.filter.process(input);

        sample = self.reverb.process(sample);
        sample = self.delay.process(sample);
        sample = self.distortion.process(sample);
        sample = self.chorus.process(sample);

        self.dc_blocker.process(sample) * self.master_volume
    }

    /// Clear all effect state
    pub fn reset(&mut self) {
        self.filter.reset();
        self.reverb.reset();
        self.delay.reset();
        self.chorus.reset();
        self.dc_blocker.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::params::EffectsParams;

    #[test]
    fn test_chain_passes_audio_with_defaults() {
        let mut chain = EffectsChain::new(44100.0);
        chain.apply(&EffectsParams::default(), 1.0);

        let mut peak = 0.0f32;
        for i in 0..4410 {
            let t = i as f32 / 44100.0;
            let input = (t * 2.0 * std::f32::consts::PI * 440.0).sin() * 0.5;
            peak = peak.max(chain.process(input).abs());
        }
        assert!(peak > 0.2, "signal lost in the chain: {}", peak);
    }

    #[test]
    fn test_master_volume_scales_output() {
        let mut loud = EffectsChain::new(44100.0);
        let mut quiet = EffectsChain::new(44100.0);
        loud.apply(&EffectsParams::default(), 1.0);
        quiet.apply(&EffectsParams::default(), 0.25);

        let mut loud_peak = 0.0f32;
        let mut quiet_peak = 0.0f32;
        for i in 0..4410 {
            let t = i as f32 / 44100.0;
            let input = (t * 2.0 * std::f32::consts::PI * 440.0).sin() * 0.5;
            loud_peak = loud_peak.max(loud.process(input).abs());
            quiet_peak = quiet_peak.max(quiet.process(input).abs());
        }
        assert!(loud_peak > quiet_peak * 2.0);
    }

    #[test]
    fn test_disabled_effects_bypassed() {
        let mut chain = EffectsChain::new(44100.0);
        let mut params = EffectsParams::default();
        params.reverb.enabled = false;
        params.reverb.wet = 1.0;
        chain.apply(&params, 1.0);

        // With reverb disabled an impulse should leave no tail past the
        // filter's own ringing
        chain.process(1.0);
        let mut tail = 0.0f32;
        for i in 0..8820 {
            let out = chain.process(0.0).abs();
            if i > 2000 {
                tail = tail.max(out);
            }
        }
        assert!(tail < 0.01, "unexpected tail: {}", tail);
    }

    #[test]
    fn test_reenabled_effect_carries_no_stale_audio() {
        let mut chain = EffectsChain::new(44100.0);
        let mut params = EffectsParams::default();
        params.reverb.enabled = true;
        params.reverb.wet = 1.0;
        chain.apply(&params, 1.0);

        // Excite the reverb, then run half a second of silence while it is
        // disabled. The disabled reverb must keep tracking the input, so by
        // the time it comes back its buffers hold only silence.
        chain.process(1.0);
        params.reverb.enabled = false;
        chain.apply(&params, 1.0);
        for _ in 0..22050 {
            chain.process(0.0);
        }

        params.reverb.enabled = true;
        chain.apply(&params, 1.0);
        let mut peak = 0.0f32;
        for _ in 0..4410 {
            peak = peak.max(chain.process(0.0).abs());
        }
        assert!(peak < 0.01, "stale reverb tail: {}", peak);
    }

    #[test]
    fn test_lfo_mod_moves_cutoff() {
        let mut chain = EffectsChain::new(44100.0);
        chain.apply(&EffectsParams::default(), 1.0);

        chain.set_lfo_mod(-1.0);
        assert!((chain.filter.cutoff() - 4000.0).abs() < 1.0);

        chain.set_lfo_mod(0.0);
        assert!((chain.filter.cutoff() - 8000.0).abs() < 1.0);
    }

    #[test]
    fn test_chain_blocks_dc() {
        let mut chain = EffectsChain::new(44100.0);
        chain.apply(&EffectsParams::default(), 1.0);

        let mut out = 0.0;
        for _ in 0..44100 {
            out = chain.process(0.5);
        }
        assert!(out.abs() < 0.01, "DC leaked through: {}", out);
    }
}
