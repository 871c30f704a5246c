//! Procedural drum synthesis
//!
//! When no sample asset covers a requested variant, the repository renders
//! one from scratch. Each generator reads the knobs that shape its
//! instrument, so a fallback still responds to tune, decay, and snappy.

use crate::dsp::{Filter, FilterType, Oscillator, Waveform};
use crate::sampler::variant::{DrumParams, Instrument};
use crate::sampler::SampleBuffer;

/// Render a fallback sample for `instrument` at the given knob state
pub fn generate(instrument: Instrument, params: &DrumParams, sample_rate: u32) -> SampleBuffer {
    let data = match instrument {
        Instrument::Kick => kick(params, sample_rate as f32),
        Instrument::Snare => snare(params, sample_rate as f32),
        Instrument::HatClosed => hat(params, sample_rate as f32, false),
        Instrument::HatOpen => hat(params, sample_rate as f32, true),
        Instrument::Clap => clap(sample_rate as f32),
    };
    SampleBuffer { data, sample_rate }
}

/// Pitch-swept sine with a click transient
///
/// Tune scales the sweep range, decay the envelope length.
fn kick(params: &DrumParams, sample_rate: f32) -> Vec<f32> {
    let length_secs = 0.15 + params.decay * 0.45;
    let start_hz = 120.0 + params.tune * 60.0;
    let end_hz = 35.0 + params.tune * 10.0;

    let samples = (length_secs * sample_rate) as usize;
    let mut data = Vec::with_capacity(samples);
    let mut phase = 0.0f32;

    for i in 0..samples {
        let t = i as f32 / samples as f32;
        // Exponential pitch sweep down to the body frequency
        let freq = end_hz + (start_hz - end_hz) * (-9.0 * t).exp();
        phase += freq / sample_rate;

        let env = (-6.0 * t).exp();
        let body = (phase * 2.0 * std::f32::consts::PI).sin() * env;

        // Short noise click on the transient
        let click = if i < (0.005 * sample_rate) as usize {
            pseudo_noise(i) * 0.3 * (1.0 - i as f32 / (0.005 * sample_rate))
        } else {
            0.0
        };

        data.push((body + click).clamp(-1.0, 1.0));
    }
    data
}

/// Band-passed noise over a tone burst; snappy sets the noise mix
fn snare(params: &DrumParams, sample_rate: f32) -> Vec<f32> {
    let length_secs = 0.25;
    let tone_hz = 160.0 + params.tune * 120.0;
    let noise_mix = 0.4 + params.snappy * 0.6;

    let samples = (length_secs * sample_rate) as usize;
    let mut data = Vec::with_capacity(samples);

    let mut noise = Oscillator::new(Waveform::WhiteNoise, tone_hz, sample_rate);
    let mut bandpass = Filter::with_type(sample_rate, FilterType::BandPass);
    bandpass.set_cutoff(2500.0);
    bandpass.set_resonance(1.2);
    let mut tone = Oscillator::new(Waveform::Sine, tone_hz, sample_rate);

    for i in 0..samples {
        let t = i as f32 / samples as f32;
        let noise_env = (-10.0 * t).exp();
        let tone_env = (-18.0 * t).exp();

        let n = bandpass.process(noise.generate()) * noise_env * noise_mix;
        let b = tone.generate() * tone_env * (1.0 - noise_mix * 0.5);
        data.push((n + b).clamp(-1.0, 1.0));
    }
    data
}

/// High-passed noise; open hats ring out, closed hats choke fast
fn hat(params: &DrumParams, sample_rate: f32, open: bool) -> Vec<f32> {
    let base_secs = if open { 0.3 } else { 0.06 };
    let length_secs = base_secs * (0.5 + params.decay);
    let rate = if open { 8.0 } else { 30.0 };

    let samples = (length_secs * sample_rate) as usize;
    let mut data = Vec::with_capacity(samples);

    let mut noise = Oscillator::new(Waveform::WhiteNoise, 1.0, sample_rate);
    let mut highpass = Filter::with_type(sample_rate, FilterType::HighPass);
    highpass.set_cutoff(7000.0);

    for i in 0..samples {
        let t = i as f32 / samples as f32;
        let env = (-rate * t / (0.5 + params.decay)).exp();
        data.push((highpass.process(noise.generate()) * env).clamp(-1.0, 1.0));
    }
    data
}

/// Several quick noise bursts then a longer decay, like many hands
fn clap(sample_rate: f32) -> Vec<f32> {
    let length_secs = 0.3;
    let burst_gap_secs = 0.012;
    let burst_count = 4;

    let samples = (length_secs * sample_rate) as usize;
    let mut data = Vec::with_capacity(samples);

    let mut noise = Oscillator::new(Waveform::WhiteNoise, 1.0, sample_rate);
    let mut bandpass = Filter::with_type(sample_rate, FilterType::BandPass);
    bandpass.set_cutoff(1500.0);
    bandpass.set_resonance(0.9);

    let gap = (burst_gap_secs * sample_rate) as usize;
    for i in 0..samples {
        // Each burst restarts the envelope; the last one decays out fully
        let burst = (i / gap.max(1)).min(burst_count - 1);
        let since_burst = (i - burst * gap) as f32 / sample_rate;
        let rate = if burst == burst_count - 1 { 14.0 } else { 80.0 };
        let env = (-rate * since_burst).exp();

        data.push((bandpass.process(noise.generate()) * env).clamp(-1.0, 1.0));
    }
    data
}

/// Deterministic noise for the kick click, avoiding shared RNG state
fn pseudo_noise(i: usize) -> f32 {
    let mut x = (i as u64).wrapping_mul(0x2545F4914F6CDD1D).wrapping_add(1);
    x ^= x >> 33;
    (x as f64 / u64::MAX as f64) as f32 * 2.0 - 1.0
}
