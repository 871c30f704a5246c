//! Voice construction and lifecycle
//!
//! A voice is built in two phases. [`VoicePlan::build`] is a pure function
//! from the global parameters to a declarative plan: which oscillator stages
//! exist, their final frequencies, whether noise and LFO stages are present.
//! [`Voice::from_plan`] then instantiates the DSP objects from the plan, all
//! or nothing. Construction and teardown are symmetric: everything a voice
//! allocates lives inside it, so dropping the voice releases the whole stack.

use std::time::Duration;

use crate::dsp::{Envelope, EnvelopeStage, Filter, FilterType, Lfo, OnePole, Oscillator, Waveform};
use crate::error::EngineError;
use crate::synth::params::{FilterSlope, VoiceParameters};

/// A voice still in attack/decay/sustain after this long is force-released.
pub const WATCHDOG_TIMEOUT: Duration = Duration::from_secs(10);

/// Attack ramps start here instead of hard zero to avoid a click.
const ATTACK_FLOOR: f32 = 0.01;

/// Per-oscillator anti-alias smoothing never opens past this.
const ANTIALIAS_CEILING_HZ: f32 = 8000.0;

/// How much of a voice's filter LFO routing leaks onto the master filter.
pub const MASTER_LFO_DEPTH: f32 = 0.25;

/// Modulation (LFO, filter cutoff) updates every this many samples.
const CONTROL_INTERVAL: u32 = 64;

/// Equal-tempered frequency for a MIDI note number (A4 = 69 = 440 Hz)
pub fn note_frequency(note: i32) -> f32 {
    440.0 * 2f32.powf((note - 69) as f32 / 12.0)
}

/// Lifecycle state of a voice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Attack,
    Decay,
    Sustain,
    Release,
    Terminated,
}

/// Planned oscillator stage
#[derive(Debug, Clone, Copy)]
pub struct OscPlan {
    pub waveform: Waveform,
    pub frequency: f32,
    pub level: f32,
    /// Anti-alias one-pole cutoff, derived from the fundamental
    pub antialias_cutoff: f32,
}

/// Planned noise stage: three detuned saws through a band-pass
#[derive(Debug, Clone, Copy)]
pub struct NoisePlan {
    pub level: f32,
    pub saw_frequencies: [f32; 3],
    pub bandpass_center: f32,
    pub bandpass_q: f32,
}

/// Planned LFO stage with routing weights
#[derive(Debug, Clone, Copy)]
pub struct LfoPlan {
    pub shape: crate::dsp::LfoShape,
    pub rate: f32,
    pub amount: f32,
    pub delay: f32,
    pub to_pitch: f32,
    pub to_filter: f32,
    pub to_amp: f32,
}

/// Planned voice filter
#[derive(Debug, Clone, Copy)]
pub struct FilterPlan {
    pub kind: FilterType,
    pub cutoff: f32,
    pub resonance: f32,
    pub slope: FilterSlope,
    pub env_amount: f32,
}

/// Declarative description of a voice before any DSP state exists
#[derive(Debug, Clone)]
pub struct VoicePlan {
    pub note: i32,
    pub velocity: f32,
    pub base_frequency: f32,
    pub oscs: Vec<OscPlan>,
    pub noise: Option<NoisePlan>,
    pub lfo: Option<LfoPlan>,
    pub filter: FilterPlan,
    pub amp_env: [f32; 4],
    pub filter_env: [f32; 4],
}

impl VoicePlan {
    /// Build a plan from the current global parameters
    ///
    /// Muted oscillators (level 0) produce no stage. The noise and LFO
    /// stages exist only when their level/amount is above zero.
    pub fn build(params: &VoiceParameters, note: i32, velocity: f32) -> Self {
        let base = note_frequency(note);
        let velocity = velocity.clamp(0.0, 1.0);

        let oscs = params
            .osc
            .iter()
            .filter(|cfg| cfg.level > 0.0)
            .map(|cfg| {
                let frequency =
                    base * 2f32.powi(cfg.octave) * 2f32.powf(cfg.cents / 1200.0);
                OscPlan {
                    waveform: cfg.waveform,
                    frequency,
                    level: cfg.level,
                    antialias_cutoff: (frequency * 4.0).min(ANTIALIAS_CEILING_HZ),
                }
            })
            .collect();

        let noise = (params.noise_level > 0.0).then(|| {
            let center = base * 3.0;
            NoisePlan {
                level: params.noise_level,
                saw_frequencies: [center, center * 1.007, center * 0.993],
                bandpass_center: center,
                bandpass_q: 8.0,
            }
        });

        let lfo = (params.lfo.amount > 0.0).then(|| LfoPlan {
            shape: params.lfo.waveform,
            rate: params.lfo.rate,
            amount: params.lfo.amount,
            delay: params.lfo.delay,
            to_pitch: params.lfo.to_pitch,
            // The filter section's own LFO depth adds to the routing weight
            to_filter: (params.lfo.to_filter + params.filter.lfo_amount).clamp(0.0, 2.0),
            to_amp: params.lfo.to_amp,
        });

        // Keyboard tracking scales the cutoff relative to A4
        let tracked_cutoff =
            params.filter.cutoff * (base / 440.0).powf(params.filter.key_tracking);

        Self {
            note,
            velocity,
            base_frequency: base,
            oscs,
            noise,
            lfo,
            filter: FilterPlan {
                kind: params.filter.kind,
                cutoff: tracked_cutoff,
                resonance: params.filter.resonance,
                slope: params.filter.slope,
                env_amount: params.filter.env_amount,
            },
            amp_env: [
                params.amp_env.attack,
                params.amp_env.decay,
                params.amp_env.sustain,
                params.amp_env.release,
            ],
            filter_env: [
                params.filter_env.attack,
                params.filter_env.decay,
                params.filter_env.sustain,
                params.filter_env.release,
            ],
        }
    }
}

struct OscStage {
    osc: Oscillator,
    antialias: OnePole,
    level: f32,
    base_frequency: f32,
}

struct NoiseStage {
    saws: [Oscillator; 3],
    bandpass: Filter,
    level: f32,
}

struct LfoStage {
    lfo: Lfo,
    /// Control ticks remaining before the LFO starts
    delay_remaining: u32,
    to_pitch: f32,
    to_filter: f32,
    to_amp: f32,
}

/// A single playing voice
pub struct Voice {
    id: u64,
    note: i32,
    velocity: f32,

    oscs: Vec<OscStage>,
    noise: Option<NoiseStage>,
    lfo: Option<LfoStage>,

    filter: Filter,
    /// Second biquad for the 24 dB slope
    filter2: Option<Filter>,
    base_cutoff: f32,
    env_amount: f32,

    amp_env: Envelope,
    filter_env: Envelope,

    created_at: Duration,
    /// Set by note_off; the voice is removable once past this
    release_at: Option<Duration>,
    watchdog_at: Duration,

    control_counter: u32,
    lfo_value: f32,
}

impl Voice {
    /// Instantiate a voice from its plan
    ///
    /// Fails without side effects if the plan contains non-finite or
    /// non-positive frequencies.
    pub fn from_plan(
        plan: &VoicePlan,
        id: u64,
        sample_rate: f32,
        now: Duration,
    ) -> Result<Self, EngineError> {
        for osc in &plan.oscs {
            if !osc.frequency.is_finite() || osc.frequency <= 0.0 {
                return Err(EngineError::VoiceBuild {
                    note: plan.note,
                    reason: format!("oscillator frequency {} out of range", osc.frequency),
                });
            }
        }
        if let Some(noise) = &plan.noise {
            if !noise.bandpass_center.is_finite() || noise.bandpass_center <= 0.0 {
                return Err(EngineError::VoiceBuild {
                    note: plan.note,
                    reason: format!("noise center {} out of range", noise.bandpass_center),
                });
            }
        }

        let oscs = plan
            .oscs
            .iter()
            .map(|p| OscStage {
                osc: Oscillator::new(p.waveform, p.frequency, sample_rate),
                antialias: OnePole::new(sample_rate, p.antialias_cutoff),
                level: p.level,
                base_frequency: p.frequency,
            })
            .collect();

        let noise = plan.noise.as_ref().map(|p| {
            let mut bandpass = Filter::with_type(sample_rate, FilterType::BandPass);
            bandpass.set_cutoff(p.bandpass_center);
            bandpass.set_resonance(p.bandpass_q);
            NoiseStage {
                saws: [
                    Oscillator::new(Waveform::Saw, p.saw_frequencies[0], sample_rate),
                    Oscillator::new(Waveform::Saw, p.saw_frequencies[1], sample_rate),
                    Oscillator::new(Waveform::Saw, p.saw_frequencies[2], sample_rate),
                ],
                bandpass,
                level: p.level,
            }
        });

        // Modulation runs at control rate, so the LFO is built against it
        let control_rate = sample_rate / CONTROL_INTERVAL as f32;
        let lfo = plan.lfo.as_ref().map(|p| {
            let mut lfo = Lfo::new(control_rate);
            lfo.set_shape(p.shape);
            lfo.set_frequency(p.rate);
            lfo.set_depth(p.amount);
            LfoStage {
                lfo,
                delay_remaining: (p.delay * control_rate) as u32,
                to_pitch: p.to_pitch,
                to_filter: p.to_filter,
                to_amp: p.to_amp,
            }
        });

        let mut filter = Filter::with_type(sample_rate, plan.filter.kind);
        filter.set_cutoff(plan.filter.cutoff);
        filter.set_resonance(plan.filter.resonance);

        let filter2 = (plan.filter.slope == FilterSlope::Db24).then(|| {
            let mut f = Filter::with_type(sample_rate, plan.filter.kind);
            f.set_cutoff(plan.filter.cutoff);
            f.set_resonance(plan.filter.resonance);
            f
        });

        let mut amp_env = Envelope::new(sample_rate);
        amp_env.configure(
            plan.amp_env[0],
            plan.amp_env[1],
            plan.amp_env[2],
            plan.amp_env[3],
        );
        amp_env.set_floor(ATTACK_FLOOR);
        amp_env.trigger();

        let mut filter_env = Envelope::new(sample_rate);
        filter_env.configure(
            plan.filter_env[0],
            plan.filter_env[1],
            plan.filter_env[2],
            plan.filter_env[3],
        );
        filter_env.trigger();

        Ok(Self {
            id,
            note: plan.note,
            velocity: plan.velocity,
            oscs,
            noise,
            lfo,
            filter,
            filter2,
            base_cutoff: plan.filter.cutoff,
            env_amount: plan.filter.env_amount,
            amp_env,
            filter_env,
            created_at: now,
            release_at: None,
            watchdog_at: now + WATCHDOG_TIMEOUT,
            control_counter: 0,
            lfo_value: 0.0,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn note(&self) -> i32 {
        self.note
    }

    pub fn created_at(&self) -> Duration {
        self.created_at
    }

    /// Current lifecycle state
    pub fn state(&self) -> VoiceState {
        match self.amp_env.stage() {
            EnvelopeStage::Attack => VoiceState::Attack,
            EnvelopeStage::Decay => VoiceState::Decay,
            EnvelopeStage::Sustain => VoiceState::Sustain,
            EnvelopeStage::Release => VoiceState::Release,
            EnvelopeStage::Idle => VoiceState::Terminated,
        }
    }

    /// Whether note_off has been called
    pub fn is_releasing(&self) -> bool {
        self.release_at.is_some()
    }

    /// Whether the voice can be removed: past the end of its release ramp
    pub fn is_finished(&self, now: Duration) -> bool {
        match self.release_at {
            Some(at) => now >= at,
            None => false,
        }
    }

    /// Whether the watchdog deadline has passed for a still-held voice
    pub fn watchdog_expired(&self, now: Duration) -> bool {
        self.release_at.is_none() && now >= self.watchdog_at
    }

    /// Begin release. Idempotent: repeated calls keep the first deadline.
    pub fn note_off(&mut self, now: Duration) {
        if self.release_at.is_some() {
            return;
        }
        self.release_at = Some(now + Duration::from_secs_f32(self.amp_env.release_time()));
        self.amp_env.release();
        self.filter_env.release();
    }

    /// Render the next sample
    pub fn render(&mut self) -> f32 {
        if self.control_counter == 0 {
            self.update_modulation();
        }
        self.control_counter = (self.control_counter + 1) % CONTROL_INTERVAL;

        let mut sample = 0.0;
        for stage in &mut self.oscs {
            let raw = stage.osc.generate();
            sample += stage.antialias.process(raw) * stage.level;
        }

        if let Some(noise) = &mut self.noise {
            let raw = (noise.saws[0].generate()
                + noise.saws[1].generate()
                + noise.saws[2].generate())
                / 3.0;
            sample += noise.bandpass.process(raw) * noise.level;
        }

        sample = self.filter.process(sample);
        if let Some(f2) = &mut self.filter2 {
            sample = f2.process(sample);
        }

        self.filter_env.process();
        let amp = self.amp_env.process() * self.velocity;

        let amp_mod = match &self.lfo {
            Some(stage) => (1.0 + self.lfo_value * stage.to_amp).max(0.0),
            None => 1.0,
        };

        sample * amp * amp_mod
    }

    /// This voice's contribution to master filter modulation
    pub fn master_filter_mod(&self) -> f32 {
        match &self.lfo {
            Some(stage) => self.lfo_value * stage.to_filter * MASTER_LFO_DEPTH,
            None => 0.0,
        }
    }

    /// Control-rate update: advance the LFO and retune the filter and pitch
    fn update_modulation(&mut self) {
        let mut lfo_filter = 0.0;
        if let Some(stage) = &mut self.lfo {
            if stage.delay_remaining > 0 {
                stage.delay_remaining -= 1;
                self.lfo_value = 0.0;
            } else {
                self.lfo_value = stage.lfo.process();
            }
            lfo_filter = self.lfo_value * stage.to_filter;

            if stage.to_pitch != 0.0 {
                // Vibrato in semitones
                let factor = 2f32.powf(self.lfo_value * stage.to_pitch / 12.0);
                for osc in &mut self.oscs {
                    osc.osc.set_frequency(osc.base_frequency * factor);
                }
            }
        }

        let cutoff = self.base_cutoff
            * (1.0 + self.env_amount * self.filter_env.level())
            * 2f32.powf(lfo_filter);
        self.filter.set_cutoff(cutoff);
        if let Some(f2) = &mut self.filter2 {
            f2.set_cutoff(cutoff);
        }
    }

    /// Live-patch the filter type
    pub fn set_filter_kind(&mut self, kind: FilterType) {
        self.filter.set_type(kind);
        if let Some(f2) = &mut self.filter2 {
            f2.set_type(kind);
        }
    }

    /// Live-patch the base cutoff, preserving this voice's key tracking
    pub fn scale_cutoff(&mut self, old_base: f32, new_base: f32) {
        if old_base > 0.0 {
            self.base_cutoff *= new_base / old_base;
        }
    }

    /// Live-patch the filter envelope depth
    pub fn set_env_amount(&mut self, amount: f32) {
        self.env_amount = amount;
    }

    /// Live-patch the LFO rate
    pub fn set_lfo_rate(&mut self, rate: f32) {
        if let Some(stage) = &mut self.lfo {
            stage.lfo.set_frequency(rate);
        }
    }

    /// Live-patch the LFO shape
    pub fn set_lfo_shape(&mut self, shape: crate::dsp::LfoShape) {
        if let Some(stage) = &mut self.lfo {
            stage.lfo.set_shape(shape);
        }
    }

    /// Live-patch the LFO depth
    pub fn set_lfo_amount(&mut self, amount: f32) {
        if let Some(stage) = &mut self.lfo {
            stage.lfo.set_depth(amount);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::params::ParamValue;

    const SR: f32 = 44100.0;

    fn make_voice(params: &VoiceParameters, note: i32, velocity: f32) -> Voice {
        let plan = VoicePlan::build(params, note, velocity);
        Voice::from_plan(&plan, 1, SR, Duration::ZERO).unwrap()
    }

    #[test]
    fn test_note_frequency() {
        assert!((note_frequency(69) - 440.0).abs() < 0.001);
        assert!((note_frequency(81) - 880.0).abs() < 0.001);
        assert!((note_frequency(57) - 220.0).abs() < 0.001);
    }

    #[test]
    fn test_plan_octave_scaling() {
        let mut params = VoiceParameters::default();
        params.update("synth", "osc1.octave", &ParamValue::Number(1.0));

        let plan = VoicePlan::build(&params, 69, 1.0);
        assert!((plan.oscs[0].frequency - 880.0).abs() < 0.01);
    }

    #[test]
    fn test_plan_cents_detune() {
        let mut params = VoiceParameters::default();
        params.update("synth", "osc1.cents", &ParamValue::Number(100.0));

        // 100 cents is one semitone
        let plan = VoicePlan::build(&params, 69, 1.0);
        let semitone_up = note_frequency(70);
        assert!((plan.oscs[0].frequency - semitone_up).abs() < 0.01);
    }

    #[test]
    fn test_plan_antialias_cutoff() {
        let params = VoiceParameters::default();

        let plan = VoicePlan::build(&params, 69, 1.0);
        assert!((plan.oscs[0].antialias_cutoff - 1760.0).abs() < 0.1);

        // High notes hit the ceiling
        let plan = VoicePlan::build(&params, 120, 1.0);
        assert_eq!(plan.oscs[0].antialias_cutoff, 8000.0);
    }

    #[test]
    fn test_plan_skips_muted_oscillators() {
        let params = VoiceParameters::default();

        // Defaults mute osc2 and osc3
        let plan = VoicePlan::build(&params, 60, 1.0);
        assert_eq!(plan.oscs.len(), 1);
    }

    #[test]
    fn test_plan_noise_stage_gated_by_level() {
        let mut params = VoiceParameters::default();
        assert!(VoicePlan::build(&params, 60, 1.0).noise.is_none());

        params.update("synth", "noise.level", &ParamValue::Number(0.5));
        let plan = VoicePlan::build(&params, 60, 1.0);
        let noise = plan.noise.unwrap();
        assert_eq!(noise.level, 0.5);
        assert!((noise.bandpass_center - note_frequency(60) * 3.0).abs() < 0.01);
    }

    #[test]
    fn test_plan_lfo_stage_gated_by_amount() {
        let mut params = VoiceParameters::default();
        assert!(VoicePlan::build(&params, 60, 1.0).lfo.is_none());

        params.update("lfo", "amount", &ParamValue::Number(0.3));
        assert!(VoicePlan::build(&params, 60, 1.0).lfo.is_some());
    }

    #[test]
    fn test_plan_filter_lfo_depth_adds_to_routing() {
        let mut params = VoiceParameters::default();
        params.update("lfo", "amount", &ParamValue::Number(0.3));
        params.update("filter", "lfo_amount", &ParamValue::Number(0.5));

        let plan = VoicePlan::build(&params, 60, 1.0);
        let lfo = plan.lfo.unwrap();
        assert!((lfo.to_filter - 1.5).abs() < 0.001);
    }

    #[test]
    fn test_voice_starts_quiet() {
        let params = VoiceParameters::default();
        let mut voice = make_voice(&params, 60, 1.0);

        // The attack floor keeps the first sample near silence
        let first = voice.render();
        assert!(first.abs() <= 0.02, "first sample too loud: {}", first);
    }

    #[test]
    fn test_voice_produces_audio() {
        let params = VoiceParameters::default();
        let mut voice = make_voice(&params, 60, 1.0);

        let mut peak = 0.0f32;
        for _ in 0..4410 {
            peak = peak.max(voice.render().abs());
        }
        assert!(peak > 0.05, "voice stayed silent, peak {}", peak);
    }

    #[test]
    fn test_voice_state_machine() {
        let mut params = VoiceParameters::default();
        params.update("amp_env", "attack", &ParamValue::Number(0.01));
        params.update("amp_env", "decay", &ParamValue::Number(0.01));
        let mut voice = make_voice(&params, 60, 1.0);

        assert_eq!(voice.state(), VoiceState::Attack);

        // Run past attack and decay
        for _ in 0..(SR * 0.05) as usize {
            voice.render();
        }
        assert_eq!(voice.state(), VoiceState::Sustain);

        voice.note_off(Duration::from_millis(50));
        for _ in 0..10 {
            voice.render();
        }
        assert_eq!(voice.state(), VoiceState::Release);

        // Run past the release ramp
        for _ in 0..(SR * 0.5) as usize {
            voice.render();
        }
        assert_eq!(voice.state(), VoiceState::Terminated);
    }

    #[test]
    fn test_removal_waits_for_release_ramp() {
        let mut params = VoiceParameters::default();
        params.update("amp_env", "release", &ParamValue::Number(0.5));
        let mut voice = make_voice(&params, 60, 1.0);

        voice.note_off(Duration::from_secs(2));

        assert!(!voice.is_finished(Duration::from_secs(2)));
        assert!(!voice.is_finished(Duration::from_millis(2400)));
        assert!(voice.is_finished(Duration::from_millis(2500)));
    }

    #[test]
    fn test_note_off_idempotent() {
        let params = VoiceParameters::default();
        let mut voice = make_voice(&params, 60, 1.0);

        voice.note_off(Duration::from_secs(1));
        let first = voice.release_at;
        voice.note_off(Duration::from_secs(5));
        assert_eq!(voice.release_at, first);
    }

    #[test]
    fn test_watchdog_expiry() {
        let params = VoiceParameters::default();
        let mut voice = make_voice(&params, 60, 1.0);

        assert!(!voice.watchdog_expired(Duration::from_secs(9)));
        assert!(voice.watchdog_expired(Duration::from_secs(10)));

        // A releasing voice is off the watchdog's hands
        voice.note_off(Duration::from_secs(9));
        assert!(!voice.watchdog_expired(Duration::from_secs(11)));
    }

    #[test]
    fn test_velocity_scales_output() {
        let params = VoiceParameters::default();
        let mut loud = make_voice(&params, 60, 1.0);
        let mut soft = make_voice(&params, 60, 0.25);

        let mut loud_peak = 0.0f32;
        let mut soft_peak = 0.0f32;
        for _ in 0..4410 {
            loud_peak = loud_peak.max(loud.render().abs());
            soft_peak = soft_peak.max(soft.render().abs());
        }
        assert!(loud_peak > soft_peak * 2.0);
    }

    #[test]
    fn test_db24_slope_builds_second_filter() {
        let mut params = VoiceParameters::default();
        params.update("filter", "slope", &ParamValue::Number(24.0));

        let voice = make_voice(&params, 60, 1.0);
        assert!(voice.filter2.is_some());
    }
}
