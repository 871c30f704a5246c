//! Global voice parameters
//!
//! Single-writer parameter store read at voice creation and live-patched onto
//! active voices by [`crate::synth::VoiceEngine::update_param`]. Every field
//! is reachable through the generic `(section, path, value)` mutation
//! entrypoint; unknown sections and paths are ignored, never errors.

use crate::dsp::{FilterType, LfoShape, Waveform};

/// A parameter update value
///
/// Knob turns arrive as numbers, selector switches as text, and effect
/// toggles as booleans.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Number(f32),
    Text(String),
    Toggle(bool),
}

impl ParamValue {
    /// Interpret the value as a number (toggles map to 0/1)
    pub fn as_number(&self) -> Option<f32> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Toggle(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Text(_) => None,
        }
    }

    /// Interpret the value as text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret the value as a boolean (numbers: nonzero is true)
    pub fn as_toggle(&self) -> Option<bool> {
        match self {
            Self::Toggle(b) => Some(*b),
            Self::Number(n) => Some(*n != 0.0),
            Self::Text(_) => None,
        }
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        Self::Number(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Number(v as f32)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        Self::Number(v as f32)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Toggle(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Filter slope selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSlope {
    Db12,
    Db24,
}

/// One oscillator's configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscConfig {
    pub waveform: Waveform,
    /// Octave offset (-3..=3)
    pub octave: i32,
    /// Fine tune in cents (-100..=100)
    pub cents: f32,
    /// Output level (0.0-1.0)
    pub level: f32,
}

impl Default for OscConfig {
    fn default() -> Self {
        Self {
            waveform: Waveform::Saw,
            octave: 0,
            cents: 0.0,
            level: 0.8,
        }
    }
}

/// Voice filter configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterConfig {
    /// Base cutoff in Hz
    pub cutoff: f32,
    /// Resonance (Q)
    pub resonance: f32,
    pub kind: FilterType,
    pub slope: FilterSlope,
    /// Filter envelope depth; cutoff swings to cutoff*(1+env_amount)
    pub env_amount: f32,
    /// LFO-to-cutoff depth (0.0-1.0)
    pub lfo_amount: f32,
    /// Keyboard tracking (0.0-1.0)
    pub key_tracking: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            cutoff: 2000.0,
            resonance: 0.707,
            kind: FilterType::LowPass,
            slope: FilterSlope::Db12,
            env_amount: 0.5,
            lfo_amount: 0.0,
            key_tracking: 0.0,
        }
    }
}

/// ADSR envelope configuration (times in seconds, sustain as a level)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvConfig {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            attack: 0.01,
            decay: 0.2,
            sustain: 0.7,
            release: 0.3,
        }
    }
}

/// LFO configuration with routing weights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LfoConfig {
    pub waveform: LfoShape,
    /// Rate in Hz
    pub rate: f32,
    /// Overall amount (0.0-1.0); a voice builds no LFO stage at 0
    pub amount: f32,
    /// Onset delay in seconds
    pub delay: f32,
    /// Routing weight to oscillator pitch
    pub to_pitch: f32,
    /// Routing weight to filter cutoff
    pub to_filter: f32,
    /// Routing weight to amplitude
    pub to_amp: f32,
}

impl Default for LfoConfig {
    fn default() -> Self {
        Self {
            waveform: LfoShape::Sine,
            rate: 2.0,
            amount: 0.0,
            delay: 0.0,
            to_pitch: 0.0,
            to_filter: 1.0,
            to_amp: 0.0,
        }
    }
}

/// Master filter settings at the head of the effects chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MasterFilterParams {
    pub cutoff: f32,
    pub resonance: f32,
    pub kind: FilterType,
}

impl Default for MasterFilterParams {
    fn default() -> Self {
        Self {
            cutoff: 8000.0,
            resonance: 0.707,
            kind: FilterType::LowPass,
        }
    }
}

/// Reverb settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbParams {
    pub enabled: bool,
    pub wet: f32,
    /// Room size (0.0-1.0); scales the generated impulse length
    pub room_size: f32,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            enabled: false,
            wet: 0.3,
            room_size: 0.5,
        }
    }
}

/// Delay settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayParams {
    pub enabled: bool,
    pub wet: f32,
    /// Delay time in seconds
    pub time: f32,
    /// Feedback gain; clamped below 1.0 by the effect itself
    pub feedback: f32,
}

impl Default for DelayParams {
    fn default() -> Self {
        Self {
            enabled: false,
            wet: 0.3,
            time: 0.35,
            feedback: 0.4,
        }
    }
}

/// Distortion settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistortionParams {
    pub enabled: bool,
    pub wet: f32,
    /// Drive amount (0.0-1.0); changing it recomputes the shaping curve
    pub amount: f32,
}

impl Default for DistortionParams {
    fn default() -> Self {
        Self {
            enabled: false,
            wet: 0.5,
            amount: 0.4,
        }
    }
}

/// Chorus settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChorusParams {
    pub enabled: bool,
    pub wet: f32,
    /// Modulation rate in Hz
    pub rate: f32,
    /// Modulation depth (0.0-1.0)
    pub depth: f32,
}

impl Default for ChorusParams {
    fn default() -> Self {
        Self {
            enabled: false,
            wet: 0.4,
            rate: 0.8,
            depth: 0.3,
        }
    }
}

/// All effect settings
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EffectsParams {
    pub filter: MasterFilterParams,
    pub reverb: ReverbParams,
    pub delay: DelayParams,
    pub distortion: DistortionParams,
    pub chorus: ChorusParams,
}

/// The complete global parameter set
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceParameters {
    pub osc: [OscConfig; 3],
    /// Noise level (0.0-1.0); a voice builds no noise stage at 0
    pub noise_level: f32,
    pub filter: FilterConfig,
    pub amp_env: EnvConfig,
    pub filter_env: EnvConfig,
    pub lfo: LfoConfig,
    pub effects: EffectsParams,
    pub master_volume: f32,
}

impl Default for VoiceParameters {
    fn default() -> Self {
        Self {
            osc: [
                OscConfig::default(),
                OscConfig {
                    waveform: Waveform::Square,
                    level: 0.0,
                    ..OscConfig::default()
                },
                OscConfig {
                    octave: -1,
                    level: 0.0,
                    ..OscConfig::default()
                },
            ],
            noise_level: 0.0,
            filter: FilterConfig::default(),
            amp_env: EnvConfig::default(),
            filter_env: EnvConfig {
                attack: 0.01,
                decay: 0.3,
                sustain: 0.3,
                release: 0.3,
            },
            lfo: LfoConfig::default(),
            effects: EffectsParams::default(),
            master_volume: 0.7,
        }
    }
}

impl VoiceParameters {
    /// Apply a single parameter update
    ///
    /// Returns `true` when the path addressed a known field and the value had
    /// a usable type. Unknown sections/paths return `false` so the caller can
    /// log at debug without failing.
    pub fn update(&mut self, section: &str, path: &str, value: &ParamValue) -> bool {
        match section {
            "synth" => self.update_synth(path, value),
            "filter" => self.update_filter(path, value),
            "amp_env" => Self::update_env(&mut self.amp_env, path, value),
            "filter_env" => Self::update_env(&mut self.filter_env, path, value),
            "lfo" => self.update_lfo(path, value),
            "effects" => self.update_effects(path, value),
            "master" => match path {
                "volume" => Self::set_unit(&mut self.master_volume, value),
                _ => false,
            },
            _ => false,
        }
    }

    fn update_synth(&mut self, path: &str, value: &ParamValue) -> bool {
        let Some((head, field)) = path.split_once('.') else {
            return false;
        };

        if head == "noise" {
            return match field {
                "level" => Self::set_unit(&mut self.noise_level, value),
                _ => false,
            };
        }

        let osc = match head {
            "osc1" => &mut self.osc[0],
            "osc2" => &mut self.osc[1],
            "osc3" => &mut self.osc[2],
            _ => return false,
        };

        match field {
            "waveform" => match value.as_text().and_then(Waveform::from_name) {
                Some(w) => {
                    osc.waveform = w;
                    true
                }
                None => false,
            },
            "octave" => match value.as_number() {
                Some(n) => {
                    osc.octave = (n.round() as i32).clamp(-3, 3);
                    true
                }
                None => false,
            },
            "cents" => match value.as_number() {
                Some(n) => {
                    osc.cents = n.clamp(-100.0, 100.0);
                    true
                }
                None => false,
            },
            "level" => Self::set_unit(&mut osc.level, value),
            _ => false,
        }
    }

    fn update_filter(&mut self, path: &str, value: &ParamValue) -> bool {
        match path {
            "cutoff" => match value.as_number() {
                Some(n) => {
                    self.filter.cutoff = n.clamp(20.0, 20000.0);
                    true
                }
                None => false,
            },
            "resonance" => match value.as_number() {
                Some(n) => {
                    self.filter.resonance = n.clamp(0.1, 20.0);
                    true
                }
                None => false,
            },
            "type" => match value.as_text().and_then(FilterType::from_name) {
                Some(kind) => {
                    self.filter.kind = kind;
                    true
                }
                None => false,
            },
            "slope" => match value.as_number() {
                Some(n) if n as i32 == 24 => {
                    self.filter.slope = FilterSlope::Db24;
                    true
                }
                Some(n) if n as i32 == 12 => {
                    self.filter.slope = FilterSlope::Db12;
                    true
                }
                _ => false,
            },
            "env_amount" => match value.as_number() {
                Some(n) => {
                    self.filter.env_amount = n.clamp(0.0, 4.0);
                    true
                }
                None => false,
            },
            "lfo_amount" => Self::set_unit(&mut self.filter.lfo_amount, value),
            "key_tracking" => Self::set_unit(&mut self.filter.key_tracking, value),
            _ => false,
        }
    }

    fn update_env(env: &mut EnvConfig, path: &str, value: &ParamValue) -> bool {
        let Some(n) = value.as_number() else {
            return false;
        };
        match path {
            "attack" => env.attack = n.clamp(0.001, 10.0),
            "decay" => env.decay = n.clamp(0.001, 10.0),
            "sustain" => env.sustain = n.clamp(0.0, 1.0),
            "release" => env.release = n.clamp(0.001, 10.0),
            _ => return false,
        }
        true
    }

    fn update_lfo(&mut self, path: &str, value: &ParamValue) -> bool {
        match path {
            "waveform" => match value.as_text().and_then(LfoShape::from_name) {
                Some(shape) => {
                    self.lfo.waveform = shape;
                    true
                }
                None => false,
            },
            "rate" => match value.as_number() {
                Some(n) => {
                    self.lfo.rate = n.clamp(0.01, 100.0);
                    true
                }
                None => false,
            },
            "amount" => Self::set_unit(&mut self.lfo.amount, value),
            "delay" => match value.as_number() {
                Some(n) => {
                    self.lfo.delay = n.clamp(0.0, 10.0);
                    true
                }
                None => false,
            },
            "to_pitch" => Self::set_unit(&mut self.lfo.to_pitch, value),
            "to_filter" => Self::set_unit(&mut self.lfo.to_filter, value),
            "to_amp" => Self::set_unit(&mut self.lfo.to_amp, value),
            _ => false,
        }
    }

    fn update_effects(&mut self, path: &str, value: &ParamValue) -> bool {
        let Some((effect, field)) = path.split_once('.') else {
            return false;
        };

        match (effect, field) {
            ("filter", "cutoff") => match value.as_number() {
                Some(n) => {
                    self.effects.filter.cutoff = n.clamp(20.0, 20000.0);
                    true
                }
                None => false,
            },
            ("filter", "resonance") => match value.as_number() {
                Some(n) => {
                    self.effects.filter.resonance = n.clamp(0.1, 20.0);
                    true
                }
                None => false,
            },
            ("filter", "type") => match value.as_text().and_then(FilterType::from_name) {
                Some(kind) => {
                    self.effects.filter.kind = kind;
                    true
                }
                None => false,
            },
            ("reverb", "enabled") => Self::set_toggle(&mut self.effects.reverb.enabled, value),
            ("reverb", "wet") => Self::set_unit(&mut self.effects.reverb.wet, value),
            ("reverb", "room_size") => Self::set_unit(&mut self.effects.reverb.room_size, value),
            ("delay", "enabled") => Self::set_toggle(&mut self.effects.delay.enabled, value),
            ("delay", "wet") => Self::set_unit(&mut self.effects.delay.wet, value),
            ("delay", "time") => match value.as_number() {
                Some(n) => {
                    self.effects.delay.time = n.clamp(0.01, 2.0);
                    true
                }
                None => false,
            },
            ("delay", "feedback") => Self::set_unit(&mut self.effects.delay.feedback, value),
            ("distortion", "enabled") => {
                Self::set_toggle(&mut self.effects.distortion.enabled, value)
            }
            ("distortion", "wet") => Self::set_unit(&mut self.effects.distortion.wet, value),
            ("distortion", "amount") => Self::set_unit(&mut self.effects.distortion.amount, value),
            ("chorus", "enabled") => Self::set_toggle(&mut self.effects.chorus.enabled, value),
            ("chorus", "wet") => Self::set_unit(&mut self.effects.chorus.wet, value),
            ("chorus", "rate") => match value.as_number() {
                Some(n) => {
                    self.effects.chorus.rate = n.clamp(0.01, 10.0);
                    true
                }
                None => false,
            },
            ("chorus", "depth") => Self::set_unit(&mut self.effects.chorus.depth, value),
            _ => false,
        }
    }

    fn set_unit(target: &mut f32, value: &ParamValue) -> bool {
        match value.as_number() {
            Some(n) => {
                *target = n.clamp(0.0, 1.0);
                true
            }
            None => false,
        }
    }

    fn set_toggle(target: &mut bool, value: &ParamValue) -> bool {
        match value.as_toggle() {
            Some(b) => {
                *target = b;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_osc_level() {
        let mut params = VoiceParameters::default();
        assert!(params.update("synth", "osc1.level", &ParamValue::Number(0.5)));
        assert_eq!(params.osc[0].level, 0.5);
    }

    #[test]
    fn test_update_osc_waveform_by_name() {
        let mut params = VoiceParameters::default();
        assert!(params.update("synth", "osc2.waveform", &"square".into()));
        assert_eq!(params.osc[1].waveform, Waveform::Square);
    }

    #[test]
    fn test_update_clamps_octave() {
        let mut params = VoiceParameters::default();
        assert!(params.update("synth", "osc1.octave", &ParamValue::Number(7.0)));
        assert_eq!(params.osc[0].octave, 3);
    }

    #[test]
    fn test_update_filter_cutoff() {
        let mut params = VoiceParameters::default();
        assert!(params.update("filter", "cutoff", &ParamValue::Number(800.0)));
        assert_eq!(params.filter.cutoff, 800.0);
    }

    #[test]
    fn test_update_envelope() {
        let mut params = VoiceParameters::default();
        assert!(params.update("amp_env", "release", &ParamValue::Number(1.5)));
        assert_eq!(params.amp_env.release, 1.5);

        assert!(params.update("filter_env", "sustain", &ParamValue::Number(0.2)));
        assert_eq!(params.filter_env.sustain, 0.2);
    }

    #[test]
    fn test_update_effects_dotted_path() {
        let mut params = VoiceParameters::default();
        assert!(params.update("effects", "reverb.wet", &ParamValue::Number(0.6)));
        assert_eq!(params.effects.reverb.wet, 0.6);

        assert!(params.update("effects", "delay.enabled", &ParamValue::Toggle(true)));
        assert!(params.effects.delay.enabled);
    }

    #[test]
    fn test_unknown_section_ignored() {
        let mut params = VoiceParameters::default();
        let before = params.clone();

        assert!(!params.update("bogus", "osc1.level", &ParamValue::Number(0.5)));
        assert!(!params.update("synth", "osc9.level", &ParamValue::Number(0.5)));
        assert!(!params.update("filter", "nonexistent", &ParamValue::Number(0.5)));
        assert_eq!(params, before);
    }

    #[test]
    fn test_wrong_value_type_ignored() {
        let mut params = VoiceParameters::default();
        assert!(!params.update("synth", "osc1.waveform", &ParamValue::Number(3.0)));
        assert!(!params.update("filter", "cutoff", &"loud".into()));
    }

    #[test]
    fn test_master_volume() {
        let mut params = VoiceParameters::default();
        assert!(params.update("master", "volume", &ParamValue::Number(0.9)));
        assert_eq!(params.master_volume, 0.9);
    }

    #[test]
    fn test_filter_slope() {
        let mut params = VoiceParameters::default();
        assert!(params.update("filter", "slope", &ParamValue::Number(24.0)));
        assert_eq!(params.filter.slope, FilterSlope::Db24);
    }
}
