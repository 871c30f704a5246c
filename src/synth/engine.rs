//! Polyphonic voice engine
//!
//! Owns the active voice map and the global parameter store. Notes are keyed
//! by MIDI number: retriggering a held note replaces its voice. The engine
//! never fails a real-time call; a voice that cannot be built is logged and
//! skipped, and everything else keeps playing.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, warn};

use crate::dsp::{FilterType, LfoShape};
use crate::synth::params::{ParamValue, VoiceParameters};
use crate::synth::voice::{Voice, VoicePlan};

/// Polyphonic voice engine
pub struct VoiceEngine {
    sample_rate: f32,
    params: VoiceParameters,
    /// Active voices keyed by note number
    voices: HashMap<i32, Voice>,
    next_id: u64,
}

impl VoiceEngine {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            params: VoiceParameters::default(),
            voices: HashMap::new(),
            next_id: 1,
        }
    }

    /// Read access to the global parameters
    pub fn params(&self) -> &VoiceParameters {
        &self.params
    }

    /// Number of currently active voices
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Notes with an active voice, sorted ascending
    pub fn active_notes(&self) -> Vec<i32> {
        let mut notes: Vec<i32> = self.voices.keys().copied().collect();
        notes.sort_unstable();
        notes
    }

    /// Start a voice for `note`, replacing any voice already on it
    ///
    /// The held voice is terminated before the replacement is built, so a
    /// failed build leaves the note silent rather than sounding the old
    /// voice.
    pub fn note_on(&mut self, note: i32, velocity: f32, now: Duration) {
        if self.voices.remove(&note).is_some() {
            debug!(note, "retriggered held note");
        }

        let plan = VoicePlan::build(&self.params, note, velocity);
        match Voice::from_plan(&plan, self.next_id, self.sample_rate, now) {
            Ok(voice) => {
                self.next_id += 1;
                self.voices.insert(note, voice);
            }
            Err(err) => {
                warn!(note, %err, "voice construction failed");
            }
        }
    }

    /// Release the voice on `note`. No-op when the note is not held.
    pub fn note_off(&mut self, note: i32, now: Duration) {
        if let Some(voice) = self.voices.get_mut(&note) {
            voice.note_off(now);
        }
    }

    /// Drop every voice immediately, without a release ramp
    pub fn stop_all(&mut self) {
        self.voices.clear();
    }

    /// Housekeeping sweep: force-release watchdog-expired voices and remove
    /// voices whose release ramp has ended. Called once per audio block.
    pub fn advance(&mut self, now: Duration) {
        for voice in self.voices.values_mut() {
            if voice.watchdog_expired(now) {
                warn!(note = voice.note(), "watchdog releasing stuck voice");
                voice.note_off(now);
            }
        }
        self.voices.retain(|_, voice| !voice.is_finished(now));
    }

    /// Render one sample: the summed voice output and the accumulated
    /// master filter LFO modulation.
    pub fn render(&mut self) -> (f32, f32) {
        let mut sample = 0.0;
        let mut master_mod = 0.0;
        for voice in self.voices.values_mut() {
            sample += voice.render();
            master_mod += voice.master_filter_mod();
        }
        (sample, master_mod)
    }

    /// Apply a parameter update to the store and live-patch active voices
    ///
    /// New voices always read the updated store; only the parameters a voice
    /// can change mid-flight are pushed onto running voices.
    pub fn update_param(&mut self, section: &str, path: &str, value: &ParamValue) -> bool {
        let old_cutoff = self.params.filter.cutoff;

        if !self.params.update(section, path, value) {
            debug!(section, path, "ignored unknown parameter");
            return false;
        }

        match (section, path) {
            ("filter", "type") => {
                for voice in self.voices.values_mut() {
                    voice.set_filter_kind(self.params.filter.kind);
                }
            }
            ("filter", "cutoff") => {
                let new_cutoff = self.params.filter.cutoff;
                for voice in self.voices.values_mut() {
                    voice.scale_cutoff(old_cutoff, new_cutoff);
                }
            }
            ("filter", "env_amount") => {
                for voice in self.voices.values_mut() {
                    voice.set_env_amount(self.params.filter.env_amount);
                }
            }
            ("lfo", "rate") => {
                for voice in self.voices.values_mut() {
                    voice.set_lfo_rate(self.params.lfo.rate);
                }
            }
            ("lfo", "waveform") => {
                for voice in self.voices.values_mut() {
                    voice.set_lfo_shape(self.params.lfo.waveform);
                }
            }
            ("lfo", "amount") => {
                for voice in self.voices.values_mut() {
                    voice.set_lfo_amount(self.params.lfo.amount);
                }
            }
            _ => {}
        }

        true
    }

    /// Convenience accessors used by live-patch routing
    pub fn filter_kind(&self) -> FilterType {
        self.params.filter.kind
    }

    pub fn lfo_shape(&self) -> LfoShape {
        self.params.lfo.waveform
    }
}
