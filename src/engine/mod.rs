//! Audio engine
//!
//! Ties the subsystems together: the polyphonic voice engine, the drum
//! sequencer and its sample repository, and the shared effects bus. The
//! engine keeps two clocks: the caller's wall clock drives scheduling
//! (steps, voice lifecycle), and the audio clock, counted in rendered
//! frames, measures what has actually been produced.

mod player;
mod recorder;

pub use player::{default_device_name, list_output_devices, Player};
pub use recorder::Recorder;

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::effects::EffectsChain;
use crate::sampler::{Instrument, SampleRepository};
use crate::sequencer::{PatternBank, StepSequencer};
use crate::synth::{ParamValue, VoiceEngine};

/// Whether the engine currently has an output to render into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputState {
    Running,
    /// No output; notes queue instead of playing
    Suspended,
}

/// Snapshot of the engine for display
#[derive(Debug, Clone)]
pub struct EngineState {
    pub sequencer_running: bool,
    pub tempo: f32,
    pub last_step: Option<usize>,
    pub active_notes: Vec<i32>,
    pub voice_count: usize,
    pub suspended: bool,
}

/// The main audio engine
pub struct Groovebox {
    sample_rate: f32,
    voices: VoiceEngine,
    sequencer: StepSequencer,
    repository: SampleRepository,
    effects: EffectsChain,
    output_state: OutputState,
    /// Notes received while suspended, replayed on resume
    pending_notes: Vec<(i32, f32)>,
    /// Audio clock: frames rendered since creation
    frames_rendered: u64,
}

impl Groovebox {
    /// Create an engine from configuration
    pub fn new(config: &EngineConfig) -> Self {
        let sample_rate = config.audio.sample_rate as f32;

        let mut voices = VoiceEngine::new(sample_rate);
        voices.update_param(
            "master",
            "volume",
            &ParamValue::Number(config.master.volume),
        );

        Self {
            sample_rate,
            voices,
            sequencer: StepSequencer::new(sample_rate, config.master.tempo, config.clock.tuning()),
            repository: SampleRepository::new(config.audio.sample_rate),
            effects: EffectsChain::new(sample_rate),
            output_state: OutputState::Running,
            pending_notes: Vec::new(),
            frames_rendered: 0,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Time elapsed on the audio clock
    pub fn audio_time(&self) -> Duration {
        Duration::from_secs_f64(self.frames_rendered as f64 / self.sample_rate as f64)
    }

    /// Load drum samples from a directory
    pub async fn load_samples(&mut self, dir: &Path) -> anyhow::Result<usize> {
        Ok(self.repository.load_all(dir).await?)
    }

    /// Play a note. While suspended the note queues instead.
    pub fn note_on(&mut self, note: i32, velocity: f32, now: Duration) {
        if self.output_state == OutputState::Suspended {
            debug!(note, "queueing note while suspended");
            self.pending_notes.push((note, velocity));
            return;
        }
        self.voices.note_on(note, velocity, now);
    }

    /// Release a note
    pub fn note_off(&mut self, note: i32, now: Duration) {
        self.pending_notes.retain(|(n, _)| *n != note);
        self.voices.note_off(note, now);
    }

    /// Terminate every voice and force-stop the drum bus, no release ramp
    pub fn stop_all(&mut self) {
        self.pending_notes.clear();
        self.voices.stop_all();
        self.sequencer.stop();
    }

    /// Apply a parameter update
    pub fn update_param(&mut self, section: &str, path: &str, value: &ParamValue) -> bool {
        self.voices.update_param(section, path, value)
    }

    /// Mark the output gone; notes queue until [`resume`](Self::resume)
    pub fn suspend(&mut self) {
        if self.output_state != OutputState::Suspended {
            info!("engine suspended");
            self.output_state = OutputState::Suspended;
        }
    }

    /// Restore output and replay any queued notes
    pub fn resume(&mut self, now: Duration) {
        if self.output_state == OutputState::Suspended {
            info!(pending = self.pending_notes.len(), "engine resumed");
            self.output_state = OutputState::Running;
            for (note, velocity) in std::mem::take(&mut self.pending_notes) {
                self.voices.note_on(note, velocity, now);
            }
        }
    }

    pub fn output_state(&self) -> OutputState {
        self.output_state
    }

    // Sequencer surface

    pub fn start_sequencer(&mut self, now: Duration) {
        self.sequencer.start(now);
    }

    pub fn stop_sequencer(&mut self) {
        self.sequencer.stop();
    }

    pub fn set_tempo(&mut self, bpm: f32, now: Duration) {
        self.sequencer.set_tempo(bpm, now);
    }

    pub fn toggle_step(&mut self, instrument: Instrument, step: usize) {
        self.sequencer.toggle_step(instrument, step);
    }

    pub fn load_preset(&mut self, name: &str) -> bool {
        self.sequencer.load_preset(name)
    }

    pub fn set_drum_param(&mut self, instrument: Instrument, knob: &str, value: f32) -> bool {
        self.sequencer.set_drum_param(instrument, knob, value)
    }

    pub fn set_sequencer_volume(&mut self, volume: f32) {
        self.sequencer.set_volume(volume);
    }

    /// Current patterns, for display
    pub fn patterns(&self) -> &PatternBank {
        self.sequencer.patterns()
    }

    /// Snapshot of engine state, for display
    pub fn state(&self) -> EngineState {
        EngineState {
            sequencer_running: self.sequencer.is_running(),
            tempo: self.sequencer.tempo(),
            last_step: self.sequencer.last_step(),
            active_notes: self.voices.active_notes(),
            voice_count: self.voices.voice_count(),
            suspended: self.output_state == OutputState::Suspended,
        }
    }

    /// Render one block of mono audio
    ///
    /// `now` is the caller's wall clock. Scheduling (step firing, voice
    /// housekeeping) happens once per block; rendering advances the audio
    /// clock by the buffer length.
    pub fn process_block(&mut self, now: Duration, buffer: &mut [f32]) {
        self.sequencer.tick(now, &mut self.repository);
        self.voices.advance(now);

        let params = self.voices.params();
        let effects_params = params.effects;
        let master_volume = params.master_volume;
        self.effects.apply(&effects_params, master_volume);

        for sample in buffer.iter_mut() {
            let (synth, master_mod) = self.voices.render();
            let drums = self.sequencer.render();

            self.effects.set_lfo_mod(master_mod);
            *sample = self.effects.process(synth + drums);
        }

        self.frames_rendered += buffer.len() as u64;
    }
}
