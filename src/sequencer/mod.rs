//! Step sequencer
//!
//! Sixteen-step drum sequencer: the clock decides when steps fire, the
//! pattern bank decides what fires, and the sequencer turns fired steps into
//! sample playbacks. Playback is monophonic per instrument; a retrigger
//! chokes the sound already playing.

pub mod clock;
mod pattern;

pub use clock::{ClockTuning, StepClock, StepEvent, STEP_COUNT};
pub use pattern::{PatternBank, StepPattern};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

use crate::sampler::{DrumParams, Instrument, SampleBuffer, SampleRepository};

/// A sample in flight
struct SamplePlayback {
    buffer: Arc<SampleBuffer>,
    /// Read position in buffer frames
    pos: f32,
    /// Position increment per output frame
    rate: f32,
    gain: f32,
    /// Frames of silence before the sample starts, from lookahead scheduling
    delay_frames: u32,
}

impl SamplePlayback {
    fn finished(&self) -> bool {
        self.pos as usize >= self.buffer.data.len()
    }

    /// Render one frame and advance
    fn next_frame(&mut self) -> f32 {
        if self.delay_frames > 0 {
            self.delay_frames -= 1;
            return 0.0;
        }

        let idx = self.pos as usize;
        if idx >= self.buffer.data.len() {
            return 0.0;
        }
        let frac = self.pos - idx as f32;
        let a = self.buffer.data[idx];
        let b = *self.buffer.data.get(idx + 1).unwrap_or(&a);
        let sample = a * (1.0 - frac) + b * frac;

        self.pos += self.rate;
        sample * self.gain
    }
}

/// The drum sequencer
pub struct StepSequencer {
    sample_rate: f32,
    clock: StepClock,
    patterns: PatternBank,
    drum_params: HashMap<Instrument, DrumParams>,
    playbacks: HashMap<Instrument, SamplePlayback>,
    /// Sequencer bus volume
    volume: f32,
    last_step: Option<usize>,
}

impl StepSequencer {
    pub fn new(sample_rate: f32, tempo: f32, tuning: ClockTuning) -> Self {
        let mut drum_params = HashMap::new();
        for instrument in Instrument::ALL {
            drum_params.insert(instrument, DrumParams::default());
        }

        Self {
            sample_rate,
            clock: StepClock::new(tempo, tuning),
            patterns: PatternBank::new(),
            drum_params,
            playbacks: HashMap::new(),
            volume: 0.8,
            last_step: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    pub fn tempo(&self) -> f32 {
        self.clock.tempo()
    }

    pub fn set_tempo(&mut self, bpm: f32, now: Duration) {
        self.clock.set_tempo(bpm, now);
    }

    /// The most recently fired step, for display
    pub fn last_step(&self) -> Option<usize> {
        self.last_step
    }

    pub fn patterns(&self) -> &PatternBank {
        &self.patterns
    }

    pub fn toggle_step(&mut self, instrument: Instrument, step: usize) {
        self.patterns.pattern_mut(instrument).toggle(step);
    }

    pub fn load_preset(&mut self, name: &str) -> bool {
        self.patterns.load_preset(name)
    }

    pub fn clear_patterns(&mut self) {
        self.patterns.clear_all();
    }

    /// Set the sequencer bus volume (0.0-1.0)
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn drum_params(&self, instrument: Instrument) -> DrumParams {
        self.drum_params
            .get(&instrument)
            .copied()
            .unwrap_or_default()
    }

    /// Set one drum knob by name. Unknown knobs return false.
    pub fn set_drum_param(&mut self, instrument: Instrument, knob: &str, value: f32) -> bool {
        let Some(params) = self.drum_params.get_mut(&instrument) else {
            return false;
        };
        match knob {
            "volume" => params.volume = value.clamp(0.0, 1.0),
            "tune" => params.tune = value.clamp(0.0, 1.0),
            "decay" => params.decay = value.clamp(0.0, 1.0),
            "snappy" => params.snappy = value.clamp(0.0, 1.0),
            _ => return false,
        }
        true
    }

    /// Start the clock from step 0
    pub fn start(&mut self, now: Duration) {
        self.clock.start(now);
        self.last_step = None;
    }

    /// Stop the clock and force-stop everything in flight
    pub fn stop(&mut self) {
        self.clock.stop();
        self.playbacks.clear();
    }

    /// Advance the clock; fire and schedule any due step
    ///
    /// Returns the step that fired, if one did. Early-fired steps carry
    /// their remaining lead time into the playback as a frame delay.
    pub fn tick(&mut self, now: Duration, repo: &mut SampleRepository) -> Option<usize> {
        let event = self.clock.tick(now)?;

        let lead = event.due_at.saturating_sub(now);
        let delay_frames = (lead.as_secs_f32() * self.sample_rate) as u32;

        for instrument in self.patterns.active_at(event.step) {
            self.trigger(instrument, repo, delay_frames);
        }

        trace!(step = event.step, delay_frames, "step fired");
        self.last_step = Some(event.step);
        Some(event.step)
    }

    /// Start a playback for one instrument, choking any in flight
    fn trigger(&mut self, instrument: Instrument, repo: &mut SampleRepository, delay_frames: u32) {
        let params = self.drum_params(instrument);
        let buffer = repo.resolve(instrument, &params);

        // Unity playback: the rate only corrects for sample-rate mismatch
        let rate = buffer.sample_rate as f32 / self.sample_rate;

        self.playbacks.insert(
            instrument,
            SamplePlayback {
                buffer,
                pos: 0.0,
                rate,
                gain: params.volume,
                delay_frames,
            },
        );
    }

    /// Render one frame of the drum bus
    pub fn render(&mut self) -> f32 {
        let mut sample = 0.0;
        for playback in self.playbacks.values_mut() {
            sample += playback.next_frame();
        }
        self.playbacks.retain(|_, p| !p.finished());
        sample * self.volume
    }

    /// Whether any sample is currently playing
    pub fn is_audible(&self) -> bool {
        !self.playbacks.is_empty()
    }
}
