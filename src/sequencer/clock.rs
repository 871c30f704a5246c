//! Drift-corrected step clock
//!
//! Sixteenth-note clock driven by the caller's wall clock. Steps fire up to
//! a lookahead window early so triggers can be scheduled sample-accurately.
//! When a step fires later than the resync threshold the clock re-anchors
//! instead of letting the error accumulate; on-time steps advance by exact
//! step durations so rounding never drifts the grid.

use std::time::Duration;

use tracing::debug;

/// Steps per pattern
pub const STEP_COUNT: usize = 16;

/// Clock scheduling parameters
#[derive(Debug, Clone, Copy)]
pub struct ClockTuning {
    /// Lateness beyond this re-anchors the grid
    pub resync_threshold: Duration,
    /// Steps may fire this far ahead of their deadline
    pub lookahead: Duration,
}

impl Default for ClockTuning {
    fn default() -> Self {
        Self {
            resync_threshold: Duration::from_millis(5),
            lookahead: Duration::from_millis(5),
        }
    }
}

/// A step that fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepEvent {
    /// Step index, 0..16
    pub step: usize,
    /// Time the step is due; at or shortly after `now` when fired early
    pub due_at: Duration,
}

/// The step clock
pub struct StepClock {
    tempo: f32,
    running: bool,
    step: usize,
    next_step_at: Duration,
    tuning: ClockTuning,
}

impl StepClock {
    pub fn new(tempo: f32, tuning: ClockTuning) -> Self {
        Self {
            tempo: tempo.clamp(20.0, 300.0),
            running: false,
            step: 0,
            next_step_at: Duration::ZERO,
            tuning,
        }
    }

    pub fn tempo(&self) -> f32 {
        self.tempo
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The step the clock will fire next
    pub fn current_step(&self) -> usize {
        self.step
    }

    /// Duration of one sixteenth note at the current tempo
    pub fn step_duration(&self) -> Duration {
        Duration::from_secs_f32(60.0 / (4.0 * self.tempo))
    }

    /// Start from step 0; the first step is due one step duration out
    pub fn start(&mut self, now: Duration) {
        self.running = true;
        self.step = 0;
        self.next_step_at = now + self.step_duration();
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Change tempo
    ///
    /// While running, the pending step is rescheduled so the fraction of a
    /// step remaining until it fires carries over to the new step duration;
    /// the grid's phase is preserved across the change. While stopped, the
    /// clock starts at the new tempo.
    pub fn set_tempo(&mut self, bpm: f32, now: Duration) {
        let old = self.step_duration();
        self.tempo = bpm.clamp(20.0, 300.0);
        if self.running {
            let remaining = self.next_step_at.saturating_sub(now);
            let fraction = (remaining.as_secs_f32() / old.as_secs_f32()).clamp(0.0, 1.0);
            self.next_step_at = now + self.step_duration().mul_f32(fraction);
        } else {
            self.start(now);
        }
    }

    /// Fire at most one step if it is due within the lookahead window
    pub fn tick(&mut self, now: Duration) -> Option<StepEvent> {
        if !self.running {
            return None;
        }
        if now + self.tuning.lookahead < self.next_step_at {
            return None;
        }

        let event = StepEvent {
            step: self.step,
            due_at: self.next_step_at,
        };

        let duration = self.step_duration();
        let lateness = now.saturating_sub(self.next_step_at);
        if lateness > self.tuning.resync_threshold {
            // Too late to make up: re-anchor the grid at now
            debug!(step = self.step, ?lateness, "step clock resync");
            self.next_step_at = now + duration;
        } else {
            self.next_step_at += duration;
        }

        self.step = (self.step + 1) % STEP_COUNT;
        Some(event)
    }
}
