//! Step patterns
//!
//! A pattern is sixteen on/off steps per instrument. The bank holds one
//! pattern for every instrument plus a few built-in presets.

use std::collections::HashMap;

use crate::sampler::Instrument;
use crate::sequencer::clock::STEP_COUNT;

/// One instrument's sixteen steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepPattern {
    steps: [bool; STEP_COUNT],
}

impl StepPattern {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from explicit step indices
    pub fn from_steps(active: &[usize]) -> Self {
        let mut pattern = Self::default();
        for &step in active {
            if step < STEP_COUNT {
                pattern.steps[step] = true;
            }
        }
        pattern
    }

    /// Flip one step. Out-of-range indices are ignored.
    pub fn toggle(&mut self, step: usize) {
        if step < STEP_COUNT {
            self.steps[step] = !self.steps[step];
        }
    }

    pub fn set(&mut self, step: usize, active: bool) {
        if step < STEP_COUNT {
            self.steps[step] = active;
        }
    }

    pub fn is_active(&self, step: usize) -> bool {
        step < STEP_COUNT && self.steps[step]
    }

    pub fn clear(&mut self) {
        self.steps = [false; STEP_COUNT];
    }

    pub fn steps(&self) -> &[bool; STEP_COUNT] {
        &self.steps
    }

    /// Number of active steps
    pub fn active_count(&self) -> usize {
        self.steps.iter().filter(|&&s| s).count()
    }
}

/// Patterns for every instrument
#[derive(Debug, Clone, Default)]
pub struct PatternBank {
    patterns: HashMap<Instrument, StepPattern>,
}

impl PatternBank {
    pub fn new() -> Self {
        let mut patterns = HashMap::new();
        for instrument in Instrument::ALL {
            patterns.insert(instrument, StepPattern::new());
        }
        Self { patterns }
    }

    pub fn pattern(&self, instrument: Instrument) -> StepPattern {
        self.patterns.get(&instrument).copied().unwrap_or_default()
    }

    pub fn pattern_mut(&mut self, instrument: Instrument) -> &mut StepPattern {
        self.patterns.entry(instrument).or_default()
    }

    pub fn set_pattern(&mut self, instrument: Instrument, pattern: StepPattern) {
        self.patterns.insert(instrument, pattern);
    }

    /// Instruments active at the given step
    pub fn active_at(&self, step: usize) -> Vec<Instrument> {
        Instrument::ALL
            .into_iter()
            .filter(|i| self.pattern(*i).is_active(step))
            .collect()
    }

    pub fn clear_all(&mut self) {
        for pattern in self.patterns.values_mut() {
            pattern.clear();
        }
    }

    /// Load a built-in preset; unknown names leave the bank untouched
    pub fn load_preset(&mut self, name: &str) -> bool {
        match name {
            "classic-beat" => {
                self.set_pattern(Instrument::Kick, StepPattern::from_steps(&[0, 4, 8, 12]));
                self.set_pattern(Instrument::Snare, StepPattern::from_steps(&[4, 12]));
                self.set_pattern(
                    Instrument::HatClosed,
                    StepPattern::from_steps(&[0, 2, 4, 6, 8, 10, 12, 14]),
                );
                self.set_pattern(Instrument::HatOpen, StepPattern::new());
                self.set_pattern(Instrument::Clap, StepPattern::new());
                true
            }
            "four-on-floor" => {
                self.set_pattern(Instrument::Kick, StepPattern::from_steps(&[0, 4, 8, 12]));
                self.set_pattern(Instrument::Snare, StepPattern::new());
                self.set_pattern(
                    Instrument::HatClosed,
                    StepPattern::from_steps(&[2, 6, 10, 14]),
                );
                self.set_pattern(Instrument::HatOpen, StepPattern::from_steps(&[2, 10]));
                self.set_pattern(Instrument::Clap, StepPattern::from_steps(&[4, 12]));
                true
            }
            "breakbeat" => {
                self.set_pattern(Instrument::Kick, StepPattern::from_steps(&[0, 6, 10]));
                self.set_pattern(Instrument::Snare, StepPattern::from_steps(&[4, 12, 15]));
                self.set_pattern(
                    Instrument::HatClosed,
                    StepPattern::from_steps(&[0, 2, 4, 6, 8, 10, 12, 14]),
                );
                self.set_pattern(Instrument::HatOpen, StepPattern::new());
                self.set_pattern(Instrument::Clap, StepPattern::new());
                true
            }
            _ => false,
        }
    }

    /// Names accepted by [`load_preset`](Self::load_preset)
    pub fn preset_names() -> &'static [&'static str] {
        &["classic-beat", "four-on-floor", "breakbeat"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_starts_empty() {
        let pattern = StepPattern::new();
        assert_eq!(pattern.active_count(), 0);
    }

    #[test]
    fn test_toggle_is_involution() {
        let mut pattern = StepPattern::new();
        pattern.toggle(3);
        assert!(pattern.is_active(3));
        pattern.toggle(3);
        assert!(!pattern.is_active(3));
    }

    #[test]
    fn test_toggle_out_of_range_ignored() {
        let mut pattern = StepPattern::new();
        pattern.toggle(16);
        pattern.toggle(usize::MAX);
        assert_eq!(pattern.active_count(), 0);
    }

    #[test]
    fn test_from_steps() {
        let pattern = StepPattern::from_steps(&[0, 4, 8, 12, 99]);
        assert_eq!(pattern.active_count(), 4);
        assert!(pattern.is_active(0));
        assert!(pattern.is_active(12));
        assert!(!pattern.is_active(1));
    }

    #[test]
    fn test_bank_has_all_instruments() {
        let bank = PatternBank::new();
        for instrument in Instrument::ALL {
            assert_eq!(bank.pattern(instrument).active_count(), 0);
        }
    }

    #[test]
    fn test_active_at() {
        let mut bank = PatternBank::new();
        bank.pattern_mut(Instrument::Kick).set(0, true);
        bank.pattern_mut(Instrument::HatClosed).set(0, true);

        let active = bank.active_at(0);
        assert!(active.contains(&Instrument::Kick));
        assert!(active.contains(&Instrument::HatClosed));
        assert_eq!(active.len(), 2);
        assert!(bank.active_at(1).is_empty());
    }

    #[test]
    fn test_classic_beat_preset() {
        let mut bank = PatternBank::new();
        assert!(bank.load_preset("classic-beat"));

        let kick = bank.pattern(Instrument::Kick);
        assert!(kick.is_active(0) && kick.is_active(4) && kick.is_active(8) && kick.is_active(12));
        assert_eq!(kick.active_count(), 4);

        let snare = bank.pattern(Instrument::Snare);
        assert!(snare.is_active(4) && snare.is_active(12));
        assert_eq!(snare.active_count(), 2);

        assert_eq!(bank.pattern(Instrument::HatClosed).active_count(), 8);
    }

    #[test]
    fn test_unknown_preset_rejected() {
        let mut bank = PatternBank::new();
        bank.pattern_mut(Instrument::Kick).set(3, true);

        assert!(!bank.load_preset("nope"));
        assert!(bank.pattern(Instrument::Kick).is_active(3));
    }

    #[test]
    fn test_clear_all() {
        let mut bank = PatternBank::new();
        bank.load_preset("classic-beat");
        bank.clear_all();
        for instrument in Instrument::ALL {
            assert_eq!(bank.pattern(instrument).active_count(), 0);
        }
    }
}
