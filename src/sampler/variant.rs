//! Drum instruments, sound-shaping knobs, and variant keys
//!
//! Each instrument exposes a small set of knobs. Knob positions snap to
//! detents so the sample repository only ever has to hold a handful of
//! variants per instrument instead of a continuum.

/// Drum instruments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instrument {
    Kick,
    Snare,
    HatClosed,
    HatOpen,
    Clap,
}

impl Instrument {
    pub const ALL: [Instrument; 5] = [
        Instrument::Kick,
        Instrument::Snare,
        Instrument::HatClosed,
        Instrument::HatOpen,
        Instrument::Clap,
    ];

    /// Stable name used in filenames and config
    pub fn name(&self) -> &'static str {
        match self {
            Instrument::Kick => "kick",
            Instrument::Snare => "snare",
            Instrument::HatClosed => "hat_closed",
            Instrument::HatOpen => "hat_open",
            Instrument::Clap => "clap",
        }
    }

    /// Parse an instrument from its name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "kick" => Some(Instrument::Kick),
            "snare" => Some(Instrument::Snare),
            "hat_closed" | "hat" | "closed_hat" => Some(Instrument::HatClosed),
            "hat_open" | "open_hat" => Some(Instrument::HatOpen),
            "clap" => Some(Instrument::Clap),
            _ => None,
        }
    }
}

/// Knob detent positions, in percent
pub const DETENTS: [u8; 5] = [0, 10, 25, 50, 75];

/// Snap a 0.0-1.0 knob position to its detent
///
/// A knob sitting exactly on a detent's position snaps to that detent, so
/// 0.25 is 25, not 10.
pub fn snap_detent(value: f32) -> u8 {
    let value = value.clamp(0.0, 1.0);
    if value <= 0.1 {
        0
    } else if value < 0.25 {
        10
    } else if value <= 0.5 {
        25
    } else if value <= 0.7 {
        50
    } else {
        75
    }
}

/// Per-instrument sound-shaping state
///
/// `volume` affects playback gain only; the remaining knobs select which
/// sample variant plays. Samples always play at their natural pitch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrumParams {
    /// Playback gain (0.0-1.0)
    pub volume: f32,
    pub tune: f32,
    pub decay: f32,
    pub snappy: f32,
}

impl Default for DrumParams {
    fn default() -> Self {
        Self {
            volume: 0.8,
            tune: 0.5,
            decay: 0.5,
            snappy: 0.5,
        }
    }
}

impl DrumParams {
    /// The variant key this knob state selects for `instrument`
    ///
    /// Only the knobs an instrument actually exposes participate; the clap
    /// has none and always plays the default variant.
    pub fn variant_key(&self, instrument: Instrument) -> String {
        match instrument {
            Instrument::Kick => format!(
                "tune{}-decay{}",
                snap_detent(self.tune),
                snap_detent(self.decay)
            ),
            Instrument::Snare => format!(
                "tune{}-snappy{}",
                snap_detent(self.tune),
                snap_detent(self.snappy)
            ),
            Instrument::HatClosed | Instrument::HatOpen => {
                format!("decay{}", snap_detent(self.decay))
            }
            Instrument::Clap => "default".to_string(),
        }
    }
}
