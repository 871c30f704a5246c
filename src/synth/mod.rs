//! Subtractive synthesizer voices
//!
//! The parameter store ([`VoiceParameters`]), the two-phase voice builder
//! ([`VoicePlan`] then [`Voice`]), and the polyphonic [`VoiceEngine`] that
//! owns them.

mod engine;
pub mod params;
mod voice;

pub use engine::VoiceEngine;
pub use params::{ParamValue, VoiceParameters};
pub use voice::{note_frequency, Voice, VoicePlan, VoiceState, MASTER_LFO_DEPTH, WATCHDOG_TIMEOUT};
