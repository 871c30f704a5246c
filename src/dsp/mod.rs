//! DSP primitives
//!
//! Oscillators, filters, envelopes, LFOs, and delay buffers. The engine
//! layers above orchestrate these; no module here knows about voices,
//! patterns, or the effects topology.

mod delay_line;
mod envelope;
mod filter;
mod lfo;
mod oscillator;

pub use delay_line::DelayLine;
pub use envelope::{Envelope, EnvelopeStage};
pub use filter::{DcBlocker, Filter, FilterType, OnePole};
pub use lfo::{Lfo, LfoShape};
pub use oscillator::{Oscillator, Waveform};
