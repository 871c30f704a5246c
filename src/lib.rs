//! Groovebox - synthesizer and drum machine engine
//!
//! A polyphonic subtractive synthesizer, a sixteen-step drum sequencer with
//! a sample repository, and a shared effects bus, mixed to a single mono
//! output.

pub mod config;
pub mod dsp;
pub mod effects;
pub mod engine;
pub mod error;
pub mod sampler;
pub mod sequencer;
pub mod synth;

pub use config::EngineConfig;
pub use engine::Groovebox;
pub use error::EngineError;
