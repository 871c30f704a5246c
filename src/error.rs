//! Engine error type

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the engine's non-real-time paths.
///
/// Real-time paths (note on/off, step triggering, rendering) never return
/// these to the caller; failures there are logged and absorbed.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("voice construction failed for note {note}: {reason}")]
    VoiceBuild { note: i32, reason: String },

    #[error("no audio output device available")]
    NoOutputDevice,

    #[error("unsupported output sample format")]
    UnsupportedSampleFormat,

    #[error("failed to read sample asset {path:?}")]
    SampleRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode sample asset {path:?}")]
    SampleDecode {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
}
