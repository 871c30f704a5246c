//! Configuration schema definitions

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration for Groovebox
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    /// Audio output settings
    #[serde(default)]
    pub audio: AudioConfig,

    /// Master settings (tempo, volume)
    #[serde(default)]
    pub master: MasterConfig,

    /// Step clock scheduling
    #[serde(default)]
    pub clock: ClockConfig,

    /// Drum sample assets
    #[serde(default)]
    pub sampler: SamplerConfig,
}

impl EngineConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate < 8000 || self.audio.sample_rate > 192000 {
            bail!("Sample rate must be between 8000 and 192000");
        }
        if self.audio.buffer_size < 64 || self.audio.buffer_size > 8192 {
            bail!("Buffer size must be between 64 and 8192");
        }

        if self.master.volume < 0.0 || self.master.volume > 1.0 {
            bail!("Master volume must be between 0.0 and 1.0");
        }
        if self.master.tempo < 20.0 || self.master.tempo > 300.0 {
            bail!("Tempo must be between 20 and 300 BPM");
        }

        if self.clock.resync_threshold_ms <= 0.0 || self.clock.resync_threshold_ms > 100.0 {
            bail!("Resync threshold must be between 0 and 100 ms");
        }
        if self.clock.lookahead_ms < 0.0 || self.clock.lookahead_ms > 100.0 {
            bail!("Lookahead must be between 0 and 100 ms");
        }

        Ok(())
    }
}

/// Audio output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate in Hz (default: 44100)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Buffer size in samples (default: 512)
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Output device name (None = default device)
    pub device: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            buffer_size: default_buffer_size(),
            device: None,
        }
    }
}

fn default_sample_rate() -> u32 {
    44100
}
fn default_buffer_size() -> usize {
    512
}

/// Master settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterConfig {
    /// Beats per minute (default: 120)
    #[serde(default = "default_tempo")]
    pub tempo: f32,

    /// Master volume 0.0-1.0 (default: 0.7)
    #[serde(default = "default_volume")]
    pub volume: f32,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            tempo: default_tempo(),
            volume: default_volume(),
        }
    }
}

fn default_tempo() -> f32 {
    120.0
}
fn default_volume() -> f32 {
    0.7
}

/// Step clock scheduling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Lateness beyond this re-anchors the step grid (default: 5ms)
    #[serde(default = "default_resync_threshold_ms")]
    pub resync_threshold_ms: f32,

    /// Steps may fire this far ahead of their deadline (default: 5ms)
    #[serde(default = "default_lookahead_ms")]
    pub lookahead_ms: f32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            resync_threshold_ms: default_resync_threshold_ms(),
            lookahead_ms: default_lookahead_ms(),
        }
    }
}

impl ClockConfig {
    /// Convert to the sequencer's tuning struct
    pub fn tuning(&self) -> crate::sequencer::ClockTuning {
        crate::sequencer::ClockTuning {
            resync_threshold: Duration::from_secs_f32(self.resync_threshold_ms / 1000.0),
            lookahead: Duration::from_secs_f32(self.lookahead_ms / 1000.0),
        }
    }
}

fn default_resync_threshold_ms() -> f32 {
    5.0
}
fn default_lookahead_ms() -> f32 {
    5.0
}

/// Drum sample assets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Directory of .wav assets (default: "samples")
    #[serde(default = "default_sample_dir")]
    pub sample_dir: String,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            sample_dir: default_sample_dir(),
        }
    }
}

fn default_sample_dir() -> String {
    "samples".to_string()
}
