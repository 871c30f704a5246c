//! WAV capture
//!
//! Writes the engine's mono output to a 32-bit float WAV file, used by the
//! offline render command.

use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// WAV file recorder
pub struct Recorder {
    writer: WavWriter<BufWriter<File>>,
    sample_rate: u32,
    frames_written: u64,
}

impl Recorder {
    /// Create a recorder writing to `path` at the given sample rate
    pub fn new(path: &Path, sample_rate: u32) -> Result<Self> {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };

        let writer = WavWriter::create(path, spec)
            .with_context(|| format!("failed to create WAV file: {:?}", path))?;

        Ok(Self {
            writer,
            sample_rate,
            frames_written: 0,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Duration captured so far, in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frames_written as f64 / self.sample_rate as f64
    }

    /// Write a rendered block
    pub fn write_block(&mut self, block: &[f32]) -> Result<()> {
        for &sample in block {
            self.writer
                .write_sample(sample)
                .context("failed to write sample")?;
        }
        self.frames_written += block.len() as u64;
        Ok(())
    }

    /// Finalize the WAV file
    ///
    /// Must be called to close the file and write the header.
    pub fn finalize(self) -> Result<()> {
        self.writer.finalize().context("failed to finalize WAV file")
    }
}
