//! Real-time audio playback using cpal

use anyhow::Result;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tracing::error;

use super::Groovebox;
use crate::error::EngineError;

/// Real-time audio player
pub struct Player {
    stream: Option<Stream>,
    running: Arc<AtomicBool>,
}

impl Player {
    /// Create a new player
    pub fn new() -> Self {
        Self {
            stream: None,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start playing audio from the engine
    ///
    /// Opens the named output device, or the default when `device_name` is
    /// `None`. The engine's wall clock is anchored at stream start: every
    /// callback passes the elapsed time since this call into the engine.
    pub fn start(
        &mut self,
        engine: Arc<Mutex<Groovebox>>,
        device_name: Option<&str>,
    ) -> Result<()> {
        let host = cpal::default_host();
        let device = match device_name {
            Some(name) => host
                .output_devices()?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .ok_or(EngineError::NoOutputDevice)?,
            None => host
                .default_output_device()
                .ok_or(EngineError::NoOutputDevice)?,
        };

        let config = device.default_output_config()?;
        let sample_format = config.sample_format();
        let stream_config: StreamConfig = config.into();

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let started_at = Instant::now();

        let stream = match sample_format {
            SampleFormat::F32 => {
                self.build_stream::<f32>(&device, &stream_config, engine, running, started_at)?
            }
            SampleFormat::I16 => {
                self.build_stream::<i16>(&device, &stream_config, engine, running, started_at)?
            }
            SampleFormat::U16 => {
                self.build_stream::<u16>(&device, &stream_config, engine, running, started_at)?
            }
            _ => return Err(EngineError::UnsupportedSampleFormat.into()),
        };

        stream.play()?;
        self.stream = Some(stream);

        Ok(())
    }

    /// Stop playback
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.stream = None;
    }

    /// Check if currently playing
    pub fn is_playing(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn build_stream<T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>>(
        &self,
        device: &Device,
        config: &StreamConfig,
        engine: Arc<Mutex<Groovebox>>,
        running: Arc<AtomicBool>,
        started_at: Instant,
    ) -> Result<Stream> {
        let channels = config.channels as usize;
        let mut mono = Vec::new();

        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                if !running.load(Ordering::SeqCst) {
                    // Fill with silence when stopped
                    for sample in data.iter_mut() {
                        *sample = T::from_sample(0.0f32);
                    }
                    return;
                }

                if let Ok(mut eng) = engine.try_lock() {
                    let frames = data.len() / channels;
                    mono.resize(frames, 0.0f32);
                    eng.process_block(started_at.elapsed(), &mut mono);

                    for (frame, &sample) in data.chunks_mut(channels).zip(mono.iter()) {
                        for channel_sample in frame.iter_mut() {
                            *channel_sample = T::from_sample(sample);
                        }
                    }
                } else {
                    // Mutex contended, fill with silence
                    for sample in data.iter_mut() {
                        *sample = T::from_sample(0.0f32);
                    }
                }
            },
            |err| {
                error!(%err, "audio stream error");
            },
            None,
        )?;

        Ok(stream)
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

/// Get the default output device name
pub fn default_device_name() -> Option<String> {
    let host = cpal::default_host();
    host.default_output_device().and_then(|d| d.name().ok())
}

/// List all available output devices
pub fn list_output_devices() -> Vec<(String, StreamConfig)> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    if let Ok(output_devices) = host.output_devices() {
        for device in output_devices {
            if let (Ok(name), Ok(config)) = (device.name(), device.default_output_config()) {
                devices.push((name, config.into()));
            }
        }
    }

    devices
}
