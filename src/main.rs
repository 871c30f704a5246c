//! Groovebox - synthesizer and drum machine engine

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use groovebox::config;
use groovebox::engine::{self, Groovebox, Player, Recorder};
use groovebox::synth::ParamValue;

mod cli;

use cli::{Cli, Commands};

/// Demo chord progression, one chord per bar
const PROGRESSION: [&[i32]; 4] = [
    &[57, 60, 64], // Am
    &[53, 57, 60], // F
    &[48, 52, 55], // C
    &[55, 59, 62], // G
];

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            config: config_path,
            preset,
        } => {
            let cfg = config::load_config(&config_path)?;
            info!(config = ?config_path, "starting playback");

            let mut engine = Groovebox::new(&cfg);
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(engine.load_samples(std::path::Path::new(&cfg.sampler.sample_dir)))?;

            if !engine.load_preset(&preset) {
                anyhow::bail!("unknown preset '{}'", preset);
            }
            engine.update_param("synth", "osc1.level", &ParamValue::Number(0.5));
            engine.update_param("effects", "reverb.enabled", &ParamValue::Toggle(true));
            engine.start_sequencer(Duration::ZERO);

            let engine = Arc::new(Mutex::new(engine));
            let mut player = Player::new();
            let clock = Instant::now();
            player.start(engine.clone(), cfg.audio.device.as_deref())?;

            let stop = Arc::new(AtomicBool::new(false));
            {
                let stop = stop.clone();
                ctrlc::set_handler(move || {
                    stop.store(true, Ordering::SeqCst);
                })?;
            }

            println!("Playing '{}' at {} BPM. Ctrl-C to stop.", preset, cfg.master.tempo);

            // One chord per bar, on top of the running sequencer
            let bar = bar_duration(cfg.master.tempo);
            let mut current: Option<usize> = None;
            while !stop.load(Ordering::SeqCst) {
                let now = clock.elapsed();
                let bar_index = (now.as_secs_f32() / bar.as_secs_f32()) as usize % PROGRESSION.len();

                if current != Some(bar_index) {
                    if let Ok(mut eng) = engine.lock() {
                        if let Some(prev) = current {
                            for &note in PROGRESSION[prev] {
                                eng.note_off(note, now);
                            }
                        }
                        for &note in PROGRESSION[bar_index] {
                            eng.note_on(note, 0.8, now);
                        }
                    }
                    current = Some(bar_index);
                }

                std::thread::sleep(Duration::from_millis(10));
            }

            if let Ok(mut eng) = engine.lock() {
                eng.stop_all();
            }
            player.stop();
            println!("\nStopped.");
        }

        Commands::Record {
            config: config_path,
            output,
            duration,
            preset,
        } => {
            let cfg = config::load_config(&config_path)?;
            info!(config = ?config_path, output = ?output, "rendering offline");

            let mut engine = Groovebox::new(&cfg);
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(engine.load_samples(std::path::Path::new(&cfg.sampler.sample_dir)))?;

            if !engine.load_preset(&preset) {
                anyhow::bail!("unknown preset '{}'", preset);
            }
            engine.update_param("synth", "osc1.level", &ParamValue::Number(0.5));
            engine.update_param("effects", "reverb.enabled", &ParamValue::Toggle(true));
            engine.start_sequencer(Duration::ZERO);

            let sample_rate = cfg.audio.sample_rate;
            let block_size = cfg.audio.buffer_size;
            let total_frames = sample_rate as u64 * duration;

            let mut recorder = Recorder::new(&output, sample_rate)?;
            let mut block = vec![0.0f32; block_size];

            // Offline time advances exactly one block per iteration
            let bar = bar_duration(cfg.master.tempo);
            let mut current: Option<usize> = None;
            let mut frames = 0u64;
            while frames < total_frames {
                let now = Duration::from_secs_f64(frames as f64 / sample_rate as f64);
                let bar_index = (now.as_secs_f32() / bar.as_secs_f32()) as usize % PROGRESSION.len();

                if current != Some(bar_index) {
                    if let Some(prev) = current {
                        for &note in PROGRESSION[prev] {
                            engine.note_off(note, now);
                        }
                    }
                    for &note in PROGRESSION[bar_index] {
                        engine.note_on(note, 0.8, now);
                    }
                    current = Some(bar_index);
                }

                let remaining = (total_frames - frames).min(block_size as u64) as usize;
                engine.process_block(now, &mut block[..remaining]);
                recorder.write_block(&block[..remaining])?;
                frames += remaining as u64;
            }

            recorder.finalize()?;
            println!(
                "Rendered {}s to {:?} ({} frames)",
                duration, output, total_frames
            );
        }

        Commands::Devices => {
            println!("Available audio devices:\n");

            if let Some(name) = engine::default_device_name() {
                println!("Default output: {}\n", name);
            }

            println!("Output devices:");
            let devices = engine::list_output_devices();
            if devices.is_empty() {
                println!("  (none found)");
            }
            for (name, config) in devices {
                println!(
                    "  - {} ({} Hz, {} ch)",
                    name, config.sample_rate.0, config.channels
                );
            }
        }

        Commands::Check {
            config: config_path,
        } => {
            println!("Checking configuration at {:?}...", config_path);

            match config::load_config(&config_path) {
                Ok(cfg) => {
                    println!("Configuration is valid!");
                    println!("  Sample rate: {} Hz", cfg.audio.sample_rate);
                    println!("  Buffer size: {}", cfg.audio.buffer_size);
                    println!("  Master volume: {:.0}%", cfg.master.volume * 100.0);
                    println!("  Tempo: {} BPM", cfg.master.tempo);
                    println!("  Resync threshold: {} ms", cfg.clock.resync_threshold_ms);
                    println!("  Lookahead: {} ms", cfg.clock.lookahead_ms);
                    println!("  Sample dir: {}", cfg.sampler.sample_dir);
                }
                Err(e) => {
                    println!("Configuration is invalid: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Init => {
            let example_config = include_str!("../groovebox.example.yaml");

            let path = "groovebox.yaml";
            if std::path::Path::new(path).exists() {
                println!("groovebox.yaml already exists. Not overwriting.");
            } else {
                std::fs::write(path, example_config)?;
                println!("Created groovebox.yaml with example configuration.");
            }
        }
    }

    Ok(())
}

/// Length of one sixteen-step bar at the given tempo
fn bar_duration(tempo: f32) -> Duration {
    Duration::from_secs_f32(16.0 * 60.0 / (4.0 * tempo))
}
