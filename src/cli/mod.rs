//! CLI interface for Groovebox

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Synthesizer and drum machine engine
#[derive(Parser)]
#[command(name = "groovebox")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play a demo groove in real time
    Play {
        /// Configuration file path
        #[arg(short, long, default_value = "groovebox.yaml")]
        config: PathBuf,

        /// Pattern preset to load
        #[arg(short, long, default_value = "classic-beat")]
        preset: String,
    },

    /// Render the demo groove to a WAV file
    Record {
        /// Configuration file path
        #[arg(short, long, default_value = "groovebox.yaml")]
        config: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Duration in seconds
        #[arg(short, long, default_value = "16")]
        duration: u64,

        /// Pattern preset to load
        #[arg(short, long, default_value = "classic-beat")]
        preset: String,
    },

    /// List available audio devices
    Devices,

    /// Validate a configuration file
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "groovebox.yaml")]
        config: PathBuf,
    },

    /// Generate an example configuration file
    Init,
}
