//! CLI Module
//!
//! Offline host for the equalizer: streams WAV files through the processor
//! block by block and manages state files.

pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::params::{ParamId, ParameterStore};

/// Vocal EQ - high-pass, treble boost and roll-off for voice recordings
#[derive(Parser, Debug)]
#[command(name = "vocal-eq")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Parameter overrides shared by several commands
#[derive(Args, Debug, Clone, Default)]
pub struct ParamArgs {
    /// High-pass cutoff in Hz (20-200, 20 = off)
    #[arg(long)]
    pub high_pass: Option<f32>,

    /// Treble boost amount (0.0-1.0)
    #[arg(long)]
    pub treble_boost: Option<f32>,

    /// Treble roll-off amount (0.0-1.0)
    #[arg(long)]
    pub roll_off: Option<f32>,
}

impl ParamArgs {
    /// Write every given value into the store (clamped there)
    pub fn apply(&self, store: &ParameterStore) {
        let overrides = [
            (ParamId::HighPassCutoff, self.high_pass),
            (ParamId::TrebleBoost, self.treble_boost),
            (ParamId::RollOff, self.roll_off),
        ];
        for (id, value) in overrides {
            if let Some(value) = value {
                store.set(id, value);
            }
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Filter a WAV file
    #[command(name = "render")]
    Render {
        /// Input WAV file (mono or stereo)
        input: PathBuf,

        /// Output WAV file
        output: PathBuf,

        #[command(flatten)]
        params: ParamArgs,

        /// State file to load before applying overrides
        #[arg(short, long)]
        state: Option<PathBuf>,

        /// Frames per processing block
        #[arg(short, long)]
        block_size: Option<usize>,

        /// Output bit depth: 16, 24 or 32 (float)
        #[arg(long, default_value_t = 32)]
        bit_depth: u16,
    },

    /// Write a state file
    #[command(name = "save-state")]
    SaveState {
        /// Path of the state file
        path: PathBuf,

        #[command(flatten)]
        params: ParamArgs,
    },

    /// Print the values stored in a state file
    #[command(name = "show-state")]
    ShowState {
        /// Path of the state file
        path: PathBuf,
    },

    /// Print the magnitude response of the chain
    #[command(name = "response")]
    Response {
        /// Sample rate in Hz (defaults to the configured rate)
        #[arg(long)]
        sample_rate: Option<f64>,

        #[command(flatten)]
        params: ParamArgs,

        /// Frequencies to evaluate, comma separated
        #[arg(long, value_delimiter = ',')]
        frequencies: Vec<f64>,
    },
}
