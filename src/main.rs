//! Vocal EQ CLI
//!
//! Offline host for the equalizer core.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::debug;

use vocal_eq::cli::commands::{self, RenderOptions};
use vocal_eq::cli::{Cli, Commands};
use vocal_eq::engine::BitDepth;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    debug!("Vocal EQ v{}", env!("CARGO_PKG_VERSION"));

    let config = commands::load_config(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Render {
            input,
            output,
            params,
            state,
            block_size,
            bit_depth,
        } => {
            let options = RenderOptions {
                params: &params,
                state: state.as_deref(),
                block_size,
                bit_depth: BitDepth::from_bits(bit_depth)?,
            };
            commands::render(&config, &input, &output, &options)
                .with_context(|| format!("failed to render {}", input.display()))?;
        }
        Commands::SaveState { path, params } => commands::save_state(&path, &params)?,
        Commands::ShowState { path } => commands::show_state(&path)?,
        Commands::Response {
            sample_rate,
            params,
            frequencies,
        } => commands::response(&config, sample_rate, &params, &frequencies)?,
    }

    Ok(())
}
