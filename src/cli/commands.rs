//! CLI Command Implementations

use std::path::Path;

use log::{info, warn};

use super::ParamArgs;
use crate::config::EqConfig;
use crate::engine::{export_wav, import_wav, AudioBuffer, BitDepth};
use crate::error::{EqError, Result};
use crate::dsp::FilterKind;
use crate::params::{ParamId, ParamKind, ParamSnapshot, ParameterStore, StateRecord};
use crate::processor::{BusLayout, EqProcessor};

/// Frequencies printed by `response` when none are given
pub const DEFAULT_RESPONSE_FREQUENCIES: [f64; 13] = [
    20.0, 50.0, 100.0, 200.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0, 9000.0, 12000.0, 16000.0, 20000.0,
];

/// Options for [`render`]
#[derive(Debug, Clone)]
pub struct RenderOptions<'a> {
    pub params: &'a ParamArgs,
    pub state: Option<&'a Path>,
    pub block_size: Option<usize>,
    pub bit_depth: BitDepth,
}

/// Load the configuration file, or defaults when none is given
pub fn load_config(path: Option<&Path>) -> Result<EqConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration: {}", path.display());
            EqConfig::load(path)
        }
        None => Ok(EqConfig::default()),
    }
}

/// Run a buffer through a processor in blocks, in place
pub fn process_buffer(processor: &mut EqProcessor, buffer: &mut AudioBuffer, block_size: usize) -> Result<()> {
    let layout = buffer.channel_layout().ok_or(EqError::UnsupportedLayout {
        input: buffer.channels(),
        output: buffer.channels(),
    })?;
    processor.configure_buses(BusLayout::symmetric(layout))?;
    processor.prepare_to_play(buffer.sample_rate as f64, block_size)?;

    let num_inputs = layout.num_channels();
    buffer.for_each_block(block_size, |block| processor.process_block(block, num_inputs));
    processor.release_resources();
    Ok(())
}

/// Filter a WAV file.
pub fn render(config: &EqConfig, input: &Path, output: &Path, options: &RenderOptions<'_>) -> Result<()> {
    info!("Rendering {} -> {}", input.display(), output.display());

    let mut processor = EqProcessor::new(config);
    if let Some(state_path) = options.state {
        let bytes = std::fs::read(state_path)?;
        if processor.set_state(&bytes) == 0 {
            warn!("No parameters restored from {}", state_path.display());
        }
    }
    options.params.apply(processor.params());

    let mut buffer = import_wav(input)?;
    let peak_before = buffer.peak_db();
    let block_size = options.block_size.unwrap_or(config.block_size);
    process_buffer(&mut processor, &mut buffer, block_size)?;
    export_wav(&buffer, output, options.bit_depth)?;

    println!("Rendered: {}", output.display());
    println!("  {}", describe(processor.params()));
    println!(
        "  {} ch, {} Hz, {:.2}s, peak {:.1} dB -> {:.1} dB",
        buffer.channels(),
        buffer.sample_rate,
        buffer.duration_secs(),
        peak_before,
        buffer.peak_db()
    );

    Ok(())
}

/// Write a state file with default values plus any overrides.
pub fn save_state(path: &Path, params: &ParamArgs) -> Result<()> {
    info!("Saving state: {}", path.display());

    let store = ParameterStore::new();
    params.apply(&store);
    std::fs::write(path, store.to_state_bytes()?)?;

    println!("State saved: {}", path.display());
    println!("  {}", describe(&store));
    Ok(())
}

/// Print a state file. Unlike a host load, a broken file is reported.
pub fn show_state(path: &Path) -> Result<()> {
    info!("Reading state: {}", path.display());

    if !path.exists() {
        return Err(EqError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let record = StateRecord::from_bytes(&std::fs::read(path)?)?;
    let store = ParameterStore::new();
    let applied = record.apply(&store);

    for key in record.values.keys() {
        if ParamId::from_id(key).is_none() {
            warn!("Ignoring unknown key '{}'", key);
        }
    }

    println!("{} ({} of 3 parameters present)", path.display(), applied);
    println!("  {}", describe(&store));
    Ok(())
}

/// Magnitude response of the chain at each frequency, in dB
pub fn response_table(
    config: &EqConfig,
    sample_rate: Option<f64>,
    params: &ParamArgs,
    frequencies: &[f64],
) -> Result<Vec<(f64, f64)>> {
    let sample_rate = sample_rate.unwrap_or(config.default_sample_rate);
    let mut processor = EqProcessor::new(config);
    params.apply(processor.params());
    processor.prepare_to_play(sample_rate, config.block_size)?;

    let snapshot = processor.params().snapshot();
    let frequencies: &[f64] = if frequencies.is_empty() {
        &DEFAULT_RESPONSE_FREQUENCIES
    } else {
        frequencies
    };

    Ok(frequencies
        .iter()
        .copied()
        .filter(|&f| f > 0.0 && f < sample_rate / 2.0)
        .map(|f| (f, processor.chain().response_db(&snapshot, f)))
        .collect())
}

/// Print the magnitude response of the chain.
pub fn response(config: &EqConfig, sample_rate: Option<f64>, params: &ParamArgs, frequencies: &[f64]) -> Result<()> {
    let table = response_table(config, sample_rate, params, frequencies)?;

    let store = ParameterStore::new();
    params.apply(&store);
    println!("{}", describe(&store));
    let stages = active_stages(&store.snapshot());
    if stages.is_empty() {
        println!("  all stages bypassed");
    } else {
        println!("  active: {}", stages.join(" -> "));
    }

    for (freq, db) in table {
        println!("{:>8.0} Hz  {:>+7.2} dB", freq, db);
    }
    Ok(())
}

fn describe(store: &ParameterStore) -> String {
    let snap = store.snapshot();
    ParamId::ALL
        .iter()
        .map(|&id| match id.spec().kind {
            ParamKind::Int => format!("{} {}", id.spec().name, snap.get(id)),
            ParamKind::Float => format!("{} {:.2}", id.spec().name, snap.get(id)),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Labels of the stages that run for these parameters, in chain order
fn active_stages(snapshot: &ParamSnapshot) -> Vec<&'static str> {
    FilterKind::CHAIN_ORDER
        .into_iter()
        .filter(|kind| kind.is_active(snapshot.get(kind.param())))
        .map(FilterKind::label)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_param_args_apply_only_given_values() {
        let store = ParameterStore::new();
        store.set(ParamId::RollOff, 0.4);
        let args = ParamArgs {
            high_pass: Some(500.0),
            treble_boost: None,
            roll_off: None,
        };
        args.apply(&store);
        assert_eq!(store.get(ParamId::HighPassCutoff), 200.0);
        assert_relative_eq!(store.get(ParamId::RollOff), 0.4);
    }

    #[test]
    fn test_response_table_skips_above_nyquist() {
        let config = EqConfig::default();
        let table = response_table(&config, Some(16000.0), &ParamArgs::default(), &[]).unwrap();
        assert!(table.iter().all(|&(f, _)| f < 8000.0));
        assert!(table.iter().all(|&(_, db)| db == 0.0));
    }

    #[test]
    fn test_response_table_rejects_bad_sample_rate() {
        let config = EqConfig::default();
        let err = response_table(&config, Some(0.0), &ParamArgs::default(), &[]).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
        assert!(response_table(&config, Some(f64::NAN), &ParamArgs::default(), &[]).is_err());

        // Odd but valid rates go through instead of panicking
        let table = response_table(&config, Some(1.5), &ParamArgs::default(), &[0.5]).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_active_stages_follow_chain_order() {
        assert!(active_stages(&ParamSnapshot::default()).is_empty());
        assert_eq!(
            active_stages(&ParamSnapshot::new(120.0, 0.0, 0.3)),
            vec!["high-pass", "high-shelf"]
        );
    }

    #[test]
    fn test_describe_uses_parameter_names() {
        let store = ParameterStore::new();
        store.set(ParamId::HighPassCutoff, 80.0);
        assert_eq!(describe(&store), "High pass filter 80, Treble boost 0.00, Roll off 0.00");
    }
}
