//! Host integration layer
//!
//! `EqProcessor` is what a plugin host or audio callback talks to. It is the
//! single owner of the [`ParameterStore`]; control surfaces get a
//! [`ParamHandle`] that does not keep the store alive.

use std::sync::Arc;

use log::{debug, info};

use crate::config::{check_sample_rate, EqConfig};
use crate::dsp::FilterChain;
use crate::engine::ChannelLayout;
use crate::error::{EqError, Result};
use crate::params::{ParamHandle, ParameterStore};

/// Input/output channel counts proposed by a host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusLayout {
    pub input_channels: usize,
    pub output_channels: usize,
}

impl BusLayout {
    pub fn new(input_channels: usize, output_channels: usize) -> Self {
        Self {
            input_channels,
            output_channels,
        }
    }

    pub fn symmetric(layout: ChannelLayout) -> Self {
        Self::new(layout.num_channels(), layout.num_channels())
    }
}

#[derive(Debug)]
pub struct EqProcessor {
    params: Arc<ParameterStore>,
    chain: FilterChain,
    num_channels: usize,
    max_block_size: usize,
}

impl EqProcessor {
    pub const NAME: &'static str = "Vocal EQ";

    pub fn new(config: &EqConfig) -> Self {
        Self {
            params: Arc::new(ParameterStore::new()),
            chain: FilterChain::with_sample_rate(config.max_channels, config.default_sample_rate),
            num_channels: config.max_channels,
            max_block_size: config.block_size,
        }
    }

    pub fn name(&self) -> &'static str {
        Self::NAME
    }

    /// The filters ring out instantly as far as the host is concerned
    pub fn tail_length_seconds(&self) -> f64 {
        0.0
    }

    /// Mono or stereo, with matching input and output
    pub fn is_layout_supported(layout: BusLayout) -> bool {
        Self::check_layout(layout).is_ok()
    }

    pub fn check_layout(layout: BusLayout) -> Result<ChannelLayout> {
        match ChannelLayout::from_count(layout.output_channels) {
            Some(channels) if layout.input_channels == layout.output_channels => Ok(channels),
            _ => Err(EqError::UnsupportedLayout {
                input: layout.input_channels,
                output: layout.output_channels,
            }),
        }
    }

    /// Accept a bus layout; takes effect at the next `prepare_to_play`
    pub fn configure_buses(&mut self, layout: BusLayout) -> Result<()> {
        let channels = Self::check_layout(layout)?;
        debug!("Bus layout set to {:?}", channels);
        self.num_channels = channels.num_channels();
        Ok(())
    }

    /// Called before playback starts and whenever the sample rate changes
    pub fn prepare_to_play(&mut self, sample_rate: f64, max_block_size: usize) -> Result<()> {
        check_sample_rate(sample_rate)?;
        info!(
            "{}: prepare {} Hz, {} channel(s), blocks up to {} frames",
            Self::NAME,
            sample_rate,
            self.num_channels,
            max_block_size
        );
        self.max_block_size = max_block_size;
        self.chain.prepare_with_channels(sample_rate, self.num_channels);
        Ok(())
    }

    /// Playback stopped. Nothing is held beyond the fixed-size delay memory.
    pub fn release_resources(&mut self) {
        debug!("{}: release resources", Self::NAME);
    }

    /// Render one block in place
    ///
    /// Output channels at or beyond `num_input_channels` carry no input and
    /// are zeroed before filtering.
    pub fn process_block(&mut self, channels: &mut [&mut [f32]], num_input_channels: usize) {
        for channel in channels.iter_mut().skip(num_input_channels) {
            channel.fill(0.0);
        }

        let snapshot = self.params.snapshot();
        let active = channels.len().min(self.chain.num_channels());
        self.chain.process(&mut channels[..active], &snapshot);
    }

    pub fn params(&self) -> &ParameterStore {
        &self.params
    }

    /// Non-owning handle for a control surface
    pub fn handle(&self) -> ParamHandle {
        ParamHandle::new(&self.params)
    }

    pub fn chain(&self) -> &FilterChain {
        &self.chain
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    /// Parameter state for the host to persist
    pub fn get_state(&self) -> Result<Vec<u8>> {
        self.params.to_state_bytes()
    }

    /// Restore parameter state; bad data is ignored
    pub fn set_state(&self, bytes: &[u8]) -> usize {
        self.params.load_state_bytes(bytes)
    }
}

impl Default for EqProcessor {
    fn default() -> Self {
        Self::new(&EqConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamId;
    use approx::assert_relative_eq;
    use test_case::test_case;

    #[test_case(1, 1, true ; "mono")]
    #[test_case(2, 2, true ; "stereo")]
    #[test_case(1, 2, false ; "mono to stereo")]
    #[test_case(6, 6, false ; "surround")]
    #[test_case(0, 0, false ; "no channels")]
    fn test_layout_support(input: usize, output: usize, supported: bool) {
        let layout = BusLayout::new(input, output);
        assert_eq!(EqProcessor::is_layout_supported(layout), supported);
        assert_eq!(EqProcessor::check_layout(layout).is_ok(), supported);
    }

    #[test]
    fn test_configure_buses_rejects_bad_layout() {
        let mut processor = EqProcessor::default();
        let err = processor.configure_buses(BusLayout::new(2, 1)).unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_LAYOUT");
        processor.configure_buses(BusLayout::symmetric(ChannelLayout::Mono)).unwrap();
        processor.prepare_to_play(48000.0, 256).unwrap();
        assert_eq!(processor.chain().num_channels(), 1);
    }

    #[test]
    fn test_extra_output_channels_are_cleared() {
        let mut processor = EqProcessor::default();
        processor.prepare_to_play(48000.0, 4).unwrap();

        let mut input = vec![0.5f32; 4];
        let mut garbage = vec![0.9f32; 4];
        processor.process_block(&mut [&mut input[..], &mut garbage[..]], 1);

        assert_eq!(input, vec![0.5; 4]);
        assert_eq!(garbage, vec![0.0; 4]);
    }

    #[test]
    fn test_process_reads_current_parameters() {
        let mut processor = EqProcessor::default();
        processor.prepare_to_play(48000.0, 64).unwrap();
        let handle = processor.handle();

        let mut untouched = vec![0.25f32; 64];
        processor.process_block(&mut [&mut untouched[..]], 1);
        assert!(untouched.iter().all(|&s| s == 0.25));

        handle.set(ParamId::HighPassCutoff, 200.0);
        let mut filtered = vec![0.25f32; 64];
        processor.process_block(&mut [&mut filtered[..]], 1);
        assert!(filtered.iter().any(|&s| s != 0.25));
    }

    #[test]
    fn test_state_round_trip_between_instances() {
        let source = EqProcessor::default();
        source.params().set(ParamId::TrebleBoost, 0.8);
        source.params().set(ParamId::HighPassCutoff, 60.0);
        let blob = source.get_state().unwrap();

        let target = EqProcessor::default();
        assert_eq!(target.set_state(&blob), 3);
        assert_relative_eq!(target.params().get(ParamId::TrebleBoost), 0.8);
        assert_relative_eq!(target.params().get(ParamId::HighPassCutoff), 60.0);

        assert_eq!(target.set_state(b"corrupt"), 0);
        assert_relative_eq!(target.params().get(ParamId::TrebleBoost), 0.8);
    }

    #[test]
    fn test_handle_outlives_processor_safely() {
        let processor = EqProcessor::default();
        let handle = processor.handle();
        assert!(handle.is_attached());
        drop(processor);
        assert!(!handle.set(ParamId::RollOff, 0.5));
    }

    #[test_case(0.0 ; "zero")]
    #[test_case(-44100.0 ; "negative")]
    #[test_case(f64::NAN ; "nan")]
    fn test_prepare_rejects_bad_sample_rate(sample_rate: f64) {
        let mut processor = EqProcessor::default();
        let err = processor.prepare_to_play(sample_rate, 64).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
        assert!(!processor.chain().is_prepared());
    }

    #[test]
    fn test_configured_sample_rate_used_before_prepare() {
        let config = EqConfig {
            default_sample_rate: 48000.0,
            ..EqConfig::default()
        };
        let processor = EqProcessor::new(&config);
        assert_eq!(processor.chain().sample_rate(), 48000.0);
        assert!(format!("{:?}", processor).starts_with("EqProcessor"));
    }

    #[test]
    fn test_host_metadata() {
        let processor = EqProcessor::default();
        assert_eq!(processor.name(), "Vocal EQ");
        assert_eq!(processor.tail_length_seconds(), 0.0);
        assert_eq!(processor.max_block_size(), 512);
    }
}
