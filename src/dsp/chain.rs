//! Filter chain engine
//!
//! Stages run in a fixed order on every channel:
//! 1. High-pass (rumble removal)
//! 2. Peak (treble presence)
//! 3. High shelf (treble roll-off)
//!
//! Coefficients are recomputed once per block and shared by all channels;
//! delay memory is per channel and per stage. A stage whose parameter sits
//! at its neutral value is skipped and its memory is left as it was.

use log::debug;

use super::biquad::{compute_coefficients, BiquadCoeffs, BiquadState, FilterKind};
use crate::params::ParamSnapshot;

/// Sample rate assumed until `prepare` is called
pub const DEFAULT_SAMPLE_RATE: f64 = 44100.0;

const NUM_STAGES: usize = FilterKind::CHAIN_ORDER.len();

/// Delay memory for the three stages of one channel
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelStages {
    states: [BiquadState; NUM_STAGES],
}

impl ChannelStages {
    pub fn state(&self, kind: FilterKind) -> &BiquadState {
        &self.states[stage_index(kind)]
    }

    fn reset(&mut self) {
        for state in &mut self.states {
            state.reset();
        }
    }

    pub fn is_cleared(&self) -> bool {
        self.states.iter().all(BiquadState::is_cleared)
    }
}

/// Coefficients of all three stages for one block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockCoeffs {
    coeffs: [BiquadCoeffs; NUM_STAGES],
    active: [bool; NUM_STAGES],
}

impl BlockCoeffs {
    pub fn compute(sample_rate: f64, params: &ParamSnapshot) -> Self {
        let mut coeffs = [BiquadCoeffs::IDENTITY; NUM_STAGES];
        let mut active = [false; NUM_STAGES];
        for (i, kind) in FilterKind::CHAIN_ORDER.into_iter().enumerate() {
            let value = params.get(kind.param());
            coeffs[i] = compute_coefficients(kind, sample_rate, value);
            active[i] = kind.is_active(value);
        }
        Self { coeffs, active }
    }

    pub fn coeffs(&self, kind: FilterKind) -> &BiquadCoeffs {
        &self.coeffs[stage_index(kind)]
    }

    pub fn is_active(&self, kind: FilterKind) -> bool {
        self.active[stage_index(kind)]
    }
}

#[inline]
fn stage_index(kind: FilterKind) -> usize {
    match kind {
        FilterKind::HighPass => 0,
        FilterKind::Peak => 1,
        FilterKind::HighShelf => 2,
    }
}

/// Three-stage equalizer over N channels
///
/// `process` is real-time safe: no allocation, no locks, no logging, and
/// time linear in `channels × frames`.
#[derive(Debug, Clone)]
pub struct FilterChain {
    channels: Vec<ChannelStages>,
    sample_rate: f64,
    prepared: bool,
}

impl FilterChain {
    /// Create a chain with delay memory for up to `max_channels` channels
    pub fn new(max_channels: usize) -> Self {
        Self::with_sample_rate(max_channels, DEFAULT_SAMPLE_RATE)
    }

    /// Like [`new`](Self::new), designing for `sample_rate` until `prepare`
    pub fn with_sample_rate(max_channels: usize, sample_rate: f64) -> Self {
        Self {
            channels: vec![ChannelStages::default(); max_channels],
            sample_rate,
            prepared: false,
        }
    }

    /// Set the sample rate and zero every stage's delay memory
    ///
    /// Call before streaming starts and whenever the sample rate changes.
    pub fn prepare(&mut self, sample_rate: f64) {
        debug!(
            "Preparing filter chain: {} Hz, {} channel(s)",
            sample_rate,
            self.channels.len()
        );
        self.sample_rate = sample_rate;
        self.reset();
        self.prepared = true;
    }

    /// Like [`prepare`](Self::prepare), resizing for a new channel count
    ///
    /// May allocate; never call from the audio thread.
    pub fn prepare_with_channels(&mut self, sample_rate: f64, num_channels: usize) {
        self.channels.resize(num_channels, ChannelStages::default());
        self.prepare(sample_rate);
    }

    /// Zero all delay memory without touching the sample rate
    pub fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.reset();
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn channel(&self, index: usize) -> Option<&ChannelStages> {
        self.channels.get(index)
    }

    /// Process one block of planar audio in place
    ///
    /// `buffer` holds one slice per channel, all of equal length. Channels
    /// beyond the prepared count are left untouched.
    pub fn process(&mut self, buffer: &mut [&mut [f32]], params: &ParamSnapshot) {
        debug_assert!(self.prepared, "FilterChain::process called before prepare");
        debug_assert!(
            buffer.len() <= self.channels.len(),
            "{} channels passed to a chain prepared for {}",
            buffer.len(),
            self.channels.len()
        );

        let block = BlockCoeffs::compute(self.sample_rate, params);

        for (samples, stages) in buffer.iter_mut().zip(self.channels.iter_mut()) {
            for kind in FilterKind::CHAIN_ORDER {
                if block.is_active(kind) {
                    let i = stage_index(kind);
                    stages.states[i].process_block(&block.coeffs[i], samples);
                }
            }
        }
    }

    /// Process one block of interleaved audio in place
    pub fn process_interleaved(&mut self, samples: &mut [f32], num_channels: usize, params: &ParamSnapshot) {
        debug_assert!(self.prepared, "FilterChain::process_interleaved called before prepare");
        debug_assert!(num_channels > 0 && samples.len() % num_channels == 0);
        debug_assert!(num_channels <= self.channels.len());

        let block = BlockCoeffs::compute(self.sample_rate, params);

        for (ch, stages) in self.channels.iter_mut().take(num_channels).enumerate() {
            for kind in FilterKind::CHAIN_ORDER {
                if block.is_active(kind) {
                    let i = stage_index(kind);
                    stages.states[i].process_interleaved(&block.coeffs[i], samples, ch, num_channels);
                }
            }
        }
    }

    /// Combined magnitude response of the active stages, in dB
    pub fn response_db(&self, params: &ParamSnapshot, freq: f64) -> f64 {
        let block = BlockCoeffs::compute(self.sample_rate, params);
        let magnitude: f64 = FilterKind::CHAIN_ORDER
            .into_iter()
            .filter(|&kind| block.is_active(kind))
            .map(|kind| block.coeffs(kind).magnitude_at(freq, self.sample_rate))
            .product();
        20.0 * magnitude.log10()
    }
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::new(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn sine(frequency: f64, sample_rate: f64, num_samples: usize) -> Vec<f32> {
        (0..num_samples)
            .map(|i| (2.0 * PI * frequency * i as f64 / sample_rate).sin() as f32)
            .collect()
    }

    fn noise(num_samples: usize, seed: u32) -> Vec<f32> {
        let mut x = seed;
        (0..num_samples)
            .map(|_| {
                x = x.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (x >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0
            })
            .collect()
    }

    fn prepared_chain(channels: usize, sample_rate: f64) -> FilterChain {
        let mut chain = FilterChain::new(channels);
        chain.prepare(sample_rate);
        chain
    }

    #[test]
    fn test_neutral_parameters_are_exact_passthrough() {
        let mut chain = prepared_chain(2, 48000.0);
        let left = noise(512, 1);
        let right = noise(512, 2);
        let (mut l, mut r) = (left.clone(), right.clone());

        chain.process(&mut [&mut l[..], &mut r[..]], &ParamSnapshot::default());

        assert_eq!(l, left);
        assert_eq!(r, right);
        assert!(chain.channel(0).unwrap().is_cleared());
    }

    #[test]
    fn test_two_blocks_equal_one_block() {
        let params = ParamSnapshot::new(120.0, 0.7, 0.4);
        let input = noise(1024, 7);

        let mut whole = input.clone();
        prepared_chain(1, 44100.0).process(&mut [&mut whole[..]], &params);

        let mut split = input;
        let mut chain = prepared_chain(1, 44100.0);
        let (first, second) = split.split_at_mut(512);
        chain.process(&mut [first], &params);
        chain.process(&mut [second], &params);

        assert_eq!(whole, split);
    }

    #[test]
    fn test_channels_share_coefficients_not_state() {
        let params = ParamSnapshot::new(100.0, 0.5, 0.5);
        let signal = noise(256, 3);

        let mut a = signal.clone();
        let mut silent = vec![0.0f32; 256];
        let mut chain = prepared_chain(2, 48000.0);
        chain.process(&mut [&mut a[..], &mut silent[..]], &params);

        let mut mono = signal;
        prepared_chain(1, 48000.0).process(&mut [&mut mono[..]], &params);

        assert_eq!(a, mono);
        assert!(silent.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_only_peak_active_matches_peak_alone() {
        let params = ParamSnapshot::new(20.0, 1.0, 0.0);
        let input = sine(9000.0, 48000.0, 2048);

        let mut chained = input.clone();
        prepared_chain(1, 48000.0).process(&mut [&mut chained[..]], &params);

        let mut alone = input;
        let coeffs = compute_coefficients(FilterKind::Peak, 48000.0, 1.0);
        BiquadState::default().process_block(&coeffs, &mut alone);

        assert_eq!(chained, alone);
    }

    #[test]
    fn test_skipped_stage_keeps_memory() {
        let mut chain = prepared_chain(1, 48000.0);
        let mut buf = noise(128, 9);
        chain.process(&mut [&mut buf[..]], &ParamSnapshot::new(20.0, 0.0, 0.8));
        let shelf_state = *chain.channel(0).unwrap().state(FilterKind::HighShelf);
        assert!(!shelf_state.is_cleared());

        let mut buf = noise(128, 10);
        chain.process(&mut [&mut buf[..]], &ParamSnapshot::default());
        assert_eq!(*chain.channel(0).unwrap().state(FilterKind::HighShelf), shelf_state);
    }

    #[test]
    fn test_prepare_clears_memory() {
        let mut chain = prepared_chain(2, 44100.0);
        let params = ParamSnapshot::new(150.0, 0.6, 0.6);
        let (mut l, mut r) = (noise(256, 4), noise(256, 5));
        chain.process(&mut [&mut l[..], &mut r[..]], &params);
        assert!(!chain.channel(0).unwrap().is_cleared());

        chain.prepare(96000.0);
        assert_eq!(chain.sample_rate(), 96000.0);
        assert!(chain.channel(0).unwrap().is_cleared());
        assert!(chain.channel(1).unwrap().is_cleared());

        // Silence in gives silence out once memory is cleared
        let mut silent = vec![0.0f32; 64];
        chain.process(&mut [&mut silent[..]], &params);
        assert!(silent.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_interleaved_matches_planar() {
        let params = ParamSnapshot::new(90.0, 0.3, 0.9);
        let left = noise(300, 11);
        let right = noise(300, 12);

        let mut interleaved: Vec<f32> = left.iter().zip(&right).flat_map(|(&l, &r)| [l, r]).collect();
        prepared_chain(2, 48000.0).process_interleaved(&mut interleaved, 2, &params);

        let (mut l, mut r) = (left, right);
        prepared_chain(2, 48000.0).process(&mut [&mut l[..], &mut r[..]], &params);

        let expected: Vec<f32> = l.iter().zip(&r).flat_map(|(&l, &r)| [l, r]).collect();
        assert_eq!(interleaved, expected);
    }

    #[test]
    fn test_prepare_with_channels_resizes() {
        let mut chain = FilterChain::new(1);
        assert!(!chain.is_prepared());
        chain.prepare_with_channels(48000.0, 6);
        assert!(chain.is_prepared());
        assert_eq!(chain.num_channels(), 6);
    }

    #[test]
    fn test_tiny_sample_rate_processes_without_panic() {
        let mut chain = prepared_chain(1, 1.5);
        let mut buf = vec![0.5f32; 16];
        chain.process(&mut [&mut buf[..]], &ParamSnapshot::default());
        assert_eq!(buf, vec![0.5f32; 16]);

        chain.process(&mut [&mut buf[..]], &ParamSnapshot::new(200.0, 1.0, 1.0));
        assert!(buf.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_impulse_tail_matches_across_block_sizes() {
        let params = ParamSnapshot::new(20.0, 0.0, 0.5);
        let mut input = vec![0.0f32; 48000];
        input[0] = 1.0;

        let mut whole = input.clone();
        prepared_chain(1, 48000.0).process(&mut [&mut whole[..]], &params);

        let mut split = input;
        let mut chain = prepared_chain(1, 48000.0);
        for block in split.chunks_mut(64) {
            chain.process(&mut [block], &params);
        }

        assert_eq!(whole, split);
    }

    #[test]
    fn test_with_sample_rate_sets_initial_rate() {
        let chain = FilterChain::with_sample_rate(2, 96000.0);
        assert_eq!(chain.sample_rate(), 96000.0);
        assert!(!chain.is_prepared());
        assert_eq!(FilterChain::new(1).sample_rate(), DEFAULT_SAMPLE_RATE);
    }

    #[test]
    fn test_response_db() {
        let chain = prepared_chain(1, 48000.0);
        assert_relative_eq!(chain.response_db(&ParamSnapshot::default(), 1000.0), 0.0);

        let boosted = chain.response_db(&ParamSnapshot::new(20.0, 1.0, 0.0), 9000.0);
        assert_relative_eq!(boosted, 20.0 * 2.0f64.log10(), epsilon = 1e-6);

        let rolled = chain.response_db(&ParamSnapshot::new(20.0, 0.0, 1.0), 20000.0);
        assert!(rolled < -5.0, "roll-off response {}", rolled);
    }
}
