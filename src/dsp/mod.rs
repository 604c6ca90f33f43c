//! Equalizer signal path
//!
//! Biquad stages and the chain that runs them per channel. Everything
//! reachable from `FilterChain::process` is allocation-free.

mod biquad;
mod chain;

pub use biquad::{
    compute_coefficients, process_block, BiquadCoeffs, BiquadState, FilterDesign, FilterKind, HIGH_PASS_Q,
    PEAK_FREQUENCY_HZ, PEAK_Q, SHELF_FREQUENCY_SPAN_HZ, SHELF_MAX_FREQUENCY_HZ, SHELF_Q,
};
pub use chain::{BlockCoeffs, ChannelStages, FilterChain, DEFAULT_SAMPLE_RATE};
