//! Vocal EQ - Real-time three-stage equalizer core
//!
//! A fixed filter chain applied to every channel of a stream:
//! 1. High-pass (cutoff 20-200 Hz, bypassed at 20 Hz)
//! 2. Treble peak at 9 kHz (bypassed at zero boost)
//! 3. High shelf roll-off (bypassed at zero roll-off)
//!
//! # Architecture
//!
//! - `params`: lock-free parameter store, snapshots and persisted state
//! - `dsp`: biquad stages and the per-channel filter chain
//! - `processor`: host callback contract (layouts, state, control handles)
//! - `engine`: offline buffers and WAV I/O for the command-line host

pub mod cli;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod params;
pub mod processor;

pub use config::EqConfig;
pub use dsp::{FilterChain, FilterKind};
pub use error::{EqError, Result};
pub use params::{ParamHandle, ParamId, ParamSnapshot, ParameterStore};
pub use processor::{BusLayout, EqProcessor};
