//! Offline audio plumbing
//!
//! - Planar audio buffer with per-block views
//! - WAV import/export

pub mod buffer;
pub mod io;

pub use buffer::{linear_to_db, AudioBuffer, ChannelLayout};
pub use io::{export_wav, generate_test_tone, import_wav, BitDepth};
