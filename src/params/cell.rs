//! Lock-free scalar cell shared between the control and audio threads
//!
//! An `f32` stored as its bit pattern in an `AtomicU32`.
//!
//! # Ordering contract
//!
//! Writers use `store(Relaxed)` and the audio thread uses `load(Relaxed)`.
//! The cell publishes nothing but its own value, so no acquire/release
//! pairing is needed: every load returns some complete value that was
//! stored, never a torn one. Loads from *different* cells are not ordered
//! with each other, so a block may see a fresh value for one parameter and
//! the previous value for another.

use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Debug)]
pub struct AtomicF32 {
    bits: AtomicU32,
}

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self {
            bits: AtomicU32::new(value.to_bits()),
        }
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }
}
