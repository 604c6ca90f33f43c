//! Equalizer parameters
//!
//! Three controls shared between a control surface and the audio thread,
//! plus their persisted form.

mod cell;
mod state;
mod store;

pub use cell::AtomicF32;
pub use state::{StateRecord, STATE_RECORD_NAME};
pub use store::{
    ParamHandle, ParamId, ParamKind, ParamSnapshot, ParamSpec, ParameterStore, HIGH_PASS_SPEC,
    ROLL_OFF_SPEC, TREBLE_BOOST_SPEC,
};
