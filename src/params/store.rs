//! Parameter Store
//!
//! Holds the three control values of the equalizer. Writes come from the
//! control surface or from state restore; the audio thread only reads, once
//! per block, through [`ParameterStore::snapshot`].

use std::sync::{Arc, Weak};

use serde_json::{Map, Value};

use super::cell::AtomicF32;
use crate::error::{EqError, Result};

/// Numeric flavour of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Whole numbers; writes are rounded to the nearest integer
    Int,
    Float,
}

/// Static description of a parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    /// Stable identifier, also the persisted key
    pub id: &'static str,
    /// Human-readable name
    pub name: &'static str,
    pub kind: ParamKind,
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl ParamSpec {
    /// Bring an arbitrary value into range. NaN yields `None`.
    pub fn sanitize(&self, value: f32) -> Option<f32> {
        if value.is_nan() {
            return None;
        }
        let value = match self.kind {
            ParamKind::Int => value.round(),
            ParamKind::Float => value,
        };
        Some(value.clamp(self.min, self.max))
    }
}

pub const HIGH_PASS_SPEC: ParamSpec = ParamSpec {
    id: "highPassFilter",
    name: "High pass filter",
    kind: ParamKind::Int,
    min: 20.0,
    max: 200.0,
    default: 20.0,
};

pub const TREBLE_BOOST_SPEC: ParamSpec = ParamSpec {
    id: "trebleBoost",
    name: "Treble boost",
    kind: ParamKind::Float,
    min: 0.0,
    max: 1.0,
    default: 0.0,
};

pub const ROLL_OFF_SPEC: ParamSpec = ParamSpec {
    id: "rollOff",
    name: "Roll off",
    kind: ParamKind::Float,
    min: 0.0,
    max: 1.0,
    default: 0.0,
};

/// The three equalizer parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamId {
    /// High-pass cutoff in Hz
    HighPassCutoff,
    TrebleBoost,
    RollOff,
}

impl ParamId {
    pub const ALL: [ParamId; 3] = [ParamId::HighPassCutoff, ParamId::TrebleBoost, ParamId::RollOff];

    pub fn spec(self) -> &'static ParamSpec {
        match self {
            ParamId::HighPassCutoff => &HIGH_PASS_SPEC,
            ParamId::TrebleBoost => &TREBLE_BOOST_SPEC,
            ParamId::RollOff => &ROLL_OFF_SPEC,
        }
    }

    /// Persisted key / lookup name
    pub fn id(self) -> &'static str {
        self.spec().id
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.id() == id)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Plain copy of the parameter values, taken once per block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSnapshot {
    pub high_pass_hz: f32,
    pub treble_boost: f32,
    pub roll_off: f32,
}

impl ParamSnapshot {
    /// Build a snapshot, clamping each value into its declared range
    pub fn new(high_pass_hz: f32, treble_boost: f32, roll_off: f32) -> Self {
        let pick = |spec: &ParamSpec, v: f32| spec.sanitize(v).unwrap_or(spec.default);
        Self {
            high_pass_hz: pick(&HIGH_PASS_SPEC, high_pass_hz),
            treble_boost: pick(&TREBLE_BOOST_SPEC, treble_boost),
            roll_off: pick(&ROLL_OFF_SPEC, roll_off),
        }
    }

    pub fn get(&self, id: ParamId) -> f32 {
        match id {
            ParamId::HighPassCutoff => self.high_pass_hz,
            ParamId::TrebleBoost => self.treble_boost,
            ParamId::RollOff => self.roll_off,
        }
    }

    /// True when every stage would be bypassed
    pub fn is_neutral(&self) -> bool {
        self.high_pass_hz <= HIGH_PASS_SPEC.min && self.treble_boost <= 0.0 && self.roll_off <= 0.0
    }
}

impl Default for ParamSnapshot {
    fn default() -> Self {
        Self {
            high_pass_hz: HIGH_PASS_SPEC.default,
            treble_boost: TREBLE_BOOST_SPEC.default,
            roll_off: ROLL_OFF_SPEC.default,
        }
    }
}

/// Owner of the live parameter values
///
/// Every value sits in its own [`AtomicF32`], so reads from the audio thread
/// never block and never see a half-written value.
#[derive(Debug)]
pub struct ParameterStore {
    values: [AtomicF32; 3],
}

impl ParameterStore {
    /// Create a store with every parameter at its default
    pub fn new() -> Self {
        Self {
            values: ParamId::ALL.map(|id| AtomicF32::new(id.spec().default)),
        }
    }

    pub fn get(&self, id: ParamId) -> f32 {
        self.values[id.index()].load()
    }

    /// Set a value, silently clamped to its range. NaN is ignored.
    pub fn set(&self, id: ParamId, value: f32) {
        if let Some(value) = id.spec().sanitize(value) {
            self.values[id.index()].store(value);
        }
    }

    pub fn get_by_name(&self, name: &str) -> Option<f32> {
        ParamId::from_id(name).map(|id| self.get(id))
    }

    pub fn set_by_name(&self, name: &str, value: f32) -> Result<()> {
        let id = ParamId::from_id(name).ok_or_else(|| EqError::UnknownParameter {
            name: name.to_string(),
        })?;
        self.set(id, value);
        Ok(())
    }

    pub fn reset_to_defaults(&self) {
        for id in ParamId::ALL {
            self.set(id, id.spec().default);
        }
    }

    /// Read all three values for one block
    #[inline]
    pub fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot {
            high_pass_hz: self.get(ParamId::HighPassCutoff),
            treble_boost: self.get(ParamId::TrebleBoost),
            roll_off: self.get(ParamId::RollOff),
        }
    }

    /// Current values as a key/value map keyed by parameter id
    pub fn serialize(&self) -> Map<String, Value> {
        ParamId::ALL
            .into_iter()
            .map(|id| (id.id().to_string(), Value::from(self.get(id) as f64)))
            .collect()
    }

    /// Restore values from a key/value map
    ///
    /// Known keys with numeric values are clamped and assigned. Unknown keys,
    /// non-numeric values and missing keys are ignored, leaving the current
    /// value in place. Returns how many parameters were assigned.
    pub fn deserialize(&self, map: &Map<String, Value>) -> usize {
        let mut applied = 0;
        for id in ParamId::ALL {
            if let Some(value) = map.get(id.id()).and_then(Value::as_f64) {
                self.set(id, value as f32);
                applied += 1;
            }
        }
        applied
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-owning access to a [`ParameterStore`] for a control surface
///
/// The store stays single-owner; once the owner drops it, reads return
/// `None` and writes report `false`.
#[derive(Debug, Clone)]
pub struct ParamHandle {
    store: Weak<ParameterStore>,
}

impl ParamHandle {
    pub fn new(store: &Arc<ParameterStore>) -> Self {
        Self {
            store: Arc::downgrade(store),
        }
    }

    pub fn get(&self, id: ParamId) -> Option<f32> {
        self.store.upgrade().map(|s| s.get(id))
    }

    pub fn set(&self, id: ParamId, value: f32) -> bool {
        match self.store.upgrade() {
            Some(store) => {
                store.set(id, value);
                true
            }
            None => false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.store.strong_count() > 0
    }
}
