//! Persisted parameter state
//!
//! The three values travel as one named record, `VocalEQParameter`, holding a
//! key/value map. The binary form is the record encoded as JSON:
//!
//! ```json
//! { "VocalEQParameter": { "highPassFilter": 80.0, "trebleBoost": 0.25, "rollOff": 0.0 } }
//! ```

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::store::ParameterStore;
use crate::error::{EqError, Result};

/// Name of the record that wraps the parameter map
pub const STATE_RECORD_NAME: &str = "VocalEQParameter";

/// A named key/value record as stored by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    #[serde(rename = "VocalEQParameter")]
    pub values: Map<String, Value>,
}

impl StateRecord {
    pub fn capture(store: &ParameterStore) -> Self {
        Self {
            values: store.serialize(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Strict decode, for tooling that wants to report a broken file
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        match value.get(STATE_RECORD_NAME) {
            Some(Value::Object(values)) => Ok(Self {
                values: values.clone(),
            }),
            Some(_) => Err(EqError::InvalidState {
                reason: format!("record '{}' is not a key/value map", STATE_RECORD_NAME),
            }),
            None => Err(EqError::InvalidState {
                reason: format!("missing record '{}'", STATE_RECORD_NAME),
            }),
        }
    }

    pub fn apply(&self, store: &ParameterStore) -> usize {
        store.deserialize(&self.values)
    }
}

impl ParameterStore {
    /// Encode the current values as a state blob
    pub fn to_state_bytes(&self) -> Result<Vec<u8>> {
        StateRecord::capture(self).to_bytes()
    }

    /// Restore values from a state blob, never failing
    ///
    /// Undecodable data or a foreign record leaves every value untouched.
    /// Returns how many parameters were assigned.
    pub fn load_state_bytes(&self, bytes: &[u8]) -> usize {
        match StateRecord::from_bytes(bytes) {
            Ok(record) => {
                let applied = record.apply(self);
                debug!("Restored {} parameter(s) from state", applied);
                applied
            }
            Err(e) => {
                warn!("Ignoring saved state: {}", e);
                0
            }
        }
    }
}
