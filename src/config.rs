//! Engine configuration
//!
//! Loaded from a JSON file by the command-line host; every field has a
//! default so a partial file is fine.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EqError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EqConfig {
    /// Channels the filter chain allocates delay memory for
    pub max_channels: usize,
    /// Sample rate the filter chain designs for until the host reports one (Hz)
    pub default_sample_rate: f64,
    /// Frames per block when streaming files
    pub block_size: usize,
}

impl Default for EqConfig {
    fn default() -> Self {
        Self {
            max_channels: 2,
            default_sample_rate: 44100.0,
            block_size: 512,
        }
    }
}

impl EqConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EqConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(EqError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_channels == 0 {
            return Err(EqError::InvalidConfig {
                reason: "max_channels must be at least 1".to_string(),
            });
        }
        if self.block_size == 0 {
            return Err(EqError::InvalidConfig {
                reason: "block_size must be at least 1".to_string(),
            });
        }
        check_sample_rate(self.default_sample_rate)
    }
}

/// Reject sample rates the filter designs cannot use
pub fn check_sample_rate(sample_rate: f64) -> Result<()> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(())
    } else {
        Err(EqError::InvalidConfig {
            reason: format!("sample rate must be positive and finite, got {}", sample_rate),
        })
    }
}
