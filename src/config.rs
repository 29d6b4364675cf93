//! # Application Configuration
//!
//! JSON configuration shared by the CLI and embedding applications. Every
//! field has a default, so an empty object is a valid file.
//!
//! ```json
//! {
//!   "serial": { "port": "/dev/ttyUSB0", "silence_ms": 3000 },
//!   "decoder": { "integrity": "verify", "forward_timestamp": true }
//! }
//! ```

use crate::dlms::{DecoderConfig, SerialConfig};
use crate::error::DlmsError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub serial: SerialConfig,
    pub decoder: DecoderConfig,
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self, DlmsError> {
        serde_json::from_str(json).map_err(|e| DlmsError::Config(e.to_string()))
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DlmsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, DlmsError> {
        serde_json::to_string_pretty(self).map_err(|e| DlmsError::Config(e.to_string()))
    }
}
