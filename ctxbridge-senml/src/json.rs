//! JSON serialization support for packs

use crate::{Pack, Result, SenMLError};

impl Pack {
    /// Serialize to a compact JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SenMLError::serialization(e.to_string()))
    }

    /// Deserialize from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SenMLError::deserialization(e.to_string()))
    }

    /// Deserialize from JSON bytes
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| SenMLError::deserialization(e.to_string()))
    }

    /// Deserialize from JSON and validate the result
    pub fn from_json_validated(json: &str) -> Result<Self> {
        let pack = Self::from_json(json)?;
        pack.validate()?;
        Ok(pack)
    }
}

/// Content-Type for SenML JSON format
pub const SENML_JSON_CONTENT_TYPE: &str = "application/senml+json";
