//! CBOR serialization support for packs
//!
//! Uses the same field names as the JSON form so both decode to one model.

use crate::{Pack, Result};

impl Pack {
    /// Serialize to CBOR bytes
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        ciborium::ser::into_writer(self, &mut buffer)?;
        Ok(buffer)
    }

    /// Deserialize from CBOR bytes
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        Ok(ciborium::de::from_reader(bytes)?)
    }
}

/// Content-Type for SenML CBOR format
pub const SENML_CBOR_CONTENT_TYPE: &str = "application/senml+cbor";
