//! Versioned JSON envelope around every persisted payload

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::PersistenceError;

/// Current envelope version
pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveEnvelope<T> {
    pub version: u32,
    pub payload: T,
}

/// Only the version, so unsupported saves are rejected before the payload is parsed
#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

pub fn encode<T: Serialize>(payload: &T) -> Result<String, PersistenceError> {
    let envelope = SaveEnvelope {
        version: SAVE_VERSION,
        payload,
    };
    Ok(serde_json::to_string(&envelope)?)
}

pub fn decode<T: DeserializeOwned>(json: &str) -> Result<T, PersistenceError> {
    let probe: VersionProbe = serde_json::from_str(json)?;
    if probe.version > SAVE_VERSION {
        return Err(PersistenceError::UnsupportedVersion {
            found: probe.version,
            supported: SAVE_VERSION,
        });
    }
    let envelope: SaveEnvelope<T> = serde_json::from_str(json)?;
    Ok(envelope.payload)
}
