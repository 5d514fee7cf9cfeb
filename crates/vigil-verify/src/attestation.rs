//! Attestation wire shape.
//!
//! An [`Attestation`] is untrusted input. Its payload bytes are only handed to
//! algorithm verifiers; nothing in this crate interprets them before a
//! signature check succeeds.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A signed claim over an image digest, as supplied by the attestation
/// fetcher.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    public_key_id: String,

    #[serde(with = "base64_bytes")]
    signature: Vec<u8>,

    /// Empty for families whose signature carries the payload (PGP, JWT).
    #[serde(with = "base64_bytes", default, skip_serializing_if = "Vec::is_empty")]
    serialized_payload: Vec<u8>,
}

impl Attestation {
    pub fn new(
        public_key_id: impl Into<String>,
        signature: impl Into<Vec<u8>>,
        serialized_payload: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            public_key_id: public_key_id.into(),
            signature: signature.into(),
            serialized_payload: serialized_payload.into(),
        }
    }

    /// Attestation whose signature is self-contained (clearsigned PGP
    /// message, compact JWS).
    pub fn self_contained(public_key_id: impl Into<String>, signature: impl Into<Vec<u8>>) -> Self {
        Self::new(public_key_id, signature, Vec::new())
    }

    pub fn public_key_id(&self) -> &str {
        &self.public_key_id
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn serialized_payload(&self) -> &[u8] {
        &self.serialized_payload
    }

    /// Parse an attestation from its JSON wire form.
    pub fn from_json(json: &[u8]) -> Result<Self, ConfigError> {
        serde_json::from_slice(json).map_err(|e| ConfigError::parse("attestation JSON", e))
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::parse("attestation", e))
    }

    /// Load an attestation from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&bytes)
    }
}

impl fmt::Debug for Attestation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attestation")
            .field("public_key_id", &self.public_key_id)
            .field("signature_len", &self.signature.len())
            .field("serialized_payload_len", &self.serialized_payload.len())
            .finish()
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64
            .decode(encoded.trim())
            .map_err(|e| serde::de::Error::custom(format!("invalid base64: {e}")))
    }
}
