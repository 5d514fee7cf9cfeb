//! Trust extraction: verified payload bytes to a trusted claim.

use crate::error::{VerificationError, VerificationResult};
use crate::payload::{CREATOR_POINTER, DIGEST_POINTER, REFERENCE_POINTER, TIMESTAMP_POINTER};

/// Default limit on verified payload size (1 MiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

/// Payload bytes that have just passed signature verification.
///
/// Only the engine can create one, after an algorithm verifier succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPayload(Vec<u8>);

impl VerifiedPayload {
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Data taken from an attestation payload after its signature verified.
///
/// The contents of an attestation payload are never examined directly; they
/// are lifted into this type by [`TrustExtractor`] and checked from here.
/// Fields that are absent from the payload are empty, which fails any check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthenticatedAttestation {
    image_digest: String,
    docker_reference: Option<String>,
    creator: Option<String>,
    timestamp: Option<i64>,
}

impl AuthenticatedAttestation {
    pub fn image_digest(&self) -> &str {
        &self.image_digest
    }

    pub fn docker_reference(&self) -> Option<&str> {
        self.docker_reference.as_deref()
    }

    pub fn creator(&self) -> Option<&str> {
        self.creator.as_deref()
    }

    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }
}

/// Lifts verified payloads into [`AuthenticatedAttestation`]s.
#[derive(Debug, Clone)]
pub struct TrustExtractor {
    max_payload_bytes: usize,
}

impl Default for TrustExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAYLOAD_BYTES)
    }
}

impl TrustExtractor {
    pub fn new(max_payload_bytes: usize) -> Self {
        Self { max_payload_bytes }
    }

    /// Parse a simple-signing document.
    ///
    /// Oversized or non-JSON payloads fail with `PayloadExtractionFailed`. A
    /// JSON document missing expected fields (or carrying them with the wrong
    /// type) yields a claim with those fields empty.
    pub fn extract(&self, payload: &VerifiedPayload) -> VerificationResult<AuthenticatedAttestation> {
        if payload.len() > self.max_payload_bytes {
            return Err(VerificationError::extraction_failed(format!(
                "payload is {} bytes, limit is {}",
                payload.len(),
                self.max_payload_bytes
            )));
        }

        let document: serde_json::Value = serde_json::from_slice(payload.as_bytes())
            .map_err(|e| VerificationError::extraction_failed(format!("payload is not JSON: {e}")))?;

        let text = |pointer: &str| {
            document
                .pointer(pointer)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };

        Ok(AuthenticatedAttestation {
            image_digest: text(DIGEST_POINTER).unwrap_or_default(),
            docker_reference: text(REFERENCE_POINTER).filter(|r| !r.is_empty()),
            creator: text(CREATOR_POINTER),
            timestamp: document.pointer(TIMESTAMP_POINTER).and_then(|v| v.as_i64()),
        })
    }
}
