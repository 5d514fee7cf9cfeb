//! Error types for attestation verification.

use std::fmt;
use std::path::PathBuf;

use crate::key::KeyType;

/// Verification errors.
///
/// Every variant is a deterministic fact about the inputs. Nothing here is
/// retryable and none of the messages carry key material.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    /// The attestation names a key that is not in the key set.
    #[error("no public key with ID {key_id:?} found")]
    UnknownKeyId { key_id: String },

    /// The key's declared type is not a recognized family.
    #[error("signature uses an unsupported key mode: {key_type}")]
    UnsupportedKeyMode { key_type: String },

    /// Recognized family, but no working backend is wired in.
    #[error("verification for {key_type} keys is not implemented")]
    NotImplemented { key_type: KeyType },

    /// Cryptographic verification failed.
    #[error("signature verification failed: {reason}")]
    SignatureInvalid { reason: String },

    /// The verified payload could not be turned into a trusted claim.
    #[error("payload extraction failed: {reason}")]
    PayloadExtractionFailed { reason: String },

    /// The trusted claim does not match the digest under evaluation.
    #[error("invalid payload for authenticated attestation: expected {expected:?}, attested {actual:?}")]
    TrustMismatch { expected: String, actual: String },

    /// Key set contains the same ID twice and duplicates are rejected.
    #[error("key ID {key_id:?} appears more than once in the key set")]
    DuplicateKeyId { key_id: String },
}

/// Fieldless classification of [`VerificationError`], for logs and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnknownKeyId,
    UnsupportedKeyMode,
    NotImplemented,
    SignatureInvalid,
    PayloadExtractionFailed,
    TrustMismatch,
    DuplicateKeyId,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownKeyId => "unknown_key_id",
            Self::UnsupportedKeyMode => "unsupported_key_mode",
            Self::NotImplemented => "not_implemented",
            Self::SignatureInvalid => "signature_invalid",
            Self::PayloadExtractionFailed => "payload_extraction_failed",
            Self::TrustMismatch => "trust_mismatch",
            Self::DuplicateKeyId => "duplicate_key_id",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl VerificationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownKeyId { .. } => ErrorKind::UnknownKeyId,
            Self::UnsupportedKeyMode { .. } => ErrorKind::UnsupportedKeyMode,
            Self::NotImplemented { .. } => ErrorKind::NotImplemented,
            Self::SignatureInvalid { .. } => ErrorKind::SignatureInvalid,
            Self::PayloadExtractionFailed { .. } => ErrorKind::PayloadExtractionFailed,
            Self::TrustMismatch { .. } => ErrorKind::TrustMismatch,
            Self::DuplicateKeyId { .. } => ErrorKind::DuplicateKeyId,
        }
    }

    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            // Key set / configuration issues
            Self::DuplicateKeyId { .. } => 1,

            // Key could not be used
            Self::UnknownKeyId { .. } => 3,
            Self::UnsupportedKeyMode { .. } => 3,
            Self::NotImplemented { .. } => 3,

            // Security issues
            Self::SignatureInvalid { .. } => 4,
            Self::TrustMismatch { .. } => 4,

            Self::PayloadExtractionFailed { .. } => 5,
        }
    }

    /// True when the error proves the attestation is forged, corrupted or
    /// does not cover the image, as opposed to the verifier being unable to
    /// judge it.
    pub fn is_security_failure(&self) -> bool {
        matches!(
            self,
            Self::SignatureInvalid { .. } | Self::TrustMismatch { .. }
        )
    }

    pub(crate) fn signature_invalid(reason: impl Into<String>) -> Self {
        Self::SignatureInvalid {
            reason: reason.into(),
        }
    }

    pub(crate) fn extraction_failed(reason: impl Into<String>) -> Self {
        Self::PayloadExtractionFailed {
            reason: reason.into(),
        }
    }
}

/// Result type for verification operations.
pub type VerificationResult<T> = Result<T, VerificationError>;

/// Errors loading key sets, attestation files and configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {what}: {message}")]
    Parse { what: String, message: String },

    #[error("invalid key {key_id:?}: {reason}")]
    InvalidKey { key_id: String, reason: String },

    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: String, value: String },
}

impl ConfigError {
    pub(crate) fn parse(what: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Parse {
            what: what.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn invalid_key(key_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key_id: key_id.into(),
            reason: reason.into(),
        }
    }
}
