//! Signing side: produce PKIX attestations the engine accepts.

use std::path::Path;

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use pkcs8::{DecodePrivateKey, EncodePublicKey};

use crate::attestation::Attestation;
use crate::error::ConfigError;
use crate::key::{compute_key_id, KeyType, PublicKey};

/// Sign `payload` with an Ed25519 key, producing a detached PKIX attestation.
pub fn sign_pkix_ed25519(signing_key: &SigningKey, key_id: impl Into<String>, payload: Vec<u8>) -> Attestation {
    let signature = signing_key.sign(&payload);
    Attestation::new(key_id, signature.to_bytes().to_vec(), payload)
}

/// PKIX public key (SPKI DER) for `verifying_key`, with its derived ID.
pub fn public_key_from_ed25519(verifying_key: &VerifyingKey) -> Result<PublicKey, ConfigError> {
    let der = verifying_key
        .to_public_key_der()
        .map_err(|e| ConfigError::parse("ed25519 public key", e))?;
    let key_id = compute_key_id(der.as_bytes());
    Ok(PublicKey::new(KeyType::Pkix, der.as_bytes(), key_id))
}

/// Derived key ID of an Ed25519 verifying key.
pub fn key_id_from_ed25519(verifying_key: &VerifyingKey) -> Result<String, ConfigError> {
    public_key_from_ed25519(verifying_key).map(|key| key.id().to_string())
}

/// Load an Ed25519 private key from a PKCS#8 PEM file.
pub fn load_private_key_pem(path: &Path) -> Result<SigningKey, ConfigError> {
    let pem = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    SigningKey::from_pkcs8_pem(&pem).map_err(|e| ConfigError::parse(format!("private key {}", path.display()), e))
}
