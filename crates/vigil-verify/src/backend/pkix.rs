//! PKIX verifier: detached signatures with SPKI public keys.
//!
//! The algorithm follows the key's SPKI algorithm identifier:
//! - Ed25519: 64-byte raw signature over the payload
//! - RSA: PKCS#1 v1.5 with SHA-256

use ed25519_dalek::Verifier as _;
use pkcs8::DecodePublicKey;
use rsa::pkcs1v15;
use rsa::sha2::Sha256;
use spki::{ObjectIdentifier, SubjectPublicKeyInfoRef};

use crate::error::{VerificationError, VerificationResult};
use crate::key::spki_der;

use super::DetachedVerifier;

const ED25519_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");
const RSA_ENCRYPTION_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

/// Detached-signature verifier for PKIX keys (PEM or DER SPKI).
#[derive(Debug, Clone, Copy, Default)]
pub struct PkixVerifier;

impl DetachedVerifier for PkixVerifier {
    fn verify_detached(&self, signature: &[u8], payload: &[u8], public_key: &[u8]) -> VerificationResult<()> {
        let der = spki_der(public_key)
            .ok_or_else(|| VerificationError::signature_invalid("public key is not a valid SPKI document"))?;
        let spki = SubjectPublicKeyInfoRef::try_from(der.as_slice())
            .map_err(|e| VerificationError::signature_invalid(format!("invalid SPKI: {e}")))?;

        match spki.algorithm.oid {
            ED25519_OID => verify_ed25519(signature, payload, &der),
            RSA_ENCRYPTION_OID => verify_rsa_pkcs1_sha256(signature, payload, &der),
            oid => Err(VerificationError::signature_invalid(format!(
                "key algorithm {oid} is not supported for PKIX signatures"
            ))),
        }
    }
}

fn verify_ed25519(signature: &[u8], payload: &[u8], der: &[u8]) -> VerificationResult<()> {
    let key = ed25519_dalek::VerifyingKey::from_public_key_der(der)
        .map_err(|e| VerificationError::signature_invalid(format!("invalid ed25519 key: {e}")))?;
    let signature = ed25519_dalek::Signature::from_slice(signature)
        .map_err(|e| VerificationError::signature_invalid(format!("invalid signature bytes: {e}")))?;

    key.verify(payload, &signature)
        .map_err(|_| VerificationError::signature_invalid("ed25519 verification failed"))
}

fn verify_rsa_pkcs1_sha256(signature: &[u8], payload: &[u8], der: &[u8]) -> VerificationResult<()> {
    use rsa::signature::Verifier as _;

    let key = rsa::RsaPublicKey::from_public_key_der(der)
        .map_err(|e| VerificationError::signature_invalid(format!("invalid RSA key: {e}")))?;
    let signature = pkcs1v15::Signature::try_from(signature)
        .map_err(|e| VerificationError::signature_invalid(format!("invalid signature bytes: {e}")))?;

    pkcs1v15::VerifyingKey::<Sha256>::new(key)
        .verify(payload, &signature)
        .map_err(|_| VerificationError::signature_invalid("rsa pkcs1v15 verification failed"))
}
