//! Verification engine: the single entry point callers use.
//!
//! # Verification Steps
//!
//! 1. Look up the attestation's key ID in the [`KeyRegistry`]
//! 2. Dispatch on the key's family to its algorithm verifier
//! 3. Lift the payload that just verified into an [`AuthenticatedAttestation`]
//! 4. Compare the trusted claim with the expected digest
//!
//! The expected digest must come from the evaluator's own knowledge of the
//! image, never from the attestation.

use std::fmt;
use std::sync::Arc;

use crate::attestation::Attestation;
use crate::backend::Backends;
use crate::check::{DigestChecker, TrustChecker};
use crate::claim::{AuthenticatedAttestation, TrustExtractor, VerifiedPayload};
use crate::config::VerifierConfig;
use crate::error::{VerificationError, VerificationResult};
use crate::key::{KeyType, PublicKey};
use crate::registry::KeyRegistry;

/// Verifies attestations against one key set.
///
/// Holds no mutable state: it can be shared across threads and `verify` can
/// be called any number of times with the same result for the same inputs.
pub struct AttestationVerifier {
    registry: KeyRegistry,
    backends: Backends,
    extractor: TrustExtractor,
    checker: Arc<dyn TrustChecker>,
}

impl AttestationVerifier {
    /// Engine with built-in backends and default configuration.
    pub fn new(keys: impl IntoIterator<Item = PublicKey>) -> Self {
        let config = VerifierConfig::default();
        Self {
            registry: KeyRegistry::build(keys),
            backends: Backends::from_config(&config),
            extractor: TrustExtractor::new(config.max_payload_bytes),
            checker: Arc::new(DigestChecker),
        }
    }

    pub fn builder() -> AttestationVerifierBuilder {
        AttestationVerifierBuilder::default()
    }

    pub fn registry(&self) -> &KeyRegistry {
        &self.registry
    }

    /// Verify one attestation against `expected_digest`.
    pub fn verify(&self, attestation: &Attestation, expected_digest: &str) -> VerificationResult<()> {
        let result = self.verify_inner(attestation, expected_digest);
        match &result {
            Ok(()) => tracing::debug!(
                key_id = %attestation.public_key_id(),
                "attestation verified"
            ),
            Err(e) => tracing::info!(
                key_id = %attestation.public_key_id(),
                kind = %e.kind(),
                error = %e,
                "attestation rejected"
            ),
        }
        result
    }

    fn verify_inner(&self, attestation: &Attestation, expected_digest: &str) -> VerificationResult<()> {
        let key = self
            .registry
            .lookup(attestation.public_key_id())
            .ok_or_else(|| VerificationError::UnknownKeyId {
                key_id: attestation.public_key_id().to_string(),
            })?;

        let payload = self.authenticate(attestation, key)?;
        let claim = self.extractor.extract(&payload)?;
        self.checker.check(&claim, expected_digest)
    }

    /// Verify the signature and return the trusted claim without checking
    /// it against a digest.
    pub fn authenticated_claim(&self, attestation: &Attestation) -> VerificationResult<AuthenticatedAttestation> {
        let key = self
            .registry
            .lookup(attestation.public_key_id())
            .ok_or_else(|| VerificationError::UnknownKeyId {
                key_id: attestation.public_key_id().to_string(),
            })?;
        let payload = self.authenticate(attestation, key)?;
        self.extractor.extract(&payload)
    }

    /// Run the algorithm verifier for the key's family. Verifier errors are
    /// returned as they are.
    fn authenticate(&self, attestation: &Attestation, key: &PublicKey) -> VerificationResult<VerifiedPayload> {
        let not_implemented = || VerificationError::NotImplemented {
            key_type: key.key_type().clone(),
        };

        tracing::debug!(key_id = %key.id(), key_type = %key.key_type(), "verifying signature");

        match key.key_type() {
            KeyType::Pkix => {
                let verifier = self.backends.pkix().ok_or_else(not_implemented)?;
                verifier.verify_detached(
                    attestation.signature(),
                    attestation.serialized_payload(),
                    key.key_data(),
                )?;
                // Detached: the signed bytes are the payload.
                Ok(VerifiedPayload::new(attestation.serialized_payload().to_vec()))
            }
            KeyType::Pgp => {
                let verifier = self.backends.pgp().ok_or_else(not_implemented)?;
                let payload = verifier.verify_recover(attestation.signature(), key.key_data())?;
                Ok(VerifiedPayload::new(payload))
            }
            KeyType::Jwt => {
                let verifier = self.backends.jwt().ok_or_else(not_implemented)?;
                let payload = verifier.verify_recover(attestation.signature(), key.key_data())?;
                Ok(VerifiedPayload::new(payload))
            }
            KeyType::Unrecognized(name) => Err(VerificationError::UnsupportedKeyMode {
                key_type: name.clone(),
            }),
        }
    }

    /// Accept if at least one attestation verifies.
    ///
    /// Attestations are tried in order and the first success wins.
    pub fn verify_any<'a>(
        &self,
        attestations: impl IntoIterator<Item = &'a Attestation>,
        expected_digest: &str,
    ) -> Result<AcceptedAttestation, AllRejected> {
        let mut rejections = Vec::new();
        for (index, attestation) in attestations.into_iter().enumerate() {
            match self.verify(attestation, expected_digest) {
                Ok(()) => {
                    return Ok(AcceptedAttestation {
                        index,
                        key_id: attestation.public_key_id().to_string(),
                    })
                }
                Err(error) => rejections.push(Rejection { index, error }),
            }
        }
        Err(AllRejected { rejections })
    }
}

impl fmt::Debug for AttestationVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttestationVerifier")
            .field("registry", &self.registry)
            .field("backends", &self.backends)
            .field("extractor", &self.extractor)
            .finish_non_exhaustive()
    }
}

/// Builder for [`AttestationVerifier`].
#[derive(Default)]
pub struct AttestationVerifierBuilder {
    keys: Vec<PublicKey>,
    config: VerifierConfig,
    backends: Option<Backends>,
    checker: Option<Arc<dyn TrustChecker>>,
}

impl AttestationVerifierBuilder {
    pub fn keys(mut self, keys: impl IntoIterator<Item = PublicKey>) -> Self {
        self.keys.extend(keys);
        self
    }

    pub fn key(mut self, key: PublicKey) -> Self {
        self.keys.push(key);
        self
    }

    pub fn config(mut self, config: VerifierConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the backends derived from configuration.
    pub fn backends(mut self, backends: Backends) -> Self {
        self.backends = Some(backends);
        self
    }

    pub fn checker(mut self, checker: impl TrustChecker + 'static) -> Self {
        self.checker = Some(Arc::new(checker));
        self
    }

    /// Fails only when the configuration rejects duplicate key IDs and the
    /// key set has one.
    pub fn build(self) -> VerificationResult<AttestationVerifier> {
        let registry = KeyRegistry::build_with_policy(self.keys, self.config.duplicate_key_ids)?;
        let backends = self
            .backends
            .unwrap_or_else(|| Backends::from_config(&self.config));

        Ok(AttestationVerifier {
            registry,
            backends,
            extractor: TrustExtractor::new(self.config.max_payload_bytes),
            checker: self.checker.unwrap_or_else(|| Arc::new(DigestChecker)),
        })
    }
}

/// One-shot verification: build an engine over `keys` and verify.
pub fn verify_attestation(
    attestation: &Attestation,
    expected_digest: &str,
    keys: impl IntoIterator<Item = PublicKey>,
) -> VerificationResult<()> {
    AttestationVerifier::new(keys).verify(attestation, expected_digest)
}

/// The attestation that satisfied [`AttestationVerifier::verify_any`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedAttestation {
    pub index: usize,
    pub key_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub index: usize,
    pub error: VerificationError,
}

/// No attestation verified. Holds every rejection in input order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no attestation verified ({} rejected)", .rejections.len())]
pub struct AllRejected {
    pub rejections: Vec<Rejection>,
}

impl AllRejected {
    /// Exit code for CLI. A forged or mismatched attestation outranks lookup
    /// errors elsewhere in the set; otherwise the first rejection's code, or 4
    /// when nothing was offered.
    pub fn exit_code(&self) -> i32 {
        self.rejections
            .iter()
            .find(|r| r.error.is_security_failure())
            .or_else(|| self.rejections.first())
            .map(|r| r.error.exit_code())
            .unwrap_or(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DetachedVerifier, RecoveringVerifier};
    use crate::payload::SimpleSigningPayload;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Accepts any signature that equals the key data.
    struct EchoPkix;

    impl DetachedVerifier for EchoPkix {
        fn verify_detached(&self, signature: &[u8], _payload: &[u8], public_key: &[u8]) -> VerificationResult<()> {
            if signature == public_key {
                Ok(())
            } else {
                Err(VerificationError::signature_invalid("mismatch"))
            }
        }
    }

    /// Returns the signature itself as the recovered payload.
    struct Passthrough;

    impl RecoveringVerifier for Passthrough {
        fn verify_recover(&self, signature: &[u8], _public_key: &[u8]) -> VerificationResult<Vec<u8>> {
            Ok(signature.to_vec())
        }
    }

    struct CountingChecker(Arc<AtomicUsize>);

    impl TrustChecker for CountingChecker {
        fn check(&self, claim: &AuthenticatedAttestation, expected: &str) -> VerificationResult<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            DigestChecker.check(claim, expected)
        }
    }

    fn payload(digest: &str) -> Vec<u8> {
        SimpleSigningPayload::new(digest).to_vec().unwrap()
    }

    fn stub_backends() -> Backends {
        Backends::empty()
            .with_pkix(EchoPkix)
            .with_pgp(Passthrough)
            .with_jwt(Passthrough)
    }

    fn engine(keys: Vec<PublicKey>) -> AttestationVerifier {
        AttestationVerifier::builder()
            .keys(keys)
            .backends(stub_backends())
            .build()
            .unwrap()
    }

    #[test]
    fn test_pkix_payload_is_serialized_payload() {
        let engine = engine(vec![PublicKey::new(KeyType::Pkix, b"k".to_vec(), "k1")]);
        let att = Attestation::new("k1", b"k".to_vec(), payload("sha256:abc"));

        let claim = engine.authenticated_claim(&att).unwrap();
        assert_eq!(claim.image_digest(), "sha256:abc");
        assert!(engine.verify(&att, "sha256:abc").is_ok());
    }

    #[test]
    fn test_recovering_families_ignore_serialized_payload() {
        for key_type in [KeyType::Pgp, KeyType::Jwt] {
            let engine = engine(vec![PublicKey::new(key_type.clone(), b"k".to_vec(), "k1")]);
            // Serialized payload claims the expected digest; the signature does not.
            let att = Attestation::new("k1", payload("sha256:other"), payload("sha256:abc"));

            assert!(matches!(
                engine.verify(&att, "sha256:abc"),
                Err(VerificationError::TrustMismatch { .. })
            ), "{key_type}");
        }
    }

    #[test]
    fn test_unknown_key_id() {
        let engine = engine(vec![PublicKey::new(KeyType::Pkix, b"k".to_vec(), "k1")]);
        let att = Attestation::new("missing", b"k".to_vec(), payload("sha256:abc"));

        assert_eq!(
            engine.verify(&att, "sha256:abc").unwrap_err(),
            VerificationError::UnknownKeyId {
                key_id: "missing".into()
            }
        );
    }

    #[test]
    fn test_unrecognized_key_type_ignores_backends() {
        let engine = engine(vec![PublicKey::new(KeyType::parse("kms"), b"k".to_vec(), "k1")]);
        let att = Attestation::new("k1", b"k".to_vec(), payload("sha256:abc"));

        assert_eq!(
            engine.verify(&att, "sha256:abc").unwrap_err(),
            VerificationError::UnsupportedKeyMode {
                key_type: "kms".into()
            }
        );
    }

    #[test]
    fn test_missing_backend_is_not_implemented() {
        let engine = AttestationVerifier::builder()
            .key(PublicKey::new(KeyType::Jwt, b"k".to_vec(), "k1"))
            .backends(Backends::empty().with_pkix(EchoPkix))
            .build()
            .unwrap();
        let att = Attestation::self_contained("k1", b"token".to_vec());

        assert_eq!(
            engine.verify(&att, "sha256:abc").unwrap_err(),
            VerificationError::NotImplemented {
                key_type: KeyType::Jwt
            }
        );
    }

    #[test]
    fn test_checker_not_reached_on_signature_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = AttestationVerifier::builder()
            .key(PublicKey::new(KeyType::Pkix, b"k".to_vec(), "k1"))
            .backends(stub_backends())
            .checker(CountingChecker(calls.clone()))
            .build()
            .unwrap();

        let forged = Attestation::new("k1", b"wrong".to_vec(), payload("sha256:abc"));
        assert!(matches!(
            engine.verify(&forged, "sha256:abc"),
            Err(VerificationError::SignatureInvalid { .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let genuine = Attestation::new("k1", b"k".to_vec(), payload("sha256:abc"));
        assert!(engine.verify(&genuine, "sha256:abc").is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_payload_limit_from_config() {
        let engine = AttestationVerifier::builder()
            .key(PublicKey::new(KeyType::Pkix, b"k".to_vec(), "k1"))
            .backends(stub_backends())
            .config(VerifierConfig {
                max_payload_bytes: 16,
                ..VerifierConfig::default()
            })
            .build()
            .unwrap();
        let att = Attestation::new("k1", b"k".to_vec(), payload("sha256:abc"));

        assert!(matches!(
            engine.verify(&att, "sha256:abc"),
            Err(VerificationError::PayloadExtractionFailed { .. })
        ));
    }

    #[test]
    fn test_duplicate_policy_from_config() {
        let keys = vec![
            PublicKey::new(KeyType::Pkix, b"a".to_vec(), "k1"),
            PublicKey::new(KeyType::Pkix, b"b".to_vec(), "k1"),
        ];
        let err = AttestationVerifier::builder()
            .keys(keys.clone())
            .config(VerifierConfig {
                duplicate_key_ids: crate::DuplicateKeyPolicy::Reject,
                ..VerifierConfig::default()
            })
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::DuplicateKeyId);

        let engine = engine(keys);
        assert_eq!(engine.registry().diagnostics().len(), 1);
        let att = Attestation::new("k1", b"b".to_vec(), payload("sha256:abc"));
        assert!(engine.verify(&att, "sha256:abc").is_ok());
    }

    #[test]
    fn test_verify_any() {
        let engine = engine(vec![PublicKey::new(KeyType::Pkix, b"k".to_vec(), "k1")]);
        let atts = vec![
            Attestation::new("missing", b"k".to_vec(), payload("sha256:abc")),
            Attestation::new("k1", b"k".to_vec(), payload("sha256:def")),
            Attestation::new("k1", b"k".to_vec(), payload("sha256:abc")),
        ];

        let accepted = engine.verify_any(&atts, "sha256:abc").unwrap();
        assert_eq!(
            accepted,
            AcceptedAttestation {
                index: 2,
                key_id: "k1".into()
            }
        );

        let rejected = engine.verify_any(&atts[..2], "sha256:abc").unwrap_err();
        assert_eq!(rejected.rejections.len(), 2);
        assert_eq!(rejected.rejections[0].error.kind(), crate::ErrorKind::UnknownKeyId);
        assert_eq!(rejected.rejections[1].error.kind(), crate::ErrorKind::TrustMismatch);
        assert_eq!(rejected.exit_code(), 4);
        assert_eq!(rejected.to_string(), "no attestation verified (2 rejected)");
    }

    #[test]
    fn test_verify_any_exit_code_prefers_forgery() {
        let engine = engine(vec![PublicKey::new(KeyType::Pkix, b"k".to_vec(), "k1")]);
        let unknown = Attestation::new("missing", b"k".to_vec(), payload("sha256:abc"));
        let forged = Attestation::new("k1", b"forged".to_vec(), payload("sha256:abc"));

        let only_unknown = engine.verify_any([&unknown], "sha256:abc").unwrap_err();
        assert_eq!(only_unknown.exit_code(), 3);

        let rejected = engine.verify_any([&unknown, &forged], "sha256:abc").unwrap_err();
        assert_eq!(rejected.rejections[0].error.kind(), crate::ErrorKind::UnknownKeyId);
        assert_eq!(rejected.rejections[1].error.kind(), crate::ErrorKind::SignatureInvalid);
        assert_eq!(rejected.exit_code(), 4);
    }

    #[test]
    fn test_verify_any_empty() {
        let engine = engine(Vec::new());
        let rejected = engine.verify_any(std::iter::empty(), "sha256:abc").unwrap_err();
        assert!(rejected.rejections.is_empty());
        assert_eq!(rejected.exit_code(), 4);
    }

    #[test]
    fn test_engine_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AttestationVerifier>();
    }
}
