//! Attestation verification for image admission gates.
//!
//! This crate decides whether a signed attestation about a container image is
//! authentic and asserts the digest the caller expects:
//!
//! - Key registry indexed by key ID (duplicates: last key wins, diagnosed)
//! - Algorithm verifiers per key family (PKIX detached, JWT self-contained)
//! - Trust extraction from the simple signing payload, only after verification
//! - Digest check against a caller-supplied expectation
//!
//! # Quick Start
//!
//! ```no_run
//! use vigil_verify::{load_key_set, Attestation, AttestationVerifier};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let keys = load_key_set(Path::new("keyset.yaml"))?;
//! let verifier = AttestationVerifier::new(keys);
//!
//! let attestation = Attestation::from_file(Path::new("attestation.json"))?;
//! verifier.verify(&attestation, "sha256:4355a46b19d348dc2f57c046f8ef63d4538ebb936000f3c9ee954a27460dd865")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Key families
//!
//! | Family | Signature | Payload |
//! |--------|-----------|---------|
//! | `pkix` | detached (Ed25519, RSA PKCS#1 v1.5 SHA-256) | `serialized_payload` |
//! | `jwt`  | compact JWS | token claims |
//! | `pgp`  | not available, reports `not_implemented` | |
//!
//! Keys of any other type load but fail with `unsupported_key_mode`.
//!
//! # Configuration
//!
//! See [`VerifierConfig`] for the `VIGIL_*` environment variables.

pub mod attestation;
pub mod backend;
pub mod check;
pub mod claim;
pub mod config;
pub mod engine;
pub mod error;
pub mod key;
pub mod keyset;
pub mod payload;
pub mod registry;
pub mod sign;

// Re-export main types
pub use attestation::Attestation;
pub use backend::{Backends, DetachedVerifier, JwtVerifier, PkixVerifier, RecoveringVerifier, UnavailableVerifier};
pub use check::{DigestChecker, TrustChecker};
pub use claim::{AuthenticatedAttestation, TrustExtractor, VerifiedPayload, DEFAULT_MAX_PAYLOAD_BYTES};
pub use config::{DuplicateKeyPolicy, JwtConfig, VerifierConfig};
pub use engine::{
    verify_attestation, AcceptedAttestation, AllRejected, AttestationVerifier, AttestationVerifierBuilder, Rejection,
};
pub use error::{ConfigError, ErrorKind, VerificationError, VerificationResult};
pub use key::{compute_key_id, compute_key_id_from_key_data, KeyType, PublicKey};
pub use keyset::{load_key_set, KeyEntry, KeySetFile};
pub use payload::{SimpleSigningPayload, SIMPLE_SIGNING_TYPE};
pub use registry::{KeyRegistry, RegistryDiagnostic};
pub use sign::{key_id_from_ed25519, load_private_key_pem, public_key_from_ed25519, sign_pkix_ed25519};
