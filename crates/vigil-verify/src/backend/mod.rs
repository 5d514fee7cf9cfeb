//! Algorithm verifiers, one per key family.
//!
//! Two capabilities exist:
//! - [`DetachedVerifier`]: signature and payload travel separately (PKIX).
//! - [`RecoveringVerifier`]: the signature carries the payload, which is
//!   returned once authenticated (PGP, JWT).
//!
//! [`Backends`] maps each recognized family to its verifier. A family with no
//! verifier, or with an [`UnavailableVerifier`], reports `NotImplemented`,
//! never `SignatureInvalid`.

use std::fmt;
use std::sync::Arc;

use crate::config::VerifierConfig;
use crate::error::{VerificationError, VerificationResult};
use crate::key::KeyType;

pub mod jwt;
pub mod pkix;

pub use jwt::JwtVerifier;
pub use pkix::PkixVerifier;

/// Verify a detached signature over `payload`.
pub trait DetachedVerifier: Send + Sync {
    fn verify_detached(&self, signature: &[u8], payload: &[u8], public_key: &[u8]) -> VerificationResult<()>;
}

/// Verify a self-contained signature and recover the payload it carries.
pub trait RecoveringVerifier: Send + Sync {
    fn verify_recover(&self, signature: &[u8], public_key: &[u8]) -> VerificationResult<Vec<u8>>;
}

/// Stand-in for a family with no working backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnavailableVerifier {
    key_type: KeyType,
}

impl UnavailableVerifier {
    pub fn new(key_type: KeyType) -> Self {
        Self { key_type }
    }

    fn not_implemented(&self) -> VerificationError {
        VerificationError::NotImplemented {
            key_type: self.key_type.clone(),
        }
    }
}

impl DetachedVerifier for UnavailableVerifier {
    fn verify_detached(&self, _: &[u8], _: &[u8], _: &[u8]) -> VerificationResult<()> {
        Err(self.not_implemented())
    }
}

impl RecoveringVerifier for UnavailableVerifier {
    fn verify_recover(&self, _: &[u8], _: &[u8]) -> VerificationResult<Vec<u8>> {
        Err(self.not_implemented())
    }
}

/// Verifier registered for each recognized key family.
#[derive(Clone, Default)]
pub struct Backends {
    pkix: Option<Arc<dyn DetachedVerifier>>,
    pgp: Option<Arc<dyn RecoveringVerifier>>,
    jwt: Option<Arc<dyn RecoveringVerifier>>,
}

impl Backends {
    /// No family has a verifier; every recognized key yields `NotImplemented`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Built-in verifiers: PKIX and JWT backends, PGP unavailable.
    /// Families listed in `disabled_families` are unavailable too.
    pub fn from_config(config: &VerifierConfig) -> Self {
        let mut backends = Self::empty()
            .with_pkix(PkixVerifier)
            .with_pgp(UnavailableVerifier::new(KeyType::Pgp))
            .with_jwt(JwtVerifier::new(&config.jwt));

        for family in KeyType::FAMILIES.iter().filter(|f| config.is_disabled(f)) {
            tracing::debug!(key_type = %family, "key family disabled by configuration");
            backends.disable(family);
        }
        for family in config.disabled_families.iter().filter(|f| !f.is_recognized()) {
            tracing::warn!(key_type = %family, "ignoring unknown key family in disabled_families");
        }
        backends
    }

    pub fn with_pkix(mut self, verifier: impl DetachedVerifier + 'static) -> Self {
        self.pkix = Some(Arc::new(verifier));
        self
    }

    pub fn with_pgp(mut self, verifier: impl RecoveringVerifier + 'static) -> Self {
        self.pgp = Some(Arc::new(verifier));
        self
    }

    pub fn with_jwt(mut self, verifier: impl RecoveringVerifier + 'static) -> Self {
        self.jwt = Some(Arc::new(verifier));
        self
    }

    /// Replace the verifier for `family` with an [`UnavailableVerifier`].
    /// Unrecognized families have no slot and are left alone.
    pub fn disable(&mut self, family: &KeyType) {
        let unavailable = UnavailableVerifier::new(family.clone());
        match family {
            KeyType::Pkix => self.pkix = Some(Arc::new(unavailable)),
            KeyType::Pgp => self.pgp = Some(Arc::new(unavailable)),
            KeyType::Jwt => self.jwt = Some(Arc::new(unavailable)),
            KeyType::Unrecognized(_) => {}
        }
    }

    pub fn pkix(&self) -> Option<&dyn DetachedVerifier> {
        self.pkix.as_deref()
    }

    pub fn pgp(&self) -> Option<&dyn RecoveringVerifier> {
        self.pgp.as_deref()
    }

    pub fn jwt(&self) -> Option<&dyn RecoveringVerifier> {
        self.jwt.as_deref()
    }
}

impl fmt::Debug for Backends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backends")
            .field("pkix", &self.pkix.is_some())
            .field("pgp", &self.pgp.is_some())
            .field("jwt", &self.jwt.is_some())
            .finish()
    }
}
