//! Trust checking: trusted claim against the digest under evaluation.

use crate::claim::AuthenticatedAttestation;
use crate::error::{VerificationError, VerificationResult};

/// Compares post-verification claims with what the evaluator knows.
///
/// Implementations only ever see [`AuthenticatedAttestation`]; raw payload
/// bytes are out of reach by construction.
pub trait TrustChecker: Send + Sync {
    fn check(&self, claim: &AuthenticatedAttestation, expected_digest: &str) -> VerificationResult<()>;
}

/// Exact digest equality, for plain attestations.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestChecker;

impl TrustChecker for DigestChecker {
    fn check(&self, claim: &AuthenticatedAttestation, expected_digest: &str) -> VerificationResult<()> {
        let actual = claim.image_digest();
        // An empty digest on either side never matches.
        if actual.is_empty() || expected_digest.is_empty() || actual != expected_digest {
            return Err(VerificationError::TrustMismatch {
                expected: expected_digest.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(())
    }
}
