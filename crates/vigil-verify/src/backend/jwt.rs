//! JWT verifier: compact JWS tokens carrying the attestation payload.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};

use crate::config::JwtConfig;
use crate::error::{VerificationError, VerificationResult};
use crate::key::spki_pem;

use super::RecoveringVerifier;

/// Header parameters that point at key material outside the key set.
const FORBIDDEN_HEADERS: [&str; 5] = ["jku", "jwk", "x5u", "x5c", "crit"];

/// Verifies a compact JWS with the key from the key set and returns its
/// claims segment as the payload.
#[derive(Debug, Clone)]
pub struct JwtVerifier {
    algorithms: Vec<Algorithm>,
    leeway_secs: u64,
}

impl Default for JwtVerifier {
    fn default() -> Self {
        Self::new(&JwtConfig::default())
    }
}

impl JwtVerifier {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            algorithms: config.algorithms.clone(),
            leeway_secs: config.leeway_secs,
        }
    }
}

impl RecoveringVerifier for JwtVerifier {
    fn verify_recover(&self, signature: &[u8], public_key: &[u8]) -> VerificationResult<Vec<u8>> {
        let token = std::str::from_utf8(signature)
            .map_err(|_| VerificationError::signature_invalid("JWT is not valid UTF-8"))?
            .trim();

        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(VerificationError::signature_invalid("invalid JWT format"));
        }

        // Header hardening before anything else is trusted.
        let header_json = URL_SAFE_NO_PAD
            .decode(parts[0])
            .map_err(|e| VerificationError::signature_invalid(format!("invalid JWT header encoding: {e}")))?;
        let header_value: serde_json::Value = serde_json::from_slice(&header_json)
            .map_err(|e| VerificationError::signature_invalid(format!("invalid JWT header: {e}")))?;
        if let Some(name) = FORBIDDEN_HEADERS
            .iter()
            .find(|name| header_value.get(**name).is_some())
        {
            tracing::warn!(header = %name, "rejecting JWT with forbidden header");
            return Err(VerificationError::signature_invalid(format!(
                "JWT header {name:?} is not allowed"
            )));
        }

        let header = decode_header(token)
            .map_err(|e| VerificationError::signature_invalid(format!("failed to decode JWT header: {e}")))?;
        if !self.algorithms.contains(&header.alg) {
            return Err(VerificationError::signature_invalid(format!(
                "algorithm {:?} not allowed",
                header.alg
            )));
        }

        let key = decoding_key(header.alg, public_key)?;

        let mut validation = Validation::new(header.alg);
        validation.required_spec_claims.clear();
        validation.validate_aud = false;
        validation.validate_nbf = true;
        validation.leeway = self.leeway_secs;

        decode::<serde_json::Value>(token, &key, &validation)
            .map_err(|e| VerificationError::signature_invalid(format!("JWT validation failed: {e}")))?;

        URL_SAFE_NO_PAD
            .decode(parts[1])
            .map_err(|e| VerificationError::signature_invalid(format!("invalid JWT claims encoding: {e}")))
    }
}

fn decoding_key(alg: Algorithm, public_key: &[u8]) -> VerificationResult<DecodingKey> {
    let pem = spki_pem(public_key)
        .ok_or_else(|| VerificationError::signature_invalid("public key is not a valid SPKI document"))?;
    let pem = pem.as_bytes();

    let key = match alg {
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => DecodingKey::from_rsa_pem(pem),
        Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(pem),
        Algorithm::EdDSA => DecodingKey::from_ed_pem(pem),
        // HMAC family: a shared secret, never a public key.
        _ => {
            return Err(VerificationError::signature_invalid(format!(
                "algorithm {alg:?} cannot be verified with a public key"
            )))
        }
    };
    key.map_err(|e| VerificationError::signature_invalid(format!("invalid JWT key: {e}")))
}
