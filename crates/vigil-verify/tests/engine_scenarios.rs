//! End-to-end verification scenarios with real keys.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ed25519_dalek::{Signer, SigningKey};
use pkcs8::{EncodePublicKey, LineEnding};
use vigil_verify::{
    public_key_from_ed25519, sign_pkix_ed25519, verify_attestation, Attestation, AttestationVerifier, Backends,
    ErrorKind, KeyType, PublicKey, SimpleSigningPayload, VerificationError, VerifierConfig,
};

const DIGEST: &str = "sha256:4355a46b19d348dc2f57c046f8ef63d4538ebb936000f3c9ee954a27460dd865";
const OTHER_DIGEST: &str = "sha256:0000000000000000000000000000000000000000000000000000000000000000";

fn signer() -> (SigningKey, PublicKey) {
    let signing_key = SigningKey::generate(&mut rand::thread_rng());
    let public = public_key_from_ed25519(&signing_key.verifying_key()).unwrap();
    (signing_key, public)
}

fn simple_signing(digest: &str) -> Vec<u8> {
    SimpleSigningPayload::new(digest)
        .with_reference("registry.example/app")
        .to_vec()
        .unwrap()
}

fn mint_jwt(signing_key: &SigningKey, claims: &[u8]) -> Vec<u8> {
    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(br#"{"alg":"EdDSA","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(claims)
    );
    let signature = signing_key.sign(signing_input.as_bytes());
    format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature.to_bytes())).into_bytes()
}

#[test]
fn scenario_a_pkix_matching_digest() {
    let (signing_key, public) = signer();
    let att = sign_pkix_ed25519(&signing_key, public.id(), simple_signing(DIGEST));

    assert_eq!(verify_attestation(&att, DIGEST, vec![public]), Ok(()));
}

#[test]
fn scenario_b_digest_mismatch() {
    let (signing_key, public) = signer();
    let att = sign_pkix_ed25519(&signing_key, public.id(), simple_signing(DIGEST));

    let err = verify_attestation(&att, OTHER_DIGEST, vec![public]).unwrap_err();
    assert_eq!(
        err,
        VerificationError::TrustMismatch {
            expected: OTHER_DIGEST.into(),
            actual: DIGEST.into(),
        }
    );
}

#[test]
fn scenario_c_missing_key_id() {
    let (signing_key, public) = signer();
    let att = sign_pkix_ed25519(&signing_key, "sha256:unknown", simple_signing(DIGEST));

    let err = verify_attestation(&att, DIGEST, vec![public]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownKeyId);
    assert!(err.to_string().contains("no public key with ID \"sha256:unknown\" found"));
}

#[test]
fn scenario_d_jwt_without_backend() {
    let (signing_key, _) = signer();
    let pem = signing_key
        .verifying_key()
        .to_public_key_pem(LineEnding::LF)
        .unwrap();
    let key = PublicKey::new(KeyType::Jwt, pem, "jwt-key");
    let att = Attestation::self_contained("jwt-key", mint_jwt(&signing_key, &simple_signing(DIGEST)));

    let engine = AttestationVerifier::builder()
        .key(key.clone())
        .backends(Backends::empty())
        .build()
        .unwrap();
    let err = engine.verify(&att, DIGEST).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotImplemented);
    assert_ne!(err.kind(), ErrorKind::SignatureInvalid);

    // Same attestation with the built-in backend.
    assert!(AttestationVerifier::new(vec![key]).verify(&att, DIGEST).is_ok());
}

#[test]
fn jwt_disabled_by_config() {
    let (signing_key, _) = signer();
    let pem = signing_key
        .verifying_key()
        .to_public_key_pem(LineEnding::LF)
        .unwrap();
    let att = Attestation::self_contained("jwt-key", mint_jwt(&signing_key, &simple_signing(DIGEST)));

    let engine = AttestationVerifier::builder()
        .key(PublicKey::new(KeyType::Jwt, pem, "jwt-key"))
        .config(VerifierConfig::from_yaml("disabled_families: [jwt]\n").unwrap())
        .build()
        .unwrap();
    assert_eq!(engine.verify(&att, DIGEST).unwrap_err().kind(), ErrorKind::NotImplemented);
}

#[test]
fn jwt_tampered_claims_rejected() {
    let (signing_key, _) = signer();
    let pem = signing_key
        .verifying_key()
        .to_public_key_pem(LineEnding::LF)
        .unwrap();
    let token = String::from_utf8(mint_jwt(&signing_key, &simple_signing(OTHER_DIGEST))).unwrap();
    let mut parts: Vec<&str> = token.split('.').collect();
    let forged_claims = URL_SAFE_NO_PAD.encode(simple_signing(DIGEST));
    parts[1] = &forged_claims;
    let att = Attestation::self_contained("jwt-key", parts.join("."));

    let err = verify_attestation(&att, DIGEST, vec![PublicKey::new(KeyType::Jwt, pem, "jwt-key")]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SignatureInvalid);
}

#[test]
fn pgp_key_reports_not_implemented() {
    let key = PublicKey::new(KeyType::Pgp, b"-----BEGIN PGP PUBLIC KEY BLOCK-----".to_vec(), "ABCDEF0123456789");
    let att = Attestation::self_contained("ABCDEF0123456789", b"armored".to_vec());

    assert_eq!(
        verify_attestation(&att, DIGEST, vec![key]).unwrap_err(),
        VerificationError::NotImplemented { key_type: KeyType::Pgp }
    );
}

#[test]
fn unrecognized_key_type_regardless_of_content() {
    let (signing_key, public) = signer();
    let att = sign_pkix_ed25519(&signing_key, public.id(), simple_signing(DIGEST));
    // Valid PKIX material, but the key set says something else.
    let key = PublicKey::new(KeyType::parse("x509-kms"), public.key_data(), public.id());

    assert_eq!(
        verify_attestation(&att, DIGEST, vec![key]).unwrap_err(),
        VerificationError::UnsupportedKeyMode {
            key_type: "x509-kms".into()
        }
    );
}

#[test]
fn duplicate_ids_use_last_key() {
    let (first_key, first) = signer();
    let (second_key, second) = signer();
    let id = "shared-id";
    let keys = vec![
        PublicKey::new(KeyType::Pkix, first.key_data(), id),
        PublicKey::new(KeyType::Pkix, second.key_data(), id),
    ];
    let engine = AttestationVerifier::new(keys);
    assert_eq!(engine.registry().len(), 1);
    assert_eq!(engine.registry().diagnostics().len(), 1);

    let by_second = sign_pkix_ed25519(&second_key, id, simple_signing(DIGEST));
    assert!(engine.verify(&by_second, DIGEST).is_ok());

    let by_first = sign_pkix_ed25519(&first_key, id, simple_signing(DIGEST));
    assert_eq!(engine.verify(&by_first, DIGEST).unwrap_err().kind(), ErrorKind::SignatureInvalid);
}

#[test]
fn rsa_pkix_round_trip() {
    use rsa::pkcs1v15::SigningKey as RsaSigningKey;
    use rsa::sha2::Sha256;
    use rsa::signature::{SignatureEncoding, Signer as _};

    let private_key = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap();
    let pem = private_key
        .to_public_key()
        .to_public_key_pem(LineEnding::LF)
        .unwrap();
    let payload = simple_signing(DIGEST);
    let signature = RsaSigningKey::<Sha256>::new(private_key).sign(&payload).to_vec();

    let att = Attestation::new("rsa-key", signature, payload);
    let keys = vec![PublicKey::new(KeyType::Pkix, pem, "rsa-key")];
    assert!(verify_attestation(&att, DIGEST, keys.clone()).is_ok());
    assert_eq!(
        verify_attestation(&att, OTHER_DIGEST, keys).unwrap_err().kind(),
        ErrorKind::TrustMismatch
    );
}

#[test]
fn signed_non_json_payload() {
    let (signing_key, public) = signer();
    let att = sign_pkix_ed25519(&signing_key, public.id(), b"not json".to_vec());

    assert_eq!(
        verify_attestation(&att, DIGEST, vec![public]).unwrap_err().kind(),
        ErrorKind::PayloadExtractionFailed
    );
}

#[test]
fn verification_is_idempotent() {
    let (signing_key, public) = signer();
    let engine = AttestationVerifier::new(vec![public.clone()]);
    let good = sign_pkix_ed25519(&signing_key, public.id(), simple_signing(DIGEST));
    let bad = sign_pkix_ed25519(&signing_key, public.id(), simple_signing(OTHER_DIGEST));

    for _ in 0..3 {
        assert_eq!(engine.verify(&good, DIGEST), Ok(()));
        assert_eq!(engine.verify(&bad, DIGEST).unwrap_err().kind(), ErrorKind::TrustMismatch);
    }
}

#[test]
fn verify_any_accepts_first_valid() {
    let (signing_key, public) = signer();
    let (stranger, _) = signer();
    let engine = AttestationVerifier::new(vec![public.clone()]);

    let atts = vec![
        sign_pkix_ed25519(&stranger, public.id(), simple_signing(DIGEST)),
        sign_pkix_ed25519(&signing_key, public.id(), simple_signing(DIGEST)),
    ];
    let accepted = engine.verify_any(&atts, DIGEST).unwrap();
    assert_eq!(accepted.index, 1);
    assert_eq!(accepted.key_id, public.id());

    let rejected = engine.verify_any(&atts[..1], DIGEST).unwrap_err();
    assert_eq!(rejected.rejections[0].error.kind(), ErrorKind::SignatureInvalid);
    assert_eq!(rejected.exit_code(), 4);
}

#[test]
fn engine_shared_across_threads() {
    let (signing_key, public) = signer();
    let engine = std::sync::Arc::new(AttestationVerifier::new(vec![public.clone()]));
    let att = std::sync::Arc::new(sign_pkix_ed25519(&signing_key, public.id(), simple_signing(DIGEST)));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            let att = att.clone();
            std::thread::spawn(move || engine.verify(&att, DIGEST))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), Ok(()));
    }
}
