//! Public keys and key families.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use pkcs8::der::{Decode, Document};
use pkcs8::LineEnding;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Cryptographic family a public key belongs to.
///
/// Names that are not a known family parse to [`KeyType::Unrecognized`], so
/// a foreign key set still loads and its keys fail at verification time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum KeyType {
    /// X.509 SubjectPublicKeyInfo keys with detached signatures.
    Pkix,
    /// OpenPGP keys; the signature carries the payload.
    Pgp,
    /// Keys verifying compact JWS tokens; the token carries the payload.
    Jwt,
    Unrecognized(String),
}

impl KeyType {
    /// Every recognized family.
    pub const FAMILIES: [KeyType; 3] = [KeyType::Pkix, KeyType::Pgp, KeyType::Jwt];

    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "pkix" => Self::Pkix,
            "pgp" => Self::Pgp,
            "jwt" => Self::Jwt,
            _ => Self::Unrecognized(name.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pkix => "pkix",
            Self::Pgp => "pgp",
            Self::Jwt => "jwt",
            Self::Unrecognized(name) => name,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for KeyType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<KeyType> for String {
    fn from(value: KeyType) -> Self {
        value.as_str().to_string()
    }
}

/// Public key material for any family.
///
/// Immutable once constructed. Uniqueness of `id` is not checked here; the
/// [`KeyRegistry`](crate::KeyRegistry) records collisions.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    key_type: KeyType,
    key_data: Vec<u8>,
    id: String,
}

impl PublicKey {
    /// `id` is the externally asserted identifier attestations refer to.
    /// For PGP this should be the RFC 4880 v4 fingerprint of the key.
    pub fn new(key_type: KeyType, key_data: impl Into<Vec<u8>>, id: impl Into<String>) -> Self {
        Self {
            key_type,
            key_data: key_data.into(),
            id: id.into(),
        }
    }

    pub fn key_type(&self) -> &KeyType {
        &self.key_type
    }

    pub fn key_data(&self) -> &[u8] {
        &self.key_data
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Key material as SPKI PEM, whether it was loaded as PEM or DER.
    /// `None` when the material is not an SPKI document (PGP, for one).
    pub fn to_spki_pem(&self) -> Option<String> {
        spki_pem(&self.key_data)
    }
}

// Key material stays out of logs.
impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("key_type", &self.key_type)
            .field("key_data_len", &self.key_data.len())
            .field("id", &self.id)
            .finish()
    }
}

/// Compute a key ID from SPKI-encoded public key bytes.
///
/// Returns `sha256:<lowercase-hex>`.
pub fn compute_key_id(spki_der: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(spki_der)))
}

/// Compute a key ID from PEM or DER key material.
pub fn compute_key_id_from_key_data(key_data: &[u8]) -> Option<String> {
    spki_der(key_data).map(|der| compute_key_id(&der))
}

pub(crate) fn is_pem(key_data: &[u8]) -> bool {
    key_data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .is_some_and(|start| key_data[start..].starts_with(b"-----BEGIN"))
}

/// SPKI DER bytes from PEM or DER key material.
pub(crate) fn spki_der(key_data: &[u8]) -> Option<Vec<u8>> {
    if is_pem(key_data) {
        let pem = std::str::from_utf8(key_data).ok()?;
        let (label, doc) = Document::from_pem(pem.trim()).ok()?;
        if label != "PUBLIC KEY" {
            return None;
        }
        Some(doc.as_bytes().to_vec())
    } else {
        let doc = Document::from_der(key_data).ok()?;
        Some(doc.as_bytes().to_vec())
    }
}

/// SPKI PEM text from PEM or DER key material.
pub(crate) fn spki_pem(key_data: &[u8]) -> Option<String> {
    let der = spki_der(key_data)?;
    let doc = Document::from_der(&der).ok()?;
    doc.to_pem("PUBLIC KEY", LineEnding::LF).ok()
}
