//! Key-set files.
//!
//! A key set lists the public keys an evaluator trusts:
//!
//! ```yaml
//! keys:
//!   - id: "sha256:..."
//!     type: pkix
//!     path: "keys/ci.pem"   # or `pem:` / `der_base64:`
//!     name: "CI key"
//! ```
//!
//! Relative `path` entries resolve against the key-set file's directory.
//! Key material is carried as given; the engine decides at verification time
//! whether it can use it.

use std::fs;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::key::{KeyType, PublicKey};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeySetFile {
    #[serde(default)]
    pub keys: Vec<KeyEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyEntry {
    pub id: String,

    #[serde(rename = "type")]
    pub key_type: KeyType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pem: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub der_base64: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Friendly name for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl KeySetFile {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::parse("key set", e))
    }

    /// Load a key set and resolve relative key paths against its directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut key_set = Self::from_yaml(&content)?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for entry in &mut key_set.keys {
            if let Some(key_path) = entry.path.as_mut() {
                if key_path.is_relative() {
                    *key_path = base.join(&*key_path);
                }
            }
        }
        Ok(key_set)
    }

    /// Materialize every entry, reading `path` entries from disk.
    pub fn into_public_keys(self) -> Result<Vec<PublicKey>, ConfigError> {
        self.keys.into_iter().map(KeyEntry::into_public_key).collect()
    }
}

impl KeyEntry {
    pub fn into_public_key(self) -> Result<PublicKey, ConfigError> {
        let key_data = match (&self.pem, &self.der_base64, &self.path) {
            (Some(pem), None, None) => pem.clone().into_bytes(),
            (None, Some(b64), None) => STANDARD
                .decode(b64.trim())
                .map_err(|e| ConfigError::invalid_key(&self.id, format!("der_base64: {e}")))?,
            (None, None, Some(path)) => fs::read(path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?,
            (None, None, None) => {
                return Err(ConfigError::invalid_key(
                    &self.id,
                    "one of pem, der_base64 or path is required",
                ))
            }
            _ => {
                return Err(ConfigError::invalid_key(
                    &self.id,
                    "pem, der_base64 and path are mutually exclusive",
                ))
            }
        };

        if let Some(name) = &self.name {
            tracing::debug!(key_id = %self.id, key_type = %self.key_type, name = %name, "loaded key");
        }

        Ok(PublicKey::new(self.key_type, key_data, self.id))
    }
}

/// Load the public keys listed in a key-set file.
pub fn load_key_set(path: &Path) -> Result<Vec<PublicKey>, ConfigError> {
    let keys = KeySetFile::from_file(path)?.into_public_keys()?;
    tracing::debug!(path = %path.display(), keys = keys.len(), "key set loaded");
    Ok(keys)
}
