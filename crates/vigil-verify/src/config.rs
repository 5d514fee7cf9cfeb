//! Verifier configuration.
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `VIGIL_JWT_ALGORITHMS` | Comma-separated JWT algorithm allowlist (default: `EdDSA,ES256,RS256`) |
//! | `VIGIL_JWT_LEEWAY_SECS` | Clock skew leeway for `exp`/`nbf` (default: 30) |
//! | `VIGIL_MAX_PAYLOAD_BYTES` | Limit on verified payload size (default: 1 MiB) |
//! | `VIGIL_DUPLICATE_KEY_IDS` | `overwrite` (default) or `reject` |
//! | `VIGIL_DISABLED_FAMILIES` | Comma-separated key families to switch off |

use std::path::Path;
use std::str::FromStr;

use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};

use crate::claim::DEFAULT_MAX_PAYLOAD_BYTES;
use crate::error::ConfigError;
use crate::key::KeyType;

/// What to do when a key set carries the same ID twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateKeyPolicy {
    /// Last key wins; the collision is recorded as a diagnostic.
    #[default]
    Overwrite,
    /// Building the registry fails with `DuplicateKeyId`.
    Reject,
}

impl FromStr for DuplicateKeyPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "reject" => Ok(Self::Reject),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JwtConfig {
    /// Accepted `alg` header values.
    pub algorithms: Vec<Algorithm>,
    /// Leeway in seconds applied to `exp` and `nbf` when present.
    pub leeway_secs: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            algorithms: vec![Algorithm::EdDSA, Algorithm::ES256, Algorithm::RS256],
            leeway_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifierConfig {
    pub duplicate_key_ids: DuplicateKeyPolicy,
    pub max_payload_bytes: usize,
    /// Families whose backend is replaced by one reporting `NotImplemented`.
    pub disabled_families: Vec<KeyType>,
    pub jwt: JwtConfig,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            duplicate_key_ids: DuplicateKeyPolicy::default(),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            disabled_families: Vec::new(),
            jwt: JwtConfig::default(),
        }
    }
}

impl VerifierConfig {
    /// Parse configuration from YAML (or JSON) text.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::parse("verifier config", e))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Defaults overlaid with `VIGIL_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        cfg.apply_env()?;
        Ok(cfg)
    }

    /// Overlay `VIGIL_*` environment variables on this configuration.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    pub(crate) fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let invalid = |name: &str, value: &str| ConfigError::InvalidEnv {
            name: name.to_string(),
            value: value.to_string(),
        };

        if let Some(v) = lookup("VIGIL_JWT_ALGORITHMS") {
            self.jwt.algorithms = split_list(&v)
                .map(|alg| Algorithm::from_str(alg).map_err(|_| invalid("VIGIL_JWT_ALGORITHMS", &v)))
                .collect::<Result<_, _>>()?;
        }

        if let Some(v) = lookup("VIGIL_JWT_LEEWAY_SECS") {
            self.jwt.leeway_secs = v
                .trim()
                .parse()
                .map_err(|_| invalid("VIGIL_JWT_LEEWAY_SECS", &v))?;
        }

        if let Some(v) = lookup("VIGIL_MAX_PAYLOAD_BYTES") {
            self.max_payload_bytes = v
                .trim()
                .parse()
                .map_err(|_| invalid("VIGIL_MAX_PAYLOAD_BYTES", &v))?;
        }

        if let Some(v) = lookup("VIGIL_DUPLICATE_KEY_IDS") {
            self.duplicate_key_ids = v
                .parse()
                .map_err(|_| invalid("VIGIL_DUPLICATE_KEY_IDS", &v))?;
        }

        if let Some(v) = lookup("VIGIL_DISABLED_FAMILIES") {
            self.disabled_families = split_list(&v).map(KeyType::parse).collect();
        }

        Ok(())
    }

    pub fn is_disabled(&self, family: &KeyType) -> bool {
        self.disabled_families.contains(family)
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}
