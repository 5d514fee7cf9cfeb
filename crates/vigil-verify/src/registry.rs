//! Key registry: public keys indexed by ID for one verification session.

use std::collections::HashMap;

use crate::config::DuplicateKeyPolicy;
use crate::error::{VerificationError, VerificationResult};
use crate::key::PublicKey;

/// Non-fatal findings recorded while building a [`KeyRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryDiagnostic {
    /// A later key replaced an earlier one with the same ID.
    DuplicateKeyId {
        key_id: String,
        /// Input position of the key that was replaced.
        replaced_position: usize,
        /// Input position of the key that is now registered.
        position: usize,
    },
}

/// Read-only index of public keys by ID.
#[derive(Debug, Clone, Default)]
pub struct KeyRegistry {
    keys: HashMap<String, PublicKey>,
    diagnostics: Vec<RegistryDiagnostic>,
}

impl KeyRegistry {
    /// Index `keys` by ID. On a repeated ID the last key wins and the
    /// collision is recorded in [`diagnostics`](Self::diagnostics).
    pub fn build(keys: impl IntoIterator<Item = PublicKey>) -> Self {
        let mut keys_by_id: HashMap<String, PublicKey> = HashMap::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut diagnostics = Vec::new();

        for (position, key) in keys.into_iter().enumerate() {
            if let Some(replaced_position) = positions.insert(key.id().to_string(), position) {
                tracing::warn!(
                    key_id = %key.id(),
                    replaced_position,
                    position,
                    "key with this ID already exists in key set, overwriting previous key"
                );
                diagnostics.push(RegistryDiagnostic::DuplicateKeyId {
                    key_id: key.id().to_string(),
                    replaced_position,
                    position,
                });
            }
            keys_by_id.insert(key.id().to_string(), key);
        }

        Self {
            keys: keys_by_id,
            diagnostics,
        }
    }

    /// Like [`build`](Self::build), but honours `policy`.
    pub fn build_with_policy(
        keys: impl IntoIterator<Item = PublicKey>,
        policy: DuplicateKeyPolicy,
    ) -> VerificationResult<Self> {
        let registry = Self::build(keys);
        if policy == DuplicateKeyPolicy::Reject {
            if let Some(RegistryDiagnostic::DuplicateKeyId { key_id, .. }) =
                registry.diagnostics.first()
            {
                return Err(VerificationError::DuplicateKeyId {
                    key_id: key_id.clone(),
                });
            }
        }
        Ok(registry)
    }

    pub fn lookup(&self, key_id: &str) -> Option<&PublicKey> {
        self.keys.get(key_id)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Registered IDs, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.keys.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn diagnostics(&self) -> &[RegistryDiagnostic] {
        &self.diagnostics
    }
}
