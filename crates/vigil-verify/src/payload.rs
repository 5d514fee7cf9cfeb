//! Simple-signing payload document.
//!
//! ```json
//! {"critical": {"identity": {"docker-reference": "registry.example/app"},
//!               "image": {"docker-manifest-digest": "sha256:..."},
//!               "type": "atomic container signature"},
//!  "optional": {"creator": "vigil", "timestamp": 1700000000}}
//! ```
//!
//! This module only builds payloads. Reading them back is the job of
//! [`TrustExtractor`](crate::TrustExtractor), which only accepts verified bytes.

use serde::{Deserialize, Serialize};

/// Value of `critical.type`.
pub const SIMPLE_SIGNING_TYPE: &str = "atomic container signature";

pub(crate) const DIGEST_POINTER: &str = "/critical/image/docker-manifest-digest";
pub(crate) const REFERENCE_POINTER: &str = "/critical/identity/docker-reference";
pub(crate) const CREATOR_POINTER: &str = "/optional/creator";
pub(crate) const TIMESTAMP_POINTER: &str = "/optional/timestamp";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleSigningPayload {
    pub critical: Critical,
    #[serde(default)]
    pub optional: Optional,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Critical {
    pub identity: Identity,
    pub image: ImageRef,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "docker-reference")]
    pub docker_reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    #[serde(rename = "docker-manifest-digest")]
    pub docker_manifest_digest: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Optional {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl SimpleSigningPayload {
    pub fn new(image_digest: impl Into<String>) -> Self {
        Self {
            critical: Critical {
                identity: Identity {
                    docker_reference: String::new(),
                },
                image: ImageRef {
                    docker_manifest_digest: image_digest.into(),
                },
                kind: SIMPLE_SIGNING_TYPE.to_string(),
            },
            optional: Optional::default(),
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.critical.identity.docker_reference = reference.into();
        self
    }

    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.optional.creator = Some(creator.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.optional.timestamp = Some(timestamp);
        self
    }

    /// Serialized bytes, ready to be signed.
    pub fn to_vec(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
