//! The durable artifact of a protect operation

use serde::{Deserialize, Serialize};

use crate::{AccessCondition, ContentId};

/// Opaque reference to a key held by the escrow network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedKeyHandle(pub String);

impl EncryptedKeyHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EncryptedKeyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the ciphertext lives and how to get its key released
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionEnvelope {
    pub content_id: ContentId,
    pub encrypted_key_handle: EncryptedKeyHandle,
    pub conditions: Vec<AccessCondition>,
}
