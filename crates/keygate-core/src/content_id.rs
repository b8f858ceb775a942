//! Content identifiers and their fixed-width on-chain encoding

use std::fmt;

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

use crate::constants::CIDV0_MULTIHASH_PREFIX;
use crate::{Error, Result};

/// Address of a piece of content in content-addressed storage
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    pub fn new(cid: impl Into<String>) -> Self {
        Self(cid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encode as the 32-byte word the on-chain predicate takes.
    ///
    /// Only CIDv0 (`Qm...`, sha2-256) fits: the two-byte multihash prefix is
    /// dropped and the digest is kept.
    pub fn to_bytes32(&self) -> Result<B256> {
        let invalid = |reason: &str| Error::InvalidContentId {
            cid: self.0.clone(),
            reason: reason.to_string(),
        };

        let decoded = bs58::decode(&self.0)
            .into_vec()
            .map_err(|e| invalid(&e.to_string()))?;

        if decoded.len() != 34 {
            return Err(invalid("expected a 34-byte CIDv0 multihash"));
        }
        if decoded[..2] != CIDV0_MULTIHASH_PREFIX {
            return Err(invalid("not a sha2-256 multihash"));
        }

        Ok(B256::from_slice(&decoded[2..]))
    }

    /// `0x`-prefixed hex of [`Self::to_bytes32`], as passed in condition params
    pub fn to_bytes32_hex(&self) -> Result<String> {
        Ok(format!("0x{}", hex::encode(self.to_bytes32()?)))
    }

    /// CIDv0 for a raw sha2-256 digest
    pub fn from_digest(digest: [u8; 32]) -> Self {
        Self::from_bytes32(B256::from(digest))
    }

    /// Rebuild a CIDv0 from its on-chain word
    pub fn from_bytes32(word: B256) -> Self {
        let mut multihash = Vec::with_capacity(34);
        multihash.extend_from_slice(&CIDV0_MULTIHASH_PREFIX);
        multihash.extend_from_slice(word.as_slice());
        Self(bs58::encode(multihash).into_string())
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ContentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ContentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
