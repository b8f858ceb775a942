//! Symmetric key material handed to the escrow network

use std::fmt;

use serde::{Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::constants::SYMMETRIC_KEY_LEN;
use crate::{Error, Result};

/// A 256-bit content key. `Debug` never prints the bytes, and the bytes are
/// wiped when the key is dropped. Not `Clone`: exactly one copy exists.
#[derive(PartialEq, Eq)]
pub struct SymmetricKey([u8; SYMMETRIC_KEY_LEN]);

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; SYMMETRIC_KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SYMMETRIC_KEY_LEN {
            return Err(Error::InvalidKeyLength {
                expected: SYMMETRIC_KEY_LEN,
                actual: bytes.len(),
            });
        }
        let mut key = Self([0u8; SYMMETRIC_KEY_LEN]);
        key.0.copy_from_slice(bytes);
        Ok(key)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = Zeroizing::new(hex::decode(s).map_err(|_| Error::InvalidKeyLength {
            expected: SYMMETRIC_KEY_LEN,
            actual: s.len() / 2,
        })?);
        Self::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SYMMETRIC_KEY_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Zeroize for SymmetricKey {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for SymmetricKey {}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

impl Serialize for SymmetricKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let hex = Zeroizing::new(self.to_hex());
        serializer.serialize_str(&hex)
    }
}
