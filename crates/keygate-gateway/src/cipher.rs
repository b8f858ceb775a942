//! Symmetric content encryption
//!
//! Sealed layout: `nonce (12 bytes) || ciphertext || tag (16 bytes)`.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use keygate_core::constants::SYMMETRIC_KEY_LEN;
use keygate_core::SymmetricKey;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::{GatewayError, Result};

pub const NONCE_LEN: usize = 12;

/// Authenticated symmetric cipher used for protected content
pub trait ContentCipher: Send + Sync {
    /// Fresh key from a CSPRNG
    fn generate_key(&self) -> SymmetricKey;

    fn seal(&self, key: &SymmetricKey, plaintext: &[u8]) -> Result<Vec<u8>>;

    fn open(&self, key: &SymmetricKey, sealed: &[u8]) -> Result<Vec<u8>>;
}

/// AES-256-GCM with a random nonce per message
#[derive(Debug, Clone, Copy, Default)]
pub struct AesGcmCipher;

impl ContentCipher for AesGcmCipher {
    fn generate_key(&self) -> SymmetricKey {
        let mut bytes = Zeroizing::new([0u8; SYMMETRIC_KEY_LEN]);
        OsRng.fill_bytes(bytes.as_mut());
        SymmetricKey::from_bytes(*bytes)
    }

    fn seal(&self, key: &SymmetricKey, plaintext: &[u8]) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|e| GatewayError::Encrypt(format!("cipher init: {e}")))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|e| GatewayError::Encrypt(e.to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    fn open(&self, key: &SymmetricKey, sealed: &[u8]) -> Result<Vec<u8>> {
        if sealed.len() < NONCE_LEN {
            return Err(GatewayError::Decrypt(format!(
                "sealed data too short: {} bytes",
                sealed.len()
            )));
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);

        let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|e| GatewayError::Decrypt(format!("cipher init: {e}")))?;
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| GatewayError::Decrypt(e.to_string()))
    }
}
