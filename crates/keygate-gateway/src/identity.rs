//! Caller identities able to sign chain-scoped authorization statements

use alloy_primitives::{Address, B256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use keygate_core::AuthSig;
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::error::{GatewayError, Result};

const SIWE_NONCE_LEN: usize = 16;

/// Signing capability handed to the gateway for one operation
#[async_trait]
pub trait AuthIdentity: Send + Sync {
    fn address(&self) -> Address;

    /// Sign a fresh statement scoped to `chain`
    async fn sign_statement(&self, chain: &str) -> Result<AuthSig>;
}

/// Identity backed by an in-process secp256k1 key
pub struct LocalIdentity {
    signer: PrivateKeySigner,
    domain: String,
    uri: String,
    /// Used when the requested chain is not a numeric id
    default_chain_id: u64,
}

impl LocalIdentity {
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self {
            signer,
            domain: "localhost".into(),
            uri: "http://localhost/".into(),
            default_chain_id: 1,
        }
    }

    /// Parse a `0x`-prefixed or bare 32-byte hex private key
    pub fn from_hex(private_key: &str) -> Result<Self> {
        let hex_str = private_key.strip_prefix("0x").unwrap_or(private_key);
        let key_bytes: [u8; 32] = hex::decode(hex_str)
            .map_err(|e| GatewayError::SigningFailed(format!("invalid private key hex: {e}")))?
            .try_into()
            .map_err(|_| GatewayError::SigningFailed("invalid key length, expected 32 bytes".into()))?;

        let signer = PrivateKeySigner::from_bytes(&B256::from(key_bytes))
            .map_err(|e| GatewayError::SigningFailed(format!("invalid private key: {e}")))?;
        Ok(Self::new(signer))
    }

    pub fn random() -> Self {
        Self::new(PrivateKeySigner::random())
    }

    pub fn with_domain(mut self, domain: impl Into<String>, uri: impl Into<String>) -> Self {
        self.domain = domain.into();
        self.uri = uri.into();
        self
    }

    pub fn with_default_chain_id(mut self, chain_id: u64) -> Self {
        self.default_chain_id = chain_id;
        self
    }

    /// EIP-4361 sign-in message for `chain`
    fn statement(&self, chain: &str) -> String {
        let chain_id = chain.parse::<u64>().unwrap_or(self.default_chain_id);
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SIWE_NONCE_LEN)
            .map(char::from)
            .collect();
        let issued_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        format!(
            "{domain} wants you to sign in with your Ethereum account:\n\
             {address}\n\
             \n\
             URI: {uri}\n\
             Version: 1\n\
             Chain ID: {chain_id}\n\
             Nonce: {nonce}\n\
             Issued At: {issued_at}",
            domain = self.domain,
            address = self.signer.address().to_checksum(None),
            uri = self.uri,
        )
    }
}

#[async_trait]
impl AuthIdentity for LocalIdentity {
    fn address(&self) -> Address {
        self.signer.address()
    }

    async fn sign_statement(&self, chain: &str) -> Result<AuthSig> {
        let message = self.statement(chain);
        let sig = self
            .signer
            .sign_message_sync(message.as_bytes())
            .map_err(|e| GatewayError::SigningFailed(e.to_string()))?;

        Ok(AuthSig::personal_sign(
            format!("0x{}", hex::encode(sig.as_bytes())),
            message,
            self.signer.address().to_checksum(None),
            chain,
        ))
    }
}
