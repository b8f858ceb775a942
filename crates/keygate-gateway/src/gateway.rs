//! The protect pipeline
//!
//! ```text
//! content ──encrypt──► ciphertext ──put──► CID ──► bytes32
//!                                                    │
//!     registry lookup ──► condition [bytes32, :userAddress] == true
//!                                                    │
//!     identity signs statement ──► escrow save(key, sig, condition)
//!                                                    │
//!                                   envelope { contentId, handle, conditions }
//! ```
//!
//! Stages run in order and the first failure is returned as-is. Nothing is
//! retried or rolled back: a ciphertext uploaded before a later failure stays
//! in the store.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use keygate_core::constants::{DEFAULT_ACCESS_CONTRACT, DEFAULT_ACCESS_METHOD};
use keygate_core::{ConditionParam, EncryptionEnvelope, ReturnValueTest, SymmetricKey};
use keygate_escrow::{EscrowClient, KeySubmission};
use keygate_registry::ContractRegistry;
use keygate_store::ContentStore;
use tracing::{debug, info, warn};

use crate::cipher::{AesGcmCipher, ContentCipher};
use crate::condition::build_condition;
use crate::error::{GatewayError, Result};
use crate::identity::AuthIdentity;
use crate::metrics;

/// Content to protect and the predicate that will gate it
#[derive(Debug, Clone)]
pub struct ProtectRequest {
    pub content: Bytes,
    pub contract: String,
    pub method: String,
    pub chain: String,
}

impl ProtectRequest {
    /// Gated by ownership on the default access contract
    pub fn new(content: impl Into<Bytes>, chain: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            contract: DEFAULT_ACCESS_CONTRACT.into(),
            method: DEFAULT_ACCESS_METHOD.into(),
            chain: chain.into(),
        }
    }

    pub fn with_predicate(mut self, contract: impl Into<String>, method: impl Into<String>) -> Self {
        self.contract = contract.into();
        self.method = method.into();
        self
    }
}

pub struct AccessGateway {
    registry: Arc<ContractRegistry>,
    store: Arc<dyn ContentStore>,
    escrow: Arc<dyn EscrowClient>,
    cipher: Arc<dyn ContentCipher>,
}

impl AccessGateway {
    pub fn new(
        registry: Arc<ContractRegistry>,
        store: Arc<dyn ContentStore>,
        escrow: Arc<dyn EscrowClient>,
    ) -> Self {
        Self {
            registry,
            store,
            escrow,
            cipher: Arc::new(AesGcmCipher),
        }
    }

    pub fn with_cipher(mut self, cipher: Arc<dyn ContentCipher>) -> Self {
        self.cipher = cipher;
        self
    }

    pub fn registry(&self) -> &ContractRegistry {
        &self.registry
    }

    /// Encrypt `request.content`, store it, and escrow its key under an
    /// on-chain predicate. The key itself is never returned.
    pub async fn protect(
        &self,
        request: &ProtectRequest,
        identity: &dyn AuthIdentity,
    ) -> Result<EncryptionEnvelope> {
        let start = Instant::now();
        let result = self.run_protect(request, identity).await;

        match &result {
            Ok(envelope) => {
                metrics::record_protect(metrics::OUTCOME_OK, "complete", start.elapsed());
                info!(
                    cid = %envelope.content_id,
                    contract = %request.contract,
                    chain = %request.chain,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Content protected"
                );
            }
            Err(e) => {
                metrics::record_protect(metrics::OUTCOME_ERROR, e.stage(), start.elapsed());
                warn!(stage = e.stage(), error = %e, "Protect failed");
            }
        }
        result
    }

    async fn run_protect(
        &self,
        request: &ProtectRequest,
        identity: &dyn AuthIdentity,
    ) -> Result<EncryptionEnvelope> {
        let key = self.cipher.generate_key();
        let ciphertext = self.cipher.seal(&key, &request.content)?;

        let cid = self
            .store
            .put(Bytes::from(ciphertext))
            .await
            .map_err(GatewayError::Upload)?;
        debug!(cid = %cid, "Ciphertext stored");

        self.escrow_key(key, &cid, request, identity)
            .await
            .inspect_err(|e| {
                warn!(cid = %cid, stage = e.stage(), "Uploaded ciphertext left without an escrowed key");
            })
    }

    /// Every stage after the upload
    async fn escrow_key(
        &self,
        key: SymmetricKey,
        cid: &keygate_core::ContentId,
        request: &ProtectRequest,
        identity: &dyn AuthIdentity,
    ) -> Result<EncryptionEnvelope> {
        let cid_word = cid.to_bytes32_hex().map_err(GatewayError::ContentId)?;

        let binding = self
            .registry
            .lookup(&request.contract)
            .ok_or_else(|| GatewayError::ContractNotFound(request.contract.clone()))?;

        let condition = build_condition(
            binding,
            &request.chain,
            &request.method,
            vec![ConditionParam::literal(cid_word), ConditionParam::user_address()],
            ReturnValueTest::boolean_true(),
        )?;
        let conditions = vec![condition];

        let auth_sig = identity.sign_statement(&request.chain).await?;

        let submission = KeySubmission {
            symmetric_key: key,
            auth_sig,
            access_control_conditions: conditions.clone(),
            chain: request.chain.clone(),
        };
        let handle = self
            .escrow
            .save_encryption_key(&submission)
            .await
            .map_err(GatewayError::EscrowRejected)?;

        Ok(EncryptionEnvelope {
            content_id: cid.clone(),
            encrypted_key_handle: handle,
            conditions,
        })
    }

    /// Decrypt content for a holder of a released key
    pub fn decrypt_with_key(&self, key: &SymmetricKey, ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.cipher.open(key, ciphertext)
    }
}
