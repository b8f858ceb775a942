//! Key submission to the escrow network

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use futures::future::join_all;
use keygate_core::{AccessCondition, AuthSig, EncryptedKeyHandle, SymmetricKey};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{EscrowError, Result};
use crate::handshake::{HandshakeCoordinator, HandshakeResult};

pub const SAVE_KEY_PATH: &str = "/web/encryption/save";

/// Everything the escrow network needs to take custody of a key.
/// Owns the key, so dropping the submission wipes it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeySubmission {
    pub symmetric_key: SymmetricKey,
    pub auth_sig: AuthSig,
    pub access_control_conditions: Vec<AccessCondition>,
    pub chain: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveKeyResponse {
    encrypted_symmetric_key: String,
}

/// Key-custody capability used by the gateway
#[async_trait]
pub trait EscrowClient: Send + Sync {
    async fn save_encryption_key(&self, submission: &KeySubmission) -> Result<EncryptedKeyHandle>;
}

#[derive(Debug, Clone)]
pub struct EscrowConfig {
    /// Node base URLs
    pub nodes: Vec<String>,
    /// Nodes that must accept a submission (and be reachable to submit at all)
    pub min_node_count: usize,
    /// Per-request timeout, applies to handshakes and submissions
    pub request_timeout: Duration,
    /// Identity value sent in the handshake
    pub client_public_key: String,
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            min_node_count: 1,
            request_timeout: Duration::from_secs(30),
            client_public_key: "keygate".into(),
        }
    }
}

/// HTTP client for a set of escrow nodes
pub struct EscrowNodeClient {
    http: reqwest::Client,
    config: EscrowConfig,
    coordinator: HandshakeCoordinator,
    /// Results of the most recent handshake round
    handshakes: ArcSwap<BTreeMap<String, HandshakeResult>>,
}

impl EscrowNodeClient {
    pub fn new(config: EscrowConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let coordinator = HandshakeCoordinator::new(http.clone(), config.client_public_key.clone());

        Ok(Self {
            http,
            config,
            coordinator,
            handshakes: ArcSwap::from_pointee(BTreeMap::new()),
        })
    }

    pub fn config(&self) -> &EscrowConfig {
        &self.config
    }

    /// Run a handshake round against every configured node and cache it.
    ///
    /// The round is cached even when too few nodes answered.
    pub async fn connect(&self) -> Result<Arc<BTreeMap<String, HandshakeResult>>> {
        let results = Arc::new(self.coordinator.handshake(&self.config.nodes).await);
        self.handshakes.store(Arc::clone(&results));

        let reachable = results.values().filter(|r| r.reachable).count();
        if reachable < self.config.min_node_count {
            return Err(EscrowError::NotEnoughNodes {
                reachable,
                required: self.config.min_node_count,
            });
        }

        info!(reachable, nodes = results.len(), "Connected to escrow network");
        Ok(results)
    }

    /// Last cached handshake round
    pub fn handshakes(&self) -> Arc<BTreeMap<String, HandshakeResult>> {
        self.handshakes.load_full()
    }

    /// Nodes that answered the last handshake
    pub fn connected_nodes(&self) -> Vec<String> {
        self.handshakes
            .load()
            .values()
            .filter(|r| r.reachable)
            .map(|r| r.url.clone())
            .collect()
    }

    async fn submit(&self, url: &str, submission: &KeySubmission) -> Result<String> {
        let response = self
            .http
            .post(format!("{url}{SAVE_KEY_PATH}"))
            .json(submission)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EscrowError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let saved: SaveKeyResponse = response.json().await.map_err(|e| EscrowError::InvalidResponse {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(saved.encrypted_symmetric_key)
    }
}

#[async_trait]
impl EscrowClient for EscrowNodeClient {
    async fn save_encryption_key(&self, submission: &KeySubmission) -> Result<EncryptedKeyHandle> {
        let required = self.config.min_node_count;
        let nodes = self.connected_nodes();
        if nodes.len() < required {
            return Err(EscrowError::NotEnoughNodes {
                reachable: nodes.len(),
                required,
            });
        }

        let outcomes = join_all(nodes.iter().map(|url| self.submit(url, submission))).await;

        let mut handles = Vec::new();
        let mut last_error = None;
        for (url, outcome) in nodes.iter().zip(outcomes) {
            match outcome {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    warn!(node = %url, error = %e, "Escrow node rejected key");
                    last_error = Some(e.to_string());
                }
            }
        }

        if handles.len() < required.max(1) {
            return Err(EscrowError::Rejected {
                accepted: handles.len(),
                required,
                reason: last_error.unwrap_or_else(|| "no node accepted".into()),
            });
        }

        let first = handles[0].clone();
        if handles.iter().any(|h| *h != first) {
            return Err(EscrowError::InconsistentHandles);
        }

        info!(accepted = handles.len(), chain = %submission.chain, "Encryption key escrowed");
        Ok(EncryptedKeyHandle(first))
    }
}
