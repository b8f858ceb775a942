use std::path::Path;
use std::time::Duration;

use keygate_escrow::EscrowConfig;
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// JSON-RPC endpoint shared by every contract binding
    pub provider_url: String,
    /// Kubo RPC API base URL
    pub ipfs_api_url: String,
    /// Root of the contract descriptor bundle
    pub contracts_cid: String,
    /// Bearer token for the storage API, empty for none
    pub storage_token: String,
    /// Bundle directory and escrow chain name
    pub chain_name: String,
    pub network_name: String,
    /// Chain the authorization statement is scoped to
    pub chain_id: u64,
    /// Escrow node base URLs
    pub escrow_nodes: Vec<String>,
    pub min_node_count: usize,
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            provider_url: "http://localhost:8545".into(),
            ipfs_api_url: "http://localhost:5001".into(),
            contracts_cid: String::new(),
            storage_token: String::new(),
            chain_name: "polygon".into(),
            network_name: "mumbai".into(),
            chain_id: 80001, // Mumbai
            escrow_nodes: Vec::new(),
            min_node_count: 1,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl GatewayConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Settings that matter for a protect call
    pub fn validate(&self) -> Result<()> {
        if self.contracts_cid.is_empty() {
            return Err(GatewayError::Config("contracts_cid is not set".into()));
        }
        if self.chain_name.is_empty() || self.network_name.is_empty() {
            return Err(GatewayError::Config("chain_name and network_name are required".into()));
        }
        if self.escrow_nodes.len() < self.min_node_count {
            return Err(GatewayError::Config(format!(
                "{} escrow nodes configured, {} required",
                self.escrow_nodes.len(),
                self.min_node_count
            )));
        }
        Ok(())
    }

    pub fn escrow(&self) -> EscrowConfig {
        EscrowConfig {
            nodes: self.escrow_nodes.clone(),
            min_node_count: self.min_node_count,
            request_timeout: self.request_timeout,
            ..Default::default()
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}
