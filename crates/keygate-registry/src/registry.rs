//! The contract registry: loaded exactly once, read lock-free afterwards

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use alloy_rpc_client::{ClientBuilder, RpcClient};
use alloy_signer_local::PrivateKeySigner;
use keygate_core::{ContentId, ContractDescriptor, RegistryManifest};
use keygate_store::ContentStore;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::binding::ContractBinding;
use crate::error::{RegistryError, Result};

/// Published registry contents
struct LoadedContracts {
    chain: String,
    network: String,
    bundle: ContentId,
    contracts: BTreeMap<String, ContractBinding>,
}

/// Name-indexed contract bindings over one shared RPC client
pub struct ContractRegistry {
    rpc: RpcClient,
    loaded: OnceLock<LoadedContracts>,
    /// Serializes `load_all` so at most one load publishes
    load_lock: Mutex<()>,
}

impl ContractRegistry {
    pub fn new(rpc: RpcClient) -> Self {
        Self {
            rpc,
            loaded: OnceLock::new(),
            load_lock: Mutex::new(()),
        }
    }

    /// Registry over a JSON-RPC endpoint
    pub async fn connect(provider_url: &str) -> Result<Self> {
        let rpc = ClientBuilder::default()
            .connect(provider_url)
            .await
            .map_err(|e| RegistryError::Rpc(e.to_string()))?;
        Ok(Self::new(rpc))
    }

    /// Fetch the bundle and publish one binding per descriptor under
    /// `{chain}/{network}`. Returns the number of contracts loaded.
    pub async fn load_all(
        &self,
        chain: &str,
        network: &str,
        bundle: &ContentId,
        store: &dyn ContentStore,
    ) -> Result<usize> {
        let _guard = self.load_lock.lock().await;
        if self.loaded.get().is_some() {
            return Err(RegistryError::AlreadyInitialized);
        }

        let root = format!("{chain}/{network}");
        let tree = store
            .fetch_tree(bundle, &root)
            .await
            .map_err(|source| RegistryError::FetchFailed {
                bundle: bundle.to_string(),
                source,
            })?;

        let mut contracts = BTreeMap::new();
        for (path, data) in tree.files_under(&root) {
            let descriptor = ContractDescriptor::from_slice(data.clone()).map_err(|source| {
                RegistryError::ParseFailed {
                    path: path.to_string(),
                    source,
                }
            })?;

            if contracts.contains_key(&descriptor.name) {
                return Err(RegistryError::DuplicateContract {
                    name: descriptor.name,
                    path: path.to_string(),
                });
            }

            let binding = ContractBinding::new(Arc::new(descriptor), self.rpc.clone());
            contracts.insert(binding.name().to_string(), binding);
        }

        if contracts.is_empty() {
            warn!(bundle = %bundle, root = %root, "Descriptor bundle has no contracts");
        }

        let count = contracts.len();
        let loaded = LoadedContracts {
            chain: chain.to_string(),
            network: network.to_string(),
            bundle: bundle.clone(),
            contracts,
        };
        if self.loaded.set(loaded).is_err() {
            return Err(RegistryError::AlreadyInitialized);
        }

        info!(bundle = %bundle, chain, network, contracts = count, "Contract registry loaded");
        Ok(count)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    /// Canonical binding for `name`; `None` when absent or not loaded
    pub fn lookup(&self, name: &str) -> Option<&ContractBinding> {
        self.loaded.get()?.contracts.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Independent binding for `name` that signs with `signer`.
    /// The canonical entry is left untouched.
    pub fn bind_for_caller(&self, name: &str, signer: PrivateKeySigner) -> Result<ContractBinding> {
        self.lookup(name)
            .map(|binding| binding.with_signer(signer))
            .ok_or_else(|| RegistryError::ContractNotFound(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.loaded
            .get()
            .map(|l| l.contracts.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.loaded.get().map_or(0, |l| l.contracts.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn chain(&self) -> Option<&str> {
        self.loaded.get().map(|l| l.chain.as_str())
    }

    pub fn network(&self) -> Option<&str> {
        self.loaded.get().map(|l| l.network.as_str())
    }

    /// Bundle the registry was loaded from
    pub fn bundle(&self) -> Option<&ContentId> {
        self.loaded.get().map(|l| &l.bundle)
    }

    /// Manifest embedding every loaded descriptor's raw bytes
    pub fn manifest(&self) -> Result<RegistryManifest> {
        let loaded = self.loaded.get().ok_or(RegistryError::NotLoaded)?;
        let mut manifest = RegistryManifest::new(&loaded.chain, &loaded.network);
        for (name, binding) in &loaded.contracts {
            manifest.insert(name, &binding.descriptor().raw)?;
        }
        Ok(manifest)
    }

    /// Serialized [`Self::manifest`]
    pub fn serialize_manifest(&self) -> Result<Vec<u8>> {
        Ok(self.manifest()?.to_vec()?)
    }
}
