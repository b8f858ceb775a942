//! Registry manifest: the loaded interface definitions, republished for clients
//!
//! Wire shape is a flat object: `{ "chain", "network", "<contractName>": <descriptor>, ... }`.
//! Descriptors are embedded byte-for-byte as they were read from the bundle.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;

use crate::constants::MANIFEST_RESERVED_KEYS;
use crate::{Error, Result};

const CHAIN_KEY: &str = "chain";
const NETWORK_KEY: &str = "network";

#[derive(Debug, Clone)]
pub struct RegistryManifest {
    pub chain: String,
    pub network: String,
    contracts: BTreeMap<String, Box<RawValue>>,
}

impl RegistryManifest {
    pub fn new(chain: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            chain: chain.into(),
            network: network.into(),
            contracts: BTreeMap::new(),
        }
    }

    /// Embed a contract's raw descriptor
    pub fn insert(&mut self, name: &str, raw: &[u8]) -> Result<()> {
        if MANIFEST_RESERVED_KEYS.contains(&name) {
            return Err(Error::InvalidManifest(format!(
                "contract name {name:?} collides with a reserved key"
            )));
        }
        let text = std::str::from_utf8(raw)
            .map_err(|e| Error::InvalidManifest(format!("descriptor {name} is not UTF-8: {e}")))?;
        let raw = RawValue::from_string(text.to_string())?;
        self.contracts.insert(name.to_string(), raw);
        Ok(())
    }

    /// Raw descriptor JSON for `name`
    pub fn contract(&self, name: &str) -> Option<&str> {
        self.contracts.get(name).map(|raw| raw.get())
    }

    pub fn contract_names(&self) -> impl Iterator<Item = &str> {
        self.contracts.keys().map(String::as_str)
    }

    pub fn contract_count(&self) -> usize {
        self.contracts.len()
    }

    pub fn to_vec(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_slice(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Load manifest from JSON file
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read(path.as_ref())?;
        Self::from_slice(&content)
    }

    /// Save manifest to JSON file
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_vec()?)?;
        Ok(())
    }
}

impl Serialize for RegistryManifest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.contracts.len() + 2))?;
        map.serialize_entry(CHAIN_KEY, &self.chain)?;
        map.serialize_entry(NETWORK_KEY, &self.network)?;
        for (name, raw) in &self.contracts {
            map.serialize_entry(name, raw)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RegistryManifest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let mut entries = BTreeMap::<String, Box<RawValue>>::deserialize(deserializer)?;

        let mut take_str = |key: &'static str| -> std::result::Result<String, D::Error> {
            let raw = entries.remove(key).ok_or_else(|| D::Error::missing_field(key))?;
            serde_json::from_str(raw.get()).map_err(D::Error::custom)
        };

        let chain = take_str(CHAIN_KEY)?;
        let network = take_str(NETWORK_KEY)?;

        Ok(Self {
            chain,
            network,
            contracts: entries,
        })
    }
}
