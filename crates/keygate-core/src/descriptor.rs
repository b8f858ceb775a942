//! Contract descriptors: address + interface definition for one deployed contract

use alloy_json_abi::{Function, JsonAbi};
use alloy_primitives::Address;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::constants::MANIFEST_RESERVED_KEYS;
use crate::{Error, Result};

/// On-disk shape of a descriptor file inside the bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractConfig {
    pub address: Address,
    pub abi: JsonAbi,
    pub contract_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_key: Option<String>,
}

/// A parsed contract descriptor. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct ContractDescriptor {
    /// Unique registry key
    pub name: String,
    /// Deployed address (20 bytes)
    pub address: Address,
    /// Interface definition
    pub abi: JsonAbi,
    /// Opaque key blob shipped alongside some contracts
    pub encrypted_key: Option<String>,
    /// Original serialized form, republished verbatim in the manifest
    pub raw: Bytes,
}

impl ContractDescriptor {
    /// Parse a descriptor from its serialized bundle entry
    pub fn from_slice(raw: impl Into<Bytes>) -> Result<Self> {
        let raw = raw.into();
        let config: ContractConfig = serde_json::from_slice(&raw)?;

        if config.contract_name.trim().is_empty() {
            return Err(Error::InvalidDescriptor("empty contractName".into()));
        }
        // the name becomes a manifest key
        if MANIFEST_RESERVED_KEYS.contains(&config.contract_name.as_str()) {
            return Err(Error::InvalidDescriptor(format!(
                "contractName {:?} is reserved",
                config.contract_name
            )));
        }

        Ok(Self {
            name: config.contract_name,
            address: config.address,
            abi: config.abi,
            encrypted_key: config.encrypted_key.filter(|k| !k.is_empty()),
            raw,
        })
    }

    /// Resolve a method by name. Overloads resolve to the first declaration.
    pub fn method(&self, name: &str) -> Option<&Function> {
        self.abi.function(name).and_then(|overloads| overloads.first())
    }

    /// Whether the interface declares `name`
    pub fn has_method(&self, name: &str) -> bool {
        self.method(name).is_some()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn nft_descriptor_json() -> String {
        serde_json::json!({
            "address": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
            "contractName": "BUIBlockNFT",
            "encryptedKey": "",
            "abi": [
                {
                    "type": "function",
                    "name": "verifyOwner",
                    "stateMutability": "view",
                    "inputs": [
                        { "name": "cid", "type": "bytes32", "internalType": "bytes32" },
                        { "name": "owner", "type": "address", "internalType": "address" }
                    ],
                    "outputs": [
                        { "name": "", "type": "bool", "internalType": "bool" }
                    ]
                }
            ]
        })
        .to_string()
    }

    #[test]
    fn test_descriptor_parse() {
        let descriptor = ContractDescriptor::from_slice(nft_descriptor_json().into_bytes()).unwrap();

        assert_eq!(descriptor.name, "BUIBlockNFT");
        assert_eq!(
            descriptor.address,
            "0x5FbDB2315678afecb367f032d93F642f64180aa3".parse::<Address>().unwrap()
        );
        assert!(descriptor.has_method("verifyOwner"));
        assert!(!descriptor.has_method("burn"));
        assert!(descriptor.encrypted_key.is_none());
        assert_eq!(descriptor.raw, Bytes::from(nft_descriptor_json()));
    }

    #[test]
    fn test_descriptor_keeps_encrypted_key() {
        let mut value: serde_json::Value = serde_json::from_str(&nft_descriptor_json()).unwrap();
        value["encryptedKey"] = "deadbeef".into();

        let descriptor = ContractDescriptor::from_slice(value.to_string().into_bytes()).unwrap();
        assert_eq!(descriptor.encrypted_key.as_deref(), Some("deadbeef"));
    }

    #[test]
    fn test_descriptor_rejects_malformed() {
        assert!(ContractDescriptor::from_slice(&b"{not json"[..]).is_err());

        let missing_name = r#"{"address":"0x5FbDB2315678afecb367f032d93F642f64180aa3","abi":[],"contractName":" "}"#;
        assert!(matches!(
            ContractDescriptor::from_slice(missing_name.as_bytes().to_vec()),
            Err(Error::InvalidDescriptor(_))
        ));
    }

    #[test]
    fn test_descriptor_rejects_reserved_name() {
        for reserved in MANIFEST_RESERVED_KEYS {
            let mut value: serde_json::Value = serde_json::from_str(&nft_descriptor_json()).unwrap();
            value["contractName"] = reserved.into();

            let result = ContractDescriptor::from_slice(value.to_string().into_bytes());
            assert!(matches!(result, Err(Error::InvalidDescriptor(msg)) if msg.contains(reserved)));
        }
    }
}
