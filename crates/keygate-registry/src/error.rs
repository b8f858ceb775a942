//! Registry error types

use keygate_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Registry already initialized")]
    AlreadyInitialized,

    #[error("Registry not loaded")]
    NotLoaded,

    #[error("Failed to fetch descriptor bundle {bundle}: {source}")]
    FetchFailed {
        bundle: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to parse descriptor {path}: {source}")]
    ParseFailed {
        path: String,
        #[source]
        source: keygate_core::Error,
    },

    #[error("Duplicate contract {name} at {path}")]
    DuplicateContract { name: String, path: String },

    #[error("Contract not found: {0}")]
    ContractNotFound(String),

    #[error("Method {method} not found on {contract}")]
    MethodNotFound { contract: String, method: String },

    #[error("Binding for {0} has no signer")]
    MissingSender(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("ABI error: {0}")]
    Abi(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Manifest error: {0}")]
    Manifest(#[from] keygate_core::Error),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
