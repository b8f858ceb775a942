//! Gateway error types
//!
//! Protect-pipeline variants are named after the stage that failed.

use keygate_escrow::EscrowError;
use keygate_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Encryption failed: {0}")]
    Encrypt(String),

    #[error("Decryption failed: {0}")]
    Decrypt(String),

    #[error("Upload failed: {0}")]
    Upload(#[source] StoreError),

    #[error("Content id not encodable: {0}")]
    ContentId(#[source] keygate_core::Error),

    #[error("Contract not found: {0}")]
    ContractNotFound(String),

    #[error("Method {method} not found on contract {contract}")]
    MethodNotFound { contract: String, method: String },

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Escrow rejected key: {0}")]
    EscrowRejected(#[source] EscrowError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GatewayError {
    /// Stable label for the failing stage, used in logs and metrics
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Encrypt(_) => "encrypt",
            Self::Decrypt(_) => "decrypt",
            Self::Upload(_) => "upload",
            Self::ContentId(_) => "content_id",
            Self::ContractNotFound(_) => "lookup",
            Self::MethodNotFound { .. } => "method",
            Self::SigningFailed(_) => "sign",
            Self::EscrowRejected(_) => "escrow",
            Self::Config(_) | Self::Io(_) | Self::Json(_) => "config",
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
