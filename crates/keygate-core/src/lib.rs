//! keygate-core: Core types for conditional-access encryption
//!
//! This crate defines the data model shared by the registry, the escrow
//! client and the gateway pipeline:
//! - Contract descriptors loaded from a content-addressed bundle
//! - Access conditions evaluated by the escrow network against chain state
//! - Authorization statements and the envelope produced by a protect call
//!
//! # Trust Model
//!
//! | Party | Sees |
//! |-------|------|
//! | Content-addressed storage | Ciphertext only |
//! | Escrow network | Symmetric key, conditions, caller's authorization |
//! | Chain | Nothing until a decryption request triggers the predicate |
//! | Caller | Envelope (content id + key handle), never the raw key |
//!
//! The envelope alone is sufficient to request decryption later, together
//! with the requester's own signing capability.

mod auth;
mod condition;
mod content_id;
mod descriptor;
mod envelope;
mod error;
mod key;
mod manifest;

pub use auth::AuthSig;
pub use condition::{AccessCondition, ConditionParam, ReturnValueTest, USER_ADDRESS_PLACEHOLDER};
pub use content_id::ContentId;
pub use descriptor::{ContractConfig, ContractDescriptor};
pub use envelope::{EncryptedKeyHandle, EncryptionEnvelope};
pub use error::Error;
pub use key::SymmetricKey;
pub use manifest::RegistryManifest;

pub use alloy_primitives::Address;

pub type Result<T> = std::result::Result<T, Error>;

/// Constants shared across the workspace
pub mod constants {
    /// Symmetric key length in bytes (AES-256)
    pub const SYMMETRIC_KEY_LEN: usize = 32;

    /// Multihash prefix of a CIDv0: sha2-256 code followed by digest length
    pub const CIDV0_MULTIHASH_PREFIX: [u8; 2] = [0x12, 0x20];

    /// Contract gating protected content in the default deployment
    pub const DEFAULT_ACCESS_CONTRACT: &str = "BUIBlockNFT";

    /// Ownership predicate on the default access contract
    pub const DEFAULT_ACCESS_METHOD: &str = "verifyOwner";

    /// Manifest keys no contract may be named after
    pub const MANIFEST_RESERVED_KEYS: [&str; 2] = ["chain", "network"];
}
