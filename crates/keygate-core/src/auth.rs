//! Authorization statements proving control of an on-chain identity

use serde::{Deserialize, Serialize};

/// How the signature was produced, as the escrow nodes expect it spelled
pub const DERIVED_VIA_PERSONAL_SIGN: &str = "web3.eth.personal.sign";

/// A caller-signed, chain-scoped statement. Single use per operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSig {
    /// `0x`-hex 65-byte signature
    pub sig: String,
    pub derived_via: String,
    /// The exact message that was signed
    pub signed_message: String,
    /// Checksummed signer address
    pub address: String,
    /// Chain the statement is scoped to
    pub chain: String,
}

impl AuthSig {
    pub fn personal_sign(
        sig: impl Into<String>,
        signed_message: impl Into<String>,
        address: impl Into<String>,
        chain: impl Into<String>,
    ) -> Self {
        Self {
            sig: sig.into(),
            derived_via: DERIVED_VIA_PERSONAL_SIGN.to_string(),
            signed_message: signed_message.into(),
            address: address.into(),
            chain: chain.into(),
        }
    }
}
