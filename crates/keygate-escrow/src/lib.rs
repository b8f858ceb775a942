//! keygate-escrow: Client side of the key-escrow network
//!
//! Two operations are needed from the network:
//! - **Handshake**: per-node identity exchange returning the node's public keys
//! - **Save encryption key**: hand a symmetric key to the nodes together with
//!   the conditions under which they may release it
//!
//! Nodes are only submitted to after a successful handshake; the results of
//! the last round are cached by [`EscrowNodeClient`].

mod client;
mod error;
mod handshake;

pub use client::{EscrowClient, EscrowConfig, EscrowNodeClient, KeySubmission, SAVE_KEY_PATH};
pub use error::{EscrowError, Result};
pub use handshake::{HandshakeCoordinator, HandshakeResult, ServerKeys, HANDSHAKE_PATH};
