//! Escrow client error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EscrowError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Node {url} returned {status}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    #[error("Invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    #[error("Handshake with {url} failed: {reason}")]
    HandshakeUnreachable { url: String, reason: String },

    #[error("Not enough escrow nodes: {reachable} reachable, {required} required")]
    NotEnoughNodes { reachable: usize, required: usize },

    #[error("Key submission rejected: {accepted} of {required} required nodes accepted ({reason})")]
    Rejected {
        accepted: usize,
        required: usize,
        reason: String,
    },

    #[error("Escrow nodes returned inconsistent key handles")]
    InconsistentHandles,
}

pub type Result<T> = std::result::Result<T, EscrowError>;
