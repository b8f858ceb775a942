//! keygate-gateway: Conditional-access encryption gateway
//!
//! Wires the contract registry, content store and escrow client into the
//! protect pipeline, plus the pieces the `keygate` binary needs:
//! - [`AccessGateway`]: encrypt, store, build the on-chain predicate, escrow the key
//! - [`AuthIdentity`]: signing capability supplied per operation
//! - [`GatewayConfig`]: endpoints and thresholds
//! - [`metrics`]: Prometheus counters and gauges

mod cipher;
mod condition;
mod config;
mod error;
mod gateway;
mod identity;
pub mod metrics;

pub use cipher::{AesGcmCipher, ContentCipher, NONCE_LEN};
pub use condition::build_condition;
pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use gateway::{AccessGateway, ProtectRequest};
pub use identity::{AuthIdentity, LocalIdentity};
