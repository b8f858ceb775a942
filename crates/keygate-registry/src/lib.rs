//! keygate-registry: Contract descriptors loaded once from a content-addressed bundle
//!
//! The registry is an explicit instance, constructed at startup and shared
//! (`Arc<ContractRegistry>`) with every component that needs bindings.
//!
//! ## Lifecycle
//! 1. `ContractRegistry::new(rpc)` - empty, shares one RPC client
//! 2. `load_all(chain, network, bundle, store)` - fetch, parse, publish (once)
//! 3. `lookup` / `bind_for_caller` / `serialize_manifest` - lock-free reads
//!
//! A failed load publishes nothing and may be retried; a successful one is final.

mod binding;
mod error;
mod registry;

pub use binding::{CallOutput, ContractBinding};
pub use error::{RegistryError, Result};
pub use registry::ContractRegistry;
