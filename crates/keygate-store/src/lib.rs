//! keygate-store: Content-addressed storage capability
//!
//! The gateway writes ciphertext through [`ContentStore::put`]; the registry
//! reads its descriptor bundle through [`ContentStore::fetch_tree`].
//!
//! Implementations:
//! - [`KuboClient`]: IPFS Kubo RPC API over HTTP
//! - [`MemoryStore`]: process-local store with CIDv0-shaped ids

mod error;
mod kubo;
mod memory;
mod tree;

pub use error::{Result, StoreError};
pub use kubo::KuboClient;
pub use memory::MemoryStore;
pub use tree::FileTree;

use async_trait::async_trait;
use bytes::Bytes;
use keygate_core::ContentId;

/// Content-addressed storage
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store `data`, returning the id derived from it
    async fn put(&self, data: Bytes) -> Result<ContentId>;

    /// Fetch every file below `dir` inside the directory rooted at `root`.
    ///
    /// Paths in the returned tree are relative to `root`. A `dir` holding no
    /// files, at any depth, is [`StoreError::NotFound`].
    async fn fetch_tree(&self, root: &ContentId, dir: &str) -> Result<FileTree>;
}
