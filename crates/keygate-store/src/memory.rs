//! In-process content store
//!
//! Ids are CIDv0-shaped (`Qm...`) over the sha2-256 of the stored bytes, so
//! they encode to the same on-chain word format as real IPFS ids.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use keygate_core::ContentId;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::tree::FileTree;
use crate::ContentStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: RwLock<HashMap<ContentId, Bytes>>,
    trees: RwLock<HashMap<ContentId, FileTree>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a directory tree, returning its root id
    pub async fn insert_tree(&self, tree: FileTree) -> ContentId {
        let mut hasher = Sha256::new();
        for (path, data) in tree.files_under("") {
            hasher.update(path.as_bytes());
            hasher.update([0u8]);
            hasher.update(data);
        }
        let cid = ContentId::from_digest(hasher.finalize().into());
        self.trees.write().await.insert(cid.clone(), tree);
        cid
    }

    pub async fn get(&self, cid: &ContentId) -> Option<Bytes> {
        self.blobs.read().await.get(cid).cloned()
    }

    pub async fn blob_count(&self) -> usize {
        self.blobs.read().await.len()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn put(&self, data: Bytes) -> Result<ContentId> {
        let cid = ContentId::from_digest(Sha256::digest(&data).into());
        self.blobs.write().await.insert(cid.clone(), data);
        Ok(cid)
    }

    async fn fetch_tree(&self, root: &ContentId, dir: &str) -> Result<FileTree> {
        let trees = self.trees.read().await;
        let tree = trees
            .get(root)
            .ok_or_else(|| StoreError::NotFound(root.to_string()))?;

        let subtree = tree.subtree(dir);
        if subtree.is_empty() {
            return Err(StoreError::NotFound(format!("{root}/{dir}")));
        }
        Ok(subtree)
    }
}
