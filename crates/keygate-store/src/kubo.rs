//! IPFS Kubo RPC API client

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use keygate_core::ContentId;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::error::{Result, StoreError};
use crate::tree::{normalize, FileTree};
use crate::ContentStore;

/// Kubo `ls` link type for directories
const LINK_TYPE_DIRECTORY: u8 = 1;

#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

#[derive(Debug, Deserialize)]
struct LsResponse {
    #[serde(rename = "Objects")]
    objects: Vec<LsObject>,
}

#[derive(Debug, Deserialize)]
struct LsObject {
    #[serde(rename = "Links", default)]
    links: Vec<LsLink>,
}

#[derive(Debug, Clone, Deserialize)]
struct LsLink {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Hash")]
    hash: String,
    #[serde(rename = "Type")]
    kind: u8,
}

/// Client for a Kubo node's `/api/v0` endpoints
#[derive(Debug, Clone)]
pub struct KuboClient {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl KuboClient {
    pub fn new(api_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Bearer token sent with every request (pinning services, gateways)
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into()).filter(|t: &String| !t.is_empty());
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn post(&self, command: &str) -> reqwest::RequestBuilder {
        let request = self.http.post(format!("{}/api/v0/{}", self.api_url, command));
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(StoreError::Status {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response)
    }

    /// Raw bytes of a file by CID or path
    pub async fn cat(&self, path: &str) -> Result<Bytes> {
        let response = self.send(self.post("cat").query(&[("arg", path)])).await?;
        Ok(response.bytes().await?)
    }

    async fn ls(&self, path: &str) -> Result<Vec<LsLink>> {
        let response = self.send(self.post("ls").query(&[("arg", path)])).await?;
        let listing: LsResponse = response.json().await?;
        let object = listing
            .objects
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::InvalidResponse(format!("empty listing for {path}")))?;
        Ok(object.links)
    }
}

#[async_trait]
impl ContentStore for KuboClient {
    async fn put(&self, data: Bytes) -> Result<ContentId> {
        let size = data.len();
        let form = Form::new().part("file", Part::bytes(data.to_vec()).file_name("content"));
        let response = self
            .send(
                self.post("add")
                    .query(&[("pin", "true"), ("cid-version", "0")])
                    .multipart(form),
            )
            .await?;

        let added: AddResponse = response.json().await?;
        if added.hash.is_empty() {
            return Err(StoreError::InvalidResponse("add returned an empty hash".into()));
        }

        tracing::debug!(cid = %added.hash, size, "Stored content");
        Ok(ContentId::new(added.hash))
    }

    async fn fetch_tree(&self, root: &ContentId, dir: &str) -> Result<FileTree> {
        let mut tree = FileTree::new();
        let mut pending = vec![normalize(dir)];

        while let Some(current) = pending.pop() {
            let listing_path = if current.is_empty() {
                root.to_string()
            } else {
                format!("{root}/{current}")
            };

            for link in self.ls(&listing_path).await? {
                let child = if current.is_empty() {
                    link.name.clone()
                } else {
                    format!("{current}/{}", link.name)
                };

                if link.kind == LINK_TYPE_DIRECTORY {
                    pending.push(child);
                } else {
                    let data = self.cat(&link.hash).await?;
                    tree.insert(&child, data);
                }
            }
        }

        if tree.is_empty() {
            return Err(StoreError::NotFound(format!("{root}/{dir}")));
        }

        tracing::debug!(root = %root, dir, files = tree.len(), "Fetched bundle tree");
        Ok(tree)
    }
}
