//! Concurrent identity handshake with every escrow node
//!
//! One task per node on a `JoinSet`; the round ends when every task has
//! finished. A node that errors, times out or panics is reported unreachable
//! without affecting any other node's result.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::{EscrowError, Result};

pub const HANDSHAKE_PATH: &str = "/web/handshake";

/// Public key material a node returns from the handshake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerKeys {
    #[serde(rename = "serverPubKey")]
    pub server_public_key: String,
    #[serde(rename = "subnetPubKey")]
    pub subnet_public_key: String,
    #[serde(rename = "networkPubKey")]
    pub network_public_key: String,
    #[serde(rename = "networkPubKeySet")]
    pub network_public_key_set: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct HandshakeRequest {
    client_public_key: String,
}

/// Outcome of one node's handshake
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeResult {
    pub url: String,
    pub reachable: bool,
    pub public_keys: Option<ServerKeys>,
}

impl HandshakeResult {
    pub fn unreachable(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reachable: false,
            public_keys: None,
        }
    }

    pub fn connected(url: impl Into<String>, keys: ServerKeys) -> Self {
        Self {
            url: url.into(),
            reachable: true,
            public_keys: Some(keys),
        }
    }
}

/// Fans a handshake out to a set of nodes and joins on all of them
#[derive(Debug, Clone)]
pub struct HandshakeCoordinator {
    http: reqwest::Client,
    client_public_key: String,
}

impl HandshakeCoordinator {
    /// Per-node timeouts come from `http`
    pub fn new(http: reqwest::Client, client_public_key: impl Into<String>) -> Self {
        Self {
            http,
            client_public_key: client_public_key.into(),
        }
    }

    /// Exactly one result per distinct node.
    ///
    /// URLs are normalized by stripping trailing `/` before deduplication,
    /// so `http://node/` and `http://node` are one node. Results are keyed
    /// by the normalized URL, which is also the URL each node is contacted at
    /// and the one reported in [`HandshakeResult::url`].
    pub async fn handshake<I, S>(&self, urls: I) -> BTreeMap<String, HandshakeResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let urls: BTreeSet<String> = urls
            .into_iter()
            .map(|u| u.as_ref().trim_end_matches('/').to_string())
            .collect();

        // every dispatched node starts unreachable; tasks only upgrade entries
        let mut results: BTreeMap<String, HandshakeResult> = urls
            .iter()
            .map(|url| (url.clone(), HandshakeResult::unreachable(url.clone())))
            .collect();

        let request = HandshakeRequest {
            client_public_key: self.client_public_key.clone(),
        };

        let mut tasks = JoinSet::new();
        for url in urls {
            let http = self.http.clone();
            let request = request.clone();
            tasks.spawn(async move {
                let outcome = request_keys(&http, &url, &request).await;
                (url, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((url, Ok(keys))) => {
                    debug!(node = %url, "Handshake complete");
                    results.insert(url.clone(), HandshakeResult::connected(url, keys));
                }
                Ok((url, Err(e))) => {
                    warn!(node = %url, error = %e, "Escrow node unreachable");
                }
                Err(e) => {
                    warn!(error = %e, "Handshake task aborted");
                }
            }
        }

        let reachable = results.values().filter(|r| r.reachable).count();
        info!(nodes = results.len(), reachable, "Handshake round complete");
        results
    }
}

async fn request_keys(
    http: &reqwest::Client,
    url: &str,
    request: &HandshakeRequest,
) -> Result<ServerKeys> {
    let handshake_failed = |reason: String| EscrowError::HandshakeUnreachable {
        url: url.to_string(),
        reason,
    };

    let response = http
        .post(format!("{url}{HANDSHAKE_PATH}"))
        .json(request)
        .send()
        .await
        .map_err(|e| handshake_failed(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(handshake_failed(format!("status {status}")));
    }

    let body = response.bytes().await.map_err(|e| handshake_failed(e.to_string()))?;
    serde_json::from_slice(&body).map_err(|e| handshake_failed(format!("unparsable keys: {e}")))
}
