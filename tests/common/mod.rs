//! Mock Kubo, escrow and JSON-RPC servers shared by the integration tests
//!
//! Every server binds an ephemeral port and shuts down when its handle drops.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use alloy_primitives::{hex, keccak256};
use axum::{Json, Router};
use bytes::Bytes;
use keygate_core::ContentId;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

pub const BUNDLE_ROOT: &str = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";
pub const NFT_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
pub const MARKETPLACE_ADDRESS: &str = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512";

/// A running mock server
pub struct MockServer {
    pub url: String,
    _shutdown: oneshot::Sender<()>,
}

pub async fn spawn(router: Router) -> MockServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("Bind should succeed");
    let addr: SocketAddr = listener.local_addr().expect("Bound address");
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .ok();
    });

    MockServer {
        url: format!("http://{addr}"),
        _shutdown: shutdown_tx,
    }
}

/// URL of a port nothing is listening on
pub async fn closed_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("Bind should succeed");
    let addr = listener.local_addr().expect("Bound address");
    drop(listener);
    format!("http://{addr}")
}

pub fn descriptor_json(name: &str, address: &str) -> String {
    json!({
        "address": address,
        "contractName": name,
        "abi": [
            {
                "type": "function",
                "name": "verifyOwner",
                "stateMutability": "view",
                "inputs": [
                    { "name": "cid", "type": "bytes32", "internalType": "bytes32" },
                    { "name": "owner", "type": "address", "internalType": "address" }
                ],
                "outputs": [{ "name": "", "type": "bool", "internalType": "bool" }]
            },
            {
                "type": "function",
                "name": "mint",
                "stateMutability": "nonpayable",
                "inputs": [{ "name": "cid", "type": "bytes32", "internalType": "bytes32" }],
                "outputs": []
            }
        ]
    })
    .to_string()
}

/// Descriptor bundle with two contracts under `polygon/mumbai`
pub fn default_bundle() -> Vec<(String, String)> {
    vec![
        (
            "polygon/mumbai/BUIBlockNFT.json".into(),
            descriptor_json("BUIBlockNFT", NFT_ADDRESS),
        ),
        (
            "polygon/mumbai/BUIMarketplace.json".into(),
            descriptor_json("BUIMarketplace", MARKETPLACE_ADDRESS),
        ),
        (
            "polygon/mainnet/BUIBlockNFT.json".into(),
            descriptor_json("BUIBlockNFT", MARKETPLACE_ADDRESS),
        ),
    ]
}

#[derive(Default)]
struct KuboInner {
    /// Listing path (`root` or `root/dir`) to its links
    listings: HashMap<String, Vec<Value>>,
    /// File hash to contents, including added files
    files: HashMap<String, Bytes>,
}

/// In-memory Kubo RPC API
#[derive(Clone, Default)]
pub struct KuboMock {
    inner: Arc<Mutex<KuboInner>>,
    adds: Arc<AtomicUsize>,
    fail_add: bool,
}

impl KuboMock {
    pub fn with_bundle(root: &str, files: &[(String, String)]) -> Self {
        let mut inner = KuboInner::default();

        for (i, (path, data)) in files.iter().enumerate() {
            let hash = format!("QmBundleFile{i}");
            inner.files.insert(hash.clone(), Bytes::from(data.clone()));

            let segments: Vec<&str> = path.split('/').collect();
            for depth in 0..segments.len() {
                let parent = std::iter::once(root)
                    .chain(segments[..depth].iter().copied())
                    .collect::<Vec<_>>()
                    .join("/");
                let name = segments[depth];
                let (link_hash, link_type) = if depth == segments.len() - 1 {
                    (hash.clone(), 2)
                } else {
                    (format!("QmDir-{name}"), 1)
                };
                let link = json!({
                    "Name": name,
                    "Hash": link_hash,
                    "Size": 0,
                    "Type": link_type,
                    "Target": ""
                });

                let links = inner.listings.entry(parent).or_default();
                if !links.iter().any(|l| l["Name"] == name) {
                    links.push(link);
                }
            }
        }

        Self {
            inner: Arc::new(Mutex::new(inner)),
            ..Default::default()
        }
    }

    /// Add a directory at `path` under `root` that holds no files
    pub fn with_empty_dir(self, root: &str, path: &str) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            let segments: Vec<&str> = path.split('/').collect();
            for depth in 0..segments.len() {
                let parent = std::iter::once(root)
                    .chain(segments[..depth].iter().copied())
                    .collect::<Vec<_>>()
                    .join("/");
                let name = segments[depth];
                let links = inner.listings.entry(parent).or_default();
                if !links.iter().any(|l| l["Name"] == name) {
                    links.push(json!({
                        "Name": name,
                        "Hash": format!("QmDir-{name}"),
                        "Size": 0,
                        "Type": 1,
                        "Target": ""
                    }));
                }
            }
            inner.listings.entry(format!("{root}/{path}")).or_default();
        }
        self
    }

    pub fn failing_add(mut self) -> Self {
        self.fail_add = true;
        self
    }

    pub fn add_count(&self) -> usize {
        self.adds.load(Ordering::SeqCst)
    }

    pub fn file(&self, hash: &str) -> Option<Bytes> {
        self.inner.lock().unwrap().files.get(hash).cloned()
    }

    pub async fn serve(&self) -> MockServer {
        let router = Router::new()
            .route("/api/v0/ls", post(kubo_ls))
            .route("/api/v0/cat", post(kubo_cat))
            .route("/api/v0/add", post(kubo_add))
            .with_state(self.clone());
        spawn(router).await
    }
}

async fn kubo_ls(State(kubo): State<KuboMock>, Query(query): Query<HashMap<String, String>>) -> Response {
    let arg = query.get("arg").cloned().unwrap_or_default();
    let inner = kubo.inner.lock().unwrap();
    match inner.listings.get(&arg) {
        Some(links) => Json(json!({ "Objects": [{ "Hash": arg, "Links": links }] })).into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, format!("no link named {arg}")).into_response(),
    }
}

async fn kubo_cat(State(kubo): State<KuboMock>, Query(query): Query<HashMap<String, String>>) -> Response {
    let arg = query.get("arg").cloned().unwrap_or_default();
    match kubo.file(&arg) {
        Some(data) => data.into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "not found").into_response(),
    }
}

async fn kubo_add(State(kubo): State<KuboMock>, mut multipart: Multipart) -> Response {
    if kubo.fail_add {
        return (StatusCode::INTERNAL_SERVER_ERROR, "datastore unavailable").into_response();
    }

    let mut data = Bytes::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            data = field.bytes().await.unwrap_or_default();
        }
    }

    let n = kubo.adds.fetch_add(1, Ordering::SeqCst) + 1;
    let mut digest = [0u8; 32];
    digest[..8].copy_from_slice(&(n as u64).to_be_bytes());
    let cid = ContentId::from_digest(digest);

    kubo.inner.lock().unwrap().files.insert(cid.to_string(), data);
    Json(json!({ "Name": "content", "Hash": cid.as_str(), "Size": "0" })).into_response()
}

/// How a mock escrow node behaves
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeMode {
    Healthy,
    /// Handshake succeeds, submissions fail with 500
    RejectsKeys,
    /// Handshake returns 500
    BrokenHandshake,
    /// Handshake returns a body that is not key material
    GarbageHandshake,
}

/// Mock escrow node recording every key submission
#[derive(Clone)]
pub struct EscrowMock {
    mode: NodeMode,
    handle: String,
    handshakes: Arc<AtomicUsize>,
    submissions: Arc<Mutex<Vec<Value>>>,
}

impl EscrowMock {
    pub fn new(mode: NodeMode) -> Self {
        Self {
            mode,
            handle: "a1b2c3d4encryptedkey".into(),
            handshakes: Arc::new(AtomicUsize::new(0)),
            submissions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn handshake_count(&self) -> usize {
        self.handshakes.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> Vec<Value> {
        self.submissions.lock().unwrap().clone()
    }

    pub async fn serve(&self) -> MockServer {
        let router = Router::new()
            .route("/web/handshake", post(escrow_handshake))
            .route("/web/encryption/save", post(escrow_save))
            .with_state(self.clone());
        spawn(router).await
    }
}

async fn escrow_handshake(State(node): State<EscrowMock>, Json(body): Json<Value>) -> Response {
    node.handshakes.fetch_add(1, Ordering::SeqCst);
    if body["clientPublicKey"].as_str().is_none() {
        return (StatusCode::BAD_REQUEST, "missing clientPublicKey").into_response();
    }

    match node.mode {
        NodeMode::BrokenHandshake => (StatusCode::INTERNAL_SERVER_ERROR, "node down").into_response(),
        NodeMode::GarbageHandshake => Json(json!({ "hello": "world" })).into_response(),
        NodeMode::Healthy | NodeMode::RejectsKeys => Json(json!({
            "serverPubKey": "server-pk",
            "subnetPubKey": "subnet-pk",
            "networkPubKey": "network-pk",
            "networkPubKeySet": "network-pk-set"
        }))
        .into_response(),
    }
}

async fn escrow_save(State(node): State<EscrowMock>, Json(body): Json<Value>) -> Response {
    node.submissions.lock().unwrap().push(body);
    match node.mode {
        NodeMode::RejectsKeys => (StatusCode::INTERNAL_SERVER_ERROR, "condition check failed").into_response(),
        _ => Json(json!({ "encryptedSymmetricKey": node.handle })).into_response(),
    }
}

/// Mock JSON-RPC endpoint answering `eth_call` and the calls needed to
/// sign and submit a raw transaction
#[derive(Clone, Default)]
pub struct RpcMock {
    requests: Arc<Mutex<Vec<Value>>>,
    call_result: Option<String>,
}

pub const CHAIN_ID: u64 = 80001;
pub const NONCE: u64 = 5;
pub const GAS_LIMIT: u64 = 100_000;
/// 1 gwei
pub const GAS_PRICE: u128 = 1_000_000_000;
/// 2 gwei, above the gas price so it must be capped
pub const PRIORITY_FEE: u128 = 2_000_000_000;

impl RpcMock {
    /// `eth_call` answers with `result` for every call
    pub fn returning(result: &str) -> Self {
        Self {
            requests: Arc::default(),
            call_result: Some(result.to_string()),
        }
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    pub async fn serve(&self) -> MockServer {
        let router = Router::new().route("/", post(rpc_handler)).with_state(self.clone());
        spawn(router).await
    }
}

async fn rpc_handler(State(rpc): State<RpcMock>, Json(request): Json<Value>) -> Json<Value> {
    rpc.requests.lock().unwrap().push(request.clone());
    let id = request["id"].clone();
    let method = request["method"].as_str().unwrap_or_default();

    let result = match method {
        "eth_chainId" => Some(format!("{CHAIN_ID:#x}")),
        "eth_getTransactionCount" => Some(format!("{NONCE:#x}")),
        "eth_estimateGas" => Some(format!("{GAS_LIMIT:#x}")),
        "eth_gasPrice" => Some(format!("{GAS_PRICE:#x}")),
        "eth_maxPriorityFeePerGas" => Some(format!("{PRIORITY_FEE:#x}")),
        "eth_sendRawTransaction" => request["params"][0]
            .as_str()
            .and_then(|raw| hex::decode(raw).ok())
            .map(|raw| hex::encode_prefixed(keccak256(raw))),
        "eth_call" => rpc.call_result.clone(),
        _ => None,
    };

    Json(match result {
        Some(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        None => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": -32601, "message": format!("method {method} not found") }
        }),
    })
}
