//! keygate CLI binary
//!
//! Run with:
//! ```bash
//! cargo run -p keygate-gateway --bin keygate -- \
//!     --contracts-cid Qm... --escrow-node http://localhost:7470 \
//!     protect --file ./block.js --private-key 0x...
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use keygate_core::constants::{DEFAULT_ACCESS_CONTRACT, DEFAULT_ACCESS_METHOD};
use keygate_core::ContentId;
use keygate_escrow::{EscrowError, EscrowNodeClient};
use keygate_gateway::{metrics, AccessGateway, GatewayConfig, LocalIdentity, ProtectRequest};
use keygate_registry::ContractRegistry;
use keygate_store::KuboClient;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "keygate")]
#[command(about = "Encrypt content under on-chain access conditions")]
struct Args {
    /// JSON config file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON-RPC provider URL
    #[arg(long)]
    provider_url: Option<String>,

    /// Kubo RPC API URL
    #[arg(long)]
    ipfs_api_url: Option<String>,

    /// Root CID of the contract descriptor bundle
    #[arg(long)]
    contracts_cid: Option<String>,

    /// Storage API bearer token
    #[arg(long, env = "KEYGATE_STORAGE_TOKEN")]
    storage_token: Option<String>,

    #[arg(long)]
    chain_name: Option<String>,

    #[arg(long)]
    network_name: Option<String>,

    /// Chain ID for authorization statements
    #[arg(long)]
    chain_id: Option<u64>,

    /// Escrow node base URL (repeatable)
    #[arg(long = "escrow-node")]
    escrow_nodes: Vec<String>,

    /// Minimum escrow nodes that must accept a key
    #[arg(long)]
    min_node_count: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Serve Prometheus metrics on this address
    #[arg(long)]
    metrics_addr: Option<SocketAddr>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the contract registry and print its manifest
    Manifest,

    /// Handshake with every escrow node and print the outcome
    Handshake,

    /// Encrypt a file and escrow its key
    Protect {
        #[arg(long)]
        file: PathBuf,

        #[arg(long, default_value = DEFAULT_ACCESS_CONTRACT)]
        contract: String,

        #[arg(long, default_value = DEFAULT_ACCESS_METHOD)]
        method: String,

        /// Caller's hex private key
        #[arg(long, env = "KEYGATE_PRIVATE_KEY")]
        private_key: String,
    },
}

impl Args {
    fn gateway_config(&self) -> anyhow::Result<GatewayConfig> {
        let mut config = match &self.config {
            Some(path) => GatewayConfig::load(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => GatewayConfig::default(),
        };

        if let Some(url) = &self.provider_url {
            config.provider_url = url.clone();
        }
        if let Some(url) = &self.ipfs_api_url {
            config.ipfs_api_url = url.clone();
        }
        if let Some(cid) = &self.contracts_cid {
            config.contracts_cid = cid.clone();
        }
        if let Some(token) = &self.storage_token {
            config.storage_token = token.clone();
        }
        if let Some(chain) = &self.chain_name {
            config.chain_name = chain.clone();
        }
        if let Some(network) = &self.network_name {
            config.network_name = network.clone();
        }
        if let Some(chain_id) = self.chain_id {
            config.chain_id = chain_id;
        }
        if !self.escrow_nodes.is_empty() {
            config.escrow_nodes = self.escrow_nodes.clone();
        }
        if let Some(n) = self.min_node_count {
            config.min_node_count = n;
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}

async fn load_registry(config: &GatewayConfig, store: &KuboClient) -> anyhow::Result<ContractRegistry> {
    let registry = ContractRegistry::connect(&config.provider_url).await?;
    let count = registry
        .load_all(
            &config.chain_name,
            &config.network_name,
            &ContentId::new(config.contracts_cid.as_str()),
            store,
        )
        .await?;
    metrics::set_registry_contracts(count);
    Ok(registry)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("keygate=info".parse()?))
        .init();

    let args = Args::parse();
    let config = args.gateway_config()?;

    if let Some(addr) = args.metrics_addr {
        metrics::init_prometheus_exporter(addr)?;
        info!(%addr, "Serving metrics");
    }

    let store = KuboClient::new(&config.ipfs_api_url)?.with_token(&config.storage_token);

    match args.command {
        Command::Manifest => {
            let registry = load_registry(&config, &store).await?;
            let manifest = registry.serialize_manifest()?;
            println!("{}", String::from_utf8_lossy(&manifest));
        }

        Command::Handshake => {
            let escrow = EscrowNodeClient::new(config.escrow())?;
            let outcome = escrow.connect().await;

            let results = escrow.handshakes();
            let reachable = results.values().filter(|r| r.reachable).count();
            metrics::set_handshake_nodes(reachable, results.len() - reachable);
            for result in results.values() {
                let status = if result.reachable { "OK" } else { "UNREACHABLE" };
                println!("[{status}] {}", result.url);
            }

            match outcome {
                Ok(_) | Err(EscrowError::NotEnoughNodes { .. }) => {
                    println!("{reachable}/{} nodes reachable", results.len());
                }
                Err(e) => return Err(e.into()),
            }
        }

        Command::Protect {
            file,
            contract,
            method,
            private_key,
        } => {
            config.validate()?;
            let content = std::fs::read(&file).with_context(|| format!("reading {}", file.display()))?;

            let registry = load_registry(&config, &store).await?;
            let escrow = EscrowNodeClient::new(config.escrow())?;
            escrow.connect().await?;

            let identity = LocalIdentity::from_hex(&private_key)?.with_default_chain_id(config.chain_id);
            let gateway = AccessGateway::new(Arc::new(registry), Arc::new(store), Arc::new(escrow));

            let request = ProtectRequest::new(content, config.chain_id.to_string()).with_predicate(contract, method);
            let envelope = gateway.protect(&request, &identity).await?;
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
    }

    Ok(())
}
