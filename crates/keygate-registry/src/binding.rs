//! Typed call/transaction bindings over a contract descriptor

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use alloy_consensus::{SignableTransaction, TxEip1559};
use alloy_dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy_eips::eip2718::Encodable2718;
use alloy_json_abi::{Function, JsonAbi};
use alloy_primitives::{Address, Bytes, TxKind, B256, U128, U256, U64};
use alloy_rpc_client::RpcClient;
use alloy_rpc_types::{BlockNumberOrTag, TransactionInput, TransactionRequest};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use keygate_core::ContractDescriptor;

use crate::error::{RegistryError, Result};

/// Decoded call outputs keyed by output name (position when unnamed)
pub type CallOutput = BTreeMap<String, DynSolValue>;

/// A descriptor bound to the shared RPC client, optionally with a signer
#[derive(Clone)]
pub struct ContractBinding {
    descriptor: Arc<ContractDescriptor>,
    rpc: RpcClient,
    signer: Option<Arc<PrivateKeySigner>>,
}

impl ContractBinding {
    pub(crate) fn new(descriptor: Arc<ContractDescriptor>, rpc: RpcClient) -> Self {
        Self {
            descriptor,
            rpc,
            signer: None,
        }
    }

    /// Independent binding that signs and sends as `signer`
    pub fn with_signer(&self, signer: PrivateKeySigner) -> Self {
        Self {
            descriptor: Arc::clone(&self.descriptor),
            rpc: self.rpc.clone(),
            signer: Some(Arc::new(signer)),
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn address(&self) -> Address {
        self.descriptor.address
    }

    pub fn abi(&self) -> &JsonAbi {
        &self.descriptor.abi
    }

    pub fn descriptor(&self) -> &ContractDescriptor {
        &self.descriptor
    }

    /// Address of the bound signer
    pub fn sender(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }

    /// Resolve `method` against the interface definition
    pub fn method(&self, method: &str) -> Result<&Function> {
        self.descriptor
            .method(method)
            .ok_or_else(|| RegistryError::MethodNotFound {
                contract: self.descriptor.name.clone(),
                method: method.to_string(),
            })
    }

    fn encode_input(&self, function: &Function, args: &[DynSolValue]) -> Result<Bytes> {
        function
            .abi_encode_input(args)
            .map(Bytes::from)
            .map_err(|e| RegistryError::Abi(format!("{}.{}: {e}", self.name(), function.name)))
    }

    fn request(&self, input: Bytes) -> TransactionRequest {
        let request = TransactionRequest::default()
            .to(self.descriptor.address)
            .input(TransactionInput::both(input));

        match self.sender() {
            Some(from) => request.from(from),
            None => request,
        }
    }

    /// `eth_call` at the latest block
    pub async fn call(&self, method: &str, args: &[DynSolValue]) -> Result<CallOutput> {
        let function = self.method(method)?;
        let request = self.request(self.encode_input(function, args)?);

        let data: Bytes = self
            .rpc
            .request("eth_call", (request, BlockNumberOrTag::Latest))
            .await
            .map_err(rpc_error("eth_call"))?;

        let values = function
            .abi_decode_output(&data)
            .map_err(|e| RegistryError::Abi(format!("{}.{} output: {e}", self.name(), method)))?;

        Ok(function
            .outputs
            .iter()
            .zip(values)
            .enumerate()
            .map(|(i, (param, value))| {
                let key = if param.name.is_empty() {
                    i.to_string()
                } else {
                    param.name.clone()
                };
                (key, value)
            })
            .collect())
    }

    /// Sign a call to `method` with the bound signer and submit it with
    /// `eth_sendRawTransaction`. Chain id, nonce and fees come from the
    /// shared RPC client. Returns the transaction hash.
    pub async fn transact(&self, method: &str, args: &[DynSolValue]) -> Result<B256> {
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| RegistryError::MissingSender(self.name().to_string()))?;
        let function = self.method(method)?;
        let input = self.encode_input(function, args)?;
        let from = signer.address();

        let chain_id: U64 = self
            .rpc
            .request_noparams("eth_chainId")
            .await
            .map_err(rpc_error("eth_chainId"))?;
        let nonce: U64 = self
            .rpc
            .request("eth_getTransactionCount", (from, BlockNumberOrTag::Pending))
            .await
            .map_err(rpc_error("eth_getTransactionCount"))?;
        let gas_limit: U64 = self
            .rpc
            .request("eth_estimateGas", (self.request(input.clone()),))
            .await
            .map_err(rpc_error("eth_estimateGas"))?;
        let max_fee: U128 = self
            .rpc
            .request_noparams("eth_gasPrice")
            .await
            .map_err(rpc_error("eth_gasPrice"))?;
        let priority_fee: U128 = self
            .rpc
            .request_noparams("eth_maxPriorityFeePerGas")
            .await
            .map_err(rpc_error("eth_maxPriorityFeePerGas"))?;

        let tx = TxEip1559 {
            chain_id: chain_id.to(),
            nonce: nonce.to(),
            gas_limit: gas_limit.to(),
            max_fee_per_gas: max_fee.to(),
            max_priority_fee_per_gas: priority_fee.to::<u128>().min(max_fee.to()),
            to: TxKind::Call(self.descriptor.address),
            value: U256::ZERO,
            access_list: Default::default(),
            input,
        };

        let signature = signer
            .sign_hash_sync(&tx.signature_hash())
            .map_err(|e| RegistryError::Signing(e.to_string()))?;
        let signed = tx.into_signed(signature);
        let mut raw = Vec::new();
        signed.encode_2718(&mut raw);

        let hash: B256 = self
            .rpc
            .request("eth_sendRawTransaction", (Bytes::from(raw),))
            .await
            .map_err(rpc_error("eth_sendRawTransaction"))?;
        tracing::info!(contract = %self.name(), method, from = %from, tx = %hash, "Submitted transaction");
        Ok(hash)
    }
}

fn rpc_error<E: fmt::Display>(method: &'static str) -> impl FnOnce(E) -> RegistryError {
    move |e| RegistryError::Rpc(format!("{method}: {e}"))
}

impl fmt::Debug for ContractBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractBinding")
            .field("name", &self.descriptor.name)
            .field("address", &self.descriptor.address)
            .field("sender", &self.sender())
            .finish()
    }
}
