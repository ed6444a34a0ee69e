//! JSON-RPC implementations of [`ChainReader`] and [`Wallet`].
//!
//! [`JsonRpcClient`] talks to an Ethereum node over HTTP. [`RpcWallet`] signs
//! locally with a [`LocalSigner`] and submits raw EIP-1559 / EIP-7702
//! transactions through the same node.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use chain_eth::{Authorization, EthTransaction, LocalSigner, SignedAuthorization};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::clock::Clock;
use crate::provider::{ChainReader, ProviderError, TxReceipt, TxRequest, Wallet};

// ============================================================================
// JSON-RPC WIRE TYPES
// ============================================================================

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Vec<Value>,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: B256,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    block_number: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcBlock {
    #[serde(default)]
    base_fee_per_gas: Option<String>,
}

// ============================================================================
// CLIENT
// ============================================================================

/// Minimal Ethereum JSON-RPC client.
#[derive(Debug)]
pub struct JsonRpcClient {
    client: Client,
    url: String,
    next_id: AtomicU64,
    chain_id: OnceLock<u64>,
}

impl JsonRpcClient {
    /// Creates a client for `url` with a per-request timeout.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.to_string(),
            next_id: AtomicU64::new(1),
            chain_id: OnceLock::new(),
        })
    }

    /// Sends one request and returns its raw `result`, `Null` included.
    pub async fn request_value(&self, method: &str, params: Vec<Value>) -> Result<Value, ProviderError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };

        let response = self.client.post(&self.url).json(&request).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(format!("{method} to {}", self.url))
            } else {
                ProviderError::Transport(format!("{method} to {}: {e}", self.url))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Transport(format!("{method}: HTTP {status}: {body}")));
        }

        let response: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(format!("{method}: {e}")))?;

        if let Some(error) = response.error {
            return Err(ProviderError::Rpc { code: error.code, message: error.message });
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    /// Sends one request and deserializes its `result`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, ProviderError> {
        let value = self.request_value(method, params).await?;
        serde_json::from_value(value).map_err(|e| ProviderError::Decode(format!("{method}: {e}")))
    }

    async fn quantity(&self, method: &str, params: Vec<Value>) -> Result<U256, ProviderError> {
        let hex: String = self.request(method, params).await?;
        parse_quantity(&hex)
    }
}

#[async_trait]
impl ChainReader for JsonRpcClient {
    async fn chain_id(&self) -> Result<u64, ProviderError> {
        if let Some(id) = self.chain_id.get() {
            return Ok(*id);
        }
        let id = to_u64(self.quantity("eth_chainId", Vec::new()).await?)?;
        Ok(*self.chain_id.get_or_init(|| id))
    }

    async fn get_code(&self, address: Address) -> Result<Vec<u8>, ProviderError> {
        let hex: String = self.request("eth_getCode", vec![json!(address), json!("latest")]).await?;
        parse_bytes(&hex)
    }

    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, ProviderError> {
        let call = json!({ "to": to, "data": format!("0x{}", hex::encode(&data)) });
        let hex: String = self.request("eth_call", vec![call, json!("latest")]).await?;
        parse_bytes(&hex)
    }

    async fn transaction_count(&self, address: Address) -> Result<u64, ProviderError> {
        to_u64(
            self.quantity("eth_getTransactionCount", vec![json!(address), json!("pending")])
                .await?,
        )
    }
}

// ============================================================================
// WALLET
// ============================================================================

/// Gas estimates are padded by this percentage.
const GAS_BUFFER_PERCENT: u64 = 20;

/// A locally keyed wallet submitting through a JSON-RPC node.
pub struct RpcWallet {
    rpc: Arc<JsonRpcClient>,
    signer: LocalSigner,
    clock: Arc<dyn Clock>,
    receipt_poll_interval: Duration,
    receipt_max_polls: u32,
}

impl RpcWallet {
    pub fn new(rpc: Arc<JsonRpcClient>, signer: LocalSigner, clock: Arc<dyn Clock>) -> Self {
        Self {
            rpc,
            signer,
            clock,
            receipt_poll_interval: Duration::from_secs(1),
            receipt_max_polls: 180,
        }
    }

    /// Overrides how receipts are polled.
    pub fn with_receipt_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.receipt_poll_interval = interval;
        self.receipt_max_polls = max_polls;
        self
    }

    async fn fees(&self) -> Result<(u128, u128), ProviderError> {
        let block: RpcBlock = self
            .rpc
            .request("eth_getBlockByNumber", vec![json!("latest"), json!(false)])
            .await?;
        let base_fee = match block.base_fee_per_gas {
            Some(hex) => to_u128(parse_quantity(&hex)?)?,
            None => to_u128(self.rpc.quantity("eth_gasPrice", Vec::new()).await?)?,
        };
        let priority = to_u128(self.rpc.quantity("eth_maxPriorityFeePerGas", Vec::new()).await?)?;
        Ok((priority, base_fee.saturating_mul(2).saturating_add(priority)))
    }
}

#[async_trait]
impl Wallet for RpcWallet {
    fn address(&self) -> Address {
        self.signer.address()
    }

    fn supports_batched_calls(&self) -> bool {
        true
    }

    async fn sign_typed_data(&self, digest: B256) -> Result<Vec<u8>, ProviderError> {
        let signature =
            self.signer.sign_hash(&digest).map_err(|e| ProviderError::Rejected(e.to_string()))?;
        Ok(signature.to_bytes().to_vec())
    }

    async fn sign_authorization(
        &self,
        authorization: Authorization,
    ) -> Result<SignedAuthorization, ProviderError> {
        self.signer
            .sign_authorization(&authorization)
            .map_err(|e| ProviderError::Rejected(e.to_string()))
    }

    async fn send_transaction(&self, tx: TxRequest) -> Result<B256, ProviderError> {
        let from = self.signer.address();
        let chain_id = self.rpc.chain_id().await?;
        let nonce = self.rpc.transaction_count(from).await?;

        let mut call = json!({
            "from": from,
            "to": tx.to,
            "value": format!("{:#x}", tx.value),
            "data": format!("0x{}", hex::encode(&tx.data)),
        });
        if !tx.authorization_list.is_empty() {
            call["authorizationList"] =
                Value::Array(tx.authorization_list.iter().map(authorization_json).collect());
        }
        let estimate = to_u64(self.rpc.quantity("eth_estimateGas", vec![call]).await?)?;
        let gas_limit = estimate.saturating_add(estimate.saturating_mul(GAS_BUFFER_PERCENT) / 100);
        let (max_priority_fee_per_gas, max_fee_per_gas) = self.fees().await?;

        let unsigned = EthTransaction {
            chain_id,
            nonce,
            max_priority_fee_per_gas,
            max_fee_per_gas,
            gas_limit,
            to: tx.to,
            value: tx.value,
            data: tx.data,
            authorization_list: tx.authorization_list,
        };
        let signed = unsigned.sign(&self.signer).map_err(|e| ProviderError::Rejected(e.to_string()))?;

        debug!(nonce, gas_limit, tx_type = unsigned.tx_type(), tx_hash = %signed.tx_hash, "sending raw transaction");
        let hash: B256 = self
            .rpc
            .request(
                "eth_sendRawTransaction",
                vec![json!(format!("0x{}", hex::encode(&signed.raw_tx)))],
            )
            .await?;
        Ok(hash)
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxReceipt, ProviderError> {
        for poll in 1..=self.receipt_max_polls {
            let value = self.rpc.request_value("eth_getTransactionReceipt", vec![json!(tx_hash)]).await?;
            if !value.is_null() {
                let receipt: RpcReceipt = serde_json::from_value(value)
                    .map_err(|e| ProviderError::Decode(format!("receipt: {e}")))?;
                let success = match receipt.status.as_deref() {
                    Some(status) => parse_quantity(status)? == U256::from(1),
                    None => true,
                };
                let block_number = receipt
                    .block_number
                    .as_deref()
                    .map(parse_quantity)
                    .transpose()?
                    .map(to_u64)
                    .transpose()?;
                return Ok(TxReceipt { tx_hash: receipt.transaction_hash, success, block_number });
            }
            debug!(poll, tx_hash = %tx_hash, "receipt not available yet");
            self.clock.sleep(self.receipt_poll_interval).await;
        }
        Err(ProviderError::Timeout(format!(
            "no receipt for {tx_hash} after {} polls",
            self.receipt_max_polls
        )))
    }
}

fn authorization_json(auth: &SignedAuthorization) -> Value {
    json!({
        "chainId": format!("{:#x}", auth.chain_id),
        "address": auth.address,
        "nonce": format!("{:#x}", auth.nonce),
        "yParity": format!("{:#x}", auth.y_parity),
        "r": format!("{:#x}", auth.r),
        "s": format!("{:#x}", auth.s),
    })
}

// ============================================================================
// HEX HELPERS
// ============================================================================

fn parse_quantity(hex: &str) -> Result<U256, ProviderError> {
    let digits = hex.strip_prefix("0x").unwrap_or(hex);
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| ProviderError::Decode(format!("invalid quantity {hex:?}: {e}")))
}

fn parse_bytes(hex: &str) -> Result<Vec<u8>, ProviderError> {
    let digits = hex.strip_prefix("0x").unwrap_or(hex);
    hex::decode(digits).map_err(|e| ProviderError::Decode(format!("invalid hex data: {e}")))
}

fn to_u64(value: U256) -> Result<u64, ProviderError> {
    u64::try_from(value).map_err(|_| ProviderError::Decode(format!("{value} exceeds u64")))
}

fn to_u128(value: U256) -> Result<u128, ProviderError> {
    u128::try_from(value).map_err(|_| ProviderError::Decode(format!("{value} exceeds u128")))
}
