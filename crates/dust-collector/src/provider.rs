//! Chain and wallet capabilities the collector depends on.
//!
//! Components take these as trait objects so the same flow runs against a
//! JSON-RPC node ([`crate::rpc`]) or an in-memory fake in tests.

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use chain_eth::{Authorization, SignedAuthorization};
use thiserror::Error;

/// Errors raised by chain or wallet backends.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("request rejected by signer: {0}")]
    Rejected(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("malformed response: {0}")]
    Decode(String),
}

/// A transaction for the wallet to fill in (nonce, gas, fees), sign and send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    pub to: Address,
    pub value: U256,
    pub data: Vec<u8>,
    /// Non-empty for an EIP-7702 set-code transaction.
    pub authorization_list: Vec<SignedAuthorization>,
}

impl TxRequest {
    pub fn call(to: Address, data: Vec<u8>) -> Self {
        Self { to, value: U256::ZERO, data, authorization_list: Vec::new() }
    }
}

/// Outcome of a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: B256,
    pub success: bool,
    pub block_number: Option<u64>,
}

/// Read-only chain access.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn chain_id(&self) -> Result<u64, ProviderError>;

    /// Deployed code at `address` (empty for a plain EOA).
    async fn get_code(&self, address: Address) -> Result<Vec<u8>, ProviderError>;

    /// `eth_call` against the latest block.
    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, ProviderError>;

    /// Number of transactions sent from `address` (its next nonce).
    async fn transaction_count(&self, address: Address) -> Result<u64, ProviderError>;
}

/// Signing and submission on behalf of one account.
#[async_trait]
pub trait Wallet: Send + Sync {
    fn address(&self) -> Address;

    /// Whether the wallet can produce EIP-712 signatures.
    fn supports_typed_data(&self) -> bool {
        true
    }

    /// Whether the wallet can sign EIP-7702 authorizations and so act as a
    /// smart account executing batched calls.
    fn supports_batched_calls(&self) -> bool {
        false
    }

    /// Signs a precomputed EIP-712 digest, returning 65 bytes `r || s || v`.
    async fn sign_typed_data(&self, digest: B256) -> Result<Vec<u8>, ProviderError>;

    async fn sign_authorization(
        &self,
        authorization: Authorization,
    ) -> Result<SignedAuthorization, ProviderError>;

    async fn send_transaction(&self, tx: TxRequest) -> Result<B256, ProviderError>;

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxReceipt, ProviderError>;
}

/// Sends a transaction and waits for it to be mined, treating a failed
/// receipt as a revert.
pub async fn send_and_confirm(
    wallet: &dyn Wallet,
    tx: TxRequest,
) -> Result<TxReceipt, crate::error::CollectError> {
    let tx_hash = wallet.send_transaction(tx).await?;
    tracing::debug!(tx_hash = %tx_hash, "transaction sent");
    let receipt = wallet.wait_for_receipt(tx_hash).await?;
    if !receipt.success {
        return Err(crate::error::CollectError::Reverted(tx_hash));
    }
    Ok(receipt)
}
