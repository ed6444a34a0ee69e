//! Permit2 authorization of the collector for every swept token.
//!
//! Two steps, both against the Permit2 AllowanceTransfer contract:
//!
//! 1. ERC-20 → Permit2: tokens whose allowance to Permit2 is below the leg
//!    amount get a one-time `approve(permit2, type(uint256).max)`.
//! 2. Permit2 → collector: one signed `PermitBatch` covering all tokens,
//!    submitted with `permit(owner, batch, signature)`. Wallets without
//!    EIP-712 support instead get an on-chain `Permit2.approve` per token.
//!
//! Every allowance and nonce is read before the signature is requested, so a
//! failed read leaves no signature and no permit submission behind.

use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use chain_eth::erc20;
use chain_eth::permit2::{self, max_uint160, AllowanceState};
use chain_eth::{PermitBatch, PermitDetails};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::config::{seconds_after, PermitConfig};
use crate::error::CollectError;
use crate::provider::{send_and_confirm, ChainReader, TxRequest, Wallet};
use crate::swap_plan::SwapLeg;

/// How the collector was authorized on Permit2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermitMethod {
    /// One EIP-712 signed batch, submitted via `permit`.
    SignedBatch { signature: Vec<u8>, permit_tx: B256 },
    /// Per-token `Permit2.approve` transactions (empty if all were current).
    OnChainApprovals { approve_txs: Vec<B256> },
}

/// Result of [`PermitAuthorizer::authorize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermitOutcome {
    /// ERC-20 → Permit2 approval transactions sent in step 1.
    pub erc20_approvals: Vec<B256>,
    pub method: PermitMethod,
}

impl PermitOutcome {
    /// The batch signature, when one was produced.
    pub fn signature(&self) -> Option<&[u8]> {
        match &self.method {
            PermitMethod::SignedBatch { signature, .. } => Some(signature),
            PermitMethod::OnChainApprovals { .. } => None,
        }
    }

    /// Total transactions submitted on the wallet's behalf.
    pub fn transactions_sent(&self) -> usize {
        self.erc20_approvals.len()
            + match &self.method {
                PermitMethod::SignedBatch { .. } => 1,
                PermitMethod::OnChainApprovals { approve_txs } => approve_txs.len(),
            }
    }
}

/// Authorizes a spender contract to pull the tokens of a set of legs.
pub struct PermitAuthorizer {
    config: PermitConfig,
    reader: Arc<dyn ChainReader>,
    wallet: Arc<dyn Wallet>,
    clock: Arc<dyn Clock>,
}

impl PermitAuthorizer {
    pub fn new(
        config: PermitConfig,
        reader: Arc<dyn ChainReader>,
        wallet: Arc<dyn Wallet>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { config, reader, wallet, clock }
    }

    /// Makes `spender` able to pull every leg's amount from the wallet.
    ///
    /// # Returns
    ///
    /// - `AllowanceQueryFailed` if any ERC-20 or Permit2 allowance read fails.
    /// - `SignatureRejected` if the wallet declines; nothing is submitted.
    /// - `Reverted` if an approval or the permit transaction fails on chain.
    pub async fn authorize(
        &self,
        legs: &[SwapLeg],
        spender: Address,
    ) -> Result<PermitOutcome, CollectError> {
        let owner = self.wallet.address();
        let permit2 = self.config.permit2;
        let totals = token_totals(legs);

        let now = self.clock.now_unix();
        let expiration = seconds_after(now, self.config.expiration_secs, "PERMIT_EXPIRATION_SECS")?;
        let sig_deadline =
            seconds_after(now, self.config.sig_deadline_secs, "PERMIT_SIG_DEADLINE_SECS")?;

        // Step 1: ERC-20 → Permit2.
        let mut needs_approval = Vec::new();
        for &(token, amount) in &totals {
            let allowance = self.erc20_allowance(token, owner, permit2).await?;
            debug!(token = %token, allowance = %allowance, required = %amount, "permit2 erc20 allowance");
            if allowance < amount {
                needs_approval.push(token);
            }
        }

        let mut erc20_approvals = Vec::with_capacity(needs_approval.len());
        for token in needs_approval {
            info!(token = %token, "approving Permit2 for token");
            let data = erc20::encode_approve(permit2, U256::MAX);
            let receipt = send_and_confirm(self.wallet.as_ref(), TxRequest::call(token, data)).await?;
            erc20_approvals.push(receipt.tx_hash);
        }

        // Step 2: Permit2 → spender.
        let mut states = Vec::with_capacity(totals.len());
        for &(token, _) in &totals {
            states.push(self.permit2_allowance(owner, token, spender).await?);
        }

        let method = if self.wallet.supports_typed_data() {
            let batch = PermitBatch {
                details: totals
                    .iter()
                    .zip(&states)
                    .map(|(&(token, amount), state)| PermitDetails {
                        token,
                        amount,
                        expiration,
                        nonce: state.nonce,
                    })
                    .collect(),
                spender,
                sig_deadline: U256::from(sig_deadline),
            };
            batch.validate()?;

            let chain_id = self.reader.chain_id().await?;
            let digest = batch.signing_hash(chain_id, permit2);
            let signature = self.wallet.sign_typed_data(digest).await?;

            let data = permit2::encode_permit_batch(owner, &batch, &signature)?;
            let receipt = send_and_confirm(self.wallet.as_ref(), TxRequest::call(permit2, data)).await?;
            info!(tokens = batch.details.len(), tx_hash = %receipt.tx_hash, "permit batch submitted");
            PermitMethod::SignedBatch { signature, permit_tx: receipt.tx_hash }
        } else {
            let mut approve_txs = Vec::new();
            for (&(token, amount), state) in totals.iter().zip(&states) {
                if state.amount >= amount && state.expiration > now {
                    continue;
                }
                info!(token = %token, spender = %spender, "approving spender on Permit2");
                let data = permit2::encode_approve(token, spender, max_uint160(), expiration)?;
                let receipt =
                    send_and_confirm(self.wallet.as_ref(), TxRequest::call(permit2, data)).await?;
                approve_txs.push(receipt.tx_hash);
            }
            PermitMethod::OnChainApprovals { approve_txs }
        };

        Ok(PermitOutcome { erc20_approvals, method })
    }

    async fn erc20_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, CollectError> {
        let failed = |reason: String| CollectError::AllowanceQueryFailed { token, reason };
        let data = self
            .reader
            .call(token, erc20::encode_allowance(owner, spender))
            .await
            .map_err(|e| failed(e.to_string()))?;
        erc20::decode_uint256(&data).map_err(|e| failed(e.to_string()))
    }

    async fn permit2_allowance(
        &self,
        owner: Address,
        token: Address,
        spender: Address,
    ) -> Result<AllowanceState, CollectError> {
        let failed = |reason: String| CollectError::AllowanceQueryFailed { token, reason };
        let data = self
            .reader
            .call(self.config.permit2, permit2::encode_allowance(owner, token, spender))
            .await
            .map_err(|e| failed(e.to_string()))?;
        permit2::decode_allowance(&data).map_err(|e| failed(e.to_string()))
    }
}

/// Per-token totals in first-seen order. Permit2 tracks one nonce per token,
/// so a token swept by several legs must appear once in the batch.
fn token_totals(legs: &[SwapLeg]) -> Vec<(Address, U256)> {
    let mut totals: Vec<(Address, U256)> = Vec::with_capacity(legs.len());
    for leg in legs {
        match totals.iter_mut().find(|(token, _)| *token == leg.token) {
            Some((_, amount)) => *amount = amount.saturating_add(leg.amount_wei),
            None => totals.push((leg.token, leg.amount_wei)),
        }
    }
    totals
}
