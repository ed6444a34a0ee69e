//! EIP-7702 delegation of the signing EOA to the collector contract.
//!
//! ```text
//! Undelegated ──(pointer already == target)──────────────► Delegated
//!      │
//!      └─(target has code, authorization sent)─► DelegationPending
//!                                                    │
//!                         settle, then poll ≤ N times┤
//!                                                    ├─(match)──► Delegated
//!                                                    └─(no match)► DelegationFailed
//! ```
//!
//! The installed pointer only becomes visible once the transaction is mined
//! and read replicas catch up, so verification polls instead of reading once.

use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use chain_eth::{delegation_target, Authorization};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::DelegationConfig;
use crate::error::CollectError;
use crate::provider::{send_and_confirm, ChainReader, TxRequest, Wallet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegationState {
    Undelegated,
    /// The authorization transaction was mined; the pointer is not yet seen.
    DelegationPending { tx_hash: B256 },
    Delegated,
    DelegationFailed { attempts: u32 },
}

/// Result of [`DelegationManager::ensure_delegated`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelegationOutcome {
    pub state: DelegationState,
    /// 0 when the EOA was already delegated to the target.
    pub transactions_sent: usize,
    pub tx_hash: Option<B256>,
}

pub struct DelegationManager {
    config: DelegationConfig,
    reader: Arc<dyn ChainReader>,
    wallet: Arc<dyn Wallet>,
    clock: Arc<dyn Clock>,
}

impl DelegationManager {
    pub fn new(
        config: DelegationConfig,
        reader: Arc<dyn ChainReader>,
        wallet: Arc<dyn Wallet>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { config, reader, wallet, clock }
    }

    /// Drives the wallet's EOA to `Delegated` on `target`.
    ///
    /// # Returns
    ///
    /// - `InvalidDelegationTarget` if `target` has no code; nothing is sent.
    /// - `DelegationVerificationTimeout` if the pointer is not observed within
    ///   `max_attempts` polls. The transaction may still land later.
    pub async fn ensure_delegated(&self, target: Address) -> Result<DelegationOutcome, CollectError> {
        let eoa = self.wallet.address();
        let mut state = DelegationState::Undelegated;
        let mut tx_hash = None;

        loop {
            state = match state {
                DelegationState::Undelegated => {
                    let code = self.reader.get_code(eoa).await?;
                    match delegation_target(&code) {
                        Some(current) if current == target => DelegationState::Delegated,
                        current => {
                            if let Some(current) = current {
                                info!(eoa = %eoa, current = %current, target = %target, "replacing existing delegation");
                            }
                            let hash = self.submit_authorization(eoa, target).await?;
                            tx_hash = Some(hash);
                            DelegationState::DelegationPending { tx_hash: hash }
                        }
                    }
                }
                DelegationState::DelegationPending { .. } => self.verify(eoa, target).await,
                DelegationState::Delegated => {
                    return Ok(DelegationOutcome {
                        state,
                        transactions_sent: usize::from(tx_hash.is_some()),
                        tx_hash,
                    });
                }
                DelegationState::DelegationFailed { attempts } => {
                    return Err(CollectError::DelegationVerificationTimeout { target, attempts });
                }
            };
            info!(eoa = %eoa, state = ?state, "delegation state");
        }
    }

    async fn submit_authorization(&self, eoa: Address, target: Address) -> Result<B256, CollectError> {
        let target_code = self.reader.get_code(target).await?;
        if target_code.is_empty() {
            return Err(CollectError::InvalidDelegationTarget(target));
        }

        let chain_id = self.reader.chain_id().await?;
        // The EOA also sends the carrying transaction, which consumes the
        // current nonce before the authorization is processed.
        let nonce = self.reader.transaction_count(eoa).await? + 1;
        let authorization = Authorization { chain_id: U256::from(chain_id), address: target, nonce };
        let signed = self.wallet.sign_authorization(authorization).await?;

        let tx = TxRequest {
            to: eoa,
            value: U256::ZERO,
            data: Vec::new(),
            authorization_list: vec![signed],
        };
        let receipt = send_and_confirm(self.wallet.as_ref(), tx).await?;
        info!(eoa = %eoa, target = %target, tx_hash = %receipt.tx_hash, "delegation transaction mined");
        Ok(receipt.tx_hash)
    }

    async fn verify(&self, eoa: Address, target: Address) -> DelegationState {
        let attempts = self.config.max_attempts;
        self.clock.sleep(self.config.settle_delay()).await;

        for attempt in 1..=attempts {
            match self.reader.get_code(eoa).await {
                Ok(code) if delegation_target(&code) == Some(target) => {
                    debug!(attempt, "delegation observed");
                    return DelegationState::Delegated;
                }
                Ok(_) => debug!(attempt, attempts, "delegation not visible yet"),
                Err(e) => warn!(attempt, error = %e, "code read failed while polling delegation"),
            }
            if attempt < attempts {
                self.clock.sleep(self.config.poll_interval()).await;
            }
        }

        DelegationState::DelegationFailed { attempts }
    }
}
