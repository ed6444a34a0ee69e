//! End-to-end collection: plan, quote, authorize, submit.
//!
//! Every failure is reported as a [`PhaseError`] so an operator can tell
//! whether anything reached the chain before the request aborted.

use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use tracing::{info, warn};

use crate::address_codec::{classify, to_canonical32, AddressFamily, CanonicalAddress};
use crate::chains::{get_chain, ChainFamily};
use crate::clock::Clock;
use crate::config::{seconds_after, AuthorizationMode, CollectorConfig};
use crate::delegation::DelegationManager;
use crate::error::{CollectError, InPhase, Phase, PhaseError};
use crate::params::{CollectEntry, CollectParams, ExecutorArgs, FeeArgs};
use crate::permit::PermitAuthorizer;
use crate::provider::{send_and_confirm, ChainReader, TxRequest, Wallet};
use crate::quote::{Quote, QuoteClient};
use crate::relay::destination_family;
use crate::swap_plan::{self, SwapLeg};

/// Placeholder executor payload for same-chain collections.
const EMPTY_EXECUTOR_PAYLOAD: [u8; 1] = [0x00];

/// Where to bridge the collected proceeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossChainTarget {
    /// Wormhole chain id of the chain the wallet is on.
    pub src_chain: u16,
    /// Wormhole chain id of the destination.
    pub dst_chain: u16,
    /// CCTP domain; looked up from `dst_chain` when omitted.
    pub dst_domain: Option<u32>,
    /// Recipient wallet on the destination, in its native format.
    pub recipient: String,
}

/// One collection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectRequest {
    pub legs: Vec<SwapLeg>,
    pub target_token: Address,
    /// Unwrap the router's WETH to native ETH after the swaps.
    pub finalize_to_native: bool,
    pub cross_chain: Option<CrossChainTarget>,
    /// Paid to the relayer on top of the executor's estimated cost.
    pub arbiter_fee: U256,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectOutcome {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
    pub entry: CollectEntry,
    /// Native value attached to the collect call.
    pub value: U256,
    pub quote: Option<Quote>,
    /// Approval, permit and delegation transactions sent before collecting.
    pub authorization_txs: usize,
}

/// Resolved bridge destination.
struct Destination {
    dst_chain: u16,
    dst_domain: u32,
    /// Receives the relay's gas drop-off and is the quoted recipient.
    wallet: CanonicalAddress,
    /// Receives the bridged tokens.
    token_recipient: CanonicalAddress,
    src_chain: u16,
}

pub struct CollectOrchestrator {
    config: CollectorConfig,
    reader: Arc<dyn ChainReader>,
    wallet: Arc<dyn Wallet>,
    clock: Arc<dyn Clock>,
    quotes: QuoteClient,
}

impl CollectOrchestrator {
    pub fn new(
        config: CollectorConfig,
        reader: Arc<dyn ChainReader>,
        wallet: Arc<dyn Wallet>,
        clock: Arc<dyn Clock>,
        quotes: QuoteClient,
    ) -> Self {
        Self { config, reader, wallet, clock, quotes }
    }

    /// Whether this run authorizes through EIP-7702 delegation.
    fn use_delegation(&self) -> Result<bool, CollectError> {
        match self.config.collect.authorization {
            AuthorizationMode::Auto => Ok(self.wallet.supports_batched_calls()),
            AuthorizationMode::Permit2 => Ok(false),
            AuthorizationMode::Delegation if !self.wallet.supports_batched_calls() => Err(
                CollectError::Config("delegation requested but the wallet cannot sign authorizations".into()),
            ),
            AuthorizationMode::Delegation => Ok(true),
        }
    }

    fn resolve_destination(&self, target: &CrossChainTarget) -> Result<Destination, CollectError> {
        let family = destination_family(&self.config.relay, target.dst_chain)?;
        let dst_domain = match (target.dst_domain, get_chain(target.dst_chain)) {
            (Some(domain), _) => domain,
            (None, Some(chain)) => chain.cctp_domain,
            (None, None) => return Err(CollectError::UnsupportedDestinationChain(target.dst_chain)),
        };

        let wallet = to_canonical32(&target.recipient)?;
        let token_recipient = match family {
            ChainFamily::Evm => wallet,
            ChainFamily::Solana => {
                if classify(&target.recipient) != AddressFamily::Solana {
                    return Err(CollectError::InvalidAddress(format!(
                        "{} is not a Solana address",
                        target.recipient
                    )));
                }
                let ata = chain_sol::associated_token_address(
                    &target.recipient,
                    &self.config.bridge.solana_usdc_mint,
                )?;
                info!(wallet = %target.recipient, token_account = %ata, "bridging to associated token account");
                to_canonical32(&ata)?
            }
        };

        Ok(Destination {
            dst_chain: target.dst_chain,
            dst_domain,
            wallet,
            token_recipient,
            src_chain: target.src_chain,
        })
    }

    /// Runs one collection request to completion.
    pub async fn run(&self, request: CollectRequest) -> Result<CollectOutcome, PhaseError> {
        let eoa = self.wallet.address();
        let collector = self.config.collect.collector;

        // Planning: amounts were fixed when the legs were built.
        if request.legs.is_empty() {
            return Err(CollectError::InvalidSwapLeg("no swap legs to collect".into()))
                .in_phase(Phase::Planning);
        }
        let delegated = self.use_delegation().in_phase(Phase::Planning)?;
        let destination = request
            .cross_chain
            .as_ref()
            .map(|target| self.resolve_destination(target))
            .transpose()
            .in_phase(Phase::Planning)?;

        // Quoting.
        let quote = match &destination {
            Some(dst) => {
                let quote = self
                    .quotes
                    .request_quote(dst.src_chain, dst.dst_chain, &dst.wallet)
                    .await
                    .in_phase(Phase::Quoting)?;
                if quote.signed_quote.is_none() {
                    return Err(CollectError::MissingSignedQuote).in_phase(Phase::Quoting);
                }
                Some(quote)
            }
            None => None,
        };

        // Router program.
        let (entry, router_recipient) =
            if delegated { (CollectEntry::Delegated, eoa) } else { (CollectEntry::Permit2, collector) };
        let plan = swap_plan::build(&request.legs, router_recipient, request.finalize_to_native)
            .in_phase(Phase::Planning)?;

        // Authorization.
        let authorization_txs = if delegated {
            let manager = DelegationManager::new(
                self.config.delegation.clone(),
                Arc::clone(&self.reader),
                Arc::clone(&self.wallet),
                Arc::clone(&self.clock),
            );
            manager.ensure_delegated(collector).await.in_phase(Phase::Delegation)?.transactions_sent
        } else {
            let authorizer = PermitAuthorizer::new(
                self.config.permit.clone(),
                Arc::clone(&self.reader),
                Arc::clone(&self.wallet),
                Arc::clone(&self.clock),
            );
            authorizer
                .authorize(&request.legs, collector)
                .await
                .in_phase(Phase::Authorization)?
                .transactions_sent()
        };

        // Submission.
        let bridge = &self.config.bridge;
        let (executor_args, estimated_cost) = match &quote {
            Some(quote) => (
                ExecutorArgs {
                    refund_address: eoa,
                    signed_quote: quote.signed_quote.clone().unwrap_or_default(),
                    instructions: quote.relay_instructions.clone(),
                },
                quote.estimated_cost,
            ),
            None => (
                ExecutorArgs {
                    refund_address: eoa,
                    signed_quote: EMPTY_EXECUTOR_PAYLOAD.to_vec(),
                    instructions: EMPTY_EXECUTOR_PAYLOAD.to_vec(),
                },
                U256::ZERO,
            ),
        };

        let deadline = seconds_after(
            self.clock.now_unix(),
            self.config.collect.deadline_secs,
            "COLLECT_DEADLINE_SECS",
        )
        .in_phase(Phase::Submission)?;
        let params = CollectParams {
            commands: plan.commands,
            inputs: plan.inputs,
            deadline,
            target_token: request.target_token,
            dst_chain: destination.as_ref().map_or(0, |d| d.dst_chain),
            dst_domain: destination.as_ref().map_or(0, |d| d.dst_domain),
            recipient: destination.as_ref().map_or(B256::ZERO, |d| d.token_recipient.to_b256()),
            arbiter_fee: request.arbiter_fee,
            destination_caller: bridge.destination_caller,
            max_fee: U256::from(bridge.max_fee),
            min_finality_threshold: bridge.min_finality_threshold,
            executor_args,
            fee_args: FeeArgs {
                dbps: bridge.fee_dbps,
                payee: fee_payee(bridge.fee_payee, entry, eoa),
            },
            estimated_cost,
        };

        let value = params.value().in_phase(Phase::Submission)?;
        let data = params
            .encode_call(entry, &plan.pull_tokens, &plan.pull_amounts)
            .in_phase(Phase::Submission)?;
        let to = if delegated { eoa } else { collector };

        info!(
            to = %to,
            entry = ?entry,
            value = %value,
            dst_chain = params.dst_chain,
            legs = request.legs.len(),
            "submitting collection"
        );
        let tx = TxRequest { to, value, data, authorization_list: Vec::new() };
        let receipt = match send_and_confirm(self.wallet.as_ref(), tx).await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(error = %e, "collection failed");
                return Err(e).in_phase(Phase::Submission);
            }
        };
        info!(tx_hash = %receipt.tx_hash, block = ?receipt.block_number, "collection succeeded");

        Ok(CollectOutcome {
            tx_hash: receipt.tx_hash,
            block_number: receipt.block_number,
            entry,
            value,
            quote,
            authorization_txs,
        })
    }
}

/// Executor fee payee for the collector call.
///
/// A configured payee is always used. When none is set, Permit2 calls pay the
/// signing wallet, which is what the Permit2 deployment flow has always sent,
/// while delegated calls keep the zero address.
fn fee_payee(configured: Address, entry: CollectEntry, eoa: Address) -> Address {
    match entry {
        CollectEntry::Permit2 if configured == Address::ZERO => eoa,
        _ => configured,
    }
}
