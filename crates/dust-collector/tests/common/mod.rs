//! In-memory chain, wallet and clock shared by the integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_primitives::{keccak256, Address, B256, U256};
use async_trait::async_trait;
use chain_eth::eip7702::designator_code;
use chain_eth::permit2::{self, AllowanceState};
use chain_eth::{erc20, Authorization, SignedAuthorization};
use dust_collector::clock::Clock;
use dust_collector::provider::{ChainReader, ProviderError, TxReceipt, TxRequest, Wallet};
use dust_collector::swap_plan::{RouterVersion, SwapLeg};

pub const CHAIN_ID: u64 = 8453;
pub const NOW: u64 = 1_700_000_000;

pub fn addr(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

pub fn eoa() -> Address {
    addr(0xe0)
}

pub fn collector() -> Address {
    addr(0xc0)
}

/// A V3 leg routing `token` straight to `target` through the 0.3% pool.
pub fn v3_leg(token: Address, decimals: u8, amount: &str, target: Address) -> SwapLeg {
    SwapLeg::new(token, decimals, amount, vec![token, target], vec![3000], RouterVersion::V3)
        .unwrap()
}

// ─── clock ─────────────────────────────────────────────────────────

/// A clock that only moves when slept on.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn at(now: u64) -> Arc<Self> {
        Arc::new(Self { now: AtomicU64::new(now), sleeps: Mutex::new(Vec::new()) })
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now_unix(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    async fn sleep(&self, duration: Duration) {
        self.now.fetch_add(duration.as_secs(), Ordering::SeqCst);
        self.sleeps.lock().unwrap().push(duration);
    }
}

// ─── chain + wallet ────────────────────────────────────────────────

#[derive(Debug, Default)]
struct State {
    code: HashMap<Address, Vec<u8>>,
    /// ERC-20 allowance of the wallet to Permit2, per token.
    erc20_allowances: HashMap<Address, U256>,
    /// Permit2 allowance of the wallet to any spender, per token.
    permit2_allowances: HashMap<Address, AllowanceState>,
    failing_tokens: HashSet<Address>,
    reject_signatures: bool,
    revert_sends: bool,
    typed_data: bool,
    batched_calls: bool,
    nonce: u64,
    /// EOA code reads after a delegation transaction before it shows up.
    delegation_visible_after: Option<usize>,
    pending_delegation: Option<Address>,
    reads_since_delegation: usize,

    sent: Vec<TxRequest>,
    signed_digests: Vec<B256>,
    authorizations: Vec<Authorization>,
    code_reads: Vec<Address>,
}

/// Fake node plus wallet for one EOA.
#[derive(Debug)]
pub struct MockChain {
    address: Address,
    permit2: Address,
    state: Mutex<State>,
}

impl MockChain {
    pub fn new(address: Address) -> Arc<Self> {
        Arc::new(Self {
            address,
            permit2: chain_eth::PERMIT2_ADDRESS,
            state: Mutex::new(State { typed_data: true, nonce: 7, ..State::default() }),
        })
    }

    fn with<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    // configuration

    pub fn set_code(&self, address: Address, code: Vec<u8>) {
        self.with(|s| s.code.insert(address, code));
    }

    pub fn set_erc20_allowance(&self, token: Address, amount: U256) {
        self.with(|s| s.erc20_allowances.insert(token, amount));
    }

    pub fn set_permit2_allowance(&self, token: Address, state: AllowanceState) {
        self.with(|s| s.permit2_allowances.insert(token, state));
    }

    pub fn fail_allowance_reads(&self, token: Address) {
        self.with(|s| s.failing_tokens.insert(token));
    }

    pub fn reject_signatures(&self) {
        self.with(|s| s.reject_signatures = true);
    }

    pub fn revert_sends(&self) {
        self.with(|s| s.revert_sends = true);
    }

    pub fn without_typed_data(&self) {
        self.with(|s| s.typed_data = false);
    }

    pub fn with_batched_calls(&self) {
        self.with(|s| s.batched_calls = true);
    }

    /// Make an installed delegation visible on the `n`-th EOA code read
    /// after the delegation transaction. `None` never shows it.
    pub fn delegation_visible_after(&self, reads: Option<usize>) {
        self.with(|s| s.delegation_visible_after = reads);
    }

    // inspection

    pub fn sent(&self) -> Vec<TxRequest> {
        self.with(|s| s.sent.clone())
    }

    pub fn signed_digests(&self) -> Vec<B256> {
        self.with(|s| s.signed_digests.clone())
    }

    pub fn authorizations(&self) -> Vec<Authorization> {
        self.with(|s| s.authorizations.clone())
    }

    pub fn code_reads(&self, address: Address) -> usize {
        self.with(|s| s.code_reads.iter().filter(|a| **a == address).count())
    }

    /// EOA code reads made after the delegation transaction was sent.
    pub fn reads_since_delegation(&self) -> usize {
        self.with(|s| s.reads_since_delegation)
    }

    fn answer_call(&self, s: &State, to: Address, data: &[u8]) -> Result<Vec<u8>, ProviderError> {
        let permit2_allowance = &permit2::encode_allowance(Address::ZERO, Address::ZERO, Address::ZERO)[..4];
        let erc20_allowance = &erc20::encode_allowance(Address::ZERO, Address::ZERO)[..4];

        if to == self.permit2 && data.get(..4) == Some(permit2_allowance) {
            let token = Address::from_slice(&data[48..68]);
            if s.failing_tokens.contains(&token) {
                return Err(ProviderError::Transport("connection reset".into()));
            }
            let state = s
                .permit2_allowances
                .get(&token)
                .copied()
                .unwrap_or(AllowanceState { amount: U256::ZERO, expiration: 0, nonce: 0 });
            let mut out = Vec::with_capacity(96);
            out.extend_from_slice(&state.amount.to_be_bytes::<32>());
            out.extend_from_slice(&U256::from(state.expiration).to_be_bytes::<32>());
            out.extend_from_slice(&U256::from(state.nonce).to_be_bytes::<32>());
            return Ok(out);
        }

        if data.get(..4) == Some(erc20_allowance) {
            if s.failing_tokens.contains(&to) {
                return Err(ProviderError::Transport("connection reset".into()));
            }
            let amount = s.erc20_allowances.get(&to).copied().unwrap_or(U256::ZERO);
            return Ok(amount.to_be_bytes::<32>().to_vec());
        }

        Err(ProviderError::Rpc { code: -32000, message: "execution reverted".into() })
    }
}

#[async_trait]
impl ChainReader for MockChain {
    async fn chain_id(&self) -> Result<u64, ProviderError> {
        Ok(CHAIN_ID)
    }

    async fn get_code(&self, address: Address) -> Result<Vec<u8>, ProviderError> {
        Ok(self.with(|s| {
            s.code_reads.push(address);
            if address == self.address {
                if let Some(target) = s.pending_delegation {
                    s.reads_since_delegation += 1;
                    if s.delegation_visible_after.is_some_and(|n| s.reads_since_delegation >= n) {
                        s.code.insert(address, designator_code(target));
                        s.pending_delegation = None;
                    }
                }
            }
            s.code.get(&address).cloned().unwrap_or_default()
        }))
    }

    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, ProviderError> {
        self.with(|s| self.answer_call(s, to, &data))
    }

    async fn transaction_count(&self, _address: Address) -> Result<u64, ProviderError> {
        Ok(self.with(|s| s.nonce))
    }
}

#[async_trait]
impl Wallet for MockChain {
    fn address(&self) -> Address {
        self.address
    }

    fn supports_typed_data(&self) -> bool {
        self.with(|s| s.typed_data)
    }

    fn supports_batched_calls(&self) -> bool {
        self.with(|s| s.batched_calls)
    }

    async fn sign_typed_data(&self, digest: B256) -> Result<Vec<u8>, ProviderError> {
        self.with(|s| {
            if s.reject_signatures {
                return Err(ProviderError::Rejected("user denied request".into()));
            }
            s.signed_digests.push(digest);
            Ok(vec![0x11; 65])
        })
    }

    async fn sign_authorization(
        &self,
        authorization: Authorization,
    ) -> Result<SignedAuthorization, ProviderError> {
        self.with(|s| {
            if s.reject_signatures {
                return Err(ProviderError::Rejected("user denied request".into()));
            }
            s.authorizations.push(authorization.clone());
            Ok(SignedAuthorization {
                chain_id: authorization.chain_id,
                address: authorization.address,
                nonce: authorization.nonce,
                y_parity: 0,
                r: U256::from(1),
                s: U256::from(2),
            })
        })
    }

    async fn send_transaction(&self, tx: TxRequest) -> Result<B256, ProviderError> {
        Ok(self.with(|s| {
            if let Some(auth) = tx.authorization_list.first() {
                s.pending_delegation = Some(auth.address);
                s.reads_since_delegation = 0;
            }
            // A mined approval raises the ERC-20 allowance to Permit2.
            let approve = &erc20::encode_approve(Address::ZERO, U256::ZERO)[..4];
            if tx.data.get(..4) == Some(approve) && !s.revert_sends {
                s.erc20_allowances.insert(tx.to, U256::MAX);
            }
            s.nonce += 1;
            s.sent.push(tx);
            keccak256(s.sent.len().to_be_bytes())
        }))
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxReceipt, ProviderError> {
        let success = self.with(|s| !s.revert_sends);
        Ok(TxReceipt { tx_hash, success, block_number: Some(100) })
    }
}
