//! Calldata for the collector contract's batch entry points.

use alloy_primitives::{Address, B256, U256};
use chain_eth::abi::{encode_function_call, selector, AbiParam};

use crate::error::CollectError;

const COLLECT_SIGNATURE: &str = "batchCollectWithUniversalRouter((bytes,bytes[],uint256,address,uint16,uint32,bytes32,uint256,bytes32,uint256,uint32,(address,bytes,bytes),(uint16,address),uint256),address[],uint256[])";
const COLLECT_7702_SIGNATURE: &str = "batchCollectWithUniversalRouter7702((bytes,bytes[],uint256,address,uint16,uint32,bytes32,uint256,bytes32,uint256,uint32,(address,bytes,bytes),(uint16,address),uint256),address[],uint256[])";

/// Which collector entry point a call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectEntry {
    /// `batchCollectWithUniversalRouter` on the collector; tokens are pulled
    /// through Permit2.
    Permit2,
    /// `batchCollectWithUniversalRouter7702` on the delegated EOA itself.
    Delegated,
}

impl CollectEntry {
    pub fn selector(self) -> [u8; 4] {
        match self {
            CollectEntry::Permit2 => selector(COLLECT_SIGNATURE),
            CollectEntry::Delegated => selector(COLLECT_7702_SIGNATURE),
        }
    }
}

/// Relay executor arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorArgs {
    /// Receives any unused executor payment.
    pub refund_address: Address,
    pub signed_quote: Vec<u8>,
    /// Serialized relay instructions.
    pub instructions: Vec<u8>,
}

/// Integrator fee, in deci-basis points of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeArgs {
    pub dbps: u16,
    pub payee: Address,
}

/// The collector's parameter struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectParams {
    pub commands: Vec<u8>,
    pub inputs: Vec<Vec<u8>>,
    pub deadline: u64,
    pub target_token: Address,
    /// Wormhole chain id of the destination, 0 for same-chain collection.
    pub dst_chain: u16,
    /// CCTP domain of the destination.
    pub dst_domain: u32,
    pub recipient: B256,
    pub arbiter_fee: U256,
    pub destination_caller: B256,
    pub max_fee: U256,
    pub min_finality_threshold: u32,
    pub executor_args: ExecutorArgs,
    pub fee_args: FeeArgs,
    pub estimated_cost: U256,
}

impl CollectParams {
    /// Native value to attach: the executor's estimated cost plus the
    /// arbiter fee.
    pub fn value(&self) -> Result<U256, CollectError> {
        self.estimated_cost
            .checked_add(self.arbiter_fee)
            .ok_or_else(|| CollectError::Encoding("estimated cost plus arbiter fee overflows".into()))
    }

    fn to_abi(&self) -> AbiParam {
        AbiParam::Tuple(vec![
            AbiParam::Bytes(self.commands.clone()),
            AbiParam::Array(self.inputs.iter().cloned().map(AbiParam::Bytes).collect()),
            AbiParam::uint(self.deadline),
            AbiParam::Address(self.target_token),
            AbiParam::uint(u64::from(self.dst_chain)),
            AbiParam::uint(u64::from(self.dst_domain)),
            AbiParam::FixedBytes(self.recipient),
            AbiParam::Uint(self.arbiter_fee),
            AbiParam::FixedBytes(self.destination_caller),
            AbiParam::Uint(self.max_fee),
            AbiParam::uint(u64::from(self.min_finality_threshold)),
            AbiParam::Tuple(vec![
                AbiParam::Address(self.executor_args.refund_address),
                AbiParam::Bytes(self.executor_args.signed_quote.clone()),
                AbiParam::Bytes(self.executor_args.instructions.clone()),
            ]),
            AbiParam::Tuple(vec![
                AbiParam::uint(u64::from(self.fee_args.dbps)),
                AbiParam::Address(self.fee_args.payee),
            ]),
            AbiParam::Uint(self.estimated_cost),
        ])
    }

    /// Encodes the full call for `entry`.
    pub fn encode_call(
        &self,
        entry: CollectEntry,
        pull_tokens: &[Address],
        pull_amounts: &[U256],
    ) -> Result<Vec<u8>, CollectError> {
        if pull_tokens.len() != pull_amounts.len() {
            return Err(CollectError::Encoding(format!(
                "{} pull tokens but {} pull amounts",
                pull_tokens.len(),
                pull_amounts.len()
            )));
        }
        if self.commands.len() != self.inputs.len() {
            return Err(CollectError::Encoding(format!(
                "{} commands but {} inputs",
                self.commands.len(),
                self.inputs.len()
            )));
        }

        Ok(encode_function_call(
            entry.selector(),
            &[
                self.to_abi(),
                AbiParam::Array(pull_tokens.iter().copied().map(AbiParam::Address).collect()),
                AbiParam::Array(pull_amounts.iter().copied().map(AbiParam::Uint).collect()),
            ],
        ))
    }
}
