//! Relay instructions: how much gas and native currency the executor must
//! deliver on the destination chain.
//!
//! The wire format is the executor's `relayInstructionsLayout`: records are
//! concatenated without a count prefix, each a 1-byte type followed by a
//! fixed-size big-endian payload.
//!
//! | type | record        | payload                                  | size |
//! |------|---------------|------------------------------------------|------|
//! | 1    | Gas           | gas_limit u128, msg_value u128           | 33   |
//! | 2    | GasDropOff    | drop_off u128, recipient bytes32         | 49   |

use thiserror::Error;
use tracing::{debug, warn};

use crate::address_codec::CanonicalAddress;
use crate::chains::{get_chain, ChainFamily};
use crate::config::{ExecutionMode, RelayConfig};
use crate::error::CollectError;

pub const RELAY_IX_GAS: u8 = 1;
pub const RELAY_IX_GAS_DROP_OFF: u8 = 2;

const GAS_RECORD_LEN: usize = 33;
const DROP_OFF_RECORD_LEN: usize = 49;

/// A single relay instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayInstruction {
    Gas { gas_limit: u128, msg_value: u128 },
    GasDropOff { drop_off: u128, recipient: CanonicalAddress },
}

impl RelayInstruction {
    pub fn encoded_len(&self) -> usize {
        match self {
            RelayInstruction::Gas { .. } => GAS_RECORD_LEN,
            RelayInstruction::GasDropOff { .. } => DROP_OFF_RECORD_LEN,
        }
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            RelayInstruction::Gas { gas_limit, msg_value } => {
                out.push(RELAY_IX_GAS);
                out.extend_from_slice(&gas_limit.to_be_bytes());
                out.extend_from_slice(&msg_value.to_be_bytes());
            }
            RelayInstruction::GasDropOff { drop_off, recipient } => {
                out.push(RELAY_IX_GAS_DROP_OFF);
                out.extend_from_slice(&drop_off.to_be_bytes());
                out.extend_from_slice(recipient.as_bytes());
            }
        }
    }
}

/// An ordered, non-empty sequence of relay instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayInstructionSet(Vec<RelayInstruction>);

impl RelayInstructionSet {
    pub fn new(instructions: Vec<RelayInstruction>) -> Result<Self, CollectError> {
        if instructions.is_empty() {
            return Err(CollectError::Encoding(
                "relay instruction set must not be empty".into(),
            ));
        }
        Ok(Self(instructions))
    }

    pub fn instructions(&self) -> &[RelayInstruction] {
        &self.0
    }

    /// Serializes the set into the executor wire format.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.0.iter().map(RelayInstruction::encoded_len).sum());
        for instruction in &self.0 {
            instruction.encode_into(&mut out);
        }
        out
    }
}

/// Errors decoding a serialized instruction set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayDecodeError {
    #[error("unsupported relay instruction type {tag} at offset {offset}")]
    UnsupportedType { tag: u8, offset: usize },

    #[error("relay instruction truncated at offset {offset}")]
    Truncated { offset: usize },

    #[error("empty relay instructions")]
    Empty,
}

/// Parses a serialized instruction set. Drop-off recipients come back as
/// raw 32-byte canonical addresses.
pub fn decode(data: &[u8]) -> Result<RelayInstructionSet, RelayDecodeError> {
    let mut instructions = Vec::new();
    let mut offset = 0;

    while offset < data.len() {
        let tag = data[offset];
        let len = match tag {
            RELAY_IX_GAS => GAS_RECORD_LEN,
            RELAY_IX_GAS_DROP_OFF => DROP_OFF_RECORD_LEN,
            _ => return Err(RelayDecodeError::UnsupportedType { tag, offset }),
        };
        let record = data
            .get(offset..offset + len)
            .ok_or(RelayDecodeError::Truncated { offset })?;

        let first = read_u128(&record[1..17]);
        let instruction = if tag == RELAY_IX_GAS {
            RelayInstruction::Gas { gas_limit: first, msg_value: read_u128(&record[17..33]) }
        } else {
            let mut recipient = [0u8; 32];
            recipient.copy_from_slice(&record[17..49]);
            RelayInstruction::GasDropOff {
                drop_off: first,
                recipient: CanonicalAddress::from_raw(recipient),
            }
        };
        instructions.push(instruction);
        offset += len;
    }

    if instructions.is_empty() {
        return Err(RelayDecodeError::Empty);
    }
    Ok(RelayInstructionSet(instructions))
}

fn read_u128(bytes: &[u8]) -> u128 {
    let mut buf = [0u8; 16];
    buf.copy_from_slice(bytes);
    u128::from_be_bytes(buf)
}

/// Resolves the family whose relay constants apply to `dst_chain`.
///
/// Unknown chains are treated as EVM unless `strict_destination_chains` is
/// set, in which case they are rejected.
pub fn destination_family(config: &RelayConfig, dst_chain: u16) -> Result<ChainFamily, CollectError> {
    match get_chain(dst_chain) {
        Some(chain) => Ok(chain.family),
        None if config.strict_destination_chains => {
            Err(CollectError::UnsupportedDestinationChain(dst_chain))
        }
        None => {
            warn!(dst_chain, "unknown destination chain, using EVM relay constants");
            Ok(ChainFamily::Evm)
        }
    }
}

/// Builds the instruction set for a destination chain and recipient.
///
/// - drop mode: a drop-off to `recipient`, then an auxiliary gas instruction
///   (Solana carries a non-zero `msg_value` to fund compute).
/// - gas mode: a single gas instruction sized for the destination family.
pub fn build_instructions(
    config: &RelayConfig,
    dst_chain: u16,
    recipient: &CanonicalAddress,
) -> Result<RelayInstructionSet, CollectError> {
    let family = destination_family(config, dst_chain)?;

    let instructions = match (config.mode, family) {
        (ExecutionMode::Drop, ChainFamily::Solana) => vec![
            RelayInstruction::GasDropOff { drop_off: config.solana_gas_drop, recipient: *recipient },
            RelayInstruction::Gas {
                gas_limit: config.solana_gas_limit,
                msg_value: config.solana_msg_value,
            },
        ],
        (ExecutionMode::Drop, ChainFamily::Evm) => vec![
            RelayInstruction::GasDropOff { drop_off: config.evm_gas_drop, recipient: *recipient },
            RelayInstruction::Gas { gas_limit: config.evm_drop_gas_limit, msg_value: 0 },
        ],
        (ExecutionMode::Gas, ChainFamily::Solana) => vec![RelayInstruction::Gas {
            gas_limit: config.solana_gas_limit,
            msg_value: config.solana_msg_value,
        }],
        (ExecutionMode::Gas, ChainFamily::Evm) => {
            vec![RelayInstruction::Gas { gas_limit: config.evm_gas_limit, msg_value: 0 }]
        }
    };

    let set = RelayInstructionSet::new(instructions)?;
    debug!(
        dst_chain,
        mode = ?config.mode,
        family = ?family,
        count = set.instructions().len(),
        "built relay instructions"
    );
    Ok(set)
}
