//! EVM encoding and signing primitives for the dust collector.
//!
//! This crate provides:
//! - A head/tail Solidity ABI encoder (static words, dynamic bytes, arrays, tuples)
//! - EIP-55 address parsing and validation
//! - ERC-20 `approve`/`allowance` calldata
//! - Permit2 AllowanceTransfer batch hashing (EIP-712) and calldata
//! - Universal Router command bytes and per-command inputs
//! - EIP-7702 authorizations and delegation designators
//! - EIP-1559 and EIP-7702 (type 4) transaction signing with a local key
//!
//! Everything here is synchronous and performs no I/O.

pub mod abi;
pub mod address;
pub mod eip7702;
pub mod erc20;
pub mod error;
pub mod permit2;
pub mod router;
pub mod signer;
pub mod transaction;

pub use alloy_primitives::{Address, B256, U256};
pub use eip7702::{delegation_target, Authorization, SignedAuthorization, DELEGATION_DESIGNATOR};
pub use error::EthError;
pub use permit2::{PermitBatch, PermitDetails, PERMIT2_ADDRESS};
pub use signer::{LocalSigner, RecoverableSignature};
pub use transaction::{EthTransaction, SignedEthTransaction};
