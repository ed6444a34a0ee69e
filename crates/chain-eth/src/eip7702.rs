//! EIP-7702 set-code authorizations.
//!
//! An EOA delegates to a contract by signing an authorization tuple that a
//! type-4 transaction carries on-chain. Once processed, the EOA's code is the
//! 23-byte designator `0xef0100 || target`.

use alloy_primitives::{keccak256, Address, B256, U256};
use alloy_rlp::{Encodable, RlpEncodable};

/// Prefix of an installed delegation designator.
pub const DELEGATION_DESIGNATOR: [u8; 3] = [0xef, 0x01, 0x00];

/// Magic byte prepended to the RLP payload before hashing an authorization.
const AUTHORIZATION_MAGIC: u8 = 0x05;

/// Unsigned authorization `[chain_id, address, nonce]`.
#[derive(Debug, Clone, PartialEq, Eq, RlpEncodable)]
pub struct Authorization {
    pub chain_id: U256,
    pub address: Address,
    pub nonce: u64,
}

/// Signed authorization tuple as carried in a type-4 transaction's
/// `authorization_list`.
#[derive(Debug, Clone, PartialEq, Eq, RlpEncodable)]
pub struct SignedAuthorization {
    pub chain_id: U256,
    pub address: Address,
    pub nonce: u64,
    pub y_parity: u8,
    pub r: U256,
    pub s: U256,
}

impl Authorization {
    /// `keccak256(0x05 || rlp([chain_id, address, nonce]))`.
    pub fn signing_hash(&self) -> B256 {
        let mut buf = Vec::with_capacity(1 + self.length());
        buf.push(AUTHORIZATION_MAGIC);
        self.encode(&mut buf);
        keccak256(&buf)
    }
}

/// Returns the delegation target if `code` is an installed designator.
pub fn delegation_target(code: &[u8]) -> Option<Address> {
    if code.len() != 23 || code.get(..3) != Some(&DELEGATION_DESIGNATOR[..]) {
        return None;
    }
    Some(Address::from_slice(&code[3..]))
}

/// Builds the code an EOA carries once delegated to `target`.
pub fn designator_code(target: Address) -> Vec<u8> {
    let mut code = Vec::with_capacity(23);
    code.extend_from_slice(&DELEGATION_DESIGNATOR);
    code.extend_from_slice(target.as_slice());
    code
}
