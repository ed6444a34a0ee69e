//! Solidity ABI encoding for calldata and `abi.encode` payloads.
//!
//! Implements the standard head/tail layout: static values are written in
//! place as 32-byte words, dynamic values (`bytes`, `T[]`, tuples containing
//! either) are referenced from the head by a byte offset and appended to the
//! tail. This covers every shape the router inputs, Permit2 calls and the
//! collector entry point need without pulling in a full ABI parser.

use alloy_primitives::{keccak256, Address, B256, U256};

/// A single ABI value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiParam {
    /// `address`, left-padded to 32 bytes.
    Address(Address),
    /// Any `uintN`; the caller is responsible for the value fitting in N bits.
    Uint(U256),
    /// `bool`.
    Bool(bool),
    /// `bytes32`.
    FixedBytes(B256),
    /// Dynamic `bytes`.
    Bytes(Vec<u8>),
    /// Dynamic-length array `T[]`.
    Array(Vec<AbiParam>),
    /// Tuple / struct.
    Tuple(Vec<AbiParam>),
}

impl AbiParam {
    /// Shorthand for small integer words (`uint16`, `uint32`, `uint48`, ...).
    pub fn uint(value: u64) -> Self {
        AbiParam::Uint(U256::from(value))
    }

    /// Whether this value is encoded in the tail and referenced by offset.
    pub fn is_dynamic(&self) -> bool {
        match self {
            AbiParam::Bytes(_) | AbiParam::Array(_) => true,
            AbiParam::Tuple(items) => items.iter().any(AbiParam::is_dynamic),
            _ => false,
        }
    }

    /// Size of this value's slot in an enclosing head.
    fn head_len(&self) -> usize {
        match self {
            AbiParam::Tuple(items) if !self.is_dynamic() => {
                items.iter().map(AbiParam::head_len).sum()
            }
            _ => 32,
        }
    }
}

/// Computes the 4-byte function selector for a canonical signature such as
/// `"approve(address,uint256)"`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    out
}

/// Encodes a parameter list exactly like Solidity's `abi.encode(p0, p1, ...)`.
pub fn encode_params(params: &[AbiParam]) -> Vec<u8> {
    encode_sequence(params)
}

/// Encodes a function call: `selector || abi.encode(params...)`.
///
/// # Parameters
///
/// - `selector`: The 4-byte function selector.
/// - `params`: The call arguments in declaration order.
pub fn encode_function_call(selector: [u8; 4], params: &[AbiParam]) -> Vec<u8> {
    let body = encode_sequence(params);
    let mut data = Vec::with_capacity(4 + body.len());
    data.extend_from_slice(&selector);
    data.extend_from_slice(&body);
    data
}

/// Left-pads an address into a 32-byte word.
pub fn address_word(address: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_slice());
    word
}

/// Reads word `index` of ABI return data as a `uint256`.
pub fn decode_word(data: &[u8], index: usize) -> Option<U256> {
    let start = index.checked_mul(32)?;
    let word = data.get(start..start + 32)?;
    Some(U256::from_be_slice(word))
}

fn encode_sequence(items: &[AbiParam]) -> Vec<u8> {
    let head_size: usize = items.iter().map(AbiParam::head_len).sum();
    let mut head = Vec::with_capacity(head_size);
    let mut tail = Vec::new();

    for item in items {
        if item.is_dynamic() {
            let offset = U256::from(head_size + tail.len());
            head.extend_from_slice(&offset.to_be_bytes::<32>());
            tail.extend_from_slice(&encode_value(item));
        } else {
            head.extend_from_slice(&encode_value(item));
        }
    }

    head.extend_from_slice(&tail);
    head
}

fn encode_value(param: &AbiParam) -> Vec<u8> {
    match param {
        AbiParam::Address(address) => address_word(address).to_vec(),
        AbiParam::Uint(value) => value.to_be_bytes::<32>().to_vec(),
        AbiParam::Bool(flag) => U256::from(*flag as u8).to_be_bytes::<32>().to_vec(),
        AbiParam::FixedBytes(word) => word.to_vec(),
        AbiParam::Bytes(bytes) => {
            let padded = bytes.len().div_ceil(32) * 32;
            let mut out = Vec::with_capacity(32 + padded);
            out.extend_from_slice(&U256::from(bytes.len()).to_be_bytes::<32>());
            out.extend_from_slice(bytes);
            out.resize(32 + padded, 0);
            out
        }
        AbiParam::Array(items) => {
            let mut out = U256::from(items.len()).to_be_bytes::<32>().to_vec();
            out.extend_from_slice(&encode_sequence(items));
            out
        }
        AbiParam::Tuple(items) => encode_sequence(items),
    }
}
