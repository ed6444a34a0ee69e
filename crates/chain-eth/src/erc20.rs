use alloy_primitives::{Address, U256};

use crate::abi::{decode_word, encode_function_call, AbiParam};
use crate::error::EthError;

/// Function selector for `approve(address,uint256)`: `0x095ea7b3`.
const APPROVE_SELECTOR: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3];

/// Function selector for `allowance(address,address)`: `0xdd62ed3e`.
const ALLOWANCE_SELECTOR: [u8; 4] = [0xdd, 0x62, 0xed, 0x3e];

/// Encodes an ERC-20 `approve(address,uint256)` call.
///
/// # Parameters
///
/// - `spender`: The account allowed to pull tokens.
/// - `amount`: The allowance; `U256::MAX` for an unlimited approval.
pub fn encode_approve(spender: Address, amount: U256) -> Vec<u8> {
    encode_function_call(
        APPROVE_SELECTOR,
        &[AbiParam::Address(spender), AbiParam::Uint(amount)],
    )
}

/// Encodes an ERC-20 `allowance(address,address)` call.
pub fn encode_allowance(owner: Address, spender: Address) -> Vec<u8> {
    encode_function_call(
        ALLOWANCE_SELECTOR,
        &[AbiParam::Address(owner), AbiParam::Address(spender)],
    )
}

/// Decodes a single `uint256` return value.
///
/// Trailing bytes beyond the first word are ignored.
pub fn decode_uint256(data: &[u8]) -> Result<U256, EthError> {
    decode_word(data, 0).ok_or_else(|| {
        EthError::DecodingError(format!("expected at least 32 bytes, got {}", data.len()))
    })
}
