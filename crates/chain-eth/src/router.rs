//! Universal Router command encoding.
//!
//! A router program is a byte string of opcodes plus one ABI-encoded input
//! per opcode, executed strictly in order. Only the three commands the
//! collector needs are modelled here.

use alloy_primitives::{Address, U256};

use crate::abi::{encode_params, AbiParam};
use crate::error::EthError;

/// `V3_SWAP_EXACT_IN`: input `(address, uint256, uint256, bytes, bool)`.
pub const V3_SWAP_EXACT_IN: u8 = 0x00;

/// `V2_SWAP_EXACT_IN`: input `(address, uint256, uint256, address[], bool)`.
pub const V2_SWAP_EXACT_IN: u8 = 0x08;

/// `UNWRAP_WETH`: input `(address, uint256)`.
pub const UNWRAP_WETH: u8 = 0x0c;

/// Largest fee tier representable in a packed V3 path (uint24).
pub const MAX_FEE_TIER: u32 = 0x00ff_ffff;

/// Packs a V3 path: `token0 | fee0 | token1 | fee1 | ... | tokenN`, where
/// each fee is a 3-byte big-endian uint24.
///
/// # Parameters
///
/// - `tokens`: Route tokens, input first.
/// - `fees`: Pool fee tiers, one per hop.
///
/// # Returns
///
/// The packed path, `20 * tokens.len() + 3 * fees.len()` bytes long.
pub fn encode_v3_path(tokens: &[Address], fees: &[u32]) -> Result<Vec<u8>, EthError> {
    if tokens.len() < 2 {
        return Err(EthError::InvalidPath(format!(
            "a V3 route needs at least 2 tokens, got {}",
            tokens.len()
        )));
    }
    if tokens.len() != fees.len() + 1 {
        return Err(EthError::InvalidPath(format!(
            "{} tokens require {} fee tiers, got {}",
            tokens.len(),
            tokens.len() - 1,
            fees.len()
        )));
    }

    let mut path = Vec::with_capacity(tokens.len() * 20 + fees.len() * 3);
    for (i, token) in tokens.iter().enumerate() {
        path.extend_from_slice(token.as_slice());
        if let Some(&fee) = fees.get(i) {
            if fee > MAX_FEE_TIER {
                return Err(EthError::InvalidPath(format!("fee tier {fee} exceeds uint24")));
            }
            path.extend_from_slice(&fee.to_be_bytes()[1..]);
        }
    }

    Ok(path)
}

/// Encodes the input for [`V3_SWAP_EXACT_IN`].
pub fn encode_v3_exact_in(
    recipient: Address,
    amount_in: U256,
    amount_out_min: U256,
    path: &[u8],
    payer_is_user: bool,
) -> Vec<u8> {
    encode_params(&[
        AbiParam::Address(recipient),
        AbiParam::Uint(amount_in),
        AbiParam::Uint(amount_out_min),
        AbiParam::Bytes(path.to_vec()),
        AbiParam::Bool(payer_is_user),
    ])
}

/// Encodes the input for [`V2_SWAP_EXACT_IN`].
pub fn encode_v2_exact_in(
    recipient: Address,
    amount_in: U256,
    amount_out_min: U256,
    path: &[Address],
    payer_is_user: bool,
) -> Result<Vec<u8>, EthError> {
    if path.len() < 2 {
        return Err(EthError::InvalidPath(format!(
            "a V2 route needs at least 2 tokens, got {}",
            path.len()
        )));
    }

    Ok(encode_params(&[
        AbiParam::Address(recipient),
        AbiParam::Uint(amount_in),
        AbiParam::Uint(amount_out_min),
        AbiParam::Array(path.iter().copied().map(AbiParam::Address).collect()),
        AbiParam::Bool(payer_is_user),
    ]))
}

/// Encodes the input for [`UNWRAP_WETH`].
pub fn encode_unwrap_weth(recipient: Address, amount_min: U256) -> Vec<u8> {
    encode_params(&[AbiParam::Address(recipient), AbiParam::Uint(amount_min)])
}
