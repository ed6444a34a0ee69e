//! Solana address decoding.
//!
//! A Solana address is the Base58 encoding of a 32-byte account key. Base58
//! decoding is a big-integer conversion where each leading `1` stands for a
//! leading zero byte; `bs58` implements exactly that.

use crate::error::SolError;

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Whether `address` has the shape of a Solana address: 32 to 44 characters
/// from the Base58 alphabet (no `0`, `O`, `I` or `l`).
pub fn looks_like_address(address: &str) -> bool {
    (32..=44).contains(&address.len()) && address.chars().all(|c| BASE58_ALPHABET.contains(c))
}

/// Decodes a Base58 address and left-pads the result to 32 bytes.
///
/// Fails when the input is not Base58 or decodes to more than 32 bytes.
pub fn decode_padded(address: &str) -> Result<[u8; 32], SolError> {
    let bytes = decode(address)?;
    if bytes.len() > 32 {
        return Err(SolError::InvalidAddress(format!(
            "{address} decodes to {} bytes, expected at most 32",
            bytes.len()
        )));
    }

    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(out)
}

/// Decodes an address that must be exactly 32 bytes.
pub fn address_to_bytes(address: &str) -> Result<[u8; 32], SolError> {
    let bytes = decode(address)?;
    bytes.try_into().map_err(|v: Vec<u8>| {
        SolError::InvalidAddress(format!("expected 32 bytes, got {}", v.len()))
    })
}

/// Encodes a 32-byte account key as a Base58 address.
pub fn bytes_to_address(bytes: &[u8; 32]) -> String {
    bs58::encode(bytes).into_string()
}

fn decode(address: &str) -> Result<Vec<u8>, SolError> {
    bs58::decode(address)
        .into_vec()
        .map_err(|e| SolError::InvalidAddress(format!("base58 decode failed: {e}")))
}
