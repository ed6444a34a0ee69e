use alloy_primitives::Address;
use sha3::{Digest, Keccak256};

use crate::error::EthError;

/// Derives the Ethereum address of an uncompressed secp256k1 public key
/// (65 bytes, `0x04` prefix): the last 20 bytes of `keccak256(x || y)`.
pub fn pubkey_to_address(uncompressed_pubkey: &[u8]) -> Result<Address, EthError> {
    if uncompressed_pubkey.len() != 65 || uncompressed_pubkey[0] != 0x04 {
        return Err(EthError::InvalidPublicKey(
            "expected 65-byte uncompressed key starting with 0x04".into(),
        ));
    }

    let hash = Keccak256::digest(&uncompressed_pubkey[1..]);
    Ok(Address::from_slice(&hash[12..]))
}

/// Whether `address` has the `0x` + 40 hex digit shape, ignoring checksum.
pub fn is_hex_address(address: &str) -> bool {
    match strip_0x(address) {
        Some(hex_part) => hex_part.len() == 40 && hex_part.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

/// Validates an Ethereum address string.
///
/// Malformed input (no prefix, wrong length, non-hex) is an error. Single-case
/// input carries no checksum and is accepted; mixed-case input returns
/// `Ok(false)` when its EIP-55 checksum does not match.
pub fn validate_address(address: &str) -> Result<bool, EthError> {
    let hex_part = strip_0x(address)
        .ok_or_else(|| EthError::InvalidAddress("address must start with 0x".into()))?;

    if hex_part.len() != 40 {
        return Err(EthError::InvalidAddress(format!(
            "expected 40 hex characters, got {}",
            hex_part.len()
        )));
    }

    if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(EthError::InvalidAddress(
            "address contains non-hex characters".into(),
        ));
    }

    let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());
    if !(has_lower && has_upper) {
        return Ok(true);
    }

    let checksummed = checksum_address(address)?;
    Ok(&checksummed[2..] == hex_part)
}

/// Returns the EIP-55 mixed-case form of a hex address.
pub fn checksum_address(address: &str) -> Result<String, EthError> {
    let hex_part = strip_0x(address)
        .ok_or_else(|| EthError::InvalidAddress("address must start with 0x".into()))?
        .to_ascii_lowercase();

    let bytes = hex::decode(&hex_part)
        .map_err(|e| EthError::InvalidAddress(format!("invalid hex: {e}")))?;
    if bytes.len() != 20 {
        return Err(EthError::InvalidAddress(format!(
            "expected 20 bytes, got {}",
            bytes.len()
        )));
    }

    let hash = Keccak256::digest(hex_part.as_bytes());
    let mut checksummed = String::with_capacity(42);
    checksummed.push_str("0x");
    for (i, c) in hex_part.chars().enumerate() {
        let nibble = if i % 2 == 0 { hash[i / 2] >> 4 } else { hash[i / 2] & 0x0f };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            checksummed.push(c.to_ascii_uppercase());
        } else {
            checksummed.push(c);
        }
    }

    Ok(checksummed)
}

/// Parses a hex address, rejecting mixed-case input with a bad checksum.
pub fn parse_address(address: &str) -> Result<Address, EthError> {
    if !validate_address(address)? {
        return Err(EthError::InvalidAddress(format!(
            "EIP-55 checksum mismatch for {address}"
        )));
    }

    let hex_part = strip_0x(address).unwrap_or(address);
    let bytes = hex::decode(hex_part)
        .map_err(|e| EthError::InvalidAddress(format!("invalid hex: {e}")))?;
    Ok(Address::from_slice(&bytes))
}

fn strip_0x(s: &str) -> Option<&str> {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
}
