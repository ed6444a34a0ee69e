//! Chain-family detection and the canonical 32-byte address form used on the
//! wire by the bridge and the relay executor.

use std::fmt;

use alloy_primitives::{Address, B256};
use chain_eth::address::{is_hex_address, parse_address};

use crate::error::CollectError;

/// Result of classifying an address string. Classification is total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    /// `0x` + 40 hex digits.
    Ethereum,
    /// 32 to 44 Base58 characters.
    Solana,
    /// `0x` + 64 hex digits, already 32 bytes.
    RawHex32,
    Unknown,
}

/// A 32-byte cross-chain address together with the family it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CanonicalAddress {
    bytes: [u8; 32],
    family: AddressFamily,
}

impl CanonicalAddress {
    /// Left-pads an EVM address with 12 zero bytes.
    pub fn from_evm(address: Address) -> Self {
        let mut bytes = [0u8; 32];
        bytes[12..].copy_from_slice(address.as_slice());
        Self { bytes, family: AddressFamily::Ethereum }
    }

    /// Wraps a Solana account key.
    pub fn from_solana(key: [u8; 32]) -> Self {
        Self { bytes: key, family: AddressFamily::Solana }
    }

    /// Wraps 32 bytes of unknown origin, e.g. read back off the wire.
    pub fn from_raw(bytes: [u8; 32]) -> Self {
        Self { bytes, family: AddressFamily::RawHex32 }
    }

    /// The all-zero address, used as the recipient of same-chain collections.
    pub fn zero() -> Self {
        Self::from_raw([0u8; 32])
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    pub fn family(&self) -> AddressFamily {
        self.family
    }

    pub fn to_b256(&self) -> B256 {
        B256::from(self.bytes)
    }
}

impl fmt::Display for CanonicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.bytes))
    }
}

/// Detects the chain family of `address`.
///
/// Checks run in order: Ethereum, Solana, raw 32-byte hex. A string matching
/// none of them is [`AddressFamily::Unknown`].
pub fn classify(address: &str) -> AddressFamily {
    if is_hex_address(address) {
        AddressFamily::Ethereum
    } else if chain_sol::looks_like_address(address) {
        AddressFamily::Solana
    } else if is_raw_hex32(address) {
        AddressFamily::RawHex32
    } else {
        AddressFamily::Unknown
    }
}

/// Converts an address of any supported family to its canonical 32 bytes.
///
/// # Returns
///
/// `InvalidAddress` for unknown input, a mixed-case Ethereum address with a
/// bad EIP-55 checksum, or a Base58 string decoding to more than 32 bytes.
pub fn to_canonical32(address: &str) -> Result<CanonicalAddress, CollectError> {
    match classify(address) {
        AddressFamily::Ethereum => {
            let evm = parse_address(address)?;
            Ok(CanonicalAddress::from_evm(evm))
        }
        AddressFamily::Solana => {
            let key = chain_sol::decode_padded(address)?;
            Ok(CanonicalAddress::from_solana(key))
        }
        AddressFamily::RawHex32 => {
            let decoded = hex::decode(&address[2..])
                .map_err(|e| CollectError::InvalidAddress(format!("{address}: {e}")))?;
            let mut bytes = [0u8; 32];
            bytes.copy_from_slice(&decoded);
            Ok(CanonicalAddress { bytes, family: AddressFamily::RawHex32 })
        }
        AddressFamily::Unknown => Err(CollectError::InvalidAddress(format!(
            "unrecognized address format: {address:?}"
        ))),
    }
}

fn is_raw_hex32(address: &str) -> bool {
    address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .is_some_and(|h| h.len() == 64 && h.chars().all(|c| c.is_ascii_hexdigit()))
}
