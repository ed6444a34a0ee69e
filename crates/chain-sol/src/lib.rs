//! Solana address support for cross-chain recipients.
//!
//! Decodes Base58 account addresses into their 32-byte form and derives
//! associated token accounts, so a bridge transfer can be addressed to the
//! account that actually holds the bridged mint. Implemented directly on
//! `bs58`, `sha2` and `curve25519-dalek` without `solana-sdk`.

pub mod address;
pub mod error;
pub mod spl_token;

pub use address::{address_to_bytes, bytes_to_address, decode_padded, looks_like_address};
pub use error::SolError;
pub use spl_token::{
    associated_token_address, derive_associated_token_address, ASSOCIATED_TOKEN_PROGRAM_ID,
    TOKEN_PROGRAM_ID,
};
