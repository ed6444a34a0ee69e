//! Associated token account (ATA) derivation.
//!
//! Tokens bridged to Solana are credited to the recipient's ATA for the mint,
//! not to the wallet key itself. The ATA is a program-derived address of the
//! Associated Token Account program over `[wallet, token_program, mint]`.

use sha2::{Digest, Sha256};

use crate::address::{address_to_bytes, bytes_to_address};
use crate::error::SolError;

/// SPL Token program: `TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA`.
pub const TOKEN_PROGRAM_ID: [u8; 32] = [
    0x06, 0xdd, 0xf6, 0xe1, 0xd7, 0x65, 0xa1, 0x93, 0xd9, 0xcb, 0xe1, 0x46, 0xce, 0xeb, 0x79, 0xac,
    0x1c, 0xb4, 0x85, 0xed, 0x5f, 0x5b, 0x37, 0x91, 0x3a, 0x8c, 0xf5, 0x85, 0x7e, 0xff, 0x00, 0xa9,
];

/// Associated Token Account program: `ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL`.
pub const ASSOCIATED_TOKEN_PROGRAM_ID: [u8; 32] = [
    0x8c, 0x97, 0x25, 0x8f, 0x4e, 0x24, 0x89, 0xf1, 0xbb, 0x3d, 0x10, 0x29, 0x14, 0x8e, 0x0d, 0x83,
    0x0b, 0x5a, 0x13, 0x99, 0xda, 0xff, 0x10, 0x84, 0x04, 0x8e, 0x7b, 0xd8, 0xdb, 0xe9, 0xf8, 0x59,
];

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Derives the ATA for a wallet + mint pair under the classic token program.
///
/// Off-curve owners (PDAs) are allowed, matching
/// `getAssociatedTokenAddressSync(mint, owner, true)`.
pub fn derive_associated_token_address(
    wallet: &[u8; 32],
    mint: &[u8; 32],
) -> Result<[u8; 32], SolError> {
    let seeds: [&[u8]; 3] = [wallet, &TOKEN_PROGRAM_ID, mint];
    (0u8..=255)
        .rev()
        .find_map(|bump| program_address(&seeds, bump, &ASSOCIATED_TOKEN_PROGRAM_ID))
        .ok_or_else(|| {
            SolError::NoProgramAddress(format!(
                "{}/{}",
                bytes_to_address(wallet),
                bytes_to_address(mint)
            ))
        })
}

/// String form of [`derive_associated_token_address`].
pub fn associated_token_address(wallet: &str, mint: &str) -> Result<String, SolError> {
    let wallet = address_to_bytes(wallet)?;
    let mint = address_to_bytes(mint)?;
    derive_associated_token_address(&wallet, &mint).map(|ata| bytes_to_address(&ata))
}

/// `sha256(seeds || bump || program_id || "ProgramDerivedAddress")`, valid
/// only when the hash is not an Ed25519 point.
fn program_address(seeds: &[&[u8]], bump: u8, program_id: &[u8; 32]) -> Option<[u8; 32]> {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update([bump]);
    hasher.update(program_id);
    hasher.update(PDA_MARKER);
    let hash: [u8; 32] = hasher.finalize().into();

    (!is_on_curve(&hash)).then_some(hash)
}

fn is_on_curve(bytes: &[u8; 32]) -> bool {
    curve25519_dalek::edwards::CompressedEdwardsY(*bytes)
        .decompress()
        .is_some()
}
