//! Local secp256k1 signer for digests, EIP-7702 authorizations and transactions.

use std::fmt;

use alloy_primitives::{Address, B256, U256};
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{RecoveryId, Signature, SigningKey};
use zeroize::Zeroize;

use crate::address::pubkey_to_address;
use crate::eip7702::{Authorization, SignedAuthorization};
use crate::error::EthError;

/// An ECDSA signature with its recovery parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub r: U256,
    pub s: U256,
    pub y_parity: bool,
}

impl RecoverableSignature {
    /// 65-byte `r || s || v` form with `v` in {27, 28}, as expected by
    /// `ecrecover`-based verifiers such as Permit2.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r.to_be_bytes::<32>());
        out[32..64].copy_from_slice(&self.s.to_be_bytes::<32>());
        out[64] = 27 + self.y_parity as u8;
        out
    }
}

/// A private key held in memory. The key material is zeroized on drop.
pub struct LocalSigner {
    key: SigningKey,
    address: Address,
}

impl LocalSigner {
    /// Creates a signer from a raw 32-byte secret.
    pub fn from_bytes(secret: &[u8; 32]) -> Result<Self, EthError> {
        let mut key_bytes = *secret;
        let key = SigningKey::from_bytes((&key_bytes).into())
            .map_err(|e| EthError::InvalidPrivateKey(e.to_string()));
        key_bytes.zeroize();
        let key = key?;

        let point = key.verifying_key().to_encoded_point(false);
        let address = pubkey_to_address(point.as_bytes())?;
        Ok(Self { key, address })
    }

    /// Creates a signer from a hex secret, with or without `0x`.
    pub fn from_hex(secret: &str) -> Result<Self, EthError> {
        let trimmed = secret.trim();
        let hex_part = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let mut decoded = hex::decode(hex_part)
            .map_err(|e| EthError::InvalidPrivateKey(format!("invalid hex: {e}")))?;

        let result = match <[u8; 32]>::try_from(decoded.as_slice()) {
            Ok(mut bytes) => {
                let signer = Self::from_bytes(&bytes);
                bytes.zeroize();
                signer
            }
            Err(_) => Err(EthError::InvalidPrivateKey(format!(
                "expected 32 bytes, got {}",
                decoded.len()
            ))),
        };
        decoded.zeroize();
        result
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Signs a 32-byte digest without further hashing.
    pub fn sign_hash(&self, hash: &B256) -> Result<RecoverableSignature, EthError> {
        let (signature, recovery_id): (Signature, RecoveryId) = self
            .key
            .sign_prehash(hash.as_slice())
            .map_err(|e| EthError::SigningError(e.to_string()))?;

        Ok(RecoverableSignature {
            r: U256::from_be_slice(&signature.r().to_bytes()),
            s: U256::from_be_slice(&signature.s().to_bytes()),
            y_parity: recovery_id.is_y_odd(),
        })
    }

    /// Signs an EIP-7702 authorization tuple.
    pub fn sign_authorization(
        &self,
        authorization: &Authorization,
    ) -> Result<SignedAuthorization, EthError> {
        let signature = self.sign_hash(&authorization.signing_hash())?;
        Ok(SignedAuthorization {
            chain_id: authorization.chain_id,
            address: authorization.address,
            nonce: authorization.nonce,
            y_parity: signature.y_parity as u8,
            r: signature.r,
            s: signature.s,
        })
    }
}

impl fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSigner").field("address", &self.address).finish_non_exhaustive()
    }
}
