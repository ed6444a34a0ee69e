//! Permit2 `AllowanceTransfer` support: typed-data hashing for batch permits
//! and calldata for `permit`, `approve` and `allowance`.

use alloy_primitives::{address, keccak256, Address, B256, U256};

use crate::abi::{address_word, decode_word, encode_function_call, encode_params, selector, AbiParam};
use crate::error::EthError;

/// Canonical Permit2 deployment (same address on every supported chain).
pub const PERMIT2_ADDRESS: Address = address!("000000000022D473030F116dDEE9F6B43aC78BA3");

const DOMAIN_TYPE: &str = "EIP712Domain(string name,uint256 chainId,address verifyingContract)";
const PERMIT_DETAILS_TYPE: &str =
    "PermitDetails(address token,uint160 amount,uint48 expiration,uint48 nonce)";
const PERMIT_BATCH_TYPE: &str =
    "PermitBatch(PermitDetails[] details,address spender,uint256 sigDeadline)";

const PERMIT_BATCH_SIGNATURE: &str =
    "permit(address,((address,uint160,uint48,uint48)[],address,uint256),bytes)";
const APPROVE_SIGNATURE: &str = "approve(address,address,uint160,uint48)";
const ALLOWANCE_SIGNATURE: &str = "allowance(address,address,address)";

const UINT48_MAX: u64 = (1 << 48) - 1;

/// Largest `uint160` allowance.
pub fn max_uint160() -> U256 {
    (U256::from(1) << 160) - U256::from(1)
}

/// One token entry of a batch permit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermitDetails {
    pub token: Address,
    /// Allowance amount (uint160).
    pub amount: U256,
    /// Unix timestamp at which the allowance lapses (uint48).
    pub expiration: u64,
    /// Current Permit2 nonce for (owner, token, spender) (uint48).
    pub nonce: u64,
}

/// A batch permit covering several tokens for one spender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermitBatch {
    pub details: Vec<PermitDetails>,
    pub spender: Address,
    pub sig_deadline: U256,
}

/// Permit2's view of an (owner, token, spender) allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowanceState {
    pub amount: U256,
    pub expiration: u64,
    pub nonce: u64,
}

impl PermitDetails {
    fn validate(&self) -> Result<(), EthError> {
        if self.amount > max_uint160() {
            return Err(EthError::OutOfRange(format!(
                "permit amount for {} exceeds uint160",
                self.token
            )));
        }
        if self.expiration > UINT48_MAX || self.nonce > UINT48_MAX {
            return Err(EthError::OutOfRange(format!(
                "permit expiration/nonce for {} exceeds uint48",
                self.token
            )));
        }
        Ok(())
    }

    fn struct_hash(&self) -> B256 {
        keccak256(encode_params(&[
            AbiParam::FixedBytes(keccak256(PERMIT_DETAILS_TYPE)),
            AbiParam::Address(self.token),
            AbiParam::Uint(self.amount),
            AbiParam::uint(self.expiration),
            AbiParam::uint(self.nonce),
        ]))
    }

    fn to_abi(&self) -> AbiParam {
        AbiParam::Tuple(vec![
            AbiParam::Address(self.token),
            AbiParam::Uint(self.amount),
            AbiParam::uint(self.expiration),
            AbiParam::uint(self.nonce),
        ])
    }
}

impl PermitBatch {
    /// Checks the uint160/uint48 bounds of every entry.
    pub fn validate(&self) -> Result<(), EthError> {
        if self.details.is_empty() {
            return Err(EthError::OutOfRange("permit batch has no entries".into()));
        }
        self.details.iter().try_for_each(PermitDetails::validate)
    }

    /// EIP-712 `hashStruct(PermitBatch)`.
    pub fn struct_hash(&self) -> B256 {
        let mut detail_hashes = Vec::with_capacity(self.details.len() * 32);
        for detail in &self.details {
            detail_hashes.extend_from_slice(detail.struct_hash().as_slice());
        }

        let batch_type = format!("{PERMIT_BATCH_TYPE}{PERMIT_DETAILS_TYPE}");
        keccak256(encode_params(&[
            AbiParam::FixedBytes(keccak256(batch_type.as_bytes())),
            AbiParam::FixedBytes(keccak256(&detail_hashes)),
            AbiParam::Address(self.spender),
            AbiParam::Uint(self.sig_deadline),
        ]))
    }

    /// The digest the owner signs: `keccak256(0x1901 || domainSeparator || structHash)`.
    pub fn signing_hash(&self, chain_id: u64, permit2: Address) -> B256 {
        let mut payload = Vec::with_capacity(66);
        payload.extend_from_slice(&[0x19, 0x01]);
        payload.extend_from_slice(domain_separator(chain_id, permit2).as_slice());
        payload.extend_from_slice(self.struct_hash().as_slice());
        keccak256(&payload)
    }

    fn to_abi(&self) -> AbiParam {
        AbiParam::Tuple(vec![
            AbiParam::Array(self.details.iter().map(PermitDetails::to_abi).collect()),
            AbiParam::Address(self.spender),
            AbiParam::Uint(self.sig_deadline),
        ])
    }
}

/// Permit2's EIP-712 domain separator. The domain has no `version` field.
pub fn domain_separator(chain_id: u64, permit2: Address) -> B256 {
    let mut encoded = Vec::with_capacity(128);
    encoded.extend_from_slice(keccak256(DOMAIN_TYPE).as_slice());
    encoded.extend_from_slice(keccak256("Permit2").as_slice());
    encoded.extend_from_slice(&U256::from(chain_id).to_be_bytes::<32>());
    encoded.extend_from_slice(&address_word(&permit2));
    keccak256(&encoded)
}

/// Encodes `permit(address owner, PermitBatch batch, bytes signature)`.
pub fn encode_permit_batch(
    owner: Address,
    batch: &PermitBatch,
    signature: &[u8],
) -> Result<Vec<u8>, EthError> {
    batch.validate()?;
    Ok(encode_function_call(
        selector(PERMIT_BATCH_SIGNATURE),
        &[
            AbiParam::Address(owner),
            batch.to_abi(),
            AbiParam::Bytes(signature.to_vec()),
        ],
    ))
}

/// Encodes `approve(address token, address spender, uint160 amount, uint48 expiration)`,
/// the on-chain alternative to a signed permit.
pub fn encode_approve(
    token: Address,
    spender: Address,
    amount: U256,
    expiration: u64,
) -> Result<Vec<u8>, EthError> {
    PermitDetails { token, amount, expiration, nonce: 0 }.validate()?;
    Ok(encode_function_call(
        selector(APPROVE_SIGNATURE),
        &[
            AbiParam::Address(token),
            AbiParam::Address(spender),
            AbiParam::Uint(amount),
            AbiParam::uint(expiration),
        ],
    ))
}

/// Encodes `allowance(address owner, address token, address spender)`.
pub fn encode_allowance(owner: Address, token: Address, spender: Address) -> Vec<u8> {
    encode_function_call(
        selector(ALLOWANCE_SIGNATURE),
        &[
            AbiParam::Address(owner),
            AbiParam::Address(token),
            AbiParam::Address(spender),
        ],
    )
}

/// Decodes the `(uint160 amount, uint48 expiration, uint48 nonce)` result of
/// `allowance`.
pub fn decode_allowance(data: &[u8]) -> Result<AllowanceState, EthError> {
    let word = |i| {
        decode_word(data, i).ok_or_else(|| {
            EthError::DecodingError(format!(
                "allowance returned {} bytes, expected 96",
                data.len()
            ))
        })
    };

    let amount = word(0)?;
    let expiration = word(1)?;
    let nonce = word(2)?;
    Ok(AllowanceState {
        amount,
        expiration: u64::try_from(expiration)
            .map_err(|_| EthError::DecodingError("expiration exceeds u64".into()))?,
        nonce: u64::try_from(nonce)
            .map_err(|_| EthError::DecodingError("nonce exceeds u64".into()))?,
    })
}
