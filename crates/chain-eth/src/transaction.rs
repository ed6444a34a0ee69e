use alloy_primitives::{keccak256, Address, B256, U256};
use alloy_rlp::{Encodable, Header};

use crate::eip7702::SignedAuthorization;
use crate::error::EthError;
use crate::signer::{LocalSigner, RecoverableSignature};

/// EIP-1559 transaction type byte.
pub const EIP1559_TX_TYPE: u8 = 0x02;

/// EIP-7702 (set-code) transaction type byte.
pub const EIP7702_TX_TYPE: u8 = 0x04;

/// An unsigned dynamic-fee transaction.
///
/// With an empty `authorization_list` this is an EIP-1559 (type 2)
/// transaction; otherwise it is an EIP-7702 (type 4) transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthTransaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub max_priority_fee_per_gas: u128,
    pub max_fee_per_gas: u128,
    pub gas_limit: u64,
    pub to: Address,
    pub value: U256,
    pub data: Vec<u8>,
    pub authorization_list: Vec<SignedAuthorization>,
}

/// A signed transaction ready for `eth_sendRawTransaction`.
#[derive(Debug, Clone)]
pub struct SignedEthTransaction {
    /// Type byte followed by the RLP-encoded signed fields.
    pub raw_tx: Vec<u8>,
    pub tx_hash: B256,
}

impl EthTransaction {
    pub fn tx_type(&self) -> u8 {
        if self.authorization_list.is_empty() {
            EIP1559_TX_TYPE
        } else {
            EIP7702_TX_TYPE
        }
    }

    /// The payload whose keccak256 is signed: `type || rlp(unsigned fields)`.
    pub fn signing_payload(&self) -> Vec<u8> {
        self.encode_typed(None)
    }

    /// Signs the transaction and returns the raw envelope and its hash.
    ///
    /// The signing process:
    /// 1. RLP-encode the unsigned fields behind the type byte.
    /// 2. Keccak-256 the payload and sign it with the local key.
    /// 3. Re-encode with `y_parity`, `r`, `s` appended.
    pub fn sign(&self, signer: &LocalSigner) -> Result<SignedEthTransaction, EthError> {
        let hash = keccak256(self.signing_payload());
        let signature = signer.sign_hash(&hash)?;

        let raw_tx = self.encode_typed(Some(&signature));
        let tx_hash = keccak256(&raw_tx);
        Ok(SignedEthTransaction { raw_tx, tx_hash })
    }

    fn encode_typed(&self, signature: Option<&RecoverableSignature>) -> Vec<u8> {
        let mut fields = Vec::new();
        self.chain_id.encode(&mut fields);
        self.nonce.encode(&mut fields);
        self.max_priority_fee_per_gas.encode(&mut fields);
        self.max_fee_per_gas.encode(&mut fields);
        self.gas_limit.encode(&mut fields);
        self.to.encode(&mut fields);
        self.value.encode(&mut fields);
        self.data.as_slice().encode(&mut fields);
        // Empty access list.
        fields.push(alloy_rlp::EMPTY_LIST_CODE);

        if self.tx_type() == EIP7702_TX_TYPE {
            alloy_rlp::encode_list::<_, SignedAuthorization>(&self.authorization_list, &mut fields);
        }

        if let Some(sig) = signature {
            (sig.y_parity as u8).encode(&mut fields);
            sig.r.encode(&mut fields);
            sig.s.encode(&mut fields);
        }

        let mut out = Vec::with_capacity(fields.len() + 4);
        out.push(self.tx_type());
        Header { list: true, payload_length: fields.len() }.encode(&mut out);
        out.extend_from_slice(&fields);
        out
    }
}
