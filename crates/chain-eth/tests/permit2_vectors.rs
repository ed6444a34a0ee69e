//! Permit2 typed data and calldata checked against `sol!`-generated bindings.

use alloy_primitives::aliases::{U160, U48};
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{eip712_domain, SolCall, SolStruct};
use chain_eth::permit2::{self, domain_separator, max_uint160};
use chain_eth::{PermitBatch, PermitDetails, PERMIT2_ADDRESS};

mod reference {
    alloy_sol_types::sol! {
        struct PermitDetails {
            address token;
            uint160 amount;
            uint48 expiration;
            uint48 nonce;
        }

        struct PermitBatch {
            PermitDetails[] details;
            address spender;
            uint256 sigDeadline;
        }

        function permit(address owner, PermitBatch permitBatch, bytes signature);
        function approve(address token, address spender, uint160 amount, uint48 expiration);
        function allowance(address user, address token, address spender);
    }
}

const CHAIN_ID: u64 = 8453;

fn batch() -> PermitBatch {
    PermitBatch {
        details: vec![
            PermitDetails {
                token: Address::repeat_byte(0xa1),
                amount: U256::from(1_000_000u64),
                expiration: 1_702_592_000,
                nonce: 4,
            },
            PermitDetails {
                token: Address::repeat_byte(0xb2),
                amount: U256::from(100_000_000_000_000_000u64),
                expiration: 1_702_592_000,
                nonce: 9,
            },
        ],
        spender: Address::repeat_byte(0xc0),
        sig_deadline: U256::from(1_700_003_600u64),
    }
}

fn reference_batch(batch: &PermitBatch) -> reference::PermitBatch {
    reference::PermitBatch {
        details: batch
            .details
            .iter()
            .map(|d| reference::PermitDetails {
                token: d.token,
                amount: U160::from(d.amount),
                expiration: U48::from(d.expiration),
                nonce: U48::from(d.nonce),
            })
            .collect(),
        spender: batch.spender,
        sigDeadline: batch.sig_deadline,
    }
}

#[test]
fn domain_separator_matches_eip712_domain() {
    let domain = eip712_domain! {
        name: "Permit2",
        chain_id: CHAIN_ID,
        verifying_contract: PERMIT2_ADDRESS,
    };
    assert_eq!(domain_separator(CHAIN_ID, PERMIT2_ADDRESS), domain.separator());
}

#[test]
fn batch_hashes_match_typed_struct() {
    let batch = batch();
    let typed = reference_batch(&batch);
    let domain = eip712_domain! {
        name: "Permit2",
        chain_id: CHAIN_ID,
        verifying_contract: PERMIT2_ADDRESS,
    };

    assert_eq!(batch.struct_hash(), typed.eip712_hash_struct());
    assert_eq!(
        batch.signing_hash(CHAIN_ID, PERMIT2_ADDRESS),
        typed.eip712_signing_hash(&domain)
    );
}

#[test]
fn permit_calldata_matches_abi_encoding() {
    let batch = batch();
    let owner = Address::repeat_byte(0xe0);
    let signature = vec![0x5a; 65];

    let ours = permit2::encode_permit_batch(owner, &batch, &signature).unwrap();
    let expected = reference::permitCall {
        owner,
        permitBatch: reference_batch(&batch),
        signature: Bytes::from(signature),
    }
    .abi_encode();

    assert_eq!(ours, expected);
    assert_eq!(ours.len(), 612);
}

#[test]
fn approve_calldata_matches_abi_encoding() {
    let token = Address::repeat_byte(0xa1);
    let spender = Address::repeat_byte(0xc0);

    let ours = permit2::encode_approve(token, spender, max_uint160(), 1_702_592_000).unwrap();
    let expected = reference::approveCall {
        token,
        spender,
        amount: U160::MAX,
        expiration: U48::from(1_702_592_000u64),
    }
    .abi_encode();

    assert_eq!(ours, expected);
}

#[test]
fn allowance_calldata_matches_abi_encoding() {
    let user = Address::repeat_byte(0xe0);
    let token = Address::repeat_byte(0xa1);
    let spender = Address::repeat_byte(0xc0);

    let expected = reference::allowanceCall { user, token, spender }.abi_encode();
    assert_eq!(permit2::encode_allowance(user, token, spender), expected);
}
