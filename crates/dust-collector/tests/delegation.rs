//! DelegationManager against an in-memory chain.

mod common;

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::U256;
use chain_eth::eip7702::designator_code;
use common::{addr, collector, eoa, ManualClock, MockChain, CHAIN_ID, NOW};
use dust_collector::config::DelegationConfig;
use dust_collector::delegation::{DelegationManager, DelegationState};
use dust_collector::CollectError;

fn manager(chain: &Arc<MockChain>, clock: &Arc<ManualClock>) -> DelegationManager {
    DelegationManager::new(DelegationConfig::default(), chain.clone(), chain.clone(), clock.clone())
}

fn chain_with_collector() -> Arc<MockChain> {
    let chain = MockChain::new(eoa());
    chain.set_code(collector(), vec![0x60, 0x80, 0x60, 0x40]);
    chain
}

// ─── already delegated ─────────────────────────────────────────────

/// What is tested: an EOA whose code pointer already targets the collector.
/// Why: re-running a collection must not send another set-code transaction.
#[tokio::test]
async fn already_delegated_sends_nothing() {
    let chain = chain_with_collector();
    chain.set_code(eoa(), designator_code(collector()));
    let clock = ManualClock::at(NOW);

    let outcome = manager(&chain, &clock).ensure_delegated(collector()).await.unwrap();

    assert_eq!(outcome.state, DelegationState::Delegated);
    assert_eq!(outcome.transactions_sent, 0);
    assert!(outcome.tx_hash.is_none());
    assert!(chain.sent().is_empty());
    assert!(chain.authorizations().is_empty());
    assert!(clock.sleeps().is_empty());
}

// ─── fresh delegation ──────────────────────────────────────────────

#[tokio::test]
async fn delegates_and_observes_pointer_on_third_poll() {
    let chain = chain_with_collector();
    chain.delegation_visible_after(Some(3));
    let clock = ManualClock::at(NOW);

    let outcome = manager(&chain, &clock).ensure_delegated(collector()).await.unwrap();

    assert_eq!(outcome.state, DelegationState::Delegated);
    assert_eq!(outcome.transactions_sent, 1);
    assert_eq!(chain.reads_since_delegation(), 3);

    let sent = chain.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, eoa());
    assert_eq!(sent[0].value, U256::ZERO);
    assert!(sent[0].data.is_empty());
    assert_eq!(sent[0].authorization_list.len(), 1);

    let auths = chain.authorizations();
    assert_eq!(auths[0].address, collector());
    assert_eq!(auths[0].chain_id, U256::from(CHAIN_ID));
    // The carrying transaction uses nonce 7, so the authorization needs 8.
    assert_eq!(auths[0].nonce, 8);

    // settle, then one interval between each of the three polls
    assert_eq!(
        clock.sleeps(),
        vec![Duration::from_secs(3), Duration::from_secs(2), Duration::from_secs(2)]
    );
}

/// What is tested: an EOA delegated to some other contract.
/// Why: the pointer must be replaced, not mistaken for a match.
#[tokio::test]
async fn foreign_delegation_is_replaced() {
    let chain = chain_with_collector();
    chain.set_code(eoa(), designator_code(addr(0x99)));
    chain.delegation_visible_after(Some(1));
    let clock = ManualClock::at(NOW);

    let outcome = manager(&chain, &clock).ensure_delegated(collector()).await.unwrap();

    assert_eq!(outcome.state, DelegationState::Delegated);
    assert_eq!(outcome.transactions_sent, 1);
}

// ─── failures ──────────────────────────────────────────────────────

/// What is tested: the pointer never appears.
/// Why: polling is bounded to exactly `max_attempts` reads, then fails.
#[tokio::test]
async fn never_observed_times_out_after_five_polls() {
    let chain = chain_with_collector();
    chain.delegation_visible_after(None);
    let clock = ManualClock::at(NOW);

    let err = manager(&chain, &clock).ensure_delegated(collector()).await.unwrap_err();

    match err {
        CollectError::DelegationVerificationTimeout { target, attempts } => {
            assert_eq!(target, collector());
            assert_eq!(attempts, 5);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(chain.reads_since_delegation(), 5);
    // One pre-check read plus five polls.
    assert_eq!(chain.code_reads(eoa()), 6);
    // Settle delay plus four inter-poll intervals; no sleep after the last poll.
    assert_eq!(clock.sleeps().len(), 5);
    assert_eq!(chain.sent().len(), 1);
}

#[tokio::test]
async fn max_attempts_is_configurable() {
    let chain = chain_with_collector();
    let clock = ManualClock::at(NOW);
    let config = DelegationConfig { max_attempts: 2, ..DelegationConfig::default() };
    let manager = DelegationManager::new(config, chain.clone(), chain.clone(), clock.clone());

    let err = manager.ensure_delegated(collector()).await.unwrap_err();

    assert!(matches!(err, CollectError::DelegationVerificationTimeout { attempts: 2, .. }));
    assert_eq!(chain.reads_since_delegation(), 2);
}

/// What is tested: delegating to an address with no code.
/// Why: a pointer to empty code would brick batched execution; nothing may be sent.
#[tokio::test]
async fn target_without_code_is_rejected_before_sending() {
    let chain = MockChain::new(eoa());
    let clock = ManualClock::at(NOW);

    let err = manager(&chain, &clock).ensure_delegated(collector()).await.unwrap_err();

    assert!(matches!(err, CollectError::InvalidDelegationTarget(t) if t == collector()));
    assert!(chain.sent().is_empty());
    assert!(chain.authorizations().is_empty());
}

#[tokio::test]
async fn rejected_authorization_sends_nothing() {
    let chain = chain_with_collector();
    chain.reject_signatures();
    let clock = ManualClock::at(NOW);

    let err = manager(&chain, &clock).ensure_delegated(collector()).await.unwrap_err();

    assert!(matches!(err, CollectError::SignatureRejected(_)));
    assert!(chain.sent().is_empty());
}

#[tokio::test]
async fn reverted_delegation_transaction_is_surfaced() {
    let chain = chain_with_collector();
    chain.revert_sends();
    let clock = ManualClock::at(NOW);

    let err = manager(&chain, &clock).ensure_delegated(collector()).await.unwrap_err();

    assert!(matches!(err, CollectError::Reverted(_)));
    assert!(clock.sleeps().is_empty());
}
