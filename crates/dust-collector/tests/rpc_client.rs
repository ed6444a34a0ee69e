//! JSON-RPC adapter against a mocked node.

mod common;

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use chain_eth::LocalSigner;
use common::{ManualClock, NOW};
use dust_collector::provider::{ChainReader, ProviderError, TxRequest, Wallet};
use dust_collector::rpc::{JsonRpcClient, RpcWallet};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Well-known test private key (DO NOT use on mainnet).
const TEST_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

async fn mount_result(server: &MockServer, rpc_method: &str, result: Value) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": rpc_method })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": result,
        })))
        .mount(server)
        .await;
}

fn client(server: &MockServer) -> Arc<JsonRpcClient> {
    Arc::new(JsonRpcClient::new(&server.uri(), Duration::from_secs(5)).unwrap())
}

// ─── reader ────────────────────────────────────────────────────────

#[tokio::test]
async fn reads_chain_state() {
    let server = MockServer::start().await;
    mount_result(&server, "eth_chainId", json!("0x2105")).await;
    mount_result(&server, "eth_getCode", json!(format!("0xef0100{}", "aa".repeat(20)))).await;
    mount_result(&server, "eth_getTransactionCount", json!("0x1f")).await;
    mount_result(&server, "eth_call", json!(format!("0x{}", "00".repeat(31) + "2a"))).await;

    let rpc = client(&server);
    assert_eq!(rpc.chain_id().await.unwrap(), 8453);
    // cached after the first lookup
    assert_eq!(rpc.chain_id().await.unwrap(), 8453);

    let code = rpc.get_code(Address::repeat_byte(1)).await.unwrap();
    assert_eq!(
        chain_eth::delegation_target(&code),
        Some(Address::repeat_byte(0xaa))
    );
    assert_eq!(rpc.transaction_count(Address::repeat_byte(1)).await.unwrap(), 31);

    let data = rpc.call(Address::repeat_byte(2), vec![0x12, 0x34]).await.unwrap();
    assert_eq!(U256::from_be_slice(&data), U256::from(42));

    let chain_id_calls = server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| String::from_utf8_lossy(&r.body).contains("eth_chainId"))
        .count();
    assert_eq!(chain_id_calls, 1);
}

#[tokio::test]
async fn rpc_errors_are_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32000, "message": "execution reverted" },
        })))
        .mount(&server)
        .await;

    let err = client(&server).call(Address::ZERO, Vec::new()).await.unwrap_err();
    match err {
        ProviderError::Rpc { code, message } => {
            assert_eq!(code, -32000);
            assert_eq!(message, "execution reverted");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn http_errors_are_transport_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(502)).mount(&server).await;

    let err = client(&server).chain_id().await.unwrap_err();
    assert!(matches!(err, ProviderError::Transport(_)));
}

// ─── wallet ────────────────────────────────────────────────────────

/// What is tested: the full send path.
/// Why: nonce, gas, fees and the raw envelope all come from the node.
#[tokio::test]
async fn sends_signed_raw_transaction() {
    let server = MockServer::start().await;
    let tx_hash = B256::repeat_byte(0x42);
    mount_result(&server, "eth_chainId", json!("0x2105")).await;
    mount_result(&server, "eth_getTransactionCount", json!("0x3")).await;
    mount_result(&server, "eth_estimateGas", json!("0x186a0")).await;
    mount_result(&server, "eth_getBlockByNumber", json!({ "baseFeePerGas": "0x3b9aca00" })).await;
    mount_result(&server, "eth_maxPriorityFeePerGas", json!("0x5f5e100")).await;
    mount_result(&server, "eth_sendRawTransaction", json!(tx_hash)).await;

    let wallet = RpcWallet::new(
        client(&server),
        LocalSigner::from_hex(TEST_KEY).unwrap(),
        ManualClock::at(NOW),
    );
    let hash = wallet
        .send_transaction(TxRequest::call(Address::repeat_byte(0x33), vec![0xab]))
        .await
        .unwrap();
    assert_eq!(hash, tx_hash);

    let requests = server.received_requests().await.unwrap_or_default();
    let raw = requests
        .iter()
        .map(|r| serde_json::from_slice::<Value>(&r.body).unwrap())
        .find(|body| body["method"] == "eth_sendRawTransaction")
        .unwrap();
    let raw_hex = raw["params"][0].as_str().unwrap();
    // EIP-1559 envelope
    assert!(raw_hex.starts_with("0x02"));
}

#[tokio::test]
async fn receipt_status_maps_to_success() {
    let server = MockServer::start().await;
    let tx_hash = B256::repeat_byte(0x42);
    mount_result(
        &server,
        "eth_getTransactionReceipt",
        json!({ "transactionHash": tx_hash, "status": "0x0", "blockNumber": "0x10" }),
    )
    .await;

    let wallet = RpcWallet::new(
        client(&server),
        LocalSigner::from_hex(TEST_KEY).unwrap(),
        ManualClock::at(NOW),
    );
    let receipt = wallet.wait_for_receipt(tx_hash).await.unwrap();

    assert!(!receipt.success);
    assert_eq!(receipt.block_number, Some(16));
    assert_eq!(receipt.tx_hash, tx_hash);
}

#[tokio::test]
async fn missing_receipt_times_out_after_bounded_polls() {
    let server = MockServer::start().await;
    mount_result(&server, "eth_getTransactionReceipt", Value::Null).await;

    let clock = ManualClock::at(NOW);
    let wallet = RpcWallet::new(
        client(&server),
        LocalSigner::from_hex(TEST_KEY).unwrap(),
        clock.clone(),
    )
    .with_receipt_polling(Duration::from_secs(1), 3);

    let err = wallet.wait_for_receipt(B256::ZERO).await.unwrap_err();

    assert!(matches!(err, ProviderError::Timeout(_)));
    assert_eq!(clock.sleeps().len(), 3);
    assert_eq!(server.received_requests().await.unwrap_or_default().len(), 3);
}
