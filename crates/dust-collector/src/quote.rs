//! Signed execution quotes from the relay executor HTTP API.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::address_codec::CanonicalAddress;
use crate::config::{QuoteConfig, RelayConfig};
use crate::error::CollectError;
use crate::relay;

/// A priced, executor-signed commitment to relay a cross-chain delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    /// Opaque executor signature payload. `None` when the executor omitted
    /// it; such a quote cannot be submitted.
    pub signed_quote: Option<Vec<u8>>,
    /// The serialized relay instructions that were quoted.
    pub relay_instructions: Vec<u8>,
    /// Native-currency cost of the delivery, in wei.
    pub estimated_cost: U256,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuoteRequest {
    src_chain: u16,
    dst_chain: u16,
    relay_instructions: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResponse {
    #[serde(default)]
    signed_quote: Option<String>,
    #[serde(default)]
    estimated_cost: Option<CostValue>,
}

/// `estimatedCost` is a decimal string; tolerate a bare JSON number too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CostValue {
    Text(String),
    Number(u64),
}

/// Client for `POST {base}/v0/quote`.
#[derive(Debug, Clone)]
pub struct QuoteClient {
    client: reqwest::Client,
    base_url: String,
    relay: RelayConfig,
}

impl QuoteClient {
    /// Creates a client whose requests are bounded by `quote.timeout_secs`.
    pub fn new(quote: QuoteConfig, relay: RelayConfig) -> Result<Self, CollectError> {
        let client = reqwest::Client::builder()
            .timeout(quote.timeout())
            .build()
            .map_err(|e| CollectError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: quote.executor_base_url.trim_end_matches('/').to_string(),
            relay,
        })
    }

    /// Builds the relay instructions for `dst_chain` and `recipient` and asks
    /// the executor to price them.
    ///
    /// # Returns
    ///
    /// `QuoteUnavailable` on transport failure, timeout, a non-2xx status or
    /// an unreadable body. Nothing is retried here.
    pub async fn request_quote(
        &self,
        src_chain: u16,
        dst_chain: u16,
        recipient: &CanonicalAddress,
    ) -> Result<Quote, CollectError> {
        let instructions = relay::build_instructions(&self.relay, dst_chain, recipient)?;
        let relay_instructions = instructions.serialize();

        let url = format!("{}/v0/quote", self.base_url);
        let body = QuoteRequest {
            src_chain,
            dst_chain,
            relay_instructions: format!("0x{}", hex::encode(&relay_instructions)),
        };
        info!(src_chain, dst_chain, %recipient, bytes = relay_instructions.len(), "requesting quote");

        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
            warn!(error = %e, "quote request failed");
            CollectError::QuoteUnavailable { status: e.status().map(|s| s.as_u16()), body: e.to_string() }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| CollectError::QuoteUnavailable {
            status: Some(status.as_u16()),
            body: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "executor rejected quote request");
            return Err(CollectError::QuoteUnavailable { status: Some(status.as_u16()), body: text });
        }

        let parsed: QuoteResponse = serde_json::from_str(&text).map_err(|e| {
            CollectError::QuoteUnavailable {
                status: Some(status.as_u16()),
                body: format!("malformed quote response: {e}: {text}"),
            }
        })?;

        let quote = Quote {
            signed_quote: parsed
                .signed_quote
                .map(|hex| decode_hex(&hex, status.as_u16()))
                .transpose()?,
            relay_instructions,
            estimated_cost: parse_cost(parsed.estimated_cost, status.as_u16())?,
        };
        debug!(
            estimated_cost = %quote.estimated_cost,
            has_signed_quote = quote.signed_quote.is_some(),
            "quote received"
        );
        Ok(quote)
    }
}

fn decode_hex(value: &str, status: u16) -> Result<Vec<u8>, CollectError> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(digits).map_err(|e| CollectError::QuoteUnavailable {
        status: Some(status),
        body: format!("malformed signedQuote: {e}"),
    })
}

fn parse_cost(value: Option<CostValue>, status: u16) -> Result<U256, CollectError> {
    match value {
        None => Ok(U256::ZERO),
        Some(CostValue::Number(n)) => Ok(U256::from(n)),
        Some(CostValue::Text(text)) if text.trim().is_empty() => Ok(U256::ZERO),
        Some(CostValue::Text(text)) => {
            U256::from_str_radix(text.trim(), 10).map_err(|e| CollectError::QuoteUnavailable {
                status: Some(status),
                body: format!("malformed estimatedCost {text:?}: {e}"),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_is_camel_case() {
        let body = QuoteRequest { src_chain: 30, dst_chain: 1, relay_instructions: "0x01".into() };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "srcChain": 30, "dstChain": 1, "relayInstructions": "0x01" })
        );
    }

    #[test]
    fn missing_cost_defaults_to_zero() {
        assert_eq!(parse_cost(None, 200).unwrap(), U256::ZERO);
    }

    #[test]
    fn cost_accepts_decimal_strings_and_numbers() {
        let big = "123456789012345678901234567890";
        assert_eq!(
            parse_cost(Some(CostValue::Text(big.into())), 200).unwrap(),
            U256::from_str_radix(big, 10).unwrap()
        );
        assert_eq!(parse_cost(Some(CostValue::Number(42)), 200).unwrap(), U256::from(42));
        assert!(parse_cost(Some(CostValue::Text("0x10".into())), 200).is_err());
    }

    #[test]
    fn signed_quote_hex_prefix_is_optional() {
        assert_eq!(decode_hex("0xabcd", 200).unwrap(), vec![0xab, 0xcd]);
        assert_eq!(decode_hex("abcd", 200).unwrap(), vec![0xab, 0xcd]);
        assert!(decode_hex("0xzz", 200).is_err());
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = QuoteClient::new(
            QuoteConfig { executor_base_url: "http://localhost:1/".into(), timeout_secs: 1 },
            RelayConfig::default(),
        )
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:1");
    }
}
