//! JSON request files accepted by the `dust-collect` binary.
//!
//! ```json
//! {
//!   "targetToken": "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913",
//!   "finalizeToNative": false,
//!   "arbiterFee": "0",
//!   "legs": [
//!     { "token": "0x...", "decimals": 6, "amount": "1",
//!       "route": ["0x...", "0x..."], "fees": [500], "version": "V3" }
//!   ],
//!   "crossChain": { "srcChain": 30, "dstChain": 1, "recipient": "..." }
//! }
//! ```

use std::path::Path;

use alloy_primitives::{Address, U256};
use chain_eth::address::parse_address;
use serde::Deserialize;

use crate::error::CollectError;
use crate::orchestrator::{CollectRequest, CrossChainTarget};
use crate::swap_plan::{RouterVersion, SwapLeg};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum LegVersion {
    #[serde(alias = "v2")]
    V2,
    #[serde(alias = "v3")]
    V3,
}

impl From<LegVersion> for RouterVersion {
    fn from(v: LegVersion) -> Self {
        match v {
            LegVersion::V2 => RouterVersion::V2,
            LegVersion::V3 => RouterVersion::V3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegSpec {
    pub token: String,
    pub decimals: u8,
    pub amount: String,
    pub route: Vec<String>,
    #[serde(default)]
    pub fees: Vec<u32>,
    pub version: LegVersion,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossChainSpec {
    pub src_chain: u16,
    pub dst_chain: u16,
    #[serde(default)]
    pub dst_domain: Option<u32>,
    pub recipient: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestFile {
    pub target_token: String,
    #[serde(default)]
    pub finalize_to_native: bool,
    /// Decimal wei.
    #[serde(default)]
    pub arbiter_fee: Option<String>,
    pub legs: Vec<LegSpec>,
    #[serde(default)]
    pub cross_chain: Option<CrossChainSpec>,
}

impl RequestFile {
    pub fn from_json(source: &str) -> Result<Self, CollectError> {
        serde_json::from_str(source).map_err(|e| CollectError::Config(format!("invalid request: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self, CollectError> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| CollectError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_json(&source)
    }

    /// Validates every address and amount and builds the request.
    pub fn into_request(self) -> Result<CollectRequest, CollectError> {
        let legs = self
            .legs
            .into_iter()
            .map(|leg| {
                let route = leg
                    .route
                    .iter()
                    .map(|a| parse_address(a).map_err(CollectError::from))
                    .collect::<Result<Vec<Address>, _>>()?;
                SwapLeg::new(
                    parse_address(&leg.token)?,
                    leg.decimals,
                    &leg.amount,
                    route,
                    leg.fees,
                    leg.version.into(),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let arbiter_fee = match self.arbiter_fee.as_deref().map(str::trim) {
            None | Some("") => U256::ZERO,
            Some(fee) => U256::from_str_radix(fee, 10)
                .map_err(|e| CollectError::InvalidAmount(format!("arbiter fee {fee:?}: {e}")))?,
        };

        Ok(CollectRequest {
            legs,
            target_token: parse_address(&self.target_token)?,
            finalize_to_native: self.finalize_to_native,
            cross_chain: self.cross_chain.map(|c| CrossChainTarget {
                src_chain: c.src_chain,
                dst_chain: c.dst_chain,
                dst_domain: c.dst_domain,
                recipient: c.recipient,
            }),
            arbiter_fee,
        })
    }
}
