//! Collector configuration.
//!
//! Every tunable has a default matching the production deployment. Values
//! can come from a TOML file and are then overlaid with environment-style
//! variables through an injected lookup, so tests never mutate process state.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use alloy_primitives::{Address, B256};
use chain_eth::PERMIT2_ADDRESS;
use serde::{Deserialize, Serialize};

use crate::error::CollectError;

/// Relay instruction layout for cross-chain delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Gas drop-off to the recipient plus an auxiliary gas instruction.
    Drop,
    /// A single gas instruction.
    Gas,
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drop" => Ok(ExecutionMode::Drop),
            "gas" => Ok(ExecutionMode::Gas),
            other => Err(format!("expected `drop` or `gas`, got `{other}`")),
        }
    }
}

/// How the collector obtains the right to pull the wallet's tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizationMode {
    /// Delegation when the wallet supports batched calls, Permit2 otherwise.
    Auto,
    Permit2,
    Delegation,
}

impl FromStr for AuthorizationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(AuthorizationMode::Auto),
            "permit2" => Ok(AuthorizationMode::Permit2),
            "delegation" | "7702" => Ok(AuthorizationMode::Delegation),
            other => Err(format!("expected `auto`, `permit2` or `delegation`, got `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub mode: ExecutionMode,
    /// Drop-off amount for EVM destinations.
    #[serde(with = "wide_int")]
    pub evm_gas_drop: u128,
    /// Drop-off amount (lamports) for Solana.
    #[serde(with = "wide_int")]
    pub solana_gas_drop: u128,
    /// Compute allowance for Solana.
    #[serde(with = "wide_int")]
    pub solana_gas_limit: u128,
    /// `msgValue` funding Solana compute.
    #[serde(with = "wide_int")]
    pub solana_msg_value: u128,
    /// Gas limit for EVM destinations in gas mode.
    #[serde(with = "wide_int")]
    pub evm_gas_limit: u128,
    /// Auxiliary gas limit for EVM destinations in drop mode.
    #[serde(with = "wide_int")]
    pub evm_drop_gas_limit: u128,
    /// Reject unknown destination chains instead of assuming EVM.
    pub strict_destination_chains: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Drop,
            evm_gas_drop: 1_000_000,
            solana_gas_drop: 500_000,
            solana_gas_limit: 1_000_000,
            solana_msg_value: 5_000_000,
            evm_gas_limit: 200_000,
            evm_drop_gas_limit: 400_000,
            strict_destination_chains: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteConfig {
    pub executor_base_url: String,
    pub timeout_secs: u64,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            executor_base_url: "https://executor.labsapis.com".to_string(),
            timeout_secs: 30,
        }
    }
}

impl QuoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// CCTP and executor-fee arguments forwarded to the collector contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub destination_caller: B256,
    #[serde(with = "wide_int")]
    pub max_fee: u128,
    pub min_finality_threshold: u32,
    pub fee_dbps: u16,
    pub fee_payee: Address,
    /// Mint whose associated token account receives funds on Solana.
    pub solana_usdc_mint: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            destination_caller: B256::ZERO,
            max_fee: 100,
            min_finality_threshold: 0,
            fee_dbps: 0,
            fee_payee: Address::ZERO,
            solana_usdc_mint: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermitConfig {
    pub permit2: Address,
    pub expiration_secs: u64,
    pub sig_deadline_secs: u64,
}

impl Default for PermitConfig {
    fn default() -> Self {
        Self {
            permit2: PERMIT2_ADDRESS,
            expiration_secs: 30 * 24 * 60 * 60,
            sig_deadline_secs: 60 * 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelegationConfig {
    pub settle_delay_ms: u64,
    pub max_attempts: u32,
    pub poll_interval_ms: u64,
}

impl Default for DelegationConfig {
    fn default() -> Self {
        Self { settle_delay_ms: 3_000, max_attempts: 5, poll_interval_ms: 2_000 }
    }
}

impl DelegationConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectConfig {
    /// The dust-collector contract (also the EIP-7702 delegation target).
    pub collector: Address,
    pub deadline_secs: u64,
    pub authorization: AuthorizationMode,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            collector: Address::ZERO,
            deadline_secs: 30 * 60,
            authorization: AuthorizationMode::Auto,
        }
    }
}

/// Complete collector configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub relay: RelayConfig,
    pub quote: QuoteConfig,
    pub bridge: BridgeConfig,
    pub permit: PermitConfig,
    pub delegation: DelegationConfig,
    pub collect: CollectConfig,
}

impl CollectorConfig {
    /// Parses a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, CollectError> {
        toml::from_str(source).map_err(|e| CollectError::Config(format!("invalid TOML: {e}")))
    }

    /// Loads an optional TOML file, then applies the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, CollectError> {
        let mut config = match path {
            Some(path) => {
                let source = std::fs::read_to_string(path).map_err(|e| {
                    CollectError::Config(format!("failed to read {}: {e}", path.display()))
                })?;
                Self::from_toml_str(&source)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overlays variables resolved through `lookup` onto this configuration.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), CollectError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvSource { lookup };

        env.set("EXECUTION_MODE", &mut self.relay.mode)?;
        env.set("GAS_DROP_LIMIT", &mut self.relay.evm_gas_drop)?;
        env.set("SOLANA_GAS_DROP", &mut self.relay.solana_gas_drop)?;
        env.set("SOLANA_GAS_LIMIT", &mut self.relay.solana_gas_limit)?;
        env.set("SOLANA_MSG_VALUE", &mut self.relay.solana_msg_value)?;
        env.set("EVM_GAS_LIMIT", &mut self.relay.evm_gas_limit)?;
        env.set("EVM_DROP_GAS_LIMIT", &mut self.relay.evm_drop_gas_limit)?;
        env.set("STRICT_DESTINATION_CHAINS", &mut self.relay.strict_destination_chains)?;

        env.set("EXECUTOR_API", &mut self.quote.executor_base_url)?;
        env.set("QUOTE_TIMEOUT_SECS", &mut self.quote.timeout_secs)?;

        env.set("DESTINATION_CALLER", &mut self.bridge.destination_caller)?;
        env.set("MAX_FEE", &mut self.bridge.max_fee)?;
        env.set("MIN_FINALITY_THRESHOLD", &mut self.bridge.min_finality_threshold)?;
        env.set("FEE_DBPS", &mut self.bridge.fee_dbps)?;
        env.set("FEE_PAYEE", &mut self.bridge.fee_payee)?;
        env.set("SOLANA_USDC_MINT", &mut self.bridge.solana_usdc_mint)?;

        env.set("PERMIT2_ADDRESS", &mut self.permit.permit2)?;
        env.set("PERMIT_EXPIRATION_SECS", &mut self.permit.expiration_secs)?;
        env.set("PERMIT_SIG_DEADLINE_SECS", &mut self.permit.sig_deadline_secs)?;

        env.set("DELEGATION_SETTLE_MS", &mut self.delegation.settle_delay_ms)?;
        env.set("DELEGATION_MAX_ATTEMPTS", &mut self.delegation.max_attempts)?;
        env.set("DELEGATION_POLL_INTERVAL_MS", &mut self.delegation.poll_interval_ms)?;

        env.set("COLLECTOR_ADDRESS", &mut self.collect.collector)?;
        env.set("COLLECT_DEADLINE_SECS", &mut self.collect.deadline_secs)?;
        env.set("AUTHORIZATION_MODE", &mut self.collect.authorization)?;

        Ok(())
    }

    /// Checks values that have no usable default.
    pub fn validate(&self) -> Result<(), CollectError> {
        if self.collect.collector == Address::ZERO {
            return Err(CollectError::Config(
                "collector address is not set (COLLECTOR_ADDRESS)".into(),
            ));
        }
        if self.quote.executor_base_url.trim().is_empty() {
            return Err(CollectError::Config("executor base URL is empty".into()));
        }
        if self.quote.timeout_secs == 0 {
            return Err(CollectError::Config("quote timeout must be positive".into()));
        }
        if self.delegation.max_attempts == 0 {
            return Err(CollectError::Config("delegation max attempts must be at least 1".into()));
        }
        Ok(())
    }
}

/// `now + secs` for a configured offset; overflow is a `Config` error naming `key`.
pub(crate) fn seconds_after(now: u64, secs: u64, key: &str) -> Result<u64, CollectError> {
    now.checked_add(secs)
        .ok_or_else(|| CollectError::Config(format!("{key} of {secs}s overflows the timestamp")))
}

/// TOML integers stop at `i64`, so `u128` fields also accept a decimal string.
mod wide_int {
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Int(u64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Int(value) => Ok(u128::from(value)),
            Repr::Text(text) => text
                .trim()
                .parse()
                .map_err(|e| de::Error::custom(format!("invalid integer `{text}`: {e}"))),
        }
    }

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        match i64::try_from(*value) {
            Ok(small) => serializer.serialize_i64(small),
            Err(_) => serializer.serialize_str(&value.to_string()),
        }
    }
}

struct EnvSource<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvSource<F> {
    fn set<T>(&self, key: &str, slot: &mut T) -> Result<(), CollectError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let Some(raw) = (self.lookup)(key) else {
            return Ok(());
        };
        *slot = raw
            .trim()
            .parse()
            .map_err(|e| CollectError::Config(format!("invalid value for {key}: {e}")))?;
        Ok(())
    }
}
