use std::fmt;

use alloy_primitives::{Address, B256};
use thiserror::Error;

use crate::provider::ProviderError;

/// Failures of a collection request.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid swap leg: {0}")]
    InvalidSwapLeg(String),

    #[error("unsupported destination chain: {0}")]
    UnsupportedDestinationChain(u16),

    #[error("quote unavailable ({}): {body}", status_label(.status))]
    QuoteUnavailable { status: Option<u16>, body: String },

    #[error("quote has no signed quote payload")]
    MissingSignedQuote,

    #[error("allowance query failed for {token}: {reason}")]
    AllowanceQueryFailed { token: Address, reason: String },

    #[error("signature rejected: {0}")]
    SignatureRejected(String),

    #[error("invalid delegation target {0}: no contract code")]
    InvalidDelegationTarget(Address),

    #[error("failed to verify delegation to {target} after {attempts} attempts")]
    DelegationVerificationTimeout { target: Address, attempts: u32 },

    #[error("transaction {0} reverted")]
    Reverted(B256),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("config error: {0}")]
    Config(String),
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("HTTP {code}"),
        None => "no response".to_string(),
    }
}

impl From<ProviderError> for CollectError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Rejected(reason) => CollectError::SignatureRejected(reason),
            other => CollectError::Provider(other.to_string()),
        }
    }
}

impl From<chain_eth::EthError> for CollectError {
    fn from(e: chain_eth::EthError) -> Self {
        match e {
            chain_eth::EthError::InvalidAddress(msg) => CollectError::InvalidAddress(msg),
            chain_eth::EthError::InvalidPath(msg) => CollectError::InvalidSwapLeg(msg),
            other => CollectError::Encoding(other.to_string()),
        }
    }
}

impl From<chain_sol::SolError> for CollectError {
    fn from(e: chain_sol::SolError) -> Self {
        CollectError::InvalidAddress(format!("SOL: {e}"))
    }
}

/// The orchestration phase a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Planning,
    Quoting,
    Authorization,
    Delegation,
    Submission,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Planning => "planning",
            Phase::Quoting => "quoting",
            Phase::Authorization => "authorization",
            Phase::Delegation => "delegation",
            Phase::Submission => "submission",
        };
        f.write_str(name)
    }
}

/// A terminal failure tagged with the phase that produced it.
#[derive(Debug, Error)]
#[error("{phase} failed: {source}")]
pub struct PhaseError {
    pub phase: Phase,
    pub source: CollectError,
}

/// Tags a component result with its orchestration phase.
pub trait InPhase<T> {
    fn in_phase(self, phase: Phase) -> Result<T, PhaseError>;
}

impl<T, E: Into<CollectError>> InPhase<T> for Result<T, E> {
    fn in_phase(self, phase: Phase) -> Result<T, PhaseError> {
        self.map_err(|e| PhaseError { phase, source: e.into() })
    }
}
