//! Dust collection for EVM wallets.
//!
//! Converts many small token balances into one target asset with a single
//! Universal Router program, optionally bridging the proceeds to an EVM or
//! Solana recipient through CCTP plus a relay executor.
//!
//! Components, leaf first:
//! - [`address_codec`]: chain-family detection and canonical 32-byte addresses
//! - [`relay`]: relay (gas / gas drop-off) instruction wire format and policy
//! - [`quote`]: signed execution quotes from the executor HTTP API
//! - [`swap_plan`]: router commands, inputs and pull arrays from swap legs
//! - [`permit`]: Permit2 batch authorization
//! - [`delegation`]: EIP-7702 delegation with bounded verification polling
//! - [`orchestrator`]: sequencing and final collector call submission
//!
//! Chain access goes through the [`provider`] traits; [`rpc`] implements them
//! over JSON-RPC with a local key.

pub mod address_codec;
pub mod chains;
pub mod clock;
pub mod config;
pub mod delegation;
pub mod error;
pub mod orchestrator;
pub mod params;
pub mod permit;
pub mod provider;
pub mod quote;
pub mod relay;
pub mod request;
pub mod rpc;
pub mod swap_plan;

pub use address_codec::{classify, to_canonical32, AddressFamily, CanonicalAddress};
pub use config::CollectorConfig;
pub use error::{CollectError, Phase, PhaseError};
pub use orchestrator::{CollectOrchestrator, CollectOutcome, CollectRequest, CrossChainTarget};
pub use quote::{Quote, QuoteClient};
pub use relay::{RelayInstruction, RelayInstructionSet};
pub use swap_plan::{CommandPlan, RouterVersion, SwapLeg};
