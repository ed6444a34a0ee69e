//! Universal Router programs built from swap legs.
//!
//! A plan is a flat, ordered list: one command byte and one ABI-encoded
//! input per leg, plus an optional trailing unwrap. Multi-hop routes live
//! entirely inside each leg's path encoding.

use alloy_primitives::{Address, U256};
use chain_eth::router::{
    encode_unwrap_weth, encode_v2_exact_in, encode_v3_exact_in, encode_v3_path, UNWRAP_WETH,
    V2_SWAP_EXACT_IN, V3_SWAP_EXACT_IN,
};
use tracing::debug;

use crate::error::CollectError;

/// Largest decimals value an ERC-20 can meaningfully report for a `uint256`.
const MAX_DECIMALS: u8 = 77;

/// Which Uniswap pool generation a leg routes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterVersion {
    V2,
    V3,
}

impl RouterVersion {
    pub fn command(self) -> u8 {
        match self {
            RouterVersion::V2 => V2_SWAP_EXACT_IN,
            RouterVersion::V3 => V3_SWAP_EXACT_IN,
        }
    }
}

/// One token to sweep and the route that converts it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapLeg {
    pub token: Address,
    pub decimals: u8,
    /// Amount in whole-token units, e.g. `"0.1"`.
    pub amount: String,
    /// `amount` scaled by `10^decimals`.
    pub amount_wei: U256,
    /// Route tokens, starting with `token`.
    pub route: Vec<Address>,
    /// One fee tier per V3 hop. Empty for V2.
    pub fee_tiers: Vec<u32>,
    pub version: RouterVersion,
}

impl SwapLeg {
    /// Validates a leg and computes its wei amount.
    ///
    /// # Parameters
    ///
    /// - `token`: The token swept by this leg.
    /// - `decimals`: Token decimals.
    /// - `amount`: Positive decimal amount in whole tokens.
    /// - `route`: Route tokens, input first. Must start with `token`.
    /// - `fee_tiers`: Fee tier per hop for V3; ignored for V2.
    /// - `version`: Router version of the route.
    pub fn new(
        token: Address,
        decimals: u8,
        amount: &str,
        route: Vec<Address>,
        fee_tiers: Vec<u32>,
        version: RouterVersion,
    ) -> Result<Self, CollectError> {
        let amount_wei = parse_units(amount, decimals)?;
        if amount_wei.is_zero() {
            return Err(CollectError::InvalidAmount(format!("amount for {token} is zero")));
        }

        if route.len() < 2 {
            return Err(CollectError::InvalidSwapLeg(format!(
                "route for {token} needs at least 2 tokens, got {}",
                route.len()
            )));
        }
        if route[0] != token {
            return Err(CollectError::InvalidSwapLeg(format!(
                "route for {token} starts at {}",
                route[0]
            )));
        }

        let fee_tiers = match version {
            RouterVersion::V3 => {
                // Surface path shape errors at construction rather than at build time.
                encode_v3_path(&route, &fee_tiers)?;
                fee_tiers
            }
            RouterVersion::V2 => Vec::new(),
        };

        Ok(Self {
            token,
            decimals,
            amount: amount.trim().to_string(),
            amount_wei,
            route,
            fee_tiers,
            version,
        })
    }

    /// Encodes this leg's router input with `recipient` receiving the output.
    /// `amountOutMin` is always zero and the payer is the router's caller.
    fn encode_input(&self, recipient: Address) -> Result<Vec<u8>, CollectError> {
        let input = match self.version {
            RouterVersion::V3 => {
                let path = encode_v3_path(&self.route, &self.fee_tiers)?;
                encode_v3_exact_in(recipient, self.amount_wei, U256::ZERO, &path, false)
            }
            RouterVersion::V2 => {
                encode_v2_exact_in(recipient, self.amount_wei, U256::ZERO, &self.route, false)?
            }
        };
        Ok(input)
    }
}

/// Parses a decimal string into base units.
///
/// Fractional digits beyond `decimals` are accepted only when they are zero;
/// anything else would silently lose value.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256, CollectError> {
    let invalid = |reason: &str| CollectError::InvalidAmount(format!("{amount:?}: {reason}"));

    if decimals > MAX_DECIMALS {
        return Err(invalid("too many token decimals"));
    }
    let amount_str = amount.trim();
    let (whole, fraction) = match amount_str.split_once('.') {
        Some((w, f)) => (w, f),
        None => (amount_str, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid("empty amount"));
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid("not a non-negative decimal number"));
    }

    let scale = decimals as usize;
    let (kept, dropped) = fraction.split_at(fraction.len().min(scale));
    if dropped.chars().any(|c| c != '0') {
        return Err(invalid("more fractional digits than the token has decimals"));
    }

    let digits = format!("{whole}{kept:0<scale$}");
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 10).map_err(|_| invalid("exceeds uint256"))
}

/// The router program and the tokens the collector pulls to fund it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPlan {
    /// One opcode byte per command, in execution order.
    pub commands: Vec<u8>,
    /// ABI-encoded input per command.
    pub inputs: Vec<Vec<u8>>,
    pub pull_tokens: Vec<Address>,
    pub pull_amounts: Vec<U256>,
}

/// Builds the router program for `legs`.
///
/// # Parameters
///
/// - `legs`: Swap legs, executed in order.
/// - `router_recipient`: Receives every swap's output (the collector
///   contract, or the EOA itself when delegated).
/// - `finalize_to_native`: Append an unwrap of the router's WETH balance to
///   `router_recipient`.
pub fn build(
    legs: &[SwapLeg],
    router_recipient: Address,
    finalize_to_native: bool,
) -> Result<CommandPlan, CollectError> {
    if legs.is_empty() {
        return Err(CollectError::InvalidSwapLeg("no swap legs to collect".into()));
    }

    let mut plan = CommandPlan {
        commands: Vec::with_capacity(legs.len() + 1),
        inputs: Vec::with_capacity(legs.len() + 1),
        pull_tokens: Vec::with_capacity(legs.len()),
        pull_amounts: Vec::with_capacity(legs.len()),
    };

    for leg in legs {
        plan.commands.push(leg.version.command());
        plan.inputs.push(leg.encode_input(router_recipient)?);
        plan.pull_tokens.push(leg.token);
        plan.pull_amounts.push(leg.amount_wei);
    }

    if finalize_to_native {
        plan.commands.push(UNWRAP_WETH);
        plan.inputs.push(encode_unwrap_weth(router_recipient, U256::ZERO));
    }

    debug!(
        commands = %hex::encode(&plan.commands),
        legs = legs.len(),
        finalize_to_native,
        "built router plan"
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn v3_leg(byte: u8, decimals: u8, amount: &str) -> SwapLeg {
        SwapLeg::new(
            token(byte),
            decimals,
            amount,
            vec![token(byte), token(0xee)],
            vec![3000],
            RouterVersion::V3,
        )
        .unwrap()
    }

    #[test]
    fn parse_units_scales_amounts() {
        assert_eq!(parse_units("1", 6).unwrap(), U256::from(1_000_000u64));
        assert_eq!(parse_units("0.1", 18).unwrap(), U256::from(100_000_000_000_000_000u64));
        assert_eq!(parse_units("12.345", 3).unwrap(), U256::from(12_345u64));
        assert_eq!(parse_units(".5", 1).unwrap(), U256::from(5u64));
        assert_eq!(parse_units("7.", 0).unwrap(), U256::from(7u64));
        assert_eq!(parse_units("1.500", 1).unwrap(), U256::from(15u64));
        assert_eq!(parse_units("0", 18).unwrap(), U256::ZERO);
    }

    #[test]
    fn parse_units_rejects_malformed_amounts() {
        for bad in ["", ".", "-1", "1e6", "1,5", "abc", "1.2.3", "0x10"] {
            let err = parse_units(bad, 6).unwrap_err();
            assert!(matches!(err, CollectError::InvalidAmount(_)), "{bad}");
        }
        assert!(parse_units("0.0000001", 6).is_err());
        assert!(parse_units("1", 78).is_err());
        assert!(parse_units(&"9".repeat(80), 0).is_err());
    }

    #[test]
    fn two_v3_legs() {
        let legs = [v3_leg(0xaa, 6, "1"), v3_leg(0xbb, 18, "0.1")];
        let plan = build(&legs, token(0xcc), false).unwrap();

        assert_eq!(plan.commands, vec![V3_SWAP_EXACT_IN, V3_SWAP_EXACT_IN]);
        assert_eq!(plan.inputs.len(), 2);
        assert_eq!(plan.pull_tokens, vec![token(0xaa), token(0xbb)]);
        assert_eq!(
            plan.pull_amounts,
            vec![U256::from(1_000_000u64), U256::from(100_000_000_000_000_000u64)]
        );
    }

    #[test]
    fn finalize_to_native_appends_one_unwrap_without_pull_entry() {
        let legs = [v3_leg(0xaa, 6, "1"), v3_leg(0xbb, 18, "0.1")];
        let plan = build(&legs, token(0xcc), true).unwrap();

        assert_eq!(plan.commands, vec![V3_SWAP_EXACT_IN, V3_SWAP_EXACT_IN, UNWRAP_WETH]);
        assert_eq!(plan.inputs.len(), 3);
        assert_eq!(plan.pull_tokens.len(), 2);
        assert_eq!(plan.pull_amounts.len(), 2);
        assert_eq!(plan.inputs[2], encode_unwrap_weth(token(0xcc), U256::ZERO));
    }

    #[test]
    fn v3_input_carries_recipient_amount_and_zero_minimum() {
        let leg = v3_leg(0xaa, 6, "2.5");
        let plan = build(std::slice::from_ref(&leg), token(0xcc), false).unwrap();
        let input = &plan.inputs[0];

        assert_eq!(&input[12..32], token(0xcc).as_slice());
        assert_eq!(U256::from_be_slice(&input[32..64]), U256::from(2_500_000u64));
        assert_eq!(&input[64..96], &[0u8; 32]);
        // payerIsUser = false
        assert_eq!(&input[128..160], &[0u8; 32]);
    }

    #[test]
    fn mixed_versions_keep_input_order() {
        let v2 = SwapLeg::new(
            token(0xbb),
            18,
            "3",
            vec![token(0xbb), token(0xdd), token(0xee)],
            vec![500, 3000],
            RouterVersion::V2,
        )
        .unwrap();
        assert!(v2.fee_tiers.is_empty());

        let legs = [v3_leg(0xaa, 6, "1"), v2.clone()];
        let plan = build(&legs, token(0xcc), false).unwrap();
        assert_eq!(plan.commands, vec![V3_SWAP_EXACT_IN, V2_SWAP_EXACT_IN]);
        assert_eq!(
            plan.inputs[1],
            encode_v2_exact_in(token(0xcc), v2.amount_wei, U256::ZERO, &v2.route, false).unwrap()
        );
    }

    #[test]
    fn leg_validation() {
        let bad_start = SwapLeg::new(
            token(1),
            18,
            "1",
            vec![token(2), token(3)],
            vec![500],
            RouterVersion::V3,
        );
        assert!(matches!(bad_start, Err(CollectError::InvalidSwapLeg(_))));

        let fee_mismatch = SwapLeg::new(
            token(1),
            18,
            "1",
            vec![token(1), token(2), token(3)],
            vec![500],
            RouterVersion::V3,
        );
        assert!(matches!(fee_mismatch, Err(CollectError::InvalidSwapLeg(_))));

        let zero = SwapLeg::new(
            token(1),
            18,
            "0.0",
            vec![token(1), token(2)],
            vec![500],
            RouterVersion::V3,
        );
        assert!(matches!(zero, Err(CollectError::InvalidAmount(_))));
    }

    #[test]
    fn empty_plan_is_rejected() {
        assert!(matches!(build(&[], token(1), true), Err(CollectError::InvalidSwapLeg(_))));
    }
}
