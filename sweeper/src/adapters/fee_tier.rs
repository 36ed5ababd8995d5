//! Fee-tiered constant-product route.
//!
//! Wraps the native amount at the router and swaps it along the direct
//! `WETH -> fee -> token` path. Pools are discovered by asking the node to
//! estimate gas for the swap: a revert during estimation means there is no
//! usable pool on that tier, and the next tier is tried.

use std::fmt;

use alloy::{
    primitives::{aliases::U24, Address, Bytes, TxHash, U256},
    sol_types::SolValue,
};
use tracing::{debug, info, warn};

use super::{
    commands, encode_execute, path::encode_v3_path, wrap_eth_input, Submission, SwapContext,
    SwapFill,
};
use crate::{
    amount::format_amount, chain::ChainClient, wallet::WalletCustody, SweepError,
    FEE_TIER_ROUTER_ADDRESS,
};

/// Pool fee in hundredths of a basis point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeeTier(u32);

impl FeeTier {
    pub const LOWEST: FeeTier = FeeTier(500);
    pub const MEDIUM: FeeTier = FeeTier(3_000);
    pub const HIGH: FeeTier = FeeTier(10_000);

    pub const fn new(pips: u32) -> Self {
        Self(pips)
    }

    pub const fn pips(self) -> u32 {
        self.0
    }

    pub fn as_uint24(self) -> U24 {
        U24::from(self.0 & 0x00ff_ffff)
    }
}

impl fmt::Display for FeeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", format_amount(U256::from(self.0), 4))
    }
}

/// Tiers tried in order.
pub const STANDARD_FEE_TIERS: [FeeTier; 3] = [FeeTier::LOWEST, FeeTier::MEDIUM, FeeTier::HIGH];

pub fn describe_tiers(tiers: &[FeeTier]) -> String {
    tiers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Filled(SwapFill),
    /// Every tier either failed estimation or reverted.
    NoPool {
        tried: Vec<FeeTier>,
        reverted: Vec<TxHash>,
    },
}

/// Calldata for `execute` with `WRAP_ETH` followed by `V3_SWAP_EXACT_IN`.
pub fn encode_swap(
    recipient: Address,
    weth: Address,
    token: Address,
    tier: FeeTier,
    amount_in: U256,
    min_amount_out: U256,
    deadline: U256,
) -> Bytes {
    let path = encode_v3_path(weth, &[(tier, token)]);
    // payerIsUser = false: the router spends the WETH it just wrapped.
    let swap_input = (recipient, amount_in, min_amount_out, path, false).abi_encode_params();
    encode_execute(
        vec![commands::WRAP_ETH, commands::V3_SWAP_EXACT_IN],
        vec![wrap_eth_input(amount_in), swap_input.into()],
        deadline,
    )
}

pub async fn swap<C, W>(ctx: &SwapContext<'_, C, W>, tiers: &[FeeTier]) -> Result<RouteOutcome, SweepError>
where
    C: ChainClient + ?Sized,
    W: WalletCustody + ?Sized,
{
    let recipient = ctx.wallet.address();
    let mut tried = Vec::with_capacity(tiers.len());
    let mut reverted = Vec::new();

    for &tier in tiers {
        tried.push(tier);
        let calldata = encode_swap(
            recipient,
            ctx.weth,
            ctx.token.address,
            tier,
            ctx.amount_in,
            ctx.min_amount_out,
            super::deadline(),
        );
        let tx = ctx.transaction(FEE_TIER_ROUTER_ADDRESS, calldata);

        let gas_estimate = match ctx.chain.estimate_gas(&tx).await {
            Ok(gas) => gas,
            Err(e) => {
                debug!(%tier, token = %ctx.token.address, error = %e, "no pool on fee tier");
                continue;
            }
        };
        info!(%tier, gas_estimate, symbol = %ctx.token.symbol, "pool found, submitting swap");

        match ctx.submit(tx, gas_estimate).await? {
            Submission::Confirmed(fill) => return Ok(RouteOutcome::Filled(fill)),
            Submission::Reverted(tx_hash) => {
                warn!(%tier, %tx_hash, "swap reverted, trying next fee tier");
                reverted.push(tx_hash);
            }
        }
    }

    Ok(RouteOutcome::NoPool { tried, reverted })
}
