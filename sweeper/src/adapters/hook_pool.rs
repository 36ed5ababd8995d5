//! Hook-augmented singleton pool route.
//!
//! Some tokens only trade in a V4 pool with a dynamic fee, a non-default tick
//! spacing and a hook contract. Those parameters cannot be discovered, so they are
//! kept in a [`FallbackPools`] table keyed by token and used verbatim.

use std::collections::HashMap;

use alloy::{
    primitives::{
        aliases::{I24, U24},
        Address, Bytes, U256,
    },
    sol,
    sol_types::SolValue,
};
use tracing::{error, info};

use super::{commands, encode_execute, wrap_eth_input, Submission, SwapContext, SwapFill};
use crate::{
    address::to_checksummed_address, chain::ChainClient, wallet::WalletCustody, SweepError,
    CLAWBANK_ADDRESS, CLAWBANK_HOOKS_ADDRESS, UNIVERSAL_ROUTER_ADDRESS,
};

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct PoolKey {
        address currency0;
        address currency1;
        uint24 fee;
        int24 tickSpacing;
        address hooks;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct ExactInputSingleParams {
        PoolKey poolKey;
        bool zeroForOne;
        uint128 amountIn;
        uint128 amountOutMinimum;
        bytes hookData;
    }
}

/// Actions understood inside a `V4_SWAP` command.
pub mod actions {
    pub const SWAP_EXACT_IN_SINGLE: u8 = 0x06;
    pub const SETTLE: u8 = 0x0b;
    pub const TAKE_ALL: u8 = 0x0f;
}

/// Fee value flagging a pool whose hook sets the fee per swap.
pub const DYNAMIC_FEE_FLAG: u32 = 0x80_0000;

/// Fixed parameters of one known singleton pool, paired against WETH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingletonPoolParams {
    pub fee: u32,
    pub tick_spacing: i32,
    pub hooks: Address,
    pub router: Address,
}

impl SingletonPoolParams {
    /// ClawBank/WETH, as observed in a confirmed manual swap.
    pub fn clawbank() -> Self {
        Self {
            fee: DYNAMIC_FEE_FLAG,
            tick_spacing: 200,
            hooks: CLAWBANK_HOOKS_ADDRESS,
            router: UNIVERSAL_ROUTER_ADDRESS,
        }
    }

    /// Canonical pool key for `token`/`weth`; currencies are sorted.
    pub fn pool_key(&self, token: Address, weth: Address) -> Result<PoolKey, SweepError> {
        let invalid = |reason: String| SweepError::InvalidPoolParams {
            token: to_checksummed_address(&token),
            reason,
        };
        if token == weth {
            return Err(invalid("token and WETH are the same currency".into()));
        }
        let fee = U24::try_from(self.fee).map_err(|_| invalid(format!("fee {:#x} exceeds uint24", self.fee)))?;
        let tick_spacing = I24::try_from(self.tick_spacing)
            .map_err(|_| invalid(format!("tick spacing {} exceeds int24", self.tick_spacing)))?;
        let (currency0, currency1) = if token < weth { (token, weth) } else { (weth, token) };
        Ok(PoolKey {
            currency0,
            currency1,
            fee,
            tickSpacing: tick_spacing,
            hooks: self.hooks,
        })
    }
}

/// Singleton pools used when no fee tier has liquidity, keyed by token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPools {
    pools: HashMap<Address, SingletonPoolParams>,
}

impl Default for FallbackPools {
    fn default() -> Self {
        let mut pools = Self::empty();
        pools.insert(CLAWBANK_ADDRESS, SingletonPoolParams::clawbank());
        pools
    }
}

impl FallbackPools {
    pub fn empty() -> Self {
        Self {
            pools: HashMap::new(),
        }
    }

    pub fn insert(&mut self, token: Address, params: SingletonPoolParams) -> Option<SingletonPoolParams> {
        self.pools.insert(token, params)
    }

    pub fn get(&self, token: &Address) -> Option<&SingletonPoolParams> {
        self.pools.get(token)
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

/// Calldata for `execute` with `WRAP_ETH` followed by a `V4_SWAP` of
/// swap-exact-in-single, settle (WETH from the router) and take-all (token).
pub fn encode_swap(
    pool_key: PoolKey,
    weth: Address,
    token: Address,
    amount_in: U256,
    min_amount_out: U256,
    deadline: U256,
) -> Result<Bytes, SweepError> {
    let to_u128 = |value: U256| {
        u128::try_from(value).map_err(|_| SweepError::InvalidAmount {
            amount: value.to_string(),
            reason: "exceeds uint128".into(),
        })
    };
    let zero_for_one = pool_key.currency0 == weth;
    let swap = ExactInputSingleParams {
        poolKey: pool_key,
        zeroForOne: zero_for_one,
        amountIn: to_u128(amount_in)?,
        amountOutMinimum: to_u128(min_amount_out)?,
        // The hook rejects anything but an empty payload.
        hookData: Bytes::new(),
    };
    // Amount 0 settles the full open delta; payerIsUser = false pays from the router.
    let settle = (weth, U256::ZERO, false).abi_encode_params();
    let take_all = (token, min_amount_out).abi_encode_params();

    let actions = Bytes::from(vec![
        actions::SWAP_EXACT_IN_SINGLE,
        actions::SETTLE,
        actions::TAKE_ALL,
    ]);
    let params: Vec<Bytes> = vec![swap.abi_encode().into(), settle.into(), take_all.into()];
    let v4_input = (actions, params).abi_encode_params();

    Ok(encode_execute(
        vec![commands::WRAP_ETH, commands::V4_SWAP],
        vec![wrap_eth_input(amount_in), v4_input.into()],
        deadline,
    ))
}

/// Single attempt against the fixed pool. A reverted receipt is final.
pub async fn swap<C, W>(ctx: &SwapContext<'_, C, W>, params: &SingletonPoolParams) -> Result<SwapFill, SweepError>
where
    C: ChainClient + ?Sized,
    W: WalletCustody + ?Sized,
{
    let pool_key = params.pool_key(ctx.token.address, ctx.weth)?;
    info!(
        token = %ctx.token.address,
        fee = params.fee,
        tick_spacing = params.tick_spacing,
        hooks = %params.hooks,
        "routing through fixed singleton pool"
    );
    let calldata = encode_swap(
        pool_key,
        ctx.weth,
        ctx.token.address,
        ctx.amount_in,
        ctx.min_amount_out,
        super::deadline(),
    )?;
    let tx = ctx.transaction(params.router, calldata);
    let gas_estimate = ctx.chain.estimate_gas(&tx).await?;

    match ctx.submit(tx, gas_estimate).await? {
        Submission::Confirmed(fill) => Ok(fill),
        Submission::Reverted(tx_hash) => {
            error!(%tx_hash, "singleton pool swap reverted");
            Err(SweepError::TransactionFailed(tx_hash))
        }
    }
}
