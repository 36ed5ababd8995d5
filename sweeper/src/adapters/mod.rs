use alloy::{
    network::TransactionBuilder,
    primitives::{address, Address, Bytes, TxHash, U256},
    rpc::types::TransactionRequest,
    sol_types::{SolCall, SolValue},
};
use tracing::{info, warn};

use crate::{
    chain::ChainClient,
    token::{self, TokenInfo},
    wallet::WalletCustody,
    IUniversalRouter, SweepError,
};

use self::{
    fee_tier::{FeeTier, STANDARD_FEE_TIERS},
    hook_pool::{FallbackPools, SingletonPoolParams},
};

pub mod fee_tier;
pub mod hook_pool;
pub mod path;

/// Universal Router command bytes.
pub mod commands {
    pub const V3_SWAP_EXACT_IN: u8 = 0x00;
    pub const WRAP_ETH: u8 = 0x0b;
    pub const V4_SWAP: u8 = 0x10;
}

/// Recipient sentinel meaning "the router itself".
pub static ADDRESS_THIS: Address = address!("0000000000000000000000000000000000000002");

pub const DEADLINE_SECS: u64 = 300;

pub fn deadline() -> U256 {
    let now = chrono::Utc::now().timestamp().max(0) as u64;
    U256::from(now + DEADLINE_SECS)
}

pub fn encode_execute(commands: Vec<u8>, inputs: Vec<Bytes>, deadline: U256) -> Bytes {
    IUniversalRouter::executeCall {
        commands: commands.into(),
        inputs,
        deadline,
    }
    .abi_encode()
    .into()
}

/// `WRAP_ETH` input: wrap `amount` and keep it at the router.
pub fn wrap_eth_input(amount: U256) -> Bytes {
    (ADDRESS_THIS, amount).abi_encode_params().into()
}

/// One way of reaching a pool for the target token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolRoute {
    /// Probe constant-product pools on each fee tier, in order.
    StandardFeeTier(Vec<FeeTier>),
    /// A single known hook pool; the attempt is final.
    FixedSingletonPool(SingletonPoolParams),
}

/// Routes to try for one target token, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePlan {
    token: Address,
    routes: Vec<PoolRoute>,
}

impl RoutePlan {
    pub fn resolve(token: Address, fallback: &FallbackPools) -> Self {
        let mut routes = vec![PoolRoute::StandardFeeTier(STANDARD_FEE_TIERS.to_vec())];
        if let Some(params) = fallback.get(&token) {
            routes.push(PoolRoute::FixedSingletonPool(params.clone()));
        }
        Self { token, routes }
    }

    pub fn token(&self) -> Address {
        self.token
    }

    pub fn routes(&self) -> &[PoolRoute] {
        &self.routes
    }

    pub fn has_fallback(&self) -> bool {
        self.routes
            .iter()
            .any(|route| matches!(route, PoolRoute::FixedSingletonPool(_)))
    }
}

/// A confirmed swap and the tokens it delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapFill {
    pub tx_hash: TxHash,
    pub amount_out: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Confirmed(SwapFill),
    Reverted(TxHash),
}

/// Everything a route needs to build and submit one swap.
pub struct SwapContext<'a, C: ?Sized, W: ?Sized> {
    pub chain: &'a C,
    pub wallet: &'a W,
    pub chain_id: u64,
    pub token: &'a TokenInfo,
    pub weth: Address,
    pub amount_in: U256,
    pub min_amount_out: U256,
    pub gas_limit_multiplier_bps: u64,
}

impl<C, W> SwapContext<'_, C, W>
where
    C: ChainClient + ?Sized,
    W: WalletCustody + ?Sized,
{
    /// Router call carrying `amount_in` as value, not yet priced or nonced.
    pub fn transaction(&self, router: Address, calldata: Bytes) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(self.wallet.address())
            .with_to(router)
            .with_value(self.amount_in)
            .with_input(calldata)
            .with_chain_id(self.chain_id)
    }

    /// Signs, submits and waits for `tx`, measuring the target token balance
    /// around it.
    pub async fn submit(
        &self,
        tx: TransactionRequest,
        gas_estimate: u64,
    ) -> Result<Submission, SweepError> {
        let owner = self.wallet.address();
        let balance_before = token::balance_of(self.chain, self.token.address, owner).await?;
        let nonce = self.chain.nonce(owner).await?;
        let gas_price = self.chain.gas_price().await?;
        let tx = tx
            .with_nonce(nonce)
            .with_gas_price(gas_price)
            .with_gas_limit(scale_gas(gas_estimate, self.gas_limit_multiplier_bps));

        let raw = self.wallet.sign_transaction(tx).await?;
        let tx_hash = self.chain.send_raw_transaction(&raw).await?;
        info!(%tx_hash, nonce, gas_price, "swap submitted");

        let receipt = self.chain.wait_for_receipt(tx_hash).await?;
        if !receipt.status {
            warn!(%tx_hash, "swap reverted on-chain");
            return Ok(Submission::Reverted(tx_hash));
        }

        let balance_after = token::balance_of(self.chain, self.token.address, owner).await?;
        Ok(Submission::Confirmed(SwapFill {
            tx_hash,
            amount_out: balance_after.saturating_sub(balance_before),
        }))
    }
}

pub fn scale_gas(estimate: u64, multiplier_bps: u64) -> u64 {
    let scaled = (estimate as u128 * multiplier_bps.max(10_000) as u128) / 10_000;
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CLAWBANK_ADDRESS, WETH_ADDRESS};

    #[test]
    fn plan_for_ordinary_token_is_fee_tiers_only() {
        let token = address!("833589fcd6edb6e08f4c7c32d4f71b54bda02913");
        let plan = RoutePlan::resolve(token, &FallbackPools::default());
        assert_eq!(
            plan.routes(),
            &[PoolRoute::StandardFeeTier(STANDARD_FEE_TIERS.to_vec())]
        );
        assert!(!plan.has_fallback());
    }

    #[test]
    fn plan_for_fallback_token_ends_with_singleton_pool() {
        let plan = RoutePlan::resolve(CLAWBANK_ADDRESS, &FallbackPools::default());
        assert_eq!(plan.routes().len(), 2);
        assert!(matches!(plan.routes()[0], PoolRoute::StandardFeeTier(_)));
        assert!(matches!(plan.routes()[1], PoolRoute::FixedSingletonPool(_)));
        assert!(plan.has_fallback());
    }

    #[test]
    fn execute_call_uses_router_selector() {
        let calldata = encode_execute(vec![commands::WRAP_ETH], vec![wrap_eth_input(U256::from(1))], U256::from(7));
        assert_eq!(&calldata[..4], &[0x35, 0x93, 0x56, 0x4c]);
        let decoded = IUniversalRouter::executeCall::abi_decode(&calldata, true).unwrap();
        assert_eq!(decoded.commands.as_ref(), &[commands::WRAP_ETH]);
        assert_eq!(decoded.deadline, U256::from(7));
        let (recipient, amount) =
            <(Address, U256)>::abi_decode_params(&decoded.inputs[0], true).unwrap();
        assert_eq!(recipient, ADDRESS_THIS);
        assert_eq!(amount, U256::from(1));
        assert_ne!(recipient, WETH_ADDRESS);
    }

    #[test]
    fn gas_scaling_never_shrinks_estimate() {
        assert_eq!(scale_gas(100_000, 12_000), 120_000);
        assert_eq!(scale_gas(100_000, 5_000), 100_000);
    }
}
