//! Swap orchestration.
//!
//! [`Sweeper`] ties a chain client, a wallet custodian and a sweep store
//! together. Buying runs the route plan for the configured target token:
//! every standard fee tier first, then the token's fixed singleton pool if it
//! has one. Only a confirmed swap reaches the ledger.

use std::sync::Mutex;

use alloy::primitives::{Address, U256};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    adapters::{
        fee_tier::{self, describe_tiers, RouteOutcome},
        hook_pool::{self, FallbackPools},
        PoolRoute, RoutePlan, SwapContext, SwapFill,
    },
    address::{is_native_currency, parse_address, to_checksummed_address},
    amount::{format_amount, format_native_amount, parse_native_amount},
    chain::ChainClient,
    config::SweeperSettings,
    store::{SweepConfiguration, SweepLedgerEntry, SweepStore, RECENT_SWEEPS},
    token,
    transfer::{self, TransferResult},
    wallet::WalletCustody,
    SweepError, NATIVE_SYMBOL, WETH_ADDRESS,
};

const LEDGER_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    /// Positive decimal amount of the native currency.
    pub amount_native_in: String,
    /// Floor on tokens received, in raw token units. Zero accepts any fill.
    pub min_amount_out: U256,
}

impl SwapRequest {
    pub fn new(amount_native_in: impl Into<String>) -> Self {
        Self {
            amount_native_in: amount_native_in.into(),
            min_amount_out: U256::ZERO,
        }
    }

    pub fn with_min_amount_out(mut self, min_amount_out: U256) -> Self {
        self.min_amount_out = min_amount_out;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapResult {
    pub tx_hash: String,
    pub amount_in: String,
    pub amount_out: String,
    pub status: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetTokenSet {
    pub status: &'static str,
    pub token_address: String,
    pub token_symbol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepConfigView {
    pub target_token: Option<String>,
    pub token_symbol: Option<String>,
    pub network: String,
    pub recent_sweeps: Vec<SweepLedgerEntry>,
    pub malformed_lines: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenBalance {
    pub token_address: String,
    pub symbol: String,
    pub balance: String,
    pub raw_balance: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletInfo {
    pub address: String,
    pub eth_balance: String,
}

pub struct Sweeper<C, W, S> {
    chain: C,
    wallet: W,
    store: S,
    settings: SweeperSettings,
    fallback_pools: FallbackPools,
    /// Plan for the last target swept, resolved once per target.
    plan: Mutex<Option<RoutePlan>>,
}

impl<C, W, S> Sweeper<C, W, S> {
    pub fn with_fallback_pools(mut self, fallback_pools: FallbackPools) -> Self {
        self.fallback_pools = fallback_pools;
        self.plan = Mutex::new(None);
        self
    }

    fn route_plan(&self, target: Address) -> RoutePlan {
        let mut cached = self.plan.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match cached.as_ref() {
            Some(plan) if plan.token() == target => plan.clone(),
            _ => {
                let plan = RoutePlan::resolve(target, &self.fallback_pools);
                debug!(token = %target, fallback = plan.has_fallback(), "route plan resolved");
                *cached = Some(plan.clone());
                plan
            }
        }
    }
}

impl<C, W, S> Sweeper<C, W, S>
where
    C: ChainClient,
    W: WalletCustody,
    S: SweepStore,
{
    pub fn new(chain: C, wallet: W, store: S, settings: SweeperSettings) -> Self {
        Self {
            chain,
            wallet,
            store,
            settings,
            fallback_pools: FallbackPools::default(),
            plan: Mutex::new(None),
        }
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &SweeperSettings {
        &self.settings
    }

    /// Validates `token` by reading its symbol, then persists it as the
    /// sweep target.
    pub async fn set_target_token(&self, token: &str) -> Result<TargetTokenSet, SweepError> {
        let address = parse_address(token)?;
        let checksummed = to_checksummed_address(&address);
        let symbol = token::symbol(&self.chain, address)
            .await
            .map_err(|e| SweepError::InvalidToken {
                address: checksummed.clone(),
                reason: e.to_string(),
            })?;

        self.store.save_config(&SweepConfiguration {
            target_token: Some(address),
            network: self.settings.network.clone(),
        })?;
        self.route_plan(address);
        info!(token = %checksummed, %symbol, "sweep target set");

        Ok(TargetTokenSet {
            status: "configured",
            token_address: checksummed,
            token_symbol: symbol,
        })
    }

    pub async fn get_sweep_config(&self) -> Result<SweepConfigView, SweepError> {
        let snapshot = self.store.load()?;
        let token_symbol = match snapshot.config.target_token {
            Some(target) => match token::symbol(&self.chain, target).await {
                Ok(symbol) => Some(symbol),
                Err(e) => {
                    debug!(%target, error = %e, "could not resolve target symbol");
                    None
                }
            },
            None => None,
        };

        Ok(SweepConfigView {
            target_token: snapshot.config.target_token.as_ref().map(to_checksummed_address),
            token_symbol,
            network: snapshot.config.network.clone(),
            recent_sweeps: snapshot.recent(RECENT_SWEEPS).to_vec(),
            malformed_lines: snapshot.malformed_lines,
        })
    }

    pub async fn get_token_balance(&self, token: &str) -> Result<TokenBalance, SweepError> {
        let owner = self.wallet.address();
        if is_native_currency(token) {
            let raw = self.chain.native_balance(owner).await?;
            return Ok(TokenBalance {
                token_address: to_checksummed_address(&Address::ZERO),
                symbol: NATIVE_SYMBOL.to_string(),
                balance: format_native_amount(raw),
                raw_balance: raw.to_string(),
            });
        }

        let address = parse_address(token)?;
        let raw = token::balance_of(&self.chain, address, owner).await?;
        let info = token::token_info(&self.chain, address).await?;
        Ok(TokenBalance {
            token_address: to_checksummed_address(&address),
            balance: format_amount(raw, info.decimals),
            symbol: info.symbol,
            raw_balance: raw.to_string(),
        })
    }

    pub async fn get_wallet(&self) -> Result<WalletInfo, SweepError> {
        let address = self.wallet.address();
        let balance = self.chain.native_balance(address).await?;
        Ok(WalletInfo {
            address: to_checksummed_address(&address),
            eth_balance: format_native_amount(balance),
        })
    }

    /// Buys the target token with `amount` of the native currency and no
    /// output floor.
    pub async fn buy_token(&self, amount: &str) -> Result<SwapResult, SweepError> {
        self.execute_swap(SwapRequest::new(amount)).await
    }

    pub async fn execute_swap(&self, request: SwapRequest) -> Result<SwapResult, SweepError> {
        let snapshot = self.store.load()?;
        let target = snapshot.config.target_token.ok_or(SweepError::NoTargetToken)?;
        let amount_in = parse_native_amount(&request.amount_native_in)?;

        let owner = self.wallet.address();
        let balance = self.chain.native_balance(owner).await?;
        if balance.saturating_sub(self.settings.gas_reserve) < amount_in {
            warn!(
                balance = %format_native_amount(balance),
                amount = %format_native_amount(amount_in),
                "balance too low for sweep"
            );
            return Err(SweepError::InsufficientBalance {
                have: format_native_amount(balance),
                need: format_native_amount(amount_in),
                reserve: format_native_amount(self.settings.gas_reserve),
            });
        }

        let info = token::token_info(&self.chain, target).await?;
        let plan = self.route_plan(target);
        let ctx = SwapContext {
            chain: &self.chain,
            wallet: &self.wallet,
            chain_id: self.settings.chain_id,
            token: &info,
            weth: WETH_ADDRESS,
            amount_in,
            min_amount_out: request.min_amount_out,
            gas_limit_multiplier_bps: self.settings.gas_limit_multiplier_bps,
        };
        info!(
            symbol = %info.symbol,
            amount = %format_native_amount(amount_in),
            routes = plan.routes().len(),
            "starting sweep"
        );

        let fill = self.run_plan(&ctx, &plan).await?;
        let entry = SweepLedgerEntry::new(
            chrono::Local::now().format(LEDGER_TIMESTAMP_FORMAT).to_string(),
            format!("{} {NATIVE_SYMBOL}", format_native_amount(amount_in)),
            format!("{} {}", format_amount(fill.amount_out, info.decimals), info.symbol),
            fill.tx_hash.to_string(),
        );
        self.store
            .append_entry(&entry)
            .map_err(|source| SweepError::LedgerWrite {
                tx_hash: fill.tx_hash,
                source,
            })?;
        info!(tx_hash = %entry.tx_hash, spent = %entry.spent, bought = %entry.bought, "sweep confirmed");

        Ok(SwapResult {
            tx_hash: entry.tx_hash,
            amount_in: entry.spent,
            amount_out: entry.bought,
            status: "confirmed",
        })
    }

    async fn run_plan(&self, ctx: &SwapContext<'_, C, W>, plan: &RoutePlan) -> Result<SwapFill, SweepError> {
        let mut tried = Vec::new();
        for route in plan.routes() {
            match route {
                PoolRoute::StandardFeeTier(tiers) => match fee_tier::swap(ctx, tiers).await? {
                    RouteOutcome::Filled(fill) => return Ok(fill),
                    RouteOutcome::NoPool {
                        tried: attempted,
                        reverted,
                    } => {
                        debug!(reverted = reverted.len(), "fee tiers exhausted");
                        tried.extend(attempted);
                    }
                },
                PoolRoute::FixedSingletonPool(params) => {
                    info!(token = %plan.token(), "no fee-tier pool, falling back to singleton pool");
                    return hook_pool::swap(ctx, params).await;
                }
            }
        }
        Err(SweepError::NoLiquidity {
            symbol: ctx.token.symbol.clone(),
            tiers: describe_tiers(&tried),
        })
    }

    /// Sends `amount` of `token` (or the native currency) out of the wallet.
    pub async fn send_token(&self, token: &str, to: &str, amount: &str) -> Result<TransferResult, SweepError> {
        transfer::send_token(&self.chain, &self.wallet, &self.settings, token, to, amount).await
    }
}
