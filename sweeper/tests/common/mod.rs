#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use alloy::{
    consensus::TxEnvelope,
    eips::eip2718::Decodable2718,
    primitives::{keccak256, Address, Bytes, TxHash, U256},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
    sol_types::{SolCall, SolValue},
};
use async_trait::async_trait;
use sweeper::{
    adapters::path::first_hop_fee,
    chain::{ChainClient, ChainError, ReceiptOutcome},
    config::SweeperSettings,
    store::MemorySweepStore,
    wallet::SignerWallet,
    IUniversalRouter, Sweeper, FEE_TIER_ROUTER_ADDRESS, IERC20, UNIVERSAL_ROUTER_ADDRESS,
};

pub const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const GAS_PRICE: u128 = 1_000_000_000;
pub const ONE_ETH: u64 = 1_000_000_000_000_000_000;

pub fn eth(milli: u64) -> U256 {
    U256::from(milli) * U256::from(1_000_000_000_000_000u64)
}

pub fn tokens(whole: u64, decimals: u8) -> U256 {
    U256::from(whole) * U256::from(10u64).pow(U256::from(decimals))
}

pub fn signer() -> PrivateKeySigner {
    DEV_KEY.parse().unwrap()
}

#[derive(Debug, Clone)]
pub struct MockToken {
    pub symbol: String,
    pub decimals: u8,
    pub balances: HashMap<Address, U256>,
}

/// A transaction that reached `send_raw_transaction`.
#[derive(Debug, Clone)]
pub struct SentTx {
    pub hash: TxHash,
    pub to: Address,
    pub value: U256,
    pub input: Bytes,
    pub gas_limit: u64,
    /// First-hop fee when the transaction is a fee-tier swap.
    pub fee_tier: Option<u32>,
}

#[derive(Debug, Default)]
struct State {
    owner: Address,
    native_balance: U256,
    tokens: HashMap<Address, MockToken>,
    pool_tiers: HashSet<u32>,
    reverting_tiers: HashSet<u32>,
    singleton_pool: bool,
    singleton_reverts: bool,
    fill: Option<(Address, U256)>,
    estimates: Vec<(Address, Option<u32>)>,
    sent: Vec<SentTx>,
    receipts: HashMap<TxHash, bool>,
    nonce: u64,
}

/// Scripted chain. Fee-tier pools exist only on configured tiers; a
/// successful swap credits `fill` to the owner.
pub struct MockChain {
    state: Mutex<State>,
}

impl MockChain {
    pub fn new(owner: Address, native_balance: U256) -> Self {
        Self {
            state: Mutex::new(State {
                owner,
                native_balance,
                ..State::default()
            }),
        }
    }

    pub fn with_token(self, address: Address, symbol: &str, decimals: u8) -> Self {
        self.state.lock().unwrap().tokens.insert(
            address,
            MockToken {
                symbol: symbol.to_string(),
                decimals,
                balances: HashMap::new(),
            },
        );
        self
    }

    pub fn with_token_balance(self, token: Address, owner: Address, amount: U256) -> Self {
        self.state
            .lock()
            .unwrap()
            .tokens
            .get_mut(&token)
            .expect("token registered")
            .balances
            .insert(owner, amount);
        self
    }

    pub fn with_pool_tiers(self, tiers: &[u32]) -> Self {
        self.state.lock().unwrap().pool_tiers.extend(tiers);
        self
    }

    pub fn with_reverting_tiers(self, tiers: &[u32]) -> Self {
        self.state.lock().unwrap().reverting_tiers.extend(tiers);
        self
    }

    pub fn with_singleton_pool(self, reverts: bool) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.singleton_pool = true;
            state.singleton_reverts = reverts;
        }
        self
    }

    pub fn with_fill(self, token: Address, amount: U256) -> Self {
        self.state.lock().unwrap().fill = Some((token, amount));
        self
    }

    pub fn estimates(&self) -> Vec<(Address, Option<u32>)> {
        self.state.lock().unwrap().estimates.clone()
    }

    pub fn sent(&self) -> Vec<SentTx> {
        self.state.lock().unwrap().sent.clone()
    }
}

fn request_parts(tx: &TransactionRequest) -> (Address, Bytes) {
    let to = tx
        .to
        .as_ref()
        .and_then(|kind| kind.to().copied())
        .unwrap_or_default();
    let input = tx.input.input().cloned().unwrap_or_default();
    (to, input)
}

fn swap_fee_tier(input: &[u8]) -> Option<u32> {
    let call = IUniversalRouter::executeCall::abi_decode(input, true).ok()?;
    let swap_input = call.inputs.get(1)?;
    let (_, _, _, path, _) =
        <(Address, U256, U256, Bytes, bool)>::abi_decode_params(swap_input, true).ok()?;
    first_hop_fee(&path)
}

fn reverted() -> ChainError {
    ChainError::Rpc("execution reverted".to_string())
}

#[async_trait]
impl ChainClient for MockChain {
    async fn native_balance(&self, _owner: Address) -> Result<U256, ChainError> {
        Ok(self.state.lock().unwrap().native_balance)
    }

    async fn nonce(&self, _owner: Address) -> Result<u64, ChainError> {
        Ok(self.state.lock().unwrap().nonce)
    }

    async fn gas_price(&self) -> Result<u128, ChainError> {
        Ok(GAS_PRICE)
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, ChainError> {
        let (to, input) = request_parts(tx);
        let mut state = self.state.lock().unwrap();
        if to == FEE_TIER_ROUTER_ADDRESS {
            let fee = swap_fee_tier(&input);
            state.estimates.push((to, fee));
            match fee {
                Some(fee) if state.pool_tiers.contains(&fee) => Ok(180_000),
                _ => Err(reverted()),
            }
        } else if to == UNIVERSAL_ROUTER_ADDRESS {
            state.estimates.push((to, None));
            if state.singleton_pool {
                Ok(250_000)
            } else {
                Err(reverted())
            }
        } else {
            state.estimates.push((to, None));
            Ok(60_000)
        }
    }

    async fn call(&self, tx: &TransactionRequest) -> Result<Bytes, ChainError> {
        let (to, input) = request_parts(tx);
        let state = self.state.lock().unwrap();
        let token = state.tokens.get(&to).ok_or_else(reverted)?;
        let selector: [u8; 4] = input
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(reverted)?;

        let output = if selector == IERC20::symbolCall::SELECTOR {
            (token.symbol.clone(),).abi_encode_params()
        } else if selector == IERC20::decimalsCall::SELECTOR {
            (U256::from(token.decimals),).abi_encode_params()
        } else if selector == IERC20::balanceOfCall::SELECTOR {
            let owner = IERC20::balanceOfCall::abi_decode(&input, true)
                .map_err(|_| reverted())?
                .account;
            let balance = token.balances.get(&owner).copied().unwrap_or_default();
            (balance,).abi_encode_params()
        } else {
            return Err(reverted());
        };
        Ok(output.into())
    }

    async fn send_raw_transaction(&self, encoded: &[u8]) -> Result<TxHash, ChainError> {
        let envelope = TxEnvelope::decode_2718(&mut &encoded[..])
            .map_err(|e| ChainError::Rpc(e.to_string()))?;
        let TxEnvelope::Legacy(signed) = envelope else {
            return Err(ChainError::Rpc("expected a legacy transaction".into()));
        };
        let tx = signed.tx();
        let to = tx.to.to().copied().unwrap_or_default();
        let hash = keccak256(encoded);
        let fee_tier = (to == FEE_TIER_ROUTER_ADDRESS)
            .then(|| swap_fee_tier(&tx.input))
            .flatten();

        let mut state = self.state.lock().unwrap();
        let status = if to == FEE_TIER_ROUTER_ADDRESS {
            !fee_tier.is_some_and(|fee| state.reverting_tiers.contains(&fee))
        } else if to == UNIVERSAL_ROUTER_ADDRESS {
            !state.singleton_reverts
        } else {
            true
        };
        let is_swap = to == FEE_TIER_ROUTER_ADDRESS || to == UNIVERSAL_ROUTER_ADDRESS;
        if status && is_swap {
            if let Some((token, amount)) = state.fill {
                let owner = state.owner;
                if let Some(token) = state.tokens.get_mut(&token) {
                    *token.balances.entry(owner).or_default() += amount;
                }
            }
        }

        state.nonce += 1;
        state.receipts.insert(hash, status);
        state.sent.push(SentTx {
            hash,
            to,
            value: tx.value,
            input: tx.input.clone(),
            gas_limit: tx.gas_limit,
            fee_tier,
        });
        Ok(hash)
    }

    async fn wait_for_receipt(&self, hash: TxHash) -> Result<ReceiptOutcome, ChainError> {
        let status = *self
            .state
            .lock()
            .unwrap()
            .receipts
            .get(&hash)
            .ok_or_else(|| ChainError::Rpc(format!("unknown transaction {hash}")))?;
        Ok(ReceiptOutcome {
            tx_hash: hash,
            status,
            logs: Vec::new(),
        })
    }
}

pub type TestSweeper = Sweeper<MockChain, SignerWallet, MemorySweepStore>;

pub fn sweeper(chain: MockChain) -> TestSweeper {
    Sweeper::new(
        chain,
        SignerWallet::new(signer()),
        MemorySweepStore::new(),
        SweeperSettings::default(),
    )
}
