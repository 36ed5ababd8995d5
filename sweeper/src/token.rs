use alloy::{
    network::TransactionBuilder,
    primitives::{Address, U256},
    rpc::types::TransactionRequest,
    sol_types::SolCall,
};

use crate::{
    chain::{ChainClient, ChainError},
    IERC20,
};

/// Metadata of the token being bought or sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

async fn read<C, T>(chain: &C, token: Address, call: T, what: &'static str) -> Result<T::Return, ChainError>
where
    C: ChainClient + ?Sized,
    T: SolCall,
{
    let request = TransactionRequest::default()
        .with_to(token)
        .with_input(call.abi_encode());
    let output = chain.call(&request).await?;
    T::abi_decode_returns(&output, true).map_err(|e| ChainError::Decode {
        what,
        reason: e.to_string(),
    })
}

pub async fn symbol<C: ChainClient + ?Sized>(chain: &C, token: Address) -> Result<String, ChainError> {
    Ok(read(chain, token, IERC20::symbolCall {}, "symbol()").await?._0)
}

pub async fn decimals<C: ChainClient + ?Sized>(chain: &C, token: Address) -> Result<u8, ChainError> {
    Ok(read(chain, token, IERC20::decimalsCall {}, "decimals()").await?._0)
}

pub async fn balance_of<C: ChainClient + ?Sized>(
    chain: &C,
    token: Address,
    owner: Address,
) -> Result<U256, ChainError> {
    let call = IERC20::balanceOfCall { account: owner };
    Ok(read(chain, token, call, "balanceOf(address)").await?._0)
}

pub async fn token_info<C: ChainClient + ?Sized>(chain: &C, token: Address) -> Result<TokenInfo, ChainError> {
    let decimals = decimals(chain, token).await?;
    let symbol = symbol(chain, token).await?;
    Ok(TokenInfo {
        address: token,
        symbol,
        decimals,
    })
}
