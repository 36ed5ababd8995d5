//! Plain transfers out of the custodied wallet, native or ERC-20.

use alloy::{
    network::TransactionBuilder,
    primitives::{Address, U256},
    rpc::types::TransactionRequest,
    sol_types::SolCall,
};
use serde::Serialize;
use tracing::{error, info};

use crate::{
    adapters::scale_gas,
    address::{is_native_currency, parse_address, parse_recipient, to_checksummed_address},
    amount::{ensure_positive, format_amount, format_native_amount, parse_amount, parse_native_amount},
    chain::ChainClient,
    config::SweeperSettings,
    token,
    wallet::WalletCustody,
    SweepError, IERC20, NATIVE_SYMBOL,
};

/// Gas for a bare value transfer.
pub const NATIVE_TRANSFER_GAS: u64 = 21_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferResult {
    pub tx_hash: String,
    pub status: &'static str,
    pub to: String,
    pub amount: String,
}

/// Sends `amount` of `token` (or the native currency) to `to`.
pub async fn send_token<C, W>(
    chain: &C,
    wallet: &W,
    settings: &SweeperSettings,
    token: &str,
    to: &str,
    amount: &str,
) -> Result<TransferResult, SweepError>
where
    C: ChainClient + ?Sized,
    W: WalletCustody + ?Sized,
{
    ensure_positive(amount)?;
    let recipient = parse_recipient(to)?;
    if is_native_currency(token) {
        send_native(chain, wallet, settings, recipient, amount).await
    } else {
        let token = parse_address(token)?;
        send_erc20(chain, wallet, settings, token, recipient, amount).await
    }
}

async fn send_native<C, W>(
    chain: &C,
    wallet: &W,
    settings: &SweeperSettings,
    recipient: Address,
    amount: &str,
) -> Result<TransferResult, SweepError>
where
    C: ChainClient + ?Sized,
    W: WalletCustody + ?Sized,
{
    let value = parse_native_amount(amount)?;
    let from = wallet.address();
    let balance = chain.native_balance(from).await?;
    if value.saturating_add(settings.gas_reserve) > balance {
        return Err(SweepError::InsufficientBalance {
            have: format_native_amount(balance),
            need: format_native_amount(value),
            reserve: format_native_amount(settings.gas_reserve),
        });
    }

    let gas_price = chain.gas_price().await?;
    let gas_cost = U256::from(gas_price) * U256::from(NATIVE_TRANSFER_GAS);
    if value.saturating_add(gas_cost) > balance {
        return Err(SweepError::InsufficientGas {
            need: format_native_amount(gas_cost),
            have: format_native_amount(balance),
        });
    }

    let nonce = chain.nonce(from).await?;
    let tx = TransactionRequest::default()
        .with_from(from)
        .with_to(recipient)
        .with_value(value)
        .with_nonce(nonce)
        .with_gas_limit(NATIVE_TRANSFER_GAS)
        .with_gas_price(gas_price)
        .with_chain_id(settings.chain_id);

    let amount = format!("{} {NATIVE_SYMBOL}", format_native_amount(value));
    submit(chain, wallet, tx, recipient, amount).await
}

async fn send_erc20<C, W>(
    chain: &C,
    wallet: &W,
    settings: &SweeperSettings,
    token_address: Address,
    recipient: Address,
    amount: &str,
) -> Result<TransferResult, SweepError>
where
    C: ChainClient + ?Sized,
    W: WalletCustody + ?Sized,
{
    let info = token::token_info(chain, token_address)
        .await
        .map_err(|e| SweepError::InvalidToken {
            address: to_checksummed_address(&token_address),
            reason: e.to_string(),
        })?;
    let raw = parse_amount(amount, info.decimals)?;
    let from = wallet.address();

    let held = token::balance_of(chain, token_address, from).await?;
    if raw > held {
        return Err(SweepError::InsufficientTokenBalance {
            symbol: info.symbol,
            have: format_amount(held, info.decimals),
            need: format_amount(raw, info.decimals),
        });
    }

    let calldata = IERC20::transferCall {
        to: recipient,
        amount: raw,
    }
    .abi_encode();
    let tx = TransactionRequest::default()
        .with_from(from)
        .with_to(token_address)
        .with_input(calldata)
        .with_chain_id(settings.chain_id);

    let gas_estimate = chain.estimate_gas(&tx).await?;
    let gas_price = chain.gas_price().await?;
    let gas_limit = scale_gas(gas_estimate, settings.gas_limit_multiplier_bps);
    let gas_cost = U256::from(gas_limit) * U256::from(gas_price);
    let native = chain.native_balance(from).await?;
    if gas_cost > native {
        return Err(SweepError::InsufficientGas {
            need: format_native_amount(gas_cost),
            have: format_native_amount(native),
        });
    }

    let nonce = chain.nonce(from).await?;
    let tx = tx
        .with_nonce(nonce)
        .with_gas_limit(gas_limit)
        .with_gas_price(gas_price);

    let amount = format!("{} {}", format_amount(raw, info.decimals), info.symbol);
    submit(chain, wallet, tx, recipient, amount).await
}

async fn submit<C, W>(
    chain: &C,
    wallet: &W,
    tx: TransactionRequest,
    recipient: Address,
    amount: String,
) -> Result<TransferResult, SweepError>
where
    C: ChainClient + ?Sized,
    W: WalletCustody + ?Sized,
{
    let raw = wallet.sign_transaction(tx).await?;
    let tx_hash = chain.send_raw_transaction(&raw).await?;
    info!(%tx_hash, %recipient, amount = %amount, "transfer submitted");

    let receipt = chain.wait_for_receipt(tx_hash).await?;
    if !receipt.status {
        error!(%tx_hash, "transfer reverted");
        return Err(SweepError::TransactionFailed(tx_hash));
    }
    Ok(TransferResult {
        tx_hash: tx_hash.to_string(),
        status: "confirmed",
        to: to_checksummed_address(&recipient),
        amount,
    })
}
