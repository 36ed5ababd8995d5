use alloy::primitives::TxHash;
use serde::Serialize;
use thiserror::Error;

use crate::{chain::ChainError, store::StoreError};

/// Coarse classification of every failure an operation can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Input,
    Balance,
    Liquidity,
    Transaction,
    Decryption,
    Chain,
    Storage,
}

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("No target token set. Call set_target_token first.")]
    NoTargetToken,

    #[error("Invalid token address: {0}")]
    InvalidTokenAddress(String),

    #[error("Invalid token at {address}: {reason}")]
    InvalidToken { address: String, reason: String },

    #[error("Invalid pool parameters for {token}: {reason}")]
    InvalidPoolParams { token: String, reason: String },

    #[error("Amount must be greater than zero.")]
    NonPositiveAmount,

    #[error("Invalid amount {amount:?}: {reason}")]
    InvalidAmount { amount: String, reason: String },

    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(String),

    #[error("Insufficient balance. Have {have} ETH, need {need} + {reserve} for gas.")]
    InsufficientBalance {
        have: String,
        need: String,
        reserve: String,
    },

    #[error("Insufficient {symbol} balance. Have {have}, need {need}.")]
    InsufficientTokenBalance {
        symbol: String,
        have: String,
        need: String,
    },

    #[error("Insufficient ETH for gas. Need ~{need} ETH. Balance: {have} ETH.")]
    InsufficientGas { need: String, have: String },

    #[error(
        "No liquidity pool found for {symbol}. Tried fee tiers ({tiers}) with no success. \
         Token may not have WETH pair on Base or liquidity is insufficient."
    )]
    NoLiquidity { symbol: String, tiers: String },

    #[error("Transaction failed: {0}")]
    TransactionFailed(TxHash),

    #[error("Wallet does not exist. Call create_wallet first.")]
    WalletMissing,

    #[error("Failed to decrypt wallet: {0}")]
    Decryption(String),

    #[error("Keystore error: {0}")]
    Keystore(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Swap {tx_hash} confirmed but the sweep log could not be written: {source}")]
    LedgerWrite {
        tx_hash: TxHash,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SweepError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SweepError::NoTargetToken
            | SweepError::InvalidTokenAddress(_)
            | SweepError::InvalidToken { .. }
            | SweepError::InvalidPoolParams { .. }
            | SweepError::WalletMissing
            | SweepError::Keystore(_) => ErrorKind::Configuration,
            SweepError::NonPositiveAmount
            | SweepError::InvalidAmount { .. }
            | SweepError::InvalidRecipient(_) => ErrorKind::Input,
            SweepError::InsufficientBalance { .. }
            | SweepError::InsufficientTokenBalance { .. }
            | SweepError::InsufficientGas { .. } => ErrorKind::Balance,
            SweepError::NoLiquidity { .. } => ErrorKind::Liquidity,
            SweepError::TransactionFailed(_) | SweepError::Signing(_) => ErrorKind::Transaction,
            SweepError::Decryption(_) => ErrorKind::Decryption,
            SweepError::Chain(_) => ErrorKind::Chain,
            SweepError::Store(_) | SweepError::LedgerWrite { .. } => ErrorKind::Storage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_error_reports_both_sides() {
        let err = SweepError::InsufficientBalance {
            have: "0.0005".into(),
            need: "0.1".into(),
            reserve: "0.001".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Balance);
        assert_eq!(
            err.to_string(),
            "Insufficient balance. Have 0.0005 ETH, need 0.1 + 0.001 for gas."
        );
    }

    #[test]
    fn liquidity_error_lists_tiers() {
        let err = SweepError::NoLiquidity {
            symbol: "FOO".into(),
            tiers: "0.05%, 0.3%, 1%".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Liquidity);
        assert!(err.to_string().contains("FOO"));
        assert!(err.to_string().contains("0.05%, 0.3%, 1%"));
    }
}
