use std::time::Duration;

use alloy::{
    primitives::{Address, Bytes, TxHash, U256},
    providers::{Provider, RootProvider},
    rpc::types::{Log, TransactionRequest},
    transports::http::{Client, Http},
};
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

pub type HttpProvider = RootProvider<Http<Client>>;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("RPC request failed: {0}")]
    Rpc(String),

    #[error("Could not decode {what} response: {reason}")]
    Decode { what: &'static str, reason: String },

    #[error("Timed out after {seconds}s waiting for receipt of {hash}")]
    ReceiptTimeout { hash: TxHash, seconds: u64 },
}

impl ChainError {
    pub fn rpc(err: impl std::fmt::Display) -> Self {
        ChainError::Rpc(err.to_string())
    }
}

/// Mined outcome of a submitted transaction.
#[derive(Debug, Clone)]
pub struct ReceiptOutcome {
    pub tx_hash: TxHash,
    pub status: bool,
    pub logs: Vec<Log>,
}

/// The chain operations the sweeper needs. A failing `estimate_gas` is an
/// expected answer ("this call would revert"), not necessarily a fault.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn native_balance(&self, owner: Address) -> Result<U256, ChainError>;

    async fn nonce(&self, owner: Address) -> Result<u64, ChainError>;

    async fn gas_price(&self) -> Result<u128, ChainError>;

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, ChainError>;

    /// Read-only `eth_call`.
    async fn call(&self, tx: &TransactionRequest) -> Result<Bytes, ChainError>;

    async fn send_raw_transaction(&self, encoded: &[u8]) -> Result<TxHash, ChainError>;

    async fn wait_for_receipt(&self, hash: TxHash) -> Result<ReceiptOutcome, ChainError>;
}

/// [`ChainClient`] backed by a JSON-RPC node over HTTP.
pub struct RpcChainClient {
    provider: HttpProvider,
    receipt_timeout: Duration,
    poll_interval: Duration,
}

impl RpcChainClient {
    pub fn new(provider: HttpProvider, receipt_timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            provider,
            receipt_timeout,
            poll_interval,
        }
    }

    pub fn provider(&self) -> &HttpProvider {
        &self.provider
    }

    async fn poll_receipt(&self, hash: TxHash) -> Result<ReceiptOutcome, ChainError> {
        loop {
            let receipt = self
                .provider
                .get_transaction_receipt(hash)
                .await
                .map_err(ChainError::rpc)?;
            if let Some(receipt) = receipt {
                return Ok(ReceiptOutcome {
                    tx_hash: hash,
                    status: receipt.status(),
                    logs: receipt.inner.logs().to_vec(),
                });
            }
            debug!(%hash, "receipt not available yet");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn native_balance(&self, owner: Address) -> Result<U256, ChainError> {
        self.provider
            .get_balance(owner)
            .await
            .map_err(ChainError::rpc)
    }

    async fn nonce(&self, owner: Address) -> Result<u64, ChainError> {
        self.provider
            .get_transaction_count(owner)
            .await
            .map_err(ChainError::rpc)
    }

    async fn gas_price(&self) -> Result<u128, ChainError> {
        self.provider.get_gas_price().await.map_err(ChainError::rpc)
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, ChainError> {
        self.provider.estimate_gas(tx).await.map_err(ChainError::rpc)
    }

    async fn call(&self, tx: &TransactionRequest) -> Result<Bytes, ChainError> {
        self.provider.call(tx).await.map_err(ChainError::rpc)
    }

    async fn send_raw_transaction(&self, encoded: &[u8]) -> Result<TxHash, ChainError> {
        let pending = self
            .provider
            .send_raw_transaction(encoded)
            .await
            .map_err(ChainError::rpc)?;
        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(&self, hash: TxHash) -> Result<ReceiptOutcome, ChainError> {
        match tokio::time::timeout(self.receipt_timeout, self.poll_receipt(hash)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(%hash, "gave up waiting for receipt");
                Err(ChainError::ReceiptTimeout {
                    hash,
                    seconds: self.receipt_timeout.as_secs(),
                })
            }
        }
    }
}
