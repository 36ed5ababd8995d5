use alloy::providers::ProviderBuilder;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::{
    chain::{HttpProvider, RpcChainClient},
    config::SweeperSettings,
};

pub fn build_provider(rpc_url: &str) -> eyre::Result<HttpProvider> {
    let url = rpc_url.parse()?;
    let provider = ProviderBuilder::new().on_http(url);
    info!(rpc_url, "connected to RPC endpoint");
    Ok(provider)
}

pub fn build_chain_client(settings: &SweeperSettings) -> eyre::Result<RpcChainClient> {
    let provider = build_provider(&settings.rpc_url)?;
    Ok(RpcChainClient::new(
        provider,
        settings.receipt_timeout,
        settings.receipt_poll_interval,
    ))
}

/// Installs the global `fmt` subscriber, filtered by `RUST_LOG`.
pub fn init_tracing() -> eyre::Result<()> {
    let env_filter = EnvFilter::from_default_env();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
