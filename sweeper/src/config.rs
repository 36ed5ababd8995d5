use std::{fmt, path::PathBuf, time::Duration};

use alloy::primitives::U256;
use ::config::{Config, ConfigError, Environment};
use serde::Deserialize;

use crate::amount::{format_native_amount, parse_native_amount};

pub const BASE_RPC_URL_ENV: &str = "BASE_RPC_URL";
pub const DATA_DIR_ENV: &str = "CLAWBANK_HOME";
pub const WALLET_PASSWORD_ENV: &str = "CLAWBANK_WALLET_PASSWORD";
pub const CHAIN_ID_ENV: &str = "SWEEP_CHAIN_ID";
pub const GAS_RESERVE_ENV: &str = "SWEEP_GAS_RESERVE_ETH";
pub const RECEIPT_TIMEOUT_ENV: &str = "SWEEP_RECEIPT_TIMEOUT_SECS";
pub const RECEIPT_POLL_ENV: &str = "SWEEP_RECEIPT_POLL_MS";
pub const GAS_LIMIT_MULTIPLIER_ENV: &str = "SWEEP_GAS_LIMIT_MULTIPLIER_BPS";

pub const DEFAULT_RPC_URL: &str = "https://mainnet.base.org";
pub const DEFAULT_WALLET_PASSWORD: &str = "clawbank-default";
pub const DEFAULT_NETWORK: &str = "base";
pub const BASE_CHAIN_ID: u64 = 8453;
/// 0.001 ETH kept back for gas.
pub const DEFAULT_GAS_RESERVE_WEI: u64 = 1_000_000_000_000_000;

pub const SWEEP_CONFIG_FILE: &str = "sweep.config";
pub const WALLET_FILE: &str = "wallet.json";

/// Runtime settings, read from the environment through `config` (after
/// `.env` is loaded by the binary).
#[derive(Clone)]
pub struct SweeperSettings {
    pub rpc_url: String,
    pub chain_id: u64,
    pub network: String,
    pub data_dir: PathBuf,
    pub wallet_password: String,
    pub gas_reserve: U256,
    pub receipt_timeout: Duration,
    pub receipt_poll_interval: Duration,
    /// Applied to gas estimates, in basis points (12_000 = 120%).
    pub gas_limit_multiplier_bps: u64,
}

impl Default for SweeperSettings {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            chain_id: BASE_CHAIN_ID,
            network: DEFAULT_NETWORK.to_string(),
            data_dir: default_data_dir(),
            wallet_password: DEFAULT_WALLET_PASSWORD.to_string(),
            gas_reserve: U256::from(DEFAULT_GAS_RESERVE_WEI),
            receipt_timeout: Duration::from_secs(default_receipt_timeout_secs()),
            receipt_poll_interval: Duration::from_millis(default_receipt_poll_ms()),
            gas_limit_multiplier_bps: default_gas_limit_multiplier_bps(),
        }
    }
}

/// Raw environment view. `config::Environment` lowercases variable names,
/// so each field is named after the variable it reads.
#[derive(Deserialize)]
struct EnvSettings {
    #[serde(default = "default_rpc_url")]
    base_rpc_url: String,
    clawbank_home: Option<PathBuf>,
    home: Option<PathBuf>,
    #[serde(default = "default_wallet_password")]
    clawbank_wallet_password: String,
    #[serde(default = "default_chain_id")]
    sweep_chain_id: u64,
    sweep_gas_reserve_eth: Option<String>,
    #[serde(default = "default_receipt_timeout_secs")]
    sweep_receipt_timeout_secs: u64,
    #[serde(default = "default_receipt_poll_ms")]
    sweep_receipt_poll_ms: u64,
    #[serde(default = "default_gas_limit_multiplier_bps")]
    sweep_gas_limit_multiplier_bps: u64,
}

fn default_rpc_url() -> String {
    DEFAULT_RPC_URL.to_string()
}

fn default_wallet_password() -> String {
    DEFAULT_WALLET_PASSWORD.to_string()
}

fn default_chain_id() -> u64 {
    BASE_CHAIN_ID
}

fn default_receipt_timeout_secs() -> u64 {
    120
}

fn default_receipt_poll_ms() -> u64 {
    1_000
}

fn default_gas_limit_multiplier_bps() -> u64 {
    12_000
}

impl SweeperSettings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Environment::default())
    }

    pub fn load(source: Environment) -> Result<Self, ConfigError> {
        let raw: EnvSettings = Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;

        let gas_reserve = match raw.sweep_gas_reserve_eth.as_deref() {
            Some(value) => parse_native_amount(value).map_err(|e| {
                ConfigError::Message(format!("{GAS_RESERVE_ENV}={value:?}: {e}"))
            })?,
            None => U256::from(DEFAULT_GAS_RESERVE_WEI),
        };
        let data_dir = raw
            .clawbank_home
            .unwrap_or_else(|| data_dir_under(raw.home));

        Ok(Self {
            rpc_url: raw.base_rpc_url,
            chain_id: raw.sweep_chain_id,
            network: DEFAULT_NETWORK.to_string(),
            data_dir,
            wallet_password: raw.clawbank_wallet_password,
            gas_reserve,
            receipt_timeout: Duration::from_secs(raw.sweep_receipt_timeout_secs),
            receipt_poll_interval: Duration::from_millis(raw.sweep_receipt_poll_ms),
            gas_limit_multiplier_bps: raw.sweep_gas_limit_multiplier_bps.max(10_000),
        })
    }

    pub fn sweep_config_path(&self) -> PathBuf {
        self.data_dir.join(SWEEP_CONFIG_FILE)
    }

    pub fn wallet_path(&self) -> PathBuf {
        self.data_dir.join(WALLET_FILE)
    }
}

impl fmt::Debug for SweeperSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SweeperSettings")
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field("network", &self.network)
            .field("data_dir", &self.data_dir)
            .field("wallet_password", &"<redacted>")
            .field("gas_reserve", &format_native_amount(self.gas_reserve))
            .field("receipt_timeout", &self.receipt_timeout)
            .field("receipt_poll_interval", &self.receipt_poll_interval)
            .field("gas_limit_multiplier_bps", &self.gas_limit_multiplier_bps)
            .finish()
    }
}

fn data_dir_under(home: Option<PathBuf>) -> PathBuf {
    home.unwrap_or_else(|| PathBuf::from(".")).join(".clawbank")
}

fn default_data_dir() -> PathBuf {
    data_dir_under(std::env::var_os("HOME").map(PathBuf::from))
}
