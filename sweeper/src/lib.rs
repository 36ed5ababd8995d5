use alloy::{
    primitives::{address, Address},
    sol,
};

pub mod adapters;
pub mod address;
pub mod amount;
pub mod chain;
pub mod config;
pub mod error;
pub mod helpers;
pub mod response;
pub mod store;
pub mod sweeper;
pub mod token;
pub mod transfer;
pub mod wallet;

pub use error::{ErrorKind, SweepError};
pub use sweeper::{SwapRequest, SwapResult, Sweeper};

sol!(
    #[allow(missing_docs)]
    #[derive(Debug)]
    interface IERC20 {
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
    }
);

sol!(
    #[allow(missing_docs)]
    #[derive(Debug)]
    interface IUniversalRouter {
        function execute(bytes commands, bytes[] inputs, uint256 deadline) external payable;
    }
);

/// Symbol used when rendering native-currency amounts.
pub const NATIVE_SYMBOL: &str = "ETH";

/// Wrapped ether on Base.
pub static WETH_ADDRESS: Address = address!("4200000000000000000000000000000000000006");
/// Universal Router deployment used for fee-tier (V3) swaps.
pub static FEE_TIER_ROUTER_ADDRESS: Address = address!("3fc91a3afd70395cd496c647d5a6cc9d4b2b7fad");
/// Universal Router deployment with V4 singleton-pool support.
pub static UNIVERSAL_ROUTER_ADDRESS: Address = address!("6ff5693b99212da76ad316178a184ab56d299b43");
/// ClawBank token, only tradable through its hook pool.
pub static CLAWBANK_ADDRESS: Address = address!("16332535e2c27da578bc2e82beb09ce9d3c8eb07");
/// Hook contract attached to the ClawBank/WETH singleton pool.
pub static CLAWBANK_HOOKS_ADDRESS: Address = address!("b429d62f8f3bffb98cdb9569533ea23bf0ba28cc");
