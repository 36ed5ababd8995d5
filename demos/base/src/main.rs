use alloy::primitives::U256;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use serde::Serialize;
use sweeper::{
    config::SweeperSettings,
    helpers::{build_chain_client, init_tracing},
    response::OperationResponse,
    store::FileSweepStore,
    wallet::{self, KeystoreWallet},
    SwapRequest, SweepError, Sweeper,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "base-sweep", about = "Sweep native ETH on Base into a target token")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Wallet lifecycle.
    Wallet {
        #[command(subcommand)]
        action: WalletAction,
    },
    /// Set the token that sweeps buy.
    Target { token: String },
    /// Show the sweep configuration and recent sweeps.
    Config,
    /// Balance of a token, or `eth`.
    Balance { token: String },
    /// Swap native ETH into the target token.
    Buy {
        amount: String,
        /// Minimum tokens out, in raw token units.
        #[arg(long)]
        min_out: Option<String>,
    },
    /// Send ETH or a token out of the wallet.
    Send {
        token: String,
        to: String,
        amount: String,
    },
}

#[derive(Subcommand)]
enum WalletAction {
    Create,
    Show,
    ExportKey,
}

fn print<T: Serialize>(result: Result<T, SweepError>) -> eyre::Result<()> {
    println!("{}", OperationResponse::from_result(result).to_json()?);
    Ok(())
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenv().ok();
    init_tracing()?;

    let cli = Cli::parse();
    let settings = SweeperSettings::from_env()?;
    info!(?settings, "loaded settings");

    match cli.command {
        Command::Wallet {
            action: WalletAction::Create,
        } => return print(wallet::create_wallet(&settings)),
        Command::Wallet {
            action: WalletAction::ExportKey,
        } => return print(wallet::export_private_key(&settings)),
        _ => {}
    }

    let keystore = match KeystoreWallet::open(settings.wallet_path(), &settings.wallet_password) {
        Ok(keystore) => keystore,
        Err(e) => return print::<()>(Err(e)),
    };
    let chain = build_chain_client(&settings)?;
    let store = FileSweepStore::new(settings.sweep_config_path());
    let sweeper = Sweeper::new(chain, keystore, store, settings);

    match cli.command {
        Command::Wallet {
            action: WalletAction::Show,
        } => print(sweeper.get_wallet().await),
        Command::Target { token } => print(sweeper.set_target_token(&token).await),
        Command::Config => print(sweeper.get_sweep_config().await),
        Command::Balance { token } => print(sweeper.get_token_balance(&token).await),
        Command::Buy { amount, min_out } => {
            let min_out = match min_out {
                Some(raw) => raw.parse::<U256>()?,
                None => U256::ZERO,
            };
            let request = SwapRequest::new(amount).with_min_amount_out(min_out);
            print(sweeper.execute_swap(request).await)
        }
        Command::Send { token, to, amount } => {
            print(sweeper.send_token(&token, &to, &amount).await)
        }
        Command::Wallet { .. } => Ok(()),
    }
}
