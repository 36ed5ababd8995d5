//! Wallet custody.
//!
//! The sweeper only ever asks a custodian for its address and for a signed,
//! EIP-2718 encoded transaction. [`KeystoreWallet`] keeps the key encrypted on
//! disk and decrypts it for the duration of a single signing call;
//! [`SignerWallet`] holds an already-unlocked signer in memory.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use alloy::{
    eips::eip2718::Encodable2718,
    network::{EthereumWallet, TransactionBuilder},
    primitives::{Address, Bytes},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
};
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::{address::to_checksummed_address, config::SweeperSettings, SweepError};

#[async_trait]
pub trait WalletCustody: Send + Sync {
    fn address(&self) -> Address;

    /// Signs a fully populated transaction and returns its raw encoding.
    async fn sign_transaction(&self, tx: TransactionRequest) -> Result<Bytes, SweepError>;
}

async fn sign_with(signer: PrivateKeySigner, tx: TransactionRequest) -> Result<Bytes, SweepError> {
    let wallet = EthereumWallet::from(signer);
    let envelope = tx
        .build(&wallet)
        .await
        .map_err(|e| SweepError::Signing(e.to_string()))?;
    Ok(envelope.encoded_2718().into())
}

/// In-memory signer.
pub struct SignerWallet {
    signer: PrivateKeySigner,
}

impl SignerWallet {
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self { signer }
    }
}

#[async_trait]
impl WalletCustody for SignerWallet {
    fn address(&self) -> Address {
        self.signer.address()
    }

    async fn sign_transaction(&self, tx: TransactionRequest) -> Result<Bytes, SweepError> {
        sign_with(self.signer.clone(), tx.with_from(self.signer.address())).await
    }
}

/// Key material returned by [`KeystoreWallet::export_private_key`].
#[derive(Serialize)]
pub struct ExportedKey {
    pub private_key: String,
    pub address: String,
    pub warning: &'static str,
}

impl fmt::Debug for ExportedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportedKey")
            .field("private_key", &"<redacted>")
            .field("address", &self.address)
            .finish()
    }
}

const EXPORT_WARNING: &str =
    "Do not share this key. Anyone with this key has full control of the wallet.";

/// Encrypted V3 keystore on disk.
pub struct KeystoreWallet {
    path: PathBuf,
    password: String,
    address: Address,
}

impl fmt::Debug for KeystoreWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeystoreWallet")
            .field("path", &self.path)
            .field("password", &"<redacted>")
            .field("address", &self.address)
            .finish()
    }
}

impl KeystoreWallet {
    /// Opens the keystore at `path`, creating a fresh key if none exists.
    /// Returns the wallet and whether it was newly created.
    pub fn create(path: impl AsRef<Path>, password: &str) -> Result<(Self, bool), SweepError> {
        let path = path.as_ref();
        if path.exists() {
            return Ok((Self::open(path, password)?, false));
        }
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)
            .map_err(|e| SweepError::Keystore(format!("create {}: {e}", dir.display())))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(crate::config::WALLET_FILE);

        let (signer, _uuid) =
            PrivateKeySigner::new_keystore(dir, &mut rand::thread_rng(), password, Some(name))
                .map_err(|e| SweepError::Keystore(format!("creation failed: {e}")))?;
        let address = signer.address();
        drop(signer);
        write_address_field(path, address)?;
        info!(address = %address, path = %path.display(), "created wallet keystore");

        Ok((
            Self {
                path: path.to_path_buf(),
                password: password.to_string(),
                address,
            },
            true,
        ))
    }

    /// Opens an existing keystore. The address is taken from the keystore's
    /// `address` field when present, otherwise the key is decrypted once.
    pub fn open(path: impl AsRef<Path>, password: &str) -> Result<Self, SweepError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SweepError::WalletMissing);
        }
        let mut wallet = Self {
            path: path.to_path_buf(),
            password: password.to_string(),
            address: Address::ZERO,
        };
        wallet.address = match read_address_field(path) {
            Some(address) => address,
            None => wallet.decrypt()?.address(),
        };
        Ok(wallet)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn decrypt(&self) -> Result<PrivateKeySigner, SweepError> {
        PrivateKeySigner::decrypt_keystore(&self.path, &self.password)
            .map_err(|e| SweepError::Decryption(e.to_string()))
    }

    /// Decrypts and returns the raw private key. Meant for manual recovery
    /// only; nothing else in the crate exposes key material.
    pub fn export_private_key(&self) -> Result<ExportedKey, SweepError> {
        let signer = self.decrypt()?;
        Ok(ExportedKey {
            private_key: alloy::hex::encode_prefixed(signer.to_bytes()),
            address: to_checksummed_address(&signer.address()),
            warning: EXPORT_WARNING,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletCreated {
    pub address: String,
    pub created: bool,
    pub keystore: String,
}

/// Creates the keystore at the configured location unless one exists.
pub fn create_wallet(settings: &SweeperSettings) -> Result<WalletCreated, SweepError> {
    let path = settings.wallet_path();
    let (wallet, created) = KeystoreWallet::create(&path, &settings.wallet_password)?;
    Ok(WalletCreated {
        address: to_checksummed_address(&wallet.address()),
        created,
        keystore: path.display().to_string(),
    })
}

pub fn open_wallet(settings: &SweeperSettings) -> Result<KeystoreWallet, SweepError> {
    KeystoreWallet::open(settings.wallet_path(), &settings.wallet_password)
}

pub fn export_private_key(settings: &SweeperSettings) -> Result<ExportedKey, SweepError> {
    open_wallet(settings)?.export_private_key()
}

#[async_trait]
impl WalletCustody for KeystoreWallet {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_transaction(&self, tx: TransactionRequest) -> Result<Bytes, SweepError> {
        let signer = self.decrypt()?;
        sign_with(signer, tx.with_from(self.address)).await
    }
}

fn read_address_field(path: &Path) -> Option<Address> {
    let raw = fs::read_to_string(path).ok()?;
    let json: serde_json::Value = serde_json::from_str(&raw).ok()?;
    let field = json.get("address")?.as_str()?;
    let hex = field.strip_prefix("0x").unwrap_or(field);
    format!("0x{hex}").parse().ok()
}

// web3-style keystores carry the address so it can be read without the password.
fn write_address_field(path: &Path, address: Address) -> Result<(), SweepError> {
    let io_err = |e: std::io::Error| SweepError::Keystore(format!("{}: {e}", path.display()));
    let raw = fs::read_to_string(path).map_err(io_err)?;
    let mut json: serde_json::Value =
        serde_json::from_str(&raw).map_err(|e| SweepError::Keystore(e.to_string()))?;
    if let Some(object) = json.as_object_mut() {
        object.insert(
            "address".to_string(),
            serde_json::Value::String(alloy::hex::encode(address)),
        );
    }
    let body =
        serde_json::to_string_pretty(&json).map_err(|e| SweepError::Keystore(e.to_string()))?;
    fs::write(path, body).map_err(io_err)
}
