// deployer/src/signer.rs

use async_trait::async_trait;
use ethers::{
    prelude::Middleware,
    signers::{LocalWallet, Signer},
    types::{Address, TxHash},
};
use std::fmt;
use tracing::{info, instrument};

use crate::{
    error::DeployError,
    transaction::{self, DeploymentRequest},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningMode {
    /// Transaction is signed in-process with a private key.
    LocalKey,
    /// The node signs for one of its unlocked accounts.
    NodeManaged,
}

impl fmt::Display for SigningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningMode::LocalKey => f.write_str("local key"),
            SigningMode::NodeManaged => f.write_str("node managed"),
        }
    }
}

/// Identity that originates the deployment, and how its transaction gets signed.
#[async_trait]
pub trait DeploymentSigner<M: Middleware>: fmt::Debug + Send + Sync {
    fn address(&self) -> Address;

    fn mode(&self) -> SigningMode;

    /// Submits the creation transaction and returns its hash once the node accepts it.
    async fn submit(&self, client: &M, request: &DeploymentRequest) -> Result<TxHash, DeployError>;
}

pub struct LocalKeySigner {
    wallet: LocalWallet,
}

impl fmt::Debug for LocalKeySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalKeySigner").field("address", &self.wallet.address()).finish()
    }
}

impl LocalKeySigner {
    pub fn new(wallet: LocalWallet) -> Self {
        Self { wallet }
    }

    /// Parses a hex private key; `0x` prefix optional. Key material never ends up in the error.
    pub fn from_hex(key: &str) -> Result<Self, DeployError> {
        let trimmed = key.trim();
        let hex_key = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let bytes = hex::decode(hex_key)
            .map_err(|_| DeployError::InvalidKey("private key is not valid hex".to_string()))?;
        if bytes.len() != 32 {
            return Err(DeployError::InvalidKey(format!(
                "private key must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        let wallet = LocalWallet::from_bytes(&bytes)
            .map_err(|_| DeployError::InvalidKey("private key is not a valid secp256k1 scalar".to_string()))?;
        Ok(Self::new(wallet))
    }

    pub fn wallet(&self) -> &LocalWallet {
        &self.wallet
    }
}

#[async_trait]
impl<M: Middleware> DeploymentSigner<M> for LocalKeySigner {
    fn address(&self) -> Address {
        self.wallet.address()
    }

    fn mode(&self) -> SigningMode {
        SigningMode::LocalKey
    }

    async fn submit(&self, client: &M, request: &DeploymentRequest) -> Result<TxHash, DeployError> {
        transaction::send_locally_signed(client, &self.wallet, request).await
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NodeManagedSigner {
    address: Address,
}

impl NodeManagedSigner {
    pub fn new(address: Address) -> Self {
        Self { address }
    }
}

#[async_trait]
impl<M: Middleware> DeploymentSigner<M> for NodeManagedSigner {
    fn address(&self) -> Address {
        self.address
    }

    fn mode(&self) -> SigningMode {
        SigningMode::NodeManaged
    }

    async fn submit(&self, client: &M, request: &DeploymentRequest) -> Result<TxHash, DeployError> {
        transaction::send_node_signed(client, self.address, request).await
    }
}

/// Picks the deploying identity: the private key when one is given, otherwise
/// the node's unlocked account at `account_index`.
#[instrument(skip(client, private_key), fields(has_key = private_key.is_some()))]
pub async fn resolve_signer<M: Middleware + 'static>(
    client: &M,
    private_key: Option<&str>,
    account_index: usize,
) -> Result<Box<dyn DeploymentSigner<M>>, DeployError> {
    if let Some(key) = private_key {
        let signer = LocalKeySigner::from_hex(key)?;
        info!(sender = ?signer.wallet().address(), "Using local signing key");
        return Ok(Box::new(signer));
    }

    let accounts = client.get_accounts().await.map_err(|e| DeployError::rpc("eth_accounts", e))?;
    if accounts.is_empty() {
        return Err(DeployError::NoSignerAvailable("node exposes no unlocked accounts".to_string()));
    }
    let address = accounts.get(account_index).copied().ok_or_else(|| {
        DeployError::NoSignerAvailable(format!(
            "ACCOUNT_INDEX {account_index} out of range, node has {} unlocked account(s)",
            accounts.len()
        ))
    })?;
    info!(sender = ?address, account_index, "Using node-managed account");
    Ok(Box::new(NodeManagedSigner::new(address)))
}
