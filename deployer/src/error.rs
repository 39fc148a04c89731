// deployer/src/error.rs

use ethers::types::{Address, TxHash};
use std::{fmt, io, path::PathBuf, time::Duration};
use thiserror::Error;

/// Pipeline stage a failure belongs to, used in operator-facing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Connect,
    LoadSource,
    Compile,
    ResolveSigner,
    Submit,
    Confirm,
    Persist,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Connect => "connect",
            Stage::LoadSource => "load source",
            Stage::Compile => "compile",
            Stage::ResolveSigner => "resolve signer",
            Stage::Submit => "submit",
            Stage::Confirm => "confirm",
            Stage::Persist => "persist artifact",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("failed to read contract source {}: {source}", .path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("compilation failed: {0}")]
    Compilation(String),

    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("no signer available: {0}")]
    NoSignerAvailable(String),

    #[error("node rejected deployment from {sender:?}: {reason}")]
    Submission { sender: Address, reason: String },

    #[error("no receipt for {tx_hash:?} after {waited:?}; the transaction may still be mined")]
    ConfirmationTimeout { tx_hash: TxHash, waited: Duration },

    #[error("deployment transaction {tx_hash:?} reverted (status {status:?})")]
    RevertedDeployment { tx_hash: TxHash, status: Option<u64> },

    #[error("failed to persist artifact to {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The contract is on-chain but its artifact could not be written.
    #[error("contract {address:?} deployed in {tx_hash:?} but not recorded: {source}")]
    Unrecorded {
        address: Address,
        tx_hash: TxHash,
        #[source]
        source: Box<DeployError>,
    },

    /// A plain node query failed (connectivity, account listing, chain id).
    #[error("rpc call {method} failed: {reason}")]
    Rpc { method: &'static str, reason: String },
}

impl DeployError {
    pub fn stage(&self) -> Stage {
        match self {
            DeployError::SourceRead { .. } => Stage::LoadSource,
            DeployError::Compilation(_) => Stage::Compile,
            DeployError::InvalidKey(_) | DeployError::NoSignerAvailable(_) => Stage::ResolveSigner,
            DeployError::Submission { .. } => Stage::Submit,
            DeployError::ConfirmationTimeout { .. } | DeployError::RevertedDeployment { .. } => {
                Stage::Confirm
            }
            DeployError::Persist { .. } => Stage::Persist,
            DeployError::Unrecorded { source, .. } => source.stage(),
            DeployError::Rpc { method, .. } => match *method {
                "eth_accounts" => Stage::ResolveSigner,
                "eth_chainId" => Stage::Persist,
                _ => Stage::Connect,
            },
        }
    }

    /// True when the outcome on-chain is unknown rather than failed.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, DeployError::ConfirmationTimeout { .. })
    }

    /// Address of a contract that was deployed before the run failed.
    pub fn deployed_address(&self) -> Option<Address> {
        match self {
            DeployError::Unrecorded { address, .. } => Some(*address),
            _ => None,
        }
    }

    pub(crate) fn rpc(method: &'static str, err: impl fmt::Display) -> Self {
        DeployError::Rpc { method, reason: err.to_string() }
    }
}
