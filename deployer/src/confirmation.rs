// deployer/src/confirmation.rs

use ethers::{
    providers::Middleware,
    types::{Address, TransactionReceipt, TxHash, U256, U64},
};
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, instrument, warn};

use crate::error::DeployError;

const TX_CONFIRMATION_TIMEOUT_SECS: u64 = 120;
const TX_POLLING_INTERVAL_MS: u64 = 1_000;
const TX_FAILED_STATUS: U64 = U64([0]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    /// Upper bound on the whole wait.
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(TX_CONFIRMATION_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(TX_POLLING_INTERVAL_MS),
        }
    }
}

/// A mined, successful contract creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedContract {
    pub address: Address,
    pub tx_hash: TxHash,
    pub block_number: Option<U64>,
    pub gas_used: Option<U256>,
}

/// Polls for the receipt of `tx_hash` until it is mined or `policy.timeout` elapses.
#[instrument(skip(client, policy), fields(timeout = ?policy.timeout))]
pub async fn wait_for_deployment<M: Middleware>(
    client: &M,
    tx_hash: TxHash,
    policy: &ConfirmationPolicy,
) -> Result<DeployedContract, DeployError> {
    let started = Instant::now();
    let receipt = timeout(policy.timeout, poll_receipt(client, tx_hash, policy.poll_interval))
        .await
        .map_err(|_| {
            warn!(?tx_hash, "Timed out waiting for receipt; the deployment may still land");
            DeployError::ConfirmationTimeout { tx_hash, waited: started.elapsed() }
        })?;
    deployed_contract_from_receipt(receipt)
}

async fn poll_receipt<M: Middleware>(client: &M, tx_hash: TxHash, interval: Duration) -> TransactionReceipt {
    let mut polls: u32 = 0;
    loop {
        polls += 1;
        match client.get_transaction_receipt(tx_hash).await {
            Ok(Some(receipt)) => {
                debug!(polls, "Receipt found");
                return receipt;
            }
            Ok(None) => debug!(polls, "Transaction still pending"),
            Err(e) => warn!(polls, error = %e, "Receipt query failed, retrying"),
        }
        sleep(interval).await;
    }
}

/// Turns a mined receipt into the deployed address, or a revert.
pub fn deployed_contract_from_receipt(receipt: TransactionReceipt) -> Result<DeployedContract, DeployError> {
    let tx_hash = receipt.transaction_hash;
    let reverted = receipt.status == Some(TX_FAILED_STATUS);
    match receipt.contract_address {
        Some(address) if !reverted => {
            info!(?address, block = ?receipt.block_number, gas_used = ?receipt.gas_used, "Deployment mined");
            Ok(DeployedContract {
                address,
                tx_hash,
                block_number: receipt.block_number,
                gas_used: receipt.gas_used,
            })
        }
        _ => Err(DeployError::RevertedDeployment { tx_hash, status: receipt.status.map(|s| s.as_u64()) }),
    }
}
