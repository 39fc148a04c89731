// deployer/src/gas.rs
// Gas limit and fee selection for the creation transaction.

use ethers::{
    prelude::Middleware,
    types::{transaction::eip2718::TypedTransaction, Address, Bytes, Eip1559TransactionRequest, U256},
};
use tracing::{debug, instrument};

use crate::error::DeployError;

/// EIP-1559 fee fields, both in wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSettings {
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

impl Default for FeeSettings {
    fn default() -> Self {
        Self {
            max_fee_per_gas: U256::from(2_000_000_000u64),
            max_priority_fee_per_gas: U256::from(1_000_000_000u64),
        }
    }
}

/// How the gas limit of a locally signed deployment is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasPolicy {
    Fixed(u64),
    Estimate { buffer_percentage: u64 },
}

impl Default for GasPolicy {
    fn default() -> Self {
        GasPolicy::Fixed(crate::config::DEFAULT_GAS_LIMIT)
    }
}

/// Resolves the gas limit for deploying `init_code` from `sender`.
pub async fn resolve_gas_limit<M: Middleware>(
    client: &M,
    sender: Address,
    init_code: &Bytes,
    policy: GasPolicy,
) -> Result<U256, DeployError> {
    match policy {
        GasPolicy::Fixed(limit) => Ok(U256::from(limit)),
        GasPolicy::Estimate { buffer_percentage } => {
            let estimate = estimate_deployment_gas(client, sender, init_code).await?;
            Ok(with_buffer(estimate, buffer_percentage))
        }
    }
}

/// Estimates the gas required for the contract creation.
/// This involves sending an `eth_estimateGas` RPC call.
#[instrument(skip(client, init_code), level = "debug", fields(sender = %sender, code_len = init_code.len()))]
pub async fn estimate_deployment_gas<M: Middleware>(
    client: &M,
    sender: Address,
    init_code: &Bytes,
) -> Result<U256, DeployError> {
    let tx: TypedTransaction = Eip1559TransactionRequest::new().from(sender).data(init_code.clone()).into();
    let estimated = client.estimate_gas(&tx, None).await.map_err(|e| DeployError::Submission {
        sender,
        reason: format!("gas estimation failed: {e}"),
    })?;
    debug!(estimated_gas = %estimated, "Gas estimation successful");
    Ok(estimated)
}

pub fn with_buffer(estimate: U256, buffer_percentage: u64) -> U256 {
    estimate + estimate * U256::from(buffer_percentage) / U256::from(100u64)
}
