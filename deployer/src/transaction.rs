// deployer/src/transaction.rs

use ethers::{
    core::types::{
        transaction::eip2718::TypedTransaction, Address, Bytes, Eip1559TransactionRequest, TransactionRequest,
        TxHash,
    },
    providers::Middleware,
    signers::{LocalWallet, Signer},
};
use tracing::{debug, info, instrument, warn};

use crate::{
    error::DeployError,
    gas::{self, FeeSettings, GasPolicy},
    signer::DeploymentSigner,
};

/// Everything needed to build a contract-creation transaction.
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    pub init_code: Bytes,
    pub gas: GasPolicy,
    pub fees: FeeSettings,
}

impl DeploymentRequest {
    pub fn new(init_code: Bytes) -> Self {
        Self { init_code, gas: GasPolicy::default(), fees: FeeSettings::default() }
    }

    pub fn with_gas(mut self, gas: GasPolicy) -> Self {
        self.gas = gas;
        self
    }

    pub fn with_fees(mut self, fees: FeeSettings) -> Self {
        self.fees = fees;
        self
    }
}

/// Hands the deployment to the selected signing strategy. Returns once the node
/// has accepted the transaction into its pool; mining is not awaited here.
#[instrument(skip_all, fields(sender = ?signer.address(), mode = %signer.mode()))]
pub async fn submit_deployment<M: Middleware>(
    client: &M,
    signer: &dyn DeploymentSigner<M>,
    request: &DeploymentRequest,
) -> Result<TxHash, DeployError> {
    info!(init_code_len = request.init_code.len(), "Submitting deployment transaction...");
    let tx_hash = signer.submit(client, request).await?;
    info!(?tx_hash, "Deployment transaction accepted by node");
    Ok(tx_hash)
}

/// Assembles the unsigned EIP-1559 creation transaction. `to` stays empty.
pub fn build_creation_tx(
    sender: Address,
    nonce: ethers::types::U256,
    chain_id: u64,
    gas_limit: ethers::types::U256,
    request: &DeploymentRequest,
) -> TypedTransaction {
    Eip1559TransactionRequest::new()
        .from(sender)
        .data(request.init_code.clone())
        .nonce(nonce)
        .gas(gas_limit)
        .max_fee_per_gas(request.fees.max_fee_per_gas)
        .max_priority_fee_per_gas(request.fees.max_priority_fee_per_gas)
        .chain_id(chain_id)
        .into()
}

/// Local-sign path: fetch nonce and chain id, sign with `wallet`, send the raw bytes.
pub async fn send_locally_signed<M: Middleware>(
    client: &M,
    wallet: &LocalWallet,
    request: &DeploymentRequest,
) -> Result<TxHash, DeployError> {
    let sender = wallet.address();
    let rejected = |reason: String| DeployError::Submission { sender, reason };

    let nonce = client
        .get_transaction_count(sender, None)
        .await
        .map_err(|e| rejected(format!("nonce query failed: {e}")))?;
    let chain_id = client
        .get_chainid()
        .await
        .map_err(|e| rejected(format!("chain id query failed: {e}")))?
        .as_u64();
    let gas_limit = gas::resolve_gas_limit(client, sender, &request.init_code, request.gas).await?;
    debug!(%nonce, chain_id, %gas_limit, "Built local deployment transaction");

    let typed_tx = build_creation_tx(sender, nonce, chain_id, gas_limit, request);
    let wallet = wallet.clone().with_chain_id(chain_id);
    let signature = wallet
        .sign_transaction(&typed_tx)
        .await
        .map_err(|e| rejected(format!("signing failed: {e}")))?;
    let rlp_signed = typed_tx.rlp_signed(&signature);

    match client.send_raw_transaction(rlp_signed).await {
        Ok(pending_tx) => Ok(pending_tx.tx_hash()),
        Err(e) => {
            let reason = e.to_string();
            if reason.contains("nonce too low") || reason.contains("already known") {
                warn!(%nonce, "Node reports the nonce as used; a fresh run will pick up the current one");
            }
            Err(rejected(reason))
        }
    }
}

/// Node-sign path: `eth_sendTransaction` with only `from` and `data`, so the node
/// fills nonce, gas and fees itself.
pub async fn send_node_signed<M: Middleware>(
    client: &M,
    sender: Address,
    request: &DeploymentRequest,
) -> Result<TxHash, DeployError> {
    let tx = TransactionRequest::new().from(sender).data(request.init_code.clone());
    client
        .provider()
        .request::<_, TxHash>("eth_sendTransaction", [tx])
        .await
        .map_err(|e| DeployError::Submission { sender, reason: e.to_string() })
}
