// deployer/src/deploy.rs

use ethers::{
    providers::Middleware,
    types::{Address, TxHash},
};
use std::{fs, path::PathBuf, sync::Arc};
use tracing::{error, info, instrument, warn};

use crate::{
    artifact::DeploymentArtifact,
    compiler::{compile_contract, CompiledContract, SolidityCompiler},
    config::Config,
    confirmation::wait_for_deployment,
    error::DeployError,
    signer::resolve_signer,
    source::{load_source, SourceUnit},
    transaction::{submit_deployment, DeploymentRequest},
    utils::display_gwei,
};

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentOutcome {
    pub address: Address,
    pub tx_hash: TxHash,
    pub chain_id: u64,
    pub sender: Address,
    pub artifact_path: PathBuf,
}

/// Runs compile, sign, submit, confirm and persist once, in that order.
/// Every run deploys a new contract instance.
#[instrument(skip_all, fields(contract = %config.contract_name))]
pub async fn run_deployment<M: Middleware + 'static>(
    client: Arc<M>,
    compiler: Arc<dyn SolidityCompiler>,
    config: &Config,
) -> Result<DeploymentOutcome, DeployError> {
    info!(rpc_url = %config.rpc_url, "Connecting to node...");
    let client_version = client.client_version().await.map_err(|e| DeployError::rpc("web3_clientVersion", e))?;
    info!(%client_version, "Node reachable");

    // 1. Source
    let unit = load_source(&config.contract_path, &config.contract_name)?;

    // 2. Compile
    let compiled = compile_blocking(compiler, unit).await?;

    // 3. Signer
    let signer = resolve_signer(client.as_ref(), config.private_key.as_deref(), config.account_index).await?;
    let sender = signer.address();

    // 4. Submit
    let request = DeploymentRequest::new(compiled.bytecode.clone())
        .with_gas(config.gas_policy())
        .with_fees(config.fee_settings());
    info!(
        ?sender,
        max_fee = %display_gwei(request.fees.max_fee_per_gas),
        max_priority_fee = %display_gwei(request.fees.max_priority_fee_per_gas),
        "Deploying {}", compiled.name
    );
    let tx_hash = submit_deployment(client.as_ref(), signer.as_ref(), &request).await?;

    // 5. Confirm
    let deployed = wait_for_deployment(client.as_ref(), tx_hash, &config.confirmation_policy()).await?;
    info!(address = ?deployed.address, ?tx_hash, "Deployed {}", compiled.name);

    // 6. Persist, with the chain id read back from the node
    let chain_id = match client.get_chainid().await {
        Ok(id) => id.as_u64(),
        Err(e) => {
            error!(address = ?deployed.address, ?tx_hash, error = %e, "Contract deployed but chain id query failed; artifact not written");
            return Err(unrecorded(deployed.address, tx_hash, DeployError::rpc("eth_chainId", e)));
        }
    };
    if let Some(configured) = config.chain_id {
        if configured != chain_id {
            warn!(configured, node = chain_id, "CHAIN_ID differs from the node; persisting the node's value");
        }
    }

    let artifact = DeploymentArtifact::new(deployed.address, compiled.abi, chain_id);
    if let Err(e) = persist(&artifact, &config.artifact_path) {
        error!(
            address = ?deployed.address,
            ?tx_hash,
            chain_id,
            path = %config.artifact_path.display(),
            error = %e,
            "Contract deployed but artifact write failed; record the address manually"
        );
        return Err(unrecorded(deployed.address, tx_hash, e));
    }

    Ok(DeploymentOutcome {
        address: deployed.address,
        tx_hash,
        chain_id,
        sender,
        artifact_path: config.artifact_path.clone(),
    })
}

/// solc (and its first-use download) blocks, so it runs off the async workers.
async fn compile_blocking(compiler: Arc<dyn SolidityCompiler>, unit: SourceUnit) -> Result<CompiledContract, DeployError> {
    tokio::task::spawn_blocking(move || compile_contract(compiler.as_ref(), &unit))
        .await
        .map_err(|e| DeployError::Compilation(format!("compiler task aborted: {e}")))?
}

fn unrecorded(address: Address, tx_hash: TxHash, source: DeployError) -> DeployError {
    DeployError::Unrecorded { address, tx_hash, source: Box::new(source) }
}

fn persist(artifact: &DeploymentArtifact, path: &std::path::Path) -> Result<(), DeployError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| DeployError::Persist { path: path.to_path_buf(), source })?;
    }
    artifact.write_atomic(path)
}
