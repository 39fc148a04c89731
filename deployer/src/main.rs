// deployer/src/main.rs

use ethers::providers::{Http, Provider};
use eyre::{Result, WrapErr};
use std::{process::ExitCode, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

use social_deployer::{load_config, run_deployment, Config, DeployError, SvmSolc};

// exit status for a deployment whose outcome on-chain is unknown
const EXIT_AMBIGUOUS: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env_lossy())
        .with_target(false)
        .init();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("invalid configuration: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match deploy(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<DeployError>() {
            Some(deploy_err) => {
                error!(stage = %deploy_err.stage(), "deployment failed: {e:#}");
                if deploy_err.is_ambiguous() {
                    ExitCode::from(EXIT_AMBIGUOUS)
                } else {
                    ExitCode::FAILURE
                }
            }
            None => {
                error!("deployment failed: {e:#}");
                ExitCode::FAILURE
            }
        },
    }
}

async fn deploy(config: &Config) -> Result<()> {
    let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
        .wrap_err_with(|| format!("invalid RPC_URL {}", config.rpc_url))?
        .interval(config.poll_interval);
    let client = Arc::new(provider);

    let outcome = run_deployment(client, Arc::new(SvmSolc::pinned()), config).await?;
    info!(
        address = ?outcome.address,
        tx_hash = ?outcome.tx_hash,
        sender = ?outcome.sender,
        chain_id = outcome.chain_id,
        "Wrote {} with chainId {}",
        outcome.artifact_path.display(),
        outcome.chain_id
    );
    Ok(())
}
