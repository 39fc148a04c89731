// tests/live_node_test.rs
#![cfg(feature = "live_node")] // Only compile when live_node feature is enabled

// Needs a dev node with unlocked accounts (anvil, hardhat, ganache) on RPC_URL
// and network access for the first solc download:
//   anvil &
//   cargo test --features live_node -- --ignored

use ethers::providers::{Http, Middleware, Provider};
use eyre::Result;
use social_deployer::{run_deployment, Config, DeploymentArtifact, SvmSolc};
use std::{collections::HashMap, sync::Arc, time::Duration};

#[tokio::test]
#[ignore]
async fn deploys_fixture_twice_against_local_node() -> Result<()> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let dir = tempfile::tempdir()?;
    let artifact_path = dir.path().join("static/contract.json");
    let rpc_url = std::env::var("RPC_URL").unwrap_or_else(|_| "http://127.0.0.1:8545".to_string());
    let vars = HashMap::from([
        ("RPC_URL", rpc_url.clone()),
        ("CONTRACT_PATH", concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/Social.sol").to_string()),
        ("ARTIFACT_PATH", artifact_path.to_string_lossy().into_owned()),
        ("POLL_INTERVAL_MS", "100".to_string()),
    ]);
    let config = Config::from_lookup(|key| vars.get(key).cloned())?;

    let provider = Provider::<Http>::try_from(rpc_url.as_str())?.interval(Duration::from_millis(100));
    let node_chain_id = provider.get_chainid().await?.as_u64();
    let client = Arc::new(provider);
    let compiler = Arc::new(SvmSolc::pinned());

    let first = run_deployment(client.clone(), compiler.clone(), &config).await?;
    let artifact = DeploymentArtifact::load(&artifact_path)?.expect("artifact written");
    assert_eq!(artifact.address, first.address);
    assert_eq!(artifact.chain_id, node_chain_id);
    assert!(!artifact.abi.as_array().unwrap().is_empty());

    let second = run_deployment(client, compiler, &config).await?;
    let redeployed = DeploymentArtifact::load(&artifact_path)?.expect("artifact written");
    assert_ne!(second.address, first.address);
    assert_eq!(redeployed.address, second.address);
    assert_eq!(redeployed.abi, artifact.abi);
    Ok(())
}
