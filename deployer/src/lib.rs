// deployer/src/lib.rs
// Library interface for the contract deployment pipeline.

pub mod artifact;
pub mod compiler;
pub mod config;
pub mod confirmation;
pub mod deploy;
pub mod error;
pub mod gas;
pub mod signer;
pub mod source;
pub mod transaction;
pub mod utils;

// Public types re-exported for the binary and integration tests
pub use artifact::DeploymentArtifact;
pub use compiler::{compile_contract, CompiledContract, SolidityCompiler, SvmSolc};
pub use config::{load_config, Config};
pub use confirmation::{wait_for_deployment, ConfirmationPolicy, DeployedContract};
pub use deploy::{run_deployment, DeploymentOutcome};
pub use error::{DeployError, Stage};
pub use signer::{resolve_signer, DeploymentSigner, LocalKeySigner, NodeManagedSigner, SigningMode};
pub use source::{load_source, SourceUnit};
pub use transaction::{submit_deployment, DeploymentRequest};
