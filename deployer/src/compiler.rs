// deployer/src/compiler.rs

use ethers::{
    solc::{
        artifacts::{output_selection::OutputSelection, CompilerInput, CompilerOutput, Optimizer, Settings, Source},
        Solc,
    },
    types::Bytes,
};
use std::{collections::BTreeMap, path::PathBuf};
use tracing::{debug, info, instrument, warn};

use crate::{error::DeployError, source::SourceUnit};

pub const SOLC_VERSION: &str = "0.8.20";
pub const OPTIMIZER_RUNS: usize = 200;

/// Anything that can turn a standard-JSON input into a standard-JSON output.
pub trait SolidityCompiler: Send + Sync {
    fn compile(&self, input: &CompilerInput) -> Result<CompilerOutput, DeployError>;
}

/// solc resolved through svm, pinned to one version.
#[derive(Debug, Clone)]
pub struct SvmSolc {
    version: String,
}

impl SvmSolc {
    pub fn new(version: impl Into<String>) -> Self {
        Self { version: version.into() }
    }

    pub fn pinned() -> Self {
        Self::new(SOLC_VERSION)
    }
}

impl SolidityCompiler for SvmSolc {
    fn compile(&self, input: &CompilerInput) -> Result<CompilerOutput, DeployError> {
        // no-op once the binary sits in the svm cache
        let solc = Solc::find_or_install_svm_version(&self.version)
            .map_err(|e| DeployError::Compilation(format!("could not install solc {}: {e}", self.version)))?;
        debug!(solc = %solc.solc.display(), "Invoking solc");
        solc.compile(input)
            .map_err(|e| DeployError::Compilation(format!("solc {} failed to run: {e}", self.version)))
    }
}

/// Compiled artefacts for the one contract being deployed.
#[derive(Debug, Clone)]
pub struct CompiledContract {
    pub name: String,
    /// ABI exactly as the compiler emitted it.
    pub abi: serde_json::Value,
    pub bytecode: Bytes,
}

/// Standard-JSON input requesting ABI and creation bytecode with the optimizer on.
pub fn compiler_input(unit: &SourceUnit) -> CompilerInput {
    let mut sources = BTreeMap::new();
    sources.insert(PathBuf::from(&unit.file_name), Source::new(unit.content.clone()));

    let settings = Settings {
        optimizer: Optimizer { enabled: Some(true), runs: Some(OPTIMIZER_RUNS), details: None },
        output_selection: OutputSelection::from(BTreeMap::from([(
            "*".to_string(),
            BTreeMap::from([("*".to_string(), vec!["abi".to_string(), "evm.bytecode".to_string()])]),
        )])),
        ..Default::default()
    };

    CompilerInput { language: "Solidity".to_string(), sources, settings }
}

#[instrument(skip_all, fields(contract = %unit.contract_name, file = %unit.file_name))]
pub fn compile_contract(compiler: &dyn SolidityCompiler, unit: &SourceUnit) -> Result<CompiledContract, DeployError> {
    let output = compiler.compile(&compiler_input(unit))?;

    let mut errors = Vec::new();
    for diagnostic in &output.errors {
        let text = diagnostic.formatted_message.clone().unwrap_or_else(|| diagnostic.message.clone());
        if diagnostic.severity.is_error() {
            errors.push(text);
        } else {
            warn!(diagnostic = %text.trim_end(), "Compiler diagnostic");
        }
    }
    if !errors.is_empty() {
        return Err(DeployError::Compilation(errors.join("\n")));
    }

    let contract = output
        .contracts
        .get(&unit.file_name)
        .and_then(|contracts| contracts.get(&unit.contract_name))
        .ok_or_else(|| {
            DeployError::Compilation(format!(
                "contract {} not found in {}",
                unit.contract_name, unit.file_name
            ))
        })?;

    let abi = contract
        .abi
        .as_ref()
        .map(|abi| abi.abi_value.clone())
        .ok_or_else(|| DeployError::Compilation(format!("no ABI emitted for {}", unit.contract_name)))?;

    let bytecode = contract
        .evm
        .as_ref()
        .and_then(|evm| evm.bytecode.as_ref())
        .ok_or_else(|| DeployError::Compilation(format!("no bytecode emitted for {}", unit.contract_name)))?;
    let bytecode = bytecode.object.as_bytes().cloned().ok_or_else(|| {
        DeployError::Compilation(format!("bytecode of {} has unlinked libraries", unit.contract_name))
    })?;
    if bytecode.is_empty() {
        return Err(DeployError::Compilation(format!(
            "bytecode of {} is empty (abstract contract or interface?)",
            unit.contract_name
        )));
    }

    info!(abi_entries = abi.as_array().map_or(0, Vec::len), bytecode_len = bytecode.len(), "Compiled contract");
    Ok(CompiledContract { name: unit.contract_name.clone(), abi, bytecode })
}
