// deployer/src/source.rs

use std::{fs, path::Path};
use tracing::debug;

use crate::error::DeployError;

/// Contract source text plus the names the compiler needs to address it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// Logical contract name, e.g. `Social`.
    pub contract_name: String,
    /// Key of the source in the standard-JSON input, e.g. `Social.sol`.
    pub file_name: String,
    pub content: String,
}

impl SourceUnit {
    pub fn new(contract_name: impl Into<String>, file_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self { contract_name: contract_name.into(), file_name: file_name.into(), content: content.into() }
    }
}

pub fn load_source(path: impl AsRef<Path>, contract_name: &str) -> Result<SourceUnit, DeployError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|source| DeployError::SourceRead { path: path.to_path_buf(), source })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{contract_name}.sol"));
    debug!(path = %path.display(), bytes = content.len(), "Loaded contract source");
    Ok(SourceUnit::new(contract_name, file_name, content))
}
