// deployer/src/artifact.rs
// The `{address, abi, chainId}` document the frontend loads.

use ethers::types::Address;
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::{self, Write},
    path::Path,
};
use tempfile::Builder;
use tracing::info;

use crate::{error::DeployError, utils::serialize_checksummed};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentArtifact {
    #[serde(serialize_with = "serialize_checksummed")]
    pub address: Address,
    pub abi: serde_json::Value,
    #[serde(rename = "chainId")]
    pub chain_id: u64,
}

impl DeploymentArtifact {
    pub fn new(address: Address, abi: serde_json::Value, chain_id: u64) -> Self {
        Self { address, abi, chain_id }
    }

    /// Pretty JSON, two-space indent, trailing newline.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Replaces `path` with this artifact. Readers see either the previous
    /// document or the new one, never a partial file. The parent directory must exist.
    pub fn write_atomic(&self, path: impl AsRef<Path>) -> Result<(), DeployError> {
        let path = path.as_ref();
        let persist_err = |source: io::Error| DeployError::Persist { path: path.to_path_buf(), source };

        let json = self.to_json_pretty().map_err(|e| persist_err(e.into()))?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        #[cfg_attr(not(unix), allow(unused_mut))]
        let mut builder = Builder::new();
        // plain-create mode, umask applies; tempfile alone would give 0600
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(fs::Permissions::from_mode(0o644));
        }
        let mut tmp = builder.tempfile_in(dir).map_err(persist_err)?;
        // a redeploy keeps the previous artifact's mode
        if let Ok(existing) = fs::metadata(path) {
            tmp.as_file().set_permissions(existing.permissions()).map_err(persist_err)?;
        }
        tmp.write_all(json.as_bytes()).map_err(persist_err)?;
        tmp.as_file().sync_all().map_err(persist_err)?;
        tmp.persist(path).map_err(|e| persist_err(e.error))?;

        info!(path = %path.display(), address = ?self.address, chain_id = self.chain_id, "Wrote deployment artifact");
        Ok(())
    }

    /// Reads a previously written artifact. A missing file means nothing was deployed yet.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).wrap_err_with(|| format!("Failed to read artifact at {}", path.display())),
        };
        let artifact = serde_json::from_str(&contents)
            .wrap_err_with(|| format!("Failed to parse artifact JSON at {}", path.display()))?;
        Ok(Some(artifact))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::{
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
        thread,
    };

    fn sample(byte: u8) -> DeploymentArtifact {
        DeploymentArtifact::new(
            Address::repeat_byte(byte),
            json!([{"type": "function", "name": "post", "inputs": [], "outputs": [], "stateMutability": "nonpayable"}]),
            31337,
        )
    }

    #[test]
    fn serializes_keys_in_fixed_order_with_checksummed_address() {
        let artifact = DeploymentArtifact::new(
            "0x5fbdb2315678afecb367f032d93f642f64180aa3".parse().unwrap(),
            json!([]),
            1337,
        );
        let json = artifact.to_json_pretty().unwrap();
        assert_eq!(
            json,
            "{\n  \"address\": \"0x5FbDB2315678afecb367f032d93F642f64180aa3\",\n  \"abi\": [],\n  \"chainId\": 1337\n}\n"
        );
    }

    #[test]
    fn load_returns_none_before_first_deployment() {
        let dir = tempfile::tempdir().unwrap();
        assert!(DeploymentArtifact::load(dir.path().join("contract.json")).unwrap().is_none());
    }

    #[test]
    fn write_overwrites_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contract.json");
        sample(0x01).write_atomic(&path).unwrap();
        sample(0x02).write_atomic(&path).unwrap();

        let loaded = DeploymentArtifact::load(&path).unwrap().unwrap();
        assert_eq!(loaded, sample(0x02));
        // only the artifact itself remains, no stray temp files
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn rewrite_keeps_existing_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contract.json");
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        sample(0x01).write_atomic(&path).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o644);

        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();
        sample(0x02).write_atomic(&path).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o640);
    }

    #[cfg(unix)]
    #[test]
    fn first_write_is_not_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contract.json");
        sample(0x01).write_atomic(&path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        // 0644 before umask; never tighter than the tempfile default of 0600
        assert_eq!(mode & 0o600, 0o600);
        assert_eq!(mode & !0o644, 0);
    }

    #[test]
    fn missing_parent_directory_is_a_persist_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = sample(0x01).write_atomic(dir.path().join("static/contract.json")).unwrap_err();
        assert!(matches!(err, DeployError::Persist { .. }));
    }

    #[test]
    fn concurrent_reader_never_sees_partial_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contract.json");
        sample(0x01).write_atomic(&path).unwrap();

        let done = Arc::new(AtomicBool::new(false));
        let reader = {
            let (done, path) = (done.clone(), path.clone());
            thread::spawn(move || {
                let mut reads = 0u32;
                loop {
                    let contents = fs::read_to_string(&path).expect("artifact disappeared mid-rewrite");
                    serde_json::from_str::<DeploymentArtifact>(&contents).expect("reader observed invalid JSON");
                    reads += 1;
                    if done.load(Ordering::Acquire) {
                        break reads;
                    }
                }
            })
        };

        for i in 0..200u32 {
            sample((i % 250) as u8 + 1).write_atomic(&path).unwrap();
        }
        done.store(true, Ordering::Release);
        assert!(reader.join().unwrap() > 0);
    }
}
