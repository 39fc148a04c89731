// deployer/src/utils.rs

use ethers::types::{Address, U256};
use ethers::utils::{format_units as ethers_format_units, to_checksum};
use eyre::Result;
use serde::Serializer;

/// Serializes an address in EIP-55 mixed-case form, the way web3 tooling prints it.
pub fn serialize_checksummed<S: Serializer>(address: &Address, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&to_checksum(address, None))
}

pub fn format_units(value: U256, units: &str) -> Result<String> {
    ethers_format_units(value, units).map_err(|e| eyre::eyre!("Failed to format units: {}", e))
}

/// Human-readable gwei amount for logs; falls back to raw wei.
pub fn display_gwei(value: U256) -> String {
    format_units(value, "gwei").map(|s| format!("{s} gwei")).unwrap_or_else(|_| format!("{value} wei"))
}
