// deployer/src/config.rs

use dotenv::dotenv;
use ethers::{
    types::U256,
    utils::{parse_units, ParseUnits},
};
use eyre::{Result, WrapErr};
use std::{env, fmt, path::PathBuf, str::FromStr, time::Duration};
use tracing::info;

use crate::confirmation::ConfirmationPolicy;
use crate::gas::{FeeSettings, GasPolicy};

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
pub const DEFAULT_CONTRACT_PATH: &str = "contracts/Social.sol";
pub const DEFAULT_CONTRACT_NAME: &str = "Social";
pub const DEFAULT_ARTIFACT_PATH: &str = "static/contract.json";
pub const DEFAULT_GAS_LIMIT: u64 = 3_000_000;

#[derive(Clone)]
pub struct Config {
    // Network & Keys
    pub rpc_url: String,
    pub private_key: Option<String>,
    pub account_index: usize,
    pub chain_id: Option<u64>,

    // Contract & Artifact
    pub contract_path: PathBuf,
    pub contract_name: String,
    pub artifact_path: PathBuf,

    // Gas Options
    pub gas_limit: u64,
    pub estimate_gas: bool,
    pub gas_limit_buffer_percentage: u64,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,

    // Confirmation Options
    pub confirmation_timeout: Duration,
    pub poll_interval: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("rpc_url", &self.rpc_url)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("account_index", &self.account_index)
            .field("chain_id", &self.chain_id)
            .field("contract_path", &self.contract_path)
            .field("contract_name", &self.contract_name)
            .field("artifact_path", &self.artifact_path)
            .field("gas_limit", &self.gas_limit)
            .field("estimate_gas", &self.estimate_gas)
            .field("gas_limit_buffer_percentage", &self.gas_limit_buffer_percentage)
            .field("max_fee_per_gas", &self.max_fee_per_gas)
            .field("max_priority_fee_per_gas", &self.max_priority_fee_per_gas)
            .field("confirmation_timeout", &self.confirmation_timeout)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl Config {
    /// Builds a config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var_name: &str| -> Option<String> {
            lookup(var_name).map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        let parse_or = |var_name: &str, default: &str| -> String {
            get(var_name).unwrap_or_else(|| default.to_string())
        };
        fn parse_num<T>(var_name: &str, raw: Option<String>, default: T) -> Result<T>
        where
            T: FromStr,
            T::Err: std::error::Error + Send + Sync + 'static,
        {
            match raw {
                Some(s) => s.parse::<T>().wrap_err_with(|| format!("{var_name} is not a valid number: {s:?}")),
                None => Ok(default),
            }
        }
        let parse_bool = |var_name: &str| -> Result<bool> {
            match get(var_name) {
                None => Ok(false),
                Some(s) if s.eq_ignore_ascii_case("true") || s == "1" => Ok(true),
                Some(s) if s.eq_ignore_ascii_case("false") || s == "0" => Ok(false),
                Some(s) => eyre::bail!("{var_name} must be true/false, got {s:?}"),
            }
        };
        let parse_gwei = |var_name: &str, default: &str| -> Result<U256> {
            let raw = parse_or(var_name, default);
            let wei = match parse_units(&raw, "gwei")
                .map_err(|e| eyre::eyre!("{var_name} is not a valid gwei amount {raw:?}: {e}"))?
            {
                ParseUnits::U256(wei) => wei,
                ParseUnits::I256(_) => eyre::bail!("{var_name} must not be negative, got {raw:?}"),
            };
            if wei.is_zero() {
                eyre::bail!("{var_name} must be non-zero");
            }
            Ok(wei)
        };

        // --- Load vars ---
        let rpc_url = parse_or("RPC_URL", DEFAULT_RPC_URL);
        let private_key = get("PRIVATE_KEY");
        let account_index = parse_num("ACCOUNT_INDEX", get("ACCOUNT_INDEX"), 0usize)?;
        let chain_id = match get("CHAIN_ID") {
            Some(s) => Some(s.parse::<u64>().wrap_err_with(|| format!("CHAIN_ID is not a valid number: {s:?}"))?),
            None => None,
        };
        let contract_path = PathBuf::from(parse_or("CONTRACT_PATH", DEFAULT_CONTRACT_PATH));
        let contract_name = parse_or("CONTRACT_NAME", DEFAULT_CONTRACT_NAME);
        let artifact_path = PathBuf::from(parse_or("ARTIFACT_PATH", DEFAULT_ARTIFACT_PATH));
        let gas_limit = parse_num("GAS_LIMIT", get("GAS_LIMIT"), DEFAULT_GAS_LIMIT)?;
        let estimate_gas = parse_bool("ESTIMATE_GAS")?;
        let gas_limit_buffer_percentage =
            parse_num("GAS_LIMIT_BUFFER_PERCENTAGE", get("GAS_LIMIT_BUFFER_PERCENTAGE"), 20u64)?;
        let max_fee_per_gas = parse_gwei("MAX_FEE_PER_GAS_GWEI", "2")?;
        let max_priority_fee_per_gas = parse_gwei("MAX_PRIORITY_FEE_PER_GAS_GWEI", "1")?;
        let confirmation_timeout_secs =
            parse_num("CONFIRMATION_TIMEOUT_SECS", get("CONFIRMATION_TIMEOUT_SECS"), 120u64)?;
        let poll_interval_ms = parse_num("POLL_INTERVAL_MS", get("POLL_INTERVAL_MS"), 1_000u64)?;

        if gas_limit == 0 {
            eyre::bail!("GAS_LIMIT must be non-zero");
        }
        if max_fee_per_gas < max_priority_fee_per_gas {
            eyre::bail!("MAX_FEE_PER_GAS_GWEI must not be lower than MAX_PRIORITY_FEE_PER_GAS_GWEI");
        }
        if confirmation_timeout_secs == 0 || poll_interval_ms == 0 {
            eyre::bail!("CONFIRMATION_TIMEOUT_SECS and POLL_INTERVAL_MS must be non-zero");
        }

        Ok(Config {
            rpc_url,
            private_key,
            account_index,
            chain_id,
            contract_path,
            contract_name,
            artifact_path,
            gas_limit,
            estimate_gas,
            gas_limit_buffer_percentage,
            max_fee_per_gas,
            max_priority_fee_per_gas,
            confirmation_timeout: Duration::from_secs(confirmation_timeout_secs),
            poll_interval: Duration::from_millis(poll_interval_ms),
        })
    }

    pub fn gas_policy(&self) -> GasPolicy {
        if self.estimate_gas {
            GasPolicy::Estimate { buffer_percentage: self.gas_limit_buffer_percentage }
        } else {
            GasPolicy::Fixed(self.gas_limit)
        }
    }

    pub fn fee_settings(&self) -> FeeSettings {
        FeeSettings {
            max_fee_per_gas: self.max_fee_per_gas,
            max_priority_fee_per_gas: self.max_priority_fee_per_gas,
        }
    }

    pub fn confirmation_policy(&self) -> ConfirmationPolicy {
        ConfirmationPolicy { timeout: self.confirmation_timeout, poll_interval: self.poll_interval }
    }
}

pub fn load_config() -> Result<Config> {
    dotenv().ok();
    let config = Config::from_lookup(|key| env::var(key).ok())?;
    info!(rpc_url = %config.rpc_url, contract = %config.contract_name, "Configuration loaded.");
    Ok(config)
}
