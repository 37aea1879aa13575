//! Backend configuration.

use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use thiserror::Error;

/// The default EVM chain id.
pub const DEFAULT_EVM_CHAIN_ID: u64 = 262_144;

/// The default gas cap of `eth_call` and `debug_traceCall`.
pub const DEFAULT_GAS_CAP: u64 = 25_000_000;

/// The default number of blocks a single `eth_feeHistory` call may cover.
pub const DEFAULT_FEE_HISTORY_CAP: u64 = 100;

/// The default maximum number of logs returned by `eth_getLogs`.
pub const DEFAULT_LOGS_CAP: usize = 10_000;

/// The default maximum block range of `eth_getLogs`.
pub const DEFAULT_BLOCK_RANGE_CAP: u64 = 10_000;

/// An error loading the backend configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration is not valid TOML.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value is out of range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// The offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },
}

/// Fork activation heights of the EVM chain.
///
/// A fork is active from its activation height onwards. `None` means never.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Activation height of EIP-1559.
    pub london_block: Option<u64>,
    /// Activation height of EIP-4844.
    pub cancun_block: Option<u64>,
}

impl ChainConfig {
    /// A chain with every supported fork active from genesis.
    pub const fn all_forks() -> Self {
        Self { london_block: Some(0), cancun_block: Some(0) }
    }

    /// Returns true if EIP-1559 is active at `height`.
    pub fn is_london(&self, height: u64) -> bool {
        self.london_block.is_some_and(|fork| height >= fork)
    }

    /// Returns true if EIP-4844 is active at `height`.
    pub fn is_cancun(&self, height: u64) -> bool {
        self.cancun_block.is_some_and(|fork| height >= fork)
    }
}

/// Configuration of the [`crate::Backend`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// The EVM chain id.
    pub evm_chain_id: u64,
    /// Decimals of the EVM denomination, at most 18.
    pub evm_coin_decimals: u8,
    /// Gas cap of simulated calls.
    pub gas_cap: u64,
    /// Timeout of EVM executions such as traces, in seconds.
    pub evm_timeout_secs: u64,
    /// Maximum number of blocks of one `eth_feeHistory` call.
    pub fee_history_cap: u64,
    /// Maximum number of logs returned by `eth_getLogs`.
    pub logs_cap: usize,
    /// Maximum block range of `eth_getLogs`.
    pub block_range_cap: u64,
    /// Fork activation heights.
    pub chain: ChainConfig,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            evm_chain_id: DEFAULT_EVM_CHAIN_ID,
            evm_coin_decimals: 18,
            gas_cap: DEFAULT_GAS_CAP,
            evm_timeout_secs: 5,
            fee_history_cap: DEFAULT_FEE_HISTORY_CAP,
            logs_cap: DEFAULT_LOGS_CAP,
            block_range_cap: DEFAULT_BLOCK_RANGE_CAP,
            chain: ChainConfig::all_forks(),
        }
    }
}

impl BackendConfig {
    /// Parses and validates a TOML configuration. Missing fields take their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// Checks that every value is in range.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.evm_coin_decimals > 18 {
            return Err(ConfigError::Invalid { field: "evm_coin_decimals", reason: "must be <= 18" });
        }
        if self.fee_history_cap == 0 {
            return Err(ConfigError::Invalid { field: "fee_history_cap", reason: "must be > 0" });
        }
        if self.block_range_cap == 0 {
            return Err(ConfigError::Invalid { field: "block_range_cap", reason: "must be > 0" });
        }
        Ok(())
    }

    /// Returns the EVM execution timeout.
    pub const fn evm_timeout(&self) -> Duration {
        Duration::from_secs(self.evm_timeout_secs)
    }
}
