//! Configuration for block template construction
//!
//! Every parameter the assembler and miner depend on lives in [`MiningConfig`],
//! which is passed explicitly through the pipeline. Settings can be loaded from a
//! JSON file; any field left out takes its default.

use crate::codec::{compact_target_from_uint256, hex_to_bytes, hex_to_hash_display, U256};
use crate::constants::*;
use crate::error::{ConsensusError, Result};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Block template configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningConfig {
    /// Hash of the block being built on, in display (big-endian) hex
    #[serde(default = "default_previous_block_hash")]
    pub previous_block_hash: String,

    /// Proof-of-work target as 64 big-endian hex digits
    /// Default: 0000ffff followed by zeros
    #[serde(default = "default_target")]
    pub target: String,

    /// Locking script paid by the coinbase, hex
    #[serde(default = "default_payout_script")]
    pub payout_script: String,

    /// Address of `payout_script`, for display only
    #[serde(default = "default_payout_address")]
    pub payout_address: String,

    /// Height encoded into the coinbase scriptSig (BIP34) and used for the subsidy
    #[serde(default = "default_block_height")]
    pub block_height: u64,

    #[serde(default = "default_block_version")]
    pub block_version: i32,

    /// Weight cap for the assembled block, header and coinbase included
    /// Default: 4,000,000 WU
    #[serde(default = "default_max_block_weight")]
    pub max_block_weight: u64,

    /// Sighash type every signature must carry. Only SIGHASH_ALL is supported.
    #[serde(default = "default_sighash_type")]
    pub sighash_type: u32,

    /// Accept P2TR inputs without verifying their signatures
    /// Default: true
    #[serde(default = "default_true")]
    pub assume_valid_taproot: bool,
}

fn default_previous_block_hash() -> String {
    DEFAULT_PREVIOUS_BLOCK_HASH.to_string()
}

fn default_target() -> String {
    DEFAULT_TARGET.to_string()
}

fn default_payout_script() -> String {
    DEFAULT_PAYOUT_SCRIPT.to_string()
}

fn default_payout_address() -> String {
    DEFAULT_PAYOUT_ADDRESS.to_string()
}

fn default_block_height() -> u64 {
    DEFAULT_BLOCK_HEIGHT
}

fn default_block_version() -> i32 {
    BLOCK_VERSION
}

fn default_max_block_weight() -> u64 {
    MAX_BLOCK_WEIGHT
}

fn default_sighash_type() -> u32 {
    SIGHASH_ALL
}

fn default_true() -> bool {
    true
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            previous_block_hash: default_previous_block_hash(),
            target: default_target(),
            payout_script: default_payout_script(),
            payout_address: default_payout_address(),
            block_height: DEFAULT_BLOCK_HEIGHT,
            block_version: BLOCK_VERSION,
            max_block_weight: MAX_BLOCK_WEIGHT,
            sighash_type: SIGHASH_ALL,
            assume_valid_taproot: true,
        }
    }
}

impl MiningConfig {
    /// Parse a JSON document and validate it
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: MiningConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Previous block hash in internal byte order
    pub fn prev_block_hash(&self) -> Result<Hash> {
        hex_to_hash_display(&self.previous_block_hash)
            .map_err(|e| ConsensusError::Config(format!("previous_block_hash: {}", e)))
    }

    pub fn target_u256(&self) -> Result<U256> {
        let bytes = hex_to_bytes(&self.target)
            .map_err(|e| ConsensusError::Config(format!("target: {}", e)))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            ConsensusError::Config(format!("target must be 32 bytes, got {}", b.len()))
        })?;
        Ok(U256::from_be_bytes(&bytes))
    }

    /// Compact ("bits") encoding of the target
    pub fn bits(&self) -> Result<u32> {
        Ok(compact_target_from_uint256(&self.target_u256()?))
    }

    pub fn payout_script_bytes(&self) -> Result<ByteString> {
        hex_to_bytes(&self.payout_script)
            .map_err(|e| ConsensusError::Config(format!("payout_script: {}", e)))
    }

    /// Reject configurations the pipeline cannot honor
    pub fn validate(&self) -> Result<()> {
        self.prev_block_hash()?;

        if self.target_u256()?.is_zero() {
            return Err(ConsensusError::Config("target must be non-zero".to_string()));
        }

        if self.payout_script_bytes()?.is_empty() {
            return Err(ConsensusError::Config("payout_script must not be empty".to_string()));
        }

        if self.sighash_type != SIGHASH_ALL {
            return Err(ConsensusError::Config(format!(
                "unsupported sighash type {:#x}",
                self.sighash_type
            )));
        }

        if self.max_block_weight <= HEADER_WEIGHT {
            return Err(ConsensusError::Config(format!(
                "max_block_weight {} leaves no room past the header",
                self.max_block_weight
            )));
        }

        Ok(())
    }
}
