//! # Block-Template-Proof
//!
//! Assembles a single proof-of-work block from a pool of candidate transactions.
//!
//! ## Architecture
//!
//! The pipeline runs leaf to root:
//! - Mempool loader (JSON transaction files → [`Transaction`])
//! - Script verifier (time locks, locking-script hashes, ECDSA signatures)
//! - Block assembler (fee-rate ordering, greedy fill under the weight cap)
//! - Merkle engine and coinbase builder (txid root, witness commitment)
//! - Proof-of-work miner (bounded, cancellable nonce search)
//! - Output writer
//!
//! ## Design Principles
//!
//! 1. **Explicit Configuration**: every parameter lives in [`MiningConfig`] and is passed in
//! 2. **Closed Templates**: only P2PKH, P2WPKH, P2SH, P2WSH and P2TR spends are recognized;
//!    anything else is excluded, never assumed valid
//! 3. **Exact Version Pinning**: all consensus-critical dependencies pinned to exact versions
//! 4. **No Panics on Input**: malformed transactions surface as [`ConsensusError`]
//!
//! ## Usage
//!
//! ```rust
//! use block_template_proof::{BlockBuilder, MiningConfig, MiningControl, SystemClock};
//!
//! let builder = BlockBuilder::new(MiningConfig::default()).unwrap();
//! let template = builder.build_template(&[], &SystemClock).unwrap();
//! assert_eq!(template.transactions.len(), 0);
//!
//! let control = MiningControl::new().with_max_attempts(10);
//! let (block, _result) = builder.mine(template, &control, &SystemClock).unwrap();
//! assert_eq!(block.transactions.len(), 1);
//! ```

pub mod codec;
pub mod coinbase;
pub mod config;
pub mod constants;
pub mod crypto;
pub mod economic;
pub mod error;
pub mod mempool;
pub mod merkle;
pub mod mining;
pub mod output;
pub mod pow;
pub mod script;
pub mod segwit;
pub mod sighash;
pub mod transaction;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use config::MiningConfig;
pub use constants::*;
pub use error::{ConsensusError, Result};
pub use mining::{BlockTemplate, Selection, SelectionStop};
pub use output::BlockOutput;
pub use pow::{MiningControl, MiningResult, SystemClock, TimeSource};
pub use types::*;
pub use validation::ValidationContext;

/// Main block builder
///
/// Holds a validated configuration and runs the assembly pipeline with it.
///
/// # Examples
///
/// ```
/// use block_template_proof::{BlockBuilder, MiningConfig};
/// use block_template_proof::types::*;
///
/// let builder = BlockBuilder::new(MiningConfig::default()).unwrap();
///
/// // An input spending an unrecognized template is never valid
/// let tx = Transaction {
///     version: 1,
///     inputs: vec![TransactionInput {
///         prevout: OutPoint { hash: [1u8; 32], index: 0 },
///         script_sig: vec![],
///         script_sig_asm: String::new(),
///         witness: vec![],
///         sequence: 0xffffffff,
///         spent_output: TransactionOutput::new(1000, vec![0x51]),
///         inner_redeem_script_asm: None,
///         inner_witness_script_asm: None,
///     }],
///     outputs: vec![TransactionOutput::new(900, vec![0x51])],
///     lock_time: 0,
/// };
///
/// let result = builder.validate_transaction(&tx, 1_700_000_000);
/// assert!(matches!(result, ValidationResult::Invalid(_)));
/// ```
#[derive(Debug, Clone)]
pub struct BlockBuilder {
    config: MiningConfig,
}

impl BlockBuilder {
    /// Create a builder; the configuration is validated first
    pub fn new(config: MiningConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MiningConfig {
        &self.config
    }

    /// Run full validation and report the outcome as a [`ValidationResult`]
    pub fn validate_transaction(&self, tx: &Transaction, now: u32) -> ValidationResult {
        let ctx = ValidationContext::from_config(&self.config, now);
        match validation::full_validate(tx, &ctx) {
            Ok(()) => ValidationResult::Valid,
            Err(e) => ValidationResult::Invalid(e.to_string()),
        }
    }

    /// Select transactions and build the coinbase and header, timestamped by `clock`
    pub fn build_template<T: TimeSource>(
        &self,
        mempool_txs: &[Transaction],
        clock: &T,
    ) -> Result<BlockTemplate> {
        let ctx = ValidationContext::from_config(&self.config, clock.now());
        mining::create_new_block(mempool_txs, &ctx, &self.config, clock)
    }

    /// Search for a nonce for `template`
    pub fn mine<T: TimeSource>(
        &self,
        template: BlockTemplate,
        control: &MiningControl,
        clock: &T,
    ) -> Result<(Block, MiningResult)> {
        mining::mine_block(template, control, clock)
    }
}
