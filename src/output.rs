//! Block output file: header, coinbase and transaction ids

use crate::codec::{bytes_to_hex, hash_to_display_hex};
use crate::error::{ConsensusError, Result};
use crate::pow::{check_proof_of_work, serialize_header};
use crate::transaction::{calculate_txid, serialize_witness};
use crate::types::*;
use std::path::Path;
use tracing::info;

/// Rendered form of a mined block
///
/// Line 1 is the 80-byte header in hex, line 2 the witness-serialized coinbase,
/// followed by one display-order txid per line, coinbase first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockOutput {
    pub header_hex: String,
    pub coinbase_hex: String,
    pub txids: Vec<String>,
}

impl BlockOutput {
    /// Fails with `InvalidProofOfWork` when the header does not meet its own target.
    pub fn from_block(block: &Block) -> Result<Self> {
        if !check_proof_of_work(&block.header)? {
            return Err(ConsensusError::InvalidProofOfWork(format!(
                "header nonce {} is above target",
                block.header.nonce
            )));
        }
        let coinbase = block.transactions.first().ok_or_else(|| {
            ConsensusError::Serialization("block has no coinbase transaction".to_string())
        })?;

        Ok(BlockOutput {
            header_hex: bytes_to_hex(&serialize_header(&block.header)),
            coinbase_hex: bytes_to_hex(&serialize_witness(coinbase)),
            txids: block
                .transactions
                .iter()
                .map(|tx| hash_to_display_hex(&calculate_txid(tx)))
                .collect(),
        })
    }

    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.txids.len() + 2);
        lines.push(self.header_hex.clone());
        lines.push(self.coinbase_hex.clone());
        lines.extend(self.txids.iter().cloned());
        lines
    }

    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut contents = self.to_lines().join("\n");
        contents.push('\n');
        std::fs::write(path.as_ref(), contents)?;
        info!(path = %path.as_ref().display(), transactions = self.txids.len(), "wrote block");
        Ok(())
    }
}
