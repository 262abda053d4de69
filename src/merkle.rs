//! Merkle root construction for the block header and the witness commitment

use crate::crypto::double_sha256;
use crate::error::{ConsensusError, Result};
use crate::transaction::{calculate_txid, calculate_wtxid};
use crate::types::*;

/// ComputeMerkleRoot: ℍ* → ℍ
///
/// 1. If the level has an odd number of hashes, duplicate the last one
/// 2. Replace each pair (a, b) with SHA256(SHA256(a ‖ b))
/// 3. Repeat until one hash remains
///
/// Hashes are in internal byte order.
pub fn compute_merkle_root(hashes: &[Hash]) -> Result<Hash> {
    if hashes.is_empty() {
        return Err(ConsensusError::Serialization(
            "Cannot compute merkle root from empty hash list".to_string(),
        ));
    }

    let mut level = hashes.to_vec();
    while level.len() > 1 {
        if level.len() % 2 == 1 {
            if let Some(&last) = level.last() {
                level.push(last);
            }
        }

        level = level
            .chunks_exact(2)
            .map(|pair| {
                let mut combined = [0u8; 64];
                combined[..32].copy_from_slice(&pair[0]);
                combined[32..].copy_from_slice(&pair[1]);
                double_sha256(&combined)
            })
            .collect();
    }

    Ok(level[0])
}

/// Root over `coinbase_leaf` followed by `leaves`
pub fn build_root(leaves: &[Hash], coinbase_leaf: Hash) -> Hash {
    let mut hashes = Vec::with_capacity(leaves.len() + 1);
    hashes.push(coinbase_leaf);
    hashes.extend_from_slice(leaves);
    // Never empty: the coinbase leaf is always present
    compute_merkle_root(&hashes).unwrap_or(coinbase_leaf)
}

/// Header merkle root over the coinbase txid and the selected txids
pub fn txid_root(coinbase: &Transaction, transactions: &[Transaction]) -> Hash {
    let txids: Vec<Hash> = transactions.iter().map(calculate_txid).collect();
    build_root(&txids, calculate_txid(coinbase))
}

/// Witness merkle root; the coinbase wtxid is defined as all zeros
pub fn witness_root(transactions: &[Transaction]) -> Hash {
    let wtxids: Vec<Hash> = transactions.iter().map(calculate_wtxid).collect();
    build_root(&wtxids, [0u8; 32])
}
