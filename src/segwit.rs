//! Segregated Witness (SegWit) commitment and block weight

use crate::constants::*;
use crate::error::Result;
use crate::script::{OP_RETURN, push_data};
use crate::transaction::calculate_weight;
use crate::types::*;
use bitcoin_hashes::{sha256d, Hash as BitcoinHash, HashEngine};

/// Witness commitment: SHA256(SHA256(witness_root ‖ reserved_value))
pub fn compute_witness_commitment(witness_root: &Hash) -> Hash {
    let mut engine = sha256d::Hash::engine();
    engine.input(witness_root);
    engine.input(&WITNESS_RESERVED_VALUE);
    sha256d::Hash::from_engine(engine).into_inner()
}

/// Commitment output script: OP_RETURN PUSH36(aa21a9ed ‖ commitment), 38 bytes
pub fn build_commitment_script(witness_root: &Hash) -> Result<ByteString> {
    let mut payload = Vec::with_capacity(36);
    payload.extend_from_slice(&WITNESS_COMMITMENT_HEADER);
    payload.extend_from_slice(&compute_witness_commitment(witness_root));

    let mut script = vec![OP_RETURN];
    push_data(&mut script, &payload)?;
    Ok(script)
}

/// Extract the 32-byte commitment from an `OP_RETURN 0x24 aa21a9ed ...` script
pub fn extract_witness_commitment(script: &[u8]) -> Option<Hash> {
    if script.len() >= 38
        && script[0] == OP_RETURN
        && script[1] == 0x24
        && script[2..6] == WITNESS_COMMITMENT_HEADER
    {
        script[6..38].try_into().ok()
    } else {
        None
    }
}

/// Validate witness commitment in coinbase transaction
///
/// The last output carrying a commitment is authoritative. A coinbase with no
/// commitment output is valid (no witness data in the block).
pub fn validate_witness_commitment(coinbase_tx: &Transaction, witness_root: &Hash) -> Result<bool> {
    let commitment = coinbase_tx
        .outputs
        .iter()
        .rev()
        .find_map(|output| extract_witness_commitment(&output.script_pubkey));

    match commitment {
        Some(commitment) => Ok(commitment == compute_witness_commitment(witness_root)),
        None => Ok(true),
    }
}

/// Block weight as accounted during assembly: header plus every transaction
pub fn calculate_block_weight(block: &Block) -> Natural {
    HEADER_WEIGHT + block.transactions.iter().map(calculate_weight).sum::<Natural>()
}
