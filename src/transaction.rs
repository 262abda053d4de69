//! Transaction serialization, identity and weight

use crate::codec::{encode_varint, write_var_bytes};
use crate::constants::*;
use crate::crypto::double_sha256;
use crate::error::Result;
use crate::types::*;

/// CheckTransaction: 𝒯𝒳 → {valid, invalid}
///
/// A transaction tx = (v, ins, outs, lt) is structurally valid if and only if:
/// 1. |ins| > 0 ∧ |outs| > 0
/// 2. ∀o ∈ outs: o.value ≥ 0
pub fn check_transaction(tx: &Transaction) -> Result<ValidationResult> {
    if tx.inputs.is_empty() || tx.outputs.is_empty() {
        return Ok(ValidationResult::Invalid("Empty inputs or outputs".to_string()));
    }

    for (i, output) in tx.outputs.iter().enumerate() {
        if !(0..=MAX_MONEY).contains(&output.value) {
            return Ok(ValidationResult::Invalid(format!(
                "Invalid output value {} at index {}",
                output.value, i
            )));
        }
    }

    for (i, input) in tx.inputs.iter().enumerate() {
        if !(0..=MAX_MONEY).contains(&input.spent_output.value) {
            return Ok(ValidationResult::Invalid(format!(
                "Invalid spent output value {} at input {}",
                input.spent_output.value, i
            )));
        }
    }

    Ok(ValidationResult::Valid)
}

/// Check if transaction is coinbase
pub fn is_coinbase(tx: &Transaction) -> bool {
    tx.inputs.len() == 1
        && tx.inputs[0].prevout.hash == [0u8; 32]
        && tx.inputs[0].prevout.index == COINBASE_PREVOUT_INDEX
}

pub(crate) fn write_outpoint(out: &mut Vec<u8>, prevout: &OutPoint) {
    out.extend_from_slice(&prevout.hash);
    out.extend_from_slice(&prevout.index.to_le_bytes());
}

pub(crate) fn write_output(out: &mut Vec<u8>, output: &TransactionOutput) {
    out.extend_from_slice(&output.value.to_le_bytes());
    write_var_bytes(out, &output.script_pubkey);
}

fn write_inputs(out: &mut Vec<u8>, tx: &Transaction) {
    out.extend_from_slice(&encode_varint(tx.inputs.len() as u64));
    for input in &tx.inputs {
        write_outpoint(out, &input.prevout);
        write_var_bytes(out, &input.script_sig);
        out.extend_from_slice(&input.sequence.to_le_bytes());
    }
}

fn write_outputs(out: &mut Vec<u8>, tx: &Transaction) {
    out.extend_from_slice(&encode_varint(tx.outputs.len() as u64));
    for output in &tx.outputs {
        write_output(out, output);
    }
}

/// SerializeBase: 𝒯𝒳 → 𝕊
///
/// version ‖ |ins| ‖ ins ‖ |outs| ‖ outs ‖ lock_time, with no witness data.
pub fn serialize_base(tx: &Transaction) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&tx.version.to_le_bytes());
    write_inputs(&mut out, tx);
    write_outputs(&mut out, tx);
    out.extend_from_slice(&tx.lock_time.to_le_bytes());
    out
}

/// SerializeWitness: 𝒯𝒳 → 𝕊
///
/// BIP144 form: marker 0x00 and flag 0x01 after the version and one witness stack
/// per input before the lock time. Equal to [`serialize_base`] when no input
/// carries witness data.
pub fn serialize_witness(tx: &Transaction) -> Vec<u8> {
    if !tx.has_witness() {
        return serialize_base(tx);
    }

    let mut out = Vec::new();
    out.extend_from_slice(&tx.version.to_le_bytes());
    out.push(0x00);
    out.push(0x01);
    write_inputs(&mut out, tx);
    write_outputs(&mut out, tx);
    for input in &tx.inputs {
        out.extend_from_slice(&encode_varint(input.witness.len() as u64));
        for item in &input.witness {
            write_var_bytes(&mut out, item);
        }
    }
    out.extend_from_slice(&tx.lock_time.to_le_bytes());
    out
}

/// Transaction id (internal byte order)
pub fn calculate_txid(tx: &Transaction) -> Hash {
    double_sha256(&serialize_base(tx))
}

/// Witness transaction id (internal byte order)
pub fn calculate_wtxid(tx: &Transaction) -> Hash {
    double_sha256(&serialize_witness(tx))
}

/// Weight: 𝒯𝒳 → ℕ
///
/// weight(tx) = 3 × |base(tx)| + |witness(tx)|
pub fn calculate_weight(tx: &Transaction) -> Natural {
    let base_size = serialize_base(tx).len() as Natural;
    let total_size = serialize_witness(tx).len() as Natural;
    base_size * (WITNESS_SCALE_FACTOR - 1) + total_size
}
