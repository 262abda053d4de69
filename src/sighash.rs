//! Signature hash computation for legacy and BIP143 (segwit v0) inputs

use crate::codec::write_var_bytes;
use crate::crypto::double_sha256;
use crate::error::{ConsensusError, Result};
use crate::script::{decode_spending_path, SpendingPath};
use crate::transaction::{serialize_base, write_outpoint, write_output};
use crate::types::*;

/// LegacySighash: 𝒯𝒳 × ℕ × 𝕊 × ℕ → ℍ
///
/// 1. Copy tx, clear every input's unlocking script
/// 2. Put `script_code` into the signed input
/// 3. Serialize without witness, append sighash type as 4 LE bytes
/// 4. Return SHA256(SHA256(·))
pub fn legacy_sighash(
    tx: &Transaction,
    input_index: usize,
    script_code: &[u8],
    sighash_type: u32,
) -> Result<Hash> {
    check_index(tx, input_index)?;

    let mut copy = tx.clone();
    for (i, input) in copy.inputs.iter_mut().enumerate() {
        input.script_sig = if i == input_index {
            script_code.to_vec()
        } else {
            Vec::new()
        };
        input.witness.clear();
    }

    let mut preimage = serialize_base(&copy);
    preimage.extend_from_slice(&sighash_type.to_le_bytes());
    Ok(double_sha256(&preimage))
}

/// Bip143Sighash: 𝒯𝒳 × ℕ × 𝕊 × ℤ × ℕ → ℍ
///
/// preimage = version ‖ hashPrevouts ‖ hashSequence ‖ outpoint ‖ scriptCode ‖
///            value ‖ nSequence ‖ hashOutputs ‖ lock_time ‖ sighash type
///
/// `script_code` is given without its length prefix.
pub fn bip143_sighash(
    tx: &Transaction,
    input_index: usize,
    script_code: &[u8],
    value: Integer,
    sighash_type: u32,
) -> Result<Hash> {
    check_index(tx, input_index)?;
    let input = &tx.inputs[input_index];

    let mut prevouts = Vec::with_capacity(tx.inputs.len() * 36);
    let mut sequences = Vec::with_capacity(tx.inputs.len() * 4);
    for txin in &tx.inputs {
        write_outpoint(&mut prevouts, &txin.prevout);
        sequences.extend_from_slice(&txin.sequence.to_le_bytes());
    }

    let mut outputs = Vec::new();
    for output in &tx.outputs {
        write_output(&mut outputs, output);
    }

    let mut preimage = Vec::with_capacity(156 + script_code.len());
    preimage.extend_from_slice(&tx.version.to_le_bytes());
    preimage.extend_from_slice(&double_sha256(&prevouts));
    preimage.extend_from_slice(&double_sha256(&sequences));
    write_outpoint(&mut preimage, &input.prevout);
    write_var_bytes(&mut preimage, script_code);
    preimage.extend_from_slice(&value.to_le_bytes());
    preimage.extend_from_slice(&input.sequence.to_le_bytes());
    preimage.extend_from_slice(&double_sha256(&outputs));
    preimage.extend_from_slice(&tx.lock_time.to_le_bytes());
    preimage.extend_from_slice(&sighash_type.to_le_bytes());

    Ok(double_sha256(&preimage))
}

/// ComputeSighash: 𝒯𝒳 × ℕ × ℕ → ℍ
///
/// The digest algorithm is chosen by the template of input 0 and applied to
/// every input of the transaction. Mixed legacy/segwit transactions whose
/// inputs disagree with input 0 are therefore hashed with the wrong algorithm
/// and fail verification.
pub fn compute_sighash(tx: &Transaction, input_index: usize, sighash_type: u32) -> Result<Hash> {
    check_index(tx, input_index)?;
    let path = decode_spending_path(&tx.inputs[input_index])?;
    sighash_for_path(tx, input_index, &path, sighash_type)
}

/// [`compute_sighash`] for an input whose spending path is already decoded
pub(crate) fn sighash_for_path(
    tx: &Transaction,
    input_index: usize,
    path: &SpendingPath,
    sighash_type: u32,
) -> Result<Hash> {
    let first = tx
        .inputs
        .first()
        .ok_or_else(|| ConsensusError::Decode("transaction has no inputs".to_string()))?;
    let input = &tx.inputs[input_index];

    let segwit = match first.template()? {
        ScriptTemplate::P2pkh => false,
        ScriptTemplate::P2sh => first.has_witness(),
        ScriptTemplate::P2wpkh | ScriptTemplate::P2wsh => true,
        ScriptTemplate::P2tr => {
            return Err(ConsensusError::UnsupportedTemplate(
                "no signature hash for taproot spends".to_string(),
            ))
        }
    };

    if segwit {
        let script_code = path.witness_script_code().ok_or_else(|| {
            ConsensusError::UnsupportedTemplate(format!(
                "input {} has no witness script code",
                input_index
            ))
        })?;
        bip143_sighash(
            tx,
            input_index,
            &script_code,
            input.spent_output.value,
            sighash_type,
        )
    } else {
        let script_code = path
            .redeem_script()
            .unwrap_or(&input.spent_output.script_pubkey);
        legacy_sighash(tx, input_index, script_code, sighash_type)
    }
}

fn check_index(tx: &Transaction, input_index: usize) -> Result<()> {
    if input_index >= tx.inputs.len() {
        return Err(ConsensusError::Decode(format!(
            "input index {} out of range ({} inputs)",
            input_index,
            tx.inputs.len()
        )));
    }
    Ok(())
}
