//! Transaction verification: time locks, locking-script hashes and signatures
//!
//! A transaction is eligible for a block iff every input spends a recognized
//! template, its lock time is satisfied, every unlocking payload hashes to the
//! value embedded in the spent locking script, and every signature verifies
//! against the signature hash of its input.

use crate::config::MiningConfig;
use crate::constants::*;
use crate::crypto::{hash160, sha256, verify_ecdsa};
use crate::error::{ConsensusError, Result};
use crate::script::{decode_spending_path, MultisigScript, SpendingPath};
use crate::sighash::sighash_for_path;
use crate::transaction::check_transaction;
use crate::types::*;
use secp256k1::{Secp256k1, VerifyOnly};
use tracing::debug;

/// Inputs to validation that do not come from the transaction itself
#[derive(Debug, Clone)]
pub struct ValidationContext {
    /// Current unix time, compared against time-based lock times
    pub now: u32,
    pub sighash_type: u32,
    /// Accept P2TR inputs without verifying them
    pub assume_valid_taproot: bool,
    secp: Secp256k1<VerifyOnly>,
}

impl ValidationContext {
    pub fn new(now: u32, sighash_type: u32, assume_valid_taproot: bool) -> Self {
        ValidationContext {
            now,
            sighash_type,
            assume_valid_taproot,
            secp: Secp256k1::verification_only(),
        }
    }

    pub fn from_config(config: &MiningConfig, now: u32) -> Self {
        Self::new(now, config.sighash_type, config.assume_valid_taproot)
    }
}

/// CheckTimeLock: 𝒯𝒳 × ℕ → {valid, invalid}
///
/// 1. lock_time < 500,000,000 (block height) → valid
/// 2. lock_time > now → invalid
/// 3. ∀i ∈ ins: i.sequence = 0xffffffff ∨ i.sequence ≤ 0xefffffff
pub fn check_time_lock(tx: &Transaction, now: u32) -> Result<()> {
    if tx.lock_time < LOCKTIME_THRESHOLD {
        return Ok(());
    }

    if tx.lock_time > now {
        return Err(ConsensusError::TransactionValidation(format!(
            "lock time {} is in the future (now {})",
            tx.lock_time, now
        )));
    }

    for (i, input) in tx.inputs.iter().enumerate() {
        if input.sequence != SEQUENCE_FINAL && input.sequence > SEQUENCE_RELATIVE_LOCK_MAX {
            return Err(ConsensusError::TransactionValidation(format!(
                "input {} sequence {:#010x} is neither final nor a relative lock",
                i, input.sequence
            )));
        }
    }

    Ok(())
}

/// Push the computed and the embedded hash, pop both and compare
fn expect_hash(computed: &[u8], embedded: &[u8], what: &str) -> Result<()> {
    let mut stack = Stack::new();
    stack.push(computed.to_vec());
    stack.push(embedded.to_vec());

    let expected = stack.pop()?;
    let actual = stack.pop()?;
    if actual != expected {
        return Err(ConsensusError::HashMismatch(format!(
            "{}: expected {}, got {}",
            what,
            hex::encode(expected),
            hex::encode(actual)
        )));
    }
    Ok(())
}

fn expect_signature_count(multisig: &MultisigScript, signatures: &[ByteString]) -> Result<()> {
    if signatures.len() != multisig.required {
        return Err(ConsensusError::HashMismatch(format!(
            "multisig requires {} signatures, {} supplied",
            multisig.required,
            signatures.len()
        )));
    }
    Ok(())
}

/// VerifyLockingHash: ℐ → {valid, invalid}
///
/// Hash the unlocking payload of the input (pubkey, redeem script or witness
/// script) and compare it with the hash committed to by the spent output.
pub fn verify_locking_hash(input: &TransactionInput) -> Result<()> {
    match decode_spending_path(input)? {
        SpendingPath::P2pkh { pubkey_hash, pubkey, .. }
        | SpendingPath::P2wpkh { pubkey_hash, pubkey, .. } => {
            expect_hash(&hash160(&pubkey), &pubkey_hash, "public key hash")
        }
        SpendingPath::P2shP2wpkh {
            script_hash,
            redeem_script,
            pubkey_hash,
            pubkey,
            ..
        } => {
            expect_hash(&hash160(&redeem_script), &script_hash, "redeem script hash")?;
            expect_hash(&hash160(&pubkey), &pubkey_hash, "witness program")
        }
        SpendingPath::P2shSingleSig {
            script_hash,
            redeem_script,
            ..
        } => expect_hash(&hash160(&redeem_script), &script_hash, "redeem script hash"),
        SpendingPath::P2shMultisig {
            script_hash,
            redeem_script,
            multisig,
            signatures,
        } => {
            expect_hash(&hash160(&redeem_script), &script_hash, "redeem script hash")?;
            expect_signature_count(&multisig, &signatures)
        }
        SpendingPath::P2wsh {
            script_hash,
            witness_script,
            multisig,
            signatures,
        } => {
            expect_hash(&sha256(&witness_script), &script_hash, "witness script hash")?;
            expect_signature_count(&multisig, &signatures)
        }
        SpendingPath::P2shP2wsh {
            script_hash,
            redeem_script,
            witness_program,
            witness_script,
            multisig,
            signatures,
        } => {
            expect_hash(&hash160(&redeem_script), &script_hash, "redeem script hash")?;
            expect_hash(&sha256(&witness_script), &witness_program, "witness script hash")?;
            expect_signature_count(&multisig, &signatures)
        }
        SpendingPath::P2tr => Ok(()),
    }
}

/// Check one `<DER signature ‖ sighash byte>` against `pubkey`
fn check_sig(ctx: &ValidationContext, digest: &Hash, signature: &[u8], pubkey: &[u8]) -> bool {
    match signature.split_last() {
        Some((&hash_type, der)) if hash_type as u32 == ctx.sighash_type => {
            verify_ecdsa(&ctx.secp, digest, der, pubkey)
        }
        _ => false,
    }
}

/// Each signature is tried against the remaining keys in order; only the key
/// it verifies under is consumed.
fn check_multisig(
    ctx: &ValidationContext,
    digest: &Hash,
    multisig: &MultisigScript,
    signatures: &[ByteString],
) -> bool {
    let mut remaining: Vec<&ByteString> = multisig.pubkeys.iter().collect();
    let mut valid = 0;

    for signature in signatures {
        if let Some(pos) = remaining
            .iter()
            .position(|key| check_sig(ctx, digest, signature, key))
        {
            remaining.remove(pos);
            valid += 1;
        }
    }

    valid == multisig.required
}

/// VerifySignature: 𝒯𝒳 × ℕ → {valid, invalid}
///
/// 1. Decode the input's spending path
/// 2. P2TR: valid iff taproot inputs are assumed valid
/// 3. Compute the signature hash (algorithm chosen by input 0)
/// 4. Verify the single signature, or exactly m of the multisig signatures
pub fn verify_signature(tx: &Transaction, input_index: usize, ctx: &ValidationContext) -> Result<()> {
    let input = tx.inputs.get(input_index).ok_or_else(|| {
        ConsensusError::Decode(format!("input index {} out of range", input_index))
    })?;
    let path = decode_spending_path(input)?;

    if path == SpendingPath::P2tr {
        if ctx.assume_valid_taproot {
            return Ok(());
        }
        return Err(ConsensusError::UnsupportedTemplate(
            "taproot spends are not verified".to_string(),
        ));
    }

    let digest = sighash_for_path(tx, input_index, &path, ctx.sighash_type)?;

    let valid = match &path {
        SpendingPath::P2pkh { signature, pubkey, .. }
        | SpendingPath::P2wpkh { signature, pubkey, .. }
        | SpendingPath::P2shP2wpkh { signature, pubkey, .. }
        | SpendingPath::P2shSingleSig { signature, pubkey, .. } => {
            check_sig(ctx, &digest, signature, pubkey)
        }
        SpendingPath::P2shMultisig { multisig, signatures, .. }
        | SpendingPath::P2wsh { multisig, signatures, .. }
        | SpendingPath::P2shP2wsh { multisig, signatures, .. } => {
            check_multisig(ctx, &digest, multisig, signatures)
        }
        SpendingPath::P2tr => true,
    };

    if valid {
        Ok(())
    } else {
        debug!(input = input_index, segwit = path.is_segwit(), "signature check failed");
        Err(ConsensusError::InvalidSignature(format!(
            "input {} signature does not verify",
            input_index
        )))
    }
}

/// FullValidate: 𝒯𝒳 → {valid, invalid}
///
/// Short-circuits on the first failing check:
/// 1. structure, and every input spends a recognized template
/// 2. time lock
/// 3. locking hash of every input
/// 4. signature of every input
pub fn full_validate(tx: &Transaction, ctx: &ValidationContext) -> Result<()> {
    if let ValidationResult::Invalid(reason) = check_transaction(tx)? {
        return Err(ConsensusError::TransactionValidation(reason));
    }
    for input in &tx.inputs {
        input.template()?;
    }

    check_time_lock(tx, ctx.now)?;

    for input in &tx.inputs {
        verify_locking_hash(input)?;
    }

    for index in 0..tx.inputs.len() {
        verify_signature(tx, index, ctx)?;
    }

    Ok(())
}
