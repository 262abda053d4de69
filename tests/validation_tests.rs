//! Signature and locking-hash verification across every recognized template

mod common;

use block_template_proof::sighash::{bip143_sighash, compute_sighash};
use block_template_proof::validation::{full_validate, verify_locking_hash, verify_signature};
use block_template_proof::*;
use common::*;

fn ctx() -> ValidationContext {
    ValidationContext::new(NOW, SIGHASH_ALL, true)
}

fn all_spends() -> Vec<Spend> {
    vec![
        Spend::P2pkh(1),
        Spend::P2wpkh(2),
        Spend::P2shP2wpkh(3),
        Spend::P2shSingleSig(15),
        Spend::P2shMultisig { required: 2, seeds: vec![4, 5, 6] },
        Spend::P2wshMultisig { required: 2, seeds: vec![7, 8, 9] },
        Spend::P2shP2wshMultisig { required: 1, seeds: vec![10, 11] },
        Spend::P2tr(12),
    ]
}

#[test]
fn test_every_template_validates() {
    for (i, spend) in all_spends().into_iter().enumerate() {
        let tx = simple_tx(spend.clone(), 1_000, i as u8 + 1);
        assert!(
            full_validate(&tx, &ctx()).is_ok(),
            "{:?} failed: {:?}",
            spend,
            full_validate(&tx, &ctx())
        );
    }
}

#[test]
fn test_multi_input_same_kind() {
    let legacy = signed_tx(&[Spend::P2pkh(1), Spend::P2pkh(2), Spend::P2pkh(3)], 500, 40);
    assert!(full_validate(&legacy, &ctx()).is_ok());

    let segwit = signed_tx(&[Spend::P2wpkh(1), Spend::P2shP2wpkh(2)], 500, 41);
    assert!(full_validate(&segwit, &ctx()).is_ok());
}

#[test]
fn test_mutated_locking_hash_rejected_for_every_template() {
    for (i, spend) in all_spends().into_iter().enumerate() {
        if matches!(spend, Spend::P2tr(_)) {
            continue;
        }
        let mut tx = simple_tx(spend.clone(), 1_000, i as u8 + 1);
        // byte 5 lies inside the embedded hash of every standard locking script
        tx.inputs[0].spent_output.script_pubkey[5] ^= 0xff;
        assert!(
            matches!(
                verify_locking_hash(&tx.inputs[0]),
                Err(ConsensusError::HashMismatch(_))
            ),
            "{:?} accepted a mutated hash",
            spend
        );
    }
}

#[test]
fn test_mutated_output_breaks_every_signature() {
    for (i, spend) in all_spends().into_iter().enumerate() {
        if matches!(spend, Spend::P2tr(_)) {
            continue;
        }
        let mut tx = simple_tx(spend.clone(), 1_000, i as u8 + 1);
        tx.outputs[0].value += 1;
        assert!(
            matches!(
                verify_signature(&tx, 0, &ctx()),
                Err(ConsensusError::InvalidSignature(_))
            ),
            "{:?} still verified",
            spend
        );
    }
}

#[test]
fn test_multisig_signatures_out_of_key_order() {
    let mut tx = simple_tx(Spend::P2wshMultisig { required: 2, seeds: vec![7, 8, 9] }, 1_000, 1);
    // [sig8, sig7] against keys [7, 8, 9]
    tx.inputs[0].witness.swap(1, 2);
    assert!(verify_signature(&tx, 0, &ctx()).is_ok());

    let mut p2sh = simple_tx(Spend::P2shMultisig { required: 2, seeds: vec![4, 5, 6] }, 1_000, 2);
    let digest = compute_sighash(&p2sh, 0, SIGHASH_ALL).unwrap();
    let redeem = multisig_script(2, &[4, 5, 6]);
    let mut script_sig = vec![0x00];
    push(&mut script_sig, &sign(&digest, 6));
    push(&mut script_sig, &sign(&digest, 4));
    push(&mut script_sig, &redeem);
    p2sh.inputs[0].script_sig = script_sig;
    assert!(verify_signature(&p2sh, 0, &ctx()).is_ok());
}

#[test]
fn test_p2sh_single_sig_signs_redeem_script() {
    let spend = Spend::P2shSingleSig(15);
    let mut tx = simple_tx(spend.clone(), 1_000, 1);
    assert!(full_validate(&tx, &ctx()).is_ok());

    // a digest over the P2SH locking script instead of the redeem script
    let locking = tx.inputs[0].spent_output.script_pubkey.clone();
    let digest = block_template_proof::sighash::legacy_sighash(&tx, 0, &locking, SIGHASH_ALL).unwrap();
    let mut script_sig = Vec::new();
    push(&mut script_sig, &sign(&digest, 15));
    push(&mut script_sig, &single_sig_script(15));
    tx.inputs[0].script_sig = script_sig;
    assert!(verify_locking_hash(&tx.inputs[0]).is_ok());
    assert!(matches!(
        verify_signature(&tx, 0, &ctx()),
        Err(ConsensusError::InvalidSignature(_))
    ));

    // redeem script for a different key fails the hash check
    let mut other = simple_tx(spend, 1_000, 2);
    let digest = compute_sighash(&other, 0, SIGHASH_ALL).unwrap();
    let mut script_sig = Vec::new();
    push(&mut script_sig, &sign(&digest, 16));
    push(&mut script_sig, &single_sig_script(16));
    other.inputs[0].script_sig = script_sig;
    assert!(matches!(
        verify_locking_hash(&other.inputs[0]),
        Err(ConsensusError::HashMismatch(_))
    ));
}

#[test]
fn test_multisig_key_used_once() {
    let mut tx = simple_tx(Spend::P2wshMultisig { required: 2, seeds: vec![7, 8, 9] }, 1_000, 1);
    // the same signature twice only satisfies key 7 once
    tx.inputs[0].witness[2] = tx.inputs[0].witness[1].clone();
    assert!(matches!(
        verify_signature(&tx, 0, &ctx()),
        Err(ConsensusError::InvalidSignature(_))
    ));
}

#[test]
fn test_multisig_skipping_a_key() {
    let spend = Spend::P2wshMultisig { required: 2, seeds: vec![7, 8, 9] };
    let mut tx = simple_tx(spend, 1_000, 1);
    // re-sign with keys 7 and 9 instead of 7 and 8
    let digest = compute_sighash(&tx, 0, SIGHASH_ALL).unwrap();
    tx.inputs[0].witness[2] = sign(&digest, 9);
    assert!(verify_signature(&tx, 0, &ctx()).is_ok());
}

#[test]
fn test_multisig_wrong_signature_count() {
    let mut tx = simple_tx(Spend::P2wshMultisig { required: 2, seeds: vec![7, 8, 9] }, 1_000, 1);
    tx.inputs[0].witness.remove(2);
    assert!(matches!(
        verify_locking_hash(&tx.inputs[0]),
        Err(ConsensusError::HashMismatch(_))
    ));
}

#[test]
fn test_signature_from_wrong_key_rejected() {
    let mut tx = simple_tx(Spend::P2wpkh(2), 1_000, 1);
    let digest = compute_sighash(&tx, 0, SIGHASH_ALL).unwrap();
    tx.inputs[0].witness[0] = sign(&digest, 3);
    assert!(verify_locking_hash(&tx.inputs[0]).is_ok());
    assert!(verify_signature(&tx, 0, &ctx()).is_err());
}

#[test]
fn test_sighash_algorithm_follows_input_zero() {
    // Input 1 is P2WPKH but input 0 is legacy, so every input is hashed the
    // legacy way. A wallet signing input 1 with BIP143 is therefore rejected.
    let mut tx = signed_tx(&[Spend::P2pkh(1), Spend::P2wpkh(2)], 500, 50);
    assert!(full_validate(&tx, &ctx()).is_ok());

    let script_code = block_template_proof::script::p2pkh_script(
        &block_template_proof::crypto::hash160(&pubkey(2)),
    );
    let digest = bip143_sighash(&tx, 1, &script_code, INPUT_VALUE, SIGHASH_ALL).unwrap();
    tx.inputs[1].witness[0] = sign(&digest, 2);
    assert!(matches!(
        verify_signature(&tx, 1, &ctx()),
        Err(ConsensusError::InvalidSignature(_))
    ));
}

#[test]
fn test_taproot_requires_flag() {
    let tx = simple_tx(Spend::P2tr(12), 1_000, 1);
    let strict = ValidationContext::new(NOW, SIGHASH_ALL, false);
    assert!(full_validate(&tx, &ctx()).is_ok());
    assert!(matches!(
        full_validate(&tx, &strict),
        Err(ConsensusError::UnsupportedTemplate(_))
    ));
}

#[test]
fn test_future_time_lock_rejected() {
    let mut tx = simple_tx(Spend::P2wpkh(2), 1_000, 1);
    tx.lock_time = NOW + 600;
    // re-sign so only the lock time is wrong
    let digest = compute_sighash(&tx, 0, SIGHASH_ALL).unwrap();
    tx.inputs[0].witness[0] = sign(&digest, 2);
    assert!(verify_signature(&tx, 0, &ctx()).is_ok());
    assert!(matches!(
        full_validate(&tx, &ctx()),
        Err(ConsensusError::TransactionValidation(_))
    ));
}

#[test]
fn test_builder_reports_validation_result() {
    let builder = BlockBuilder::new(MiningConfig::default()).unwrap();
    let tx = simple_tx(Spend::P2shP2wpkh(3), 1_000, 1);
    assert_eq!(builder.validate_transaction(&tx, NOW), ValidationResult::Valid);

    let mut broken = tx;
    broken.inputs[0].spent_output.script_type = None;
    assert!(matches!(
        builder.validate_transaction(&broken, NOW),
        ValidationResult::Invalid(_)
    ));
}

#[test]
fn test_asm_fields_do_not_affect_validation() {
    let mut tx = simple_tx(Spend::P2shP2wshMultisig { required: 1, seeds: vec![10, 11] }, 1_000, 1);
    tx.inputs[0].script_sig_asm = "OP_RETURN".to_string();
    tx.inputs[0].inner_redeem_script_asm = Some("OP_1".to_string());
    tx.inputs[0].inner_witness_script_asm = Some("OP_0 OP_CHECKSIG".to_string());
    assert!(full_validate(&tx, &ctx()).is_ok());

    // the decoded witness script is what is checked
    let last = tx.inputs[0].witness.len() - 1;
    tx.inputs[0].witness[last].push(0x00);
    assert!(full_validate(&tx, &ctx()).is_err());
}
