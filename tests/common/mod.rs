//! Shared fixtures: deterministically signed transactions for every template
#![allow(dead_code)]

use block_template_proof::codec::hash_to_display_hex;
use block_template_proof::crypto::{hash160, sha256};
use block_template_proof::mempool::{RawInput, RawOutput, RawTransaction};
use block_template_proof::script::{
    p2pkh_script, OP_0, OP_1, OP_CHECKMULTISIG, OP_CHECKSIG, OP_PUSHDATA1,
};
use block_template_proof::sighash::compute_sighash;
use block_template_proof::types::*;
use block_template_proof::SIGHASH_ALL;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

pub const NOW: u32 = 1_700_000_000;

/// Value of every spent output
pub const INPUT_VALUE: Integer = 100_000;

/// How an input of a fixture transaction is locked
#[derive(Debug, Clone)]
pub enum Spend {
    P2pkh(u8),
    P2wpkh(u8),
    P2shP2wpkh(u8),
    P2shSingleSig(u8),
    P2shMultisig { required: u8, seeds: Vec<u8> },
    P2wshMultisig { required: u8, seeds: Vec<u8> },
    P2shP2wshMultisig { required: u8, seeds: Vec<u8> },
    P2tr(u8),
}

pub fn secret_key(seed: u8) -> SecretKey {
    SecretKey::from_slice(&[seed; 32]).unwrap()
}

pub fn pubkey(seed: u8) -> ByteString {
    let secp = Secp256k1::new();
    PublicKey::from_secret_key(&secp, &secret_key(seed))
        .serialize()
        .to_vec()
}

/// DER signature with SIGHASH_ALL appended
pub fn sign(digest: &Hash, seed: u8) -> ByteString {
    let secp = Secp256k1::new();
    let message = Message::from_digest_slice(digest).unwrap();
    let mut signature = secp
        .sign_ecdsa(&message, &secret_key(seed))
        .serialize_der()
        .to_vec();
    signature.push(SIGHASH_ALL as u8);
    signature
}

/// Push of any size up to 255 bytes
pub fn push(script: &mut ByteString, data: &[u8]) {
    if data.len() <= 75 {
        script.push(data.len() as u8);
    } else {
        script.push(OP_PUSHDATA1);
        script.push(data.len() as u8);
    }
    script.extend_from_slice(data);
}

pub fn multisig_script(required: u8, seeds: &[u8]) -> ByteString {
    let mut script = vec![OP_1 + required - 1];
    for &seed in seeds {
        push(&mut script, &pubkey(seed));
    }
    script.push(OP_1 + seeds.len() as u8 - 1);
    script.push(OP_CHECKMULTISIG);
    script
}

/// `<pubkey> OP_CHECKSIG`
pub fn single_sig_script(seed: u8) -> ByteString {
    let mut script = Vec::new();
    push(&mut script, &pubkey(seed));
    script.push(OP_CHECKSIG);
    script
}

pub fn p2wpkh_script(hash: &[u8; 20]) -> ByteString {
    let mut script = vec![OP_0, 0x14];
    script.extend_from_slice(hash);
    script
}

pub fn p2sh_script(redeem: &[u8]) -> ByteString {
    let mut script = vec![0xa9, 0x14];
    script.extend_from_slice(&hash160(redeem));
    script.push(0x87);
    script
}

pub fn p2wsh_script(witness_script: &[u8]) -> ByteString {
    let mut script = vec![OP_0, 0x20];
    script.extend_from_slice(&sha256(witness_script));
    script
}

fn spent(template: ScriptTemplate, script: ByteString) -> TransactionOutput {
    let mut output = TransactionOutput::new(INPUT_VALUE, script);
    output.script_type = Some(template);
    output
}

const PLACEHOLDER_SIG: [u8; 72] = [0x30; 72];

/// Locked output plus unlocking data with placeholder signatures
fn lock(spend: &Spend) -> (TransactionOutput, ByteString, Vec<ByteString>) {
    match spend {
        Spend::P2pkh(seed) => {
            let pk = pubkey(*seed);
            let mut script_sig = Vec::new();
            push(&mut script_sig, &PLACEHOLDER_SIG);
            push(&mut script_sig, &pk);
            (
                spent(ScriptTemplate::P2pkh, p2pkh_script(&hash160(&pk))),
                script_sig,
                vec![],
            )
        }
        Spend::P2wpkh(seed) => {
            let pk = pubkey(*seed);
            (
                spent(ScriptTemplate::P2wpkh, p2wpkh_script(&hash160(&pk))),
                vec![],
                vec![PLACEHOLDER_SIG.to_vec(), pk],
            )
        }
        Spend::P2shP2wpkh(seed) => {
            let pk = pubkey(*seed);
            let redeem = p2wpkh_script(&hash160(&pk));
            let mut script_sig = Vec::new();
            push(&mut script_sig, &redeem);
            (
                spent(ScriptTemplate::P2sh, p2sh_script(&redeem)),
                script_sig,
                vec![PLACEHOLDER_SIG.to_vec(), pk],
            )
        }
        Spend::P2shSingleSig(seed) => {
            let redeem = single_sig_script(*seed);
            let mut script_sig = Vec::new();
            push(&mut script_sig, &PLACEHOLDER_SIG);
            push(&mut script_sig, &redeem);
            (spent(ScriptTemplate::P2sh, p2sh_script(&redeem)), script_sig, vec![])
        }
        Spend::P2shMultisig { required, seeds } => {
            let redeem = multisig_script(*required, seeds);
            let mut script_sig = vec![OP_0];
            for _ in 0..*required {
                push(&mut script_sig, &PLACEHOLDER_SIG);
            }
            push(&mut script_sig, &redeem);
            (spent(ScriptTemplate::P2sh, p2sh_script(&redeem)), script_sig, vec![])
        }
        Spend::P2wshMultisig { required, seeds } => {
            let witness_script = multisig_script(*required, seeds);
            let mut witness = vec![vec![]];
            witness.extend((0..*required).map(|_| PLACEHOLDER_SIG.to_vec()));
            let locking = p2wsh_script(&witness_script);
            witness.push(witness_script);
            (spent(ScriptTemplate::P2wsh, locking), vec![], witness)
        }
        Spend::P2shP2wshMultisig { required, seeds } => {
            let witness_script = multisig_script(*required, seeds);
            let redeem = p2wsh_script(&witness_script);
            let mut script_sig = Vec::new();
            push(&mut script_sig, &redeem);
            let mut witness = vec![vec![]];
            witness.extend((0..*required).map(|_| PLACEHOLDER_SIG.to_vec()));
            witness.push(witness_script);
            (spent(ScriptTemplate::P2sh, p2sh_script(&redeem)), script_sig, witness)
        }
        Spend::P2tr(seed) => {
            let mut locking = vec![OP_1, 0x20];
            locking.extend_from_slice(&[*seed; 32]);
            (spent(ScriptTemplate::P2tr, locking), vec![], vec![vec![0x01; 64]])
        }
    }
}

/// Replace the placeholder signatures of input `index` with real ones
fn apply_signatures(tx: &mut Transaction, index: usize, spend: &Spend, digest: &Hash) {
    let input = &mut tx.inputs[index];
    match spend {
        Spend::P2pkh(seed) => {
            let mut script_sig = Vec::new();
            push(&mut script_sig, &sign(digest, *seed));
            push(&mut script_sig, &pubkey(*seed));
            input.script_sig = script_sig;
        }
        Spend::P2wpkh(seed) | Spend::P2shP2wpkh(seed) => {
            input.witness[0] = sign(digest, *seed);
        }
        Spend::P2shSingleSig(seed) => {
            let mut script_sig = Vec::new();
            push(&mut script_sig, &sign(digest, *seed));
            push(&mut script_sig, &single_sig_script(*seed));
            input.script_sig = script_sig;
        }
        Spend::P2shMultisig { required, seeds } => {
            let redeem = multisig_script(*required, seeds);
            let mut script_sig = vec![OP_0];
            for &seed in seeds.iter().take(*required as usize) {
                push(&mut script_sig, &sign(digest, seed));
            }
            push(&mut script_sig, &redeem);
            input.script_sig = script_sig;
        }
        Spend::P2wshMultisig { required, seeds } | Spend::P2shP2wshMultisig { required, seeds } => {
            for (slot, &seed) in seeds.iter().take(*required as usize).enumerate() {
                input.witness[slot + 1] = sign(digest, seed);
            }
        }
        Spend::P2tr(_) => {}
    }
}

/// Transaction spending one output per entry of `spends`, paying `fee`.
/// `tag` keeps prevouts distinct between fixtures.
pub fn signed_tx(spends: &[Spend], fee: Integer, tag: u8) -> Transaction {
    let inputs = spends
        .iter()
        .enumerate()
        .map(|(i, spend)| {
            let (spent_output, script_sig, witness) = lock(spend);
            TransactionInput {
                prevout: OutPoint { hash: [tag; 32], index: i as u32 },
                script_sig,
                script_sig_asm: String::new(),
                witness,
                sequence: 0xffffffff,
                spent_output,
                inner_redeem_script_asm: None,
                inner_witness_script_asm: None,
            }
        })
        .collect();

    let pay_to = p2wpkh_script(&hash160(&pubkey(200)));
    let mut tx = Transaction {
        version: 2,
        inputs,
        outputs: vec![TransactionOutput::new(
            INPUT_VALUE * spends.len() as Integer - fee,
            pay_to,
        )],
        lock_time: 0,
    };

    for (i, spend) in spends.iter().enumerate() {
        if matches!(spend, Spend::P2tr(_)) {
            continue;
        }
        let digest = compute_sighash(&tx, i, SIGHASH_ALL).unwrap();
        apply_signatures(&mut tx, i, spend, &digest);
    }
    tx
}

/// Single-input transaction of the given kind
pub fn simple_tx(spend: Spend, fee: Integer, tag: u8) -> Transaction {
    signed_tx(&[spend], fee, tag)
}

fn raw_output(output: &TransactionOutput) -> RawOutput {
    RawOutput {
        scriptpubkey: hex::encode(&output.script_pubkey),
        scriptpubkey_asm: output.script_pubkey_asm.clone(),
        scriptpubkey_type: output
            .script_type
            .map(|t| t.tag().to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        scriptpubkey_address: output.address.clone(),
        value: output.value,
    }
}

/// Render a transaction in the mempool file format
pub fn to_mempool_json(tx: &Transaction) -> String {
    let raw = RawTransaction {
        version: tx.version,
        locktime: tx.lock_time,
        vin: tx
            .inputs
            .iter()
            .map(|input| RawInput {
                txid: hash_to_display_hex(&input.prevout.hash),
                vout: input.prevout.index,
                prevout: raw_output(&input.spent_output),
                scriptsig: hex::encode(&input.script_sig),
                scriptsig_asm: input.script_sig_asm.clone(),
                witness: input.witness.iter().map(hex::encode).collect(),
                is_coinbase: false,
                sequence: input.sequence,
                inner_redeemscript_asm: input.inner_redeem_script_asm.clone(),
                inner_witnessscript_asm: input.inner_witness_script_asm.clone(),
            })
            .collect(),
        vout: tx.outputs.iter().map(raw_output).collect(),
    };
    serde_json::to_string_pretty(&raw).unwrap()
}
