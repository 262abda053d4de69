//! Coinbase transaction construction

use crate::config::MiningConfig;
use crate::constants::*;
use crate::error::Result;
use crate::script::{classify_locking_script, disassemble, push_data};
use crate::segwit::build_commitment_script;
use crate::transaction::calculate_weight;
use crate::types::*;

/// BIP34 height push: minimal little-endian script number
///
/// A trailing 0x00 is added when the top bit of the last byte is set, so the
/// number stays positive. Height 0 is OP_0.
pub fn block_height_script(height: Natural) -> Result<ByteString> {
    let mut number = Vec::new();
    let mut remaining = height;
    while remaining > 0 {
        number.push((remaining & 0xff) as u8);
        remaining >>= 8;
    }
    if number.last().map_or(false, |&byte| byte & 0x80 != 0) {
        number.push(0x00);
    }

    let mut script = Vec::with_capacity(number.len() + 1);
    push_data(&mut script, &number)?;
    Ok(script)
}

fn display_output(value: Integer, script_pubkey: ByteString, address: Option<String>) -> TransactionOutput {
    let mut output = TransactionOutput::new(value, script_pubkey);
    output.script_type = classify_locking_script(&output.script_pubkey);
    output.address = address;
    output
}

/// CreateCoinbaseTransaction: ℤ × 𝕊 → 𝒯𝒳
///
/// 1. One input spending the null outpoint, scriptSig = BIP34 height push
/// 2. Output 0 pays `reward` to the configured payout script
/// 3. Output 1 carries the witness commitment with zero value
/// 4. Witness = [witness reserved value]
pub fn build_coinbase_tx(
    commitment_script: ByteString,
    reward: Integer,
    config: &MiningConfig,
) -> Result<Transaction> {
    let script_sig = block_height_script(config.block_height)?;
    let script_sig_asm = disassemble(&script_sig);

    let coinbase_input = TransactionInput {
        prevout: OutPoint::null(),
        script_sig,
        script_sig_asm,
        witness: vec![WITNESS_RESERVED_VALUE.to_vec()],
        sequence: SEQUENCE_FINAL,
        spent_output: TransactionOutput::new(0, Vec::new()),
        inner_redeem_script_asm: None,
        inner_witness_script_asm: None,
    };

    let payout = display_output(
        reward,
        config.payout_script_bytes()?,
        Some(config.payout_address.clone()),
    );
    let commitment = display_output(0, commitment_script, None);

    Ok(Transaction {
        version: COINBASE_TX_VERSION,
        inputs: vec![coinbase_input],
        outputs: vec![payout, commitment],
        lock_time: 0,
    })
}

/// Weight of the coinbase before its reward and commitment are known.
/// Neither changes the serialized size.
pub fn coinbase_template_weight(config: &MiningConfig) -> Result<Natural> {
    let placeholder = build_commitment_script(&[0u8; 32])?;
    let coinbase = build_coinbase_tx(placeholder, 0, config)?;
    Ok(calculate_weight(&coinbase))
}
