//! Script template decoding
//!
//! Only a fixed set of spending templates is recognized. Locking scripts are
//! matched byte-for-byte against their standard shapes, unlocking data is parsed
//! into pushes, and the result is a typed [`SpendingPath`] carrying the hashes,
//! keys, scripts and signatures that verification and sighash computation need.

use crate::error::{ConsensusError, Result};
use crate::types::*;

pub const OP_0: u8 = 0x00;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_1NEGATE: u8 = 0x4f;
pub const OP_1: u8 = 0x51;
pub const OP_16: u8 = 0x60;
pub const OP_RETURN: u8 = 0x6a;
pub const OP_DUP: u8 = 0x76;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_CHECKMULTISIG: u8 = 0xae;

/// A single parsed script element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptOp {
    Push(ByteString),
    Op(u8),
}

/// Read the next element starting at `*pos`
fn next_op(script: &[u8], pos: &mut usize) -> Result<ScriptOp> {
    let opcode = script[*pos];
    *pos += 1;

    let len = match opcode {
        OP_0 => return Ok(ScriptOp::Push(Vec::new())),
        0x01..=0x4b => opcode as usize,
        OP_PUSHDATA1 => read_push_len(script, pos, 1)?,
        OP_PUSHDATA2 => read_push_len(script, pos, 2)?,
        OP_PUSHDATA4 => read_push_len(script, pos, 4)?,
        _ => return Ok(ScriptOp::Op(opcode)),
    };

    let end = pos.checked_add(len).filter(|&end| end <= script.len()).ok_or_else(|| {
        ConsensusError::Decode(format!("push of {} bytes runs past end of script", len))
    })?;
    let data = script[*pos..end].to_vec();
    *pos = end;
    Ok(ScriptOp::Push(data))
}

fn read_push_len(script: &[u8], pos: &mut usize, width: usize) -> Result<usize> {
    if *pos + width > script.len() {
        return Err(ConsensusError::Decode("truncated PUSHDATA length".to_string()));
    }
    let mut buf = [0u8; 4];
    buf[..width].copy_from_slice(&script[*pos..*pos + width]);
    *pos += width;
    Ok(u32::from_le_bytes(buf) as usize)
}

/// Parse raw script bytes into pushes and opcodes
pub fn parse_script(script: &[u8]) -> Result<Vec<ScriptOp>> {
    let mut ops = Vec::new();
    let mut pos = 0;
    while pos < script.len() {
        ops.push(next_op(script, &mut pos)?);
    }
    Ok(ops)
}

/// Parse a push-only script (scriptSig) into its pushed items
pub fn parse_pushes(script: &[u8]) -> Result<Vec<ByteString>> {
    parse_script(script)?
        .into_iter()
        .map(|op| match op {
            ScriptOp::Push(data) => Ok(data),
            ScriptOp::Op(opcode) => Err(ConsensusError::Decode(format!(
                "unlocking script is not push-only (opcode {:#04x})",
                opcode
            ))),
        })
        .collect()
}

fn opcode_name(opcode: u8) -> String {
    let name = match opcode {
        OP_1NEGATE => "OP_PUSHNUM_NEG1",
        0x61 => "OP_NOP",
        0x63 => "OP_IF",
        0x64 => "OP_NOTIF",
        0x67 => "OP_ELSE",
        0x68 => "OP_ENDIF",
        0x69 => "OP_VERIFY",
        OP_RETURN => "OP_RETURN",
        0x75 => "OP_DROP",
        OP_DUP => "OP_DUP",
        OP_EQUAL => "OP_EQUAL",
        OP_EQUALVERIFY => "OP_EQUALVERIFY",
        0xa8 => "OP_SHA256",
        OP_HASH160 => "OP_HASH160",
        0xaa => "OP_HASH256",
        OP_CHECKSIG => "OP_CHECKSIG",
        0xad => "OP_CHECKSIGVERIFY",
        OP_CHECKMULTISIG => "OP_CHECKMULTISIG",
        0xaf => "OP_CHECKMULTISIGVERIFY",
        0xb1 => "OP_CLTV",
        0xb2 => "OP_CSV",
        OP_1..=OP_16 => return format!("OP_PUSHNUM_{}", opcode - OP_1 + 1),
        _ => return format!("OP_UNKNOWN_{:#04x}", opcode),
    };
    name.to_string()
}

/// Render a script in the esplora ASM style
/// (`OP_DUP OP_HASH160 OP_PUSHBYTES_20 <hex> OP_EQUALVERIFY OP_CHECKSIG`).
pub fn disassemble(script: &[u8]) -> String {
    let mut parts = Vec::new();
    let mut pos = 0;
    while pos < script.len() {
        let opcode = script[pos];
        match next_op(script, &mut pos) {
            Ok(ScriptOp::Push(data)) => match opcode {
                OP_0 => parts.push("OP_0".to_string()),
                OP_PUSHDATA1 => parts.push(format!("OP_PUSHDATA1 {}", hex::encode(&data))),
                OP_PUSHDATA2 => parts.push(format!("OP_PUSHDATA2 {}", hex::encode(&data))),
                OP_PUSHDATA4 => parts.push(format!("OP_PUSHDATA4 {}", hex::encode(&data))),
                _ => parts.push(format!("OP_PUSHBYTES_{} {}", data.len(), hex::encode(&data))),
            },
            Ok(ScriptOp::Op(op)) => parts.push(opcode_name(op)),
            Err(_) => {
                parts.push("<push past end>".to_string());
                break;
            }
        }
    }
    parts.join(" ")
}

/// `OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG`
pub fn p2pkh_hash(script: &[u8]) -> Option<[u8; 20]> {
    if script.len() == 25
        && script[0] == OP_DUP
        && script[1] == OP_HASH160
        && script[2] == 0x14
        && script[23] == OP_EQUALVERIFY
        && script[24] == OP_CHECKSIG
    {
        script[3..23].try_into().ok()
    } else {
        None
    }
}

/// `OP_0 <20>`
pub fn p2wpkh_program(script: &[u8]) -> Option<[u8; 20]> {
    if script.len() == 22 && script[0] == OP_0 && script[1] == 0x14 {
        script[2..22].try_into().ok()
    } else {
        None
    }
}

/// `OP_HASH160 <20> OP_EQUAL`
pub fn p2sh_hash(script: &[u8]) -> Option<[u8; 20]> {
    if script.len() == 23 && script[0] == OP_HASH160 && script[1] == 0x14 && script[22] == OP_EQUAL
    {
        script[2..22].try_into().ok()
    } else {
        None
    }
}

/// `OP_0 <32>`
pub fn p2wsh_program(script: &[u8]) -> Option<[u8; 32]> {
    if script.len() == 34 && script[0] == OP_0 && script[1] == 0x20 {
        script[2..34].try_into().ok()
    } else {
        None
    }
}

/// `OP_1 <32>`
pub fn is_p2tr(script: &[u8]) -> bool {
    script.len() == 34 && script[0] == OP_1 && script[1] == 0x20
}

/// Template of a locking script, by shape
pub fn classify_locking_script(script: &[u8]) -> Option<ScriptTemplate> {
    if p2pkh_hash(script).is_some() {
        Some(ScriptTemplate::P2pkh)
    } else if p2wpkh_program(script).is_some() {
        Some(ScriptTemplate::P2wpkh)
    } else if p2sh_hash(script).is_some() {
        Some(ScriptTemplate::P2sh)
    } else if p2wsh_program(script).is_some() {
        Some(ScriptTemplate::P2wsh)
    } else if is_p2tr(script) {
        Some(ScriptTemplate::P2tr)
    } else {
        None
    }
}

/// Build `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG`
pub fn p2pkh_script(pubkey_hash: &[u8; 20]) -> ByteString {
    let mut script = vec![OP_DUP, OP_HASH160, 0x14];
    script.extend_from_slice(pubkey_hash);
    script.push(OP_EQUALVERIFY);
    script.push(OP_CHECKSIG);
    script
}

/// Append a minimal direct push of `data` (up to 75 bytes)
pub fn push_data(script: &mut ByteString, data: &[u8]) -> Result<()> {
    if data.len() > 0x4b {
        return Err(ConsensusError::Serialization(format!(
            "direct push limited to 75 bytes, got {}",
            data.len()
        )));
    }
    script.push(data.len() as u8);
    script.extend_from_slice(data);
    Ok(())
}

/// Decoded `OP_m <pubkey>... OP_n OP_CHECKMULTISIG`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultisigScript {
    pub required: usize,
    pub pubkeys: Vec<ByteString>,
}

impl MultisigScript {
    pub fn parse(script: &[u8]) -> Result<Self> {
        let ops = parse_script(script)?;
        let unsupported =
            || ConsensusError::UnsupportedTemplate(format!("not a multisig script: {}", disassemble(script)));

        if ops.len() < 4 || ops[ops.len() - 1] != ScriptOp::Op(OP_CHECKMULTISIG) {
            return Err(unsupported());
        }

        let small_int = |op: &ScriptOp| match op {
            ScriptOp::Op(code @ OP_1..=OP_16) => Some((code - OP_1 + 1) as usize),
            _ => None,
        };
        let required = small_int(&ops[0]).ok_or_else(unsupported)?;
        let total = small_int(&ops[ops.len() - 2]).ok_or_else(unsupported)?;

        let pubkeys = ops[1..ops.len() - 2]
            .iter()
            .map(|op| match op {
                ScriptOp::Push(key) if key.len() == 33 || key.len() == 65 => Ok(key.clone()),
                _ => Err(unsupported()),
            })
            .collect::<Result<Vec<_>>>()?;

        if pubkeys.len() != total || required > total {
            return Err(unsupported());
        }

        Ok(MultisigScript { required, pubkeys })
    }
}

/// How a recognized input is unlocked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpendingPath {
    P2pkh {
        pubkey_hash: [u8; 20],
        signature: ByteString,
        pubkey: ByteString,
    },
    P2wpkh {
        pubkey_hash: [u8; 20],
        signature: ByteString,
        pubkey: ByteString,
    },
    P2shP2wpkh {
        script_hash: [u8; 20],
        redeem_script: ByteString,
        pubkey_hash: [u8; 20],
        signature: ByteString,
        pubkey: ByteString,
    },
    P2shSingleSig {
        script_hash: [u8; 20],
        redeem_script: ByteString,
        signature: ByteString,
        pubkey: ByteString,
    },
    P2shMultisig {
        script_hash: [u8; 20],
        redeem_script: ByteString,
        multisig: MultisigScript,
        signatures: Vec<ByteString>,
    },
    P2wsh {
        script_hash: [u8; 32],
        witness_script: ByteString,
        multisig: MultisigScript,
        signatures: Vec<ByteString>,
    },
    P2shP2wsh {
        script_hash: [u8; 20],
        redeem_script: ByteString,
        witness_program: [u8; 32],
        witness_script: ByteString,
        multisig: MultisigScript,
        signatures: Vec<ByteString>,
    },
    P2tr,
}

impl SpendingPath {
    /// Whether the input signs the BIP143 digest
    pub fn is_segwit(&self) -> bool {
        matches!(
            self,
            SpendingPath::P2wpkh { .. }
                | SpendingPath::P2shP2wpkh { .. }
                | SpendingPath::P2wsh { .. }
                | SpendingPath::P2shP2wsh { .. }
                | SpendingPath::P2tr
        )
    }

    /// BIP143 scriptCode (without its length prefix)
    pub fn witness_script_code(&self) -> Option<ByteString> {
        match self {
            SpendingPath::P2wpkh { pubkey_hash, .. }
            | SpendingPath::P2shP2wpkh { pubkey_hash, .. } => Some(p2pkh_script(pubkey_hash)),
            SpendingPath::P2wsh { witness_script, .. }
            | SpendingPath::P2shP2wsh { witness_script, .. } => Some(witness_script.clone()),
            _ => None,
        }
    }

    /// Redeem script of a P2SH spend
    pub fn redeem_script(&self) -> Option<&ByteString> {
        match self {
            SpendingPath::P2shP2wpkh { redeem_script, .. }
            | SpendingPath::P2shSingleSig { redeem_script, .. }
            | SpendingPath::P2shMultisig { redeem_script, .. }
            | SpendingPath::P2shP2wsh { redeem_script, .. } => Some(redeem_script),
            _ => None,
        }
    }
}

fn two_items(items: &[ByteString], what: &str) -> Result<(ByteString, ByteString)> {
    match items {
        [signature, pubkey] => Ok((signature.clone(), pubkey.clone())),
        _ => Err(ConsensusError::Decode(format!(
            "{} must hold <signature> <pubkey>, found {} items",
            what,
            items.len()
        ))),
    }
}

/// Split `<dummy> <sig>... <script>` into signatures and script
fn multisig_items(items: &[ByteString], what: &str) -> Result<(Vec<ByteString>, ByteString)> {
    match items {
        [dummy, signatures @ .., script] if dummy.is_empty() => {
            Ok((signatures.to_vec(), script.clone()))
        }
        [_, _, ..] => Err(ConsensusError::UnsupportedTemplate(format!(
            "{} has a non-empty multisig dummy element",
            what
        ))),
        _ => Err(ConsensusError::Decode(format!(
            "{} too short for a multisig spend",
            what
        ))),
    }
}

fn locking_mismatch(template: ScriptTemplate) -> ConsensusError {
    ConsensusError::Decode(format!(
        "locking script does not match its {} type tag",
        template.tag()
    ))
}

/// DecodeSpendingPath: ℐ → 𝒫
///
/// Decode the unlocking data of `input` against the template of the output it
/// spends. P2SH is disambiguated here: with witness data the redeem script must be
/// a v0 witness program (P2SH-P2WPKH or P2SH-P2WSH multisig); without it the redeem
/// script must be multisig or `<pubkey> OP_CHECKSIG`.
pub fn decode_spending_path(input: &TransactionInput) -> Result<SpendingPath> {
    let template = input.template()?;
    let locking = &input.spent_output.script_pubkey;

    match template {
        ScriptTemplate::P2pkh => {
            let pubkey_hash = p2pkh_hash(locking).ok_or_else(|| locking_mismatch(template))?;
            let (signature, pubkey) = two_items(&parse_pushes(&input.script_sig)?, "scriptSig")?;
            Ok(SpendingPath::P2pkh { pubkey_hash, signature, pubkey })
        }
        ScriptTemplate::P2wpkh => {
            let pubkey_hash = p2wpkh_program(locking).ok_or_else(|| locking_mismatch(template))?;
            let (signature, pubkey) = two_items(&input.witness, "witness")?;
            Ok(SpendingPath::P2wpkh { pubkey_hash, signature, pubkey })
        }
        ScriptTemplate::P2sh => {
            let script_hash = p2sh_hash(locking).ok_or_else(|| locking_mismatch(template))?;
            let pushes = parse_pushes(&input.script_sig)?;
            let redeem_script = pushes
                .last()
                .cloned()
                .ok_or_else(|| ConsensusError::Decode("empty P2SH scriptSig".to_string()))?;

            if input.has_witness() {
                if let Some(pubkey_hash) = p2wpkh_program(&redeem_script) {
                    let (signature, pubkey) = two_items(&input.witness, "witness")?;
                    return Ok(SpendingPath::P2shP2wpkh {
                        script_hash,
                        redeem_script,
                        pubkey_hash,
                        signature,
                        pubkey,
                    });
                }
                if let Some(witness_program) = p2wsh_program(&redeem_script) {
                    let (signatures, witness_script) = multisig_items(&input.witness, "witness")?;
                    let multisig = MultisigScript::parse(&witness_script)?;
                    return Ok(SpendingPath::P2shP2wsh {
                        script_hash,
                        redeem_script,
                        witness_program,
                        witness_script,
                        multisig,
                        signatures,
                    });
                }
                return Err(ConsensusError::UnsupportedTemplate(format!(
                    "P2SH redeem script with witness: {}",
                    disassemble(&redeem_script)
                )));
            }

            if let Ok(multisig) = MultisigScript::parse(&redeem_script) {
                let (signatures, _) = multisig_items(&pushes, "scriptSig")?;
                return Ok(SpendingPath::P2shMultisig {
                    script_hash,
                    redeem_script,
                    multisig,
                    signatures,
                });
            }

            match parse_script(&redeem_script)?.as_slice() {
                [ScriptOp::Push(pubkey), ScriptOp::Op(OP_CHECKSIG)] if pushes.len() == 2 => {
                    Ok(SpendingPath::P2shSingleSig {
                        script_hash,
                        pubkey: pubkey.clone(),
                        signature: pushes[0].clone(),
                        redeem_script,
                    })
                }
                _ => Err(ConsensusError::UnsupportedTemplate(format!(
                    "P2SH redeem script: {}",
                    disassemble(&redeem_script)
                ))),
            }
        }
        ScriptTemplate::P2wsh => {
            let script_hash = p2wsh_program(locking).ok_or_else(|| locking_mismatch(template))?;
            let (signatures, witness_script) = multisig_items(&input.witness, "witness")?;
            let multisig = MultisigScript::parse(&witness_script)?;
            Ok(SpendingPath::P2wsh {
                script_hash,
                witness_script,
                multisig,
                signatures,
            })
        }
        ScriptTemplate::P2tr => {
            if !is_p2tr(locking) {
                return Err(locking_mismatch(template));
            }
            Ok(SpendingPath::P2tr)
        }
    }
}
