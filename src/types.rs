//! Core Bitcoin types for block template construction

use crate::error::{ConsensusError, Result};
use serde::{Deserialize, Serialize};

/// Hash type: 256-bit hash (internal byte order)
pub type Hash = [u8; 32];

/// Byte string type
pub type ByteString = Vec<u8>;

/// Natural number type
pub type Natural = u64;

/// Integer type
pub type Integer = i64;

/// OutPoint: 𝒪 = ℍ × ℕ
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub hash: Hash,
    pub index: u32,
}

impl OutPoint {
    /// The null outpoint spent by a coinbase input
    pub fn null() -> Self {
        OutPoint {
            hash: [0u8; 32],
            index: crate::constants::COINBASE_PREVOUT_INDEX,
        }
    }
}

/// Recognized output locking templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptTemplate {
    P2pkh,
    P2wpkh,
    P2sh,
    P2wsh,
    P2tr,
}

impl ScriptTemplate {
    /// Map an esplora-style type tag to a template; unknown tags yield `None`
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "p2pkh" => Some(ScriptTemplate::P2pkh),
            "v0_p2wpkh" => Some(ScriptTemplate::P2wpkh),
            "p2sh" => Some(ScriptTemplate::P2sh),
            "v0_p2wsh" => Some(ScriptTemplate::P2wsh),
            "v1_p2tr" => Some(ScriptTemplate::P2tr),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ScriptTemplate::P2pkh => "p2pkh",
            ScriptTemplate::P2wpkh => "v0_p2wpkh",
            ScriptTemplate::P2sh => "p2sh",
            ScriptTemplate::P2wsh => "v0_p2wsh",
            ScriptTemplate::P2tr => "v1_p2tr",
        }
    }
}

/// Transaction Output: 𝒯 = ℤ × 𝕊
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub value: Integer,
    pub script_pubkey: ByteString,
    pub script_pubkey_asm: String,
    /// `None` when the type tag is not one of the recognized templates
    pub script_type: Option<ScriptTemplate>,
    pub address: Option<String>,
}

impl TransactionOutput {
    pub fn new(value: Integer, script_pubkey: ByteString) -> Self {
        let script_pubkey_asm = crate::script::disassemble(&script_pubkey);
        TransactionOutput {
            value,
            script_pubkey,
            script_pubkey_asm,
            script_type: None,
            address: None,
        }
    }
}

/// Transaction Input: ℐ = 𝒪 × 𝕊 × 𝒲 × ℕ × 𝒯
///
/// Carries the output it spends so that values and signature hashes can be
/// computed without a UTXO set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub prevout: OutPoint,
    pub script_sig: ByteString,
    /// Display only
    pub script_sig_asm: String,
    pub witness: Vec<ByteString>,
    pub sequence: u32,
    pub spent_output: TransactionOutput,
    /// Display only; the redeem script is decoded from `script_sig`
    pub inner_redeem_script_asm: Option<String>,
    /// Display only; the witness script is decoded from `witness`
    pub inner_witness_script_asm: Option<String>,
}

impl TransactionInput {
    pub fn has_witness(&self) -> bool {
        !self.witness.is_empty()
    }

    /// Template of the output being spent
    pub fn template(&self) -> Result<ScriptTemplate> {
        self.spent_output.script_type.ok_or_else(|| {
            ConsensusError::UnsupportedTemplate(format!(
                "unrecognized locking script {}",
                hex::encode(&self.spent_output.script_pubkey)
            ))
        })
    }
}

/// Transaction: 𝒯𝒳 = ℤ × ℐ* × 𝒯* × ℕ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: u32,
}

impl Transaction {
    pub fn has_witness(&self) -> bool {
        self.inputs.iter().any(TransactionInput::has_witness)
    }
}

/// Block Header: ℋ = ℤ × ℍ × ℍ × ℕ × ℕ × ℕ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: i32,
    pub prev_block_hash: Hash,
    pub merkle_root: Hash,
    pub timestamp: u32,
    pub bits: u32,
    pub nonce: u32,
}

/// Block: ℬ = ℋ × 𝒯𝒳*
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

/// Validation result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(String),
}

/// LIFO stack of byte strings used while checking a single input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stack {
    items: Vec<ByteString>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: ByteString) {
        self.items.push(item);
    }

    pub fn pop(&mut self) -> Result<ByteString> {
        self.items
            .pop()
            .ok_or_else(|| ConsensusError::HashMismatch("stack is empty".to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_template_tags() {
        for template in [
            ScriptTemplate::P2pkh,
            ScriptTemplate::P2wpkh,
            ScriptTemplate::P2sh,
            ScriptTemplate::P2wsh,
            ScriptTemplate::P2tr,
        ] {
            assert_eq!(ScriptTemplate::from_tag(template.tag()), Some(template));
        }
        assert_eq!(ScriptTemplate::from_tag("op_return"), None);
        assert_eq!(ScriptTemplate::from_tag("p2pk"), None);
    }

    #[test]
    fn test_stack_lifo() {
        let mut stack = Stack::new();
        stack.push(vec![1]);
        stack.push(vec![2]);
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.pop().unwrap(), vec![2]);
        assert_eq!(stack.pop().unwrap(), vec![1]);
        assert!(stack.is_empty());
        assert!(stack.pop().is_err());
    }

    #[test]
    fn test_null_outpoint() {
        let outpoint = OutPoint::null();
        assert_eq!(outpoint.hash, [0u8; 32]);
        assert_eq!(outpoint.index, 0xffffffff);
    }

    #[test]
    fn test_input_template_unrecognized() {
        let input = TransactionInput {
            prevout: OutPoint { hash: [1; 32], index: 0 },
            script_sig: vec![],
            script_sig_asm: String::new(),
            witness: vec![],
            sequence: 0xffffffff,
            spent_output: TransactionOutput::new(1000, vec![0x51]),
            inner_redeem_script_asm: None,
            inner_witness_script_asm: None,
        };
        assert!(matches!(
            input.template(),
            Err(ConsensusError::UnsupportedTemplate(_))
        ));
        assert!(!input.has_witness());
    }
}
