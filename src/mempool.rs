//! Mempool loading from esplora-style JSON transaction files
//!
//! Each file in the mempool directory holds one transaction together with the
//! outputs its inputs spend. Files are decoded into [`Transaction`]s; files that
//! cannot be read or decoded are skipped with a warning.

use crate::codec::{hex_to_bytes, hex_to_hash_display};
use crate::error::{ConsensusError, Result};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Output as it appears in a transaction file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawOutput {
    pub scriptpubkey: String,
    #[serde(default)]
    pub scriptpubkey_asm: String,
    #[serde(default)]
    pub scriptpubkey_type: String,
    #[serde(default)]
    pub scriptpubkey_address: Option<String>,
    pub value: i64,
}

/// Input as it appears in a transaction file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawInput {
    /// Spent txid, display order
    pub txid: String,
    pub vout: u32,
    pub prevout: RawOutput,
    #[serde(default)]
    pub scriptsig: String,
    #[serde(default)]
    pub scriptsig_asm: String,
    #[serde(default)]
    pub witness: Vec<String>,
    #[serde(default)]
    pub is_coinbase: bool,
    pub sequence: u32,
    #[serde(default)]
    pub inner_redeemscript_asm: Option<String>,
    #[serde(default)]
    pub inner_witnessscript_asm: Option<String>,
}

/// Transaction file contents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTransaction {
    pub version: i32,
    pub locktime: u32,
    pub vin: Vec<RawInput>,
    pub vout: Vec<RawOutput>,
}

impl TryFrom<RawOutput> for TransactionOutput {
    type Error = ConsensusError;

    fn try_from(raw: RawOutput) -> Result<Self> {
        Ok(TransactionOutput {
            value: raw.value,
            script_pubkey: hex_to_bytes(&raw.scriptpubkey)?,
            script_pubkey_asm: raw.scriptpubkey_asm,
            script_type: ScriptTemplate::from_tag(&raw.scriptpubkey_type),
            address: raw.scriptpubkey_address,
        })
    }
}

impl TryFrom<RawInput> for TransactionInput {
    type Error = ConsensusError;

    fn try_from(raw: RawInput) -> Result<Self> {
        let spent_type = raw.prevout.scriptpubkey_type.clone();
        let spent_output = TransactionOutput::try_from(raw.prevout)?;
        if spent_output.script_type.is_none() {
            warn!(tag = %spent_type, txid = %raw.txid, vout = raw.vout, "unrecognized script type");
        }

        Ok(TransactionInput {
            prevout: OutPoint {
                hash: hex_to_hash_display(&raw.txid)?,
                index: raw.vout,
            },
            script_sig: hex_to_bytes(&raw.scriptsig)?,
            script_sig_asm: raw.scriptsig_asm,
            witness: raw
                .witness
                .iter()
                .map(|item| hex_to_bytes(item))
                .collect::<Result<Vec<_>>>()?,
            sequence: raw.sequence,
            spent_output,
            inner_redeem_script_asm: raw.inner_redeemscript_asm,
            inner_witness_script_asm: raw.inner_witnessscript_asm,
        })
    }
}

impl TryFrom<RawTransaction> for Transaction {
    type Error = ConsensusError;

    fn try_from(raw: RawTransaction) -> Result<Self> {
        Ok(Transaction {
            version: raw.version,
            inputs: raw
                .vin
                .into_iter()
                .map(TransactionInput::try_from)
                .collect::<Result<Vec<_>>>()?,
            outputs: raw
                .vout
                .into_iter()
                .map(TransactionOutput::try_from)
                .collect::<Result<Vec<_>>>()?,
            lock_time: raw.locktime,
        })
    }
}

/// Decode one transaction file's contents
pub fn parse_transaction_json(json: &str) -> Result<Transaction> {
    let raw: RawTransaction = serde_json::from_str(json)?;
    Transaction::try_from(raw)
}

pub fn load_transaction_file<P: AsRef<Path>>(path: P) -> Result<Transaction> {
    let json = std::fs::read_to_string(path)?;
    parse_transaction_json(&json)
}

/// Load every `*.json` transaction in `dir`, in file name order
pub fn load_mempool<P: AsRef<Path>>(dir: P) -> Result<Vec<Transaction>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir.as_ref())?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().map_or(false, |ext| ext == "json"))
        .collect();
    paths.sort();

    let mut transactions = Vec::with_capacity(paths.len());
    for path in &paths {
        match load_transaction_file(path) {
            Ok(tx) => transactions.push(tx),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping mempool file"),
        }
    }

    info!(
        dir = %dir.as_ref().display(),
        files = paths.len(),
        loaded = transactions.len(),
        "loaded mempool"
    );
    Ok(transactions)
}
