//! Block assembly: transaction selection, coinbase and header construction

use crate::codec::hash_to_display_hex;
use crate::coinbase::{build_coinbase_tx, coinbase_template_weight};
use crate::config::MiningConfig;
use crate::constants::*;
use crate::economic::{block_reward, calculate_fee, compare_fee_rate};
use crate::error::{ConsensusError, Result};
use crate::merkle::{txid_root, witness_root};
use crate::pow::{assemble_header, mine, MiningControl, MiningResult, TimeSource};
use crate::segwit::build_commitment_script;
use crate::transaction::{calculate_txid, calculate_weight};
use crate::types::*;
use crate::validation::{full_validate, ValidationContext};
use tracing::{debug, info};

/// A transaction that passed validation, with its fee and weight
#[derive(Debug, Clone)]
struct Candidate {
    tx: Transaction,
    txid: Hash,
    fee: Integer,
    weight: Natural,
}

/// Why selection stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionStop {
    /// Every valid candidate fit
    CandidatesExhausted,
    /// The next candidate would have pushed the block over the weight cap
    WeightExceeded { txid: Hash, weight: Natural },
}

/// Outcome of [`select_transactions`]
#[derive(Debug, Clone)]
pub struct Selection {
    /// Selected transactions, highest fee rate first
    pub transactions: Vec<Transaction>,
    pub total_fees: Integer,
    /// Block weight including header and coinbase
    pub total_weight: Natural,
    /// Candidates dropped by validation
    pub rejected: usize,
    pub stop: SelectionStop,
}

/// SelectTransactions: 𝒯𝒳* → 𝒯𝒳*
///
/// 1. Drop every transaction that fails validation or has a negative fee
/// 2. Stable sort by fee / weight, descending
/// 3. Starting from header + coinbase weight, accept in order until the next
///    transaction would exceed the weight cap
pub fn select_transactions(
    mempool_txs: &[Transaction],
    ctx: &ValidationContext,
    config: &MiningConfig,
) -> Result<Selection> {
    let mut candidates = Vec::with_capacity(mempool_txs.len());
    let mut rejected = 0;

    for tx in mempool_txs {
        let txid = calculate_txid(tx);
        let fee = full_validate(tx, ctx).and_then(|_| calculate_fee(tx));
        match fee {
            Ok(fee) => candidates.push(Candidate {
                tx: tx.clone(),
                txid,
                fee,
                weight: calculate_weight(tx),
            }),
            Err(e) => {
                debug!(txid = %hash_to_display_hex(&txid), reason = %e, "excluding transaction");
                rejected += 1;
            }
        }
    }

    candidates.sort_by(|a, b| compare_fee_rate(b.fee, b.weight, a.fee, a.weight));

    let mut total_weight = HEADER_WEIGHT + coinbase_template_weight(config)?;
    let mut total_fees: Integer = 0;
    let mut transactions = Vec::new();
    let mut stop = SelectionStop::CandidatesExhausted;

    for candidate in candidates {
        if total_weight + candidate.weight > config.max_block_weight {
            stop = SelectionStop::WeightExceeded {
                txid: candidate.txid,
                weight: candidate.weight,
            };
            break;
        }
        total_fees = total_fees.checked_add(candidate.fee).ok_or_else(|| {
            ConsensusError::EconomicValidation("Total fee overflow".to_string())
        })?;
        total_weight += candidate.weight;
        transactions.push(candidate.tx);
    }

    info!(
        candidates = mempool_txs.len(),
        rejected,
        selected = transactions.len(),
        total_weight,
        total_fees,
        "selected transactions"
    );

    Ok(Selection {
        transactions,
        total_fees,
        total_weight,
        rejected,
        stop,
    })
}

/// BlockTemplate: Interface for mining software
///
/// Provides a template for mining software to work with:
/// 1. Block header with the configured target, nonce 0
/// 2. Coinbase transaction paying subsidy + fees
/// 3. Selected transactions
#[derive(Debug, Clone)]
pub struct BlockTemplate {
    pub header: BlockHeader,
    pub coinbase_tx: Transaction,
    pub transactions: Vec<Transaction>,
    pub total_fees: Integer,
    pub total_weight: Natural,
    pub witness_root: Hash,
}

impl BlockTemplate {
    pub fn into_block(self) -> Block {
        let mut transactions = Vec::with_capacity(self.transactions.len() + 1);
        transactions.push(self.coinbase_tx);
        transactions.extend(self.transactions);
        Block {
            header: self.header,
            transactions,
        }
    }
}

/// CreateNewBlock: 𝒯𝒳* → ℬ
///
/// 1. Select transactions
/// 2. Compute the witness root over the selection and its commitment script
/// 3. Build the coinbase paying subsidy + fees
/// 4. Compute the txid root over coinbase and selection
/// 5. Assemble the header
pub fn create_new_block<T: TimeSource>(
    mempool_txs: &[Transaction],
    ctx: &ValidationContext,
    config: &MiningConfig,
    clock: &T,
) -> Result<BlockTemplate> {
    let selection = select_transactions(mempool_txs, ctx, config)?;

    let witness_root = witness_root(&selection.transactions);
    let commitment_script = build_commitment_script(&witness_root)?;
    let reward = block_reward(config.block_height, selection.total_fees)?;
    let coinbase_tx = build_coinbase_tx(commitment_script, reward, config)?;

    let merkle_root = txid_root(&coinbase_tx, &selection.transactions);
    let header = assemble_header(merkle_root, clock.now(), config)?;

    info!(
        reward,
        merkle_root = %hash_to_display_hex(&merkle_root),
        witness_root = %hash_to_display_hex(&witness_root),
        "assembled block template"
    );

    Ok(BlockTemplate {
        header,
        coinbase_tx,
        transactions: selection.transactions,
        total_fees: selection.total_fees,
        total_weight: selection.total_weight,
        witness_root,
    })
}

/// MineBlock: ℬ → ℬ × {found, stopped}
///
/// Search for a nonce satisfying the template's target and return the block
/// with the final header.
pub fn mine_block<T: TimeSource>(
    template: BlockTemplate,
    control: &MiningControl,
    clock: &T,
) -> Result<(Block, MiningResult)> {
    let mut block = template.into_block();
    let result = mine(&mut block.header, control, clock)?;
    Ok((block, result))
}
