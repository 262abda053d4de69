//! Block subsidy and fee arithmetic

use crate::constants::*;
use crate::error::{ConsensusError, Result};
use crate::transaction::is_coinbase;
use crate::types::*;
use std::cmp::Ordering;

/// GetBlockSubsidy: ℕ → ℤ
///
/// Calculate the block subsidy for a given height.
/// Subsidy halves every 210,000 blocks (HALVING_INTERVAL).
///
/// Formula: subsidy = 50 * C * 2^(-⌊h/H⌋)
/// Where:
/// - h = block height
/// - H = HALVING_INTERVAL (210,000)
/// - C = SATOSHIS_PER_BTC (10^8)
pub fn get_block_subsidy(height: Natural) -> Integer {
    let halving_period = height / HALVING_INTERVAL;

    // After 64 halvings, subsidy becomes 0
    if halving_period >= 64 {
        return 0;
    }

    INITIAL_SUBSIDY >> halving_period
}

/// Calculate transaction fee
///
/// Fee = Σ spent output values - Σ output values. Inputs carry the output they
/// spend, so no UTXO lookup is needed.
pub fn calculate_fee(tx: &Transaction) -> Result<Integer> {
    if is_coinbase(tx) {
        return Ok(0);
    }

    let total_input = tx
        .inputs
        .iter()
        .try_fold(0i64, |acc, input| acc.checked_add(input.spent_output.value))
        .ok_or_else(|| ConsensusError::EconomicValidation("Input value overflow".to_string()))?;

    let total_output = tx
        .outputs
        .iter()
        .try_fold(0i64, |acc, output| acc.checked_add(output.value))
        .ok_or_else(|| ConsensusError::EconomicValidation("Output value overflow".to_string()))?;

    let fee = total_input
        .checked_sub(total_output)
        .ok_or_else(|| ConsensusError::EconomicValidation("Fee overflow".to_string()))?;
    if fee < 0 {
        return Err(ConsensusError::EconomicValidation(format!(
            "Negative fee: inputs {} < outputs {}",
            total_input, total_output
        )));
    }

    Ok(fee)
}

/// Coinbase reward: subsidy(height) + Σ fees
pub fn block_reward(height: Natural, total_fees: Integer) -> Result<Integer> {
    get_block_subsidy(height)
        .checked_add(total_fees)
        .ok_or_else(|| ConsensusError::EconomicValidation("Block reward overflow".to_string()))
}

/// Order two fee rates fee_a / weight_a and fee_b / weight_b exactly,
/// by cross-multiplication instead of division.
pub fn compare_fee_rate(fee_a: Integer, weight_a: Natural, fee_b: Integer, weight_b: Natural) -> Ordering {
    let lhs = fee_a as i128 * weight_b as i128;
    let rhs = fee_b as i128 * weight_a as i128;
    lhs.cmp(&rhs)
}
