//! Proof of Work: header assembly, hashing and nonce search

use crate::codec::{hash_to_display_hex, uint256_from_compact, U256};
use crate::config::MiningConfig;
use crate::constants::*;
use crate::crypto::double_sha256;
use crate::error::Result;
use crate::types::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// AssembleHeader: ℍ × ℕ → ℋ
///
/// version and previous hash come from the configuration, bits is the compact
/// form of the configured target, nonce starts at 0.
pub fn assemble_header(merkle_root: Hash, timestamp: u32, config: &MiningConfig) -> Result<BlockHeader> {
    Ok(BlockHeader {
        version: config.block_version,
        prev_block_hash: config.prev_block_hash()?,
        merkle_root,
        timestamp,
        bits: config.bits()?,
        nonce: 0,
    })
}

/// Serialize block header to the 80-byte wire format
pub fn serialize_header(header: &BlockHeader) -> [u8; HEADER_SIZE] {
    let mut bytes = [0u8; HEADER_SIZE];
    bytes[0..4].copy_from_slice(&header.version.to_le_bytes());
    bytes[4..36].copy_from_slice(&header.prev_block_hash);
    bytes[36..68].copy_from_slice(&header.merkle_root);
    bytes[68..72].copy_from_slice(&header.timestamp.to_le_bytes());
    bytes[72..76].copy_from_slice(&header.bits.to_le_bytes());
    bytes[76..80].copy_from_slice(&header.nonce.to_le_bytes());
    bytes
}

/// Block hash (internal byte order)
pub fn calculate_block_hash(header: &BlockHeader) -> Hash {
    double_sha256(&serialize_header(header))
}

fn meets_target(hash: &Hash, target: &U256) -> bool {
    U256::from_le_bytes(hash) <= *target
}

/// CheckProofOfWork: ℋ → {true, false}
///
/// Check if the block header satisfies the proof of work requirement.
/// Formula: SHA256(SHA256(header)) ≤ ExpandTarget(header.bits), with the hash
/// read as a little-endian 256-bit integer.
///
/// This is stricter than comparing `compact(hash) ≤ bits`: compact encoding
/// keeps only a 3-byte mantissa, so a hash just above the target can still
/// compress to `bits`. Such a hash is rejected here.
pub fn check_proof_of_work(header: &BlockHeader) -> Result<bool> {
    let target = uint256_from_compact(header.bits)?;
    Ok(meets_target(&calculate_block_hash(header), &target))
}

/// Nonces from `start` up to and including `u32::MAX`
#[derive(Debug, Clone)]
pub struct NonceRange {
    next: u64,
}

impl NonceRange {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(start: u32) -> Self {
        NonceRange { next: start as u64 }
    }
}

impl Default for NonceRange {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for NonceRange {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.next > u32::MAX as u64 {
            return None;
        }
        let nonce = self.next as u32;
        self.next += 1;
        Some(nonce)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (u32::MAX as u64 + 1).saturating_sub(self.next) as usize;
        (remaining, Some(remaining))
    }
}

/// Source of header timestamps
pub trait TimeSource {
    fn now(&self) -> u32;
}

/// Wall clock in unix seconds
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> u32 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as u32)
            .unwrap_or_default()
    }
}

/// Stop conditions for the nonce search
#[derive(Debug, Clone, Default)]
pub struct MiningControl {
    cancel: Arc<AtomicBool>,
    max_attempts: Option<u64>,
    deadline: Option<Instant>,
}

impl MiningControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Flag that stops the search when set, from any thread
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }
}

/// Result of mining attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MiningResult {
    Found { nonce: u32, hash: Hash, attempts: u64 },
    Cancelled { attempts: u64 },
    AttemptsExhausted { attempts: u64 },
    DeadlineReached { attempts: u64 },
}

impl MiningResult {
    pub fn is_found(&self) -> bool {
        matches!(self, MiningResult::Found { .. })
    }
}

/// Deadline is polled once per this many attempts
const DEADLINE_POLL_INTERVAL: u64 = 1024;

/// Mine: ℋ → ℋ × {found, stopped}
///
/// 1. Try nonces from `header.nonce` upwards
/// 2. Stop when SHA256(SHA256(header)) ≤ target, compared as full 256-bit
///    integers rather than through the compact encoding of the hash
/// 3. When the nonce space is exhausted, restart from 0 and from then on set the
///    timestamp from `clock` before every attempt
/// 4. Stop early on cancellation, the attempt cap or the deadline
///
/// On success `header` holds the winning nonce and timestamp.
pub fn mine<T: TimeSource>(
    header: &mut BlockHeader,
    control: &MiningControl,
    clock: &T,
) -> Result<MiningResult> {
    let target = uint256_from_compact(header.bits)?;
    let mut attempts: u64 = 0;
    let mut nonces = NonceRange::starting_at(header.nonce);
    let mut refresh_timestamp = false;

    loop {
        let nonce = match nonces.next() {
            Some(nonce) => nonce,
            None => {
                debug!(attempts, "nonce space exhausted, refreshing timestamp");
                nonces = NonceRange::new();
                refresh_timestamp = true;
                continue;
            }
        };

        if control.is_cancelled() {
            return Ok(MiningResult::Cancelled { attempts });
        }
        if control.max_attempts.map_or(false, |max| attempts >= max) {
            return Ok(MiningResult::AttemptsExhausted { attempts });
        }
        if attempts % DEADLINE_POLL_INTERVAL == 0
            && control.deadline.map_or(false, |deadline| Instant::now() >= deadline)
        {
            return Ok(MiningResult::DeadlineReached { attempts });
        }

        if refresh_timestamp {
            header.timestamp = clock.now();
        }
        header.nonce = nonce;
        attempts += 1;

        let hash = calculate_block_hash(header);
        if meets_target(&hash, &target) {
            info!(
                nonce,
                attempts,
                hash = %hash_to_display_hex(&hash),
                "found proof of work"
            );
            return Ok(MiningResult::Found { nonce, hash, attempts });
        }
    }
}
