//! Consensus and block-template constants

/// Satoshis per BTC
pub const SATOSHIS_PER_BTC: i64 = 100_000_000;

/// Maximum money supply: 21,000,000 BTC
pub const MAX_MONEY: i64 = 21_000_000 * SATOSHIS_PER_BTC;

/// Initial block subsidy: 50 BTC
pub const INITIAL_SUBSIDY: i64 = 50 * SATOSHIS_PER_BTC;

/// Halving interval: 210,000 blocks
pub const HALVING_INTERVAL: u64 = 210_000;

/// Maximum block weight in weight units (BIP141)
pub const MAX_BLOCK_WEIGHT: u64 = 4_000_000;

/// Weight of the 80-byte block header (80 × 4)
pub const HEADER_WEIGHT: u64 = 320;

/// Serialized block header size
pub const HEADER_SIZE: usize = 80;

/// Witness scale factor: base bytes count three extra times
pub const WITNESS_SCALE_FACTOR: u64 = 4;

/// SIGHASH_ALL
pub const SIGHASH_ALL: u32 = 0x01;

/// Lock time threshold: transactions with lock time < this are block height
pub const LOCKTIME_THRESHOLD: u32 = 500_000_000;

/// Sequence number for final transaction
pub const SEQUENCE_FINAL: u32 = 0xffffffff;

/// Largest sequence value that still encodes a relative lock time
pub const SEQUENCE_RELATIVE_LOCK_MAX: u32 = 0xefffffff;

/// Prevout index used by the coinbase input
pub const COINBASE_PREVOUT_INDEX: u32 = 0xffffffff;

/// Witness commitment header (BIP141)
pub const WITNESS_COMMITMENT_HEADER: [u8; 4] = [0xaa, 0x21, 0xa9, 0xed];

/// Witness reserved value committed by the coinbase
pub const WITNESS_RESERVED_VALUE: [u8; 32] = [0u8; 32];

/// Version of the generated coinbase transaction
pub const COINBASE_TX_VERSION: i32 = 1;

/// Block version used for assembled headers
pub const BLOCK_VERSION: i32 = 4;

/// Default block height pushed into the coinbase script
pub const DEFAULT_BLOCK_HEIGHT: u64 = 838_770;

/// Default previous block hash (display order)
pub const DEFAULT_PREVIOUS_BLOCK_HASH: &str =
    "00000000000000000000a9c619c4af8c09f10c11a8262bcde576450e45a126ca";

/// Default proof-of-work target (big-endian)
pub const DEFAULT_TARGET: &str =
    "0000ffff00000000000000000000000000000000000000000000000000000000";

/// Default payout script: P2PKH to 17qdB4VXej7U4MWXF6HqoALVThA5Dsqy12
pub const DEFAULT_PAYOUT_SCRIPT: &str = "76a9144b02eabcefed9565eebeed205f88b2f2881b124388ac";

/// Default payout address (display only)
pub const DEFAULT_PAYOUT_ADDRESS: &str = "17qdB4VXej7U4MWXF6HqoALVThA5Dsqy12";
