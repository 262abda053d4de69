//! Byte-level encodings shared by every component
//!
//! Bitcoin displays hashes big-endian but serializes and signs them little-endian,
//! so byte reversal shows up everywhere. Hex decoding never panics: malformed input
//! surfaces as [`ConsensusError::Decode`].

use crate::error::{ConsensusError, Result};
use crate::types::Hash;
use std::cmp::Ordering;

/// Reverse byte order
pub fn reverse_bytes(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().rev().copied().collect()
}

/// Decode a hex string (odd length or non-hex characters are rejected)
pub fn hex_to_bytes(s: &str) -> Result<Vec<u8>> {
    Ok(hex::decode(s)?)
}

/// Encode bytes as lowercase hex
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode a 32-byte hash given in display (big-endian) order into internal order
pub fn hex_to_hash_display(s: &str) -> Result<Hash> {
    let bytes = hex_to_bytes(s)?;
    if bytes.len() != 32 {
        return Err(ConsensusError::Decode(format!(
            "expected 32-byte hash, got {} bytes",
            bytes.len()
        )));
    }
    let mut hash = [0u8; 32];
    for (dst, src) in hash.iter_mut().zip(bytes.iter().rev()) {
        *dst = *src;
    }
    Ok(hash)
}

/// Render an internal-order hash in display (big-endian) order
pub fn hash_to_display_hex(hash: &Hash) -> String {
    bytes_to_hex(&reverse_bytes(hash))
}

/// Encode a number as a Bitcoin compact-size integer
pub fn encode_varint(value: u64) -> Vec<u8> {
    if value < 0xfd {
        vec![value as u8]
    } else if value <= 0xffff {
        let mut result = vec![0xfd];
        result.extend_from_slice(&(value as u16).to_le_bytes());
        result
    } else if value <= 0xffffffff {
        let mut result = vec![0xfe];
        result.extend_from_slice(&(value as u32).to_le_bytes());
        result
    } else {
        let mut result = vec![0xff];
        result.extend_from_slice(&value.to_le_bytes());
        result
    }
}

/// Write a compact-size length prefix followed by the bytes
pub fn write_var_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&encode_varint(bytes.len() as u64));
    out.extend_from_slice(bytes);
}

/// 256-bit unsigned integer for target and hash comparisons
///
/// Stored as four little-endian 64-bit words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct U256([u64; 4]);

impl U256 {
    pub fn zero() -> Self {
        U256([0; 4])
    }

    pub fn from_u64(value: u64) -> Self {
        U256([value, 0, 0, 0])
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&x| x == 0)
    }

    pub fn low_u64(&self) -> u64 {
        self.0[0]
    }

    pub fn shl(&self, shift: u32) -> Self {
        if shift >= 256 {
            return U256::zero();
        }

        let mut result = U256::zero();
        let word_shift = (shift / 64) as usize;
        let bit_shift = shift % 64;

        for i in 0..4 {
            if i + word_shift < 4 {
                result.0[i + word_shift] |= self.0[i] << bit_shift;
                if bit_shift > 0 && i + word_shift + 1 < 4 {
                    result.0[i + word_shift + 1] |= self.0[i] >> (64 - bit_shift);
                }
            }
        }

        result
    }

    pub fn shr(&self, shift: u32) -> Self {
        if shift >= 256 {
            return U256::zero();
        }

        let mut result = U256::zero();
        let word_shift = (shift / 64) as usize;
        let bit_shift = shift % 64;

        for i in word_shift..4 {
            result.0[i - word_shift] |= self.0[i] >> bit_shift;
            if bit_shift > 0 && i > word_shift {
                result.0[i - word_shift - 1] |= self.0[i] << (64 - bit_shift);
            }
        }

        result
    }

    /// Interpret 32 bytes as a little-endian integer (internal hash order)
    pub fn from_le_bytes(bytes: &[u8; 32]) -> Self {
        let mut words = [0u64; 4];
        for (i, word) in words.iter_mut().enumerate() {
            let mut chunk = [0u8; 8];
            chunk.copy_from_slice(&bytes[i * 8..(i + 1) * 8]);
            *word = u64::from_le_bytes(chunk);
        }
        U256(words)
    }

    /// Interpret 32 bytes as a big-endian integer (display order)
    pub fn from_be_bytes(bytes: &[u8; 32]) -> Self {
        let mut le = *bytes;
        le.reverse();
        Self::from_le_bytes(&le)
    }

    pub fn to_le_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for (i, &word) in self.0.iter().enumerate() {
            bytes[i * 8..(i + 1) * 8].copy_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut bytes = self.to_le_bytes();
        bytes.reverse();
        bytes
    }

    /// Length of the minimal big-endian representation
    pub fn byte_len(&self) -> u32 {
        let be = self.to_be_bytes();
        match be.iter().position(|&b| b != 0) {
            Some(first) => (32 - first) as u32,
            None => 0,
        }
    }
}

impl PartialOrd for U256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for U256 {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.0.iter().rev().zip(other.0.iter().rev()) {
            match a.cmp(b) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }
}

/// CompactFromUint256: ℕ₂₅₆ → ℕ₃₂
///
/// Encode a 256-bit value in the "bits" form: 1-byte exponent (the minimal
/// big-endian byte length) and 3-byte mantissa (the top three bytes).
/// If the mantissa's 0x00800000 bit is set it would read as negative, so the
/// mantissa is shifted right one byte and the exponent incremented.
pub fn compact_target_from_uint256(value: &U256) -> u32 {
    let mut size = value.byte_len();
    let mut compact = if size <= 3 {
        (value.low_u64() << (8 * (3 - size))) as u32
    } else {
        value.shr(8 * (size - 3)).low_u64() as u32
    };

    if compact & 0x0080_0000 != 0 {
        compact >>= 8;
        size += 1;
    }

    compact | (size << 24)
}

/// Uint256FromCompact: ℕ₃₂ → ℕ₂₅₆
///
/// Inverse of [`compact_target_from_uint256`]. Negative or overflowing encodings
/// are rejected.
pub fn uint256_from_compact(bits: u32) -> Result<U256> {
    let size = bits >> 24;
    let word = bits & 0x007f_ffff;

    if word != 0 && bits & 0x0080_0000 != 0 {
        return Err(ConsensusError::Decode(format!(
            "negative compact target {:#010x}",
            bits
        )));
    }

    if word != 0 && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32)) {
        return Err(ConsensusError::Decode(format!(
            "compact target {:#010x} overflows 256 bits",
            bits
        )));
    }

    if size <= 3 {
        Ok(U256::from_u64((word >> (8 * (3 - size))) as u64))
    } else {
        Ok(U256::from_u64(word as u64).shl(8 * (size - 3)))
    }
}
