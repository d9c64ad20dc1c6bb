//! Packed per-session received-chunk bitmap
//!
//! Thread-safety is the caller's responsibility (the session store wraps
//! each bitmap behind a lock); this type itself is a plain value.

use crate::{ProtocolError, Result};

/// Packed bit-vector of `ceil(total/8)` bytes tracking which chunk indices
/// have been durably received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeBitmap {
    bits: Vec<u8>,
    total: u32,
    received_count: u32,
}

impl ResumeBitmap {
    /// A fresh, all-unset bitmap sized for `total` chunks.
    pub fn new(total: u32) -> Self {
        let byte_len = (total as usize).div_ceil(8);
        Self { bits: vec![0u8; byte_len], total, received_count: 0 }
    }

    /// Total chunk count this bitmap was sized for.
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Number of chunks marked received.
    pub fn received_count(&self) -> u32 {
        self.received_count
    }

    /// Whether every chunk has been marked received.
    pub fn is_complete(&self) -> bool {
        self.received_count == self.total
    }

    /// Whether `index` is marked received.
    pub fn has(&self, index: u32) -> bool {
        if index >= self.total {
            return false;
        }
        let byte = self.bits[(index / 8) as usize];
        byte & (1 << (index % 8)) != 0
    }

    /// Mark `index` received. Idempotent: setting an already-set bit does
    /// not double-count.
    pub fn set(&mut self, index: u32) -> Result<()> {
        if index >= self.total {
            return Err(ProtocolError::InvalidArgument(format!(
                "chunk index {index} out of range for {} total chunks",
                self.total
            )));
        }
        let byte_index = (index / 8) as usize;
        let mask = 1 << (index % 8);
        if self.bits[byte_index] & mask == 0 {
            self.bits[byte_index] |= mask;
            self.received_count += 1;
        }
        Ok(())
    }

    /// All indices currently marked received, in ascending order.
    pub fn received_indices(&self) -> Vec<u32> {
        (0..self.total).filter(|&i| self.has(i)).collect()
    }

    /// All indices currently unset, in ascending order.
    pub fn missing_indices(&self) -> Vec<u32> {
        (0..self.total).filter(|&i| !self.has(i)).collect()
    }

    /// Serialize to the fixed-size opaque blob stored durably.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bits.clone()
    }

    /// Recompute a bitmap from a durable blob and the session's known chunk
    /// count, recounting `received_count` from the blob contents.
    pub fn from_bytes(bytes: &[u8], total: u32) -> Result<Self> {
        let expected_len = (total as usize).div_ceil(8);
        if bytes.len() != expected_len {
            return Err(ProtocolError::InvalidArgument(format!(
                "bitmap blob of {} bytes does not match expected {expected_len} for {total} chunks",
                bytes.len()
            )));
        }
        let received_count = bytes.iter().map(|b| b.count_ones()).sum();
        Ok(Self { bits: bytes.to_vec(), total, received_count })
    }
}
