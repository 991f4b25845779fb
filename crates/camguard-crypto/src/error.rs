//! Error types for key material handling.

use thiserror::Error;

/// Errors from key material construction and lookup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// A key pool needs at least one entry
    #[error("key pool is empty")]
    EmptyPool,

    /// A key pool index must fit in the 32-bit envelope field
    #[error("key pool of {0} entries exceeds the 32-bit index space")]
    PoolTooLarge(usize),

    /// Index does not name a pool entry
    #[error("pool index {index} out of range (pool has {len} entries)")]
    IndexOutOfRange {
        /// Requested index
        index: u32,
        /// Pool size
        len: usize,
    },

    /// Key or pseudonym bytes have the wrong length
    #[error("invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Required length
        expected: usize,
        /// Supplied length
        actual: usize,
    },
}
