//! Fixed byte layouts of the two security envelopes.
//!
//! ```text
//! hash chain (40 bytes, 10 slots)
//! +----------------+-----------+---------------+--------------+
//! | pseudonym (20) | tag (12)  | key index (4) | timestamp(4) |
//! +----------------+-----------+---------------+--------------+
//!
//! regional (44 bytes, 11 slots)
//! +--------------+-----------+----------------+
//! | timestamp(4) | tag (20)  | pseudonym (20) |
//! +--------------+-----------+----------------+
//! ```
//!
//! Integers are big-endian. Both lengths are multiples of the slot width, so
//! the envelopes travel through the slot codec without padding.

use camguard_crypto::{PSEUDONYM_SIZE, Pseudonym};
use camguard_proto::SLOT_BYTES;

use crate::{error::SecurityError, timestamp::Timestamp32};

/// Tag length of the hash-chain scheme.
pub const HASH_CHAIN_TAG_SIZE: usize = 12;

/// Tag length of the regional scheme.
pub const REGIONAL_TAG_SIZE: usize = 20;

/// Hash-chain envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashChainEnvelope {
    /// Pseudonym drawn from the pool
    pub pseudonym: Pseudonym,
    /// Last 12 bytes of the HMAC
    pub tag: [u8; HASH_CHAIN_TAG_SIZE],
    /// Pool index of the MAC key, in clear
    pub key_index: u32,
    /// Sender wall clock
    pub timestamp: Timestamp32,
}

impl HashChainEnvelope {
    /// Encoded size.
    pub const SIZE: usize = PSEUDONYM_SIZE + HASH_CHAIN_TAG_SIZE + 4 + 4;

    /// Slots needed to carry the envelope.
    pub const SLOT_COUNT: usize = Self::SIZE / SLOT_BYTES;

    /// Serialize in wire order.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..20].copy_from_slice(self.pseudonym.as_bytes());
        out[20..32].copy_from_slice(&self.tag);
        out[32..36].copy_from_slice(&self.key_index.to_be_bytes());
        out[36..40].copy_from_slice(&self.timestamp.to_be_bytes());
        out
    }

    /// Parse from exactly [`Self::SIZE`] bytes.
    ///
    /// # Errors
    ///
    /// `SecurityError::MalformedEnvelope` (in slots) on a length mismatch.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SecurityError> {
        let bytes: &[u8; Self::SIZE] = bytes.try_into().map_err(|_| {
            SecurityError::MalformedEnvelope {
                expected: Self::SLOT_COUNT,
                actual: bytes.len() / SLOT_BYTES,
            }
        })?;

        let mut pseudonym = [0u8; PSEUDONYM_SIZE];
        let mut tag = [0u8; HASH_CHAIN_TAG_SIZE];
        let mut key_index = [0u8; 4];
        let mut timestamp = [0u8; 4];
        pseudonym.copy_from_slice(&bytes[..20]);
        tag.copy_from_slice(&bytes[20..32]);
        key_index.copy_from_slice(&bytes[32..36]);
        timestamp.copy_from_slice(&bytes[36..40]);

        Ok(Self {
            pseudonym: Pseudonym::new(pseudonym),
            tag,
            key_index: u32::from_be_bytes(key_index),
            timestamp: Timestamp32::from_be_bytes(timestamp),
        })
    }
}

/// Regional envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionalEnvelope {
    /// Sender wall clock
    pub timestamp: Timestamp32,
    /// Last 20 bytes of the digest
    pub tag: [u8; REGIONAL_TAG_SIZE],
    /// Pseudonym derived from the static secrets and the timestamp
    pub pseudonym: Pseudonym,
}

impl RegionalEnvelope {
    /// Encoded size.
    pub const SIZE: usize = 4 + REGIONAL_TAG_SIZE + PSEUDONYM_SIZE;

    /// Slots needed to carry the envelope.
    pub const SLOT_COUNT: usize = Self::SIZE / SLOT_BYTES;

    /// Serialize in wire order.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..4].copy_from_slice(&self.timestamp.to_be_bytes());
        out[4..24].copy_from_slice(&self.tag);
        out[24..44].copy_from_slice(self.pseudonym.as_bytes());
        out
    }

    /// Parse from exactly [`Self::SIZE`] bytes.
    ///
    /// # Errors
    ///
    /// `SecurityError::MalformedEnvelope` (in slots) on a length mismatch.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SecurityError> {
        let bytes: &[u8; Self::SIZE] = bytes.try_into().map_err(|_| {
            SecurityError::MalformedEnvelope {
                expected: Self::SLOT_COUNT,
                actual: bytes.len() / SLOT_BYTES,
            }
        })?;

        let mut timestamp = [0u8; 4];
        let mut tag = [0u8; REGIONAL_TAG_SIZE];
        let mut pseudonym = [0u8; PSEUDONYM_SIZE];
        timestamp.copy_from_slice(&bytes[..4]);
        tag.copy_from_slice(&bytes[4..24]);
        pseudonym.copy_from_slice(&bytes[24..44]);

        Ok(Self {
            timestamp: Timestamp32::from_be_bytes(timestamp),
            tag,
            pseudonym: Pseudonym::new(pseudonym),
        })
    }
}
