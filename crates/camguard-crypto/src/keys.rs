//! Static key material for both schemes.
//!
//! Pools and regional secrets are loaded once and shared read-only across
//! threads. Nothing here is mutable after construction.

use std::fmt;

use zeroize::Zeroize;

use crate::{error::CryptoError, pseudonym::Pseudonym};

/// Size of every symmetric key and static secret.
pub const KEY_SIZE: usize = 32;

/// A 32-byte symmetric key, zeroized on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey {
    bytes: [u8; KEY_SIZE],
}

impl SymmetricKey {
    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Key from a slice of exactly [`KEY_SIZE`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidLength { expected: KEY_SIZE, actual: bytes.len() })?;
        Ok(Self { bytes })
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

/// One pseudonym and one hash-chain key of the pool.
///
/// The pair shares an index by convention only; the sender draws the
/// pseudonym and the key independently.
#[derive(Debug, Clone)]
pub struct PoolEntry {
    /// Pseudonym at this position
    pub pseudonym: Pseudonym,
    /// Hash-chain key at this position
    pub key: SymmetricKey,
}

/// Pool of pseudonyms and hash-chain keys.
///
/// # Invariants
///
/// - Never empty
/// - Fewer than `u32::MAX` entries, so every index fits the envelope field
#[derive(Debug, Clone)]
pub struct KeyPool {
    entries: Vec<PoolEntry>,
}

impl KeyPool {
    /// Build a pool from its entries.
    ///
    /// # Errors
    ///
    /// - `CryptoError::EmptyPool` if `entries` is empty
    /// - `CryptoError::PoolTooLarge` if an index would not fit in 32 bits
    pub fn new(entries: Vec<PoolEntry>) -> Result<Self, CryptoError> {
        if entries.is_empty() {
            return Err(CryptoError::EmptyPool);
        }
        if u32::try_from(entries.len()).is_err() {
            return Err(CryptoError::PoolTooLarge(entries.len()));
        }
        Ok(Self { entries })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; kept for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pseudonym at `index`.
    pub fn pseudonym(&self, index: u32) -> Result<&Pseudonym, CryptoError> {
        self.entry(index).map(|entry| &entry.pseudonym)
    }

    /// Hash-chain key at `index`.
    pub fn key(&self, index: u32) -> Result<&SymmetricKey, CryptoError> {
        self.entry(index).map(|entry| &entry.key)
    }

    fn entry(&self, index: u32) -> Result<&PoolEntry, CryptoError> {
        self.entries
            .get(index as usize)
            .ok_or(CryptoError::IndexOutOfRange { index, len: self.entries.len() })
    }
}

/// Secrets of the regional scheme.
///
/// The regional key authenticates messages. The four remaining secrets are
/// only ever hashed together to derive pseudonyms.
#[derive(Debug, Clone)]
pub struct RegionalSecrets {
    /// Key shared by every station of the region
    pub regional_key: SymmetricKey,
    /// Anonymous pseudo-identity secret, also mixed with the timestamp
    pub api_secret: SymmetricKey,
    /// Vehicle secret key
    pub vehicle_secret: SymmetricKey,
    /// Vehicle identity
    pub vehicle_id: SymmetricKey,
    /// Membership key
    pub membership_key: SymmetricKey,
}

impl RegionalSecrets {
    /// `api || vehicle_secret || vehicle_id || membership_key`.
    pub fn static_component(&self) -> [u8; 4 * KEY_SIZE] {
        let mut out = [0u8; 4 * KEY_SIZE];
        out[..KEY_SIZE].copy_from_slice(self.api_secret.as_bytes());
        out[KEY_SIZE..2 * KEY_SIZE].copy_from_slice(self.vehicle_secret.as_bytes());
        out[2 * KEY_SIZE..3 * KEY_SIZE].copy_from_slice(self.vehicle_id.as_bytes());
        out[3 * KEY_SIZE..].copy_from_slice(self.membership_key.as_bytes());
        out
    }
}
