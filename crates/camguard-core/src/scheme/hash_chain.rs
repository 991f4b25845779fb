//! Key-pool scheme.
//!
//! The sender draws a pseudonym and a MAC key from the shared pool, each
//! uniformly and independently, and sends the key index in clear so the
//! receiver can pick the same key. Pseudonyms repeat across messages; they
//! are not bound to content.

use std::sync::Arc;

use camguard_crypto::{KeyPool, Pseudonym, SymmetricKey, mac_parts, tags_match};
use camguard_proto::{Slot, pack};

use super::{
    EnvelopeScheme, SchemeId, SealedEnvelope, VerificationReport, Verdict, expect_slots,
};
use crate::{
    env::Environment,
    envelope::{HASH_CHAIN_TAG_SIZE, HashChainEnvelope},
    error::SecurityError,
    timestamp::Timestamp32,
};

/// Indices drawn for one outgoing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSelection {
    /// Pool position of the pseudonym
    pub pseudonym_index: u32,
    /// Pool position of the MAC key, transmitted in clear
    pub key_index: u32,
}

/// Hash-chain scheme over a shared, read-only pool.
#[derive(Debug, Clone)]
pub struct HashChainScheme {
    pool: Arc<KeyPool>,
}

impl HashChainScheme {
    /// Scheme over `pool`.
    pub fn new(pool: Arc<KeyPool>) -> Self {
        Self { pool }
    }

    /// The key pool.
    pub fn pool(&self) -> &KeyPool {
        &self.pool
    }

    /// Draw both indices uniformly and independently.
    pub fn select<E: Environment>(&self, env: &E) -> PoolSelection {
        let len = self.pool.len() as u32;
        PoolSelection { pseudonym_index: env.random_index(len), key_index: env.random_index(len) }
    }

    /// Seal with explicit pool indices.
    ///
    /// # Errors
    ///
    /// `SecurityError::KeyMaterial` if an index is outside the pool.
    pub fn seal_with(
        &self,
        selection: PoolSelection,
        payload: &[u8],
        timestamp: Timestamp32,
    ) -> Result<SealedEnvelope, SecurityError> {
        let pseudonym = *self.pool.pseudonym(selection.pseudonym_index)?;
        let key = self.pool.key(selection.key_index)?;

        let envelope = HashChainEnvelope {
            pseudonym,
            tag: compute_tag(key, &pseudonym, payload, timestamp),
            key_index: selection.key_index,
            timestamp,
        };

        Ok(SealedEnvelope {
            scheme: SchemeId::HashChain,
            pseudonym,
            timestamp,
            slots: pack(&envelope.to_bytes())?,
        })
    }
}

impl EnvelopeScheme for HashChainScheme {
    const ID: SchemeId = SchemeId::HashChain;
    const SLOT_COUNT: usize = HashChainEnvelope::SLOT_COUNT;

    fn seal<E: Environment>(
        &self,
        payload: &[u8],
        timestamp: Timestamp32,
        env: &E,
    ) -> Result<SealedEnvelope, SecurityError> {
        self.seal_with(self.select(env), payload, timestamp)
    }

    fn open(
        &self,
        slots: &[Slot],
        payload: &[u8],
        local: Timestamp32,
    ) -> Result<VerificationReport, SecurityError> {
        let envelope = HashChainEnvelope::from_bytes(&expect_slots(slots, Self::SLOT_COUNT)?)?;

        // The transmitted index selects the key, whatever the pseudonym's position
        let key = self.pool.key(envelope.key_index).map_err(|_| SecurityError::UnknownKeyIndex {
            index: envelope.key_index,
            pool_len: self.pool.len(),
        })?;

        let expected = compute_tag(key, &envelope.pseudonym, payload, envelope.timestamp);
        let verdict = if tags_match(&expected, &envelope.tag) {
            Verdict::Verified
        } else {
            Verdict::Unverified
        };

        Ok(VerificationReport {
            scheme: Self::ID,
            pseudonym: envelope.pseudonym,
            timestamp: envelope.timestamp,
            freshness: envelope.timestamp.freshness(local),
            verdict,
        })
    }
}

/// Last 12 bytes of `HMAC(key, pseudonym || payload || timestamp_be)`.
fn compute_tag(
    key: &SymmetricKey,
    pseudonym: &Pseudonym,
    payload: &[u8],
    timestamp: Timestamp32,
) -> [u8; HASH_CHAIN_TAG_SIZE] {
    let digest = mac_parts(key, &[pseudonym.as_bytes(), payload, &timestamp.to_be_bytes()]);

    let mut tag = [0u8; HASH_CHAIN_TAG_SIZE];
    tag.copy_from_slice(&digest[digest.len() - HASH_CHAIN_TAG_SIZE..]);
    tag
}

#[cfg(test)]
mod tests {
    use camguard_crypto::PoolEntry;

    use super::*;
    use crate::testing::FixedEnv;

    fn scheme(size: u8) -> HashChainScheme {
        let entries = (0..size)
            .map(|i| PoolEntry {
                pseudonym: Pseudonym::new([i; 20]),
                key: SymmetricKey::new([0x80 | i; 32]),
            })
            .collect();
        HashChainScheme::new(Arc::new(KeyPool::new(entries).unwrap()))
    }

    #[test]
    fn sealed_envelope_carries_selected_pseudonym() {
        let scheme = scheme(5);
        let selection = PoolSelection { pseudonym_index: 3, key_index: 1 };

        let sealed = scheme.seal_with(selection, b"payload", Timestamp32::new(100)).unwrap();

        assert_eq!(sealed.slots.len(), 10);
        assert_eq!(sealed.pseudonym, Pseudonym::new([3; 20]));
        assert_eq!(&sealed.to_bytes()[32..36], &[0, 0, 0, 1]);
    }

    #[test]
    fn open_accepts_own_envelope() {
        let scheme = scheme(5);
        let selection = PoolSelection { pseudonym_index: 0, key_index: 4 };
        let sealed = scheme.seal_with(selection, b"payload", Timestamp32::new(100)).unwrap();

        let report = scheme.open(&sealed.slots, b"payload", Timestamp32::new(100)).unwrap();

        assert!(report.is_verified());
        assert!(report.freshness.is_fresh());
    }

    #[test]
    fn out_of_pool_selection_fails_to_seal() {
        let selection = PoolSelection { pseudonym_index: 0, key_index: 5 };
        assert!(matches!(
            scheme(5).seal_with(selection, b"", Timestamp32::new(0)),
            Err(SecurityError::KeyMaterial(_))
        ));
    }

    #[test]
    fn unknown_key_index_cannot_be_verified() {
        let sender = scheme(5);
        let receiver = scheme(2);
        let selection = PoolSelection { pseudonym_index: 0, key_index: 4 };
        let sealed = sender.seal_with(selection, b"payload", Timestamp32::new(0)).unwrap();

        let err = receiver.open(&sealed.slots, b"payload", Timestamp32::new(0)).unwrap_err();

        assert_eq!(err, SecurityError::UnknownKeyIndex { index: 4, pool_len: 2 });
        assert!(err.is_malformed());
    }

    #[test]
    fn wrong_slot_count_is_malformed() {
        let sealed = scheme(1)
            .seal_with(PoolSelection { pseudonym_index: 0, key_index: 0 }, b"", Timestamp32::new(0))
            .unwrap();

        let err = scheme(1).open(&sealed.slots[..9], b"", Timestamp32::new(0)).unwrap_err();
        assert_eq!(err, SecurityError::MalformedEnvelope { expected: 10, actual: 9 });
    }

    #[test]
    fn single_entry_pool_always_selects_zero() {
        let env = FixedEnv::new(0).with_random_word(u64::MAX);
        assert_eq!(scheme(1).select(&env), PoolSelection { pseudonym_index: 0, key_index: 0 });
    }

    #[test]
    fn selection_follows_rng() {
        // 7 % 5 for both draws
        let env = FixedEnv::new(0).with_random_word(7);
        assert_eq!(scheme(5).select(&env), PoolSelection { pseudonym_index: 2, key_index: 2 });
    }
}
