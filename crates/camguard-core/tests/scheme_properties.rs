//! Property tests for both envelope schemes.

use std::sync::Arc;

use camguard_core::{
    AcceptancePolicy, Disposition, HashChainScheme, RegionalScheme, Scheme, SchemeId,
    SecurityError, Timestamp32, Verdict,
};
use camguard_crypto::{KeyPool, PoolEntry, Pseudonym, SymmetricKey};
use camguard_harness::{SimEnv, reference_keys};
use camguard_proto::Slot;
use proptest::prelude::*;

fn scheme(id: SchemeId) -> Scheme {
    reference_keys().unwrap().scheme(id).unwrap()
}

fn any_scheme() -> impl Strategy<Value = Scheme> {
    prop_oneof![Just(SchemeId::HashChain), Just(SchemeId::Regional)].prop_map(scheme)
}

fn flip_bit(slots: &[Slot], byte: usize, bit: u8) -> Vec<Slot> {
    let mut bytes = camguard_proto::unpack(slots);
    bytes[byte] ^= 1 << bit;
    camguard_proto::pack(&bytes).unwrap()
}

proptest! {
    #[test]
    fn prop_sealed_envelopes_verify(
        scheme in any_scheme(),
        payload in prop::collection::vec(any::<u8>(), 0..256),
        secs in any::<i32>(),
        seed in any::<u64>(),
    ) {
        let env = SimEnv::with_seed(seed);
        let now = Timestamp32::new(secs);

        let sealed = scheme.seal(&payload, now, &env)?;
        prop_assert_eq!(sealed.slots.len(), scheme.slot_count());

        let report = scheme.verify(&sealed.slots, &payload, now)?;
        prop_assert_eq!(report.verdict, Verdict::Verified);
        prop_assert!(report.freshness.is_fresh());
        prop_assert_eq!(report.pseudonym, sealed.pseudonym);
    }

    #[test]
    fn prop_tampered_payload_is_unverified(
        scheme in any_scheme(),
        payload in prop::collection::vec(any::<u8>(), 1..128),
        index in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let env = SimEnv::new();
        let now = Timestamp32::new(1_700_000_000);
        let sealed = scheme.seal(&payload, now, &env)?;

        let mut tampered = payload.clone();
        tampered[index.index(payload.len())] ^= 1 << bit;

        let report = scheme.verify(&sealed.slots, &tampered, now)?;
        prop_assert_eq!(report.verdict, Verdict::Unverified);
    }

    /// Flipping any tag or pseudonym bit breaks the tag.
    ///
    /// Hash chain: pseudonym 0..20, tag 20..32. Regional: tag 4..24,
    /// pseudonym 24..44.
    #[test]
    fn prop_tampered_envelope_is_unverified(
        scheme in any_scheme(),
        offset in 0usize..32,
        bit in 0u8..8,
    ) {
        let env = SimEnv::new();
        let now = Timestamp32::new(1_700_000_000);
        let sealed = scheme.seal(b"payload", now, &env)?;

        let byte = match scheme.id() {
            SchemeId::Regional => 4 + offset % 40,
            _ => offset,
        };
        let slots = flip_bit(&sealed.slots, byte, bit);

        let report = scheme.verify(&slots, b"payload", now)?;
        prop_assert_eq!(report.verdict, Verdict::Unverified);
    }

    #[test]
    fn prop_freshness_window(scheme in any_scheme(), skew in -5i32..=5) {
        let env = SimEnv::new();
        let sent = Timestamp32::new(1_700_000_000);
        let local = Timestamp32::new(1_700_000_000 + skew);
        let sealed = scheme.seal(b"cam", sent, &env)?;

        let report = scheme.verify(&sealed.slots, b"cam", local)?;
        prop_assert_eq!(report.verdict, Verdict::Verified);
        prop_assert_eq!(report.freshness.is_fresh(), skew.abs() <= 1);

        // Stale is delivered unless the policy says otherwise
        prop_assert_eq!(AcceptancePolicy::default().decide(&report, local), Disposition::Deliver);
        let strict = AcceptancePolicy { reject_stale: true, reject_unverified: false };
        let expected = if skew.abs() <= 1 {
            Disposition::Deliver
        } else {
            Disposition::Reject(SecurityError::StaleTimestamp {
                received: sent.secs(),
                local: local.secs(),
            })
        };
        prop_assert_eq!(strict.decide(&report, local), expected);
    }

    #[test]
    fn prop_regional_is_deterministic(
        payload in prop::collection::vec(any::<u8>(), 0..64),
        secs in any::<i32>(),
    ) {
        let scheme = scheme(SchemeId::Regional);
        let now = Timestamp32::new(secs);

        let a = scheme.seal(&payload, now, &SimEnv::with_seed(1))?;
        let b = scheme.seal(&payload, now, &SimEnv::with_seed(2))?;
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_wrong_slot_count_is_malformed(scheme in any_scheme(), count in 0usize..16) {
        prop_assume!(count != scheme.slot_count());
        let slots = vec![Slot::default(); count];

        let err = scheme.verify(&slots, b"cam", Timestamp32::new(0)).unwrap_err();
        prop_assert_eq!(
            err,
            SecurityError::MalformedEnvelope { expected: scheme.slot_count(), actual: count }
        );
    }
}

#[test]
fn other_pool_does_not_verify() {
    let entries = (0..5u8)
        .map(|i| PoolEntry {
            pseudonym: Pseudonym::new([i; 20]),
            key: SymmetricKey::new([0x70 + i; 32]),
        })
        .collect();
    let other = Scheme::HashChain(HashChainScheme::new(Arc::new(KeyPool::new(entries).unwrap())));
    let reference = scheme(SchemeId::HashChain);
    let now = Timestamp32::new(1_700_000_000);

    let sealed = other.seal(b"cam", now, &SimEnv::new()).unwrap();
    let report = reference.verify(&sealed.slots, b"cam", now).unwrap();
    assert_eq!(report.verdict, Verdict::Unverified);
}

#[test]
fn other_regional_key_does_not_verify() {
    let keys = reference_keys().unwrap();
    let mut secrets = (*keys.regional.unwrap()).clone();
    let reference = Scheme::Regional(RegionalScheme::new(Arc::new(secrets.clone())));
    secrets.regional_key = SymmetricKey::new([0x55; 32]);
    let other = Scheme::Regional(RegionalScheme::new(Arc::new(secrets)));
    let now = Timestamp32::new(1_700_000_000);

    let sealed = other.seal(b"cam", now, &SimEnv::new()).unwrap();
    let report = reference.verify(&sealed.slots, b"cam", now).unwrap();

    // Same pseudonym secrets, different regional key
    assert_eq!(report.pseudonym, sealed.pseudonym);
    assert_eq!(report.verdict, Verdict::Unverified);
}

#[test]
fn unknown_key_index_cannot_be_checked() {
    let scheme = scheme(SchemeId::HashChain);
    let now = Timestamp32::new(1_700_000_000);
    let sealed = scheme.seal(b"cam", now, &SimEnv::new()).unwrap();

    let mut bytes = camguard_proto::unpack(&sealed.slots);
    bytes[32..36].copy_from_slice(&9u32.to_be_bytes());
    let slots = camguard_proto::pack(&bytes).unwrap();

    let err = scheme.verify(&slots, b"cam", now).unwrap_err();
    assert_eq!(err, SecurityError::UnknownKeyIndex { index: 9, pool_len: 5 });
    assert!(err.is_malformed());
}
