//! Known-answer envelopes over the reference key material.
//!
//! Payload `CAM-TEST` at 1 700 000 000 s. The hash-chain envelope uses
//! pseudonym 2 and key 4 of the reference pool.

use camguard_core::{
    EnvelopeScheme, HashChainEnvelope, HashChainScheme, PoolSelection, RegionalEnvelope,
    RegionalScheme, Scheme, SchemeId, Timestamp32, Verdict,
};
use camguard_harness::reference_keys;
use camguard_proto::Slot;

const PAYLOAD: &[u8] = b"CAM-TEST";
const NOW: Timestamp32 = Timestamp32::new(1_700_000_000);
const SELECTION: PoolSelection = PoolSelection { pseudonym_index: 2, key_index: 4 };

fn hash_chain() -> HashChainScheme {
    let Scheme::HashChain(scheme) = reference_keys().unwrap().scheme(SchemeId::HashChain).unwrap()
    else {
        unreachable!()
    };
    scheme
}

fn regional() -> RegionalScheme {
    let Scheme::Regional(scheme) = reference_keys().unwrap().scheme(SchemeId::Regional).unwrap()
    else {
        unreachable!()
    };
    scheme
}

fn pairs(slots: &[Slot]) -> String {
    format!("{:?}", slots.iter().map(|s| (s.a, s.b)).collect::<Vec<_>>())
}

#[test]
fn hash_chain_envelope() {
    let sealed = hash_chain().seal_with(SELECTION, PAYLOAD, NOW).unwrap();
    let envelope = HashChainEnvelope::from_bytes(&sealed.to_bytes()).unwrap();

    insta::assert_snapshot!(hex::encode(envelope.tag), @"a81553f157fa00c82773f6fa");
    insta::assert_snapshot!(
        hex::encode(sealed.to_bytes()),
        @"8f0f90472a5ae5222c6aaaa44875ad7262ffda54a81553f157fa00c82773f6fa000000046553f100"
    );
    assert_eq!(envelope.key_index, 4);
    assert_eq!(envelope.timestamp, NOW);
}

#[test]
fn hash_chain_slots() {
    let sealed = hash_chain().seal_with(SELECTION, PAYLOAD, NOW).unwrap();

    assert_eq!(sealed.slots.len(), HashChainEnvelope::SLOT_COUNT);
    insta::assert_snapshot!(
        pairs(&sealed.slots),
        @"[(-28913, -28601), (10842, -6878), (11370, -21852), (18549, -21134), (25343, -9644), (-22507, 21489), (22522, 200), (10099, -2310), (0, 4), (25939, -3840)]"
    );
}

#[test]
fn regional_envelope() {
    let sealed = regional().seal_at(PAYLOAD, NOW).unwrap();
    let envelope = RegionalEnvelope::from_bytes(&sealed.to_bytes()).unwrap();

    insta::assert_snapshot!(
        hex::encode(envelope.pseudonym.as_bytes()),
        @"a4aafef6ba89ea7aa25aa59d6440546574a51536"
    );
    insta::assert_snapshot!(
        hex::encode(sealed.to_bytes()),
        @"6553f10069d261ee314072749ab8c5389409ec0cd3560e7fa4aafef6ba89ea7aa25aa59d6440546574a51536"
    );
    assert_eq!(sealed.slots.len(), RegionalEnvelope::SLOT_COUNT);
}

#[test]
fn reference_envelopes_verify() {
    let hash_chain = hash_chain();
    let sealed = hash_chain.seal_with(SELECTION, PAYLOAD, NOW).unwrap();
    let report = hash_chain.open(&sealed.slots, PAYLOAD, NOW).unwrap();
    assert_eq!(report.verdict, Verdict::Verified);

    let regional = regional();
    let sealed = regional.seal_at(PAYLOAD, NOW).unwrap();
    let report = regional.open(&sealed.slots, PAYLOAD, NOW).unwrap();
    assert_eq!(report.verdict, Verdict::Verified);
}

#[test]
fn wrong_key_index_fails_verification() {
    let hash_chain = hash_chain();
    let sealed = hash_chain.seal_with(SELECTION, PAYLOAD, NOW).unwrap();

    // Rewrite the clear key index from 4 to 3
    let mut bytes = sealed.to_bytes();
    bytes[35] = 3;
    let slots = camguard_proto::pack(&bytes).unwrap();

    let report = hash_chain.open(&slots, PAYLOAD, NOW).unwrap();
    assert_eq!(report.verdict, Verdict::Unverified);
}
