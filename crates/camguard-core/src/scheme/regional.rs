//! Regional-key scheme.
//!
//! No randomness: the pseudonym is derived from static secrets and the
//! timestamp, and the tag is a plain digest that includes the regional key.
//! Two seals with the same secrets and timestamp are identical.

use std::sync::Arc;

use camguard_crypto::{Pseudonym, RegionalSecrets, derive_pseudonym, hash_parts, tags_match};
use camguard_proto::{Slot, pack};

use super::{
    EnvelopeScheme, SchemeId, SealedEnvelope, VerificationReport, Verdict, expect_slots,
};
use crate::{
    env::Environment,
    envelope::{REGIONAL_TAG_SIZE, RegionalEnvelope},
    error::SecurityError,
    timestamp::Timestamp32,
};

/// Regional scheme over shared, read-only secrets.
#[derive(Debug, Clone)]
pub struct RegionalScheme {
    secrets: Arc<RegionalSecrets>,
}

impl RegionalScheme {
    /// Scheme over `secrets`.
    pub fn new(secrets: Arc<RegionalSecrets>) -> Self {
        Self { secrets }
    }

    /// Seal without an environment; the scheme draws no randomness.
    pub fn seal_at(
        &self,
        payload: &[u8],
        timestamp: Timestamp32,
    ) -> Result<SealedEnvelope, SecurityError> {
        let pseudonym = derive_pseudonym(&self.secrets, timestamp.secs());
        let envelope = RegionalEnvelope {
            timestamp,
            tag: self.compute_tag(&pseudonym, payload, timestamp),
            pseudonym,
        };

        Ok(SealedEnvelope {
            scheme: SchemeId::Regional,
            pseudonym,
            timestamp,
            slots: pack(&envelope.to_bytes())?,
        })
    }

    /// Last 20 bytes of `SHA-256(pseudonym || regional_key || payload || timestamp_be)`.
    fn compute_tag(
        &self,
        pseudonym: &Pseudonym,
        payload: &[u8],
        timestamp: Timestamp32,
    ) -> [u8; REGIONAL_TAG_SIZE] {
        let digest = hash_parts(&[
            pseudonym.as_bytes(),
            self.secrets.regional_key.as_bytes(),
            payload,
            &timestamp.to_be_bytes(),
        ]);

        let mut tag = [0u8; REGIONAL_TAG_SIZE];
        tag.copy_from_slice(&digest[digest.len() - REGIONAL_TAG_SIZE..]);
        tag
    }
}

impl EnvelopeScheme for RegionalScheme {
    const ID: SchemeId = SchemeId::Regional;
    const SLOT_COUNT: usize = RegionalEnvelope::SLOT_COUNT;

    fn seal<E: Environment>(
        &self,
        payload: &[u8],
        timestamp: Timestamp32,
        _env: &E,
    ) -> Result<SealedEnvelope, SecurityError> {
        self.seal_at(payload, timestamp)
    }

    fn open(
        &self,
        slots: &[Slot],
        payload: &[u8],
        local: Timestamp32,
    ) -> Result<VerificationReport, SecurityError> {
        let envelope = RegionalEnvelope::from_bytes(&expect_slots(slots, Self::SLOT_COUNT)?)?;

        let expected = self.compute_tag(&envelope.pseudonym, payload, envelope.timestamp);
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
