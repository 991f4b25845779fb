//! Acceptance policy for checked messages.
//!
//! Stale timestamps and tag mismatches are reported either way. The policy
//! only decides whether such a message still reaches the application.
//! Envelopes that cannot be checked at all are always rejected.

use crate::{error::SecurityError, scheme::VerificationReport, timestamp::Timestamp32};

/// What to do with messages that fail a check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcceptancePolicy {
    /// Drop messages outside the freshness window
    pub reject_stale: bool,
    /// Drop messages whose tag does not match
    pub reject_unverified: bool,
}

/// Whether a received message is handed to the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Pass the message on
    Deliver,
    /// Drop the message
    Reject(SecurityError),
}

impl Disposition {
    /// Returns true for [`Disposition::Deliver`].
    pub fn is_deliver(&self) -> bool {
        matches!(self, Self::Deliver)
    }
}

impl AcceptancePolicy {
    /// Deliver everything checkable; warnings only.
    pub const PERMISSIVE: Self = Self { reject_stale: false, reject_unverified: false };

    /// Drop stale and unverified messages.
    pub const STRICT: Self = Self { reject_stale: true, reject_unverified: true };

    /// Decide on a checked envelope.
    ///
    /// A tag mismatch takes precedence over staleness as the rejection reason.
    pub fn decide(&self, report: &VerificationReport, local: Timestamp32) -> Disposition {
        for finding in report.findings(local).into_iter().rev() {
            let reject = match finding {
                SecurityError::TagMismatch => self.reject_unverified,
                SecurityError::StaleTimestamp { .. } => self.reject_stale,
                _ => false,
            };
            if reject {
                return Disposition::Reject(finding);
            }
        }
        Disposition::Deliver
    }

    /// Decide on an envelope that could not be checked.
    pub fn decide_unchecked(&self, error: &SecurityError) -> Disposition {
        Disposition::Reject(error.clone())
    }
}
