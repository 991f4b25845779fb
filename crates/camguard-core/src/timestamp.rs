//! 32-bit envelope timestamps and the freshness window.

use std::fmt;

/// Accepted distance between envelope and local timestamps, inclusive.
pub const FRESHNESS_WINDOW_SECS: i64 = 1;

/// Wall-clock seconds as carried in an envelope.
///
/// Signed 32-bit and big-endian on the wire. Conversion from 64-bit clocks
/// truncates, so both ends must agree on the epoch but not on the width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp32(i32);

/// Result of comparing an envelope timestamp with the local clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Within `local - 1 ..= local + 1`
    Fresh,
    /// Outside the window
    Stale {
        /// `received - local` in seconds
        skew: i64,
    },
}

impl Timestamp32 {
    /// Wrap a raw value.
    pub const fn new(secs: i32) -> Self {
        Self(secs)
    }

    /// Truncate a 64-bit Unix time.
    pub const fn from_unix_secs(secs: i64) -> Self {
        Self(secs as i32)
    }

    /// Raw seconds.
    pub const fn secs(self) -> i32 {
        self.0
    }

    /// Big-endian wire bytes.
    pub const fn to_be_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    /// Parse big-endian wire bytes.
    pub const fn from_be_bytes(bytes: [u8; 4]) -> Self {
        Self(i32::from_be_bytes(bytes))
    }

    /// Compare against the receiver's clock.
    pub fn freshness(self, local: Timestamp32) -> Freshness {
        let skew = i64::from(self.0) - i64::from(local.0);
        if skew.abs() <= FRESHNESS_WINDOW_SECS {
            Freshness::Fresh
        } else {
            Freshness::Stale { skew }
        }
    }
}

impl fmt::Display for Timestamp32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Freshness {
    /// Returns true for [`Freshness::Fresh`].
    pub fn is_fresh(self) -> bool {
        matches!(self, Self::Fresh)
    }
}
