//! Environment abstraction for deterministic testing.
//!
//! Decouples the security layer from system resources (clocks, randomness).
//! Production stations use the real clocks and the OS RNG; the simulation
//! harness substitutes virtual clocks and a seeded RNG so that pool draws and
//! freshness checks are reproducible.

use std::time::Duration;

use crate::timestamp::Timestamp32;

/// Abstract environment providing time, randomness, and async primitives.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards
/// - `random_bytes()` uses cryptographically secure entropy in production
pub trait Environment: Clone + Send + Sync + 'static {
    /// Monotonic instant type of this environment.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current monotonic time. Used for round-trip and computation-time
    /// measurement only.
    fn now(&self) -> Self::Instant;

    /// Wall-clock seconds since the Unix epoch.
    ///
    /// Stations compare these across the air, so they are only loosely
    /// synchronized. May go backwards if the system clock is adjusted.
    fn wall_clock_secs(&self) -> i64;

    /// Sleeps for the specified duration.
    ///
    /// Only driver loops sleep; sealing and verification never do.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    /// Uniform index in `0..bound`.
    ///
    /// Rejection sampling removes the modulo bias of a plain `% bound`.
    /// A `bound` of 0 or 1 always yields 0.
    fn random_index(&self, bound: u32) -> u32 {
        if bound <= 1 {
            return 0;
        }
        let bound = u64::from(bound);
        let zone = u64::MAX - (u64::MAX % bound);
        loop {
            let value = self.random_u64();
            if value < zone {
                return (value % bound) as u32;
            }
        }
    }

    /// Current wall clock as an envelope timestamp.
    fn timestamp(&self) -> Timestamp32 {
        Timestamp32::from_unix_secs(self.wall_clock_secs())
    }
}
