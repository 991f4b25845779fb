//! Simulated environment.
//!
//! Monotonic time comes from tokio, which turmoil (or a paused test runtime)
//! drives virtually. The wall clock is derived from it: a fixed epoch plus
//! elapsed virtual time plus a skew that tests move to desynchronize stations.

use std::{
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicI64, Ordering},
    },
    time::Duration,
};

use camguard_core::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::time::Instant;

/// Wall-clock seconds at which every simulation starts.
pub const SIM_EPOCH: i64 = 1_700_000_000;

/// Deterministic environment.
///
/// Clones share the RNG stream and the skew.
#[derive(Debug, Clone)]
pub struct SimEnv {
    rng: Arc<Mutex<ChaCha8Rng>>,
    origin: Instant,
    epoch: i64,
    skew: Arc<AtomicI64>,
}

impl SimEnv {
    /// Environment seeded with 0.
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Environment with a specific RNG seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
            origin: Instant::now(),
            epoch: SIM_EPOCH,
            skew: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Start the wall clock at `secs` instead of [`SIM_EPOCH`].
    #[must_use]
    pub fn starting_at(mut self, secs: i64) -> Self {
        self.epoch = secs;
        self
    }

    /// Shift the wall clock by `secs` relative to virtual time.
    pub fn set_skew(&self, secs: i64) {
        self.skew.store(secs, Ordering::Relaxed);
    }

    /// Current skew.
    pub fn skew(&self) -> i64 {
        self.skew.load(Ordering::Relaxed)
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SimEnv {
    type Instant = Instant;

    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn wall_clock_secs(&self) -> i64 {
        let elapsed = Instant::now().saturating_duration_since(self.origin).as_secs() as i64;
        self.epoch + elapsed + self.skew()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
    }
}
