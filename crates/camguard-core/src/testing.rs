//! Minimal environment for unit tests.

use std::time::Duration;

use crate::env::Environment;

/// Environment with a fixed wall clock and a constant RNG word.
#[derive(Debug, Clone)]
pub(crate) struct FixedEnv {
    wall_clock: i64,
    word: u64,
}

impl FixedEnv {
    pub(crate) fn new(wall_clock: i64) -> Self {
        Self { wall_clock, word: 0 }
    }

    pub(crate) fn with_random_word(mut self, word: u64) -> Self {
        self.word = word;
        self
    }
}

impl Environment for FixedEnv {
    type Instant = Duration;

    fn now(&self) -> Duration {
        Duration::ZERO
    }

    fn wall_clock_secs(&self) -> i64 {
        self.wall_clock
    }

    fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        std::future::ready(())
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        for (byte, value) in buffer.iter_mut().zip(self.word.to_be_bytes().iter().cycle()) {
            *byte = *value;
        }
    }
}
