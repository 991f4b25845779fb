//! Station counters, round-trip latency and computation times.
//!
//! Owned by the station and shared with workers through an `Arc`. Counters
//! are atomics; the latency ring and the timings are behind mutexes that are
//! never held across an await point.

use std::{
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

/// Slots of the send-time ring, matching the generation delta time cycle.
pub const LATENCY_RING_SIZE: usize = 1000;

/// Sample count and running mean of a duration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimingSummary {
    /// Samples recorded
    pub samples: u64,
    /// Running mean
    pub average: Duration,
}

impl TimingSummary {
    /// Fold one sample into the mean: `avg += (sample - avg) / n`.
    pub fn record(&mut self, sample: Duration) {
        self.samples += 1;
        self.average = if self.samples == 1 {
            sample
        } else {
            let average = self.average.as_secs_f64();
            let step = (sample.as_secs_f64() - average) / self.samples as f64;
            Duration::from_secs_f64((average + step).max(0.0))
        };
    }
}

/// Which side of the station a computation time belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Producing an outgoing CAM
    Transmit,
    /// Handling a received datagram
    Receive,
}

/// Send times indexed by generation delta time, and the running average.
#[derive(Debug, Clone)]
pub struct LatencyTracker {
    sent_at: Vec<Option<Duration>>,
    summary: TimingSummary,
}

impl Default for LatencyTracker {
    fn default() -> Self {
        Self { sent_at: vec![None; LATENCY_RING_SIZE], summary: TimingSummary::default() }
    }
}

impl LatencyTracker {
    /// Remember when the CAM with `generation_delta_time` left.
    pub fn record_send(&mut self, generation_delta_time: u16, at: Duration) {
        self.sent_at[usize::from(generation_delta_time) % LATENCY_RING_SIZE] = Some(at);
    }

    /// Account for an echo of our own CAM received at `at`.
    ///
    /// Latency is half the round trip. Returns `None` if no send time is
    /// known for `generation_delta_time` or the clock went backwards.
    pub fn record_echo(&mut self, generation_delta_time: u16, at: Duration) -> Option<Duration> {
        let sent = self.sent_at[usize::from(generation_delta_time) % LATENCY_RING_SIZE]?;
        let latency = at.checked_sub(sent)? / 2;
        self.summary.record(latency);
        Some(latency)
    }

    /// Echoes measured so far.
    pub fn samples(&self) -> u64 {
        self.summary.samples
    }

    /// Running average latency.
    pub fn average(&self) -> Duration {
        self.summary.average
    }
}

/// Counters of one station.
#[derive(Debug, Default)]
pub struct StationStats {
    tx: AtomicU64,
    rx: AtomicU64,
    verified: AtomicU64,
    unverified: AtomicU64,
    unsecured: AtomicU64,
    malformed: AtomicU64,
    stale: AtomicU64,
    rejected: AtomicU64,
    echoed: AtomicU64,
    late: AtomicU64,
    latency: Mutex<LatencyTracker>,
    timings: Mutex<[TimingSummary; 2]>,
}

/// Point-in-time copy of [`StationStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// CAMs sent by the send loop
    pub tx: u64,
    /// Datagrams received
    pub rx: u64,
    /// Peer CAMs with a matching tag
    pub verified: u64,
    /// Peer CAMs with a mismatching tag
    pub unverified: u64,
    /// Peer CAMs accepted without a check
    pub unsecured: u64,
    /// Peer CAMs that could not be checked or decoded
    pub malformed: u64,
    /// Peer CAMs outside the freshness window
    pub stale: u64,
    /// Peer CAMs dropped by the acceptance policy
    pub rejected: u64,
    /// Peer CAMs re-broadcast in echo modes
    pub echoed: u64,
    /// Worker results discarded after the deadline
    pub late: u64,
    /// Own echoes timed
    pub latency_samples: u64,
    /// Running average latency
    pub average_latency: Duration,
    /// Computation time of outgoing CAMs, when evaluated
    pub transmit_timing: TimingSummary,
    /// Computation time of received datagrams, when evaluated
    pub receive_timing: TimingSummary,
}

macro_rules! counter {
    ($($name:ident => $field:ident),* $(,)?) => {
        $(
            #[doc = concat!("Increment `", stringify!($field), "`.")]
            pub fn $name(&self) {
                self.$field.fetch_add(1, Ordering::Relaxed);
            }
        )*
    };
}

impl StationStats {
    /// Zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    counter! {
        count_tx => tx,
        count_rx => rx,
        count_verified => verified,
        count_unverified => unverified,
        count_unsecured => unsecured,
        count_malformed => malformed,
        count_stale => stale,
        count_rejected => rejected,
        count_echoed => echoed,
        count_late => late,
    }

    /// CAMs sent so far.
    pub fn tx(&self) -> u64 {
        self.tx.load(Ordering::Relaxed)
    }

    /// Record the send time of a CAM.
    pub fn record_send(&self, generation_delta_time: u16, at: Duration) {
        self.tracker().record_send(generation_delta_time, at);
    }

    /// Record an own echo; returns the measured latency.
    pub fn record_echo(&self, generation_delta_time: u16, at: Duration) -> Option<Duration> {
        self.tracker().record_echo(generation_delta_time, at)
    }

    /// Fold one computation time into the summary of `direction`.
    pub fn record_timing(&self, direction: Direction, elapsed: Duration) -> TimingSummary {
        let mut timings = self.timings.lock().unwrap_or_else(PoisonError::into_inner);
        let summary = &mut timings[direction as usize];
        summary.record(elapsed);
        *summary
    }

    /// Copy all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        let (latency_samples, average_latency) = {
            let tracker = self.tracker();
            (tracker.samples(), tracker.average())
        };
        let [transmit_timing, receive_timing] =
            *self.timings.lock().unwrap_or_else(PoisonError::into_inner);

        StatsSnapshot {
            tx: self.tx.load(Ordering::Relaxed),
            rx: self.rx.load(Ordering::Relaxed),
            verified: self.verified.load(Ordering::Relaxed),
            unverified: self.unverified.load(Ordering::Relaxed),
            unsecured: self.unsecured.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            echoed: self.echoed.load(Ordering::Relaxed),
            late: self.late.load(Ordering::Relaxed),
            latency_samples,
            average_latency,
            transmit_timing,
            receive_timing,
        }
    }

    fn tracker(&self) -> std::sync::MutexGuard<'_, LatencyTracker> {
        // Counters stay meaningful after a worker panic
        self.latency.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
