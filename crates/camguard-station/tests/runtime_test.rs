//! Station runtime over an in-process transport.
//!
//! The transport hands out queued datagrams and then blocks forever, so a
//! test decides exactly what a station hears and when it stops.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use bytes::Bytes;
use camguard_core::{Scheme, SchemeId, SecurityLayer};
use camguard_harness::{SimEnv, reference_keys};
use camguard_proto::CborCodec;
use camguard_station::{
    ConfigError, Evaluation, LowerLayerStatus, Mode, Received, RxMeta, Station, StationConfig,
    StationDriver, StationError, StationProfile, StationStats, Transport,
};
use tokio::sync::mpsc;

/// Queued inbound datagrams; outbound datagrams are recorded.
struct QueueTransport {
    inbox: tokio::sync::Mutex<mpsc::UnboundedReceiver<Bytes>>,
    sent: Mutex<Vec<Vec<u8>>>,
}

impl QueueTransport {
    fn new(datagrams: Vec<Bytes>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        for datagram in datagrams {
            tx.send(datagram).unwrap();
        }
        // Sender dropped: an empty queue then blocks forever below
        Self { inbox: tokio::sync::Mutex::new(rx), sent: Mutex::new(Vec::new()) }
    }
}

impl Transport for QueueTransport {
    async fn send(&self, bytes: &[u8]) -> Result<(), StationError> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).push(bytes.to_vec());
        Ok(())
    }

    async fn recv(&self) -> Result<Received, StationError> {
        let next = self.inbox.lock().await.recv().await;
        match next {
            Some(bytes) => Ok(Received {
                bytes,
                meta: RxMeta { received_at_ms: 0, lower_layer: LowerLayerStatus::Unknown },
            }),
            None => std::future::pending().await,
        }
    }
}

fn config(station_id: u32, mode: Mode, evaluation: Evaluation) -> StationConfig {
    StationConfig {
        mode,
        profile: StationProfile { station_id, ..StationProfile::default() },
        interval: Duration::from_millis(5),
        evaluation,
        ..StationConfig::default()
    }
}

fn scheme(id: SchemeId) -> Scheme {
    reference_keys().unwrap().scheme(id).unwrap()
}

/// CAMs sealed by station `station_id`.
fn sealed_cams(station_id: u32, scheme: Scheme, count: u64) -> Vec<Bytes> {
    let env = SimEnv::with_seed(9);
    let profile = StationProfile { station_id, ..StationProfile::default() };
    let layer = SecurityLayer::new(CborCodec::new(), scheme, station_id)
        .with_profile(profile.low_frequency());
    let driver = StationDriver::new(layer, profile, Mode::Send);
    (0..count).map(|tx| Bytes::from(driver.next_cam(tx, &env).unwrap().bytes)).collect()
}

async fn until(stats: Arc<StationStats>, done: impl Fn(&StationStats) -> bool) {
    while !done(&stats) {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn every_received_datagram_is_handled_before_stopping() {
    const COUNT: u64 = 64;
    let garbage = (0..COUNT).map(|i| Bytes::from(vec![0xFF, i as u8])).collect();

    let station = Station::from_config(
        &config(2, Mode::Receive, Evaluation::Off),
        scheme(SchemeId::HashChain),
        QueueTransport::new(garbage),
        SimEnv::new(),
    )
    .unwrap();
    let stats = station.stats();

    // Stop as soon as the last datagram is read, before its worker ran
    let snapshot =
        station.run_until(until(stats, |stats| stats.snapshot().rx == COUNT)).await.unwrap();

    assert_eq!(snapshot.rx, COUNT);
    assert_eq!(snapshot.malformed + snapshot.late, COUNT);
}

#[tokio::test]
async fn verified_peers_are_handled_before_stopping() {
    const COUNT: u64 = 20;
    let cams = sealed_cams(1, scheme(SchemeId::Regional), COUNT);

    let station = Station::from_config(
        &config(2, Mode::Receive, Evaluation::Off),
        scheme(SchemeId::Regional),
        QueueTransport::new(cams),
        SimEnv::new(),
    )
    .unwrap();
    let stats = station.stats();

    let snapshot =
        station.run_until(until(stats, |stats| stats.snapshot().rx == COUNT)).await.unwrap();

    assert_eq!(snapshot.verified + snapshot.late, COUNT);
    assert_eq!(snapshot.receive_timing.samples, 0);
}

#[tokio::test]
async fn security_evaluation_times_checked_envelopes_only() {
    const PEERS: u64 = 10;
    let mut datagrams = sealed_cams(1, scheme(SchemeId::HashChain), PEERS);
    // Own CAMs heard back and undecodable bytes involve no envelope check
    datagrams.extend(sealed_cams(2, scheme(SchemeId::HashChain), 3));
    datagrams.push(Bytes::from_static(b"\x00\x01"));
    let total = datagrams.len() as u64;

    let station = Station::from_config(
        &config(2, Mode::Receive, Evaluation::Security),
        scheme(SchemeId::HashChain),
        QueueTransport::new(datagrams),
        SimEnv::new(),
    )
    .unwrap();
    let stats = station.stats();

    let snapshot =
        station.run_until(until(stats, |stats| stats.snapshot().rx == total)).await.unwrap();

    assert_eq!(snapshot.late, 0);
    assert_eq!(snapshot.verified, PEERS);
    assert_eq!(snapshot.receive_timing.samples, PEERS);
    assert_eq!(snapshot.transmit_timing.samples, 0);
}

#[tokio::test]
async fn total_evaluation_times_every_datagram() {
    let mut datagrams = sealed_cams(1, scheme(SchemeId::HashChain), 5);
    datagrams.push(Bytes::from_static(b"\x00\x01"));
    let total = datagrams.len() as u64;

    let station = Station::from_config(
        &config(2, Mode::Echo, Evaluation::Total),
        scheme(SchemeId::HashChain),
        QueueTransport::new(datagrams),
        SimEnv::new(),
    )
    .unwrap();
    let stats = station.stats();

    let snapshot =
        station.run_until(until(stats, |stats| stats.snapshot().rx == total)).await.unwrap();

    assert_eq!(snapshot.late, 0);
    assert_eq!(snapshot.echoed, 5);
    assert_eq!(snapshot.receive_timing.samples, total);
}

#[tokio::test]
async fn security_evaluation_times_sealing() {
    let station = Station::from_config(
        &config(1, Mode::Send, Evaluation::Security),
        scheme(SchemeId::Regional),
        QueueTransport::new(Vec::new()),
        SimEnv::new(),
    )
    .unwrap();
    let stats = station.stats();

    let snapshot =
        station.run_until(until(stats, |stats| stats.snapshot().tx >= 3)).await.unwrap();

    assert!(snapshot.tx >= 3);
    assert!(snapshot.transmit_timing.samples >= snapshot.tx);
    assert_eq!(snapshot.receive_timing.samples, 0);
}

#[tokio::test]
async fn security_evaluation_skips_unsecured_sending() {
    let station = Station::from_config(
        &config(1, Mode::Send, Evaluation::Security),
        Scheme::Disabled,
        QueueTransport::new(Vec::new()),
        SimEnv::new(),
    )
    .unwrap();
    let stats = station.stats();

    let snapshot =
        station.run_until(until(stats, |stats| stats.snapshot().tx >= 3)).await.unwrap();

    assert!(snapshot.tx >= 3);
    assert_eq!(snapshot.transmit_timing.samples, 0);
}

#[test]
fn zero_interval_is_rejected() {
    let mut config = config(1, Mode::Send, Evaluation::Off);
    config.interval = Duration::ZERO;

    let built = Station::from_config(
        &config,
        Scheme::Disabled,
        QueueTransport::new(Vec::new()),
        SimEnv::new(),
    );

    assert!(matches!(built, Err(ConfigError::ZeroDuration("interval"))));
}
