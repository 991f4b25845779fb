//! Camguard station.
//!
//! Production runtime around [`camguard_core`]'s security layer: a send loop
//! that periodically seals and broadcasts CAMs, and a receive loop that hands
//! each datagram to a short-lived worker for verification and, depending on
//! the [`Mode`], echo-back or latency measurement.
//!
//! # Architecture
//!
//! [`StationDriver`] is Sans-IO: it builds CAMs and maps datagrams to
//! [`StationAction`]s. [`Station`] executes those actions with tokio, a
//! [`Transport`] and an [`Environment`]. Production uses [`UdpTransport`] and
//! [`SystemEnv`]; tests substitute the simulation harness.
//!
//! # Components
//!
//! - [`StationDriver`]: action-based orchestrator (pure logic, no I/O)
//! - [`Station`]: runtime executing driver actions
//! - [`StationStats`]: shared atomic counters, latency tracker and
//!   computation times
//! - [`KeyMaterial`]: key file loading

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
mod driver;
mod error;
pub mod profile;
mod stats;
mod system_env;
mod transport;

use std::{future::Future, sync::Arc, time::Duration};

use camguard_core::{
    Environment, Inbound, Outcome, Scheme, SchemeId, SecurityError, SecurityLayer,
    VerificationReport, Verdict,
};
use camguard_proto::{CarrierCodec, CborCodec};
pub use config::{Evaluation, KeyMaterial, Mode, StationConfig};
pub use driver::{GENERATION_CYCLE, LogLevel, StationAction, StationDriver};
pub use error::{ConfigError, StationError};
pub use profile::StationProfile;
pub use stats::{
    Direction, LATENCY_RING_SIZE, LatencyTracker, StationStats, StatsSnapshot, TimingSummary,
};
pub use system_env::SystemEnv;
use tokio::{
    sync::watch,
    task::{JoinError, JoinSet},
};
pub use transport::{
    LowerLayerStatus, MAX_DATAGRAM_SIZE, Received, RxMeta, Transport, UdpTransport,
};

/// State shared by the loops and every worker.
struct Shared<T, E, C>
where
    E: Environment,
    C: CarrierCodec,
{
    driver: StationDriver<C>,
    transport: T,
    env: E,
    stats: Arc<StationStats>,
    start: E::Instant,
    interval: Duration,
    worker_deadline: Duration,
    evaluation: Evaluation,
}

impl<T, E, C> Shared<T, E, C>
where
    T: Transport,
    E: Environment,
    C: CarrierCodec,
{
    /// Monotonic time since the station started.
    fn elapsed(&self) -> Duration {
        self.env.now() - self.start
    }

    /// Whether envelopes are sealed and checked at all.
    fn secured(&self) -> bool {
        self.driver.layer().scheme().id() != SchemeId::Disabled
    }

    fn record_timing(&self, direction: Direction, elapsed: Duration) {
        let summary = self.stats.record_timing(direction, elapsed);
        tracing::info!(
            ?direction,
            evaluation = ?self.evaluation,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            average_ms = summary.average.as_secs_f64() * 1000.0,
            "computation time"
        );
    }
}

/// A running V2X station.
pub struct Station<T, E, C = CborCodec>
where
    E: Environment,
    C: CarrierCodec,
{
    shared: Shared<T, E, C>,
}

impl<T, E, C> Station<T, E, C>
where
    T: Transport,
    E: Environment,
    C: CarrierCodec,
{
    /// Station from its parts.
    pub fn new(
        driver: StationDriver<C>,
        transport: T,
        env: E,
        interval: Duration,
        worker_deadline: Duration,
    ) -> Self {
        let start = env.now();
        Self {
            shared: Shared {
                driver,
                transport,
                env,
                stats: Arc::new(StationStats::new()),
                start,
                interval,
                worker_deadline,
                evaluation: Evaluation::Off,
            },
        }
    }

    /// Time sealing and verification as selected by `evaluation`.
    #[must_use]
    pub fn with_evaluation(mut self, evaluation: Evaluation) -> Self {
        self.shared.evaluation = evaluation;
        self
    }

    /// The transport.
    pub fn transport(&self) -> &T {
        &self.shared.transport
    }

    /// Counters, shared with the running loops.
    pub fn stats(&self) -> Arc<StationStats> {
        Arc::clone(&self.shared.stats)
    }

    /// Run until Ctrl-C.
    pub async fn run(self) -> Result<StatsSnapshot, StationError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("cannot listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Ctrl-C received, stopping");
        })
        .await
    }

    /// Run the loops of the configured mode until `shutdown` completes.
    ///
    /// On shutdown the loops stop taking new work and every receive worker
    /// finishes before the counters are read.
    ///
    /// # Errors
    ///
    /// Returns the error of a loop that stopped on its own, typically a
    /// closed transport.
    pub async fn run_until<F>(self, shutdown: F) -> Result<StatsSnapshot, StationError>
    where
        F: Future<Output = ()>,
    {
        let shared = Arc::new(self.shared);
        let mode = shared.driver.mode();
        tracing::info!(
            station_id = shared.driver.layer().station_id(),
            scheme = %shared.driver.layer().scheme().id(),
            ?mode,
            evaluation = ?shared.evaluation,
            "station starting"
        );

        let (stop, stopped) = watch::channel(false);
        let mut loops = JoinSet::new();
        if mode.sends() {
            loops.spawn(send_loop(Arc::clone(&shared), stopped.clone()));
        }
        if mode.receives() {
            loops.spawn(receive_loop(Arc::clone(&shared), stopped));
        }

        let mut result = tokio::select! {
            () = shutdown => Ok(()),
            Some(joined) = loops.join_next() => flatten(joined),
        };

        stop.send_replace(true);
        while let Some(joined) = loops.join_next().await {
            if let Err(e) = flatten(joined) {
                tracing::warn!("station loop failed during shutdown: {}", e);
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }

        let snapshot = shared.stats.snapshot();
        log_summary(&snapshot);
        result.map(|()| snapshot)
    }
}

impl<T, E> Station<T, E, CborCodec>
where
    T: Transport,
    E: Environment,
{
    /// Station configured from `config` with the reference codec.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ZeroDuration` if `config` fails validation.
    pub fn from_config(
        config: &StationConfig,
        scheme: Scheme,
        transport: T,
        env: E,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let layer = SecurityLayer::new(CborCodec::new(), scheme, config.profile.station_id)
            .with_policy(config.policy)
            .with_profile(config.profile.low_frequency());
        let driver = StationDriver::new(layer, config.profile, config.mode);
        Ok(Self::new(driver, transport, env, config.interval, config.worker_deadline)
            .with_evaluation(config.evaluation))
    }
}

impl Station<UdpTransport, SystemEnv, CborCodec> {
    /// Bind the UDP transport and build a production station.
    pub async fn bind(config: &StationConfig, scheme: Scheme) -> Result<Self, StationError> {
        config.validate()?;
        let transport = UdpTransport::bind(config.bind, config.target).await?;
        Ok(Self::from_config(config, scheme, transport, SystemEnv::new())?)
    }
}

fn flatten(joined: Result<Result<(), StationError>, JoinError>) -> Result<(), StationError> {
    match joined {
        Ok(result) => result,
        Err(e) => Err(StationError::Transport(format!("station task failed: {e}"))),
    }
}

/// Seal and send one CAM per interval until stopped.
async fn send_loop<T, E, C>(
    shared: Arc<Shared<T, E, C>>,
    mut stop: watch::Receiver<bool>,
) -> Result<(), StationError>
where
    T: Transport,
    E: Environment,
    C: CarrierCodec,
{
    loop {
        send_one(&shared).await;

        tokio::select! {
            _ = stop.changed() => return Ok(()),
            () = shared.env.sleep(shared.interval) => {},
        }
    }
}

async fn send_one<T, E, C>(shared: &Shared<T, E, C>)
where
    T: Transport,
    E: Environment,
    C: CarrierCodec,
{
    let tx = shared.stats.tx();
    let started = shared.env.now();
    let cam = shared.driver.build_cam(tx);
    let sealing = shared.env.now();
    let sealed = shared.driver.seal(&cam, &shared.env);
    let finished = shared.env.now();

    match shared.evaluation {
        Evaluation::Security if shared.secured() => {
            shared.record_timing(Direction::Transmit, finished - sealing);
        },
        Evaluation::Total => shared.record_timing(Direction::Transmit, finished - started),
        Evaluation::Security | Evaluation::Off => {},
    }

    let sealed = match sealed {
        Ok(sealed) => sealed,
        Err(e) => {
            tracing::error!("cannot build CAM: {}", e);
            return;
        },
    };

    let generation_delta_time = cam.generation_delta_time;
    shared.stats.record_send(generation_delta_time, shared.elapsed());

    match shared.transport.send(&sealed.bytes).await {
        Ok(()) => {
            shared.stats.count_tx();
            let len = sealed.bytes.len();
            tracing::debug!(generation_delta_time, len, "CAM sent");
        },
        Err(e) => tracing::error!("send failed: {}", e),
    }
}

/// Receive datagrams and hand each to its own worker until stopped.
///
/// Workers belong to this loop; they are reaped as they finish and drained
/// before it returns.
async fn receive_loop<T, E, C>(
    shared: Arc<Shared<T, E, C>>,
    mut stop: watch::Receiver<bool>,
) -> Result<(), StationError>
where
    T: Transport,
    E: Environment,
    C: CarrierCodec,
{
    let mut workers = JoinSet::new();

    let result = loop {
        tokio::select! {
            biased;

            _ = stop.changed() => break Ok(()),

            Some(joined) = workers.join_next(), if !workers.is_empty() => {
                if let Err(e) = joined {
                    tracing::error!("receive worker failed: {}", e);
                }
            },

            received = shared.transport.recv() => match received {
                Ok(received) => {
                    shared.stats.count_rx();
                    let shared = Arc::clone(&shared);
                    workers.spawn(async move {
                        process_datagram(&shared, received).await;
                    });
                },
                Err(e) => break Err(e),
            },
        }
    };

    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            tracing::error!("receive worker failed: {}", e);
        }
    }
    result
}

/// Verify one datagram and execute the resulting actions within the deadline.
async fn process_datagram<T, E, C>(shared: &Shared<T, E, C>, received: Received)
where
    T: Transport,
    E: Environment,
    C: CarrierCodec,
{
    let started = shared.env.now();
    let opened = shared.driver.open(&received.bytes, &shared.env);
    let verified_in = shared.env.now() - started;
    let received_at = shared.elapsed();

    if shared.evaluation == Evaluation::Security && involves_security(&opened) {
        shared.record_timing(Direction::Receive, verified_in);
    }
    let actions = shared.driver.actions_for(&received.bytes, opened);

    let spent = shared.env.now() - started;
    if spent > shared.worker_deadline {
        shared.stats.count_late();
        tracing::warn!(spent_ms = spent.as_millis() as u64, "verification missed the deadline");
        return;
    }

    let budget = shared.worker_deadline - spent;
    let executed = tokio::time::timeout(budget, execute_actions(shared, actions, received_at));
    if executed.await.is_err() {
        shared.stats.count_late();
        tracing::warn!("worker deadline exceeded");
        return;
    }

    if shared.evaluation == Evaluation::Total {
        shared.record_timing(Direction::Receive, shared.env.now() - started);
    }
}

/// Whether opening a datagram ran the envelope checks.
fn involves_security(opened: &Result<Inbound, SecurityError>) -> bool {
    matches!(
        opened,
        Ok(Inbound::Peer { outcome: Outcome::Checked(_) | Outcome::CannotVerify(_), .. })
    )
}

/// Execute station actions.
async fn execute_actions<T, E, C>(
    shared: &Shared<T, E, C>,
    actions: Vec<StationAction>,
    received_at: Duration,
) where
    T: Transport,
    E: Environment,
    C: CarrierCodec,
{
    let stats = &shared.stats;
    for action in actions {
        match action {
            StationAction::Deliver { cam, outcome } => {
                count_outcome(stats, &outcome);
                tracing::info!(
                    station_id = cam.station_id(),
                    generation_delta_time = cam.generation_delta_time,
                    verdict = verdict_label(&outcome),
                    "CAM received"
                );
            },

            StationAction::Reject { station_id, outcome, reason } => {
                count_outcome(stats, &outcome);
                stats.count_rejected();
                tracing::warn!(station_id, %reason, "CAM rejected");
            },

            StationAction::Discard { .. } => stats.count_malformed(),

            StationAction::Echo { bytes } => match shared.transport.send(&bytes).await {
                Ok(()) => stats.count_echoed(),
                Err(e) => tracing::warn!("echo failed: {}", e),
            },

            StationAction::RecordRoundTrip { generation_delta_time } => {
                match stats.record_echo(generation_delta_time, received_at) {
                    Some(latency) => {
                        let average = stats.snapshot().average_latency;
                        tracing::info!(
                            generation_delta_time,
                            latency_ms = latency.as_secs_f64() * 1000.0,
                            average_ms = average.as_secs_f64() * 1000.0,
                            "round trip measured"
                        );
                    },
                    None => tracing::debug!(generation_delta_time, "no send time for echo"),
                }
            },

            StationAction::Log { level, message } => match level {
                LogLevel::Debug => tracing::debug!("{}", message),
                LogLevel::Info => tracing::info!("{}", message),
                LogLevel::Warn => tracing::warn!("{}", message),
            },
        }
    }
}

fn count_outcome(stats: &StationStats, outcome: &Outcome) {
    match outcome {
        Outcome::Unsecured => stats.count_unsecured(),
        Outcome::Checked(report) => count_report(stats, report),
        Outcome::CannotVerify(_) => stats.count_malformed(),
    }
}

fn count_report(stats: &StationStats, report: &VerificationReport) {
    match report.verdict {
        Verdict::Verified => stats.count_verified(),
        Verdict::Unverified => stats.count_unverified(),
    }
    if !report.freshness.is_fresh() {
        stats.count_stale();
    }
}

fn verdict_label(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Unsecured => "unsecured",
        Outcome::Checked(report) if report.is_verified() => "verified",
        Outcome::Checked(_) => "unverified",
        Outcome::CannotVerify(_) => "cannot-verify",
    }
}

fn log_summary(snapshot: &StatsSnapshot) {
    tracing::info!(
        tx = snapshot.tx,
        rx = snapshot.rx,
        verified = snapshot.verified,
        unverified = snapshot.unverified,
        unsecured = snapshot.unsecured,
        malformed = snapshot.malformed,
        stale = snapshot.stale,
        rejected = snapshot.rejected,
        echoed = snapshot.echoed,
        late = snapshot.late,
        latency_samples = snapshot.latency_samples,
        average_latency_ms = snapshot.average_latency.as_secs_f64() * 1000.0,
        transmit_timing_samples = snapshot.transmit_timing.samples,
        transmit_timing_ms = snapshot.transmit_timing.average.as_secs_f64() * 1000.0,
        receive_timing_samples = snapshot.receive_timing.samples,
        receive_timing_ms = snapshot.receive_timing.average.as_secs_f64() * 1000.0,
        "station stopped"
    );
}
