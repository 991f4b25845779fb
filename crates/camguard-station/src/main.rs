//! Camguard station binary.
//!
//! # Usage
//!
//! ```bash
//! # Broadcast and verify hash-chain authenticated CAMs
//! camguard-station --scheme 1 --keys config/reference-keys.toml
//!
//! # Echo peer CAMs back, unauthenticated
//! camguard-station --mode echo --scheme 0
//!
//! # Time envelope sealing and verification
//! camguard-station --scheme 1 --keys config/reference-keys.toml --eval security
//!
//! # Measure round-trip latency against an echoing peer
//! camguard-station --mode latency --scheme 2 --keys config/reference-keys.toml \
//!     --target 192.168.1.20:4700
//! ```

use std::{path::PathBuf, time::Duration};

use camguard_core::{AcceptancePolicy, Scheme, SchemeId};
use camguard_station::{
    Evaluation, KeyMaterial, Mode, Station, StationConfig, StationProfile, config::parse_address,
    profile::{DEFAULT_STATION_ID, STATION_TYPE_SPECIAL_VEHICLE},
};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// V2X station broadcasting and verifying authenticated CAMs
#[derive(Parser, Debug)]
#[command(name = "camguard-station")]
#[command(about = "V2X station with CAM authentication over path history")]
#[command(version)]
struct Args {
    /// Local address to bind to
    #[arg(short, long, default_value = "0.0.0.0:4700")]
    bind: String,

    /// Destination of outgoing CAMs (broadcast or unicast)
    #[arg(short, long, default_value = "255.255.255.255:4700")]
    target: String,

    /// Operating mode (0-5 or name)
    #[arg(short, long, value_enum, default_value = "send-receive")]
    mode: Mode,

    /// Authentication scheme: 0 disabled, 1 hash-chain, 2 regional
    #[arg(short, long, default_value = "0")]
    scheme: u8,

    /// Key material file (TOML)
    #[arg(short, long)]
    keys: Option<PathBuf>,

    /// Station id
    #[arg(long, default_value_t = DEFAULT_STATION_ID)]
    station_id: u32,

    /// ITS station type
    #[arg(long, default_value_t = STATION_TYPE_SPECIAL_VEHICLE)]
    station_type: u8,

    /// Report the left turn signal as on
    #[arg(long)]
    left_turn: bool,

    /// Report the right turn signal as on
    #[arg(long)]
    right_turn: bool,

    /// Send interval in milliseconds
    #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u64).range(1..))]
    interval_ms: u64,

    /// Budget of one receive worker in milliseconds
    #[arg(long, default_value = "100", value_parser = clap::value_parser!(u64).range(1..))]
    worker_deadline_ms: u64,

    /// Computation-time evaluation (0 off, 1 security, 2 total)
    #[arg(short, long, value_enum, default_value = "off")]
    eval: Evaluation,

    /// Drop CAMs outside the freshness window
    #[arg(long)]
    reject_stale: bool,

    /// Drop CAMs whose tag does not verify
    #[arg(long)]
    reject_unverified: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let scheme_id = SchemeId::try_from(args.scheme)?;
    let scheme = match &args.keys {
        Some(path) => KeyMaterial::load(path)?.scheme(scheme_id)?,
        None if scheme_id == SchemeId::Disabled => Scheme::Disabled,
        None => KeyMaterial::default().scheme(scheme_id)?,
    };

    let config = StationConfig {
        bind: parse_address(&args.bind)?,
        target: parse_address(&args.target)?,
        mode: args.mode,
        profile: StationProfile {
            station_id: args.station_id,
            station_type: args.station_type,
            left_turn_signal: args.left_turn,
            right_turn_signal: args.right_turn,
            ..StationProfile::default()
        },
        interval: Duration::from_millis(args.interval_ms),
        worker_deadline: Duration::from_millis(args.worker_deadline_ms),
        policy: AcceptancePolicy {
            reject_stale: args.reject_stale,
            reject_unverified: args.reject_unverified,
        },
        evaluation: args.eval,
    };

    tracing::info!("Camguard station starting");
    tracing::info!("Binding to {}, sending to {}", config.bind, config.target);

    if scheme_id == SchemeId::Disabled {
        tracing::warn!("Authentication disabled - CAMs are sent and accepted unsecured");
    }

    let station = Station::bind(&config, scheme).await?;

    tracing::info!("Station listening on {}", station.transport().local_addr()?);

    station.run().await?;

    Ok(())
}
