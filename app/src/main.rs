use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use location_tracker_engine::TrackingEngine;
use location_tracker_engine::position_source::{PositionSource, SettingsStatus};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::sim_source::SimulatedWalkSource;

mod gpx_export;
mod sim_source;

/// Records simulated walks through the tracking engine and exports the
/// finished sessions as GPX.
#[derive(Parser)]
struct Args {
    /// Fix delivery interval in milliseconds, floored at 200.
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,

    /// Tracked duration per session, in seconds.
    #[arg(long, default_value_t = 20)]
    duration_secs: u64,

    /// Number of back-to-back sessions to record.
    #[arg(long, default_value_t = 2)]
    sessions: usize,

    /// Seed for the simulated walk.
    #[arg(long, default_value_t = 3169)]
    seed: u64,

    /// Directory finished sessions are exported to.
    #[arg(long, default_value = "data/gpx")]
    export_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    std::fs::create_dir_all("app/log").context("failed to create log directory")?;
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("app/log/app.log")
        .context("failed to open log file")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(log_file))
        .init();

    let interval = Duration::from_millis(args.interval_ms.max(200));

    // Aarhus harbour front, as good a starting point as any.
    let source = Arc::new(SimulatedWalkSource::new(56.1629, 10.2039, args.seed));

    match source.check_settings() {
        SettingsStatus::Satisfied => {}
        SettingsStatus::NeedsResolution(handle) => {
            // A real UI would run the platform's resolution flow here.
            tracing::warn!(%handle, "location settings need resolution, continuing anyway");
        }
        SettingsStatus::Unavailable => anyhow::bail!("location services are unavailable"),
    }

    let engine = Arc::new(TrackingEngine::new(source.clone()));
    engine.set_interval(interval);

    spawn_observer(&engine);

    for n in 0..args.sessions {
        tracing::info!(session = n, "recording session");
        engine.start_new_session();
        engine.start_tracking();

        if n == 0 && args.sessions > 1 {
            // Tighten the cadence halfway through the first session.
            tokio::time::sleep(Duration::from_secs(args.duration_secs / 2)).await;
            engine.set_interval(interval / 2);
            tokio::time::sleep(Duration::from_secs(args.duration_secs.div_ceil(2))).await;
            engine.set_interval(interval);
        } else {
            tokio::time::sleep(Duration::from_secs(args.duration_secs)).await;
        }

        engine.stop_tracking();
    }

    let sessions = engine.observable().sessions();
    std::fs::create_dir_all(&args.export_dir)
        .with_context(|| format!("failed to create {}", args.export_dir.display()))?;

    for (n, session) in sessions.iter().enumerate() {
        if session.is_empty() {
            continue;
        }
        let path = args.export_dir.join(format!("session_{n}.gpx"));
        gpx_export::write_session(session, &path)?;
        tracing::info!(session = n, fixes = session.len(), path = %path.display(), "exported session");
    }

    println!("Recorded {} session(s):", sessions.len());
    for (n, session) in sessions.iter().enumerate() {
        println!(
            "  {} - started {}, {} fixes",
            n,
            session.start_time.format("%H:%M:%S"),
            session.len()
        );
    }

    Ok(())
}

/// Streams location and warm/cold transitions to the log, the way the
/// mobile UI would render them.
fn spawn_observer(engine: &Arc<TrackingEngine>) {
    let observable = engine.observable();
    let mut location_rx = observable.subscribe_location();
    let mut warm_rx = observable.subscribe_gps_warm();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = location_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if let Some(fix) = location_rx.borrow_and_update().clone() {
                        tracing::info!(
                            lat = fix.latitude(),
                            lng = fix.longitude(),
                            speed = fix.speed as f64,
                            "location",
                        );
                    }
                }
                changed = warm_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let warm = *warm_rx.borrow_and_update();
                    tracing::info!(warm, "gps signal");
                }
            }
        }
    });
}
