use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::Context;
use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};
use location_tracker_lib::{location_fix::LocationFix, track_session::TrackSession};

/// Writes one finished session as a single-track GPX file.
pub fn write_session(session: &TrackSession, path: &Path) -> anyhow::Result<()> {
    let mut segment = TrackSegment::new();
    for fix in &session.fixes {
        segment.points.push(waypoint(fix)?);
    }

    let mut track = Track::new();
    track.name = Some(format!("Session {}", session.start_time.date_naive()));
    track.segments.push(segment);

    let gpx = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some("location_tracker".to_string()),
        tracks: vec![track],
        ..Gpx::default()
    };

    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    gpx::write(&gpx, BufWriter::new(file))
        .with_context(|| format!("failed to write {}", path.display()))?;

    Ok(())
}

fn waypoint(fix: &LocationFix) -> anyhow::Result<Waypoint> {
    let mut waypoint = Waypoint::new(fix.position);
    let time = time::OffsetDateTime::from_unix_timestamp(fix.timestamp.timestamp())
        .context("fix timestamp outside the representable range")?;
    waypoint.time = Some(time.into());
    waypoint.speed = Some(fix.speed as f64);
    Ok(waypoint)
}
