use std::path::{Path, PathBuf};

use abstutil::Timer;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime};

use crate::{distance_3d, Point, RouteID};

/// Reads every point of every track segment in a GPX file. The route is named after the file.
pub fn load_gpx_file(path: &Path) -> Result<Vec<Point>> {
    let route_id = match path.file_stem().and_then(|x| x.to_str()) {
        Some(x) => RouteID(x.to_string()),
        None => bail!("Can't name a route after {}", path.display()),
    };
    let file_name = path
        .file_name()
        .map(|x| x.to_string_lossy().to_string())
        .unwrap_or_default();
    let file = fs_err::File::open(path)?;
    load_gpx_reader(std::io::BufReader::new(file), route_id, &file_name)
        .with_context(|| format!("GPX file {} malformed", path.display()))
}

/// `fallback_label` is used as the source of each point when the GPX metadata has no name.
pub fn load_gpx_reader<R: std::io::Read>(
    reader: R,
    route_id: RouteID,
    fallback_label: &str,
) -> Result<Vec<Point>> {
    let gpx = gpx::read(reader)?;
    let label = gpx
        .metadata
        .as_ref()
        .and_then(|m| m.name.clone())
        .unwrap_or_else(|| fallback_label.to_string());

    let mut points = Vec::new();
    let mut skipped = 0;
    // Derived fields continue across segments, like a single walk over the file
    let mut prev: Option<(f64, f64, Option<f64>, NaiveDateTime)> = None;
    for track in &gpx.tracks {
        for segment in &track.segments {
            for waypoint in &segment.points {
                let timestamp = match &waypoint.time {
                    Some(t) => to_naive(t.format()?)?,
                    None => {
                        skipped += 1;
                        continue;
                    }
                };
                let pt = waypoint.point();
                let (latitude, longitude) = (pt.y(), pt.x());
                let altitude = waypoint.elevation;

                // Devices sometimes step backwards in time; the gap is still how far apart the
                // samples are
                let (time_difference, distance) = match prev {
                    Some((lat1, lon1, alt1, t1)) => (
                        ((timestamp - t1).num_milliseconds() as f64 / 1000.0).abs(),
                        distance_3d((lat1, lon1, alt1), (latitude, longitude, altitude)),
                    ),
                    None => (0.0, 0.0),
                };
                let speed = if time_difference > 0.0 {
                    distance / time_difference
                } else {
                    0.0
                };

                points.push(Point {
                    route_id: route_id.clone(),
                    latitude,
                    longitude,
                    altitude,
                    timestamp,
                    speed,
                    time_difference,
                    distance,
                    source_file: Some(label.clone()),
                });
                prev = Some((latitude, longitude, altitude, timestamp));
            }
        }
    }
    if skipped > 0 {
        warn!("Skipped {} points in {} without a time", skipped, route_id);
    }
    Ok(points)
}

/// Loads every .gpx file in a directory, in name order. Files that fail to load are skipped.
pub fn load_gpx_dir(dir: &Path, max_files: Option<usize>, timer: &mut Timer) -> Result<Vec<Point>> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in fs_err::read_dir(dir)? {
        let path = entry?.path();
        if path
            .extension()
            .map(|x| x.to_string_lossy().eq_ignore_ascii_case("gpx"))
            .unwrap_or(false)
        {
            paths.push(path);
        }
    }
    paths.sort();
    if let Some(n) = max_files {
        paths.truncate(n);
    }

    let mut points = Vec::new();
    timer.start_iter("read GPX files", paths.len());
    for path in paths {
        timer.next();
        match load_gpx_file(&path) {
            Ok(list) => points.extend(list),
            Err(err) => warn!("Skipping {}: {:#}", path.display(), err),
        }
    }
    Ok(points)
}

fn to_naive(iso: String) -> Result<NaiveDateTime> {
    Ok(DateTime::parse_from_rfc3339(&iso)
        .with_context(|| format!("bad waypoint time {}", iso))?
        .naive_utc())
}
