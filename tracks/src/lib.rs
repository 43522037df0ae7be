#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod distance;
mod records;
mod table;
mod time_formats;
mod waypoints;

use std::path::Path;

use abstutil::Timer;
use anyhow::Result;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub use distance::{distance_2d, distance_3d};
pub use records::{load_csv, parse_timestamp};
pub use table::{BoundingBox, TrackTable};
pub use time_formats::{is_time_format, parse_time_of_day, TIME_FORMATS};
pub use waypoints::{load_gpx_dir, load_gpx_file, load_gpx_reader};

/// Groups points into one track. Usually the name of the file the track came from.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RouteID(pub String);

impl std::fmt::Display for RouteID {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RouteID {
    fn from(x: &str) -> Self {
        Self(x.to_string())
    }
}

/// One GPS sample. The derived fields (speed, time_difference, distance) are relative to the
/// previous point of the same route, in timestamp order, and are 0 for the first point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub route_id: RouteID,
    pub latitude: f64,
    pub longitude: f64,
    /// Meters
    pub altitude: Option<f64>,
    pub timestamp: NaiveDateTime,
    /// Meters per second
    pub speed: f64,
    /// Seconds
    pub time_difference: f64,
    /// Meters
    pub distance: f64,
    pub source_file: Option<String>,
}

/// Loads a single .gpx file, a .csv previously exported, or every .gpx file in a directory.
pub fn read_track<P: AsRef<Path>>(
    path: P,
    max_files: Option<usize>,
    timer: &mut Timer,
) -> Result<TrackTable> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|x| x.to_str())
        .map(|x| x.to_lowercase());
    let points = match extension.as_deref() {
        Some("gpx") => load_gpx_file(path)?,
        Some("csv") => {
            let file = fs_err::File::open(path)?;
            load_csv(file)?
        }
        _ => {
            if !path.is_dir() {
                bail!("{} isn't a .gpx, .csv, or directory", path.display());
            }
            load_gpx_dir(path, max_files, timer)?
        }
    };
    info!(
        "Read {} points from {}",
        abstutil::prettyprint_usize(points.len()),
        path.display()
    );
    Ok(TrackTable::new(points))
}
