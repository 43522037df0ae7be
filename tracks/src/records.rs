use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;

use crate::{Point, RouteID};

/// Reads points from a CSV file with the columns written by an export. Extra columns (a row
/// index, frame numbers, colors) are ignored. The derived columns are trusted as-is.
pub fn load_csv<R: std::io::Read>(reader: R) -> Result<Vec<Point>> {
    let mut points = Vec::new();
    for rec in csv::Reader::from_reader(reader).deserialize() {
        let rec: Record = rec?;
        points.push(Point {
            timestamp: parse_timestamp(&rec.date)
                .with_context(|| format!("bad Date for a point in {}", rec.route_id))?,
            route_id: rec.route_id,
            latitude: rec.latitude,
            longitude: rec.longitude,
            altitude: rec.altitude,
            speed: rec.speed.unwrap_or(0.0),
            time_difference: rec.time_difference.unwrap_or(0.0),
            distance: rec.distance.unwrap_or(0.0),
            source_file: rec.source_file.filter(|x| !x.is_empty()),
        });
    }
    Ok(points)
}

/// Accepts "2017-08-01 10:00:00", optional fractional seconds, a 'T' separator, and a trailing
/// UTC offset. Offsets are converted to UTC.
pub fn parse_timestamp(input: &str) -> Result<NaiveDateTime> {
    let input = input.trim();
    for format in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
    ] {
        if let Ok(x) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(x);
        }
    }
    if let Ok(x) = DateTime::parse_from_rfc3339(input) {
        return Ok(x.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%:z"] {
        if let Ok(x) = DateTime::parse_from_str(input, format) {
            return Ok(x.naive_utc());
        }
    }
    bail!("Unknown timestamp format '{}'", input)
}

#[derive(Deserialize)]
struct Record {
    #[serde(rename = "CodeRoute")]
    route_id: RouteID,
    #[serde(rename = "Latitude")]
    latitude: f64,
    #[serde(rename = "Longitude")]
    longitude: f64,
    #[serde(rename = "Altitude")]
    altitude: Option<f64>,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Speed")]
    speed: Option<f64>,
    #[serde(rename = "TimeDifference")]
    time_difference: Option<f64>,
    #[serde(rename = "Distance")]
    distance: Option<f64>,
    #[serde(rename = "FileName", default)]
    source_file: Option<String>,
}
