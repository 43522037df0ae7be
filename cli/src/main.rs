#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

use std::path::Path;

use abstutil::{prettyprint_usize, Timer};
use anyhow::Result;
use chrono::NaiveDate;
use serde::Deserialize;
use structopt::StructOpt;

use animation::{
    export, frames, normalize, normalize_by_points, set_colors, Attribute, ExportFormat,
    FrameParams, FramePoint,
};
use tracks::{is_time_format, parse_time_of_day, BoundingBox, TrackTable};

/// Puts GPS tracks onto a shared video timeline and exports the result.
#[derive(StructOpt, Deserialize, Default)]
#[serde(default)]
struct Args {
    /// A .gpx file, a .csv export, or a directory of .gpx files
    #[structopt(long)]
    input: Option<String>,
    /// Only read this many files from a directory
    #[structopt(long)]
    max_files: Option<usize>,
    /// Length of the animation in seconds. 0 puts every point in frame 0.
    #[structopt(long, default_value = "0")]
    time: u32,
    #[structopt(long, default_value = "5")]
    #[serde(default = "default_framerate")]
    framerate: u32,
    /// Assign frames by point count instead of time
    #[structopt(long)]
    by_points: bool,
    /// Only keep points inside "min_lat,min_lon,max_lat,max_lon"
    #[structopt(long)]
    bbox: Option<String>,
    /// With --bbox, keep every point of any route passing through the box
    #[structopt(long)]
    whole_tracks: bool,
    /// Only keep points from this day (YYYY-MM-DD) on
    #[structopt(long)]
    start_date: Option<String>,
    /// Only keep points up to this day (YYYY-MM-DD)
    #[structopt(long)]
    end_date: Option<String>,
    /// Only keep points recorded after this time of day, like 08:30 or 8:30AM
    #[structopt(long)]
    start_time: Option<String>,
    /// Only keep points recorded before this time of day
    #[structopt(long)]
    end_time: Option<String>,
    #[structopt(long)]
    drop_duplicates: bool,
    /// Color points by a column, like Speed or Altitude
    #[structopt(long)]
    color_by: Option<String>,
    /// Use one color range for all routes, instead of one per route
    #[structopt(long)]
    global_colors: bool,
    /// Write the result here; the extension comes from --format
    #[structopt(long)]
    output: Option<String>,
    /// csv, json, geojson, or segments (GeoJSON lines each frame adds)
    #[structopt(long, default_value = "csv")]
    #[serde(default = "default_format")]
    format: String,
    /// Read all of these settings from a JSON file instead
    #[structopt(long)]
    #[serde(skip)]
    config: Option<String>,
}

fn default_framerate() -> u32 {
    FrameParams::default().framerate
}

fn default_format() -> String {
    "csv".to_string()
}

impl Args {
    /// Swaps in the settings from --config, if it's specified.
    fn resolve(mut self) -> Result<Self> {
        if let Some(path) = self.config.take() {
            let raw = fs_err::read_to_string(&path)?;
            let args: Args = serde_json::from_str(&raw)
                .map_err(|err| anyhow!("Bad config {}: {}", path, err))?;
            return Ok(args);
        }
        Ok(self)
    }

    fn filter(&self, mut table: TrackTable) -> Result<TrackTable> {
        if let Some(bbox) = &self.bbox {
            table = table.within_bounds(&BoundingBox::parse(bbox)?, !self.whole_tracks);
        }
        if self.start_date.is_some() || self.end_date.is_some() {
            let start = self.start_date.as_deref().map(parse_date).transpose()?;
            let end = self.end_date.as_deref().map(parse_date).transpose()?;
            table = table.between_dates(start, end);
        }
        match (&self.start_time, &self.end_time) {
            (Some(start), Some(end)) => {
                table = table.between_times(
                    parse_time_of_day(start)?,
                    parse_time_of_day(end)?,
                    true,
                    true,
                );
            }
            (None, None) => {}
            _ => bail!("--start-time and --end-time must be specified together"),
        }
        if self.drop_duplicates {
            table = table.drop_duplicates();
        }
        Ok(table)
    }
}

fn parse_date(input: &str) -> Result<NaiveDate> {
    if is_time_format(input) {
        bail!(
            "Must specify an appropriate date format: '{}' looks like a time",
            input
        );
    }
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|err| anyhow!("Bad date '{}': {}", input, err))
}

fn run(args: Args, timer: &mut Timer) -> Result<Vec<FramePoint>> {
    let input = match &args.input {
        Some(x) => x.clone(),
        None => bail!("No input specified"),
    };
    // Surface bad settings before reading anything
    let format: ExportFormat = args.format.parse()?;
    let attribute = args
        .color_by
        .as_deref()
        .map(|x| x.parse::<Attribute>())
        .transpose()?;

    let table = tracks::read_track(&input, args.max_files, timer)?;
    let table = args.filter(table)?;
    if table.is_empty() {
        warn!("No points left after filtering");
    }
    let bounds = table.bounds();
    info!(
        "{} points from {} routes, within latitude [{}, {}] and longitude [{}, {}]",
        prettyprint_usize(table.len()),
        table.route_ids().len(),
        bounds.min_lat,
        bounds.max_lat,
        bounds.min_lon,
        bounds.max_lon
    );

    let mut rows = if args.by_points {
        normalize_by_points(&table.points)
    } else {
        normalize(
            &table.points,
            FrameParams {
                time_seconds: args.time,
                framerate: args.framerate,
            },
            timer,
        )?
    };
    if let Some(attribute) = attribute {
        rows = set_colors(&rows, attribute, !args.global_colors);
    }
    info!(
        "{} rows over {} frames",
        prettyprint_usize(rows.len()),
        frames(&rows).count()
    );

    if let Some(output) = &args.output {
        export(&rows, Path::new(output), format)?;
    }
    Ok(rows)
}

fn main() -> Result<()> {
    abstutil::logger::setup();

    let args = Args::from_iter(abstutil::cli_args()).resolve()?;
    let mut timer = Timer::new("track animation");
    run(args, &mut timer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_file_defaults() {
        let args: Args = serde_json::from_str(r#"{"input": "routes/", "time": 10}"#).unwrap();
        assert_eq!(args.input.as_deref(), Some("routes/"));
        assert_eq!(args.time, 10);
        assert_eq!(args.framerate, 5);
        assert_eq!(args.format, "csv");
        assert!(!args.by_points);
    }

    #[test]
    fn dates() {
        assert_eq!(
            parse_date("2017-08-01").unwrap(),
            NaiveDate::from_ymd_opt(2017, 8, 1).unwrap()
        );
        assert!(parse_date("10:30").is_err());
        assert!(parse_date("August").is_err());
    }

    #[test]
    fn times_come_in_pairs() {
        let args = Args {
            start_time: Some("08:00".to_string()),
            ..Default::default()
        };
        assert!(args.filter(TrackTable::default()).is_err());
    }

    #[test]
    fn needs_input() {
        let args = Args::default();
        assert!(run(args, &mut Timer::throwaway()).is_err());
    }
}
