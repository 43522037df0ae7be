use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Result;
use serde::Serialize;

use tracks::RouteID;

use crate::{FramePoint, FrameSegments, Provenance};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    GeoJson,
    /// One GeoJSON line per route per frame, in drawing order
    Segments,
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(x: &str) -> Result<Self> {
        match x.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "geojson" => Ok(ExportFormat::GeoJson),
            "segments" => Ok(ExportFormat::Segments),
            _ => bail!("Must specify a valid format to export: '{}'", x),
        }
    }
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::GeoJson => "geojson",
            ExportFormat::Segments => "segments.geojson",
        }
    }
}

/// One flat row, using the same column names the CSV loader reads.
#[derive(Serialize)]
pub struct ExportRow {
    #[serde(rename = "CodeRoute")]
    pub route_id: RouteID,
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
    #[serde(rename = "Altitude")]
    pub altitude: Option<f64>,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Speed")]
    pub speed: f64,
    #[serde(rename = "TimeDifference")]
    pub time_difference: f64,
    #[serde(rename = "Distance")]
    pub distance: f64,
    #[serde(rename = "FileName")]
    pub source_file: Option<String>,
    #[serde(rename = "CumTimeDiff")]
    pub cum_time_diff: f64,
    #[serde(rename = "VideoFrame")]
    pub video_frame: usize,
    #[serde(rename = "Interpolated")]
    pub interpolated: bool,
    #[serde(rename = "ColorR")]
    pub color_r: Option<f64>,
    #[serde(rename = "ColorG")]
    pub color_g: Option<f64>,
    #[serde(rename = "ColorB")]
    pub color_b: Option<f64>,
}

impl From<&FramePoint> for ExportRow {
    fn from(pt: &FramePoint) -> Self {
        Self {
            route_id: pt.point.route_id.clone(),
            latitude: pt.point.latitude,
            longitude: pt.point.longitude,
            altitude: pt.point.altitude,
            date: pt.point.timestamp.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
            speed: pt.point.speed,
            time_difference: pt.point.time_difference,
            distance: pt.point.distance,
            source_file: pt.point.source_file.clone(),
            cum_time_diff: pt.cum_time_diff,
            video_frame: pt.video_frame,
            interpolated: pt.provenance == Provenance::Interpolated,
            color_r: pt.color.map(|c| c.r),
            color_g: pt.color.map(|c| c.g),
            color_b: pt.color.map(|c| c.b),
        }
    }
}

/// Writes the rows to `<stem>.<extension>` and returns the path written.
pub fn export(rows: &[FramePoint], stem: &Path, format: ExportFormat) -> Result<PathBuf> {
    let mut path = stem.as_os_str().to_owned();
    path.push(".");
    path.push(format.extension());
    let path = PathBuf::from(path);

    let contents = match format {
        ExportFormat::Csv => to_csv(rows)?,
        ExportFormat::Json => {
            let records: Vec<ExportRow> = rows.iter().map(ExportRow::from).collect();
            serde_json::to_string(&records)?
        }
        ExportFormat::GeoJson => to_geojson(rows)?,
        ExportFormat::Segments => to_segments(rows)?,
    };
    fs_err::write(&path, contents)?;
    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(path)
}

fn to_csv(rows: &[FramePoint]) -> Result<String> {
    let mut out = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut out);
        for pt in rows {
            writer.serialize(ExportRow::from(pt))?;
        }
        writer.flush()?;
    }
    let out = String::from_utf8(out)?;
    Ok(out)
}

/// One line per route, in the order points appear
fn to_geojson(rows: &[FramePoint]) -> Result<String> {
    use geojson::{Feature, FeatureCollection, GeoJson};

    let mut per_route: Vec<(&RouteID, Vec<&FramePoint>)> = Vec::new();
    for pt in rows {
        match per_route
            .iter()
            .position(|(id, _)| *id == &pt.point.route_id)
        {
            Some(idx) => per_route[idx].1.push(pt),
            None => per_route.push((&pt.point.route_id, vec![pt])),
        }
    }

    let mut features = Vec::new();
    for (route_id, list) in per_route {
        let mut positions: Vec<Vec<f64>> = list
            .iter()
            .map(|pt| vec![pt.point.longitude, pt.point.latitude])
            .collect();
        // A LineString needs at least two positions
        let geometry = if positions.len() == 1 {
            geojson::Value::Point(positions.remove(0))
        } else {
            geojson::Value::LineString(positions)
        };
        let mut feature = Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geometry)),
            id: None,
            properties: None,
            foreign_members: None,
        };
        feature.set_property("route_id", route_id.0.clone());
        feature.set_property("points", list.len());
        if let Some(name) = list.iter().find_map(|pt| pt.point.source_file.clone()) {
            feature.set_property("source_file", name);
        }
        feature.set_property("start", list[0].point.timestamp.to_string());
        feature.set_property("end", list[list.len() - 1].point.timestamp.to_string());
        features.push(feature);
    }

    let gj = GeoJson::FeatureCollection(FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    });
    Ok(serde_json::to_string_pretty(&gj)?)
}

/// What a renderer draws: every segment a frame adds, tagged with its frame
fn to_segments(rows: &[FramePoint]) -> Result<String> {
    use geojson::{Feature, FeatureCollection, GeoJson};

    let mut features = Vec::new();
    for (frame, segments) in FrameSegments::new(rows) {
        for segment in segments {
            let line = vec![
                vec![segment.from.1, segment.from.0],
                vec![segment.to.1, segment.to.0],
            ];
            let mut feature = Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::LineString(line))),
                id: None,
                properties: None,
                foreign_members: None,
            };
            feature.set_property("route_id", segment.route_id.0);
            feature.set_property("video_frame", frame);
            if let Some(color) = segment.color {
                feature.set_property(
                    "color",
                    format!(
                        "#{:02x}{:02x}{:02x}",
                        (color.r * 255.0).round() as u8,
                        (color.g * 255.0).round() as u8,
                        (color.b * 255.0).round() as u8
                    ),
                );
            }
            features.push(feature);
        }
    }

    let gj = GeoJson::FeatureCollection(FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    });
    Ok(serde_json::to_string_pretty(&gj)?)
}
