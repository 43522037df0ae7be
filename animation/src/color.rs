use std::collections::BTreeMap;
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use tracks::RouteID;

use crate::FramePoint;

/// Each channel is in [0, 1]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// A numeric column that points can be colored by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attribute {
    Speed,
    Altitude,
    Distance,
    TimeDifference,
    CumTimeDiff,
    Latitude,
    Longitude,
    VideoFrame,
}

impl FromStr for Attribute {
    type Err = anyhow::Error;

    fn from_str(x: &str) -> Result<Self> {
        // Accept the exported column names and snake_case
        let normalized: String = x
            .chars()
            .filter(|c| *c != '_')
            .flat_map(|c| c.to_lowercase())
            .collect();
        Ok(match normalized.as_str() {
            "speed" => Attribute::Speed,
            "altitude" => Attribute::Altitude,
            "distance" => Attribute::Distance,
            "timedifference" => Attribute::TimeDifference,
            "cumtimediff" => Attribute::CumTimeDiff,
            "latitude" => Attribute::Latitude,
            "longitude" => Attribute::Longitude,
            "videoframe" => Attribute::VideoFrame,
            _ => bail!("Column name not found: '{}'", x),
        })
    }
}

impl Attribute {
    pub fn value(self, pt: &FramePoint) -> Option<f64> {
        match self {
            Attribute::Speed => Some(pt.point.speed),
            Attribute::Altitude => pt.point.altitude,
            Attribute::Distance => Some(pt.point.distance),
            Attribute::TimeDifference => Some(pt.point.time_difference),
            Attribute::CumTimeDiff => Some(pt.cum_time_diff),
            Attribute::Latitude => Some(pt.point.latitude),
            Attribute::Longitude => Some(pt.point.longitude),
            Attribute::VideoFrame => Some(pt.video_frame as f64),
        }
        .filter(|x| x.is_finite())
    }
}

/// Blue at the minimum, green in the middle, red at the maximum.
pub fn calculate_rgb(value: f64, minimum: f64, maximum: f64) -> Rgb {
    let ratio = if minimum == maximum {
        0.0
    } else {
        2.0 * (value - minimum) / (maximum - minimum)
    };
    let b = (255.0 * (1.0 - ratio)).max(0.0).trunc();
    let r = (255.0 * (ratio - 1.0)).max(0.0).trunc();
    let g = 255.0 - b - r;
    Rgb {
        r: r / 255.0,
        g: g / 255.0,
        b: b / 255.0,
    }
}

/// Colors every point by an attribute. With `individual_tracks`, the range of the attribute is
/// taken per route; otherwise over the whole table. Points without a value keep no color.
pub fn set_colors(
    points: &[FramePoint],
    attribute: Attribute,
    individual_tracks: bool,
) -> Vec<FramePoint> {
    let mut ranges: BTreeMap<Option<&RouteID>, (f64, f64)> = BTreeMap::new();
    for pt in points {
        if let Some(value) = attribute.value(pt) {
            let key = individual_tracks.then(|| &pt.point.route_id);
            let range = ranges.entry(key).or_insert((value, value));
            range.0 = range.0.min(value);
            range.1 = range.1.max(value);
        }
    }

    points
        .iter()
        .map(|pt| {
            let key = individual_tracks.then(|| &pt.point.route_id);
            let color = match (attribute.value(pt), ranges.get(&key)) {
                (Some(value), Some((min, max))) => Some(calculate_rgb(value, *min, *max)),
                _ => None,
            };
            FramePoint {
                color,
                ..pt.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp() {
        let low = calculate_rgb(0.0, 0.0, 10.0);
        assert_eq!(low, Rgb { r: 0.0, g: 0.0, b: 1.0 });
        let mid = calculate_rgb(5.0, 0.0, 10.0);
        assert_eq!(mid, Rgb { r: 0.0, g: 1.0, b: 0.0 });
        let high = calculate_rgb(10.0, 0.0, 10.0);
        assert_eq!(high, Rgb { r: 1.0, g: 0.0, b: 0.0 });
        let flat = calculate_rgb(3.0, 3.0, 3.0);
        assert_eq!(flat, low);
    }

    #[test]
    fn parse_attributes() {
        assert_eq!("Speed".parse::<Attribute>().unwrap(), Attribute::Speed);
        assert_eq!(
            "time_difference".parse::<Attribute>().unwrap(),
            Attribute::TimeDifference
        );
        assert_eq!("CumTimeDiff".parse::<Attribute>().unwrap(), Attribute::CumTimeDiff);
        let err = "Heartrate".parse::<Attribute>().unwrap_err();
        assert!(err.to_string().contains("Heartrate"));
    }

    fn colored(route: &str, speed: f64, altitude: Option<f64>) -> FramePoint {
        FramePoint {
            point: tracks::Point {
                route_id: RouteID::from(route),
                latitude: 0.0,
                longitude: 0.0,
                altitude,
                timestamp: chrono::NaiveDateTime::parse_from_str(
                    "2017-08-01 10:00:00",
                    "%Y-%m-%d %H:%M:%S",
                )
                .unwrap(),
                speed,
                time_difference: 0.0,
                distance: 0.0,
                source_file: None,
            },
            cum_time_diff: 0.0,
            video_frame: 0,
            provenance: crate::Provenance::Recorded,
            color: None,
        }
    }

    #[test]
    fn per_track_or_global_ranges() {
        let points = vec![
            colored("slow", 1.0, Some(5.0)),
            colored("slow", 2.0, None),
            colored("fast", 10.0, Some(7.0)),
            colored("fast", 20.0, Some(9.0)),
        ];

        let individual = set_colors(&points, Attribute::Speed, true);
        // Each route spans its own blue-to-red range
        assert_eq!(individual[1].color, individual[3].color);
        assert_eq!(individual[0].color, individual[2].color);

        let global = set_colors(&points, Attribute::Speed, false);
        assert_eq!(global[0].color, Some(Rgb { r: 0.0, g: 0.0, b: 1.0 }));
        assert_eq!(global[3].color, Some(Rgb { r: 1.0, g: 0.0, b: 0.0 }));
        assert_ne!(global[1].color, individual[1].color);

        let by_altitude = set_colors(&points, Attribute::Altitude, false);
        assert_eq!(by_altitude[1].color, None);
        assert!(by_altitude[0].color.is_some());

        // The input isn't touched
        assert!(points.iter().all(|pt| pt.color.is_none()));
    }
}
